//! Fixed prompts for the research conversation.

use chrono::NaiveDate;

/// System prompt for every call of a run.
pub fn system_prompt(today: NaiveDate) -> String {
    format!(
        "You are a research assistant specializing in scientific literature analysis.
Your task is to thoroughly research topics through multiple iterations, analyzing search results,
identifying knowledge gaps, and formulating follow-up queries to deepen understanding.

Today's date is {}.

You have two tools at your disposal:
1. web_search - Use this to find scientific papers on a topic, along with some of their contents.
   You can specify date ranges for your searches when needed, but only add dates if truly needed for the search.
2. get_article_content - Use this to retrieve the full content in Markdown of a specific article when search results contain promising articles that require deeper analysis.

Always analyze sources critically.",
        today.format("%A, %B %d, %Y")
    )
}

/// The opening user message.
pub fn initial_request(query: &str) -> String {
    format!(
        "I want to thoroughly research: '{query}'. Please search for relevant scientific literature on this topic."
    )
}

/// Appended between iterations.
pub fn follow_up(query: &str) -> String {
    format!(
        "Based on what you've learned so far about {query}, please:

1. Identify a key gap in our current understanding
2. Formulate a specific follow-up search query to address this gap or retrieve a full article if needed
   (You can specify date ranges for your search if relevant)
3. Execute the search or content retrieval and analyze the results"
    )
}

/// Appended after the last iteration to request the report.
pub fn final_synthesis(query: &str, iterations: u32) -> String {
    format!(
        "We've completed {iterations} iterations of research on \"{query}\".

Please synthesize all the information you've gathered into a lengthy comprehensive research report (at least five pages).
This should not be a summary but rather a comprehensive literature review.

You must include proper citations to the sources you've used.

Your report should:
1. Have a clear introduction stating the research question
2. Organize findings into logical sections with headings
3. Provide detailed, lengthy descriptions about the current state of knowledge with numbers, evidence, and quotes from papers
4. Identify remaining questions or areas for future research
5. Conclude with key takeaways
6. Have a complete untruncated references list
7. Be in Markdown format with all sources linked using something like [source](link)"
    )
}

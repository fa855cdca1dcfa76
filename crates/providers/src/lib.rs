//! Conversation model implementations for ScholarLoop.
//!
//! All models implement the `scholarloop_core::ConversationModel` trait.

pub mod anthropic;

pub use anthropic::AnthropicModel;

use std::sync::Arc;

use scholarloop_config::AppConfig;
use scholarloop_core::ConversationModel;

/// Build the configured conversation model.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn ConversationModel> {
    let api_key = config.anthropic.api_key.clone().unwrap_or_default();
    let mut model = AnthropicModel::new(api_key);
    if let Some(base_url) = &config.anthropic.base_url {
        model = model.with_base_url(base_url);
    }
    Arc::new(model)
}

pub mod doctor;
pub mod init;
pub mod research;
pub mod status;

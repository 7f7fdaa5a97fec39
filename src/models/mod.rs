pub mod epigram;
pub mod user;
pub mod user_settings;

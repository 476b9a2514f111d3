pub mod configuration;
pub mod document;
pub mod job;
pub mod prompt;
pub mod verification;

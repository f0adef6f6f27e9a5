//! Configuration, per-user rate limiting and the note assistant facade.

pub mod assistant;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod secret;

pub use assistant::NoteAssistant;
pub use config::Config;
pub use error::AssistantError;
pub use rate_limit::RateLimiter;

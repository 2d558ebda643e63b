pub mod ai;
pub mod config;
pub mod prompt;
pub mod session;
pub mod splitter;
pub mod state;

// Re-export main types for convenience
pub use ai::GroqClient;
pub use config::Config;
pub use prompt::{build_prompt, PromptMessage};
pub use session::Session;
pub use splitter::{split_response, ParsedResponse};
pub use state::{Message, Role};

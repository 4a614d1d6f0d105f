pub mod client;
pub mod model;

pub use client::{ClientConfig, OpenAiClient};
pub use model::{Completion, CompletionRequest, FixedCompletion, ModelConfig};

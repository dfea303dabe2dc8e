pub mod types;
pub mod traits;
pub mod config;
pub mod invoke;
pub mod openai;
pub mod gemini;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, TokenUsage};
pub use config::{ClientFactory, GeminiConfig, OpenAIConfig, ProviderConfig};
pub use invoke::{ChatInvoker, InvokeResponse, PromptInvoker};
pub use openai::OpenAIClient;
pub use gemini::GeminiClient;
pub use types::{Content, ContentPart, Message, Role};

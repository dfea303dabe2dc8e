pub mod client;

pub use client::{GeminiClient, GEMINI_API_BASE, GEMINI_DEFAULT_MODEL, GEMINI_DEFAULT_TEMPERATURE};

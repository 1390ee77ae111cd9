//! Pre-defined provider configurations.

mod config;

pub use config::{gemini_config, groq_config, openrouter_config, ProviderConfig};

//! mathdrill-providers — generative-language API integrations.
//!
//! Implements the `LlmProvider` trait for Google Gemini plus a scripted mock,
//! and loads the configuration that selects between them.

pub mod config;
pub mod gemini;
pub mod mock;

pub use config::{
    create_provider, load_config, load_config_from, provider_from_config, MathdrillConfig,
    ProviderConfig,
};
pub use gemini::GeminiProvider;
pub use mathdrill_core::error::ProviderError;
pub use mock::MockProvider;

//! toefl-sim-providers: model backends and configuration.
//!
//! Implements the `LlmProvider` trait for Google's Gemini API, an offline mock
//! with canned practice material, and the config layer that selects between
//! them.

pub mod config;
pub mod gemini;
pub mod mock;

pub use config::{create_client, create_provider, load_config, load_config_from, ToeflSimConfig};
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use toefl_sim_core::error::ProviderError;

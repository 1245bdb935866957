//! Fallback orchestrator: native provider first, relay second, one draft
//! file out.

pub mod backend;
pub mod config;
pub mod orchestrator;

pub use backend::Backend;
pub use config::{ImageGenConfig, ProviderSelection};
pub use orchestrator::ImageGen;

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod config_tests;

#[cfg(test)]
#[path = "../tests/orchestrator_tests.rs"]
mod orchestrator_tests;

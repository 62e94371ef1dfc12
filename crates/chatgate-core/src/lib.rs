//! Core types for ChatGate: error taxonomy, conversation and result
//! records, the logical-model registry, and data directory layout.

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{ChatGateConfig, DataPaths};
pub use error::{Error, Result};
pub use registry::{all_descriptors, default_descriptor, resolve};
pub use types::*;

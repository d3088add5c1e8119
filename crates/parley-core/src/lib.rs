//! Parley core crate - shared types, prompt templates, configuration and errors.
//!
//! Every other Parley crate depends on this one. It owns the conversation data
//! model, the backend descriptors, the analysis result shapes and the
//! `ParleyConfig` loaded once at process start.

pub mod config;
pub mod error;
pub mod prompt;
pub mod types;

pub use config::ParleyConfig;
pub use error::{ParleyError, Result};
pub use types::*;

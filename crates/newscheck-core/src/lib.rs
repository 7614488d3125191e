//! newscheck Core
//!
//! Core types shared across the newscheck components.
//!
//! This crate provides:
//! - The prediction result and class label types returned to API clients
//! - Free-form model metadata used for introspection
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ModelMetadata, NewsClass, Probabilities, PredictionResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ModelMetadata, NewsClass, Probabilities, PredictionResult};
}

//! Word n-gram text generation library.
//!
//! This crate learns which words start, end and follow each other in sample
//! sentences, for several sizes of word groups, and generates new sentences
//! by weighted random sampling:
//! - Sentence normalization and grouping
//! - Multi-granularity frequency tables
//! - Export/import of the learned state as a plain nested mapping
//! - Binary and JSON snapshot helpers

/// Core model, its tables and generation logic.
pub mod model;

/// Model construction parameters.
pub mod config;

/// Error kinds of the model and of snapshot storage.
pub mod error;

/// I/O utilities (file loading, snapshots, path helpers).
pub mod io;

pub use config::ModelConfig;
pub use error::{ModelError, StoreError, Table};
pub use model::{Distribution, MAX_SENTENCE_TOKENS, Model, ModelState, SubModel};

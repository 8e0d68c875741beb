//! Word-level n-gram model.
//!
//! - Sentence normalization and word grouping (`tokenizer`)
//! - Weighted token counts (`Distribution`)
//! - Tables of a single granularity (`SubModel`)
//! - The learning and generating model (`Model`)

/// Normalizes sentences into words and groups words into tokens.
pub mod tokenizer;

/// Token occurrence counts with weighted random sampling.
pub mod distribution;

/// Start, end and transition tables of one granularity.
pub mod sub_model;

/// The model: learning across granularities, generation, export and import.
pub mod text_model;

pub use distribution::Distribution;
pub use sub_model::SubModel;
pub use text_model::{MAX_SENTENCE_TOKENS, Model, ModelState};

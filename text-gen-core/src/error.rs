//! Error types for learning, generation and snapshot storage.

use std::fmt;

use thiserror::Error;

/// Table of a sub-model a token is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
	Start,
	End,
	Transitions,
}

impl fmt::Display for Table {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Start => write!(f, "start"),
			Self::End => write!(f, "end"),
			Self::Transitions => write!(f, "transitions"),
		}
	}
}

/// Errors raised by the model itself.
///
/// All of them are detected where they happen and returned to the caller;
/// nothing is retried since sampling failures are deterministic given the state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
	/// Generation requested before anything was learned.
	#[error("model is empty, learn at least one sentence first")]
	EmptyModel,

	/// A table needed for a draw has no entry.
	#[error("nothing to draw from the {table} table of granularity {granularity}")]
	EmptyDistribution { granularity: usize, table: Table },

	/// Non-positive words-together or token count.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

/// Errors raised while loading or storing a model on disk.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("binary snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),

	#[error("json snapshot error: {0}")]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Model(#[from] ModelError),
}

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Default number of granularities learned by a model.
pub const DEFAULT_MAX_WORDS_TOGETHER: usize = 3;

/// Construction parameters of a [`Model`](crate::model::text_model::Model).
///
/// # Invariants
/// - `max_words_together` is always >= 1 once validated
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
	/// Largest number of words grouped into one token.
	/// Sub-models are learned for every size from 1 to this value.
	max_words_together: usize,

	/// Seed of the random generator. `None` seeds from the OS.
	pub seed: Option<u64>,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self { max_words_together: DEFAULT_MAX_WORDS_TOGETHER, seed: None }
	}
}

impl ModelConfig {
	/// Creates a configuration learning granularities `1..=max_words_together`.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_words_together` is 0.
	pub fn new(max_words_together: usize) -> Result<Self, ModelError> {
		let mut config = Self::default();
		config.set_max_words_together(max_words_together)?;
		Ok(config)
	}

	pub fn max_words_together(&self) -> usize {
		self.max_words_together
	}

	/// Sets the largest granularity.
	///
	/// # Errors
	/// Returns `InvalidArgument` if the value is 0.
	pub fn set_max_words_together(&mut self, max_words_together: usize) -> Result<(), ModelError> {
		if max_words_together == 0 {
			return Err(ModelError::InvalidArgument("max_words_together must be >= 1".to_owned()));
		}
		self.max_words_together = max_words_together;
		Ok(())
	}

	/// Sets the random seed, making generation reproducible.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Checks a configuration built through deserialization.
	pub fn validate(&self) -> Result<(), ModelError> {
		if self.max_words_together == 0 {
			return Err(ModelError::InvalidArgument("max_words_together must be >= 1".to_owned()));
		}
		Ok(())
	}
}

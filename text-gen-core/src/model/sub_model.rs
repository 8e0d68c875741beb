use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::distribution::Distribution;

/// Frequency tables learned for one granularity (words grouped together).
///
/// # Responsibilities
/// - Record which tokens start and end a learned sentence
/// - Record which token followed which
/// - Merge with another sub-model of the same granularity
///
/// # Invariants
/// - Counts only increase; keys are never removed
/// - A sentence made of a single token counts as both a start and an end,
///   and adds no transition
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubModel {
	/// Tokens observed as the first token of a sentence.
	pub start: Distribution,

	/// Tokens observed as the last token of a sentence.
	pub end: Distribution,

	/// Mapping from a token to the tokens observed right after it.
	pub transitions: BTreeMap<String, Distribution>,
}

impl SubModel {
	/// Creates an empty sub-model.
	pub fn new() -> Self {
		Self::default()
	}

	/// Learns one sentence already grouped into tokens.
	///
	/// Does nothing if `tokens` is empty.
	pub fn learn_tokens(&mut self, tokens: &[String]) {
		let Some(last) = tokens.len().checked_sub(1) else {
			return;
		};

		for (i, token) in tokens.iter().enumerate() {
			if i == 0 {
				self.start.add(token);
			} else {
				self.transitions
					.entry(tokens[i - 1].clone())
					.or_default()
					.add(token);
			}

			if i == last {
				self.end.add(token);
			}
		}
	}

	/// Returns the distribution of tokens observed after `token`.
	pub fn next_of(&self, token: &str) -> Option<&Distribution> {
		self.transitions.get(token)
	}

	/// True if nothing was learned at this granularity.
	pub fn is_empty(&self) -> bool {
		self.start.is_empty() && self.end.is_empty() && self.transitions.is_empty()
	}

	/// Merges another sub-model into this one.
	///
	/// Occurrence counts for matching tokens and transitions are summed.
	pub fn merge(&mut self, other: &Self) {
		self.start.merge(&other.start);
		self.end.merge(&other.end);

		for (token, next) in &other.transitions {
			if let Some(existing) = self.transitions.get_mut(token) {
				existing.merge(next);
			} else {
				self.transitions.insert(token.clone(), next.clone());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(words: &[&str]) -> Vec<String> {
		words.iter().map(|w| (*w).to_owned()).collect()
	}

	#[test]
	fn learns_start_end_and_transitions() {
		let mut sub_model = SubModel::new();
		sub_model.learn_tokens(&tokens(&["we", "are", "we", "are"]));

		assert_eq!(sub_model.start.get("we"), Some(1));
		assert_eq!(sub_model.end.get("are"), Some(1));
		assert_eq!(sub_model.next_of("we").and_then(|d| d.get("are")), Some(2));
		assert_eq!(sub_model.next_of("are").and_then(|d| d.get("we")), Some(1));
		assert_eq!(sub_model.transitions.len(), 2);
	}

	#[test]
	fn single_token_is_start_and_end() {
		let mut sub_model = SubModel::new();
		sub_model.learn_tokens(&tokens(&["hello"]));

		assert_eq!(sub_model.start.get("hello"), Some(1));
		assert_eq!(sub_model.end.get("hello"), Some(1));
		assert!(sub_model.transitions.is_empty());
	}

	#[test]
	fn no_tokens_is_noop() {
		let mut sub_model = SubModel::new();
		sub_model.learn_tokens(&[]);
		assert!(sub_model.is_empty());
	}

	#[test]
	fn merge_equals_learning_both() {
		let first = tokens(&["a", "b", "c"]);
		let second = tokens(&["a", "c"]);

		let mut left = SubModel::new();
		left.learn_tokens(&first);
		let mut right = SubModel::new();
		right.learn_tokens(&second);
		left.merge(&right);

		let mut both = SubModel::new();
		both.learn_tokens(&first);
		both.learn_tokens(&second);

		assert_eq!(left, both);
	}
}

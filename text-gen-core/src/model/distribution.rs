use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// Occurrence counts of tokens, used for weighted random sampling.
///
/// A `Distribution` maps a token (a word or a space-joined group of words)
/// to the number of times it was observed in a given position.
///
/// ## Responsibilities:
/// - Accumulate occurrences during learning
/// - Draw a token with a probability proportional to its count
/// - Merge with another distribution (ex. parallel learning support)
///
/// ## Invariants
/// - Each count is strictly positive
///
/// Serialized as a plain `{ token: count }` mapping.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Distribution {
	/// Example: { "the" => 42, "a" => 3 }
	counts: BTreeMap<String, usize>,
}

impl Distribution {
	/// Creates a new empty distribution.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `token`.
	///
	/// - If the token already exists, its occurrence count is increased.
	/// - Otherwise, a new entry is created with an initial count of 1.
	pub fn add(&mut self, token: &str) {
		match self.counts.get_mut(token) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.counts.insert(token.to_owned(), 1);
			}
		}
	}

	/// Returns the occurrence count of `token`, if it was observed.
	pub fn get(&self, token: &str) -> Option<usize> {
		self.counts.get(token).copied()
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Sum of all occurrence counts.
	pub fn total(&self) -> usize {
		self.counts.values().sum()
	}

	/// Iterates over `(token, count)` pairs in token order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.counts.iter().map(|(token, occurrence)| (token.as_str(), *occurrence))
	}

	/// Draws a token using weighted random sampling.
	///
	/// The probability of selecting a token is its count divided by the
	/// total count. Counts are used as exact integer weights:
	/// - an O(n) scan over the entries
	/// - a cumulative subtraction to select a bucket
	///
	/// Returns `None` if the distribution is empty.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);
		for (token, occurrence) in &self.counts {
			if r < *occurrence {
				return Some(token.as_str());
			}
			r -= occurrence;
		}

		// Unreachable while counts sum to `total`
		None
	}

	/// Merges another distribution into this one, summing counts.
	pub fn merge(&mut self, other: &Self) {
		for (token, occurrence) in &other.counts {
			*self.counts.entry(token.clone()).or_insert(0) += *occurrence;
		}
	}
}

impl<S: Into<String>> FromIterator<(S, usize)> for Distribution {
	fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
		let mut distribution = Self::new();
		for (token, occurrence) in iter {
			if occurrence > 0 {
				*distribution.counts.entry(token.into()).or_insert(0) += occurrence;
			}
		}
		distribution
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn add_creates_then_increments() {
		let mut distribution = Distribution::new();
		distribution.add("we");
		distribution.add("are");
		distribution.add("we");

		assert_eq!(distribution.get("we"), Some(2));
		assert_eq!(distribution.get("are"), Some(1));
		assert_eq!(distribution.get("not"), None);
		assert_eq!(distribution.total(), 3);
		assert_eq!(distribution.len(), 2);
	}

	#[test]
	fn sample_empty_returns_none() {
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(Distribution::new().sample(&mut rng), None);
	}

	#[test]
	fn sample_single_entry_is_certain() {
		let mut rng = StdRng::seed_from_u64(7);
		let distribution: Distribution = [("only", 5)].into_iter().collect();
		for _ in 0..100 {
			assert_eq!(distribution.sample(&mut rng), Some("only"));
		}
	}

	#[test]
	fn sample_follows_weights() {
		let mut rng = StdRng::seed_from_u64(42);
		let distribution: Distribution = [("a", 3), ("b", 1)].into_iter().collect();

		let mut a = 0usize;
		let mut b = 0usize;
		for _ in 0..10_000 {
			match distribution.sample(&mut rng) {
				Some("a") => a += 1,
				Some("b") => b += 1,
				other => panic!("unexpected sample {other:?}"),
			}
		}

		// Expected 7500 / 2500
		assert!((7_000..=8_000).contains(&a), "a drawn {a} times");
		let ratio = a as f64 / b as f64;
		assert!((2.5..=3.5).contains(&ratio), "ratio {ratio}");
	}

	#[test]
	fn merge_sums_counts() {
		let mut left: Distribution = [("a", 2), ("b", 1)].into_iter().collect();
		let right: Distribution = [("b", 4), ("c", 1)].into_iter().collect();
		left.merge(&right);

		assert_eq!(left.get("a"), Some(2));
		assert_eq!(left.get("b"), Some(5));
		assert_eq!(left.get("c"), Some(1));
	}

	#[test]
	fn from_iter_skips_zero_counts() {
		let distribution: Distribution = [("a", 0), ("b", 2)].into_iter().collect();
		assert_eq!(distribution.get("a"), None);
		assert_eq!(distribution.len(), 1);
	}
}

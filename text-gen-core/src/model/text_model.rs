use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};

use super::sub_model::SubModel;
use super::tokenizer::{group_words, split_words};
use crate::config::ModelConfig;
use crate::error::{ModelError, StoreError, Table};
use crate::io::{build_output_path, load_snapshot, read_file, save_snapshot};

/// Learned state of a model: one sub-model per granularity.
///
/// This is the plain nested mapping handed to persistence collaborators:
/// `{ k: { start: {token: n}, end: {token: n}, transitions: {token: {token: n}} } }`.
pub type ModelState = BTreeMap<usize, SubModel>;

/// Largest number of tokens a single generated sentence may hold.
pub const MAX_SENTENCE_TOKENS: usize = 1 << 20;

/// Word-level n-gram model learning from sentences and generating new ones.
///
/// This struct manages:
/// - `state`: a map from granularity (words grouped together) to its `SubModel`.
/// - `max_words_together`: learning feeds every granularity from 1 to this value.
/// - `rng`: the random generator used by [`Model::generate_sentence`].
///
/// The model is only mutated by learning (and wholesale by import/merge).
/// It defines no locking; share it behind a lock if needed.
#[derive(Debug)]
pub struct Model<R = StdRng> {
	max_words_together: usize,
	state: ModelState,
	rng: R,
}

impl Model<StdRng> {
	/// Creates an empty model seeded from the OS.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_words_together` is 0.
	pub fn new(max_words_together: usize) -> Result<Self, ModelError> {
		Self::with_rng(max_words_together, StdRng::from_os_rng())
	}

	/// Creates an empty model from a configuration.
	pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
		config.validate()?;
		let rng = match config.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Self::with_rng(config.max_words_together(), rng)
	}

	/// Loads a model for a text file of sentences (one per line).
	///
	/// - If a `.bin` snapshot exists next to the file, it is imported.
	/// - Otherwise the file is learned in parallel and the snapshot is written
	///   for the next load.
	pub fn from_file<P: AsRef<Path>>(filepath: P, config: &ModelConfig) -> Result<Self, StoreError> {
		let mut model = Self::from_config(config)?;
		let binary_data_path = build_output_path(&filepath, "bin")?;
		if binary_data_path.exists() {
			model.import_state(load_snapshot(&binary_data_path)?);
			debug!("restored model from {}", binary_data_path.display());
		} else {
			model.learn_from_file(&filepath)?;
			save_snapshot(&binary_data_path, model.export_state())?;
			debug!("learned model from {}, snapshot written to {}", filepath.as_ref().display(), binary_data_path.display());
		}
		Ok(model)
	}
}

impl<R: Rng> Model<R> {
	/// Creates an empty model drawing from the given random generator.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_words_together` is 0.
	pub fn with_rng(max_words_together: usize, rng: R) -> Result<Self, ModelError> {
		if max_words_together == 0 {
			return Err(ModelError::InvalidArgument("max_words_together must be >= 1".to_owned()));
		}
		Ok(Self { max_words_together, state: ModelState::new(), rng })
	}

	pub fn max_words_together(&self) -> usize {
		self.max_words_together
	}

	/// Learned granularities in ascending order.
	pub fn granularities(&self) -> impl Iterator<Item = usize> + '_ {
		self.state.keys().copied()
	}

	/// Returns the sub-model of granularity `words_together`, if learned.
	pub fn sub_model(&self, words_together: usize) -> Option<&SubModel> {
		self.state.get(&words_together)
	}

	/// True until a sentence with at least one word has been learned.
	pub fn is_empty(&self) -> bool {
		self.state.is_empty()
	}

	/// Learns one sentence. The more sentences it learns, the "smarter" it is.
	///
	/// Degenerate sentences (empty, only punctuation or digits) are ignored.
	pub fn learn_from_sentence(&mut self, sentence: &str) {
		learn_sentence(&mut self.state, self.max_words_together, sentence);
	}

	/// Learns every sentence, in order.
	pub fn learn_from_sentences<I, S>(&mut self, sentences: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for sentence in sentences {
			self.learn_from_sentence(sentence.as_ref());
		}
	}

	/// Learns every line of a file, splitting the work across threads.
	///
	/// # Behavior
	/// - Splits input lines into chunks (based on CPU cores * factor).
	/// - Spawns threads to learn a partial state for each chunk.
	/// - Merges all partial states into this model.
	pub fn learn_from_file<P: AsRef<Path>>(&mut self, filepath: P) -> Result<(), StoreError> {
		let lines = read_file(&filepath)?;
		if lines.is_empty() {
			return Ok(());
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks).max(1);
		let max_words_together = self.max_words_together;

		let (tx, rx) = mpsc::channel();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				let mut partial = ModelState::new();
				for sentence in &chunk {
					learn_sentence(&mut partial, max_words_together, sentence);
				}
				// The receiver outlives every sender
				let _ = tx.send(partial);
			});
		}
		drop(tx);

		for partial in rx.iter() {
			self.merge(&partial);
		}
		debug!("learned {} lines from {}", lines.len(), filepath.as_ref().display());

		Ok(())
	}

	/// Generates a sentence of `count` tokens using the model's own generator.
	///
	/// See [`Model::generate_sentence_with`].
	pub fn generate_sentence(&mut self, count: usize) -> Result<String, ModelError> {
		generate(&self.state, count, &mut self.rng)
	}

	/// Generates a sentence of `count` tokens joined by a single space.
	///
	/// # Behavior
	/// - First token: a weighted draw from the `start` table of a random granularity.
	/// - Middle tokens: a weighted draw among the tokens that followed the previous one.
	/// - Last token (if `count > 1`): a weighted draw from the `end` table of a random granularity.
	///
	/// Every step picks its own random granularity.
	///
	/// # Errors
	/// - `InvalidArgument` if `count` is 0 or above [`MAX_SENTENCE_TOKENS`].
	/// - `EmptyModel` if nothing was learned.
	/// - `EmptyDistribution` if a needed table is empty.
	pub fn generate_sentence_with<G: Rng + ?Sized>(&self, count: usize, rng: &mut G) -> Result<String, ModelError> {
		generate(&self.state, count, rng)
	}

	/// Returns the learned state, to store somewhere.
	pub fn export_state(&self) -> &ModelState {
		&self.state
	}

	/// Replaces the learned state with a backup. No merging.
	///
	/// `max_words_together` is kept: later learning still feeds `1..=max_words_together`.
	pub fn import_state(&mut self, state: ModelState) {
		debug!("imported state with {} granularities", state.len());
		self.state = state;
	}

	/// Merges a learned state into this model, summing counts.
	pub fn merge(&mut self, other: &ModelState) {
		debug!("merged {} granularities", other.len());
		for (words_together, sub_model) in other {
			if let Some(existing) = self.state.get_mut(words_together) {
				existing.merge(sub_model);
			} else {
				self.state.insert(*words_together, sub_model.clone());
			}
		}
	}
}

/// Feeds a sentence to every granularity of `state`.
fn learn_sentence(state: &mut ModelState, max_words_together: usize, sentence: &str) {
	let words = split_words(sentence);
	if words.is_empty() {
		trace!("skipped sentence without words: {sentence:?}");
		return;
	}

	for words_together in 1..=max_words_together {
		let tokens = group_words(&words, words_together);
		state.entry(words_together).or_default().learn_tokens(&tokens);
	}
	trace!("learned {} words", words.len());
}

/// Picks a learned granularity uniformly at random.
fn random_sub_model<'a, G: Rng + ?Sized>(state: &'a ModelState, rng: &mut G) -> Result<(usize, &'a SubModel), ModelError> {
	state
		.iter()
		.choose(rng)
		.map(|(words_together, sub_model)| (*words_together, sub_model))
		.ok_or(ModelError::EmptyModel)
}

fn get_start<G: Rng + ?Sized>(state: &ModelState, rng: &mut G) -> Result<String, ModelError> {
	let (granularity, sub_model) = random_sub_model(state, rng)?;
	sub_model
		.start
		.sample(rng)
		.map(str::to_owned)
		.ok_or(ModelError::EmptyDistribution { granularity, table: Table::Start })
}

fn get_end<G: Rng + ?Sized>(state: &ModelState, rng: &mut G) -> Result<String, ModelError> {
	let (granularity, sub_model) = random_sub_model(state, rng)?;
	sub_model
		.end
		.sample(rng)
		.map(str::to_owned)
		.ok_or(ModelError::EmptyDistribution { granularity, table: Table::End })
}

/// Draws the token following `after`.
///
/// Lookup order:
/// 1. the transitions of a random granularity
/// 2. the first granularity, in ascending order, that knows `after`
/// 3. any token with outgoing transitions at granularity 1, uniformly, ignoring counts
// TODO: use weighted sampling in the last fallback too, counts are ignored there
fn get_next<G: Rng + ?Sized>(state: &ModelState, after: &str, rng: &mut G) -> Result<String, ModelError> {
	let (granularity, sub_model) = random_sub_model(state, rng)?;
	let found = match sub_model.next_of(after) {
		Some(next) => Some((granularity, next)),
		None => state
			.iter()
			.find_map(|(words_together, sub_model)| sub_model.next_of(after).map(|next| (*words_together, next))),
	};

	if let Some((granularity, next)) = found {
		return next
			.sample(rng)
			.map(str::to_owned)
			.ok_or(ModelError::EmptyDistribution { granularity, table: Table::Transitions });
	}

	trace!("no transition from {after:?}, drawing any token of granularity 1");
	state
		.get(&1)
		.and_then(|sub_model| sub_model.transitions.keys().choose(rng))
		.cloned()
		.ok_or(ModelError::EmptyDistribution { granularity: 1, table: Table::Transitions })
}

fn generate<G: Rng + ?Sized>(state: &ModelState, count: usize, rng: &mut G) -> Result<String, ModelError> {
	if count == 0 {
		return Err(ModelError::InvalidArgument("count must be >= 1".to_owned()));
	}
	if count > MAX_SENTENCE_TOKENS {
		return Err(ModelError::InvalidArgument(format!("count must be <= {MAX_SENTENCE_TOKENS}")));
	}
	if state.is_empty() {
		return Err(ModelError::EmptyModel);
	}

	let mut sentence: Vec<String> = Vec::with_capacity(count.min(64));
	sentence.push(get_start(state, rng)?);
	for step in 2..=count {
		let token = if step == count {
			get_end(state, rng)?
		} else {
			get_next(state, &sentence[step - 2], rng)?
		};
		sentence.push(token);
	}

	Ok(sentence.join(" "))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::distribution::Distribution;

	const SENTENCE: &str = "generally we are not substituting subtype objects for supertype objects, \
		we are simply using subtype objects as supertype objects";

	fn seeded(max_words_together: usize) -> Model {
		Model::from_config(&ModelConfig::new(max_words_together).unwrap().with_seed(11)).unwrap()
	}

	fn dist(entries: &[(&str, usize)]) -> Distribution {
		entries.iter().map(|(token, count)| (*token, *count)).collect()
	}

	fn one_word_sub_model() -> SubModel {
		let transitions = [
			("generally", dist(&[("we", 1)])),
			("we", dist(&[("are", 2)])),
			("are", dist(&[("not", 1), ("simply", 1)])),
			("not", dist(&[("substituting", 1)])),
			("substituting", dist(&[("subtype", 1)])),
			("objects", dist(&[("for", 1), ("as", 1), ("we", 1)])),
			("for", dist(&[("supertype", 1)])),
			("supertype", dist(&[("objects", 2)])),
			("simply", dist(&[("using", 1)])),
			("using", dist(&[("subtype", 1)])),
			("subtype", dist(&[("objects", 2)])),
			("as", dist(&[("supertype", 1)])),
		];
		SubModel {
			start: dist(&[("generally", 1)]),
			end: dist(&[("objects", 1)]),
			transitions: transitions.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
		}
	}

	#[test]
	fn learns_one_word_model() {
		let mut model = seeded(1);
		model.learn_from_sentence(SENTENCE);

		let expected: ModelState = [(1, one_word_sub_model())].into_iter().collect();
		assert_eq!(model.export_state(), &expected);
	}

	#[test]
	fn learns_two_words_model() {
		let mut model = seeded(2);
		model.learn_from_sentence(SENTENCE);

		let transitions = [
			("generally we", dist(&[("are not", 1)])),
			("are not", dist(&[("substituting subtype", 1)])),
			("substituting subtype", dist(&[("objects for", 1)])),
			("objects for", dist(&[("supertype objects", 1)])),
			("supertype objects", dist(&[("we are", 1)])),
			("we are", dist(&[("simply using", 1)])),
			("simply using", dist(&[("subtype objects", 1)])),
			("subtype objects", dist(&[("as supertype", 1)])),
			("as supertype", dist(&[("objects", 1)])),
		];
		let two_words = SubModel {
			start: dist(&[("generally we", 1)]),
			end: dist(&[("objects", 1)]),
			transitions: transitions.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
		};

		let expected: ModelState = [(1, one_word_sub_model()), (2, two_words)].into_iter().collect();
		assert_eq!(model.export_state(), &expected);
	}

	#[test]
	fn learns_sentence_with_numbers() {
		let mut model = seeded(1);
		model.learn_from_sentence("any entry showing that sector 123 is occupied");

		let sub_model = model.sub_model(1).unwrap();
		assert_eq!(sub_model.start, dist(&[("any", 1)]));
		assert_eq!(sub_model.end, dist(&[("occupied", 1)]));

		let chain = ["any", "entry", "showing", "that", "sector", "is", "occupied"];
		for pair in chain.windows(2) {
			assert_eq!(sub_model.next_of(pair[0]), Some(&dist(&[(pair[1], 1)])));
		}
		assert_eq!(sub_model.transitions.len(), chain.len() - 1);
	}

	#[test]
	fn single_word_sentence_is_start_and_end() {
		let mut model = seeded(3);
		model.learn_from_sentence("Hello!");

		for words_together in 1..=3 {
			let sub_model = model.sub_model(words_together).unwrap();
			assert_eq!(sub_model.start, dist(&[("hello", 1)]));
			assert_eq!(sub_model.end, dist(&[("hello", 1)]));
			assert!(sub_model.transitions.is_empty());
		}
	}

	#[test]
	fn punctuation_and_case_do_not_change_keys() {
		let mut shouting = seeded(2);
		shouting.learn_from_sentence("Hello, World!");
		let mut plain = seeded(2);
		plain.learn_from_sentence("hello world");

		assert_eq!(shouting.export_state(), plain.export_state());
	}

	#[test]
	fn degenerate_sentences_learn_nothing() {
		let mut model = seeded(3);
		model.learn_from_sentences(["", "   ", "!?.,", "123 456"]);
		assert!(model.is_empty());
		assert_eq!(model.generate_sentence(3), Err(ModelError::EmptyModel));
	}

	#[test]
	fn zero_words_together_is_rejected() {
		assert!(matches!(Model::new(0), Err(ModelError::InvalidArgument(_))));
	}

	#[test]
	fn generate_before_learning_fails() {
		let mut model = seeded(3);
		assert_eq!(model.generate_sentence(5), Err(ModelError::EmptyModel));
	}

	#[test]
	fn generate_zero_tokens_fails() {
		let mut model = seeded(1);
		model.learn_from_sentence(SENTENCE);
		assert!(matches!(model.generate_sentence(0), Err(ModelError::InvalidArgument(_))));
	}

	#[test]
	fn huge_count_is_rejected_without_allocating() {
		let mut model = seeded(1);
		model.learn_from_sentence("the cat sat");

		assert!(matches!(model.generate_sentence(usize::MAX / 8), Err(ModelError::InvalidArgument(_))));
		assert!(matches!(model.generate_sentence(MAX_SENTENCE_TOKENS + 1), Err(ModelError::InvalidArgument(_))));
		assert_eq!(model.generate_sentence(10_000).unwrap().split(' ').count(), 10_000);
	}

	#[test]
	fn generates_exactly_count_tokens() {
		let mut model = seeded(1);
		model.learn_from_sentence(SENTENCE);

		for count in 1..=12 {
			let sentence = model.generate_sentence(count).unwrap();
			assert_eq!(sentence.split(' ').count(), count, "{sentence:?}");
		}
	}

	#[test]
	fn generates_from_learned_tables() {
		let mut model = seeded(1);
		model.learn_from_sentence("the cat sat");

		// Only one path exists at granularity 1
		assert_eq!(model.generate_sentence(3).unwrap(), "the cat sat");
		assert_eq!(model.generate_sentence(1).unwrap(), "the");
		assert_eq!(model.generate_sentence(2).unwrap(), "the sat");
	}

	#[test]
	fn unknown_token_falls_back_to_granularity_one() {
		let mut model = seeded(1);
		// "sat" has no successor
		model.learn_from_sentence("sat");
		model.learn_from_sentence("the cat");

		let mut fallback_rng = StdRng::seed_from_u64(3);
		let next = get_next(model.export_state(), "sat", &mut fallback_rng).unwrap();
		assert_eq!(next, "the");
	}

	#[test]
	fn fallback_scans_other_granularities() {
		let mut state = ModelState::new();
		state.entry(1).or_default().learn_tokens(&["a".to_owned(), "b".to_owned()]);
		state.entry(2).or_default().learn_tokens(&["x y".to_owned(), "z".to_owned()]);

		let mut rng = StdRng::seed_from_u64(5);
		for _ in 0..50 {
			assert_eq!(get_next(&state, "x y", &mut rng).unwrap(), "z");
		}
	}

	#[test]
	fn empty_transitions_are_reported() {
		let mut model = seeded(1);
		model.learn_from_sentence("alone");

		assert_eq!(
			model.generate_sentence(3),
			Err(ModelError::EmptyDistribution { granularity: 1, table: Table::Transitions })
		);
	}

	#[test]
	fn empty_start_table_is_reported() {
		let mut model = seeded(1);
		model.import_state([(1, SubModel::new())].into_iter().collect());

		assert_eq!(
			model.generate_sentence(1),
			Err(ModelError::EmptyDistribution { granularity: 1, table: Table::Start })
		);
	}

	#[test]
	fn seeded_models_are_reproducible() {
		let mut first = seeded(3);
		let mut second = seeded(3);
		first.learn_from_sentence(SENTENCE);
		second.learn_from_sentence(SENTENCE);

		for _ in 0..20 {
			assert_eq!(first.generate_sentence(6), second.generate_sentence(6));
		}
	}

	#[test]
	fn import_replaces_state() {
		let mut source = seeded(2);
		source.learn_from_sentence(SENTENCE);

		let mut target = seeded(2);
		target.learn_from_sentence("something else entirely");
		target.import_state(source.export_state().clone());

		assert_eq!(target.export_state(), source.export_state());
		assert_eq!(target.max_words_together(), 2);
	}

	#[test]
	fn merge_matches_sequential_learning() {
		let mut left = seeded(2);
		left.learn_from_sentence("the cat sat on the mat");
		let mut right = seeded(2);
		right.learn_from_sentence("the dog sat");
		left.merge(right.export_state());

		let mut both = seeded(2);
		both.learn_from_sentences(["the cat sat on the mat", "the dog sat"]);

		assert_eq!(left.export_state(), both.export_state());
	}
}

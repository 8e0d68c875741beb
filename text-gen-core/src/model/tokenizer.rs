/// Characters removed from a sentence before splitting into words.
///
/// Removed, not replaced: `"sector123"` becomes `"sector"`.
fn is_stripped(c: char) -> bool {
	matches!(c, ',' | '.' | '!' | '?' | '\t' | '\n' | '\r' | '\0' | '\x0B' | '\x0C') || c.is_ascii_digit()
}

/// Characters a sentence is split on.
fn is_separator(c: char) -> bool {
	matches!(c, ' ' | ',' | '-' | '.')
}

/// Normalizes a raw sentence into its ordered list of words.
///
/// - Lowercases the whole sentence (Unicode aware)
/// - Removes punctuation (`, . ! ?`), tabs, line breaks, ASCII digits
///   and a few control characters
/// - Trims, splits on space, comma, hyphen and period
/// - Drops empty chunks
///
/// An all-punctuation or all-digit sentence yields no words.
pub fn split_words(sentence: &str) -> Vec<String> {
	let cleaned: String = sentence
		.to_lowercase()
		.chars()
		.filter(|c| !is_stripped(*c))
		.collect();

	cleaned
		.trim()
		.split(is_separator)
		.filter(|w| !w.is_empty())
		.map(str::to_owned)
		.collect()
}

/// Groups words into consecutive tokens of `words_together` words.
///
/// The last token holds the remainder when the number of words is not a
/// multiple of `words_together`. Words are joined with a single space.
/// No words gives no tokens.
///
/// `words_together` must be >= 1.
pub fn group_words(words: &[String], words_together: usize) -> Vec<String> {
	if words_together == 0 {
		return Vec::new();
	}
	words
		.chunks(words_together)
		.map(|group| group.join(" "))
		.collect()
}

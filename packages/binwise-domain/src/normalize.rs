use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

const MARK_SIGNS: [char; 3] = ['\u{00AE}', '\u{2122}', '\u{00A9}'];

/// Canonical matching key shared by alias seeding and runtime matching.
///
/// Returns an empty string when nothing matchable remains; callers treat that as "no key".
pub fn normalize(text: &str) -> String {
	let folded: String = text
		.trim()
		.chars()
		.filter(|ch| !MARK_SIGNS.contains(ch))
		.nfkd()
		.filter(|ch| !is_combining_mark(*ch))
		.flat_map(char::to_lowercase)
		.collect();

	collapse_separators(folded.as_str())
}

pub fn normalize_no_space(text: &str) -> String {
	normalize(text).replace(' ', "")
}

/// German transliteration (`ß`, `ä`, `ö`, `ü`) applied before accent stripping.
pub fn normalize_umlaut_expanded(text: &str) -> String {
	let lowered = text.trim().to_lowercase();
	let mut expanded = String::with_capacity(lowered.len() + 8);

	for ch in lowered.chars() {
		match ch {
			'ß' => expanded.push_str("ss"),
			'ä' => expanded.push_str("ae"),
			'ö' => expanded.push_str("oe"),
			'ü' => expanded.push_str("ue"),
			other => expanded.push(other),
		}
	}

	normalize(expanded.as_str())
}

fn collapse_separators(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut pending_space = false;

	for ch in input.chars() {
		if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
			if pending_space && !out.is_empty() {
				out.push(' ');
			}

			pending_space = false;

			out.push(ch);
		} else {
			pending_space = true;
		}
	}

	out
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, normalize_no_space, normalize_umlaut_expanded};

pub const PRIMARY_CONFIDENCE: f32 = 1.0;
pub const UMLAUT_CONFIDENCE: f32 = 0.9;
pub const NO_SPACE_CONFIDENCE: f32 = 0.85;
pub const UMLAUT_NO_SPACE_CONFIDENCE: f32 = 0.8;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasType {
	Primary,
	Auto,
}
impl AliasType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Primary => "primary",
			Self::Auto => "auto",
		}
	}

	fn rank(self) -> u8 {
		match self {
			Self::Primary => 2,
			Self::Auto => 1,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AliasCandidate {
	pub canonical_key: String,
	pub lang: String,
	pub alias_text: String,
	pub alias_norm: String,
	pub alias_type: AliasType,
	pub confidence: f32,
}
impl AliasCandidate {
	fn outranks(&self, other: &Self) -> bool {
		if self.confidence != other.confidence {
			return self.confidence > other.confidence;
		}

		self.alias_type.rank() > other.alias_type.rank()
	}
}

/// A normalized alias claimed by two different canonical keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AliasCollision {
	pub lang: String,
	pub alias_norm: String,
	pub loser: String,
	pub winner: String,
	pub winner_confidence: f32,
	pub winner_alias_type: AliasType,
}

/// Keeps one candidate per `(lang, alias_norm)`.
#[derive(Debug, Default)]
pub struct AliasSeed {
	best: BTreeMap<(String, String), AliasCandidate>,
	collisions: Vec<AliasCollision>,
}
impl AliasSeed {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, candidate: AliasCandidate) {
		if candidate.alias_norm.is_empty() {
			return;
		}

		let slot = (candidate.lang.clone(), candidate.alias_norm.clone());
		let Some(current) = self.best.get(&slot) else {
			self.best.insert(slot, candidate);

			return;
		};
		let same_key = current.canonical_key == candidate.canonical_key;
		let replace = candidate.outranks(current);

		if !same_key {
			let (winner, loser) = if replace { (&candidate, current) } else { (current, &candidate) };

			self.collisions.push(AliasCollision {
				lang: winner.lang.clone(),
				alias_norm: winner.alias_norm.clone(),
				loser: loser.canonical_key.clone(),
				winner: winner.canonical_key.clone(),
				winner_confidence: winner.confidence,
				winner_alias_type: winner.alias_type,
			});
		}
		if replace {
			self.best.insert(slot, candidate);
		}
	}

	pub fn extend<I>(&mut self, candidates: I)
	where
		I: IntoIterator<Item = AliasCandidate>,
	{
		for candidate in candidates {
			self.insert(candidate);
		}
	}

	pub fn len(&self) -> usize {
		self.best.len()
	}

	pub fn is_empty(&self) -> bool {
		self.best.is_empty()
	}

	/// Rows ordered by `(lang, alias_norm)` plus the collision report in insertion order.
	pub fn into_parts(self) -> (Vec<AliasCandidate>, Vec<AliasCollision>) {
		(self.best.into_values().collect(), self.collisions)
	}
}

pub fn generate_aliases(canonical_key: &str, lang: &str, title: &str) -> Vec<AliasCandidate> {
	let alias_text = title.trim();
	let primary = normalize(alias_text);

	if primary.is_empty() {
		return Vec::new();
	}

	let candidate = |alias_norm: String, alias_type, confidence| AliasCandidate {
		canonical_key: canonical_key.to_string(),
		lang: lang.to_string(),
		alias_text: alias_text.to_string(),
		alias_norm,
		alias_type,
		confidence,
	};
	let no_space = normalize_no_space(alias_text);
	let mut out = vec![candidate(primary.clone(), AliasType::Primary, PRIMARY_CONFIDENCE)];

	if no_space != primary {
		out.push(candidate(no_space.clone(), AliasType::Auto, NO_SPACE_CONFIDENCE));
	}
	if lang == "de" {
		let umlaut = normalize_umlaut_expanded(alias_text);

		if !umlaut.is_empty() && umlaut != primary {
			let umlaut_no_space = umlaut.replace(' ', "");

			out.push(candidate(umlaut.clone(), AliasType::Auto, UMLAUT_CONFIDENCE));

			if umlaut_no_space != umlaut && umlaut_no_space != no_space {
				out.push(candidate(umlaut_no_space, AliasType::Auto, UMLAUT_NO_SPACE_CONFIDENCE));
			}
		}
	}

	out
}

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOTES_CACHE_HIT: &str = "cache_hit";
pub const NOTES_PARSE_ERROR: &str = "parse_error";
pub const NOTES_STUB: &str = "stub";
pub const NOTES_VISION_ERROR_PREFIX: &str = "vision_error";
pub const MAX_LABELS: usize = 5;
pub const MAX_LABEL_CHARS: usize = 20;
pub const MAX_ERROR_BODY_CHARS: usize = 200;
pub const UNSURE_MAX_CONFIDENCE: f32 = 0.3;

const CANONICAL_KEY_PATTERN: &str = r"^[a-z0-9_]+$";

/// What the vision provider said about an image.
///
/// Provider failures are verdicts too: they carry no key, zero confidence and an error note.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Verdict {
	pub canonical_key: Option<String>,
	pub confidence: f32,
	pub labels: Vec<String>,
	pub notes: Option<String>,
}
impl Verdict {
	pub fn soft_fail(notes: impl Into<String>) -> Self {
		Self { canonical_key: None, confidence: 0.0, labels: Vec::new(), notes: Some(notes.into()) }
	}

	pub fn parse_error() -> Self {
		Self::soft_fail(NOTES_PARSE_ERROR)
	}

	pub fn http_error(status: u16, body: &str) -> Self {
		let preview: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

		Self::soft_fail(format!("{NOTES_VISION_ERROR_PREFIX}: status={status} body={preview}"))
	}

	pub fn attempts_exhausted() -> Self {
		Self::soft_fail(format!("{NOTES_VISION_ERROR_PREFIX}: exception_or_timeout"))
	}

	/// Offline verdict used when no provider credentials are configured.
	pub fn stub() -> Self {
		Self {
			canonical_key: Some("battery".to_string()),
			confidence: 0.5,
			labels: vec!["battery".to_string()],
			notes: Some(NOTES_STUB.to_string()),
		}
	}

	/// Builds a verdict from a provider JSON object without sanitizing it.
	pub fn from_json(value: &Value) -> Option<Self> {
		let object = value.as_object()?;
		let canonical_key = object.get("canonical_key").and_then(Value::as_str).map(str::to_string);
		let confidence = match object.get("confidence") {
			Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0) as f32,
			Some(Value::String(raw)) => raw.trim().parse::<f32>().unwrap_or(0.0),
			_ => 0.0,
		};
		let labels = object
			.get("labels")
			.and_then(Value::as_array)
			.map(|labels| labels.iter().filter_map(Value::as_str).map(str::to_string).collect())
			.unwrap_or_default();
		let notes = object.get("notes").and_then(Value::as_str).map(str::to_string);

		Some(Self { canonical_key, confidence, labels, notes })
	}

	pub fn is_vision_failure(&self) -> bool {
		self.notes
			.as_deref()
			.map(|notes| notes == NOTES_PARSE_ERROR || notes.starts_with(NOTES_VISION_ERROR_PREFIX))
			.unwrap_or(false)
	}

	/// Applies the label, key and confidence rules every stored verdict must satisfy.
	pub fn sanitized(self) -> Self {
		let labels = normalize_labels(&self.labels);
		let canonical_key = self.canonical_key.as_deref().and_then(sanitize_canonical_key);
		let mut confidence = if self.confidence.is_finite() { self.confidence } else { 0.0 };

		if canonical_key.is_none() {
			confidence = confidence.min(UNSURE_MAX_CONFIDENCE);
		}

		Self { canonical_key, confidence: confidence.clamp(0.0, 1.0), labels, notes: self.notes }
	}
}

/// Parses a chat completion body into an unsanitized verdict.
pub fn parse_completion(content: &str) -> Verdict {
	let content = content.trim();

	if content.is_empty() {
		return Verdict::parse_error();
	}

	let whole = serde_json::from_str::<Value>(content).ok();

	if let Some(verdict) = whole.as_ref().and_then(Verdict::from_json) {
		return verdict;
	}

	let Some(span) = first_object_span(content) else {
		return Verdict::parse_error();
	};

	serde_json::from_str::<Value>(span)
		.ok()
		.as_ref()
		.and_then(Verdict::from_json)
		.unwrap_or_else(Verdict::parse_error)
}

/// The first balanced `{...}` span, ignoring braces inside JSON strings.
fn first_object_span(content: &str) -> Option<&str> {
	let start = content.find('{')?;
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, ch) in content[start..].char_indices() {
		if in_string {
			match ch {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {},
			}

			continue;
		}

		match ch {
			'"' => in_string = true,
			'{' => depth += 1,
			'}' => {
				depth -= 1;

				if depth == 0 {
					return Some(&content[start..=start + offset]);
				}
			},
			_ => {},
		}
	}

	None
}

pub fn normalize_labels(labels: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();

	for label in labels {
		let value: String = label.trim().to_lowercase().chars().take(MAX_LABEL_CHARS).collect();

		if !value.is_empty() && !out.contains(&value) {
			out.push(value);
		}
		if out.len() >= MAX_LABELS {
			break;
		}
	}

	out
}

pub fn sanitize_canonical_key(raw: &str) -> Option<String> {
	let key = raw.trim().to_lowercase();

	if key.is_empty() {
		return None;
	}
	if !Regex::new(CANONICAL_KEY_PATTERN).map(|re| re.is_match(&key)).unwrap_or(false) {
		return None;
	}

	Some(key)
}

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use binwise_config::VisionProviderConfig;

pub const VISION_PROMPT: &str = "Return JSON only: {\"canonical_key\":..., \"confidence\":..., \
\"labels\":[...], \"notes\":...}. canonical_key=lowercase slug (no \"item.\", use _). \
If unsure: canonical_key=null, confidence<=0.3. labels: max 5, <=20 chars; include \
singular+plural of main object. No extra text.";

/// Outcome of a live vision call. Only configuration problems are errors; everything the
/// provider or the network does wrong is a reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisionReply {
	/// Raw assistant message content, not yet parsed.
	Content(String),
	/// The provider answered with an HTTP status of 400 or above.
	Rejected { status: u16, body: String },
	/// Every attempt failed in transport, timed out or returned an unreadable body.
	Unavailable { attempts: u32, last_error: String },
}

/// Sends one JPEG to an OpenAI-compatible chat completions endpoint.
///
/// Each attempt is bounded by `timeout_ms`; at most `max_attempts` attempts are made. A rejected
/// request is not retried.
pub async fn describe_image(
	cfg: &VisionProviderConfig,
	jpeg: &[u8],
	lang: &str,
) -> Result<VisionReply> {
	let Some(api_key) = cfg.api_key.as_deref() else {
		return Err(Error::MissingApiKey);
	};
	let headers = crate::auth_headers(api_key, &cfg.default_headers)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
	let body = build_request_body(cfg, jpeg, lang);
	let attempts = cfg.max_attempts.max(1);
	let mut last_error = String::new();

	for _ in 0..attempts {
		let res = match client.post(&url).headers(headers.clone()).json(&body).send().await {
			Ok(res) => res,
			Err(err) => {
				last_error = err.to_string();

				continue;
			},
		};
		let status = res.status();

		if status.as_u16() >= 400 {
			let body = res.text().await.unwrap_or_default();

			return Ok(VisionReply::Rejected { status: status.as_u16(), body });
		}

		match res.json::<Value>().await {
			Ok(json) => return Ok(VisionReply::Content(extract_content(&json))),
			Err(err) => last_error = err.to_string(),
		}
	}

	Ok(VisionReply::Unavailable { attempts, last_error })
}

pub fn build_request_body(cfg: &VisionProviderConfig, jpeg: &[u8], lang: &str) -> Value {
	let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg));

	serde_json::json!({
		"model": cfg.model,
		"messages": [
			{
				"role": "user",
				"content": [
					{ "type": "text", "text": format!("{VISION_PROMPT} Language={lang}") },
					{ "type": "image_url", "image_url": { "url": data_url, "detail": "low" } },
				],
			}
		],
		"response_format": { "type": "json_object" },
		"max_tokens": cfg.max_tokens,
		"temperature": cfg.temperature,
	})
}

/// First choice message content, or an empty string when the shape is unexpected.
pub fn extract_content(json: &Value) -> String {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.unwrap_or_default()
		.to_string()
}

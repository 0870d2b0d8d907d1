use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Vision request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Invalid header name: {0}")]
	HeaderName(#[from] InvalidHeaderName),
	#[error("Invalid header value: {0}")]
	HeaderValue(#[from] InvalidHeaderValue),
	#[error("providers.vision.api_key is required for live vision calls.")]
	MissingApiKey,
	#[error("Default header {name} must be a string.")]
	NonStringHeader { name: String },
}

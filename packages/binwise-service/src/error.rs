pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid image: {message}")]
	InvalidImage { message: String },
	#[error("Image store failed: {message}")]
	ImageStoreFailed { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Stable machine-readable token for callers that surface errors to clients.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InvalidImage { .. } => "invalid_image",
			Self::ImageStoreFailed { .. } => "image_store_failed",
			Self::InvalidRequest { .. } => "invalid_request",
			Self::Provider { .. } => "provider_error",
			Self::Storage { .. } => "storage_error",
		}
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<binwise_storage::Error> for Error {
	fn from(err: binwise_storage::Error) -> Self {
		match err {
			binwise_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			err @ (binwise_storage::Error::ProspectWithoutKey
			| binwise_storage::Error::InvalidTtl { .. }) =>
				Self::InvalidRequest { message: err.to_string() },
		}
	}
}

impl From<binwise_providers::Error> for Error {
	fn from(err: binwise_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read config {}: {source}", path.display())]
	Read { path: PathBuf, source: io::Error },
	#[error("Cannot parse config {}: {source}", path.display())]
	Parse { path: PathBuf, source: toml::de::Error },
	#[error("Invalid config: {message}")]
	Validation { message: String },
}

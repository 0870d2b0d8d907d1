use std::{io::Cursor, path::PathBuf};

use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{BoxFuture, Error, Result};

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Re-encoded image bytes as sent to the provider, hashed and stored.
#[derive(Clone, Debug)]
pub struct NormalizedImage {
	pub jpeg: Vec<u8>,
	pub sha256: String,
	pub width: u32,
	pub height: u32,
}
impl NormalizedImage {
	pub fn storage_key(&self) -> String {
		format!("{}.jpg", self.sha256)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredImage {
	pub image_id: Uuid,
	pub sha256: String,
	pub width: u32,
	pub height: u32,
}

pub trait ImageStore
where
	Self: Send + Sync,
{
	/// Persists the normalized bytes and returns their storage key.
	fn put<'a>(&'a self, image: &'a NormalizedImage) -> BoxFuture<'a, Result<String>>;
}

/// Writes one `<sha256>.jpg` file per image under a root directory.
pub struct FsImageStore {
	root: PathBuf,
}
impl FsImageStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	async fn write(&self, image: &NormalizedImage) -> Result<String> {
		let key = image.storage_key();
		let path = self.root.join(&key);

		// Content-addressed: an existing file already holds these bytes.
		if tokio::fs::try_exists(&path).await.map_err(store_failed)? {
			return Ok(key);
		}

		tokio::fs::create_dir_all(&self.root).await.map_err(store_failed)?;
		tokio::fs::write(&path, &image.jpeg).await.map_err(store_failed)?;

		Ok(key)
	}
}

impl ImageStore for FsImageStore {
	fn put<'a>(&'a self, image: &'a NormalizedImage) -> BoxFuture<'a, Result<String>> {
		Box::pin(self.write(image))
	}
}

/// Decodes any supported raster format, converts it to RGB8, shrinks it so the longer edge is at
/// most `max_side` and re-encodes it as JPEG.
pub fn normalize_image(bytes: &[u8], max_side: u32, quality: u8) -> Result<NormalizedImage> {
	let decoded = image::load_from_memory(bytes)
		.map_err(|err| Error::InvalidImage { message: err.to_string() })?;
	let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
	let (width, height) = bounded_size(rgb.width(), rgb.height(), max_side);
	let resized = if (width, height) == (rgb.width(), rgb.height()) {
		rgb
	} else {
		rgb.resize_exact(width, height, FilterType::Triangle)
	};
	let mut buf = Cursor::new(Vec::new());
	let encoder = JpegEncoder::new_with_quality(&mut buf, quality);

	resized
		.write_with_encoder(encoder)
		.map_err(|err| Error::InvalidImage { message: err.to_string() })?;

	let jpeg = buf.into_inner();

	Ok(NormalizedImage {
		sha256: sha256_hex(&jpeg),
		width: resized.width(),
		height: resized.height(),
		jpeg,
	})
}

/// Target dimensions for a single proportional downscale; never upscales.
pub fn bounded_size(width: u32, height: u32, max_side: u32) -> (u32, u32) {
	let longest = width.max(height);

	if longest <= max_side || max_side == 0 {
		return (width, height);
	}

	let scale = |side: u32| {
		let scaled = u64::from(side) * u64::from(max_side) / u64::from(longest);

		u32::try_from(scaled).unwrap_or(max_side).max(1)
	};

	(scale(width), scale(height))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
	format!("{:x}", Sha256::digest(bytes))
}

fn store_failed(err: std::io::Error) -> Error {
	Error::ImageStoreFailed { message: err.to_string() }
}

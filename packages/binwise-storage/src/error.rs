#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Prospect needs an item_id or a non-empty search_norm.")]
	ProspectWithoutKey,
	#[error("Vision cache ttl_days must be positive, got {ttl_days}.")]
	InvalidTtl { ttl_days: i64 },
}

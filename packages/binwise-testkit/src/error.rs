pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("BINWISE_PG_DSN is not a valid Postgres DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("No admin database is reachable from BINWISE_PG_DSN: {0}")]
	AdminUnavailable(String),
	#[error("Failed to create test database {name}: {source}")]
	CreateDatabase { name: String, source: sqlx::Error },
	#[error("Failed to drop test database {name}: {source}")]
	DropDatabase { name: String, source: sqlx::Error },
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}

pub mod fixtures;

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "BINWISE_PG_DSN";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// A throwaway database created next to the one named by `BINWISE_PG_DSN`.
///
/// Dropped on `cleanup`, or from a helper thread when the value goes out of scope.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("binwise_test_{}", Uuid::new_v4().simple());
		let create_sql = format!(r#"CREATE DATABASE "{name}""#);

		admin_conn
			.execute(create_sql.as_str())
			.await
			.map_err(|source| Error::CreateDatabase { name: name.clone(), source })?;

		let dsn = base_options.clone().database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		cleanup_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if !self.cleaned {
			drop_blocking(self.name.clone(), self.admin_options.clone());
		}
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// Tries `postgres`, then `template1`.
async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut failures = Vec::with_capacity(ADMIN_DATABASES.len());

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => failures.push(format!("{database}: {err}")),
		}
	}

	Err(Error::AdminUnavailable(failures.join("; ")))
}

/// Runs the cleanup on a short-lived runtime in its own thread.
fn drop_blocking(name: String, admin_options: PgConnectOptions) {
	let cleanup = thread::spawn(move || {
		let result = Builder::new_current_thread()
			.enable_all()
			.build()
			.map_err(|err| err.to_string())
			.and_then(|runtime| {
				runtime
					.block_on(cleanup_database(&name, &admin_options))
					.map_err(|err| err.to_string())
			});

		if let Err(err) = result {
			eprintln!("Leaked test database {name}: {err}.");
		}
	});
	let _ = cleanup.join();
}

async fn cleanup_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await?;
	let drop_sql = format!(r#"DROP DATABASE IF EXISTS "{name}""#);
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(drop_sql.as_str())
		.execute(&mut conn)
		.await
		.map_err(|source| Error::DropDatabase { name: name.to_string(), source })?;

	Ok(())
}

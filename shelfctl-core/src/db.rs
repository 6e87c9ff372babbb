//! Connection setup.
//!
//! Statement logging is switched on explicitly: every statement sqlx
//! executes is emitted at DEBUG under the `sqlx::query` target, so running
//! with `RUST_LOG=info,sqlx::query=debug` (the CLI's default) prints each
//! SQL statement as it is issued. No driver wrapping needed.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool, Row};
use tracing::debug;

use crate::error::Result;
use crate::settings::Settings;

/// Open a small connection pool against the configured database, with
/// per-statement logging enabled.
pub async fn connect(settings: &Settings) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(&settings.database_url())?
        .log_statements(log::LevelFilter::Debug);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    match settings.host() {
        Some(host) => debug!("connected to postgres at {}", host),
        None => debug!("connected to postgres via DATABASE_URL"),
    }
    Ok(pool)
}

/// Execute raw `SELECT 1` and return the scalar. The simplest possible
/// round-trip through the driver.
pub async fn ping(pool: &PgPool) -> Result<i32> {
    let row = sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(row.try_get::<i32, _>(0)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelfError;

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        // Fails while parsing connect options, before any network I/O
        let settings = Settings::Url("definitely not a connection url".to_string());
        let err = connect(&settings).await.unwrap_err();
        assert!(matches!(err, ShelfError::Database { .. }));
    }
}

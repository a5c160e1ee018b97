#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Database access for the back office.
//!
//! - [`DbHandle`]: one pooled SeaORM connection built from [`DbConnConfig`]
//! - [`secure`]: select/update/delete wrappers that refuse to run unscoped
//! - [`crud`]: the listing engine (search, filters, sort, pagination, relations)
//!
//! # Features
//! - `sqlite` (default), `pg`, `mysql`: enable the matching SQLx driver

pub mod config;
pub mod crud;
pub mod secure;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use thiserror::Error;

pub use config::DbConnConfig;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    MySql,
    Sqlite,
}

/// Pool knobs; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    /// Let SQLx log every statement.
    pub sql_logging: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            sql_logging: false,
        }
    }
}

/// Main handle.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("mysql://") {
            Ok(DbEngine::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(Some(dsn))))
        }
    }

    /// Connect and build the handle.
    ///
    /// # Errors
    /// Returns an error if the DSN is unknown, its driver is not compiled in,
    /// or the connection fails.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        ensure_driver(engine)?;

        let mut co = ConnectOptions::new(dsn.trim().to_owned());
        if let Some(n) = opts.max_conns {
            co.max_connections(n);
        }
        if let Some(n) = opts.min_conns {
            co.min_connections(n);
        }
        if let Some(t) = opts.acquire_timeout {
            co.acquire_timeout(t);
        }
        if let Some(t) = opts.idle_timeout {
            co.idle_timeout(t);
        }
        co.sqlx_logging(opts.sql_logging);

        let sea = Database::connect(co).await?;
        tracing::info!(dsn = %redact_credentials_in_dsn(Some(dsn)), ?engine, "database connected");
        Ok(Self {
            engine,
            dsn: dsn.to_owned(),
            sea,
        })
    }

    /// Connect using a config section.
    ///
    /// # Errors
    /// See [`DbHandle::connect`].
    pub async fn from_config(cfg: &DbConnConfig) -> Result<Self> {
        Self::connect(&cfg.dsn, cfg.connect_opts()).await
    }

    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN with any password masked.
    #[must_use]
    pub fn dsn(&self) -> String {
        redact_credentials_in_dsn(Some(&self.dsn))
    }

    #[must_use]
    pub fn sea(&self) -> &DatabaseConnection {
        &self.sea
    }
}

fn ensure_driver(engine: DbEngine) -> Result<()> {
    let enabled = match engine {
        DbEngine::Postgres => cfg!(feature = "pg"),
        DbEngine::MySql => cfg!(feature = "mysql"),
        DbEngine::Sqlite => cfg!(feature = "sqlite"),
    };
    if enabled {
        Ok(())
    } else {
        Err(DbError::FeatureDisabled(match engine {
            DbEngine::Postgres => "pg",
            DbEngine::MySql => "mysql",
            DbEngine::Sqlite => "sqlite",
        }))
    }
}

/// Mask the password part of a DSN for logs.
#[must_use]
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    match dsn {
        Some(dsn) if dsn.contains('@') => {
            if let Ok(mut parsed) = url::Url::parse(dsn) {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            } else {
                "***".to_owned()
            }
        }
        Some(dsn) => dsn.to_owned(),
        None => "none".to_owned(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn detect_recognizes_schemes() {
        assert_eq!(DbHandle::detect("sqlite::memory:").unwrap(), DbEngine::Sqlite);
        assert_eq!(
            DbHandle::detect("postgresql://u@h/db").unwrap(),
            DbEngine::Postgres
        );
        assert_eq!(DbHandle::detect("mysql://u@h/db").unwrap(), DbEngine::MySql);
        assert!(matches!(
            DbHandle::detect("redis://h"),
            Err(DbError::UnknownDsn(_))
        ));
    }

    #[test]
    fn redacts_passwords_only() {
        assert_eq!(
            redact_credentials_in_dsn(Some("postgres://app:secret@db:5432/ops")),
            "postgres://app:***@db:5432/ops"
        );
        assert_eq!(
            redact_credentials_in_dsn(Some("sqlite::memory:")),
            "sqlite::memory:"
        );
        assert_eq!(redact_credentials_in_dsn(None), "none");
    }

    #[tokio::test]
    async fn connects_to_in_memory_sqlite() {
        let db = DbHandle::connect(
            "sqlite::memory:",
            ConnectOpts {
                max_conns: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(db.engine(), DbEngine::Sqlite);
        assert!(db.sea().ping().await.is_ok());
    }
}

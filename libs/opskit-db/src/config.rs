use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConnectOpts;

/// `database` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DbConnConfig {
    pub dsn: String,
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    pub sql_logging: bool,
}

impl Default for DbConnConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite::memory:".to_owned(),
            max_conns: Some(1),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            sql_logging: false,
        }
    }
}

impl DbConnConfig {
    #[must_use]
    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            max_conns: self.max_conns,
            min_conns: self.min_conns,
            acquire_timeout: self.acquire_timeout,
            idle_timeout: self.idle_timeout,
            sql_logging: self.sql_logging,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_single_connection_memory_db() {
        let cfg = DbConnConfig::default();
        assert_eq!(cfg.dsn, "sqlite::memory:");
        assert_eq!(cfg.connect_opts().max_conns, Some(1));
    }

    #[test]
    fn parses_humantime_durations() {
        let cfg: DbConnConfig = serde_json::from_value(serde_json::json!({
            "dsn": "postgres://app@db/ops",
            "acquire_timeout": "5s",
            "idle_timeout": "2m"
        }))
        .unwrap();
        assert_eq!(cfg.acquire_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.idle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(cfg.max_conns, Some(1));
    }

    #[test]
    fn rejects_unknown_fields() {
        let res: Result<DbConnConfig, _> =
            serde_json::from_value(serde_json::json!({ "dns": "typo" }));
        assert!(res.is_err());
    }
}

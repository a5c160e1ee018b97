//! Module configuration.
//!
//! Loaded with figment from an optional YAML file, then overridden by
//! environment variables prefixed `RETAIL_OPS__` (`__` separates sections):
//!
//! ```yaml
//! database:
//!   dsn: "sqlite://retail.db?mode=rwc"
//!   max_conns: 4
//!   acquire_timeout: 5s
//! listing:
//!   default_limit: 20
//! security:
//!   super_admin_roles: [super_admin, platform_owner]
//! logging:
//!   level: debug
//!   json: true
//! ```
//!
//! `RETAIL_OPS__LISTING__MAX_LIMIT=50` overrides `listing.max_limit`.

use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use opskit_db::DbConnConfig;
use opskit_query::ListLimits;
use opskit_security::{DEFAULT_SUPER_ADMIN_ROLE, ScopeResolver};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "RETAIL_OPS__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetailOpsConfig {
    pub database: DbConnConfig,
    pub listing: ListingConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

/// `listing` section: caps applied to every list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ListingConfig {
    pub default_limit: u64,
    pub max_limit: u64,
    pub max_depth: usize,
    pub max_array_len: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        let limits = ListLimits::default();
        Self {
            default_limit: limits.default_limit,
            max_limit: limits.max_limit,
            max_depth: limits.max_depth,
            max_array_len: limits.max_array_len,
        }
    }
}

impl ListingConfig {
    #[must_use]
    pub fn limits(&self) -> ListLimits {
        ListLimits::new()
            .with_default_limit(self.default_limit)
            .with_max_limit(self.max_limit)
            .with_max_depth(self.max_depth)
            .with_max_array_len(self.max_array_len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SecurityConfig {
    /// Role names that bypass tenant scoping.
    pub super_admin_roles: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            super_admin_roles: vec![DEFAULT_SUPER_ADMIN_ROLE.to_owned()],
        }
    }
}

impl SecurityConfig {
    #[must_use]
    pub fn scope_resolver(&self) -> ScopeResolver {
        ScopeResolver::new(self.super_admin_roles.iter().map(|r| r.trim().to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl RetailOpsConfig {
    /// Defaults, then `path` if given, then `RETAIL_OPS__*` variables.
    ///
    /// # Errors
    /// Fails when the file cannot be parsed, a value has the wrong type, an
    /// unknown key is present, or [`RetailOpsConfig::validate`] rejects the result.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let cfg: Self = figment.extract().context("invalid retail-ops configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Listing caps outside the hard ceilings, or no super-admin role.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.listing
            .limits()
            .validate()
            .context("invalid `listing` section")?;
        if self
            .security
            .super_admin_roles
            .iter()
            .all(|r| r.trim().is_empty())
        {
            bail!("`security.super_admin_roles` must name at least one role");
        }
        if self.database.dsn.trim().is_empty() {
            bail!("`database.dsn` must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = RetailOpsConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.listing.limits(), ListLimits::default());
        assert_eq!(cfg.security.super_admin_roles, vec!["super_admin"]);
    }

    #[test]
    fn yaml_file_and_env_are_layered() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "listing:\n  default_limit: 20\nsecurity:\n  super_admin_roles: [root]\nlogging:\n  json: true"
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("RETAIL_OPS__LISTING__MAX_LIMIT", Some("50")),
                ("RETAIL_OPS__DATABASE__DSN", Some("sqlite://env.db?mode=rwc")),
            ],
            || {
                let cfg = RetailOpsConfig::load(Some(file.path())).unwrap();
                assert_eq!(cfg.listing.default_limit, 20);
                assert_eq!(cfg.listing.max_limit, 50);
                assert_eq!(cfg.security.super_admin_roles, vec!["root"]);
                assert!(cfg.logging.json);
                assert_eq!(cfg.database.dsn, "sqlite://env.db?mode=rwc");
            },
        );
    }

    #[test]
    fn limits_above_ceiling_are_rejected() {
        let mut cfg = RetailOpsConfig::default();
        cfg.listing.max_limit = 500;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_role_set_is_rejected() {
        let mut cfg = RetailOpsConfig::default();
        cfg.security.super_admin_roles = vec![" ".to_owned()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listing:\n  page_size: 20").unwrap();
        assert!(RetailOpsConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(RetailOpsConfig::load(Some(Path::new("/nonexistent/retail-ops.yaml"))).is_err());
    }
}

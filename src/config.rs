use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::sort::{SortDirection, SortField, SortSpec};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default)]
    pub default_sort: DefaultSortConfig,
}

/// Sort applied when a request names none.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultSortConfig {
    pub field: SortField,
    pub direction: SortDirection,
    pub limit: u32,
}

impl Default for DefaultSortConfig {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: SortDirection::Asc,
            limit: 100,
        }
    }
}

impl DefaultSortConfig {
    pub fn to_sort(&self) -> SortSpec {
        SortSpec::new(self.field, self.direction, Some(self.limit))
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_max_page_size() -> u32 {
    1000
}

#[derive(Serialize)]
struct AppConfigDefaults {
    bind_addr: String,
    max_connections: u32,
    acquire_timeout_secs: u64,
    max_page_size: u32,
    default_sort: DefaultSortConfig,
}

pub fn figment() -> Figment {
    Figment::from(Serialized::defaults(AppConfigDefaults {
        bind_addr: default_bind_addr(),
        max_connections: default_max_connections(),
        acquire_timeout_secs: default_acquire_timeout_secs(),
        max_page_size: default_max_page_size(),
        default_sort: DefaultSortConfig::default(),
    }))
    .merge(Toml::file("logpage.toml"))
    .merge(Env::prefixed("LOGPAGE_").split("__"))
}

/// Load configuration from defaults, `logpage.toml` and `LOGPAGE_*` env.
pub fn load_config() -> Result<AppConfig, figment::Error> {
    let config: AppConfig = figment().extract()?;

    if config.database_url.trim().is_empty() {
        return Err(figment::Error::from("database_url must be set"));
    }
    if config.default_sort.limit == 0 || config.default_sort.limit > config.max_page_size {
        return Err(figment::Error::from(
            "default_sort.limit must be between 1 and max_page_size",
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("LOGPAGE_DATABASE_URL", "postgres://logger@localhost/logger");
            jail.set_env("LOGPAGE_DEFAULT_SORT__DIRECTION", "desc");
            jail.set_env("LOGPAGE_DEFAULT_SORT__LIMIT", "25");

            let config = load_config().expect("config should load");
            assert_eq!(config.bind_addr, "0.0.0.0:8080");
            assert_eq!(config.max_page_size, 1000);
            assert_eq!(config.default_sort.to_sort().limit, Some(25));
            assert!(config.default_sort.direction.is_desc());
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_read() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "logpage.toml",
                r#"
                database_url = "postgres://logger@db/logger"
                bind_addr = "127.0.0.1:9000"

                [default_sort]
                field = "ts"
                direction = "asc"
                limit = 50
                "#,
            )?;

            let config = load_config().expect("config should load");
            assert_eq!(config.bind_addr, "127.0.0.1:9000");
            assert_eq!(config.default_sort.field, SortField::Ts);
            Ok(())
        });
    }

    #[test]
    fn missing_database_url_fails_fast() {
        Jail::expect_with(|jail| {
            jail.set_env("LOGPAGE_DATABASE_URL", "  ");
            assert!(load_config().is_err());
            Ok(())
        });
    }

    #[test]
    fn oversized_default_limit_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("LOGPAGE_DATABASE_URL", "postgres://localhost/logger");
            jail.set_env("LOGPAGE_DEFAULT_SORT__LIMIT", "5000");
            let err = load_config().unwrap_err();
            assert!(err.to_string().contains("max_page_size"));
            Ok(())
        });
    }
}

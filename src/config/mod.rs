use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("缺少环境变量 {0}")]
    Missing(&'static str),
    #[error("环境变量 {name} 无效: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub menu_cache_ttl_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub run_migrations: bool,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // JWT_EXPIRATION 允许写成 "24h"
        let jwt_expiration_secs = match optional("JWT_EXPIRATION") {
            Some(value) => parse_expiration_hours(&value).ok_or(ConfigError::Invalid {
                name: "JWT_EXPIRATION",
                value,
            })?,
            None => 24 * 3600,
        };

        let api_base_uri = optional("API_BASE_URI").unwrap_or_else(|| "/api".into());

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: optional("REDIS_URL"),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs,
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: parsed("RATE_LIMIT_REQUESTS", 10)?,
            menu_cache_ttl_secs: parsed("MENU_CACHE_TTL", 300)?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parsed("SERVER_PORT", 3000)?,
            api_base_uri: normalize_base_uri(&api_base_uri),
            run_migrations: parsed("RUN_MIGRATIONS", false)?,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn menu_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.menu_cache_ttl_secs)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            database_url: String::new(),
            redis_url: None,
            jwt_secret: "test-secret".into(),
            jwt_expiration_secs: 3600,
            rate_limit_window_secs: 60,
            rate_limit_requests: 10,
            menu_cache_ttl_secs: 300,
            server_host: "127.0.0.1".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            run_migrations: false,
        }
    }
}

/// 小时数换算成秒，上限为 i64 可表示的秒数
fn parse_expiration_hours(raw: &str) -> Option<u64> {
    raw.trim()
        .trim_end_matches('h')
        .parse::<u64>()
        .ok()?
        .checked_mul(3600)
        .filter(|secs| i64::try_from(*secs).is_ok())
}

/// axum 的 nest 要求前缀以 `/` 开头且不以 `/` 结尾
fn normalize_base_uri(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/api".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

use std::env;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_DATABASE_URL: &str = "sqlite://.";
const DEFAULT_DB_NAME: &str = "taskmanager";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ALLOWED_ORIGINS: [&str; 6] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:5174",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:5174",
];
const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("invalid CORS origin {0:?}")]
    InvalidOrigin(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub db_name: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            },
            None => DEFAULT_PORT,
        };

        let allowed_origins = match var("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            db_name: var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            port,
            allowed_origins,
        })
    }

    /// Matches `sqlite::memory:`, `sqlite://:memory:` and `mode=memory` URLs.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// sqlx URL to connect to. In-memory URLs and URLs already naming a
    /// `.db` file are used as-is; anything else is a directory holding
    /// `<db_name>.db`.
    pub fn database_location(&self) -> String {
        let path = self.database_url.split('?').next().unwrap_or_default();
        if self.is_in_memory() || path.ends_with(".db") {
            return self.database_url.clone();
        }
        format!(
            "{}/{}.db",
            self.database_url.trim_end_matches('/'),
            self.db_name
        )
    }

    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                // a wildcard cannot be combined with credentials
                if origin == "*" {
                    return Err(ConfigError::InvalidOrigin(origin.clone()));
                }
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
            ])
            .expose_headers([header::CONTENT_LENGTH])
            .allow_credentials(true)
            .max_age(CORS_MAX_AGE))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_name, "taskmanager");
        assert_eq!(config.database_location(), "sqlite://./taskmanager.db");
        assert_eq!(config.allowed_origins.len(), 6);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config_from(&[("PORT", ""), ("DB_NAME", "")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_name, "taskmanager");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite:///var/lib/tasks/"),
            ("DB_NAME", "prod"),
            ("PORT", "9000"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_location(), "sqlite:///var/lib/tasks/prod.db");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn in_memory_url_ignores_db_name() {
        let config = config_from(&[("DATABASE_URL", IN_MEMORY_URL), ("DB_NAME", "x")]).unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.database_location(), IN_MEMORY_URL);
    }

    #[test]
    fn other_in_memory_forms_are_recognised() {
        for url in ["sqlite://:memory:", "sqlite::memory:?cache=shared", "sqlite:file:tasks?mode=memory"] {
            let config = config_from(&[("DATABASE_URL", url)]).unwrap();
            assert!(config.is_in_memory(), "{url} should be in-memory");
            assert_eq!(config.database_location(), url);
        }
    }

    #[test]
    fn file_url_is_kept_as_is() {
        let config = config_from(&[("DATABASE_URL", "sqlite://tasks.db")]).unwrap();
        assert!(!config.is_in_memory());
        assert_eq!(config.database_location(), "sqlite://tasks.db");

        let config = config_from(&[("DATABASE_URL", "sqlite://tasks.db?mode=rwc")]).unwrap();
        assert_eq!(config.database_location(), "sqlite://tasks.db?mode=rwc");
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(matches!(config_from(&[("PORT", "http")]), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(config_from(&[("PORT", "0")]), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(config_from(&[("PORT", "70000")]), Err(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn bad_origin_is_rejected() {
        let config = config_from(&[("CORS_ALLOWED_ORIGINS", "http://ok.example,bad\norigin")]).unwrap();
        assert!(matches!(config.cors_layer(), Err(ConfigError::InvalidOrigin(_))));
    }

    #[test]
    fn wildcard_origin_is_rejected() {
        for raw in ["*", "http://ok.example, *"] {
            let config = config_from(&[("CORS_ALLOWED_ORIGINS", raw)]).unwrap();
            assert!(matches!(
                config.cors_layer(),
                Err(ConfigError::InvalidOrigin(origin)) if origin == "*"
            ));
        }
    }
}

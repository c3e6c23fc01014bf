use std::env;

use anyhow::{Context, bail};

pub const DEFAULT_PORT: u16 = 4000;

/// Storage backend, picked from the scheme of the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDb,
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme).unwrap_or("");
        match scheme.to_ascii_lowercase().as_str() {
            "mongodb" | "mongodb+srv" => Ok(Self::MongoDb),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("unsupported database scheme `{other}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: Option<String>,
    pub backend: StorageBackend,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB"))
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL (or DB) must be set")?;
        let backend = StorageBackend::from_url(&database_url)?;
        let database_name = lookup("DATABASE_NAME").filter(|name| !name.is_empty());
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT").or_else(|| lookup("APP_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid port `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url,
            database_name,
            backend,
            host,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_port_and_host() {
        let config = config_from(&[("DATABASE_URL", "mongodb://localhost:27017/shop")]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.backend, StorageBackend::MongoDb);
    }

    #[test]
    fn accepts_legacy_db_variable() {
        let config = config_from(&[("DB", "memory://"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn missing_connection_string_is_an_error() {
        let err = config_from(&[("PORT", "4000")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config_from(&[("DATABASE_URL", "memory://"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn backend_from_scheme() {
        assert_eq!(
            StorageBackend::from_url("postgresql://u:p@localhost/db").unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            StorageBackend::from_url("mongodb+srv://cluster.example.net").unwrap(),
            StorageBackend::MongoDb
        );
        assert!(StorageBackend::from_url("mysql://localhost").is_err());
        assert!(StorageBackend::from_url("localhost:27017").is_err());
    }
}

use config::{Config, ConfigBuilder, ConfigError, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
    /// Insert the development profiles, courses and posts on startup
    pub seed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainCheckMode {
    Simulated,
    Resolving,
}

#[derive(Debug, Deserialize)]
pub struct DomainCheck {
    pub mode: DomainCheckMode,
    pub simulated_delay_ms: u64,
    pub attempts: u32,
    pub backoff_ms: u64,
    pub timeout_ms: u64,
}

impl DomainCheck {
    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct DemoStore {
    /// JSON file backing the demo collections; empty keeps them in memory
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub domain_check: DomainCheck,
    pub demo_store: DemoStore,
    pub rate_limit: RateLimit,
}

/// Environment variables and the settings keys they override
const ENV_OVERRIDES: [(&str, &str); 7] = [
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("DATABASE_PATH", "database.path"),
    ("SEED_DATA", "database.seed"),
    ("DOMAIN_CHECK_MODE", "domain_check.mode"),
    ("DEMO_STORE_PATH", "demo_store.path"),
    ("RATE_LIMIT_MAX_REQUESTS", "rate_limit.max_requests"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_file_name = "settings.toml";
        let candidates = [
            PathBuf::from(config_file_name),
            PathBuf::from("cohort-server").join(config_file_name),
        ];
        Self::load(&candidates, |key| std::env::var(key).ok())
    }

    /// Layer built-in defaults, any existing settings files, then environment overrides.
    pub fn load<F>(files: &[PathBuf], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::defaults(Config::builder())?;

        for path in files {
            if path.exists() {
                builder = builder.add_source(File::from(path.clone()).required(false));
            }
        }

        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = env(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    fn defaults(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        // 0.0.0.0 accepts external connections; set HOST for local-only development
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "cohort.db")?
            .set_default("database.seed", true)?
            .set_default("domain_check.mode", "simulated")?
            .set_default("domain_check.simulated_delay_ms", 1500)?
            .set_default("domain_check.attempts", 3)?
            .set_default("domain_check.backoff_ms", 250)?
            .set_default("domain_check.timeout_ms", 5000)?
            .set_default("demo_store.path", "demo_store.json")?
            .set_default("rate_limit.max_requests", 100)?
            .set_default("rate_limit.window_seconds", 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load(&[], no_env).unwrap();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.database.path, "cohort.db");
        assert!(settings.database.seed);
        assert_eq!(settings.domain_check.mode, DomainCheckMode::Simulated);
        assert_eq!(settings.domain_check.simulated_delay(), Duration::from_millis(1500));
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.rate_limit.window_seconds, 60);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.toml");
        std::fs::write(
            &file,
            "[server]\nport = 8080\n\n[database]\npath = \"from-file.db\"\n\n[domain_check]\nmode = \"resolving\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = [("DATABASE_PATH", ":memory:"), ("SEED_DATA", "false"), ("RATE_LIMIT_MAX_REQUESTS", "5")]
            .into_iter()
            .collect();
        let settings = Settings::load(&[file], |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.path, ":memory:");
        assert!(!settings.database.seed);
        assert_eq!(settings.domain_check.mode, DomainCheckMode::Resolving);
        assert_eq!(settings.rate_limit.max_requests, 5);
    }

    #[test]
    fn test_invalid_mode_is_an_error() {
        let result = Settings::load(&[], |key| (key == "DOMAIN_CHECK_MODE").then(|| "psychic".to_string()));
        assert!(result.is_err());
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "coursehub.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub leaderboard_default_limit: usize,
    pub leaderboard_max_limit: usize,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Account created at startup when no user has its username yet.
    pub admin: Option<AdminAccount>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: "postgres://localhost/coursehub".to_string(),
            jwt_secret: "change-me".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            leaderboard_default_limit: 50,
            leaderboard_max_limit: 200,
            cors_origins: Vec::new(),
            admin: None,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize server config")
    }

    /// Reads `path` when it exists, falls back to defaults otherwise, then
    /// applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        self
    }

    /// Clamps a requested leaderboard size to the configured bounds.
    pub fn leaderboard_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.leaderboard_default_limit)
            .clamp(1, self.leaderboard_max_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ServerConfig::from_str(
            r#"
bind_addr = "127.0.0.1:3000"
access_token_ttl_minutes = 5
"#,
        )
        .expect("config should parse");

        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.access_token_ttl_minutes, 5);
        assert_eq!(config.refresh_token_ttl_days, 7);
        assert_eq!(config.leaderboard_default_limit, 50);
    }

    #[test]
    fn test_admin_section() {
        let config = ServerConfig::from_str(
            r#"
[admin]
username = "root"
email = "root@coursehub.dev"
password = "change-me-now"
"#,
        )
        .expect("config should parse");

        let admin = config.admin.expect("admin section");
        assert_eq!(admin.username, "root");
        assert_eq!(admin.email, "root@coursehub.dev");
    }

    #[test]
    fn test_env_overrides_win() {
        let config = ServerConfig::default().with_overrides(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            "JWT_SECRET" => Some("s3cret".to_string()),
            _ => None,
        });

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load("does-not-exist/coursehub.toml").expect("defaults");
        assert_eq!(config.leaderboard_max_limit, 200);
    }

    #[test]
    fn test_leaderboard_limit_is_clamped() {
        let config = ServerConfig::default();

        assert_eq!(config.leaderboard_limit(None), 50);
        assert_eq!(config.leaderboard_limit(Some(0)), 1);
        assert_eq!(config.leaderboard_limit(Some(500)), 200);
        assert_eq!(config.leaderboard_limit(Some(10)), 10);
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        assert!(ServerConfig::from_str("refresh_token_ttl_days = \"week\"").is_err());
    }
}

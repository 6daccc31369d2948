use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Production turns on the `Secure` attribute of the session cookie
    #[serde(default)]
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            environment: Environment::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Project identifier, used as issuer and audience of every token
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// HMAC secret for identity tokens and session cookies
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
    /// Lifetime of identity tokens in seconds (default: 3600)
    #[serde(default = "default_id_token_ttl")]
    pub id_token_ttl_secs: i64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            signing_secret: default_signing_secret(),
            id_token_ttl_secs: default_id_token_ttl(),
        }
    }
}

fn default_project_id() -> String {
    "mockview-local".to_string()
}

fn default_signing_secret() -> String {
    // Sessions do not survive a restart unless a secret is configured
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

fn default_id_token_ttl() -> i64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the service exposing /api/vapi/generate
    #[serde(default = "default_generation_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_url(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_generation_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_generation_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            identity: IdentityConfig::default(),
            generation: GenerationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.identity.id_token_ttl_secs, 3600);
        assert_eq!(config.identity.signing_secret.len(), 64);
        assert_eq!(config.generation.base_url, "http://localhost:3000");
        assert!(!config.is_production());
    }

    #[test]
    fn test_production_environment() {
        let config = Config::parse(
            r#"
            [server]
            environment = "production"
            port = 8080

            [identity]
            project_id = "prep-prod"
            signing_secret = "s3cret"
            "#,
        )
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.identity.project_id, "prep-prod");
        assert_eq!(config.identity.signing_secret, "s3cret");
    }

    #[test]
    fn test_invalid_environment_rejected() {
        assert!(Config::parse("[server]\nenvironment = \"staging\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/mockview.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }
}

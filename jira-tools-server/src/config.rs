//! Configuration management for the Jira tools server
//!
//! Handles loading configuration from a `.env` file, environment variables and
//! an optional TOML file, with sensible defaults for everything but the
//! connection itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

/// Main configuration structure for the Jira tools server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// JIRA instance URL (required)
    pub jira_url: String,

    /// Authentication configuration (required)
    pub auth: AuthConfig,

    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuthConfig {
    /// Personal Access Token (recommended)
    PersonalAccessToken(String),

    /// Basic authentication (username + password or API token)
    Basic { username: String, password: String },

    /// Anonymous access (limited functionality)
    Anonymous,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            jira_url: String::new(),
            auth: AuthConfig::Anonymous,
            request_timeout_seconds: 30,
        }
    }
}

impl JiraConfig {
    /// Load configuration from `.env`, TOML file, environment variables and defaults
    /// Priority: env vars > TOML file > defaults
    pub fn load() -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            debug!("Loaded environment from .env file");
        }

        let mut config = Self::default();

        if let Ok(file_config) = Self::load_from_file("config/jira-tools-config.toml") {
            info!("Loaded configuration from TOML file");
            config = file_config;
        } else if let Ok(file_config) = Self::load_from_file("jira-tools-config.toml") {
            info!("Loaded configuration from TOML file in current directory");
            config = file_config;
        } else {
            debug!("No TOML configuration file found, using defaults and environment variables");
        }

        config.load_from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("JIRA_URL") {
            self.jira_url = url;
            debug!("Loaded JIRA_URL from environment");
        }

        if let Ok(token) = env::var("JIRA_PERSONAL_ACCESS_TOKEN") {
            self.auth = AuthConfig::PersonalAccessToken(token);
            debug!("Configured Personal Access Token authentication from environment");
        }

        // An explicit auth type wins over the bare token variable
        if let Ok(auth_type) = env::var("JIRA_AUTH_TYPE") {
            match auth_type.to_lowercase().as_str() {
                "pat" | "personal_access_token" | "bearer" => {
                    if let Ok(token) = env::var("JIRA_TOKEN") {
                        self.auth = AuthConfig::PersonalAccessToken(token);
                        debug!("Configured token authentication from JIRA_TOKEN");
                    }
                }
                "basic" => {
                    let username = env::var("JIRA_USERNAME")
                        .context("JIRA_USERNAME required for basic authentication")?;
                    let password = env::var("JIRA_PASSWORD")
                        .context("JIRA_PASSWORD required for basic authentication")?;
                    self.auth = AuthConfig::Basic { username, password };
                    debug!("Configured basic authentication from environment");
                }
                "anonymous" => {
                    self.auth = AuthConfig::Anonymous;
                    debug!("Configured anonymous authentication from environment");
                }
                _ => {
                    warn!("Unknown JIRA_AUTH_TYPE: {}, using default", auth_type);
                }
            }
        }

        if let Ok(timeout) = env::var("JIRA_REQUEST_TIMEOUT") {
            if let Ok(timeout_seconds) = timeout.parse::<u64>() {
                self.request_timeout_seconds = timeout_seconds;
                debug!(
                    "Set request timeout to {} seconds from environment",
                    timeout_seconds
                );
            }
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.jira_url.is_empty() {
            return Err(anyhow::anyhow!(
                "JIRA URL is required. Set JIRA_URL environment variable or configure in TOML file."
            ));
        }

        if !self.jira_url.starts_with("http://") && !self.jira_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "JIRA URL must start with http:// or https://. Got: {}",
                self.jira_url
            ));
        }

        match &self.auth {
            AuthConfig::PersonalAccessToken(token) => {
                if token.is_empty() {
                    return Err(anyhow::anyhow!("Personal access token cannot be empty"));
                }
            }
            AuthConfig::Basic { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Username and password cannot be empty for basic auth"
                    ));
                }
            }
            AuthConfig::Anonymous => {
                info!("Using anonymous authentication - functionality may be limited");
            }
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("request_timeout_seconds must be greater than 0"));
        }

        info!("Configuration validation successful");
        Ok(())
    }

    /// The configured URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.jira_url.trim_end_matches('/')
    }

    /// Get the gouqi Credentials from AuthConfig
    pub fn to_gouqi_credentials(&self) -> gouqi::Credentials {
        match &self.auth {
            AuthConfig::PersonalAccessToken(token) => gouqi::Credentials::Bearer(token.clone()),
            AuthConfig::Basic { username, password } => {
                gouqi::Credentials::Basic(username.clone(), password.clone())
            }
            AuthConfig::Anonymous => gouqi::Credentials::Anonymous,
        }
    }
}

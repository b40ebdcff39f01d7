//! Configuration module for the mail composer.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{ComposerError, Result};

/// Composer behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposerConfig {
    /// How long a successful submission stays on screen before the
    /// draft resets, in milliseconds.
    #[serde(default = "default_reset_delay")]
    pub reset_delay_ms: u64,
}

fn default_reset_delay() -> u64 {
    3000
}

impl ComposerConfig {
    /// The reset delay as a [`Duration`].
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: default_reset_delay(),
        }
    }
}

/// SMTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    #[serde(default)]
    pub host: String,
    /// SMTP server port. Defaults to 587 (STARTTLS submission port).
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Username for authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Address used in the `From` header.
    #[serde(default)]
    pub from_address: String,
    /// Whether to use STARTTLS.
    #[serde(default = "default_tls")]
    pub tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_tls() -> bool {
    true
}

impl SmtpConfig {
    /// Create a new SMTP configuration with default port and TLS.
    pub fn new(host: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from_address: from_address.into(),
            tls: default_tls(),
        }
    }

    /// Set authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Override the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable TLS.
    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Validate the SMTP settings.
    ///
    /// Returns an error if:
    /// - Host is empty
    /// - Port is zero
    /// - From address is empty
    /// - A username is given without a password
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ComposerError::Config("SMTP host is required".to_string()));
        }
        if self.port == 0 {
            return Err(ComposerError::Config("SMTP port is required".to_string()));
        }
        if self.from_address.trim().is_empty() {
            return Err(ComposerError::Config(
                "sender email address is required".to_string(),
            ));
        }
        let has_username = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let has_password = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if has_username && !has_password {
            return Err(ComposerError::Config("password is required".to_string()));
        }
        Ok(())
    }
}

/// Sent history configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of records kept; the oldest are dropped first.
    #[serde(default = "default_history_max_entries")]
    pub max_entries: usize,
}

fn default_history_max_entries() -> usize {
    500
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_history_max_entries(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mailcomposer.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Composer configuration.
    #[serde(default)]
    pub composer: ComposerConfig,
    /// SMTP configuration. Without it no mail can be sent.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Sent history configuration.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ComposerError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ComposerError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MAILCOMPOSER_SMTP_PASSWORD`: Override the SMTP password
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("MAILCOMPOSER_SMTP_PASSWORD") {
            self.override_smtp_password(password);
        }
    }

    fn override_smtp_password(&mut self, password: String) {
        if password.is_empty() {
            return;
        }
        if let Some(smtp) = self.smtp.as_mut() {
            smtp.password = Some(password);
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the SMTP section is present but incomplete.
    pub fn validate(&self) -> Result<()> {
        if let Some(smtp) = &self.smtp {
            smtp.validate()?;
        }
        Ok(())
    }
}

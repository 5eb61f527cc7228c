//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables (`GREETD_SOCK`)
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod types;

use types::{DaemonConfig, DisplayConfig, RetryConfig, SessionsConfig, UsersConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    /// greetd connection
    pub daemon: DaemonConfig,
    /// Retry policy
    pub retry: RetryConfig,
    /// User enumeration
    pub users: UsersConfig,
    /// Session discovery
    pub sessions: SessionsConfig,
    /// Greeting display
    pub display: DisplayConfig,
}

impl GreeterConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: GreeterConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.users.min_uid > self.users.max_uid {
            anyhow::bail!(
                "users.min_uid ({}) cannot be greater than users.max_uid ({})",
                self.users.min_uid,
                self.users.max_uid
            );
        }

        for entry in &self.sessions.environment {
            match entry.split_once('=') {
                Some((key, _)) if !key.trim().is_empty() => {}
                _ => anyhow::bail!("Invalid session environment entry: {:?}", entry),
            }
        }

        if let Some(command) = &self.sessions.fallback_command {
            if command.trim().is_empty() {
                anyhow::bail!("sessions.fallback_command must not be blank");
            }
        }

        if let Some(socket) = &self.daemon.socket_path {
            if socket.as_os_str().is_empty() {
                anyhow::bail!("daemon.socket_path must not be empty");
            }
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        socket: Option<PathBuf>,
        command: Option<String>,
        max_attempts: Option<u32>,
    ) -> Self {
        if socket.is_some() {
            self.daemon.socket_path = socket;
        }
        if command.is_some() {
            self.sessions.fallback_command = command;
        }
        if let Some(attempts) = max_attempts {
            self.retry.max_attempts = attempts;
        }

        self
    }
}

//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::model::os_release::OS_RELEASE_PATH;

/// greetd connection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Socket path (None = read `GREETD_SOCK`)
    pub socket_path: Option<PathBuf>,
}

/// Attempt retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of login attempts
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Backoff multiplier applied per failed attempt
    pub backoff_multiplier: u32,
}

impl RetryConfig {
    /// Backoff before retrying after failed attempt number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.backoff_multiplier).saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1000,
            backoff_multiplier: 2,
        }
    }
}

/// User enumeration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    /// passwd file to read accounts from
    pub passwd_path: PathBuf,

    /// Lowest uid offered
    pub min_uid: u32,

    /// Highest uid offered
    pub max_uid: u32,

    /// Accounts whose shell ends with one of these are hidden
    pub hidden_shells: Vec<String>,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            passwd_path: PathBuf::from("/etc/passwd"),
            min_uid: 1000,
            max_uid: 60000,
            hidden_shells: vec!["/nologin".to_string(), "/false".to_string()],
        }
    }
}

/// Session discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Directory of Wayland session entries
    pub wayland_dir: PathBuf,

    /// Directory of X11 session entries
    pub x11_dir: PathBuf,

    /// Command to launch when no sessions are installed (None = prompt)
    pub fallback_command: Option<String>,

    /// Extra `KEY=VALUE` entries appended to every session environment
    pub environment: Vec<String>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            wayland_dir: PathBuf::from("/usr/share/wayland-sessions"),
            x11_dir: PathBuf::from("/usr/share/xsessions"),
            fallback_command: None,
            environment: Vec::new(),
        }
    }
}

/// Greeting display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Print the host/OS banner before prompting
    pub show_banner: bool,

    /// os-release file for the banner
    pub os_release_path: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_banner: true,
            os_release_path: PathBuf::from(OS_RELEASE_PATH),
        }
    }
}

//! Local user accounts

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::types::UsersConfig;

/// A login candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Account name sent in `CreateSession`
    pub name: String,

    /// Home directory
    pub home_dir: PathBuf,
}

impl User {
    /// Create a user with an explicit home directory
    pub fn new(name: impl Into<String>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            home_dir: home_dir.into(),
        }
    }

    /// Synthesize a user from a typed name, assuming `/home/<name>`
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let home_dir = Path::new("/home").join(&name);
        Self { name, home_dir }
    }
}

/// Load human accounts from the configured passwd file
///
/// Returns an empty list when the file cannot be read.
pub async fn load_system_users(config: &UsersConfig) -> Vec<User> {
    match tokio::fs::read_to_string(&config.passwd_path).await {
        Ok(content) => {
            let users = parse_passwd(&content, config);
            debug!(
                "Loaded {} users from {}",
                users.len(),
                config.passwd_path.display()
            );
            users
        }
        Err(e) => {
            warn!(
                "Failed to read {}: {}",
                config.passwd_path.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Parse passwd(5) content, keeping accounts in the uid window with a
/// login shell
pub fn parse_passwd(content: &str, config: &UsersConfig) -> Vec<User> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').map(str::trim).collect();
            if fields.len() < 7 {
                return None;
            }

            let uid: u32 = fields[2].parse().ok()?;
            if uid < config.min_uid || uid > config.max_uid {
                return None;
            }

            let shell = fields[6];
            if config
                .hidden_shells
                .iter()
                .any(|suffix| shell.ends_with(suffix.as_str()))
            {
                return None;
            }

            Some(User::new(fields[0], fields[5]))
        })
        .collect()
}

//! os-release(5) identification for the greeting banner

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Default location of the os-release file
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Operating system identification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// Human-readable OS name
    pub name: String,
}

impl OsRelease {
    /// Read and parse an os-release file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    /// Parse os-release content
    ///
    /// Name precedence: `PRETTY_NAME`, `NAME`, `ID`, then "Unknown OS".
    pub fn parse(content: &str) -> Self {
        let fields: HashMap<String, String> = content
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| {
                (
                    key.trim().to_ascii_uppercase(),
                    value.trim().trim_matches('"').to_string(),
                )
            })
            .collect();

        let name = ["PRETTY_NAME", "NAME", "ID"]
            .iter()
            .find_map(|key| fields.get(*key))
            .cloned()
            .unwrap_or_else(|| "Unknown OS".to_string());

        Self { name }
    }

    /// One-line greeting for `host`
    pub fn banner(&self, host: &str) -> String {
        format!("Authenticate into {} ({}).", host, self.name)
    }
}

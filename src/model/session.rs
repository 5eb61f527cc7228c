//! Session definitions
//!
//! Sessions come from freedesktop `.desktop` entries in the Wayland and X11
//! session directories, or from a command typed at the prompt.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::types::SessionsConfig;
use crate::error::{GreeterError, Result};

/// Where a session definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Typed command or other unclassified origin
    Unknown,
    /// Wayland session entry
    Wayland,
    /// X11 session entry
    X11,
}

impl SessionKind {
    /// Graphical sessions come from a session directory
    pub fn is_graphical(self) -> bool {
        matches!(self, SessionKind::Wayland | SessionKind::X11)
    }
}

/// A launchable session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Origin classification
    pub kind: SessionKind,

    /// Display name
    pub name: String,

    /// Launch command line, passed through untokenized
    pub command: String,

    /// `KEY=VALUE` environment entries, in order
    pub environment: Vec<String>,
}

impl Session {
    /// Build a session from a typed command line
    pub fn from_command(command: impl Into<String>, environment: Vec<String>) -> Result<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(GreeterError::Hook(
                "session command must not be empty".to_string(),
            ));
        }

        Ok(Self {
            kind: SessionKind::Unknown,
            name: command.clone(),
            command,
            environment,
        })
    }

    /// Append extra environment entries
    pub fn with_environment(mut self, extra: &[String]) -> Self {
        self.environment.extend(extra.iter().cloned());
        self
    }
}

/// Load every installed session: Wayland entries first, then X11
pub async fn load_available_sessions(
    config: &SessionsConfig,
    cancel: &CancellationToken,
) -> Vec<Session> {
    let mut sessions =
        load_sessions_from_directory(&config.wayland_dir, SessionKind::Wayland, cancel).await;
    sessions.extend(load_sessions_from_directory(&config.x11_dir, SessionKind::X11, cancel).await);

    debug!("Discovered {} sessions", sessions.len());
    sessions
}

async fn load_sessions_from_directory(
    directory: &Path,
    kind: SessionKind,
    cancel: &CancellationToken,
) -> Vec<Session> {
    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping session directory {}: {}", directory.display(), e);
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "desktop") {
                    files.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Error listing {}: {}", directory.display(), e);
                break;
            }
        }
    }
    files.sort();

    let mut sessions = Vec::new();
    for file in files {
        if cancel.is_cancelled() {
            break;
        }

        let content = match tokio::fs::read_to_string(&file).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read session entry {}: {}", file.display(), e);
                continue;
            }
        };

        if let Some(session) = session_from_desktop_entry(&content, kind) {
            sessions.push(session);
        }
    }

    sessions
}

fn session_from_desktop_entry(content: &str, kind: SessionKind) -> Option<Session> {
    let groups = parse_desktop_entry(content);
    let entry = groups.get("Desktop Entry")?;

    if let Some(try_exec) = entry.get("TryExec") {
        if which(try_exec).is_none() {
            debug!("Skipping session, TryExec not found: {}", try_exec);
            return None;
        }
    }

    let name = entry.get("Name")?;
    let command = entry.get("Exec")?;

    Some(Session {
        kind,
        name: name.clone(),
        command: command.clone(),
        environment: Vec::new(),
    })
}

/// Parse a desktop entry into `group -> key -> value`
///
/// Lines outside any group are ignored. Later keys override earlier ones.
pub fn parse_desktop_entry(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut groups: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
            let group = line[1..line.len() - 1].trim().to_string();
            groups.entry(group.clone()).or_default();
            current = Some(group);
        } else if let Some(group) = &current {
            if let Some((key, value)) = line.split_once('=') {
                if let Some(map) = groups.get_mut(group) {
                    map.insert(key.trim().to_string(), value.trim().to_string());
                }
            }
        }
    }

    groups
}

/// Resolve a program name the way `TryExec` expects
fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

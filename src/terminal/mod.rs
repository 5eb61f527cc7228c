//! Terminal Greeter
//!
//! Plain-text [`GreeterHooks`] implementation over a line-oriented input
//! and an output stream, normally stdin/stdout on the greeter's VT.
//!
//! Selection policy for users and sessions:
//! - none discovered: free-text entry (or the configured fallback command)
//! - exactly one: chosen without asking
//! - several: numbered menu
//!
//! Every read races the attempt's cancellation token.

pub mod echo;

use async_trait::async_trait;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::types::{DisplayConfig, SessionsConfig};
use crate::error::{GreeterError, Result};
use crate::greeter::GreeterHooks;
use crate::model::{OsRelease, Session, User};
use echo::EchoGuard;

const PROMPT_MARK: &str = "\u{203A}";

/// Hooks that talk to a terminal
pub struct TerminalGreeter<R, W> {
    input: R,
    output: W,
    users: Vec<User>,
    sessions: Vec<Session>,
    fallback_command: Option<String>,
    session_env: Vec<String>,
    mask_secrets: bool,
    selected_user: Option<User>,
    selected_session: Option<Session>,
}

impl TerminalGreeter<BufReader<Stdin>, Stdout> {
    /// Greeter on the process's stdin/stdout, masking secrets on a TTY
    pub fn stdio(users: Vec<User>, sessions: Vec<Session>, config: &SessionsConfig) -> Self {
        TerminalGreeter::new(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            users,
            sessions,
        )
        .with_fallback_command(config.fallback_command.clone())
        .with_session_environment(config.environment.clone())
        .with_secret_masking(true)
    }
}

impl<R, W> TerminalGreeter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a greeter over arbitrary streams
    pub fn new(input: R, output: W, users: Vec<User>, sessions: Vec<Session>) -> Self {
        Self {
            input,
            output,
            users,
            sessions,
            fallback_command: None,
            session_env: Vec::new(),
            mask_secrets: false,
            selected_user: None,
            selected_session: None,
        }
    }

    /// Command used without prompting when no sessions are installed
    pub fn with_fallback_command(mut self, command: Option<String>) -> Self {
        self.fallback_command = command;
        self
    }

    /// Entries appended to every selected session's environment
    pub fn with_session_environment(mut self, env: Vec<String>) -> Self {
        self.session_env = env;
        self
    }

    /// Disable terminal echo while reading secret answers
    pub fn with_secret_masking(mut self, enabled: bool) -> Self {
        self.mask_secrets = enabled;
        self
    }

    /// Output stream, for inspection
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Write one line of output
    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.write(&format!("{text}\n")).await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output
            .write_all(text.as_bytes())
            .await
            .map_err(|e| GreeterError::Hook(format!("terminal write failed: {e}")))?;
        self.output
            .flush()
            .await
            .map_err(|e| GreeterError::Hook(format!("terminal write failed: {e}")))
    }

    async fn read_line(&mut self, cancel: &CancellationToken) -> Result<String> {
        let mut line = String::new();

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GreeterError::Cancelled),
            result = self.input.read_line(&mut line) => result
                .map_err(|e| GreeterError::Hook(format!("terminal read failed: {e}")))?,
        };

        if read == 0 {
            return Err(GreeterError::Hook("terminal input closed".to_string()));
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn ask(&mut self, label: &str, cancel: &CancellationToken) -> Result<String> {
        loop {
            self.write(&format!("{label} {PROMPT_MARK} ")).await?;
            let answer = self.read_line(cancel).await?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
        }
    }

    async fn ask_secret(&mut self, label: &str, cancel: &CancellationToken) -> Result<String> {
        self.write(&format!("{label} {PROMPT_MARK} ")).await?;

        let guard = if self.mask_secrets {
            EchoGuard::disable()
                .map_err(|e| GreeterError::Hook(format!("failed to disable echo: {e}")))?
        } else {
            None
        };

        let answer = self.read_line(cancel).await;
        drop(guard);
        answer
    }

    async fn choose(
        &mut self,
        title: &str,
        names: &[String],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        self.say(&format!("{title}:")).await?;
        for (i, name) in names.iter().enumerate() {
            self.say(&format!("  {}) {}", i + 1, name)).await?;
        }

        loop {
            let answer = self.ask("Number", cancel).await?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=names.len()).contains(&n) => return Ok(n - 1),
                _ => {
                    self.say(&format!("Enter a number between 1 and {}", names.len()))
                        .await?
                }
            }
        }
    }

    async fn pick_user(&mut self, cancel: &CancellationToken) -> Result<User> {
        match self.users.len() {
            0 => {
                let name = self.ask("Enter user", cancel).await?;
                Ok(User::from_name(name))
            }
            1 => Ok(self.users[0].clone()),
            _ => {
                let names: Vec<String> = self.users.iter().map(|u| u.name.clone()).collect();
                let index = self.choose("Select user", &names, cancel).await?;
                Ok(self.users[index].clone())
            }
        }
    }

    async fn pick_session(&mut self, cancel: &CancellationToken) -> Result<Session> {
        match self.sessions.len() {
            0 => {
                let command = match self.fallback_command.clone() {
                    Some(command) => command,
                    None => self.ask("Enter command", cancel).await?,
                };
                Session::from_command(command, Vec::new())
            }
            1 => Ok(self.sessions[0].clone()),
            _ => {
                let names: Vec<String> = self.sessions.iter().map(|s| s.name.clone()).collect();
                let index = self.choose("Select session", &names, cancel).await?;
                Ok(self.sessions[index].clone())
            }
        }
    }
}

#[async_trait]
impl<R, W> GreeterHooks for TerminalGreeter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn select_user(&mut self, cancel: &CancellationToken) -> Result<User> {
        let user = self.pick_user(cancel).await?;
        self.say(&format!("\u{25B6} Logging in as {}...", user.name))
            .await?;
        self.selected_user = Some(user.clone());
        Ok(user)
    }

    async fn select_session(&mut self, cancel: &CancellationToken) -> Result<Session> {
        let session = self
            .pick_session(cancel)
            .await?
            .with_environment(&self.session_env);
        self.say(&format!("\u{25B6} Selected {}.", session.name))
            .await?;
        debug!("Session command: {}", session.command);
        self.selected_session = Some(session.clone());
        Ok(session)
    }

    async fn on_authenticated(&mut self, _cancel: &CancellationToken) -> Result<()> {
        let name = self
            .selected_user
            .as_ref()
            .map_or("unknown", |u| u.name.as_str())
            .to_string();
        self.say(&format!("Welcome {name}!")).await
    }

    async fn on_session_started(&mut self, _cancel: &CancellationToken) -> Result<()> {
        let name = self
            .selected_session
            .as_ref()
            .map_or("unknown", |s| s.name.as_str())
            .to_string();
        self.say(&format!("Entering {name}, enjoy!")).await
    }

    async fn on_error(&mut self, message: &str, _cancel: &CancellationToken) -> Result<()> {
        self.say(&format!("\u{2716} {message}")).await
    }

    async fn on_auth_failure(&mut self, message: &str, _cancel: &CancellationToken) -> Result<()> {
        self.say(&format!("\u{2716} {message}")).await
    }

    async fn prompt(
        &mut self,
        message: &str,
        secret: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let label = message.trim().trim_end_matches(':').trim().to_string();

        if !secret {
            return self.ask(&label, cancel).await.map(Some);
        }

        let answer = self.ask_secret(&label, cancel).await?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }

    async fn on_info(&mut self, message: &str, _cancel: &CancellationToken) -> Result<()> {
        self.say(&format!("\u{2139} {message}")).await
    }
}

/// Greeting line for this machine, `None` if os-release is unreadable
pub async fn banner(config: &DisplayConfig) -> Option<String> {
    if !config.show_banner {
        return None;
    }

    let os = match OsRelease::load(&config.os_release_path).await {
        Ok(os) => os,
        Err(e) => {
            debug!("No banner: {}", e);
            return None;
        }
    };

    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());

    Some(os.banner(&host))
}

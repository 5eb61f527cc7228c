//! Shared fixtures: a scripted greetd daemon on a real Unix socket and
//! recording hooks.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use lamco_greeter::error::{GreeterError, Result};
use lamco_greeter::greeter::GreeterHooks;
use lamco_greeter::ipc::{read_frame, write_frame, Request, Response};
use lamco_greeter::model::{Session, User};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One daemon action on an accepted connection
pub enum Step {
    /// Read one request into the transcript
    Expect,
    /// Send a response
    Reply(Response),
    /// Write raw bytes
    Raw(Vec<u8>),
    /// Fire a token
    Cancel(CancellationToken),
    /// Assert the client closed without sending anything else
    ExpectClosed,
    /// Drop the connection
    Hangup,
}

/// Scripted greetd stand-in; each accepted connection runs the next script
pub struct FakeDaemon {
    _dir: TempDir,
    pub socket_path: PathBuf,
    handle: JoinHandle<Vec<Vec<Request>>>,
}

impl FakeDaemon {
    pub fn spawn(scripts: Vec<Vec<Step>>) -> Self {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("greetd.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let handle = tokio::spawn(async move {
            let mut transcripts = Vec::new();

            for script in scripts {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut seen = Vec::new();

                for step in script {
                    match step {
                        Step::Expect => {
                            seen.push(read_frame::<_, Request>(&mut stream).await.unwrap())
                        }
                        Step::Reply(response) => write_frame(&mut stream, &response).await.unwrap(),
                        Step::Raw(bytes) => stream.write_all(&bytes).await.unwrap(),
                        Step::Cancel(token) => token.cancel(),
                        Step::ExpectClosed => {
                            let next = read_frame::<_, Request>(&mut stream).await;
                            assert!(
                                matches!(next, Err(GreeterError::ConnectionClosed)),
                                "expected hangup, got {next:?}"
                            );
                        }
                        Step::Hangup => break,
                    }
                }

                transcripts.push(seen);
            }

            transcripts
        });

        Self {
            _dir: dir,
            socket_path,
            handle,
        }
    }

    /// Requests received on each connection, in order
    pub async fn transcripts(self) -> Vec<Vec<Request>> {
        self.handle.await.unwrap()
    }
}

/// Hooks that answer from a queue and record every call
#[derive(Default)]
pub struct ScriptedHooks {
    pub events: Vec<String>,
    pub answers: VecDeque<Option<String>>,
    pub cancel_on_info: Option<CancellationToken>,
}

impl ScriptedHooks {
    pub fn with_answers(answers: &[Option<&str>]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.map(str::to_string)).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GreeterHooks for ScriptedHooks {
    async fn select_user(&mut self, _cancel: &CancellationToken) -> Result<User> {
        self.events.push("select_user".into());
        Ok(User::new("alice", "/home/alice"))
    }

    async fn select_session(&mut self, _cancel: &CancellationToken) -> Result<Session> {
        self.events.push("select_session".into());
        Session::from_command("sway", Vec::new())
    }

    async fn on_authenticated(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.events.push("authenticated".into());
        Ok(())
    }

    async fn on_session_started(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.events.push("session_started".into());
        Ok(())
    }

    async fn on_error(&mut self, message: &str, _cancel: &CancellationToken) -> Result<()> {
        self.events.push(format!("error:{message}"));
        Ok(())
    }

    async fn on_auth_failure(&mut self, message: &str, _cancel: &CancellationToken) -> Result<()> {
        self.events.push(format!("auth_failure:{message}"));
        Ok(())
    }

    async fn prompt(
        &mut self,
        message: &str,
        secret: bool,
        _cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        self.events.push(format!("prompt:{message}:{secret}"));
        Ok(self.answers.pop_front().flatten())
    }

    async fn on_info(&mut self, message: &str, _cancel: &CancellationToken) -> Result<()> {
        self.events.push(format!("info:{message}"));
        if let Some(token) = &self.cancel_on_info {
            token.cancel();
        }
        Ok(())
    }
}

/// Daemon half of a successful login with one secret prompt
pub fn successful_login() -> Vec<Step> {
    vec![
        Step::Expect,
        Step::Reply(Response::AuthMessage {
            auth_message_type: lamco_greeter::ipc::AuthMessageKind::Secret,
            auth_message: "Password:".into(),
        }),
        Step::Expect,
        Step::Reply(Response::Success),
        Step::Expect,
        Step::Reply(Response::Success),
    ]
}

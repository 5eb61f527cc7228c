//! Authentication State Machine
//!
//! Drives one login attempt against greetd:
//!
//! ```text
//! Connected ──CreateSession──> Authenticating ──Success──> StartingSession ──Success──> Finished
//!                                   │  ▲                         │
//!                     AuthMessage ──┘  │                         │
//!                     (answer posted) ─┘                         │
//!                                   │                            │
//!                                   └──────Error──> Cancelling <─┘
//!                                                       │
//!                                                       └──Success──> Finished
//! ```
//!
//! Exactly one request is outstanding at a time. Any transport, codec or hook
//! error ends the attempt immediately and is returned unchanged. A daemon
//! `Error` response is handled in-protocol: the session is cancelled, the
//! matching hook runs, and the attempt reports `Ok(false)`.
//!
//! # Cancellation
//!
//! The token is checked at the head of every loop iteration; if it has
//! fired, `CancelSession` is sent and the attempt ends with `Ok(false)`.
//! A token firing during a receive or a hook aborts that operation with
//! [`GreeterError::Cancelled`] instead, and no `CancelSession` is sent.
//!
//! [`GreeterError::Cancelled`]: crate::error::GreeterError::Cancelled

pub mod driver;
pub mod hooks;

pub use driver::{run_with_retries, AttemptOutcome, Driver};
pub use hooks::GreeterHooks;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ipc::{AuthMessageKind, ErrorKind, GreetdClient, Request, Response};

/// Position in the login handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GreeterState {
    /// Connected, nothing sent yet
    Connected,
    /// `CreateSession` sent, exchanging auth messages
    Authenticating,
    /// `StartSession` sent, waiting for the daemon to confirm
    StartingSession,
    /// A daemon error was seen and `CancelSession` sent
    Cancelling,
    /// Terminal
    Finished,
}

/// One login attempt over a borrowed transport
pub struct Greeter<'a, S, H: ?Sized> {
    client: &'a mut GreetdClient<S>,
    hooks: &'a mut H,
    state: GreeterState,
}

impl<'a, S, H> Greeter<'a, S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: GreeterHooks + ?Sized,
{
    /// Prepare an attempt; nothing is sent until [`run`](Self::run)
    pub fn new(client: &'a mut GreetdClient<S>, hooks: &'a mut H) -> Self {
        Self {
            client,
            hooks,
            state: GreeterState::Connected,
        }
    }

    /// Current handshake state
    pub fn state(&self) -> GreeterState {
        self.state
    }

    /// Run the attempt to completion
    ///
    /// Returns `Ok(true)` only if the session started with no daemon error
    /// and no cancellation along the way.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<bool> {
        let user = self.hooks.select_user(cancel).await?;
        self.transition(GreeterState::Authenticating);

        info!("Starting login attempt for user {}", user.name);
        self.client
            .send(&Request::CreateSession {
                username: user.name,
            })
            .await?;

        let mut success = true;

        loop {
            if cancel.is_cancelled() {
                if self.state != GreeterState::Finished {
                    info!("Login attempt cancelled, cancelling greetd session");
                    self.client.send(&Request::CancelSession).await?;
                    success = false;
                }
                break;
            }

            match self.client.receive(cancel).await? {
                Response::Success => {
                    if self.handle_success(cancel).await? {
                        break;
                    }
                }

                Response::Error {
                    error_type,
                    description,
                } => {
                    warn!("greetd reported {}: {}", error_type, description);
                    self.transition(GreeterState::Cancelling);
                    success = false;
                    self.client.send(&Request::CancelSession).await?;

                    match error_type {
                        ErrorKind::Error => self.hooks.on_error(&description, cancel).await?,
                        ErrorKind::AuthError => {
                            self.hooks.on_auth_failure(&description, cancel).await?
                        }
                    }
                }

                Response::AuthMessage {
                    auth_message_type,
                    auth_message,
                } => {
                    debug!("Auth message ({})", auth_message_type);

                    let answer = match auth_message_type {
                        AuthMessageKind::Visible => {
                            self.hooks.prompt(&auth_message, false, cancel).await?
                        }
                        AuthMessageKind::Secret => {
                            self.hooks.prompt(&auth_message, true, cancel).await?
                        }
                        AuthMessageKind::Info => {
                            self.hooks.on_info(&auth_message, cancel).await?;
                            None
                        }
                        AuthMessageKind::Error => {
                            self.hooks.on_auth_failure(&auth_message, cancel).await?;
                            None
                        }
                    };

                    self.client
                        .send(&Request::PostAuthMessageResponse { response: answer })
                        .await?;
                }
            }
        }

        info!(
            "Login attempt finished: {}",
            if success { "session started" } else { "failed" }
        );
        Ok(success)
    }

    /// Returns true when the attempt is finished
    async fn handle_success(&mut self, cancel: &CancellationToken) -> Result<bool> {
        match self.state {
            GreeterState::Authenticating => {
                self.hooks.on_authenticated(cancel).await?;
                self.transition(GreeterState::StartingSession);

                let session = self.hooks.select_session(cancel).await?;
                info!("Starting session {}", session.name);
                self.client
                    .send(&Request::start_session(session.command, session.environment))
                    .await?;
                Ok(false)
            }

            GreeterState::StartingSession | GreeterState::Cancelling => {
                if self.state == GreeterState::StartingSession {
                    self.hooks.on_session_started(cancel).await?;
                }
                self.transition(GreeterState::Finished);
                Ok(true)
            }

            GreeterState::Connected | GreeterState::Finished => {
                warn!("Ignoring unexpected success in state {:?}", self.state);
                Ok(false)
            }
        }
    }

    fn transition(&mut self, next: GreeterState) {
        debug!("Greeter state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

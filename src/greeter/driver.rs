//! Attempt Driver
//!
//! Repeats login attempts with exponential backoff. Each attempt gets a
//! fresh connection that is closed on every exit path, so a failed attempt
//! never leaves state behind on the daemon side.
//!
//! | Attempt result | Driver action |
//! |---|---|
//! | `Ok(true)` | stop, succeeded |
//! | `Ok(false)` (daemon-reported failure) | next attempt immediately |
//! | `Err(Cancelled)`, or token fired during the attempt | stop, cancelled |
//! | configuration / usage error | stop, fatal |
//! | connection / protocol / hook error | report, back off, retry |

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Greeter, GreeterHooks};
use crate::config::types::RetryConfig;
use crate::error::{GreeterError, Result};
use crate::ipc::GreetdClient;

/// How a driver run ended
#[derive(Debug)]
pub enum AttemptOutcome {
    /// A session was started
    Succeeded,
    /// Every attempt failed
    Exhausted {
        /// Error from the final attempt, if it ended with one
        last_error: Option<GreeterError>,
    },
    /// The token fired
    Cancelled,
    /// A non-retryable error ended the run
    Fatal(GreeterError),
}

impl AttemptOutcome {
    /// True only for [`AttemptOutcome::Succeeded`]
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded)
    }
}

/// Runs login attempts until one succeeds or the policy gives up
pub struct Driver<'a, H: ?Sized> {
    retry: RetryConfig,
    socket_path: Option<PathBuf>,
    hooks: &'a mut H,
}

impl<'a, H> Driver<'a, H>
where
    H: GreeterHooks + ?Sized,
{
    /// `socket_path` of `None` resolves the socket from `GREETD_SOCK`
    pub fn new(retry: RetryConfig, socket_path: Option<PathBuf>, hooks: &'a mut H) -> Self {
        Self {
            retry,
            socket_path,
            hooks,
        }
    }

    /// Run attempts, calling `report` with each retryable error and the
    /// backoff about to be applied (`None` after the final attempt)
    pub async fn run<F>(&mut self, cancel: &CancellationToken, mut report: F) -> AttemptOutcome
    where
        F: FnMut(&GreeterError, Option<Duration>),
    {
        let max_attempts = self.retry.max_attempts;

        for attempt in 0..max_attempts {
            if cancel.is_cancelled() {
                return AttemptOutcome::Cancelled;
            }

            info!("Login attempt {}/{}", attempt + 1, max_attempts);

            match self.attempt(cancel).await {
                Ok(true) => return AttemptOutcome::Succeeded,

                Ok(false) if cancel.is_cancelled() => return AttemptOutcome::Cancelled,

                Ok(false) => {
                    info!("Login attempt {} was not successful", attempt + 1);
                    if attempt + 1 == max_attempts {
                        return AttemptOutcome::Exhausted { last_error: None };
                    }
                }

                Err(e) if e.is_cancelled() => return AttemptOutcome::Cancelled,

                Err(e) if !e.is_retryable() => {
                    warn!("Login attempt failed permanently: {}", e);
                    return AttemptOutcome::Fatal(e);
                }

                Err(e) => {
                    let is_last = attempt + 1 == max_attempts;
                    let delay = (!is_last).then(|| self.retry.delay_for(attempt));
                    warn!("Login attempt {} failed: {}", attempt + 1, e);
                    report(&e, delay);

                    match delay {
                        Some(delay) => {
                            tokio::select! {
                                _ = cancel.cancelled() => return AttemptOutcome::Cancelled,
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => return AttemptOutcome::Exhausted { last_error: Some(e) },
                    }
                }
            }
        }

        AttemptOutcome::Exhausted { last_error: None }
    }

    async fn attempt(&mut self, cancel: &CancellationToken) -> Result<bool> {
        let mut client = match &self.socket_path {
            Some(path) => GreetdClient::connect(path, cancel).await?,
            None => GreetdClient::connect_from_env(cancel).await?,
        };

        let result = Greeter::new(&mut client, &mut *self.hooks).run(cancel).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close greetd connection: {}", e);
        }

        result
    }
}

/// Convenience wrapper that only logs retryable errors
pub async fn run_with_retries<H>(
    retry: RetryConfig,
    socket_path: Option<PathBuf>,
    hooks: &mut H,
    cancel: &CancellationToken,
) -> AttemptOutcome
where
    H: GreeterHooks + ?Sized,
{
    Driver::new(retry, socket_path, hooks)
        .run(cancel, |_, _| {})
        .await
}

//! Greeter Hooks
//!
//! The capabilities the state machine needs from its presentation layer.
//! Implementations choose users and sessions, show daemon messages and
//! collect prompt answers. They never touch the transport.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::model::{Session, User};

/// Presentation and selection hooks for one login attempt
///
/// Every hook may suspend and may observe `cancel`; a hook that gives up
/// because of cancellation should return [`GreeterError::Cancelled`] so the
/// driver can tell an abort from a failure.
///
/// [`GreeterError::Cancelled`]: crate::error::GreeterError::Cancelled
#[async_trait]
pub trait GreeterHooks: Send {
    /// Resolve the user to log in
    async fn select_user(&mut self, cancel: &CancellationToken) -> Result<User>;

    /// Resolve the session to start once authenticated
    async fn select_session(&mut self, cancel: &CancellationToken) -> Result<Session>;

    /// Authentication succeeded, the session is about to be chosen
    async fn on_authenticated(&mut self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    /// The daemon accepted `StartSession`
    async fn on_session_started(&mut self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    /// The daemon reported a generic error
    async fn on_error(&mut self, message: &str, cancel: &CancellationToken) -> Result<()>;

    /// Authentication failed, or the auth stack sent an error message
    async fn on_auth_failure(&mut self, message: &str, cancel: &CancellationToken) -> Result<()>;

    /// Ask the user a question; `secret` answers must not be echoed
    async fn prompt(
        &mut self,
        message: &str,
        secret: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<String>>;

    /// Show an informational message
    async fn on_info(&mut self, message: &str, cancel: &CancellationToken) -> Result<()>;
}

//! greetd Transport
//!
//! Owns one connection to the daemon and exchanges typed frames over it.
//! Connecting and receiving take the attempt's [`CancellationToken`]; when
//! it fires the pending operation fails with [`GreeterError::Cancelled`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::codec::{read_frame, write_frame};
use super::{Request, Response};
use crate::error::{GreeterError, Result};

/// Environment variable greetd sets to its socket path for the greeter
pub const GREETD_SOCK_ENV: &str = "GREETD_SOCK";

/// Client side of one greetd connection
///
/// Generic over the stream so the state machine can be driven over any
/// duplex byte stream; production code uses [`UnixStream`].
#[derive(Debug)]
pub struct GreetdClient<S = UnixStream> {
    stream: Option<S>,
}

impl GreetdClient<UnixStream> {
    /// Connect to the socket named by `GREETD_SOCK`
    pub async fn connect_from_env(cancel: &CancellationToken) -> Result<Self> {
        let path = socket_path_from_env()?;
        Self::connect(path, cancel).await
    }

    /// Connect to the greetd socket at `path`
    pub async fn connect(path: impl AsRef<Path>, cancel: &CancellationToken) -> Result<Self> {
        let path = path.as_ref();
        debug!("Connecting to greetd at {}", path.display());

        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GreeterError::Cancelled),
            result = UnixStream::connect(path) => result.map_err(|source| GreeterError::Connect {
                path: path.to_path_buf(),
                source,
            })?,
        };

        info!("Connected to greetd at {}", path.display());
        Ok(Self::from_stream(stream))
    }
}

impl<S> GreetdClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-connected stream
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Encode and send one request
    ///
    /// Sends do not observe cancellation: a frame is always written whole,
    /// so the daemon never sees a torn message.
    pub async fn send(&mut self, request: &Request) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(GreeterError::TransportClosed)?;
        debug!("-> {}", request.tag());

        write_frame(stream, request).await
    }

    /// Receive and decode one response
    pub async fn receive(&mut self, cancel: &CancellationToken) -> Result<Response> {
        let stream = self.stream.as_mut().ok_or(GreeterError::TransportClosed)?;

        let response: Response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GreeterError::Cancelled),
            result = read_frame::<_, Response>(stream) => result?,
        };

        debug!("<- {}", response.tag());
        Ok(response)
    }

    /// Release the connection. Later calls are no-ops; later sends and
    /// receives fail with [`GreeterError::TransportClosed`].
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing greetd connection");
            stream.shutdown().await?;
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

/// Resolve the daemon socket from `GREETD_SOCK`
pub fn socket_path_from_env() -> Result<PathBuf> {
    resolve_socket_path(std::env::var_os(GREETD_SOCK_ENV))
}

fn resolve_socket_path(value: Option<OsString>) -> Result<PathBuf> {
    match value {
        Some(path) if !path.to_string_lossy().trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Err(GreeterError::Configuration(format!(
            "`{}` environment variable not set",
            GREETD_SOCK_ENV
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::AuthMessageKind;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::net::UnixListener;

    #[test]
    fn test_socket_path_resolution() {
        assert_eq!(
            resolve_socket_path(Some("/run/greetd.sock".into())).unwrap(),
            PathBuf::from("/run/greetd.sock")
        );
        assert!(matches!(
            resolve_socket_path(None),
            Err(GreeterError::Configuration(_))
        ));
        assert!(matches!(
            resolve_socket_path(Some("   ".into())),
            Err(GreeterError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let (client_side, mut daemon_side) = tokio::io::duplex(1024);
        let mut client = GreetdClient::from_stream(client_side);
        let cancel = CancellationToken::new();

        client
            .send(&Request::CreateSession {
                username: "alice".into(),
            })
            .await
            .unwrap();

        let seen: Request = read_frame(&mut daemon_side).await.unwrap();
        assert_eq!(seen.tag(), "create_session");

        write_frame(
            &mut daemon_side,
            &Response::AuthMessage {
                auth_message_type: AuthMessageKind::Secret,
                auth_message: "Password:".into(),
            },
        )
        .await
        .unwrap();

        let response = client.receive(&cancel).await.unwrap();
        assert_eq!(response.tag(), "auth_message");
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() {
        let (client_side, _daemon_side) = tokio::io::duplex(64);
        let mut client = GreetdClient::from_stream(client_side);
        let cancel = CancellationToken::new();

        client.close().await.unwrap();
        assert!(client.is_closed());
        client.close().await.unwrap();

        let err = client.send(&Request::CancelSession).await.unwrap_err();
        assert!(matches!(err, GreeterError::TransportClosed));

        let err = client.receive(&cancel).await.unwrap_err();
        assert!(matches!(err, GreeterError::TransportClosed));
    }

    #[tokio::test]
    async fn test_receive_aborted_by_cancellation() {
        let (client_side, _daemon_side) = tokio::io::duplex(64);
        let mut client = GreetdClient::from_stream(client_side);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = client.receive(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_connect_missing_socket() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.sock");

        let err = GreetdClient::connect(&path, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GreeterError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_connect_unix_socket() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greetd.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request: Request = read_frame(&mut stream).await.unwrap();
            write_frame(&mut stream, &Response::Success).await.unwrap();
            request
        });

        let cancel = CancellationToken::new();
        let mut client = GreetdClient::connect(&path, &cancel).await.unwrap();
        client.send(&Request::CancelSession).await.unwrap();
        assert_eq!(client.receive(&cancel).await.unwrap(), Response::Success);
        client.close().await.unwrap();

        assert_eq!(accept.await.unwrap(), Request::CancelSession);
    }
}

//! greetd IPC Protocol
//!
//! Message model, wire codec and transport for talking to the greetd
//! daemon over its local stream socket.
//!
//! # Wire Format
//!
//! ```text
//! +----------+------------------------+
//! | len: u32 | JSON payload: len bytes|
//! +----------+------------------------+
//! ```
//!
//! The length is in host byte order; greetd runs on the same machine, so
//! this is not converted to network order. Both messages are JSON objects
//! internally tagged with a `type` field in snake_case:
//!
//! ```json
//! { "type": "create_session", "username": "alice" }
//! { "type": "auth_message", "auth_message_type": "secret", "auth_message": "Password:" }
//! ```
//!
//! Enum-valued fields use the naming rule in [`naming`].
//!
//! # Exchange
//!
//! The protocol is half-duplex: every [`Request`] is answered by exactly one
//! [`Response`] before the next request may be sent.

use serde::{Deserialize, Serialize};

pub mod client;
pub mod codec;
pub mod naming;

pub use client::{GreetdClient, GREETD_SOCK_ENV};
pub use codec::{read_frame, write_frame, MAX_PAYLOAD_LENGTH};
pub use naming::SnakeCaseEnum;

crate::wire_enum! {
    /// Classifies a prompt from the daemon
    pub enum AuthMessageKind {
        /// Question whose answer may be echoed
        Visible,
        /// Question whose answer must not be echoed
        Secret,
        /// Informational message, no answer expected
        Info,
        /// Error message from the authentication stack, no answer expected
        Error,
    }
}

crate::wire_enum! {
    /// Classifies a daemon failure
    pub enum ErrorKind {
        /// Generic failure, see the description
        Error,
        /// Authentication failed
        AuthError,
    }
}

/// A request from the greeter to greetd
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", from = "RequestFrame")]
pub enum Request {
    /// Begin a login attempt for `username`
    CreateSession {
        /// Account name to authenticate
        username: String,
    },

    /// Answer the last auth message; `None` when no answer was requested
    PostAuthMessageResponse {
        /// Captured answer, serialized as `null` when absent
        response: Option<String>,
    },

    /// Start the authenticated session
    StartSession {
        /// Launch command
        cmd: Vec<String>,
        /// `KEY=VALUE` entries for the session environment
        env: Vec<String>,
    },

    /// Abort the pending session
    CancelSession,
}

impl Request {
    /// Build a `StartSession` for a command line.
    ///
    /// The whole command line goes into a single `cmd` element; it is not
    /// tokenized here.
    pub fn start_session(command: impl Into<String>, env: Vec<String>) -> Self {
        Request::StartSession {
            cmd: vec![command.into()],
            env,
        }
    }

    /// Wire tag of this request
    pub fn tag(&self) -> &'static str {
        match self {
            Request::CreateSession { .. } => "create_session",
            Request::PostAuthMessageResponse { .. } => "post_auth_message_response",
            Request::StartSession { .. } => "start_session",
            Request::CancelSession => "cancel_session",
        }
    }
}

/// A response from greetd to the greeter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", from = "ResponseFrame")]
pub enum Response {
    /// The last request succeeded
    Success,

    /// The last request failed
    Error {
        /// Failure classification
        error_type: ErrorKind,
        /// Human-readable reason
        description: String,
    },

    /// A prompt or message from the authentication stack
    AuthMessage {
        /// Prompt classification
        auth_message_type: AuthMessageKind,
        /// Prompt text
        auth_message: String,
    },
}

impl Response {
    /// Wire tag of this response
    pub fn tag(&self) -> &'static str {
        match self {
            Response::Success => "success",
            Response::Error { .. } => "error",
            Response::AuthMessage { .. } => "auth_message",
        }
    }
}

// Decoding goes through these mirrors so that every member is required and
// unknown members are rejected. Unit variants are written as empty struct
// variants: internally tagged unit variants skip leftover keys.

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum RequestFrame {
    CreateSession {
        username: String,
    },
    PostAuthMessageResponse {
        #[serde(deserialize_with = "required_nullable")]
        response: Option<String>,
    },
    StartSession {
        cmd: Vec<String>,
        env: Vec<String>,
    },
    CancelSession {},
}

impl From<RequestFrame> for Request {
    fn from(frame: RequestFrame) -> Self {
        match frame {
            RequestFrame::CreateSession { username } => Request::CreateSession { username },
            RequestFrame::PostAuthMessageResponse { response } => {
                Request::PostAuthMessageResponse { response }
            }
            RequestFrame::StartSession { cmd, env } => Request::StartSession { cmd, env },
            RequestFrame::CancelSession {} => Request::CancelSession,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum ResponseFrame {
    Success {},
    Error {
        error_type: ErrorKind,
        description: String,
    },
    AuthMessage {
        auth_message_type: AuthMessageKind,
        auth_message: String,
    },
}

impl From<ResponseFrame> for Response {
    fn from(frame: ResponseFrame) -> Self {
        match frame {
            ResponseFrame::Success {} => Response::Success,
            ResponseFrame::Error {
                error_type,
                description,
            } => Response::Error {
                error_type,
                description,
            },
            ResponseFrame::AuthMessage {
                auth_message_type,
                auth_message,
            } => Response::AuthMessage {
                auth_message_type,
                auth_message,
            },
        }
    }
}

/// `Option` that must be present on the wire, possibly as `null`
fn required_nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let req = Request::CreateSession {
            username: "alice".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "type": "create_session", "username": "alice" })
        );

        let req = Request::PostAuthMessageResponse { response: None };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "type": "post_auth_message_response", "response": null })
        );

        assert_eq!(
            serde_json::to_value(&Request::CancelSession).unwrap(),
            json!({ "type": "cancel_session" })
        );
    }

    #[test]
    fn test_start_session_keeps_command_whole() {
        let req = Request::start_session("sway --unsupported-gpu", vec!["XDG_SESSION_TYPE=wayland".into()]);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "type": "start_session",
                "cmd": ["sway --unsupported-gpu"],
                "env": ["XDG_SESSION_TYPE=wayland"],
            })
        );
    }

    #[test]
    fn test_response_decoding() {
        let resp: Response = serde_json::from_value(json!({
            "type": "error",
            "error_type": "auth_error",
            "description": "bad credentials",
        }))
        .unwrap();
        assert_eq!(
            resp,
            Response::Error {
                error_type: ErrorKind::AuthError,
                description: "bad credentials".into(),
            }
        );

        let resp: Response = serde_json::from_value(json!({
            "type": "auth_message",
            "auth_message_type": "secret",
            "auth_message": "Password:",
        }))
        .unwrap();
        assert_eq!(resp.tag(), "auth_message");
    }

    #[test]
    fn test_unknown_discriminator_rejected() {
        assert!(serde_json::from_value::<Response>(json!({ "type": "maybe" })).is_err());
        assert!(serde_json::from_value::<Response>(json!({ "status": "success" })).is_err());
        assert!(serde_json::from_value::<Request>(json!({ "type": "success" })).is_err());
    }

    #[test]
    fn test_unknown_enum_literal_rejected() {
        let result = serde_json::from_value::<Response>(json!({
            "type": "auth_message",
            "auth_message_type": "whisper",
            "auth_message": "psst",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_members_rejected() {
        assert!(serde_json::from_value::<Response>(json!({ "type": "success", "bogus": 1 })).is_err());
        assert!(serde_json::from_value::<Response>(json!({
            "type": "error",
            "error_type": "error",
            "description": "x",
            "extra": true,
        }))
        .is_err());
        assert!(serde_json::from_value::<Request>(json!({
            "type": "cancel_session",
            "reason": "bored",
        }))
        .is_err());
        assert_eq!(
            serde_json::from_value::<Response>(json!({ "type": "success" })).unwrap(),
            Response::Success
        );
    }

    #[test]
    fn test_missing_members_rejected() {
        assert!(
            serde_json::from_value::<Request>(json!({ "type": "post_auth_message_response" }))
                .is_err()
        );
        assert!(
            serde_json::from_value::<Request>(json!({ "type": "start_session", "cmd": ["sway"] }))
                .is_err()
        );
        assert!(serde_json::from_value::<Response>(json!({
            "type": "auth_message",
            "auth_message_type": "info",
        }))
        .is_err());

        let req: Request = serde_json::from_value(json!({
            "type": "post_auth_message_response",
            "response": null,
        }))
        .unwrap();
        assert_eq!(req, Request::PostAuthMessageResponse { response: None });
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(ErrorKind::AuthError.to_wire(), "auth_error");
        assert_eq!(AuthMessageKind::Secret.to_wire(), "secret");
        for &kind in AuthMessageKind::VARIANTS {
            assert_eq!(AuthMessageKind::from_wire(&kind.to_wire()), Some(kind));
        }
        for &kind in ErrorKind::VARIANTS {
            assert_eq!(ErrorKind::from_wire(&kind.to_wire()), Some(kind));
        }
    }
}

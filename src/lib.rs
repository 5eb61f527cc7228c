//! # lamco-greeter
//!
//! Terminal greeter for the greetd login manager.
//!
//! The crate speaks greetd's IPC protocol and drives the login handshake:
//! - [`ipc`] - length-prefixed JSON frames and the socket client
//! - [`greeter`] - the per-attempt state machine and the retrying driver
//! - [`model`] - users, sessions and OS identification
//! - [`terminal`] - plain-text presentation hooks
//!
//! # Architecture
//!
//! ```text
//! lamco-greeter
//!   ├─> Driver (attempts, backoff, cancellation)
//!   │     └─> Greeter (one handshake) ──> GreetdClient ──> greetd socket
//!   │               │
//!   │               └─> GreeterHooks (TerminalGreeter)
//!   └─> Model (passwd, .desktop sessions, os-release)
//! ```
//!
//! # Data Flow
//!
//! **Request Path:** Hooks → Greeter → `Request` → frame codec → greetd
//!
//! **Response Path:** greetd → frame codec → `Response` → Greeter → Hooks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Greeter configuration
pub mod config;

/// Error types
pub mod error;

/// Authentication state machine and attempt driver
pub mod greeter;

/// greetd IPC protocol
pub mod ipc;

/// Users, sessions and OS identification
pub mod model;

/// Terminal presentation hooks
pub mod terminal;

/// Utility functions
pub mod utils;

pub use error::{GreeterError, Result};
pub use greeter::{AttemptOutcome, Driver, Greeter, GreeterHooks};
pub use ipc::{GreetdClient, Request, Response};

//! Utility Functions
//!
//! User-friendly error formatting for the greeter binary.
//!
//! ```rust,no_run
//! use lamco_greeter::utils::format_user_error;
//!
//! # fn run() -> anyhow::Result<()> { Ok(()) }
//! if let Err(e) = run() {
//!     eprintln!("{}", format_user_error(&e));
//! }
//! ```
//!
//! Error categories with context-aware help:
//! - Socket not configured → `GREETD_SOCK`, `--socket`
//! - Connection errors → greetd service status, socket permissions
//! - Protocol errors → greetd version
//! - Config errors → TOML syntax, value ranges

pub mod errors;

pub use errors::format_user_error;

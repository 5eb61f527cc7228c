//! Login Targets
//!
//! The values the greeter hands to the daemon: who logs in ([`User`]) and
//! what they log into ([`Session`]), plus the OS identification shown in the
//! greeting banner.
//!
//! Discovery here is best-effort. Unreadable files are logged and skipped,
//! never fatal: a greeter with no candidates falls back to free-text entry.

pub mod os_release;
pub mod session;
pub mod user;

pub use os_release::OsRelease;
pub use session::{load_available_sessions, Session, SessionKind};
pub use user::{load_system_users, User};

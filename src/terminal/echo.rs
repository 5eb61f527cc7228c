//! Terminal echo control for secret prompts

use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, Termios};
use std::io::IsTerminal;
use tracing::warn;

/// Disables echo on stdin until dropped
pub struct EchoGuard {
    original: Termios,
}

impl EchoGuard {
    /// Turn echo off; `None` when stdin is not a terminal
    pub fn disable() -> nix::Result<Option<Self>> {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return Ok(None);
        }

        let original = tcgetattr(&stdin)?;
        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        silent.local_flags.insert(LocalFlags::ECHONL);
        tcsetattr(&stdin, SetArg::TCSANOW, &silent)?;

        Ok(Some(Self { original }))
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        if let Err(e) = tcsetattr(std::io::stdin(), SetArg::TCSANOW, &self.original) {
            warn!("Failed to restore terminal echo: {}", e);
        }
    }
}

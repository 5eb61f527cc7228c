//! Build script for lamco-greeter
//!
//! Embeds build date, time and commit for the greeter's startup log.

use std::process::Command;

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    let date = command_output("date", &["+%Y-%m-%d"]).unwrap_or_else(|| "unknown".into());
    let time = command_output("date", &["+%H:%M:%S"]).unwrap_or_default();
    let git_hash =
        command_output("git", &["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=BUILD_DATE={date}");
    println!("cargo:rustc-env=BUILD_TIME={time}");
    println!("cargo:rustc-env=GIT_HASH={git_hash}");

    println!("cargo:rerun-if-changed=.git/HEAD");
}

//! User-Friendly Error Formatting
//!
//! Turns greeter failures into messages with troubleshooting hints for the
//! person sitting at the login terminal.

use std::fmt::Write;

use crate::error::{classify_error, ErrorClass, GreeterError};

/// Format error for user consumption
///
/// Greeter errors are grouped by [`ErrorClass`]; anything else (such as a
/// configuration file failure from `anyhow`) falls back to message matching.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = error.to_string();

    match error.downcast_ref::<GreeterError>().map(classify_error) {
        Some(ErrorClass::Configuration) => format_socket_env_error(&mut output, &error_msg),
        Some(ErrorClass::Connection) => format_connection_error(&mut output, &error_msg),
        Some(ErrorClass::ProtocolViolation) => format_protocol_error(&mut output, &error_msg),
        Some(_) => format_generic_error(&mut output, &error_msg),
        None if error_msg.contains("config") => format_config_error(&mut output, &error_msg),
        None => format_generic_error(&mut output, &error_msg),
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: lamco-greeter -vv"
    )
    .ok();
    writeln!(&mut output, "  - Check the greetd journal: journalctl -u greetd").ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_socket_env_error(output: &mut String, _error: &str) {
    writeln!(output, "greetd Socket Not Configured").ok();
    writeln!(output).ok();
    writeln!(output, "The greeter does not know where to reach greetd.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Started outside of greetd").ok();
    writeln!(
        output,
        "     → greetd sets GREETD_SOCK for the greeter it launches"
    )
    .ok();
    writeln!(
        output,
        "     → Set [default_session] command in /etc/greetd/config.toml"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Testing by hand").ok();
    writeln!(output, "     → Pass --socket /run/greetd.sock").ok();
    writeln!(output, "     → Or set socket_path under [daemon] in the config").ok();
}

fn format_connection_error(output: &mut String, _error: &str) {
    writeln!(output, "greetd Connection Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not talk to the greetd daemon.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. greetd is not running").ok();
    writeln!(output, "     → Run: systemctl status greetd").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Socket path is stale or wrong").ok();
    writeln!(output, "     → Check: echo $GREETD_SOCK").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Permission denied on the socket").ok();
    writeln!(
        output,
        "     → Run the greeter as the user configured in greetd"
    )
    .ok();
}

fn format_protocol_error(output: &mut String, _error: &str) {
    writeln!(output, "greetd Protocol Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "greetd sent a message this greeter could not understand."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Check the greetd version").ok();
    writeln!(output, "     → greetd 0.6 or newer speaks this protocol").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Make sure nothing else is bound to the socket").ok();
}

fn format_config_error(output: &mut String, _error: &str) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "The greeter configuration is invalid.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Out-of-range values").ok();
    writeln!(output, "     → retry.max_attempts must be at least 1").ok();
    writeln!(output, "     → users.min_uid must not exceed users.max_uid").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Login Error").ok();
    writeln!(output).ok();
    writeln!(output, "The login attempt could not be completed.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_socket_env_hint() {
        let error = anyhow::Error::from(GreeterError::Configuration(
            "`GREETD_SOCK` environment variable not set".into(),
        ));
        let formatted = format_user_error(&error);
        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("--socket"));
    }

    #[test]
    fn test_connection_error_formatting() {
        let error = anyhow::Error::from(GreeterError::ConnectionClosed);
        let formatted = format_user_error(&error);
        assert!(formatted.contains("systemctl status greetd"));
    }

    #[test]
    fn test_plain_config_error_formatting() {
        let error = anyhow::anyhow!("Failed to parse config file");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("Configuration Error"));
    }
}

//! lamco-greeter - terminal greeter for greetd
//!
//! Entry point for the greeter binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamco_greeter::config::GreeterConfig;
use lamco_greeter::greeter::{AttemptOutcome, Driver};
use lamco_greeter::model::{load_available_sessions, load_system_users};
use lamco_greeter::terminal::{self, TerminalGreeter};
use lamco_greeter::utils::format_user_error;

/// Command-line arguments for lamco-greeter
#[derive(Parser, Debug)]
#[command(name = "lamco-greeter")]
#[command(version, about = "Terminal greeter for greetd", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/lamco-greeter/config.toml")]
    config: String,

    /// greetd socket path
    #[arg(short, long, env = "GREETD_SOCK")]
    socket: Option<PathBuf>,

    /// Session command to use when no sessions are installed
    #[arg(long)]
    cmd: Option<String>,

    /// Maximum number of login attempts
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact")]
    log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("lamco-greeter v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));

    let config = GreeterConfig::load(&args.config).unwrap_or_else(|e| {
        warn!("Failed to load config: {:#}, using defaults", e);
        GreeterConfig::default_config()
    });

    // An empty GREETD_SOCK reaches clap as an empty path
    let socket = args.socket.clone().filter(|p| !p.as_os_str().is_empty());
    let config = config.with_overrides(socket, args.cmd.clone(), args.max_attempts);

    if let Err(e) = config.validate() {
        eprintln!("{}", format_user_error(&e));
        std::process::exit(1);
    }

    tracing::debug!("Config: {:?}", config);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling login");
            signal_token.cancel();
        }
    });

    if let Some(banner) = terminal::banner(&config.display).await {
        println!("{banner}");
    }

    let users = load_system_users(&config.users).await;
    let sessions = load_available_sessions(&config.sessions, &cancel).await;
    info!("Found {} users and {} sessions", users.len(), sessions.len());

    let mut hooks = TerminalGreeter::stdio(users, sessions, &config.sessions);
    let outcome = Driver::new(
        config.retry.clone(),
        config.daemon.socket_path.clone(),
        &mut hooks,
    )
    .run(&cancel, |e, delay| {
        eprintln!("\u{2716} {e}");
        if let Some(delay) = delay {
            eprintln!("Retrying in {} seconds...", delay.as_secs());
        }
    })
    .await;

    let code = match outcome {
        AttemptOutcome::Succeeded => {
            info!("Session started");
            0
        }
        AttemptOutcome::Cancelled => {
            info!("Login cancelled");
            1
        }
        AttemptOutcome::Exhausted { last_error } => {
            eprintln!(
                "Giving up after {} attempts",
                config.retry.max_attempts
            );
            if let Some(e) = last_error {
                eprintln!("{}", format_user_error(&e.into()));
            }
            1
        }
        AttemptOutcome::Fatal(e) => {
            eprintln!("{}", format_user_error(&e.into()));
            1
        }
    };

    // Stdin reads run on a blocking thread that runtime shutdown would wait on
    std::process::exit(code);
}

fn init_logging(args: &Args) -> Result<()> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lamco_greeter={level},warn", level = log_level))
    });

    // Logs share the VT with the prompts, so the console layer writes to stderr
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)?;

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path);
    } else {
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
    }

    Ok(())
}

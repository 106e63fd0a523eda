//! Admitd - HTTP admission daemon gating requests behind rate limiting,
//! allow-listing, and rotating token authentication.

use std::env;
use std::process::ExitCode;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use admitd::config::Settings;
use admitd::http;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> ExitCode {
    // Parse command line arguments (simple std::env approach)
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    // Get config path from --config argument or default
    let config_path = get_config_path(&args);

    // Load configuration
    let settings = match Settings::load(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging based on configuration
    init_logging(&settings);

    // Print startup banner
    info!("Starting {} v{}", NAME, VERSION);
    info!("Configuration loaded from: {}", config_path);
    info!(
        "Rate limit: {} requests per {}s window",
        settings.rate_limit.max_requests, settings.rate_limit.window_seconds
    );
    if settings.whitelist.enabled {
        info!(
            "Allow-list enabled with {} client(s)",
            settings.whitelist.clients.len()
        );
    }
    if settings.security.require_token {
        info!(
            "Token auth enabled, rotating every {}s",
            settings.security.token_bucket_seconds
        );
    }

    // Run the async main
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(http::serve(settings, shutdown_signal())) {
        Ok(()) => {
            info!("Daemon stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Daemon failed");
            ExitCode::FAILURE
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
HTTP admission daemon gating requests behind rate limiting, allow-listing,
and rotating token authentication.

USAGE:
    {} [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: /etc/admitd/admitd.toml]
    -h, --help             Print help information
    -V, --version          Print version information
"#,
        NAME, VERSION, NAME
    );
}

/// Get configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> String {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    // Default path
    "/etc/admitd/admitd.toml".to_string()
}

/// Initialize logging based on settings.
fn init_logging(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Default to pretty format
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

//! relay-gateway: WhatsApp / Exotel / Twilio relay
//!
//! Main entry point. Serves the admin console and the relay API.
//!
//! Usage:
//!   relay-gateway           - Start the HTTP server
//!   relay-gateway --help    - Show help
//!   relay-gateway --version - Show version

use relay_core::Config;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// HTTP server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args(std::env::args().skip(1)) {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("relay-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    let missing = config.missing_required();
    if !missing.is_empty() {
        tracing::error!("CRITICAL: Missing configuration: {}", missing.join(", "));
    }

    tracing::info!("Starting relay-gateway...");
    tracing::info!("Serving console from {}", config.server.static_dir);

    let mut server = tokio::spawn(async move {
        if let Err(e) = relay_api::start_server(config).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
            server.abort();
        }
        result = &mut server => {
            if let Err(e) = result {
                tracing::error!("HTTP server task failed: {}", e);
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> RunMode
where
    I: IntoIterator<Item = String>,
{
    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("relay-gateway - WhatsApp / Exotel / Twilio relay");
    println!();
    println!("Usage:");
    println!("  relay-gateway           Start the HTTP server");
    println!("  relay-gateway --help    Show this help message");
    println!("  relay-gateway --version Show version");
    println!();
    println!("Configuration is read from ./relay.toml when present, then from");
    println!("environment variables (a .env file is loaded first):");
    println!("  WEBHOOK_VERIFY_TOKEN   Webhook verification secret (required)");
    println!("  PHONE_NUMBER_ID        WhatsApp sender phone number id (required)");
    println!("  WHATSAPP_ACCESS_TOKEN  Graph API access token (required)");
    println!("  WHATSAPP_API_VERSION   Graph API version (default: v22.0)");
    println!("  ACK_MESSAGE_TEMPLATE   Reply acknowledgement, {{reply}} is substituted");
    println!("  EXOTEL_ACCOUNT_SID     Exotel account for /api/make-call");
    println!("  FRONTEND_URL           Allowed CORS origin (default: any)");
    println!("  BACKEND_PORT           HTTP port (default: 3000)");
    println!("  STATIC_DIR             Built console directory (default: client/build)");
}

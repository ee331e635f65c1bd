//! anonchat CLI and REST API entry point.
//!
//! Binary name: `anonchat`
//!
//! Parses CLI arguments, initializes the database and services, then either
//! starts the HTTP server or runs one of the admin commands.

mod http;
mod state;

use std::net::SocketAddr;

use clap::{Parser, Subcommand};

use state::AppState;

#[derive(Parser)]
#[command(name = "anonchat", version, about = "Anonymous-themed chat relay over Gemini")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Export spans via OpenTelemetry (stdout exporter)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,

        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
    },

    /// Delete every rate-limit record, restoring full quota for all clients
    ClearRateLimits,

    /// Purge sessions and audit entries older than the retention window
    Purge {
        /// Override the configured retention in days
        #[arg(long)]
        days: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        let filter = match cli.verbose {
            0 => "info,sqlx=warn",
            1 => "debug,sqlx=info",
            _ => "trace",
        };
        // SAFETY: no other threads are running this early in main.
        unsafe {
            std::env::set_var("RUST_LOG", filter);
        }
    }
    anonchat_observe::tracing_setup::init_tracing(cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            serve(state, host, port).await?;
        }

        Commands::ClearRateLimits => {
            let cleared = state.limiter.reset_all().await?;
            println!(
                "  {} Cleared {} rate limit record(s)",
                console::style("✓").green(),
                cleared
            );
        }

        Commands::Purge { days } => {
            let days = days.unwrap_or(state.config.retention.days);
            let report = state.conversations.purge_older_than(days).await?;
            println!(
                "  {} Purged {} session(s) and {} audit entries older than {} day(s)",
                console::style("✓").green(),
                report.sessions,
                report.audit_entries,
                days
            );
        }
    }

    anonchat_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Fresh quota for everyone on restart, stale data out.
    state.run_startup_maintenance().await?;

    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} anonchat API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Promptgate CLI and REST API entry point.
//!
//! Binary name: `promptgate`
//!
//! Parses CLI arguments, then either starts the gateway server or runs a
//! management command (API key creation, model listing).

mod http;
mod state;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promptgate_core::catalog::ModelCatalog;
use promptgate_infra::sqlite::SqliteApiKeyStore;

use state::AppState;

#[derive(Parser)]
#[command(name = "promptgate", version, about = "Usage-accounting LLM gateway")]
struct Cli {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
    /// Generate an API key for a user. The plaintext is shown once.
    CreateKey {
        /// User the key authenticates as.
        user: String,
        #[arg(long, default_value = "default")]
        name: String,
    },
    /// List the chat models the gateway serves.
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,promptgate=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let state = AppState::init().await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Promptgate listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::CreateKey { user, name } => {
            let pool = state::open_default_pool().await?;
            let store = SqliteApiKeyStore::new(pool);
            let key = store
                .create(&user, &name)
                .await
                .map_err(|e| anyhow::anyhow!("failed to create API key: {e}"))?;

            println!();
            println!(
                "  {} API key for '{}' (save this -- it won't be shown again):",
                console::style("🔑").bold(),
                console::style(&user).cyan()
            );
            println!();
            println!("  {}", console::style(&key).yellow().bold());
            println!();
        }

        Commands::Models => {
            let catalog = ModelCatalog::builtin();
            println!();
            for model in catalog.chat_models() {
                println!(
                    "  {}  context {}  max output {}",
                    console::style(&model.id).cyan(),
                    model.context_length,
                    model.max_output_tokens
                );
            }
            println!();
        }
    }

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

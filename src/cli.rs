use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::app_state::AppState;
use crate::config::load_config;
use crate::log_store_pg::PgLogStore;
use crate::web::build_router;

/// Top-level CLI interface for logpage
#[derive(Parser)]
#[command(name = "logpage", version, about = "Paginated viewer for a Postgres logs table")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP listing endpoints
    Serve {
        /// Host/IP to bind, overriding `bind_addr`
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overriding `bind_addr`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create the logs table and its indexes
    Migrate,

    /// Insert synthetic rows for local browsing
    Seed {
        #[arg(short, long, default_value_t = 250)]
        count: u32,
    },
}

/// Combine an optional host/port override with the configured address.
pub fn bind_address(configured: &str, host: Option<&str>, port: Option<u16>) -> String {
    let (conf_host, conf_port) = configured.rsplit_once(':').unwrap_or((configured, "8080"));
    let host = host.unwrap_or(conf_host);
    match port {
        Some(port) => format!("{host}:{port}"),
        None => format!("{host}:{conf_port}"),
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let store = PgLogStore::connect(&config)
        .await
        .context("failed to connect to the logs database")?;

    match cli.command {
        Commands::Serve { host, port } => {
            let addr = bind_address(&config.bind_addr, host.as_deref(), port);
            let state = Arc::new(AppState::from_config(Arc::new(store), &config));
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!(%addr, "HTTP server listening");
            axum::serve(listener, app).await.context("server error")?;
        }
        Commands::Migrate => {
            store.migrate().await.context("migration failed")?;
        }
        Commands::Seed { count } => {
            for i in 0..count {
                let log_type = u16::try_from(i % 5).unwrap_or_default();
                store
                    .insert(log_type, &format!("seeded entry {i}"))
                    .await
                    .context("seed insert failed")?;
            }
            tracing::info!(count, "seeded logs table");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_configured_parts() {
        assert_eq!(bind_address("0.0.0.0:8080", None, None), "0.0.0.0:8080");
        assert_eq!(bind_address("0.0.0.0:8080", Some("127.0.0.1"), None), "127.0.0.1:8080");
        assert_eq!(bind_address("0.0.0.0:8080", None, Some(9000)), "0.0.0.0:9000");
    }

    #[test]
    fn seed_parses_count() {
        let cli = Cli::try_parse_from(["logpage", "seed", "--count", "10"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { count: 10 }));
    }
}

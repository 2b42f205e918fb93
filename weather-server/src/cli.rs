use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use weather_core::{Config, MultiProvider, ProviderId, TemperatureProvider};
use weather_server::{AppState, run_http_server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Averaged city temperature over HTTP")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8080.
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Query every configured provider once and print the report.
    Show {
        /// City name, passed to providers as-is.
        city: String,
    },

    /// Store the API key for a provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command.unwrap_or(Command::Serve { listen: None }) {
            Command::Serve { listen } => {
                let mut config = load_config(&path)?;
                if let Some(listen) = listen {
                    config.listen = listen;
                }

                let multi = MultiProvider::from_config(&config)?;
                for provider in multi.providers() {
                    tracing::info!(provider = provider.name(), "provider enabled");
                }

                let state = AppState::new(Arc::new(multi));
                run_http_server(state, config.listen, shutdown_signal()).await?;
            }
            Command::Show { city } => {
                let config = load_config(&path)?;
                let multi = MultiProvider::from_config(&config)?;

                let report = AppState::new(Arc::new(multi)).report(&city).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;

                // Environment overrides are not persisted.
                let mut config = Config::load_from(&path)?;

                let api_key = Password::new(&format!("API key for {id}:"))
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let api_key = api_key.trim();
                if api_key.is_empty() {
                    anyhow::bail!("API key for '{id}' must not be empty");
                }

                config.upsert_provider_api_key(id, api_key.to_string());
                config.save_to(&path)?;

                println!("Saved {id} API key to {}", path.display());
            }
        }

        Ok(())
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let mut config = Config::load_from(path)?;
    config.apply_env()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down gracefully...");
}

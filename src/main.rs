use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use wayfarer::{constants::DEFAULT_PORT, web_server, Planner, PlannerConfig, PreferenceForm};

mod chat;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web UI.
    Serve {
        #[arg(long, env = "PLANNER_PORT", default_value_t = DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
    },
    /// Generate a single travel plan and print it.
    Plan {
        #[arg(long, help = "Where you are going.")]
        destination: String,
        #[arg(long, help = "First day of the trip (YYYY-MM-DD).")]
        start: String,
        #[arg(long, help = "Last day of the trip (YYYY-MM-DD).")]
        end: String,
        #[arg(long, default_value = "Culture, Nature", help = "Comma-separated interests.")]
        interests: String,
        #[arg(long, default_value = "Moderate", help = "Budget, Moderate, Luxury or an amount in USD.")]
        budget: String,
    },
    /// Plan a trip and ask follow-up questions in the terminal.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for GROQ_API_KEY and SERP_API_KEY)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,wayfarer=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Missing API keys are fatal before anything else runs.
    let config = PlannerConfig::from_env().context("Failed to load configuration")?;
    let planner = Planner::from_config(config).context("Failed to initialize planner")?;

    match cli.command {
        Commands::Serve { port } => {
            info!("Starting travel planner web UI on port {}...", port);
            let planner = Arc::new(planner);

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, planner).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Plan {
            destination,
            start,
            end,
            interests,
            budget,
        } => {
            let form = PreferenceForm {
                destination,
                start_date: start,
                end_date: end,
                interests,
                budget,
            };
            let prefs = form.validate().map_err(|e| anyhow::anyhow!(e.user_message()))?;
            planner
                .submit(prefs)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Failed to generate travel plan")?;
            chat::print_plan(&planner.snapshot());
        }
        Commands::Chat => {
            chat::run_chat(&planner).await.context("Chat session failed")?;
        }
    }

    Ok(())
}

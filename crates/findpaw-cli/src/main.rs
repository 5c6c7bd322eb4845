mod auth;
mod report;
mod sightings;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::auth::AuthCommands;
use crate::report::ReportCommands;

#[derive(Debug, Parser)]
#[command(name = "findpaw")]
#[command(about = "Lost-dog sighting reports from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List recent sightings as map pins
    Sightings {
        /// Look-back window in days (defaults to `SIGHTING_WINDOW_DAYS`)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Submit a sighting report
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Sign-in and account commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = findpaw_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let client = findpaw_supabase::SupabaseClient::from_config(&config)?;
    tracing::debug!(env = %config.env, bucket = client.bucket(), "client ready");

    match cli.command {
        Some(Commands::Sightings { days }) => {
            let days = days.unwrap_or(config.sighting_window_days);
            sightings::run_sightings_list(&client, days).await?;
        }
        Some(Commands::Report { command }) => match command {
            ReportCommands::Submit(args) => report::run_report_submit(&client, args).await?,
        },
        Some(Commands::Auth { command }) => match command {
            AuthCommands::LoginUrl { redirect_to } => {
                let redirect_to = redirect_to.as_deref().unwrap_or(&config.auth_redirect_url);
                auth::run_login_url(&client, redirect_to);
            }
            AuthCommands::Callback {
                code,
                error,
                error_description,
                verifier,
            } => {
                let params = findpaw_supabase::CallbackParams {
                    code,
                    error,
                    error_description,
                };
                auth::run_callback(&client, &params, &verifier).await?;
            }
            AuthCommands::Whoami { access_token } => {
                auth::run_whoami(&client, &access_token).await?;
            }
        },
        None => println!("findpaw ready; run with --help for commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;

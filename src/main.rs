//! KabaddiGuru - Kabaddi analytics assistant CLI
//!
#![doc = "KabaddiGuru - Kabaddi analytics assistant CLI"]
#![doc = "Main entry point for the KabaddiGuru client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kabaddiguru::cli::{Cli, Commands};
use kabaddiguru::commands;
use kabaddiguru::config::Config;
use kabaddiguru::contact::ContactForm;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { resume } => {
            tracing::info!("Starting interactive chat");
            if let Some(r) = &resume {
                tracing::debug!("Resuming thread: {}", r);
            }
            commands::chat::run_chat(config, resume).await?;
            Ok(())
        }
        Commands::Auth { command } => {
            commands::auth::handle_auth(config, command).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::history::handle_history(config, command)?;
            Ok(())
        }
        Commands::Analytics { command } => {
            commands::analytics::handle_analytics(config, command).await?;
            Ok(())
        }
        Commands::Suggestions { team } => {
            commands::analytics::show_suggestions(config, team).await?;
            Ok(())
        }
        Commands::Contact {
            name,
            email,
            subject,
            message,
            category,
        } => {
            let form = ContactForm {
                name,
                email,
                subject,
                message,
                category,
            };
            commands::contact::send_contact(config, form).await?;
            Ok(())
        }
        Commands::ServeContact { bind } => {
            tracing::info!("Starting contact relay");
            commands::contact::serve_contact(config, bind).await?;
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "kabaddiguru=debug"
    } else {
        "kabaddiguru=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

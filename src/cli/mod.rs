//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod say;
pub mod settings;

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::auth::{AuthManager, API_KEY_ENV};
use crate::core::config::Config;
use crate::core::dispatch::ReqwestTransport;
use crate::core::router::ResponseRouter;

/// Environment variable holding the tracing filter (e.g. `bavard=debug`).
pub const LOG_FILTER_ENV: &str = "BAVARD_LOG";

#[derive(Parser)]
#[command(name = "bavard")]
#[command(about = "A French-speaking terminal chat assistant backed by Gemini")]
#[command(
    long_about = "Bavard is a line-oriented chat assistant. Messages are answered by the Gemini \
API with Google Search grounding; failed requests are retried with exponential backoff.\n\n\
Authentication:\n\
  Use 'bavard auth' to store your API key in the system keyring.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    Gemini API key (takes precedence over the keyring)\n\
  BAVARD_LOG        Diagnostic log filter, written to stderr (default: warn)\n\n\
Commands:\n\
  /help             List the chat commands\n\
  /wiki <term>      Show the Wikipedia summary for a term\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use instead of the configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Enable logging of the transcript to the specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Store the Gemini API key in the system keyring
    Auth,
    /// Remove the stored Gemini API key
    Deauth,
    /// Start an interactive chat (default)
    Chat,
    /// Answer a single message and exit
    Say {
        /// Message to send (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set configuration values, or list them when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

/// Diagnostics go to stderr so they never interleave with the transcript.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let Args {
        command,
        model,
        log,
    } = Args::parse();

    match command.unwrap_or(Commands::Chat) {
        Commands::Auth => {
            if let Err(e) = AuthManager::new().interactive_auth() {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            if let Err(e) = AuthManager::new().interactive_deauth() {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let config_path = Config::get_config_path()?;
            match settings::set_at(&config_path, key.as_deref(), &value) {
                Ok(message) => println!("{message}"),
                Err(e) => {
                    e.print();
                    std::process::exit(e.exit_code());
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let config_path = Config::get_config_path()?;
            match settings::unset_at(&config_path, &key) {
                Ok(message) => println!("{message}"),
                Err(e) => {
                    e.print();
                    std::process::exit(e.exit_code());
                }
            }
            Ok(())
        }
        Commands::Say { prompt } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                eprintln!("Usage: bavard say <prompt>");
                std::process::exit(1);
            }
            let config = Config::load()?;
            let router = build_router(&config, model.as_deref())?;
            say::run_say(&router, &prompt).await
        }
        Commands::Chat => {
            let config = Config::load()?;
            let router = build_router(&config, model.as_deref())?;
            chat::run_chat(router, config.typewriter_timing(), log).await
        }
    }
}

/// Exits with status 1 when no API key can be found.
fn build_router(config: &Config, model: Option<&str>) -> Result<ResponseRouter, Box<dyn Error>> {
    let auth_manager = AuthManager::new();
    let api_key = match auth_manager.resolve_api_key(std::env::var(API_KEY_ENV).ok()) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    ResponseRouter::from_config(
        config,
        model,
        &api_key,
        Arc::new(ReqwestTransport::default()),
    )
}

// ABOUTME: Garmin Chat CLI - ask questions about your Garmin Connect data from the terminal
// ABOUTME: Interactive chat, one-shot questions, provider catalog and settings management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Store Garmin credentials and an OpenAI key
//! garmin-chat configure --garmin-email me@example.com --provider openai --api-key sk-...
//!
//! # Log in once (prompts for an MFA code if Garmin asks)
//! garmin-chat login
//!
//! # Interactive chat
//! garmin-chat chat
//!
//! # One question
//! garmin-chat ask "How did I sleep last night?"
//!
//! # Provider catalog
//! garmin-chat providers
//! garmin-chat models anthropic
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use garmin_chat::assistant::GarminChat;
use garmin_chat::config::AssistantSettings;
use garmin_chat::logging::LoggingConfig;
use tracing::debug;

use commands::setup::ConfigureArgs;
use helpers::input::Prompt;

#[derive(Parser)]
#[command(
    name = "garmin-chat",
    about = "Chat with your Garmin Connect data",
    long_about = "Ask natural-language questions about your activities, sleep, stress and other Garmin metrics, answered by xAI, OpenAI, Azure OpenAI, Gemini or Anthropic.",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file override (default: ~/.garmin_chat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Interactive chat session
    Chat,

    /// Ask a single question and exit
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// List the supported AI providers
    Providers,

    /// List the models offered for a provider
    Models {
        /// Provider identifier, e.g. `openai`
        provider: String,
    },

    /// Update stored settings
    Configure(ConfigureArgs),

    /// Log in to Garmin Connect and store the session tokens
    Login,
}

fn load_settings(path: Option<&PathBuf>) -> AssistantSettings {
    path.map_or_else(AssistantSettings::load, |path| {
        let mut settings = AssistantSettings::load_from(path);
        settings.apply_env_overrides();
        settings
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    logging.init()?;

    if let Command::Configure(args) = &cli.command {
        // Env overrides must not leak into the saved file
        let path = cli
            .config
            .clone()
            .unwrap_or_else(AssistantSettings::default_path);
        commands::setup::configure(AssistantSettings::load_from(&path), args, &path)?;
        return Ok(());
    }

    let settings = load_settings(cli.config.as_ref());
    debug!(provider = %settings.active_provider, "Loaded settings");

    match cli.command {
        Command::Providers => commands::setup::providers(settings.active_provider),
        Command::Models { provider } => commands::setup::models(&provider)?,
        Command::Configure(_) => {}
        Command::Login => {
            let mut chat = GarminChat::new(settings)?;
            let mut prompt = Prompt::stdin();
            commands::chat::login(&mut chat, &mut prompt).await?;
        }
        Command::Ask { question } => {
            let mut chat = GarminChat::new(settings)?;
            let mut prompt = Prompt::stdin();
            commands::chat::login(&mut chat, &mut prompt).await?;
            commands::chat::ask(&mut chat, &question.join(" ")).await?;
        }
        Command::Chat => {
            let mut chat = GarminChat::new(settings)?;
            let mut prompt = Prompt::stdin();
            commands::chat::login(&mut chat, &mut prompt).await?;
            commands::chat::interactive(&mut chat, &mut prompt).await?;
        }
    }

    Ok(())
}

// ABOUTME: Login, one-shot and interactive chat commands for garmin-chat
// ABOUTME: Drives the Garmin MFA prompt and the read-answer loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::{bail, Result};
use garmin_chat::assistant::GarminChat;
use garmin_chat::auth::AuthOutcome;
use tracing::info;

use crate::helpers::display::{display_answer, display_banner};
use crate::helpers::input::Prompt;

/// Authenticate, prompting for an MFA code when Garmin asks for one
pub async fn login(chat: &mut GarminChat, prompt: &mut Prompt) -> Result<()> {
    let mut outcome = chat.authenticate().await;
    while outcome == AuthOutcome::MfaRequired {
        let Some(code) = prompt.read("Garmin MFA code: ").await? else {
            bail!("No MFA code entered");
        };
        outcome = chat.submit_mfa(&code).await;
        if let AuthOutcome::Error(message) = &outcome {
            if message.contains("6 digits") {
                println!("{message}");
                outcome = AuthOutcome::MfaRequired;
            }
        }
    }

    match outcome {
        AuthOutcome::Success => {
            info!("Connected to Garmin");
            println!("Connected to Garmin Connect");
            Ok(())
        }
        AuthOutcome::Error(message) => bail!(message),
        AuthOutcome::MfaRequired => bail!("MFA was not completed"),
    }
}

/// Answer one question
pub async fn ask(chat: &mut GarminChat, question: &str) -> Result<()> {
    let answer = chat.process_message(question).await?;
    println!("{answer}");
    Ok(())
}

/// Read questions until `/quit` or end of input
pub async fn interactive(chat: &mut GarminChat, prompt: &mut Prompt) -> Result<()> {
    display_banner();

    while let Some(line) = prompt.read("You: ").await? {
        match line.as_str() {
            "" => {}
            "/quit" | "/exit" => break,
            "/reset" => {
                chat.reset_conversation();
                println!("Conversation reset!");
            }
            "/save" => match chat.save_history() {
                Ok(path) => println!("Chat history saved to {}", path.display()),
                Err(e) => println!("Could not save chat history: {e}"),
            },
            question => match chat.process_message(question).await {
                Ok(answer) => display_answer(&answer),
                Err(e) => println!("Sorry, I encountered an error: {e}"),
            },
        }
    }

    if !chat.transcript().is_empty() {
        if let Ok(path) = chat.save_history() {
            info!(path = %path.display(), "Saved conversation on exit");
        }
    }
    Ok(())
}

// ABOUTME: Line-oriented terminal input for garmin-chat
// ABOUTME: Prints a prompt and reads one trimmed line from stdin without blocking the runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::io::{self, Write as _};

use anyhow::Result;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Stdin reader shared by the interactive commands
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    /// Show `label` and read a line; `None` at end of input
    pub async fn read(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_owned()))
    }
}

//! Chat command handler.
//!
//! Reads questions line by line and threads the session id returned by each
//! answer into the next query, so the service keeps conversational context.

use clap::Args;
use kbrag_client::{create_client, RagClient};
use kbrag_core::{config::AppConfig, AppError, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::{build_query, render_answer};

/// Interactive conversation against the knowledge base
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Resume an existing conversation
    #[arg(short, long)]
    pub session_id: Option<String>,

    /// Do not print retrieved sources
    #[arg(long)]
    pub no_sources: bool,
}

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Turn<'a> {
    Ask(&'a str),
    Skip,
    Quit,
}

fn classify(line: &str) -> Turn<'_> {
    match line.trim() {
        "" => Turn::Skip,
        "exit" | "quit" | ":q" => Turn::Quit,
        question => Turn::Ask(question),
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        // Fail on a missing knowledge base or model before reading input
        config.validate()?;
        let client = create_client(config)?;

        let stdin = BufReader::new(tokio::io::stdin());
        let session = self
            .run(&client, config, stdin, &mut std::io::stdout())
            .await?;

        if let Some(session_id) = session {
            eprintln!("Session: {}", session_id);
        }
        Ok(())
    }

    /// Conversation loop; returns the last session id.
    async fn run<R, W>(
        &self,
        client: &RagClient,
        config: &AppConfig,
        input: R,
        out: &mut W,
    ) -> AppResult<Option<String>>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut session_id = self.session_id.clone();
        let mut lines = input.lines();

        loop {
            eprint!("> ");
            std::io::stderr().flush().ok();

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let question = match classify(&line) {
                Turn::Ask(question) => question,
                Turn::Skip => continue,
                Turn::Quit => break,
            };

            let query = build_query(config, question, session_id.clone())?;

            match client.ask(&query).await {
                Ok(answer) => {
                    if answer.session_id.is_some() {
                        session_id = answer.session_id.clone();
                    }
                    render_answer(out, &answer, !self.no_sources)?;
                    writeln!(out)?;
                    out.flush()?;
                }
                // The service rejected the turn; a stale session is the usual cause
                Err(e @ AppError::InvalidArgument(_)) => {
                    tracing::error!("Query rejected: {}", e);
                    eprintln!("error: {}", e);
                    session_id = None;
                }
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    eprintln!("error: {}", e);
                }
            }
        }

        Ok(session_id)
    }
}

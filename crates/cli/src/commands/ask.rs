//! Ask command handler.
//!
//! Sends one question to the knowledge base and prints the answer.

use clap::Args;
use kbrag_client::create_client;
use kbrag_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

use super::{answer_json, build_query, render_answer};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Continue the conversation identified by this session id
    #[arg(short, long)]
    pub session_id: Option<String>,

    /// Number of chunks to retrieve
    #[arg(short = 'n', long)]
    pub number_of_results: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not print retrieved sources
    #[arg(long)]
    pub no_sources: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;

        let mut config = config.clone();
        if self.number_of_results.is_some() {
            config.number_of_results = self.number_of_results;
        }

        let query = build_query(&config, question, self.session_id.clone())?;
        let client = create_client(&config)?;

        let answer = client.ask(&query).await?;

        if self.json {
            println!("{}", answer_json(&config, &answer)?);
        } else {
            let stdout = std::io::stdout();
            render_answer(&mut stdout.lock(), &answer, !self.no_sources)?;

            if let Some(ref session_id) = answer.session_id {
                println!("\nSession: {}", session_id);
            }
        }

        Ok(())
    }

    /// Get the question text from the argument or a file.
    fn get_question(&self) -> AppResult<String> {
        let question = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(AppError::InvalidArgument(
                    "No question provided".to_string(),
                ))
            }
        };

        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(AppError::InvalidArgument("Question is empty".to_string()));
        }
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn command(question: Option<&str>, file: Option<PathBuf>) -> AskCommand {
        AskCommand {
            question: question.map(str::to_string),
            file,
            session_id: None,
            number_of_results: None,
            json: false,
            no_sources: false,
        }
    }

    #[test]
    fn test_question_from_argument() {
        let cmd = command(Some("  What is the SLA?  "), None);
        assert_eq!(cmd.get_question().unwrap(), "What is the SLA?");
    }

    #[test]
    fn test_question_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Summarize the onboarding guide.").unwrap();

        let cmd = command(None, Some(file.path().to_path_buf()));
        assert_eq!(cmd.get_question().unwrap(), "Summarize the onboarding guide.");
    }

    #[test]
    fn test_missing_question() {
        assert!(matches!(
            command(None, None).get_question(),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            command(Some("   "), None).get_question(),
            Err(AppError::InvalidArgument(_))
        ));
    }
}

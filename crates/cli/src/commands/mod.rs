//! Command handlers for the kbrag CLI.
//!
//! This module organizes all CLI commands into separate submodules, plus the
//! answer rendering they share.

pub mod ask;
pub mod chat;
pub mod config;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use config::ConfigCommand;

use kbrag_client::{RagAnswer, RagQuery};
use kbrag_core::{AppConfig, AppError, AppResult};
use std::io::Write;

/// Build a query from the configured knowledge base and model.
pub fn build_query(
    config: &AppConfig,
    text: impl Into<String>,
    session_id: Option<String>,
) -> AppResult<RagQuery> {
    config.validate()?;

    let knowledge_base_id = config.knowledge_base_id.clone().unwrap_or_default();
    let model_id = config.model_id.clone().unwrap_or_default();

    Ok(RagQuery::new(text, knowledge_base_id, model_id).with_session(session_id))
}

/// Print an answer as text: the answer, then numbered sources.
pub fn render_answer(
    out: &mut impl Write,
    answer: &RagAnswer,
    show_sources: bool,
) -> AppResult<()> {
    writeln!(out, "{}", answer.text.trim_end())?;

    if let Some(ref action) = answer.guardrail_action {
        writeln!(out, "\n[guardrail: {}]", action)?;
    }

    if show_sources {
        if answer.has_sources() {
            writeln!(out, "\nSources:")?;
            for (i, source) in answer.sources.iter().enumerate() {
                match source.location {
                    Some(ref location) => writeln!(out, "[{}] {}", i + 1, location)?,
                    None => writeln!(out, "[{}]", i + 1)?,
                }
                for line in source.text.trim().lines() {
                    writeln!(out, "    {}", line)?;
                }
            }
        } else {
            writeln!(out, "\nSources: none")?;
        }
    }

    Ok(())
}

/// Structured JSON document for `--json` output.
pub fn answer_json(config: &AppConfig, answer: &RagAnswer) -> AppResult<String> {
    let output = serde_json::json!({
        "answer": answer.text,
        "sources": answer.sources,
        "sessionId": answer.session_id,
        "guardrailAction": answer.guardrail_action,
        "knowledgeBaseId": config.knowledge_base_id,
        "modelId": config.model_id,
        "region": config.region,
    });

    serde_json::to_string_pretty(&output).map_err(|e| AppError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbrag_client::SourceSnippet;

    fn test_config() -> AppConfig {
        AppConfig {
            region: Some("us-east-1".to_string()),
            knowledge_base_id: Some("KB12345678".to_string()),
            model_id: Some("anthropic.claude-v2".to_string()),
            ..AppConfig::default()
        }
    }

    fn answer(sources: Vec<SourceSnippet>) -> RagAnswer {
        RagAnswer {
            text: "Refunds take 30 days.\n".to_string(),
            sources,
            session_id: Some("session-1".to_string()),
            guardrail_action: None,
        }
    }

    #[test]
    fn test_build_query_threads_session() {
        let query = build_query(&test_config(), "q", Some("abc".to_string())).unwrap();
        assert_eq!(query.session_id(), Some("abc"));
        assert_eq!(query.knowledge_base_id(), "KB12345678");

        let query = build_query(&test_config(), "q", None).unwrap();
        assert!(matches!(query, RagQuery::NewConversation { .. }));
    }

    #[test]
    fn test_build_query_requires_knowledge_base() {
        let mut config = test_config();
        config.knowledge_base_id = None;
        assert!(matches!(
            build_query(&config, "q", None),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_render_answer_with_sources() {
        let answer = answer(vec![
            SourceSnippet {
                text: "Refunds within 30 days.".to_string(),
                location: Some("s3://docs/refunds.pdf".to_string()),
            },
            SourceSnippet {
                text: "Contact support.".to_string(),
                location: None,
            },
        ]);

        let mut out = Vec::new();
        render_answer(&mut out, &answer, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Refunds take 30 days.\n\nSources:\n[1] s3://docs/refunds.pdf\n    Refunds within 30 days.\n[2]\n    Contact support.\n"
        );
    }

    #[test]
    fn test_render_answer_without_sources() {
        let mut out = Vec::new();
        render_answer(&mut out, &answer(vec![]), true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Refunds take 30 days.\n\nSources: none\n"
        );

        let mut out = Vec::new();
        render_answer(&mut out, &answer(vec![]), false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Refunds take 30 days.\n");
    }

    #[test]
    fn test_answer_json() {
        let json = answer_json(&test_config(), &answer(vec![])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sessionId"], "session-1");
        assert_eq!(value["knowledgeBaseId"], "KB12345678");
        assert_eq!(value["sources"], serde_json::json!([]));
    }
}

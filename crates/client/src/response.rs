//! `retrieveAndGenerate` response types and snippet extraction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw response from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateResponse {
    pub output: RetrieveAndGenerateOutput,

    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Session to pass back in for the next turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Set when a guardrail intervened (e.g. "INTERVENED")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrail_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveAndGenerateOutput {
    #[serde(default)]
    pub text: String,
}

/// Links a part of the generated answer to the references that support it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_response_part: Option<GeneratedResponsePart>,

    #[serde(default)]
    pub retrieved_references: Vec<RetrievedReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_response_part: Option<TextResponsePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResponsePart {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

/// Character offsets into the generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

/// A chunk retrieved from the knowledge base.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievedReference {
    #[serde(default)]
    pub content: ReferenceContent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ReferenceLocation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceContent {
    #[serde(default)]
    pub text: String,
}

/// Where a retrieved chunk came from.
///
/// The per-source payload (`s3Location`, `webLocation`, ...) is kept as raw
/// JSON so new source types decode without changes here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLocation {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ReferenceLocation {
    /// Best-effort human readable address of the source document.
    pub fn uri(&self) -> Option<&str> {
        const KEYS: &[(&str, &str)] = &[
            ("s3Location", "uri"),
            ("webLocation", "url"),
            ("confluenceLocation", "url"),
            ("salesforceLocation", "url"),
            ("sharePointLocation", "url"),
            ("kendraDocumentLocation", "uri"),
            ("customDocumentLocation", "id"),
        ];

        KEYS.iter().find_map(|(location, field)| {
            self.details
                .get(*location)
                .and_then(|v| v.get(*field))
                .and_then(Value::as_str)
        })
    }
}

/// Every retrieved reference, citation by citation, in response order.
fn references(citations: &[Citation]) -> impl Iterator<Item = &RetrievedReference> {
    citations
        .iter()
        .flat_map(|citation| citation.retrieved_references.iter())
}

/// Flatten the text of every reference of every citation.
///
/// Order is citation order, then reference order within a citation.
pub fn flatten_references(citations: &[Citation]) -> Vec<String> {
    references(citations)
        .map(|reference| reference.content.text.clone())
        .collect()
}

/// A retrieved snippet together with its source address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSnippet {
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Answer text plus the snippets it was grounded on.
///
/// An answer with no sources is valid; callers must cope with an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RagAnswer {
    pub text: String,

    pub sources: Vec<SourceSnippet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrail_action: Option<String>,
}

impl RagAnswer {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Snippet texts in citation-then-reference order.
    pub fn snippets(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.text.as_str()).collect()
    }
}

impl From<RetrieveAndGenerateResponse> for RagAnswer {
    fn from(response: RetrieveAndGenerateResponse) -> Self {
        let sources = references(&response.citations)
            .map(|reference| SourceSnippet {
                text: reference.content.text.clone(),
                location: reference
                    .location
                    .as_ref()
                    .and_then(ReferenceLocation::uri)
                    .map(str::to_string),
            })
            .collect();

        Self {
            text: response.output.text,
            sources,
            session_id: response.session_id,
            guardrail_action: response.guardrail_action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn citation(texts: &[&str]) -> Citation {
        Citation {
            generated_response_part: None,
            retrieved_references: texts
                .iter()
                .map(|t| RetrievedReference {
                    content: ReferenceContent {
                        text: t.to_string(),
                    },
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_flatten_two_citations() {
        let citations = vec![citation(&["first"]), citation(&["second"])];
        assert_eq!(flatten_references(&citations), vec!["first", "second"]);
    }

    #[test]
    fn test_flatten_preserves_nested_order() {
        let citations = vec![citation(&["a1", "a2"]), citation(&[]), citation(&["b1"])];
        assert_eq!(flatten_references(&citations), vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten_references(&[]).is_empty());
    }

    #[test]
    fn test_decode_full_response() {
        let body = json!({
            "output": { "text": "Refunds are issued within 30 days." },
            "citations": [
                {
                    "generatedResponsePart": {
                        "textResponsePart": {
                            "text": "Refunds are issued within 30 days.",
                            "span": { "start": 0, "end": 34 }
                        }
                    },
                    "retrievedReferences": [
                        {
                            "content": { "text": "Customers may request a refund within 30 days." },
                            "location": {
                                "type": "S3",
                                "s3Location": { "uri": "s3://docs/policies/refunds.pdf" }
                            },
                            "metadata": { "x-amz-bedrock-kb-source-uri": "s3://docs/policies/refunds.pdf" }
                        }
                    ]
                }
            ],
            "sessionId": "3f1c9a2e-session"
        });

        let response: RetrieveAndGenerateResponse = serde_json::from_value(body).unwrap();
        let span = response.citations[0]
            .generated_response_part
            .as_ref()
            .and_then(|p| p.text_response_part.as_ref())
            .and_then(|p| p.span)
            .unwrap();
        assert_eq!(span, Span { start: 0, end: 34 });

        let answer = RagAnswer::from(response);
        assert_eq!(answer.text, "Refunds are issued within 30 days.");
        assert_eq!(answer.session_id.as_deref(), Some("3f1c9a2e-session"));
        assert_eq!(
            answer.sources,
            vec![SourceSnippet {
                text: "Customers may request a refund within 30 days.".to_string(),
                location: Some("s3://docs/policies/refunds.pdf".to_string()),
            }]
        );
    }

    #[test]
    fn test_decode_without_citations() {
        let body = json!({ "output": { "text": "I could not find that." } });
        let response: RetrieveAndGenerateResponse = serde_json::from_value(body).unwrap();
        assert!(response.citations.is_empty());

        let answer = RagAnswer::from(response);
        assert_eq!(answer.text, "I could not find that.");
        assert!(!answer.has_sources());
        assert!(answer.snippets().is_empty());
    }

    #[test]
    fn test_web_location_uri() {
        let location: ReferenceLocation = serde_json::from_value(json!({
            "type": "WEB",
            "webLocation": { "url": "https://example.com/faq" }
        }))
        .unwrap();
        assert_eq!(location.kind, "WEB");
        assert_eq!(location.uri(), Some("https://example.com/faq"));
    }

    #[test]
    fn test_unknown_location_has_no_uri() {
        let location: ReferenceLocation =
            serde_json::from_value(json!({ "type": "SQL", "sqlLocation": { "query": "SELECT 1" } }))
                .unwrap();
        assert_eq!(location.uri(), None);
    }
}

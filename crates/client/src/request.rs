//! Query variants and the `retrieveAndGenerate` request body.
//!
//! A query either starts a new conversation or continues one identified by a
//! session id. The two variants serialize to two different request shapes:
//! the `sessionId` key is only present for a continued conversation, because
//! the service rejects null or empty session ids.

use kbrag_core::{AppError, AppResult};
use serde::Serialize;

use crate::model::ModelRef;

/// A single question against a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RagQuery {
    /// First turn; the service allocates a session.
    NewConversation {
        text: String,
        knowledge_base_id: String,
        model: ModelRef,
    },

    /// Follow-up turn reusing the server-side conversational memory.
    ContinuedConversation {
        text: String,
        knowledge_base_id: String,
        model: ModelRef,
        session_id: String,
    },
}

impl RagQuery {
    /// Create a query that starts a new conversation.
    pub fn new(
        text: impl Into<String>,
        knowledge_base_id: impl Into<String>,
        model: impl Into<ModelRef>,
    ) -> Self {
        Self::NewConversation {
            text: text.into(),
            knowledge_base_id: knowledge_base_id.into(),
            model: model.into(),
        }
    }

    /// Attach an optional session id.
    ///
    /// `None` or a blank id yields a new conversation.
    pub fn with_session(self, session_id: Option<impl Into<String>>) -> Self {
        let session_id: Option<String> = session_id
            .map(Into::into)
            .filter(|id| !id.trim().is_empty());

        let (text, knowledge_base_id, model) = self.into_parts();
        match session_id {
            Some(session_id) => Self::ContinuedConversation {
                text,
                knowledge_base_id,
                model,
                session_id,
            },
            None => Self::NewConversation {
                text,
                knowledge_base_id,
                model,
            },
        }
    }

    fn into_parts(self) -> (String, String, ModelRef) {
        match self {
            Self::NewConversation {
                text,
                knowledge_base_id,
                model,
            }
            | Self::ContinuedConversation {
                text,
                knowledge_base_id,
                model,
                ..
            } => (text, knowledge_base_id, model),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::NewConversation { text, .. } | Self::ContinuedConversation { text, .. } => text,
        }
    }

    pub fn knowledge_base_id(&self) -> &str {
        match self {
            Self::NewConversation {
                knowledge_base_id, ..
            }
            | Self::ContinuedConversation {
                knowledge_base_id, ..
            } => knowledge_base_id,
        }
    }

    pub fn model(&self) -> &ModelRef {
        match self {
            Self::NewConversation { model, .. } | Self::ContinuedConversation { model, .. } => {
                model
            }
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::NewConversation { .. } => None,
            Self::ContinuedConversation { session_id, .. } => Some(session_id),
        }
    }

    /// Build the wire request.
    ///
    /// Fails with `InvalidArgument` when the text or knowledge base id is
    /// blank, or the model reference cannot be resolved. Nothing is sent.
    pub fn to_request(
        &self,
        region: Option<&str>,
        number_of_results: Option<u32>,
    ) -> AppResult<RetrieveAndGenerateRequest> {
        if self.text().trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "query text must not be empty".to_string(),
            ));
        }

        let knowledge_base_id = self.knowledge_base_id().trim();
        if knowledge_base_id.is_empty() {
            return Err(AppError::InvalidArgument(
                "knowledge base id must not be empty".to_string(),
            ));
        }

        let model_arn = self.model().resolve_arn(region)?;

        let retrieval_configuration = match number_of_results {
            Some(0) => {
                return Err(AppError::InvalidArgument(
                    "numberOfResults must be at least 1".to_string(),
                ))
            }
            Some(n) => Some(RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: n,
                },
            }),
            None => None,
        };

        Ok(RetrieveAndGenerateRequest {
            input: RetrieveAndGenerateInput {
                text: self.text().to_string(),
            },
            retrieve_and_generate_configuration: RetrieveAndGenerateConfiguration {
                kind: RetrieveAndGenerateType::KnowledgeBase,
                knowledge_base_configuration: KnowledgeBaseConfiguration {
                    knowledge_base_id: knowledge_base_id.to_string(),
                    model_arn,
                    retrieval_configuration,
                },
            },
            session_id: self.session_id().map(str::to_string),
        })
    }
}

/// Body of `POST /retrieveAndGenerate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateRequest {
    pub input: RetrieveAndGenerateInput,

    pub retrieve_and_generate_configuration: RetrieveAndGenerateConfiguration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrieveAndGenerateInput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateConfiguration {
    #[serde(rename = "type")]
    pub kind: RetrieveAndGenerateType,

    pub knowledge_base_configuration: KnowledgeBaseConfiguration,
}

/// Retrieval source type. Only knowledge bases are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrieveAndGenerateType {
    KnowledgeBase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfiguration {
    pub knowledge_base_id: String,

    pub model_arn: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_configuration: Option<RetrievalConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfiguration {
    pub vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchConfiguration {
    pub number_of_results: u32,
}

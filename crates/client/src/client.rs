//! The RAG query client.
//!
//! A [`RagClient`] is constructed explicitly and passed to whoever needs it.
//! It owns its transport and the region used to resolve bare model ids.

use std::sync::Arc;

use kbrag_core::AppResult;

use crate::request::{RagQuery, RetrieveAndGenerateRequest};
use crate::response::{RagAnswer, RetrieveAndGenerateResponse};
use crate::transport::RagTransport;

pub struct RagClient {
    transport: Arc<dyn RagTransport>,
    region: Option<String>,
    number_of_results: Option<u32>,
}

impl RagClient {
    pub fn new(transport: Arc<dyn RagTransport>, region: Option<String>) -> Self {
        Self {
            transport,
            region,
            number_of_results: None,
        }
    }

    /// Ask the service to retrieve this many chunks per query.
    pub fn with_number_of_results(mut self, number_of_results: Option<u32>) -> Self {
        self.number_of_results = number_of_results;
        self
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Build the wire request for a query without sending it.
    pub fn build_request(&self, query: &RagQuery) -> AppResult<RetrieveAndGenerateRequest> {
        query.to_request(self.region.as_deref(), self.number_of_results)
    }

    /// Send a query and return the service response unmodified.
    ///
    /// The query is validated before anything goes on the wire, so a missing
    /// knowledge base id or model fails with `InvalidArgument` without a call.
    pub async fn query(&self, query: &RagQuery) -> AppResult<RetrieveAndGenerateResponse> {
        let request = self.build_request(query)?;
        let config = &request.retrieve_and_generate_configuration.knowledge_base_configuration;

        tracing::info!(
            transport = self.transport.name(),
            knowledge_base_id = %config.knowledge_base_id,
            model_arn = %config.model_arn,
            continued = request.session_id.is_some(),
            "Sending retrieveAndGenerate request"
        );

        let response = self.transport.retrieve_and_generate(&request).await?;

        tracing::info!(
            citations = response.citations.len(),
            session_id = response.session_id.as_deref().unwrap_or(""),
            "Received retrieveAndGenerate response"
        );

        Ok(response)
    }

    /// Send a query and extract the answer text and source snippets.
    pub async fn ask(&self, query: &RagQuery) -> AppResult<RagAnswer> {
        let answer = RagAnswer::from(self.query(query).await?);

        if !answer.has_sources() {
            tracing::debug!(model = query.model().as_str(), "Answer has no citations");
        }

        Ok(answer)
    }
}

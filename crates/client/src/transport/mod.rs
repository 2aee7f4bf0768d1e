//! Transport abstraction for the retrieve-and-generate service.
//!
//! The client builds requests and interprets responses; a transport only moves
//! them. Swapping the transport is how tests run without a network.

pub mod http;

pub use http::{HttpTransport, HttpTransportConfig};

use kbrag_core::AppResult;

use crate::request::RetrieveAndGenerateRequest;
use crate::response::RetrieveAndGenerateResponse;

/// Sends one `retrieveAndGenerate` request and returns the decoded response.
#[async_trait::async_trait]
pub trait RagTransport: Send + Sync {
    /// Short name used in logs (e.g., "http").
    fn name(&self) -> &str;

    /// Perform the call.
    ///
    /// # Errors
    /// `InvalidArgument` for validation failures reported by the service,
    /// `RemoteService` for everything else that is not a 2xx.
    async fn retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> AppResult<RetrieveAndGenerateResponse>;
}

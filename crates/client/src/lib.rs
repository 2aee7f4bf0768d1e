//! Retrieve-and-generate client for kbrag.
//!
//! Sends a question to a managed knowledge-base service and unpacks the
//! generated answer together with the retrieved source snippets. Retrieval,
//! embedding and generation all happen remotely; this crate only builds the
//! request and reads the response.
//!
//! # Example
//! ```no_run
//! use kbrag_client::{create_client, RagQuery};
//! use kbrag_core::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let client = create_client(&config)?;
//!
//! let query = RagQuery::new(
//!     "What is the refund policy?",
//!     "KB12345678",
//!     "anthropic.claude-3-haiku-20240307-v1:0",
//! );
//! let answer = client.ask(&query).await?;
//! println!("{}", answer.text);
//! for snippet in answer.snippets() {
//!     println!("- {}", snippet);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod model;
pub mod request;
pub mod response;
pub mod transport;

// Re-export main types
pub use client::RagClient;
pub use factory::create_client;
pub use model::ModelRef;
pub use request::{RagQuery, RetrieveAndGenerateRequest};
pub use response::{flatten_references, Citation, RagAnswer, RetrieveAndGenerateResponse, SourceSnippet};
pub use transport::{HttpTransport, HttpTransportConfig, RagTransport};

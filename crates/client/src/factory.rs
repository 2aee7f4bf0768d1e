//! Client factory.
//!
//! Turns application configuration into a ready [`RagClient`] backed by the
//! HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use kbrag_core::{AppConfig, AppError, AppResult};

use crate::client::RagClient;
use crate::transport::{HttpTransport, HttpTransportConfig};

/// Build the transport settings from configuration.
///
/// # Errors
/// `Config` if neither a region nor an endpoint override is set.
pub fn transport_config(config: &AppConfig) -> AppResult<HttpTransportConfig> {
    let region = config.region.as_deref().filter(|r| !r.trim().is_empty());

    let mut transport = match (config.endpoint.as_deref(), region) {
        (Some(endpoint), _) => HttpTransportConfig::with_endpoint(endpoint),
        (None, Some(region)) => HttpTransportConfig::for_region(region),
        (None, None) => {
            return Err(AppError::Config(
                "Either a region or an endpoint must be configured".to_string(),
            ))
        }
    };

    transport.token = config.token.clone();
    transport.connect_timeout = Duration::from_secs(config.connect_timeout_secs);
    transport.timeout = Duration::from_secs(config.timeout_secs);
    transport.max_retries = config.max_retries;

    Ok(transport)
}

/// Create a [`RagClient`] from configuration.
pub fn create_client(config: &AppConfig) -> AppResult<RagClient> {
    let transport = HttpTransport::new(transport_config(config)?)?;

    if config.token.is_none() {
        tracing::warn!(
            "No bearer token found in {}; requests will be sent unauthenticated",
            config.token_env
        );
    }

    tracing::debug!("Endpoint: {}", transport.config().endpoint);

    Ok(RagClient::new(Arc::new(transport), config.region.clone())
        .with_number_of_results(config.number_of_results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_endpoint() {
        let config = AppConfig {
            region: Some("us-west-2".to_string()),
            max_retries: 2,
            ..AppConfig::default()
        };

        let transport = transport_config(&config).unwrap();
        assert_eq!(
            transport.endpoint,
            "https://bedrock-agent-runtime.us-west-2.amazonaws.com"
        );
        assert_eq!(transport.max_retries, 2);
        assert_eq!(transport.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = AppConfig {
            region: Some("us-west-2".to_string()),
            endpoint: Some("http://localhost:4566".to_string()),
            token: Some("t".to_string()),
            ..AppConfig::default()
        };

        let transport = transport_config(&config).unwrap();
        assert_eq!(transport.endpoint, "http://localhost:4566");
        assert_eq!(transport.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_requires_region_or_endpoint() {
        let result = create_client(&AppConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_create_client() {
        let config = AppConfig {
            region: Some("ap-southeast-2".to_string()),
            number_of_results: Some(5),
            ..AppConfig::default()
        };

        let client = create_client(&config).unwrap();
        assert_eq!(client.region(), Some("ap-southeast-2"));
    }
}

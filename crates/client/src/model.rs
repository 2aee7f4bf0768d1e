//! Foundation model references.
//!
//! A model can be named either by its bare id (`anthropic.claude-3-haiku-20240307-v1:0`)
//! or by a fully qualified ARN. Bare ids are turned into ARNs using the region.

use kbrag_core::{AppError, AppResult};

/// Reference to the generation model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    /// Bare foundation model id; needs a region to resolve.
    Id(String),
    /// Fully qualified resource name, used verbatim.
    Arn(String),
}

impl ModelRef {
    /// Parse a model reference; anything starting with `arn:` is an ARN.
    pub fn parse(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with("arn:") {
            Self::Arn(value)
        } else {
            Self::Id(value)
        }
    }

    /// The raw string as supplied.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Arn(arn) => arn,
        }
    }

    /// Resolve to the ARN sent as `modelArn`.
    ///
    /// # Errors
    /// `InvalidArgument` if the reference is empty, or if it is a bare id and
    /// no region is available.
    pub fn resolve_arn(&self, region: Option<&str>) -> AppResult<String> {
        match self {
            Self::Arn(arn) => Ok(arn.clone()),
            Self::Id(id) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err(AppError::InvalidArgument(
                        "model id must not be empty".to_string(),
                    ));
                }
                let region = region
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        AppError::InvalidArgument(format!(
                            "a region is required to build the model ARN for '{}'",
                            id
                        ))
                    })?;
                Ok(foundation_model_arn(region, id))
            }
        }
    }
}

impl From<&str> for ModelRef {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for ModelRef {
    fn from(value: String) -> Self {
        Self::parse(value)
    }
}

/// ARN partition that owns a region.
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    }
}

/// Build `arn:<partition>:bedrock:<region>::foundation-model/<model_id>`.
pub fn foundation_model_arn(region: &str, model_id: &str) -> String {
    format!(
        "arn:{}:bedrock:{}::foundation-model/{}",
        partition_for_region(region),
        region,
        model_id
    )
}

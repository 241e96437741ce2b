//! Error types shared by the assembler, the engine and pluggable units.
//!
//! Assembly-time failures (`UnresolvableUnit`, `InvalidConfiguration`,
//! `ConfigurationError`) are returned to the caller of
//! [`PipelineAssembler::build`](crate::builder::PipelineAssembler::build) and
//! prevent a run from starting. Everything raised while a request is being
//! processed is contained to that request.

use std::fmt;

use thiserror::Error;

/// The capability category a unit is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    DownloaderMiddleware,
    ResponseMiddleware,
    ItemProcessor,
    Extension,
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitCategory::DownloaderMiddleware => "downloader middleware",
            UnitCategory::ResponseMiddleware => "response middleware",
            UnitCategory::ItemProcessor => "item processor",
            UnitCategory::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// A failure reported by the transport for a single request.
///
/// This is not fatal: the engine turns it into a failed
/// [`Response`](crate::response::Response) and routes it through the
/// response phase like any other response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFailure {
    message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        TransportFailure::new(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("no {category} registered under `{identifier}`")]
    UnresolvableUnit {
        category: UnitCategory,
        identifier: String,
    },

    #[error("invalid options for `{identifier}`: {reason}")]
    InvalidConfiguration { identifier: String, reason: String },

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportFailure),

    #[error("stage `{stage}` failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<SpiderError>,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    GeneralError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpiderError {
    /// Wraps an error raised by the chain link named `stage`.
    pub(crate) fn stage(stage: &str, source: SpiderError) -> Self {
        SpiderError::Stage {
            stage: stage.to_string(),
            source: Box::new(source),
        }
    }

    /// Builds an [`SpiderError::InvalidConfiguration`] for `identifier`.
    pub fn invalid_configuration(identifier: impl Into<String>, reason: impl fmt::Display) -> Self {
        SpiderError::InvalidConfiguration {
            identifier: identifier.into(),
            reason: reason.to_string(),
        }
    }
}

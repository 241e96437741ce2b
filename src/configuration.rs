//! Declarative pipeline description, overrides and unit configuration.
//!
//! A [`PipelineDescription`] lists, per stage category, the units that make up
//! a crawl in the order they run, together with the concurrency bound and the
//! minimum delay between fetch dispatches. Descriptions are plain serde types;
//! a unit reference is written either as a bare identifier or as an
//! `[identifier, {options}]` pair:
//!
//! ```json
//! {
//!   "downloader_middleware": ["request-deduplication", ["user-agent", {"user_agent": "bot/1.0"}]],
//!   "concurrency": 4,
//!   "request_delay_ms": 250
//! }
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SpiderError;

/// Options handed to [`Configurable::configure`].
pub type Options = Map<String, Value>;

/// A reference to a pluggable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitReference {
    Bare(String),
    Configured(String, Options),
}

impl UnitReference {
    pub fn bare(identifier: impl Into<String>) -> Self {
        UnitReference::Bare(identifier.into())
    }

    pub fn configured(identifier: impl Into<String>, options: Options) -> Self {
        UnitReference::Configured(identifier.into(), options)
    }

    pub fn identifier(&self) -> &str {
        match self {
            UnitReference::Bare(identifier) | UnitReference::Configured(identifier, _) => {
                identifier
            }
        }
    }

    /// Canonical `(identifier, options)` form; bare references get no options.
    pub fn to_parts(&self) -> (&str, Options) {
        match self {
            UnitReference::Bare(identifier) => (identifier, Options::new()),
            UnitReference::Configured(identifier, options) => (identifier, options.clone()),
        }
    }
}

impl From<&str> for UnitReference {
    fn from(identifier: &str) -> Self {
        UnitReference::bare(identifier)
    }
}

impl TryFrom<(&str, Value)> for UnitReference {
    type Error = SpiderError;

    /// Options must be a JSON object; `null` stands for no options.
    fn try_from((identifier, options): (&str, Value)) -> Result<Self, Self::Error> {
        match options {
            Value::Object(options) => Ok(UnitReference::configured(identifier, options)),
            Value::Null => Ok(UnitReference::bare(identifier)),
            other => Err(SpiderError::invalid_configuration(
                identifier,
                format!("options must be an object, got {other}"),
            )),
        }
    }
}

/// The declared shape of a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDescription {
    pub downloader_middleware: Vec<UnitReference>,
    pub response_middleware: Vec<UnitReference>,
    pub item_processors: Vec<UnitReference>,
    pub extensions: Vec<UnitReference>,
    /// Maximum number of requests processed at the same time.
    pub concurrency: usize,
    /// Minimum spacing between two fetch dispatches.
    #[serde(rename = "request_delay_ms", with = "duration_ms")]
    pub request_delay: Duration,
}

impl Default for PipelineDescription {
    fn default() -> Self {
        Self {
            downloader_middleware: Vec::new(),
            response_middleware: Vec::new(),
            item_processors: Vec::new(),
            extensions: Vec::new(),
            concurrency: 2,
            request_delay: Duration::from_secs(1),
        }
    }
}

impl PipelineDescription {
    /// Returns a new description where every field present in `overrides`
    /// replaces the corresponding field of `self`.
    pub fn with_overrides(&self, overrides: &Overrides) -> Self {
        Self {
            downloader_middleware: overrides
                .downloader_middleware
                .clone()
                .unwrap_or_else(|| self.downloader_middleware.clone()),
            response_middleware: overrides
                .response_middleware
                .clone()
                .unwrap_or_else(|| self.response_middleware.clone()),
            item_processors: overrides
                .item_processors
                .clone()
                .unwrap_or_else(|| self.item_processors.clone()),
            extensions: overrides
                .extensions
                .clone()
                .unwrap_or_else(|| self.extensions.clone()),
            concurrency: overrides.concurrency.unwrap_or(self.concurrency),
            request_delay: overrides.request_delay.unwrap_or(self.request_delay),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SpiderError> {
        if self.concurrency == 0 {
            return Err(SpiderError::ConfigurationError(
                "concurrency must be greater than 0.".to_string(),
            ));
        }
        Ok(())
    }
}

/// A partial replacement for a [`PipelineDescription`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub downloader_middleware: Option<Vec<UnitReference>>,
    pub response_middleware: Option<Vec<UnitReference>>,
    pub item_processors: Option<Vec<UnitReference>>,
    pub extensions: Option<Vec<UnitReference>>,
    pub concurrency: Option<usize>,
    #[serde(rename = "request_delay_ms", with = "option_duration_ms")]
    pub request_delay: Option<Duration>,
}

/// Implemented by every middleware, item processor and extension.
pub trait Configurable {
    /// Validates and applies `options`.
    ///
    /// The default accepts only an empty option map. Units with options
    /// usually deserialize them with [`parse_options`].
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        if options.is_empty() {
            return Ok(());
        }
        let keys: Vec<&str> = options.keys().map(String::as_str).collect();
        Err(SpiderError::GeneralError(format!(
            "unit takes no options, got: {}",
            keys.join(", ")
        )))
    }
}

/// Deserializes `options` into a typed options struct.
///
/// Pair it with `#[serde(default, deny_unknown_fields)]` so absent keys keep
/// their defaults and unknown keys are rejected.
pub fn parse_options<T: DeserializeOwned>(options: Options) -> Result<T, SpiderError> {
    Ok(serde_json::from_value(Value::Object(options))?)
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

mod option_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

//! Reports the run's statistics when it finishes.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::configuration::{parse_options, Configurable, Options};
use crate::error::SpiderError;
use crate::events::{Event, EventKind, RunInfo};

use super::Extension;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StatsOptions {
    format: StatsFormat,
}

#[derive(Debug, Default)]
pub struct StatsCollectorExtension {
    format: StatsFormat,
}

impl Configurable for StatsCollectorExtension {
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        let options: StatsOptions = parse_options(options)?;
        self.format = options.format;
        Ok(())
    }
}

#[async_trait]
impl Extension for StatsCollectorExtension {
    fn subscribed_events(&self) -> Vec<EventKind> {
        vec![EventKind::RunFinished]
    }

    async fn handle_event(&self, run: &RunInfo, event: &Event) -> Result<(), SpiderError> {
        let Event::RunFinished { result } = event else {
            return Ok(());
        };
        let report = match self.format {
            StatsFormat::Text => result.to_string(),
            StatsFormat::Json => result.to_json_string_pretty()?,
            StatsFormat::Markdown => result.to_markdown_string(),
        };
        info!(run = %run.id, spider = %run.spider, "{}", report);
        Ok(())
    }
}

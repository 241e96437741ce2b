//! # Extensions
//!
//! Extensions observe a run through its lifecycle [`Event`]s. They cannot
//! steer it: whatever an extension returns, and even if it panics, the engine
//! carries on. Anything that needs to influence requests or items belongs in a
//! middleware or an item processor.
//!
//! Events are delivered to subscribed extensions one after another, in the
//! order the extensions were declared, and each delivery is awaited before the
//! engine moves on with the request that triggered it.

pub mod logger;
pub mod stats;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{error, warn};

use crate::configuration::{Configurable, Options};
use crate::error::SpiderError;
use crate::events::{Event, EventKind, RunInfo};
use crate::plan::RunPlan;
use crate::resolver::ResolvedUnit;

#[async_trait]
pub trait Extension: Configurable + Send + Sync + 'static {
    /// The event kinds this extension wants to receive. Defaults to all.
    fn subscribed_events(&self) -> Vec<EventKind> {
        EventKind::ALL.to_vec()
    }

    async fn handle_event(&self, run: &RunInfo, event: &Event) -> Result<(), SpiderError>;
}

/// A resolved extension with its subscriptions captured at assembly time.
pub struct ExtensionHandle {
    name: String,
    options: Options,
    subscriptions: Vec<EventKind>,
    extension: Box<dyn Extension>,
}

impl ExtensionHandle {
    pub(crate) fn new(resolved: ResolvedUnit<dyn Extension>) -> Self {
        let subscriptions = resolved.unit.subscribed_events();
        Self {
            name: resolved.name,
            options: resolved.options,
            subscriptions,
            extension: resolved.unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn subscribes_to(&self, kind: EventKind) -> bool {
        self.subscriptions.contains(&kind)
    }
}

impl std::fmt::Debug for ExtensionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionHandle")
            .field("name", &self.name)
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

/// Delivers events of one run to the plan's extensions.
pub(crate) struct EventDispatcher {
    run: RunInfo,
    plan: Arc<RunPlan>,
}

impl EventDispatcher {
    pub(crate) fn new(run: RunInfo, plan: Arc<RunPlan>) -> Self {
        Self { run, plan }
    }

    pub(crate) fn run(&self) -> &RunInfo {
        &self.run
    }

    fn wants(&self, kind: EventKind) -> bool {
        self.plan
            .extensions()
            .iter()
            .any(|extension| extension.subscribes_to(kind))
    }

    /// Builds the event only if some extension listens for `kind`.
    pub(crate) async fn emit(&self, kind: EventKind, build: impl FnOnce() -> Event) {
        if !self.wants(kind) {
            return;
        }
        let event = build();
        debug_assert_eq!(event.kind(), kind);

        for handle in self.plan.extensions() {
            if !handle.subscribes_to(kind) {
                continue;
            }
            let delivery = handle.extension.handle_event(&self.run, &event);
            match AssertUnwindSafe(delivery).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    "Extension '{}' failed to handle {:?}: {}",
                    handle.name, kind, e
                ),
                Err(_) => error!("Extension '{}' panicked while handling {:?}", handle.name, kind),
            }
        }
    }
}

//! Trait for the item processing pipeline.
//!
//! Item processors receive every item that survived the response chain, in
//! declaration order. A processor may transform the item or drop it, in which
//! case the processors after it never see the item.

use async_trait::async_trait;

use crate::configuration::Configurable;
use crate::error::SpiderError;
use crate::item::{Item, Outcome};

#[async_trait]
pub trait ItemProcessor: Configurable + Send + Sync + 'static {
    /// Processes a single item.
    async fn process_item(&self, item: Item) -> Result<Outcome<Item>, SpiderError>;

    /// Called once after the last item of the run was processed.
    ///
    /// Use it to flush buffers or close connections.
    async fn close(&self) -> Result<(), SpiderError> {
        Ok(())
    }
}

//! The path of one extracted item: response middleware filtering, then the
//! item processors.
//!
//! Every extracted item ends in exactly one `ItemProcessed` or `ItemDropped`
//! event.

use tracing::trace;

use crate::events::{Event, EventKind};
use crate::item::Item;
use crate::response::Response;

use super::context::RunContext;
use super::middleware_chain;

pub(crate) async fn process_item(context: &RunContext, item: Item, response: &Response) {
    context.stats.increment_items_extracted();
    context
        .events
        .emit(EventKind::ItemExtracted, || Event::ItemExtracted { item: item.clone() })
        .await;

    let item = match middleware_chain::filter_item(context.plan.response_middleware(), item, response).await {
        Ok(item) => item,
        Err(rejection) => {
            context.item_dropped(rejection).await;
            return;
        }
    };

    match middleware_chain::process_item(context.plan.item_processors(), item).await {
        Ok(item) => {
            trace!("Item from {} made it through every processor", response.url);
            context.stats.increment_items_kept();
            context
                .events
                .emit(EventKind::ItemProcessed, move || Event::ItemProcessed { item })
                .await;
        }
        Err(rejection) => context.item_dropped(rejection).await,
    }
}

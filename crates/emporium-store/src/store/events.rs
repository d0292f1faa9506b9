use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use super::stor::{write_metadata, Store};
use crate::StoreEvent;

/// Starts the background event processing task.
///
/// The task rebroadcasts every event to subscribers and, when anything
/// changed, writes the store metadata at most once per flush interval.
pub fn start_event_processor(store: &mut Store, mut receiver: mpsc::UnboundedReceiver<StoreEvent>) {
    if store.event_task.is_some() {
        return;
    }

    let counters = store.counters.clone();
    let changes = store.changes.clone();
    let root_path = store.root_path.clone();
    let created_at = store.created_at;
    let flush_interval = store.config.metadata_flush_interval;

    let task = tokio::spawn(async move {
        let mut save_interval = tokio::time::interval(flush_interval);
        save_interval.tick().await;

        let mut changed = false;

        loop {
            tokio::select! {
                event = receiver.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    trace!("Processing store event: {:?}", event);
                    // No subscribers is not an error
                    let _ = changes.send(event);
                    changed = true;
                }

                _ = save_interval.tick() => {
                    if changed {
                        match write_metadata(&root_path, created_at, &counters).await {
                            Ok(()) => changed = false,
                            Err(e) => error!("Failed to save store metadata in background task: {}", e),
                        }
                    }
                }
            }
        }

        if changed && let Err(e) = write_metadata(&root_path, created_at, &counters).await {
            error!("Failed to save store metadata on shutdown: {}", e);
        }
        debug!("Store event processor stopped");
    });

    store.event_task = Some(task);
}

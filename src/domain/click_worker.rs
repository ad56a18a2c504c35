//! Background worker persisting queued click events.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::application::services::ShortenerService;
use crate::domain::click_event::ClickEvent;
use crate::error::AppError;

/// Retries after the first failed attempt.
const MAX_RETRIES: usize = 3;

/// Consumes click events until every sender is dropped.
///
/// Each event is recorded on its own task; at most `concurrency` tasks run
/// at once. Internal errors are retried with exponential backoff. Unknown
/// codes and final failures are logged and dropped. Returns once all
/// in-flight events are finished.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    shortener: Arc<ShortenerService>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let sema = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = sema.clone().acquire_owned().await else {
            break;
        };

        let shortener = shortener.clone();
        tokio::spawn(async move {
            process_event(&shortener, event).await;
            drop(permit);
        });
    }

    // Wait for in-flight events.
    let _ = sema.acquire_many(concurrency as u32).await;
    tracing::info!("Click worker stopped");
}

async fn process_event(shortener: &ShortenerService, event: ClickEvent) {
    let (code, metadata) = event.into_parts();

    let strategy = ExponentialBackoff::from_millis(10)
        .factor(2)
        .map(jitter)
        .take(MAX_RETRIES);

    let result = RetryIf::spawn(
        strategy,
        || shortener.record_click(&code, metadata.clone()),
        AppError::is_internal,
    )
    .await;

    match result {
        Ok(true) => tracing::debug!(code = %code, "Click recorded"),
        Ok(false) => tracing::warn!(code = %code, "Click for unknown or inactive code dropped"),
        Err(e) => tracing::warn!(code = %code, error = %e, "Failed to record click"),
    }
}

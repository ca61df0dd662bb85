//! Fixed-interval refresh for views that need to follow server state.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ClientError;

/// Call `fetch` immediately and then every `every`, yielding each result.
///
/// Failures are yielded too and do not stop polling. The background task
/// ends once the returned stream is dropped.
pub fn poll<T, F, Fut>(every: Duration, mut fetch: F) -> ReceiverStream<Result<T, ClientError>>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send,
{
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let result = fetch().await;
            if let Err(err) = &result {
                tracing::debug!(error = %err, "poll fetch failed");
            }
            if tx.send(result).await.is_err() {
                break;
            }
        }
    });
    ReceiverStream::new(rx)
}

// ── Reactive display stream ──
//
// Subscription handle for consuming display model rebuilds from the
// SnapshotStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::reconcile::DisplayModel;

/// A subscription to the display model.
///
/// Wait for rebuilds with [`changed()`](Self::changed), or convert to a
/// `Stream` that also yields the model current at subscription time.
pub struct DisplayStream {
    receiver: watch::Receiver<Arc<DisplayModel>>,
}

impl DisplayStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<DisplayModel>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next rebuild, returning the new model.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<DisplayModel>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> DisplayWatchStream {
        DisplayWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current model first, then every rebuild after it.
pub struct DisplayWatchStream {
    inner: WatchStream<Arc<DisplayModel>>,
}

impl Stream for DisplayWatchStream {
    type Item = Arc<DisplayModel>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use futures_util::StreamExt;

    use crate::model::DirectorySnapshot;
    use crate::reconcile::DisplayBody;
    use crate::store::SnapshotStore;

    #[tokio::test]
    async fn stream_yields_current_model_then_rebuilds() {
        let store = SnapshotStore::new();
        let mut stream = store.subscribe().into_stream();

        let first = stream.next().await.unwrap();
        assert_eq!(first.body, DisplayBody::Loading);

        store.apply_directory(DirectorySnapshot {
            version: 0,
            port: 3000,
            endpoints: Vec::new(),
            fetched_at: Utc::now(),
        });
        let next = stream.next().await.unwrap();
        assert!(next.is_empty_state());
        assert_eq!(next.port, Some(3000));
    }

    #[tokio::test]
    async fn stream_ends_when_store_is_dropped() {
        let store = SnapshotStore::new();
        let mut stream = store.subscribe().into_stream();
        stream.next().await.unwrap();

        drop(store);
        assert!(stream.next().await.is_none());
    }
}

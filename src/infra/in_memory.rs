//! In-memory collaborators backing the demo feeds.
//!
//! Sources serve a fixed history newest first, optionally after a simulated
//! fetch delay. The writer hands values to a worker task so `write` never
//! blocks the caller.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use futures::{stream, StreamExt};
use tokio::{runtime::Handle, sync::mpsc};

use crate::usecases::contracts::{DataSource, DataStream, DataWriter, PageDataSource, SourceError};

const WRITER_CLOSED: &str = "WRITER_CLOSED";
const SOURCE_FAILURE_INJECTED: &str = "SOURCE_FAILURE_INJECTED";

/// Fixed history split into pages of equal size.
#[derive(Debug, Clone)]
pub struct InMemoryFeed<T> {
    items: Arc<[T]>,
    page_size: usize,
    fetch_delay: Duration,
}

impl<T> InMemoryFeed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// `items` must be ordered newest first.
    pub fn new(items: Vec<T>, page_size: usize, fetch_delay: Duration) -> Self {
        Self {
            items: items.into(),
            page_size: page_size.max(1),
            fetch_delay,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first_page(&self) -> FirstPageSource<T> {
        FirstPageSource { feed: self.clone() }
    }

    /// Older pages, starting right after the first one.
    pub fn pages(&self) -> PageSource<T> {
        PageSource {
            feed: self.clone(),
            cursor: Mutex::new(self.page_size),
        }
    }

    fn slice(&self, from: usize) -> Vec<T> {
        let from = from.min(self.items.len());
        let to = (from + self.page_size).min(self.items.len());
        self.items[from..to].to_vec()
    }
}

pub struct FirstPageSource<T> {
    feed: InMemoryFeed<T>,
}

impl<T> DataSource<Vec<T>> for FirstPageSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn data(&self) -> DataStream<Vec<T>> {
        delayed(self.feed.fetch_delay, Some(self.feed.slice(0)))
    }
}

/// Older pages behind an external cursor.
///
/// Each subscription serves the page at the cursor and advances it. Past the
/// end, the subscription completes without a value.
pub struct PageSource<T> {
    feed: InMemoryFeed<T>,
    cursor: Mutex<usize>,
}

impl<T> PageSource<T> {
    fn cursor(&self) -> MutexGuard<'_, usize> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> DataSource<Vec<T>> for PageSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn data(&self) -> DataStream<Vec<T>> {
        let page = {
            let mut cursor = self.cursor();
            let page = self.feed.slice(*cursor);
            *cursor += page.len();
            page
        };

        tracing::debug!(items = page.len(), "serving older page");
        delayed(self.feed.fetch_delay, (!page.is_empty()).then_some(page))
    }
}

impl<T> PageDataSource<Vec<T>> for PageSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn has_next_page(&self) -> bool {
        *self.cursor() < self.feed.len()
    }

    fn reset_paging(&self) {
        *self.cursor() = self.feed.page_size;
    }
}

fn delayed<T: Send + 'static>(delay: Duration, value: Option<T>) -> DataStream<T> {
    stream::once(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        value
    })
    .flat_map(|value| stream::iter(value.into_iter().map(Ok)))
    .boxed()
}

/// Live source emitting a generated item per tick, up to `limit` items per
/// subscription.
pub struct TickerSource<T> {
    interval: Duration,
    limit: usize,
    make: Arc<dyn Fn(usize) -> T + Send + Sync>,
}

impl<T> TickerSource<T> {
    pub fn new(
        interval: Duration,
        limit: usize,
        make: impl Fn(usize) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            interval,
            limit,
            make: Arc::new(make),
        }
    }
}

impl<T: Send + 'static> DataSource<T> for TickerSource<T> {
    fn data(&self) -> DataStream<T> {
        let interval = self.interval;
        let limit = self.limit;
        let make = Arc::clone(&self.make);

        stream::unfold(0, move |tick| {
            let make = Arc::clone(&make);
            async move {
                if tick >= limit {
                    return None;
                }
                tokio::time::sleep(interval).await;
                Some((Ok(make(tick)), tick + 1))
            }
        })
        .boxed()
    }
}

/// Wraps a source so that its first `failures` subscriptions fail.
pub struct FailingFirst<S> {
    inner: S,
    remaining: AtomicUsize,
    reason: &'static str,
}

impl<S> FailingFirst<S> {
    pub fn new(inner: S, failures: usize, reason: &'static str) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(failures),
            reason,
        }
    }

    fn take_failure(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl<T, S> DataSource<T> for FailingFirst<S>
where
    T: Send + 'static,
    S: DataSource<T>,
{
    fn data(&self) -> DataStream<T> {
        if self.take_failure() {
            tracing::debug!(code = SOURCE_FAILURE_INJECTED, reason = self.reason, "failing subscription");
            return stream::iter([Err(SourceError::msg(self.reason))]).boxed();
        }
        self.inner.data()
    }
}

/// Writer that delivers values on a worker task.
pub struct ChannelWriter<T> {
    label: &'static str,
    sender: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> ChannelWriter<T> {
    /// Spawns the delivery worker on `handle`. The worker stops once the
    /// writer is dropped.
    pub fn spawn(
        handle: &Handle,
        label: &'static str,
        deliver: impl Fn(T) + Send + 'static,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        handle.spawn(async move {
            while let Some(value) = receiver.recv().await {
                deliver(value);
            }
            tracing::debug!(writer = label, "writer worker stopped");
        });

        Self { label, sender }
    }
}

impl<T: Send> DataWriter<T> for ChannelWriter<T> {
    fn write(&self, data: T) {
        if self.sender.send(data).is_err() {
            tracing::warn!(code = WRITER_CLOSED, writer = self.label, "dropping write: worker is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn feed(len: usize, page_size: usize) -> InMemoryFeed<usize> {
        InMemoryFeed::new((0..len).collect(), page_size, Duration::ZERO)
    }

    async fn collect<T>(stream: DataStream<T>) -> Vec<Result<T, SourceError>> {
        stream.collect().await
    }

    fn pages_of<T>(results: Vec<Result<T, SourceError>>) -> Vec<T> {
        results
            .into_iter()
            .map(|result| result.expect("source must not fail"))
            .collect()
    }

    #[tokio::test]
    async fn first_page_serves_newest_items() {
        let feed = feed(7, 3);

        let pages = pages_of(collect(feed.first_page().data()).await);

        assert_eq!(pages, vec![vec![0, 1, 2]]);
    }

    #[tokio::test]
    async fn pages_advance_cursor_until_history_is_exhausted() {
        let pages = feed(7, 3).pages();

        assert!(pages.has_next_page());
        assert_eq!(pages_of(collect(pages.data()).await), vec![vec![3, 4, 5]]);
        assert!(pages.has_next_page());
        assert_eq!(pages_of(collect(pages.data()).await), vec![vec![6]]);
        assert!(!pages.has_next_page());
        assert!(collect(pages.data()).await.is_empty());
    }

    #[tokio::test]
    async fn reset_rewinds_to_page_after_first() {
        let pages = feed(7, 3).pages();
        let _ = collect(pages.data()).await;
        let _ = collect(pages.data()).await;

        pages.reset_paging();

        assert!(pages.has_next_page());
        assert_eq!(pages_of(collect(pages.data()).await), vec![vec![3, 4, 5]]);
    }

    #[test]
    fn short_history_has_no_older_pages() {
        let pages = feed(2, 3).pages();

        assert!(!pages.has_next_page());
    }

    #[tokio::test]
    async fn ticker_emits_up_to_limit_then_completes() {
        let ticker = TickerSource::new(Duration::from_millis(1), 3, |tick| tick * 10);

        let items = pages_of(collect(ticker.data()).await);

        assert_eq!(items, vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn failing_first_fails_then_delegates() {
        let source = FailingFirst::new(feed(4, 2).first_page(), 1, "offline");

        let first = collect(source.data()).await;
        let second = pages_of(collect(source.data()).await);

        assert_eq!(first.len(), 1);
        assert_eq!(
            first[0].as_ref().map_err(ToString::to_string).err(),
            Some("offline".to_owned())
        );
        assert_eq!(second, vec![vec![0, 1]]);
    }

    #[tokio::test]
    async fn delayed_fetch_is_not_ready_immediately() {
        let feed = InMemoryFeed::new(vec![1], 1, Duration::from_millis(50));
        let mut stream = feed.first_page().data();

        assert!(stream.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn channel_writer_delivers_in_order() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        let writer = ChannelWriter::spawn(&Handle::current(), "test", move |value: u8| {
            sink.lock().expect("sink lock").push(value);
        });

        writer.write(1);
        writer.write(2);
        let seen = Arc::clone(&delivered);
        crate::test_support::wait_until(move || seen.lock().expect("sink lock").len() == 2).await;

        assert_eq!(*delivered.lock().expect("sink lock"), vec![1, 2]);
    }
}

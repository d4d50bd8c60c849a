//! Collaborator contracts consumed by the presenters.
//!
//! Data sources hand out lazy asynchronous sequences; failures travel through
//! the sequence as `Err` items, which end the subscription. Views expose
//! their input events as streams and receive effects through plain methods.

use std::{fmt, sync::Arc};

use futures::stream::BoxStream;

/// Stream of discrete view input events.
pub type EventStream<T> = BoxStream<'static, T>;

/// Stream of values produced by a data source. An `Err` item is terminal.
pub type DataStream<T> = BoxStream<'static, Result<T, SourceError>>;

/// Opaque upstream failure (network, storage).
///
/// Presenters never classify these; they route the very same value to the
/// view, which is why it is reference counted instead of re-created.
#[derive(Clone)]
pub struct SourceError(Arc<anyhow::Error>);

impl SourceError {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(error.into()))
    }

    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// Returns true when both handles point at the same failure value.
    pub fn same_as(&self, other: &SourceError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SourceError {}

pub trait DataSource<T>: Send + Sync {
    /// Starts a new subscription. One-shot sources fetch afresh on every
    /// call, live sources stay open for as long as the stream is polled.
    fn data(&self) -> DataStream<T>;
}

/// Data source carrying an external paging cursor.
pub trait PageDataSource<T>: DataSource<T> {
    fn has_next_page(&self) -> bool;

    /// Rewinds the cursor. Takes effect before the next `data()` call.
    fn reset_paging(&self);
}

/// Sink for outgoing values.
///
/// `write` hands the value off and returns without waiting for it to be
/// persisted or delivered. Failures are the writer's own concern.
pub trait DataWriter<T>: Send + Sync {
    fn write(&self, data: T);
}

/// Single-slot holder that replays its most recent value to new subscribers.
pub trait DataCache<T>: DataSource<T> + DataWriter<T> {
    /// The most recently written value, if any.
    fn current(&self) -> Option<T>;
}

impl<T, S> DataSource<T> for Arc<S>
where
    S: DataSource<T> + ?Sized,
{
    fn data(&self) -> DataStream<T> {
        (**self).data()
    }
}

impl<T, S> PageDataSource<T> for Arc<S>
where
    S: PageDataSource<T> + ?Sized,
{
    fn has_next_page(&self) -> bool {
        (**self).has_next_page()
    }

    fn reset_paging(&self) {
        (**self).reset_paging()
    }
}

impl<T, W> DataWriter<T> for Arc<W>
where
    W: DataWriter<T> + ?Sized,
{
    fn write(&self, data: T) {
        (**self).write(data)
    }
}

impl<T, C> DataCache<T> for Arc<C>
where
    C: DataCache<T> + ?Sized,
{
    fn current(&self) -> Option<T> {
        (**self).current()
    }
}

/// Effects shared by both feed views.
pub trait FeedEffects<T>: Send + Sync + 'static {
    fn show_items(&self, items: Vec<T>);
    fn add_new_item(&self, item: T);
    fn add_page(&self, page: Vec<T>);
    fn show_next_page_error(&self, error: SourceError);
    fn show_loading(&self);
    fn hide_loading(&self);
    fn show_loading_next_page(&self);
    fn hide_loading_next_page(&self);
}

/// View of a feed whose paging cursor is queried from the page source.
pub trait PagedFeedView<T>: FeedEffects<T> {
    fn refreshes(&self) -> EventStream<()>;
    fn next_page_requests(&self) -> EventStream<()>;
    fn show_error(&self, error: SourceError);
}

/// View of a feed whose end of pages is signalled by the page stream.
pub trait GatedFeedView<T>: FeedEffects<T> {
    fn next_page_requests(&self) -> EventStream<()>;

    /// Shows the failure and returns the stream of user retry signals.
    fn show_error_and_allow_to_retry(&self, error: SourceError) -> EventStream<()>;
}

/// View of a draft editor.
pub trait ComposeView<D>: Send + Sync + 'static {
    fn sends(&self) -> EventStream<()>;
    fn message_changes(&self) -> EventStream<String>;
    fn show_draft(&self, draft: &D);
    fn enable_send(&self);
    fn disable_send(&self);
}

//! Fakes shared by presenter tests.

use std::{
    collections::VecDeque,
    fmt,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
    time::Duration,
};

use futures::{stream, StreamExt};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::usecases::{
    contracts::{
        ComposeView, DataSource, DataStream, DataWriter, EventStream, FeedEffects,
        GatedFeedView, PageDataSource, PagedFeedView, SourceError,
    },
    streams::receiver_stream,
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(2);
const SETTLE_DELAY: Duration = Duration::from_millis(30);

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("test fake lock should not be poisoned")
}

/// Polls `condition` until it holds, panicking after a timeout.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(WAIT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;

    assert!(waited.is_ok(), "condition not reached within {WAIT_TIMEOUT:?}");
}

/// Gives spawned tasks time to process everything already queued.
pub async fn settle() {
    tokio::time::sleep(SETTLE_DELAY).await;
}

/// Data source whose subscriptions are answered from a queue of canned
/// results, or left open for the test to drive when the queue is empty.
pub struct ScriptedSource<T> {
    answers: Mutex<VecDeque<Vec<Result<T, SourceError>>>>,
    subscriptions: Mutex<Vec<UnboundedSender<Result<T, SourceError>>>>,
    calls: AtomicUsize,
}

impl<T: Send + 'static> ScriptedSource<T> {
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            subscriptions: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queues the full contents of the next subscription, which then completes.
    pub fn answer_with(&self, items: Vec<Result<T, SourceError>>) {
        locked(&self.answers).push_back(items);
    }

    pub fn clear_answers(&self) {
        locked(&self.answers).clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Emits on the most recent open subscription.
    pub fn emit(&self, value: T) {
        if let Some(sender) = locked(&self.subscriptions).last() {
            let _ = sender.send(Ok(value));
        }
    }

    /// Emits on the `index`-th open subscription, counted from the first.
    pub fn emit_to(&self, index: usize, value: T) {
        if let Some(sender) = locked(&self.subscriptions).get(index) {
            let _ = sender.send(Ok(value));
        }
    }

    /// Fails the most recent open subscription.
    pub fn fail(&self, error: SourceError) {
        if let Some(sender) = locked(&self.subscriptions).pop() {
            let _ = sender.send(Err(error));
        }
    }

    /// Completes the most recent open subscription.
    pub fn complete(&self) {
        locked(&self.subscriptions).pop();
    }
}

impl<T: Send + 'static> DataSource<T> for ScriptedSource<T> {
    fn data(&self) -> DataStream<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(items) = locked(&self.answers).pop_front() {
            return stream::iter(items).boxed();
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        locked(&self.subscriptions).push(sender);
        receiver_stream(receiver)
    }
}

/// Scripted page source with a controllable cursor.
pub struct ScriptedPageSource<T> {
    source: ScriptedSource<T>,
    has_next_page: AtomicBool,
    resets: AtomicUsize,
}

impl<T: Send + 'static> ScriptedPageSource<T> {
    pub fn new(has_next_page: bool) -> Self {
        Self {
            source: ScriptedSource::new(),
            has_next_page: AtomicBool::new(has_next_page),
            resets: AtomicUsize::new(0),
        }
    }

    pub fn set_has_next_page(&self, value: bool) {
        self.has_next_page.store(value, Ordering::SeqCst);
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl<T> Deref for ScriptedPageSource<T> {
    type Target = ScriptedSource<T>;

    fn deref(&self) -> &Self::Target {
        &self.source
    }
}

impl<T: Send + 'static> DataSource<T> for ScriptedPageSource<T> {
    fn data(&self) -> DataStream<T> {
        self.source.data()
    }
}

impl<T: Send + 'static> PageDataSource<T> for ScriptedPageSource<T> {
    fn has_next_page(&self) -> bool {
        self.has_next_page.load(Ordering::SeqCst)
    }

    /// Rewinds to the first page, which always has a successor.
    fn reset_paging(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.has_next_page.store(true, Ordering::SeqCst);
    }
}

/// Records every value handed to it.
pub struct RecordingWriter<T> {
    writes: Mutex<Vec<T>>,
}

impl<T: Clone> RecordingWriter<T> {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<T> {
        locked(&self.writes).clone()
    }
}

impl<T: Clone + Send> DataWriter<T> for RecordingWriter<T> {
    fn write(&self, data: T) {
        locked(&self.writes).push(data);
    }
}

/// A view effect of either feed presenter. Errors compare by identity.
#[derive(Clone)]
pub enum FeedEffect<T> {
    ShowItems(Vec<T>),
    AddNewItem(T),
    AddPage(Vec<T>),
    ShowError(SourceError),
    ShowErrorAndAllowToRetry(SourceError),
    ShowNextPageError(SourceError),
    ShowLoading,
    HideLoading,
    ShowLoadingNextPage,
    HideLoadingNextPage,
}

impl<T: PartialEq> PartialEq for FeedEffect<T> {
    fn eq(&self, other: &Self) -> bool {
        use FeedEffect::*;

        match (self, other) {
            (ShowItems(a), ShowItems(b)) | (AddPage(a), AddPage(b)) => a == b,
            (AddNewItem(a), AddNewItem(b)) => a == b,
            (ShowError(a), ShowError(b))
            | (ShowErrorAndAllowToRetry(a), ShowErrorAndAllowToRetry(b))
            | (ShowNextPageError(a), ShowNextPageError(b)) => a.same_as(b),
            (ShowLoading, ShowLoading)
            | (HideLoading, HideLoading)
            | (ShowLoadingNextPage, ShowLoadingNextPage)
            | (HideLoadingNextPage, HideLoadingNextPage) => true,
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FeedEffect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedEffect::ShowItems(items) => f.debug_tuple("ShowItems").field(items).finish(),
            FeedEffect::AddNewItem(item) => f.debug_tuple("AddNewItem").field(item).finish(),
            FeedEffect::AddPage(page) => f.debug_tuple("AddPage").field(page).finish(),
            FeedEffect::ShowError(error) => write!(f, "ShowError({error})"),
            FeedEffect::ShowErrorAndAllowToRetry(error) => {
                write!(f, "ShowErrorAndAllowToRetry({error})")
            }
            FeedEffect::ShowNextPageError(error) => write!(f, "ShowNextPageError({error})"),
            FeedEffect::ShowLoading => f.write_str("ShowLoading"),
            FeedEffect::HideLoading => f.write_str("HideLoading"),
            FeedEffect::ShowLoadingNextPage => f.write_str("ShowLoadingNextPage"),
            FeedEffect::HideLoadingNextPage => f.write_str("HideLoadingNextPage"),
        }
    }
}

/// Feed view that records effects and lets tests push input events.
pub struct RecordingFeedView<T> {
    effects: Mutex<Vec<FeedEffect<T>>>,
    refreshes: Mutex<Option<UnboundedSender<()>>>,
    next_page_requests: Mutex<Option<UnboundedSender<()>>>,
    retries: Mutex<Option<UnboundedSender<()>>>,
}

impl<T: Clone + PartialEq> RecordingFeedView<T> {
    pub fn new() -> Self {
        Self {
            effects: Mutex::new(Vec::new()),
            refreshes: Mutex::new(None),
            next_page_requests: Mutex::new(None),
            retries: Mutex::new(None),
        }
    }

    pub fn effects(&self) -> Vec<FeedEffect<T>> {
        locked(&self.effects).clone()
    }

    pub fn count(&self, effect: &FeedEffect<T>) -> usize {
        locked(&self.effects).iter().filter(|e| *e == effect).count()
    }

    pub fn refresh(&self) {
        fire(&self.refreshes);
    }

    pub fn request_next_page(&self) {
        fire(&self.next_page_requests);
    }

    pub fn retry(&self) {
        fire(&self.retries);
    }

    fn record(&self, effect: FeedEffect<T>) {
        locked(&self.effects).push(effect);
    }
}

fn fire(sender: &Mutex<Option<UnboundedSender<()>>>) {
    if let Some(sender) = locked(sender).as_ref() {
        let _ = sender.send(());
    }
}

fn open_events<E: Send + 'static>(slot: &Mutex<Option<UnboundedSender<E>>>) -> EventStream<E> {
    let (sender, receiver) = mpsc::unbounded_channel();
    *locked(slot) = Some(sender);
    receiver_stream(receiver)
}

impl<T> FeedEffects<T> for RecordingFeedView<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn show_items(&self, items: Vec<T>) {
        self.record(FeedEffect::ShowItems(items));
    }

    fn add_new_item(&self, item: T) {
        self.record(FeedEffect::AddNewItem(item));
    }

    fn add_page(&self, page: Vec<T>) {
        self.record(FeedEffect::AddPage(page));
    }

    fn show_next_page_error(&self, error: SourceError) {
        self.record(FeedEffect::ShowNextPageError(error));
    }

    fn show_loading(&self) {
        self.record(FeedEffect::ShowLoading);
    }

    fn hide_loading(&self) {
        self.record(FeedEffect::HideLoading);
    }

    fn show_loading_next_page(&self) {
        self.record(FeedEffect::ShowLoadingNextPage);
    }

    fn hide_loading_next_page(&self) {
        self.record(FeedEffect::HideLoadingNextPage);
    }
}

impl<T> PagedFeedView<T> for RecordingFeedView<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn refreshes(&self) -> EventStream<()> {
        open_events(&self.refreshes)
    }

    fn next_page_requests(&self) -> EventStream<()> {
        open_events(&self.next_page_requests)
    }

    fn show_error(&self, error: SourceError) {
        self.record(FeedEffect::ShowError(error));
    }
}

impl<T> GatedFeedView<T> for RecordingFeedView<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn next_page_requests(&self) -> EventStream<()> {
        open_events(&self.next_page_requests)
    }

    fn show_error_and_allow_to_retry(&self, error: SourceError) -> EventStream<()> {
        self.record(FeedEffect::ShowErrorAndAllowToRetry(error));
        open_events(&self.retries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeEffect<D> {
    ShowDraft(D),
    EnableSend,
    DisableSend,
}

/// Compose view that records effects and lets tests type and send.
pub struct RecordingComposeView<D> {
    effects: Mutex<Vec<ComposeEffect<D>>>,
    message_changes: Mutex<Option<UnboundedSender<String>>>,
    sends: Mutex<Option<UnboundedSender<()>>>,
}

impl<D: Clone + PartialEq> RecordingComposeView<D> {
    pub fn new() -> Self {
        Self {
            effects: Mutex::new(Vec::new()),
            message_changes: Mutex::new(None),
            sends: Mutex::new(None),
        }
    }

    pub fn effects(&self) -> Vec<ComposeEffect<D>> {
        locked(&self.effects).clone()
    }

    pub fn count(&self, effect: &ComposeEffect<D>) -> usize {
        locked(&self.effects).iter().filter(|e| *e == effect).count()
    }

    pub fn change_message(&self, text: &str) {
        if let Some(sender) = locked(&self.message_changes).as_ref() {
            let _ = sender.send(text.to_owned());
        }
    }

    pub fn send(&self) {
        fire(&self.sends);
    }
}

impl<D> ComposeView<D> for RecordingComposeView<D>
where
    D: Clone + PartialEq + Send + 'static,
{
    fn sends(&self) -> EventStream<()> {
        open_events(&self.sends)
    }

    fn message_changes(&self) -> EventStream<String> {
        open_events(&self.message_changes)
    }

    fn show_draft(&self, draft: &D) {
        locked(&self.effects).push(ComposeEffect::ShowDraft(draft.clone()));
    }

    fn enable_send(&self) {
        locked(&self.effects).push(ComposeEffect::EnableSend);
    }

    fn disable_send(&self) {
        locked(&self.effects).push(ComposeEffect::DisableSend);
    }
}

//! Feed presenter whose page source signals the end of pages by completing.
//!
//! Page availability is tracked by a [`PageGate`] owned by the presenter, so
//! "no more pages" survives detach and reattach. The initial load does not
//! recover by itself: a failure is shown with a retry affordance and the
//! load is resubscribed only when the user retries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedSender};

use super::{
    contracts::{DataSource, DataStream, EventStream, GatedFeedView},
    lifecycle::{AttachSlot, EffectGuard, FetchEvent, FetchSlot, Fetched},
    schedulers::Schedulers,
    streams::next_event,
};
use crate::domain::page_gate::PageGate;

const PRESENTER: &str = "gated_feed";
const PAGING_EXHAUSTED: &str = "FEED_PAGING_EXHAUSTED";
const LIVE_STREAM_FAILED: &str = "FEED_LIVE_STREAM_FAILED";

enum LoopEvent<T> {
    FirstPage(Fetched<Vec<T>>),
    NextPage(Fetched<Vec<T>>),
    Live(Fetched<T>),
}

pub struct GatedFeedPresenter<T, V> {
    first_page_source: Arc<dyn DataSource<Vec<T>>>,
    new_items_source: Arc<dyn DataSource<T>>,
    page_source: Arc<dyn DataSource<Vec<T>>>,
    schedulers: Schedulers,
    gate: Arc<Mutex<PageGate>>,
    attachment: AttachSlot<V>,
}

impl<T, V> GatedFeedPresenter<T, V>
where
    T: Send + 'static,
    V: GatedFeedView<T>,
{
    pub fn new(
        first_page_source: Arc<dyn DataSource<Vec<T>>>,
        new_items_source: Arc<dyn DataSource<T>>,
        page_source: Arc<dyn DataSource<Vec<T>>>,
        schedulers: Schedulers,
    ) -> Self {
        Self {
            first_page_source,
            new_items_source,
            page_source,
            schedulers,
            gate: Arc::new(Mutex::new(PageGate::default())),
            attachment: AttachSlot::new(PRESENTER),
        }
    }

    pub fn gate(&self) -> PageGate {
        *lock_gate(&self.gate)
    }

    pub fn attach(&self, view: Arc<V>) {
        self.attachment.attach(view, |view, guard| {
            // Once exhausted, page requests are never listened to again.
            let next_page_requests =
                (!self.gate().is_exhausted()).then(|| view.next_page_requests());
            let run = GatedFeedRun {
                first_page_source: Arc::clone(&self.first_page_source),
                page_source: Arc::clone(&self.page_source),
                schedulers: self.schedulers.clone(),
                gate: Arc::clone(&self.gate),
                view: guard,
                next_page_requests,
                retries: None,
                first_page: FetchSlot::new("first_page"),
                next_page: FetchSlot::new("next_page"),
                live: FetchSlot::new("live"),
            };
            let live_items = self.new_items_source.data();
            self.schedulers.spawn_main(run.run(live_items))
        });
    }

    pub fn detach(&self, view: &Arc<V>) {
        self.attachment.detach(view);
    }
}

fn lock_gate(gate: &Mutex<PageGate>) -> MutexGuard<'_, PageGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

struct GatedFeedRun<T, V> {
    first_page_source: Arc<dyn DataSource<Vec<T>>>,
    page_source: Arc<dyn DataSource<Vec<T>>>,
    schedulers: Schedulers,
    gate: Arc<Mutex<PageGate>>,
    view: EffectGuard<V>,
    next_page_requests: Option<EventStream<()>>,
    retries: Option<EventStream<()>>,
    first_page: FetchSlot,
    next_page: FetchSlot,
    live: FetchSlot,
}

impl<T, V> GatedFeedRun<T, V>
where
    T: Send + 'static,
    V: GatedFeedView<T>,
{
    async fn run(mut self, live_items: DataStream<T>) {
        let (results_tx, mut results) = mpsc::unbounded_channel();

        self.live
            .start(&self.schedulers, live_items, results_tx.clone(), LoopEvent::Live);
        self.load_first_page(&results_tx);

        loop {
            tokio::select! {
                retry = next_event(&mut self.retries), if self.retries.is_some() => {
                    // Only the first signal of each retry affordance counts.
                    self.retries = None;
                    if retry.is_some() {
                        self.load_first_page(&results_tx);
                    }
                }
                request = next_event(&mut self.next_page_requests), if self.next_page_requests.is_some() => {
                    match request {
                        Some(()) => self.request_next_page(&results_tx),
                        None => self.next_page_requests = None,
                    }
                }
                Some(event) = results.recv() => self.on_result(event),
                else => break,
            }
        }
    }

    fn load_first_page(&mut self, results: &UnboundedSender<LoopEvent<T>>) {
        self.view.with(|view| view.show_loading());
        self.first_page.start(
            &self.schedulers,
            self.first_page_source.data(),
            results.clone(),
            LoopEvent::FirstPage,
        );
    }

    fn request_next_page(&mut self, results: &UnboundedSender<LoopEvent<T>>) {
        if !lock_gate(&self.gate).try_close() {
            tracing::debug!("next page request rejected: gate closed");
            return;
        }

        self.view.with(|view| view.show_loading_next_page());
        self.next_page.start(
            &self.schedulers,
            self.page_source.data(),
            results.clone(),
            LoopEvent::NextPage,
        );
    }

    fn on_result(&mut self, event: LoopEvent<T>) {
        match event {
            LoopEvent::FirstPage(fetched) => {
                if !self.first_page.is_current(fetched.generation) {
                    return;
                }
                self.view.with(|view| view.hide_loading());
                match fetched.event {
                    FetchEvent::Item(items) => {
                        self.view.with(|view| view.show_items(items));
                        lock_gate(&self.gate).open();
                    }
                    FetchEvent::Failed(error) => {
                        tracing::debug!(error = %error, "first page load failed; waiting for retry");
                        self.retries = self
                            .view
                            .with(|view| view.show_error_and_allow_to_retry(error));
                    }
                    FetchEvent::Empty => {}
                }
            }
            LoopEvent::NextPage(fetched) => {
                if !self.next_page.is_current(fetched.generation) {
                    return;
                }
                // One page per fetch; the rest of the subscription is dropped.
                self.next_page.settle();
                self.view.with(|view| view.hide_loading_next_page());
                match fetched.event {
                    FetchEvent::Item(page) => {
                        self.view.with(|view| view.add_page(page));
                        lock_gate(&self.gate).open();
                    }
                    FetchEvent::Failed(error) => {
                        lock_gate(&self.gate).open();
                        tracing::debug!(error = %error, "next page load failed");
                        self.view.with(|view| view.show_next_page_error(error));
                    }
                    FetchEvent::Empty => {
                        lock_gate(&self.gate).exhaust();
                        self.next_page_requests = None;
                        tracing::info!(code = PAGING_EXHAUSTED, "page source completed; paging stopped");
                    }
                }
            }
            LoopEvent::Live(fetched) => match fetched.event {
                FetchEvent::Item(item) => {
                    self.view.with(|view| view.add_new_item(item));
                }
                FetchEvent::Failed(error) => {
                    tracing::error!(
                        code = LIVE_STREAM_FAILED,
                        error = %error,
                        "live item source failed; new items are no longer appended"
                    );
                }
                FetchEvent::Empty => {
                    tracing::debug!("live item source completed");
                }
            },
        }
    }
}

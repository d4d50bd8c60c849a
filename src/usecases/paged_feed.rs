//! Feed presenter driven by a page source that exposes its own cursor.
//!
//! Three independent streams live for the duration of an attachment:
//! refreshes (plus an implicit one at attach) load the first page, the live
//! source appends new items, and next-page requests load further pages while
//! the paging flags and the page cursor allow it.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};

use super::{
    contracts::{DataSource, DataStream, EventStream, PageDataSource, PagedFeedView},
    lifecycle::{AttachSlot, EffectGuard, FetchEvent, FetchSlot, Fetched},
    schedulers::Schedulers,
    streams::next_event,
};

const PRESENTER: &str = "paged_feed";
const LIVE_STREAM_FAILED: &str = "FEED_LIVE_STREAM_FAILED";
const STALE_RESULT_DISCARDED: &str = "FEED_STALE_RESULT_DISCARDED";

/// Attach-scoped flags gating next-page requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PagingFlags {
    initial_data_loaded: bool,
    page_loading: bool,
}

impl PagingFlags {
    fn accepts_next_page(&self, has_next_page: impl FnOnce() -> bool) -> bool {
        !self.page_loading && self.initial_data_loaded && has_next_page()
    }
}

enum LoopEvent<T> {
    FirstPage(Fetched<Vec<T>>),
    NextPage(Fetched<Vec<T>>),
    Live(Fetched<T>),
}

pub struct PagedFeedPresenter<T, V> {
    first_page_source: Arc<dyn DataSource<Vec<T>>>,
    new_items_source: Arc<dyn DataSource<T>>,
    page_source: Arc<dyn PageDataSource<Vec<T>>>,
    schedulers: Schedulers,
    attachment: AttachSlot<V>,
}

impl<T, V> PagedFeedPresenter<T, V>
where
    T: Send + 'static,
    V: PagedFeedView<T>,
{
    pub fn new(
        first_page_source: Arc<dyn DataSource<Vec<T>>>,
        new_items_source: Arc<dyn DataSource<T>>,
        page_source: Arc<dyn PageDataSource<Vec<T>>>,
        schedulers: Schedulers,
    ) -> Self {
        Self {
            first_page_source,
            new_items_source,
            page_source,
            schedulers,
            attachment: AttachSlot::new(PRESENTER),
        }
    }

    pub fn attach(&self, view: Arc<V>) {
        self.attachment.attach(view, |view, guard| {
            let run = PagedFeedRun {
                first_page_source: Arc::clone(&self.first_page_source),
                page_source: Arc::clone(&self.page_source),
                schedulers: self.schedulers.clone(),
                view: guard,
                refreshes: Some(view.refreshes()),
                next_page_requests: Some(view.next_page_requests()),
                flags: PagingFlags::default(),
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

struct PagedFeedRun<T, V> {
    first_page_source: Arc<dyn DataSource<Vec<T>>>,
    page_source: Arc<dyn PageDataSource<Vec<T>>>,
    schedulers: Schedulers,
    view: EffectGuard<V>,
    refreshes: Option<EventStream<()>>,
    next_page_requests: Option<EventStream<()>>,
    flags: PagingFlags,
    first_page: FetchSlot,
    next_page: FetchSlot,
    live: FetchSlot,
}

impl<T, V> PagedFeedRun<T, V>
where
    T: Send + 'static,
    V: PagedFeedView<T>,
{
    async fn run(mut self, live_items: DataStream<T>) {
        let (results_tx, mut results) = mpsc::unbounded_channel();

        self.live
            .start(&self.schedulers, live_items, results_tx.clone(), LoopEvent::Live);
        self.refresh(&results_tx);

        loop {
            tokio::select! {
                refresh = next_event(&mut self.refreshes), if self.refreshes.is_some() => {
                    match refresh {
                        Some(()) => self.refresh(&results_tx),
                        None => self.refreshes = None,
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

    fn refresh(&mut self, results: &UnboundedSender<LoopEvent<T>>) {
        self.page_source.reset_paging();
        self.view.with(|view| view.show_loading());
        self.first_page.start(
            &self.schedulers,
            self.first_page_source.data(),
            results.clone(),
            LoopEvent::FirstPage,
        );
    }

    fn request_next_page(&mut self, results: &UnboundedSender<LoopEvent<T>>) {
        let page_source = &self.page_source;
        if !self.flags.accepts_next_page(|| page_source.has_next_page()) {
            tracing::debug!(
                initial_data_loaded = self.flags.initial_data_loaded,
                page_loading = self.flags.page_loading,
                "next page request rejected"
            );
            return;
        }

        self.flags.page_loading = true;
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
                    tracing::debug!(
                        code = STALE_RESULT_DISCARDED,
                        fetch = "first_page",
                        "stale fetch result discarded"
                    );
                    return;
                }
                self.view.with(|view| view.hide_loading());
                match fetched.event {
                    FetchEvent::Item(items) => {
                        self.view.with(|view| view.show_items(items));
                        self.flags.initial_data_loaded = true;
                    }
                    FetchEvent::Failed(error) => {
                        tracing::debug!(error = %error, "first page load failed");
                        self.view.with(|view| view.show_error(error));
                    }
                    FetchEvent::Empty => {}
                }
            }
            LoopEvent::NextPage(fetched) => {
                if !self.next_page.is_current(fetched.generation) {
                    tracing::debug!(
                        code = STALE_RESULT_DISCARDED,
                        fetch = "next_page",
                        "stale fetch result discarded"
                    );
                    return;
                }
                self.view.with(|view| view.hide_loading_next_page());
                self.flags.page_loading = false;
                match fetched.event {
                    FetchEvent::Item(page) => {
                        self.view.with(|view| view.add_page(page));
                    }
                    FetchEvent::Failed(error) => {
                        tracing::debug!(error = %error, "next page load failed");
                        self.view.with(|view| view.show_next_page_error(error));
                    }
                    FetchEvent::Empty => {}
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

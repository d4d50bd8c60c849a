//! Draft editor backed by a cache shared between attach points.

use std::sync::Arc;

use futures::StreamExt;

use super::{
    contracts::{ComposeView, DataCache, DataStream, DataWriter, EventStream, SourceError},
    lifecycle::{AttachSlot, EffectGuard},
    schedulers::Schedulers,
    streams::{next_event, ready_events},
};
use crate::domain::draft::Draft;

const PRESENTER: &str = "cached_compose";
const DRAFT_SENT: &str = "COMPOSE_DRAFT_SENT";

pub struct CachedComposePresenter<D, V> {
    cache: Arc<dyn DataCache<D>>,
    writer: Arc<dyn DataWriter<D>>,
    schedulers: Schedulers,
    attachment: AttachSlot<V>,
}

impl<D, V> CachedComposePresenter<D, V>
where
    D: Draft,
    V: ComposeView<D>,
{
    pub fn new(
        cache: Arc<dyn DataCache<D>>,
        writer: Arc<dyn DataWriter<D>>,
        schedulers: Schedulers,
    ) -> Self {
        Self {
            cache,
            writer,
            schedulers,
            attachment: AttachSlot::new(PRESENTER),
        }
    }

    pub fn attach(&self, view: Arc<V>) {
        self.attachment.attach(view, |view, guard| {
            let run = CachedComposeRun {
                cache: Arc::clone(&self.cache),
                writer: Arc::clone(&self.writer),
                view: guard,
                message_changes: Some(view.message_changes()),
                sends: Some(view.sends()),
                drafts: Some(self.cache.data()),
            };
            self.schedulers.spawn_main(run.run())
        });
    }

    pub fn detach(&self, view: &Arc<V>) {
        self.attachment.detach(view);
    }
}

struct CachedComposeRun<D, V> {
    cache: Arc<dyn DataCache<D>>,
    writer: Arc<dyn DataWriter<D>>,
    view: EffectGuard<V>,
    message_changes: Option<EventStream<String>>,
    sends: Option<EventStream<()>>,
    drafts: Option<DataStream<D>>,
}

impl<D, V> CachedComposeRun<D, V>
where
    D: Draft,
    V: ComposeView<D>,
{
    async fn run(mut self) {
        loop {
            // Changes are polled before sends, and a send first applies every
            // change already queued, so it never misses the edit before it.
            tokio::select! {
                biased;

                change = next_event(&mut self.message_changes), if self.message_changes.is_some() => {
                    match change {
                        Some(text) => self.cache.write(D::from_text(text)),
                        None => self.message_changes = None,
                    }
                }
                draft = next_draft(&mut self.drafts), if self.drafts.is_some() => {
                    match draft {
                        Some(Ok(draft)) => self.show(&draft),
                        Some(Err(error)) => {
                            tracing::warn!(error = %error, "draft cache failed; stopped mirroring drafts");
                            self.drafts = None;
                        }
                        None => self.drafts = None,
                    }
                }
                send = next_event(&mut self.sends), if self.sends.is_some() => {
                    match send {
                        Some(()) => {
                            self.apply_queued_changes();
                            self.send();
                        }
                        None => self.sends = None,
                    }
                }
                else => break,
            }
        }
    }

    fn apply_queued_changes(&mut self) {
        for text in ready_events(&mut self.message_changes) {
            self.cache.write(D::from_text(text));
        }
    }

    fn show(&self, draft: &D) {
        self.view.with(|view| {
            view.show_draft(draft);
            if draft.is_empty() {
                view.disable_send();
            } else {
                view.enable_send();
            }
        });
    }

    fn send(&self) {
        // Read the slot itself so a change written just before the send is
        // never missed, even if its notification is still queued.
        match self.cache.current() {
            Some(draft) if !draft.is_empty() => {
                tracing::debug!(
                    code = DRAFT_SENT,
                    chars = draft.text().chars().count(),
                    "sending draft"
                );
                self.writer.write(draft);
                self.cache.write(D::empty());
            }
            _ => tracing::debug!("send ignored: draft is empty"),
        }
    }
}

async fn next_draft<D>(drafts: &mut Option<DataStream<D>>) -> Option<Result<D, SourceError>> {
    match drafts {
        Some(drafts) => drafts.next().await,
        None => futures::future::pending().await,
    }
}

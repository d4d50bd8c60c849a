//! Draft editor whose draft belongs to the presenter alone.
//!
//! The draft outlives attachments: a reattached view is shown whatever was
//! typed before it detached. Sending clears the draft optimistically and
//! hands the captured value to the writer on the work context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    contracts::{ComposeView, DataWriter, EventStream},
    lifecycle::{AttachSlot, EffectGuard},
    schedulers::Schedulers,
    streams::{next_event, ready_events},
};
use crate::domain::draft::Draft;

const PRESENTER: &str = "local_compose";
const DRAFT_SENT: &str = "COMPOSE_DRAFT_SENT";

pub struct LocalComposePresenter<D, V> {
    draft: Arc<Mutex<D>>,
    writer: Arc<dyn DataWriter<D>>,
    schedulers: Schedulers,
    attachment: AttachSlot<V>,
}

impl<D, V> LocalComposePresenter<D, V>
where
    D: Draft,
    V: ComposeView<D>,
{
    pub fn new(writer: Arc<dyn DataWriter<D>>, schedulers: Schedulers) -> Self {
        Self {
            draft: Arc::new(Mutex::new(D::empty())),
            writer,
            schedulers,
            attachment: AttachSlot::new(PRESENTER),
        }
    }

    pub fn draft(&self) -> D {
        lock_draft(&self.draft).clone()
    }

    pub fn attach(&self, view: Arc<V>) {
        self.attachment.attach(view, |view, guard| {
            let run = LocalComposeRun {
                draft: Arc::clone(&self.draft),
                writer: Arc::clone(&self.writer),
                schedulers: self.schedulers.clone(),
                view: guard,
                message_changes: Some(view.message_changes()),
                sends: Some(view.sends()),
            };
            self.schedulers.spawn_main(run.run())
        });
    }

    pub fn detach(&self, view: &Arc<V>) {
        self.attachment.detach(view);
    }
}

fn lock_draft<D>(draft: &Mutex<D>) -> MutexGuard<'_, D> {
    draft.lock().unwrap_or_else(PoisonError::into_inner)
}

struct LocalComposeRun<D, V> {
    draft: Arc<Mutex<D>>,
    writer: Arc<dyn DataWriter<D>>,
    schedulers: Schedulers,
    view: EffectGuard<V>,
    message_changes: Option<EventStream<String>>,
    sends: Option<EventStream<()>>,
}

impl<D, V> LocalComposeRun<D, V>
where
    D: Draft,
    V: ComposeView<D>,
{
    async fn run(mut self) {
        let current = lock_draft(&self.draft).clone();
        self.show(&current);

        loop {
            // Changes are polled before sends, and a send first applies every
            // change already queued, so it never misses the edit before it.
            tokio::select! {
                biased;

                change = next_event(&mut self.message_changes), if self.message_changes.is_some() => {
                    match change {
                        Some(text) => self.change(D::from_text(text)),
                        None => self.message_changes = None,
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
            self.change(D::from_text(text));
        }
    }

    fn change(&self, next: D) {
        {
            let mut draft = lock_draft(&self.draft);
            if *draft == next {
                return;
            }
            *draft = next.clone();
        }
        self.show(&next);
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
        let captured = std::mem::replace(&mut *lock_draft(&self.draft), D::empty());
        if captured.is_empty() {
            tracing::debug!("send ignored: draft is empty");
            return;
        }

        self.show(&D::empty());

        tracing::debug!(
            code = DRAFT_SENT,
            chars = captured.text().chars().count(),
            "sending draft"
        );
        let writer = Arc::clone(&self.writer);
        // Not tied to the attachment: a detach right after send still delivers.
        self.schedulers.spawn_work(async move { writer.write(captured) });
    }
}

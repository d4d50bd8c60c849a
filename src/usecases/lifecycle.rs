//! Attach/detach bookkeeping shared by all presenters.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use super::{
    contracts::{DataStream, SourceError},
    schedulers::Schedulers,
};

const VIEW_ATTACHED: &str = "PRESENTER_VIEW_ATTACHED";
const VIEW_DETACHED: &str = "PRESENTER_VIEW_DETACHED";
const VIEW_REPLACED: &str = "PRESENTER_VIEW_REPLACED";
const FETCH_SUPERSEDED: &str = "PRESENTER_FETCH_SUPERSEDED";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Gatekeeper for every view call made by a presenter.
///
/// Closing the guard waits for a call in progress and turns every later call
/// into a no-op. View callbacks must not detach their presenter synchronously.
pub struct EffectGuard<V> {
    view: Arc<Mutex<Option<Arc<V>>>>,
}

impl<V> Clone for EffectGuard<V> {
    fn clone(&self) -> Self {
        Self {
            view: Arc::clone(&self.view),
        }
    }
}

impl<V> EffectGuard<V> {
    fn new(view: Arc<V>) -> Self {
        Self {
            view: Arc::new(Mutex::new(Some(view))),
        }
    }

    /// Runs `effect` against the view unless it has been detached.
    pub fn with<R>(&self, effect: impl FnOnce(&V) -> R) -> Option<R> {
        let slot = lock(&self.view);
        slot.as_deref().map(effect)
    }

    pub fn is_open(&self) -> bool {
        lock(&self.view).is_some()
    }

    fn close(&self) {
        lock(&self.view).take();
    }
}

struct Attachment<V> {
    view: Arc<V>,
    guard: EffectGuard<V>,
    task: JoinHandle<()>,
}

impl<V> Attachment<V> {
    fn close(self) {
        self.guard.close();
        self.task.abort();
    }
}

/// Holds the attachment of a presenter to at most one view.
pub struct AttachSlot<V> {
    presenter: &'static str,
    current: Mutex<Option<Attachment<V>>>,
}

impl<V> AttachSlot<V> {
    pub fn new(presenter: &'static str) -> Self {
        Self {
            presenter,
            current: Mutex::new(None),
        }
    }

    /// Attaches `view`, starting its event loop through `start`.
    ///
    /// A view that is still attached is detached first.
    pub fn attach<F>(&self, view: Arc<V>, start: F)
    where
        F: FnOnce(&V, EffectGuard<V>) -> JoinHandle<()>,
    {
        let mut current = lock(&self.current);
        if let Some(previous) = current.take() {
            tracing::warn!(
                code = VIEW_REPLACED,
                presenter = self.presenter,
                "attach called while another view is attached; detaching it"
            );
            previous.close();
        }

        let guard = EffectGuard::new(Arc::clone(&view));
        let task = start(&view, guard.clone());
        *current = Some(Attachment { view, guard, task });

        tracing::debug!(code = VIEW_ATTACHED, presenter = self.presenter, "view attached");
    }

    /// Detaches `view`. Does nothing if `view` is not the attached view.
    pub fn detach(&self, view: &Arc<V>) {
        let mut current = lock(&self.current);
        let is_attached = current
            .as_ref()
            .is_some_and(|attachment| Arc::ptr_eq(&attachment.view, view));

        if !is_attached {
            tracing::debug!(
                presenter = self.presenter,
                "detach ignored: view is not attached"
            );
            return;
        }

        if let Some(attachment) = current.take() {
            attachment.close();
            tracing::debug!(code = VIEW_DETACHED, presenter = self.presenter, "view detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.current).is_some()
    }
}

impl<V> Drop for AttachSlot<V> {
    fn drop(&mut self) {
        if let Some(attachment) = lock(&self.current).take() {
            attachment.close();
        }
    }
}

/// Outcome of one subscription to a data source, as seen by the event loop.
#[derive(Debug)]
pub enum FetchEvent<T> {
    Item(T),
    Failed(SourceError),
    /// The stream completed without producing any value.
    Empty,
}

/// A fetch event tagged with the generation of the fetch that produced it.
#[derive(Debug)]
pub struct Fetched<T> {
    pub generation: u64,
    pub event: FetchEvent<T>,
}

/// Latest-wins bookkeeping for one logical fetch stream.
///
/// Each `start` supersedes the fetch before it; events carrying an older
/// generation must be dropped by the caller via `is_current`.
pub struct FetchSlot {
    name: &'static str,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl FetchSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: 0,
            in_flight: None,
        }
    }

    /// Drives `stream` on the work context, sending each event to `results`
    /// wrapped by `tag`.
    pub fn start<T, M, F>(
        &mut self,
        schedulers: &Schedulers,
        mut stream: DataStream<T>,
        results: UnboundedSender<M>,
        tag: F,
    ) -> u64
    where
        T: Send + 'static,
        M: Send + 'static,
        F: Fn(Fetched<T>) -> M + Send + 'static,
    {
        if self.abort_in_flight() {
            tracing::debug!(code = FETCH_SUPERSEDED, fetch = self.name, "in-flight fetch superseded");
        }
        self.generation += 1;
        let generation = self.generation;

        let task = schedulers.spawn_work(async move {
            let mut emitted = false;
            while let Some(next) = stream.next().await {
                let (event, terminal) = match next {
                    Ok(value) => (FetchEvent::Item(value), false),
                    Err(error) => (FetchEvent::Failed(error), true),
                };
                emitted = true;

                if results.send(tag(Fetched { generation, event })).is_err() || terminal {
                    return;
                }
            }

            if !emitted {
                let _ = results.send(tag(Fetched {
                    generation,
                    event: FetchEvent::Empty,
                }));
            }
        });

        self.in_flight = Some(task);
        generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Stops the current fetch and invalidates its pending events.
    pub fn settle(&mut self) {
        self.abort_in_flight();
        self.generation += 1;
    }

    fn abort_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for FetchSlot {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

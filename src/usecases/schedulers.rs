use std::future::Future;

use tokio::{runtime::Handle, task::JoinHandle};

/// Execution contexts used by presenters.
///
/// View effects and presenter state live on `main`; data-source fetches are
/// driven on `work` and their results are sent back to `main`.
#[derive(Debug, Clone)]
pub struct Schedulers {
    main: Handle,
    work: Handle,
}

impl Schedulers {
    pub fn new(main: Handle, work: Handle) -> Self {
        Self { main, work }
    }

    /// Uses the ambient runtime for both contexts.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        let handle = Handle::current();
        Self::new(handle.clone(), handle)
    }

    pub(crate) fn spawn_main<F>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.main.spawn(future)
    }

    pub(crate) fn spawn_work<F>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.work.spawn(future)
    }
}

//! At-most-once initialization of the external map library
//!
//! Every map view calls [`ScriptLoader::ensure_ready`] before touching the
//! map backend. The first call starts the load on the runtime; callers that
//! arrive while it is in flight wait on a oneshot channel and are all
//! resolved with the same outcome. A failed load discards whatever the
//! library left behind and returns the loader to its initial state so the
//! next call retries.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Failure to bring the map library up
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Map library failed to load: {0}")]
    Failed(String),

    #[error("Map library load was abandoned before completing")]
    Abandoned,
}

/// The thing being loaded
///
/// `load` is invoked at most once per successful initialization. `discard`
/// runs after a failed load and must remove any partial artifact so that a
/// subsequent `load` starts from scratch.
pub trait MapLibrary: Send + Sync + 'static {
    fn load(&self) -> impl Future<Output = Result<(), LoadError>> + Send;

    fn discard(&self);
}

/// Observable loader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Uninitialized,
    Loading,
    Ready,
}

type Waiter = oneshot::Sender<Result<(), LoadError>>;

enum Phase {
    Uninitialized,
    Loading(Vec<Waiter>),
    Ready,
}

struct Inner<L> {
    library: L,
    phase: Mutex<Phase>,
    loads_started: AtomicUsize,
}

impl<L: MapLibrary> Inner<L> {
    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, result: Result<(), LoadError>) {
        match &result {
            Ok(()) => tracing::info!("Map library ready"),
            Err(err) => {
                tracing::error!("{err}");
                // Before the reset, so a retry cannot race the cleanup
                self.library.discard();
            }
        }

        let next = if result.is_ok() {
            Phase::Ready
        } else {
            Phase::Uninitialized
        };
        let waiters = match std::mem::replace(&mut *self.phase(), next) {
            Phase::Loading(waiters) => waiters,
            _ => Vec::new(),
        };

        tracing::debug!("Resolving {} map library waiters", waiters.len());
        for waiter in waiters {
            // A caller that went away no longer needs the answer
            let _ = waiter.send(result.clone());
        }
    }
}

/// Shared handle to the loader; clones observe the same state
pub struct ScriptLoader<L> {
    inner: Arc<Inner<L>>,
}

impl<L> Clone for ScriptLoader<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: MapLibrary> ScriptLoader<L> {
    pub fn new(library: L) -> Self {
        Self {
            inner: Arc::new(Inner {
                library,
                phase: Mutex::new(Phase::Uninitialized),
                loads_started: AtomicUsize::new(0),
            }),
        }
    }

    /// Resolve once the library is usable
    ///
    /// Must be called from within a tokio runtime: the load itself runs on a
    /// spawned task so it completes even if the caller is dropped.
    pub async fn ensure_ready(&self) -> Result<(), LoadError> {
        let receiver = {
            let mut phase = self.inner.phase();
            match &mut *phase {
                Phase::Ready => return Ok(()),
                Phase::Loading(waiters) => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    receiver
                }
                Phase::Uninitialized => {
                    let (sender, receiver) = oneshot::channel();
                    *phase = Phase::Loading(vec![sender]);
                    self.start_load();
                    receiver
                }
            }
        };

        receiver.await.unwrap_or(Err(LoadError::Abandoned))
    }

    fn start_load(&self) {
        let count = self.inner.loads_started.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Starting map library load (attempt {count})");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.library.load().await;
            inner.finish(result);
        });
    }

    pub fn state(&self) -> LoaderState {
        match &*self.inner.phase() {
            Phase::Uninitialized => LoaderState::Uninitialized,
            Phase::Loading(_) => LoaderState::Loading,
            Phase::Ready => LoaderState::Ready,
        }
    }

    /// How many loads have been started over the loader's lifetime
    pub fn loads_started(&self) -> usize {
        self.inner.loads_started.load(Ordering::SeqCst)
    }

    pub fn library(&self) -> &L {
        &self.inner.library
    }
}

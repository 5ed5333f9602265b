//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods     |
// |-------------------------|---------------------------------------------------|-----------------|
// | CompletionBarrier       | Per-dispatch join point over N handler tasks      | completion, wait|
// | Completion              | One handler's at-most-once completion signal      | done            |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

/// Join point for a single dispatch.
///
/// Every issued [`Completion`] holds a sender clone of an mpsc channel nobody
/// ever sends on. Once the barrier drops its own sender, `recv` yields `None`
/// exactly when the last outstanding completion is signalled or dropped.
pub(crate) struct CompletionBarrier {
    pending: Arc<AtomicUsize>,
    sender: mpsc::Sender<()>,
    receiver: mpsc::Receiver<()>,
}

impl CompletionBarrier {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            pending: Arc::new(AtomicUsize::new(0)),
            sender,
            receiver,
        }
    }

    /// Issues a new completion signal, raising the pending count by one.
    pub(crate) fn completion(&self) -> Completion {
        self.pending.fetch_add(1, Ordering::SeqCst);
        Completion {
            token: Some(self.sender.clone()),
            pending: Arc::clone(&self.pending),
        }
    }

    /// Number of completions issued but not yet signalled.
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Waits until every issued completion has been signalled.
    pub(crate) async fn wait(self) {
        let Self {
            sender,
            mut receiver,
            ..
        } = self;
        drop(sender);
        while receiver.recv().await.is_some() {}
    }
}

/// Completion signal handed to a handler for one dispatch.
///
/// Calling [`Completion::done`] consumes the signal, so it can be given at
/// most once. A completion dropped without `done()` (early return, error,
/// panic) signals on drop and logs a warning, which keeps the dispatch
/// barrier from waiting on a handler that has already finished.
#[must_use = "dispatch waits until this completion is signalled"]
pub struct Completion {
    token: Option<mpsc::Sender<()>>,
    pending: Arc<AtomicUsize>,
}

impl Completion {
    /// Signals that the handler has finished reacting to the event.
    pub fn done(mut self) {
        self.signal();
    }

    fn signal(&mut self) -> bool {
        match self.token.take() {
            Some(token) => {
                // Decrement before releasing the token so a woken waiter sees zero.
                self.pending.fetch_sub(1, Ordering::SeqCst);
                drop(token);
                true
            }
            None => false,
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.signal() {
            warn!("Completion dropped without done(); signalled implicitly");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("signalled", &self.token.is_none())
            .finish()
    }
}

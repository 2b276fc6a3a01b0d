//! Caller-side deadlines and cancellation.
//!
//! A [`Cancellation`] bounds how long a call will wait for its result: an
//! optional deadline, an optional [`CancelToken`], or neither. Cancellation
//! is cooperative — it releases the waiting caller, it does not interrupt
//! interpreter code already running on the owner thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{at, bounded, never, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// A cloneable handle that lets one thread cancel calls issued with it.
///
/// Firing is one-way and permanent: once [`cancel`](CancelToken::cancel) is
/// called, every call carrying this token (current or future) fails with
/// [`Error::Cancelled`].
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    cancelled: AtomicBool,
    /// Dropping this sender disconnects `receiver`, waking all selects.
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl CancelToken {
    /// Create a new, unfired token.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                sender: Mutex::new(Some(sender)),
                receiver,
            }),
        }
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        // Disconnect the channel so blocked waiters wake immediately
        self.inner.sender.lock().take();
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    fn receiver(&self) -> Receiver<()> {
        self.inner.receiver.clone()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Caller-supplied bound on how long a call may wait for its result.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    token: Option<CancelToken>,
}

impl Cancellation {
    /// No deadline and no token: the call waits as long as it takes.
    pub fn none() -> Self {
        Self::default()
    }

    /// Expire after the given duration from now.
    pub fn timeout(duration: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(duration),
            token: None,
        }
    }

    /// Expire at the given instant.
    pub fn deadline(at: Instant) -> Self {
        Self {
            deadline: Some(at),
            token: None,
        }
    }

    /// Expire when the given token fires.
    pub fn token(token: &CancelToken) -> Self {
        Self {
            deadline: None,
            token: Some(token.clone()),
        }
    }

    /// Add a deadline `duration` from now to this cancellation.
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.deadline = Instant::now().checked_add(duration);
        self
    }

    /// Add the given token to this cancellation.
    pub fn with_token(mut self, token: &CancelToken) -> Self {
        self.token = Some(token.clone());
        self
    }

    /// Whether the deadline has passed or the token has fired. Used as the
    /// owner-side pre-check so expired operations never touch the
    /// interpreter.
    pub(crate) fn is_expired(&self) -> bool {
        if let Some(token) = &self.token {
            if token.is_cancelled() {
                return true;
            }
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// The error matching the expiry cause. Token fire wins over a passed
    /// deadline when both hold.
    pub(crate) fn expiry_error(&self) -> Error {
        match &self.token {
            Some(token) if token.is_cancelled() => Error::Cancelled,
            _ => Error::Timeout,
        }
    }

    /// Block until the result arrives, the deadline passes, or the token
    /// fires — whichever happens first. A disconnected result channel means
    /// the owner shut down without running the operation.
    pub(crate) fn wait<T>(&self, results: Receiver<Result<T>>) -> Result<T> {
        let deadline_rx = match self.deadline {
            Some(deadline) => at(deadline),
            None => never(),
        };
        let token_rx = match &self.token {
            Some(token) => token.receiver(),
            None => never(),
        };
        select! {
            recv(results) -> outcome => outcome.unwrap_or(Err(Error::Closed)),
            recv(deadline_rx) -> _ => Err(Error::Timeout),
            recv(token_rx) -> _ => Err(Error::Cancelled),
        }
    }
}

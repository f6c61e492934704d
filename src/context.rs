//! Request-scoped context: typed values, path parameters and an advisory
//! cancellation signal.
//!
//! A [`Context`] is immutable. Deriving one (`with_value`, `with_params`,
//! `with_deadline`, ...) returns a new context and leaves the parent alone,
//! so the same parent can be shared by concurrent work without locking.
//!
//! Cancellation is advisory. Nothing is aborted when a context is cancelled;
//! code that cares polls [`Context::err`] or awaits [`Context::done`]:
//!
//! ```rust,no_run
//! # use hitch::Context;
//! # async fn work() {}
//! # async fn f(ctx: Context) {
//! tokio::select! {
//!     reason = ctx.done() => tracing::warn!("giving up: {reason}"),
//!     () = work() => {}
//! }
//! # }
//! ```

use std::fmt;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use http::Extensions;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::Error;

// ── Params ────────────────────────────────────────────────────────────────────

/// Path-template bindings produced by the router for the matched route.
///
/// For a route `/users/{id}` matched against `/users/42` this holds
/// `[("id", "42")]`, in template order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the value bound to `name`, if the template has such a segment.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Storage key for the path parameters. Private, so nothing outside this
/// module can read or overwrite the entry, even by storing its own `Params`.
#[derive(Clone)]
struct ParamsKey(Params);

// ── Cancellation ──────────────────────────────────────────────────────────────

/// Why a context was cancelled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CancelReason {
    /// The owning [`CancelGuard`] was dropped.
    Canceled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => f.write_str("context canceled"),
            Self::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

type Signal = watch::Sender<Option<CancelReason>>;

/// First reason wins; later cancellations are ignored.
fn cancel(signal: &Signal, reason: CancelReason) {
    signal.send_if_modified(|state| {
        if state.is_some() {
            return false;
        }
        *state = Some(reason);
        true
    });
}

/// Owns a derived context's cancellation.
///
/// Dropping the guard cancels the context with [`CancelReason::Canceled`]
/// (unless it already expired) and stops its timer task. Hold it for exactly
/// as long as the derived context should stay live.
#[must_use = "dropping the guard cancels the context immediately"]
pub struct CancelGuard {
    signal: Arc<Signal>,
    timer: JoinHandle<()>,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        cancel(&self.signal, CancelReason::Canceled);
        self.timer.abort();
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Per-request context handed to every [`Endpoint`](crate::Endpoint).
#[derive(Clone)]
pub struct Context {
    values: Arc<Extensions>,
    // `None` for a root context, which is never cancelled.
    done: Option<watch::Receiver<Option<CancelReason>>>,
    deadline: Option<Instant>,
}

impl Context {
    /// An empty root context: no values, no deadline, never cancelled.
    pub fn background() -> Self {
        Self { values: Arc::new(Extensions::new()), done: None, deadline: None }
    }

    /// Returns a child context that also carries `value`.
    ///
    /// Values are keyed by type; storing a second value of the same type in a
    /// child shadows the parent's.
    pub fn with_value<T: Clone + Send + Sync + 'static>(&self, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(value);
        Self { values: Arc::new(values), ..self.clone() }
    }

    pub fn value<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Returns a child context carrying the path parameters of the matched
    /// route.
    pub fn with_params(&self, params: Params) -> Self {
        self.with_value(ParamsKey(params))
    }

    /// Path parameters attached by [`with_params`](Self::with_params).
    ///
    /// Fails with [`Error::ParamsNotFound`] on a context that never went
    /// through it.
    pub fn params(&self) -> Result<&Params, Error> {
        self.value::<ParamsKey>()
            .map(|key| &key.0)
            .ok_or(Error::ParamsNotFound)
    }

    /// The earliest deadline of this context and its ancestors.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Some(reason)` once the context has been cancelled.
    pub fn err(&self) -> Option<CancelReason> {
        self.done.as_ref().and_then(|rx| *rx.borrow())
    }

    /// Resolves when the context is cancelled. Never resolves for a root
    /// context.
    pub async fn done(&self) -> CancelReason {
        let Some(rx) = &self.done else {
            return pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                // Every guard is gone without cancelling, which cannot happen
                // through the public API. Behave like a root context.
                return pending().await;
            }
        }
    }

    /// Returns a child that is cancelled at `deadline`, when the parent is
    /// cancelled, or when the returned guard is dropped, whichever is first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelGuard) {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.derive(Some(deadline))
    }

    /// [`with_deadline`](Self::with_deadline) relative to now.
    pub fn with_timeout(&self, after: Duration) -> (Self, CancelGuard) {
        self.with_deadline(Instant::now() + after)
    }

    /// Returns a child cancelled only by its guard or by the parent.
    pub fn with_cancel(&self) -> (Self, CancelGuard) {
        self.derive(self.deadline)
    }

    fn derive(&self, deadline: Option<Instant>) -> (Self, CancelGuard) {
        let (tx, rx) = watch::channel(self.err());
        let signal = Arc::new(tx);

        let parent = self.clone();
        let timer_signal = Arc::clone(&signal);
        let timer = tokio::spawn(async move {
            let expired = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => pending().await,
                }
            };
            let reason = tokio::select! {
                () = expired => CancelReason::DeadlineExceeded,
                reason = parent.done() => reason,
            };
            cancel(&timer_signal, reason);
        });

        let child = Self { values: Arc::clone(&self.values), done: Some(rx), deadline };
        (child, CancelGuard { signal, timer })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.deadline)
            .field("err", &self.err())
            .finish_non_exhaustive()
    }
}

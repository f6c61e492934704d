//! Advisory request deadlines.
//!
//! The deadline is only a signal on the [`Context`]. Nothing is aborted when
//! it passes: an endpoint that wants the deadline enforced must watch
//! [`Context::done`] or poll [`Context::err`] itself.

use std::time::Duration;

use tracing::{debug, warn};

use crate::chain::Decorator;
use crate::context::{CancelReason, Context};
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Deadline applied by [`timeout`].
pub const TIMEOUT: Duration = Duration::from_millis(50);

/// Gives the wrapped endpoint a context that expires [`TIMEOUT`] after the
/// call starts.
pub fn timeout(inner: BoxedEndpoint) -> BoxedEndpoint {
    Timeout::default().decorate(inner)
}

/// [`timeout`] with a custom deadline.
#[derive(Clone, Copy, Debug)]
pub struct Timeout {
    after: Duration,
}

impl Timeout {
    pub fn new(after: Duration) -> Self {
        Self { after }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::new(TIMEOUT)
    }
}

impl Decorator for Timeout {
    fn decorate(&self, inner: BoxedEndpoint) -> BoxedEndpoint {
        BoxedEndpoint::new(Deadline { inner, after: self.after })
    }
}

struct Deadline {
    inner: BoxedEndpoint,
    after: Duration,
}

impl Endpoint for Deadline {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<()> {
        let inner = self.inner.clone();
        let after = self.after;
        Box::pin(async move {
            // The guard lives until this block ends, on return or unwind.
            // Dropping it cancels `ctx`, which also ends the watcher below.
            let (ctx, _guard) = ctx.with_timeout(after);

            let watched = ctx.clone();
            tokio::spawn(async move {
                match watched.done().await {
                    CancelReason::DeadlineExceeded => {
                        warn!(after = ?after, "error: {}", CancelReason::DeadlineExceeded);
                    }
                    reason @ CancelReason::Canceled => debug!("{reason}"),
                }
            });

            inner.call(ctx, w, req).await;
        })
    }
}

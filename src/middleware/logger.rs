//! Request timing.

use std::time::Instant;

use http::Method;
use tracing::info;

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Logs how long everything inside it took, in whole milliseconds.
///
/// Put it first in an [`EndpointConfig`](crate::EndpointConfig) to time the
/// whole chain. The line is emitted however the wrapped call ends, including
/// by panic.
pub fn logger(inner: BoxedEndpoint) -> BoxedEndpoint {
    BoxedEndpoint::new(Logged { inner })
}

struct Logged {
    inner: BoxedEndpoint,
}

impl Endpoint for Logged {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<()> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _timer = Timer {
                begin: Instant::now(),
                method: req.method().clone(),
                path: req.path().to_owned(),
            };
            inner.call(ctx, w, req).await;
        })
    }
}

/// Logs on drop, so unwinding out of the wrapped call still reports.
struct Timer {
    begin: Instant,
    method: Method,
    path: String,
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed_ms = u64::try_from(self.begin.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(method = %self.method, path = %self.path, elapsed_ms, "request took {elapsed_ms} ms");
    }
}

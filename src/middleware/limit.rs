//! Request body size limiting.

use crate::body::BUFFER_MAX;
use crate::chain::Decorator;
use crate::context::Context;
use crate::envelope::size_response;
use crate::error::Error;
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Caps request bodies at [`BUFFER_MAX`] bytes.
///
/// A declared `Content-Length` over the cap is answered with a 417 size
/// envelope and the wrapped endpoint never runs. Otherwise the body stream is
/// capped, so a client that declares less than it sends, or declares nothing,
/// gets a read error at the cap instead of unbounded buffering.
pub fn limit_up(inner: BoxedEndpoint) -> BoxedEndpoint {
    LimitUp::default().decorate(inner)
}

/// [`limit_up`] with a custom cap.
#[derive(Clone, Copy, Debug)]
pub struct LimitUp {
    max: usize,
}

impl LimitUp {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Default for LimitUp {
    fn default() -> Self {
        Self::new(BUFFER_MAX)
    }
}

impl Decorator for LimitUp {
    fn decorate(&self, inner: BoxedEndpoint) -> BoxedEndpoint {
        BoxedEndpoint::new(Capped { inner, max: self.max })
    }
}

struct Capped {
    inner: BoxedEndpoint,
    max: usize,
}

impl Endpoint for Capped {
    fn call(&self, ctx: Context, w: ResponseWriter, mut req: Request) -> BoxFuture<()> {
        let max = self.max;
        if req.content_length().is_some_and(|len| len > max as u64) {
            return Box::pin(async move {
                size_response(w, Error::Size(format!("request body exceeds {max} bytes")));
            });
        }

        req.limit_body(max);
        self.inner.call(ctx, w, req)
    }
}

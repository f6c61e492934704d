//! Incoming HTTP request type.

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri, header};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Limited};

use crate::context::{Context, Params};
use crate::error::BoxError;

/// Type-erased request body.
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// An incoming HTTP request: head, streaming body and the request context.
pub struct Request {
    head: Parts,
    body: Body,
    ctx: Context,
}

impl Request {
    /// Wraps any `http::Request` whose body yields [`Bytes`].
    ///
    /// The server does this for every hyper request; tests can do the same
    /// with an `http_body_util::Full` body.
    pub fn from_http<B>(req: http::Request<B>) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (head, body) = req.into_parts();
        let body = body.map_err(|err| -> BoxError { err.into() }).boxed_unsync();
        Self { head, body, ctx: Context::background() }
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }

    /// Header lookup. Returns `None` for absent or non-visible-ASCII values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The declared `Content-Length`, if present and well formed.
    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH.as_str())?.trim().parse().ok()
    }

    /// The context the router attached to this request.
    pub fn context(&self) -> &Context { &self.ctx }

    pub(crate) fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.ctx.params().ok().and_then(|p| p.get(key))
    }

    /// All path parameters, or an empty set outside a routed request.
    pub fn params(&self) -> Params {
        self.ctx.params().cloned().unwrap_or_default()
    }

    pub fn body_mut(&mut self) -> &mut Body { &mut self.body }

    /// Moves the body out, leaving an empty one behind.
    pub fn take_body(&mut self) -> Body {
        let empty: Body = Empty::<Bytes>::new()
            .map_err(|never| match never {})
            .boxed_unsync();
        std::mem::replace(&mut self.body, empty)
    }

    /// Caps the body stream at `max` bytes. Reading past the cap yields an
    /// error instead of data.
    pub fn limit_body(&mut self, max: usize) {
        let body = self.take_body();
        self.body = Limited::new(body, max).boxed_unsync();
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("headers", &self.head.headers)
            .finish_non_exhaustive()
    }
}

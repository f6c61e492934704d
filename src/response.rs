//! Outgoing HTTP response, the single-shot [`ResponseWriter`] endpoints write
//! into, and the [`IntoResponse`] conversion trait.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use http_body_util::Full;
use tokio::sync::oneshot;
use tracing::debug;

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response: status, headers and a fully buffered body.
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// Response with no body.
    pub fn empty(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Response with a body and an explicit content type.
    pub fn with_body(
        status: StatusCode,
        content_type: &'static str,
        body: impl Into<Bytes>,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self { status, headers, body: body.into() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Converts into the `http` type hyper writes to the wire.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// The output sink handed to every endpoint.
///
/// Headers can be staged with [`headers_mut`](Self::headers_mut). Status,
/// headers and body are then committed together by [`write`](Self::write) or
/// [`send`](Self::send), both of which consume the writer: a response is
/// written at most once.
pub struct ResponseWriter {
    headers: HeaderMap,
    slot: oneshot::Sender<Response>,
}

/// The receiving half of a [`ResponseWriter`].
pub struct PendingResponse(oneshot::Receiver<Response>);

impl ResponseWriter {
    /// Creates a writer and the handle that later yields what was written.
    ///
    /// The router does this once per request. Tests driving an endpoint
    /// directly do the same.
    pub fn channel() -> (Self, PendingResponse) {
        let (slot, rx) = oneshot::channel();
        (Self { headers: HeaderMap::new(), slot }, PendingResponse(rx))
    }

    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// Commits `status` and `body` together with the staged headers.
    pub fn write(self, status: StatusCode, body: impl Into<Bytes>) {
        let res = Response { status, headers: HeaderMap::new(), body: body.into() };
        self.send(res);
    }

    /// Commits a prepared response. Staged headers are applied first, so the
    /// response's own headers take precedence.
    pub fn send(self, mut res: Response) {
        let mut headers = self.headers;
        let mut last = None;
        for (name, value) in res.headers.drain() {
            // `drain` yields the name only for the first value of each header.
            match name {
                Some(name) => {
                    headers.insert(name.clone(), value);
                    last = Some(name);
                }
                None => {
                    if let Some(name) = &last {
                        headers.append(name.clone(), value);
                    }
                }
            }
        }
        res.headers = headers;
        if self.slot.send(res).is_err() {
            debug!("response dropped: request already finished");
        }
    }
}

impl PendingResponse {
    /// The committed response, or `None` if the writer was dropped unwritten
    /// or is still held elsewhere.
    pub fn take(mut self) -> Option<Response> {
        self.0.try_recv().ok()
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`] for plain [`Handler`](crate::Handler)s.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NO_CONTENT`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::empty(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_merges_staged_headers() {
        let (mut w, pending) = ResponseWriter::channel();
        w.headers_mut().insert("x-trace", HeaderValue::from_static("abc"));
        w.write(StatusCode::CREATED, "hi");

        let res = pending.take().unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["x-trace"], "abc");
        assert_eq!(res.body(), &Bytes::from_static(b"hi"));
    }

    #[test]
    fn response_headers_override_staged() {
        let (mut w, pending) = ResponseWriter::channel();
        w.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        w.send(Response::with_body(StatusCode::OK, "application/json", "{}"));

        let res = pending.take().unwrap();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn unwritten_writer_yields_nothing() {
        let (w, pending) = ResponseWriter::channel();
        drop(w);
        assert!(pending.take().is_none());
    }
}

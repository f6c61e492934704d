//! Permissive CORS gate.
//!
//! Every origin is trusted: the caller's `Origin` is echoed back as the
//! allowed origin. Wrap the whole router once, not individual routes.

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use http::{HeaderValue, Method, StatusCode};

use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

/// Header set advertised to preflights.
const ALLOWED_HEADERS: &str = "authorization";

/// Wraps `inner` in a [`Cors`] gate.
pub fn cors<H: Handler>(inner: H) -> Cors<H> {
    Cors { inner }
}

/// A [`Handler`] that answers `OPTIONS` preflights itself and adds
/// cross-origin headers to everything else it delegates.
pub struct Cors<H> {
    inner: H,
}

impl<H: Handler> Handler for Cors<H> {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let origin = req.headers().get(ORIGIN).cloned();

        if req.method() == Method::OPTIONS {
            let requested = req
                .header(ACCESS_CONTROL_REQUEST_METHOD.as_str())
                .unwrap_or_default()
                .to_ascii_uppercase();

            let mut res = Response::empty(StatusCode::OK);
            let headers = res.headers_mut();
            headers.append(VARY, HeaderValue::from_static("Origin"));
            if let Some(origin) = origin {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            }
            headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Method"));
            headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
            if let Ok(methods) = HeaderValue::from_str(&requested) {
                headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods);
            }
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
            return Box::pin(async move { res });
        }

        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut res = fut.await;
            let headers = res.headers_mut();
            headers.append(VARY, HeaderValue::from_static("Origin"));
            // An allowed origin chosen by the inner handler wins.
            if let Some(origin) = origin {
                headers.entry(ACCESS_CONTROL_ALLOW_ORIGIN).or_insert(origin);
            }
            res
        })
    }
}

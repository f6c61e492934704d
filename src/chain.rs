//! Endpoint decorators and their composition.
//!
//! An [`EndpointConfig`] is an ordered list of decorators. Applying it to a
//! base endpoint nests them like an onion: the first decorator in the list is
//! the outermost layer, so its pre-logic runs first and its post-logic runs
//! last.
//!
//! ```text
//! EndpointConfig [d0, d1, d2]  ·  apply(base)  =  d0(d1(d2(base)))
//!
//! d0 ─┐                                             ┌─ d0
//!     d1 ─┐                                   ┌─ d1
//!         d2 ─┐                         ┌─ d2
//!             └──────── base ───────────┘
//! ```

use std::sync::Arc;

use crate::handler::{BoxedEndpoint, Endpoint};

/// Turns one endpoint into another that wraps it.
///
/// Implemented for every `Fn(BoxedEndpoint) -> BoxedEndpoint`, which covers
/// the plain functions in [`middleware`](crate::middleware) as well as
/// closures. A decorator must not rely on being applied only once: the same
/// instance may wrap many endpoints.
pub trait Decorator: Send + Sync + 'static {
    fn decorate(&self, inner: BoxedEndpoint) -> BoxedEndpoint;
}

impl<F> Decorator for F
where
    F: Fn(BoxedEndpoint) -> BoxedEndpoint + Send + Sync + 'static,
{
    fn decorate(&self, inner: BoxedEndpoint) -> BoxedEndpoint {
        self(inner)
    }
}

/// An ordered, reusable decorator stack.
///
/// ```rust,no_run
/// use hitch::EndpointConfig;
/// use hitch::middleware::{limit_up, logger, timeout};
/// # async fn create_user(_: hitch::Context, _: hitch::ResponseWriter, _: hitch::Request) {}
///
/// // Logger sees the time spent in Timeout, LimitUp and the handler.
/// let config = EndpointConfig::new().with(logger).with(timeout).with(limit_up);
/// let endpoint = config.apply(create_user);
/// ```
#[derive(Clone, Default)]
pub struct EndpointConfig {
    decorators: Vec<Arc<dyn Decorator>>,
}

impl EndpointConfig {
    pub fn new() -> Self {
        Self { decorators: Vec::new() }
    }

    /// Appends `decorator` as the innermost layer so far. Returns `self` for
    /// chaining.
    pub fn with(mut self, decorator: impl Decorator) -> Self {
        self.decorators.push(Arc::new(decorator));
        self
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Wraps `endpoint` in every decorator, last to first, so the first
    /// decorator ends up outermost.
    ///
    /// The config is left untouched and can be applied to any number of
    /// endpoints.
    pub fn apply(&self, endpoint: impl Endpoint) -> BoxedEndpoint {
        self.decorators
            .iter()
            .rev()
            .fold(BoxedEndpoint::new(endpoint), |inner, decorator| decorator.decorate(inner))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http_body_util::Full;

    use super::*;
    use crate::{Context, Request, ResponseWriter};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(name: &'static str, log: Log) -> impl Decorator {
        move |inner: BoxedEndpoint| -> BoxedEndpoint {
            let log = Arc::clone(&log);
            BoxedEndpoint::new(move |ctx: Context, w: ResponseWriter, req: Request| {
                let inner = inner.clone();
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(format!("{name} before"));
                    inner.call(ctx, w, req).await;
                    log.lock().unwrap().push(format!("{name} after"));
                }
            })
        }
    }

    fn request() -> Request {
        Request::from_http(http::Request::get("/").body(Full::<bytes::Bytes>::default()).unwrap())
    }

    async fn drive(endpoint: &BoxedEndpoint) {
        let (w, _pending) = ResponseWriter::channel();
        endpoint.call(Context::background(), w, request()).await;
    }

    #[tokio::test]
    async fn first_decorator_is_outermost() {
        let log: Log = Arc::default();
        let base_log = Arc::clone(&log);
        let base = move |_: Context, _: ResponseWriter, _: Request| {
            let log = Arc::clone(&base_log);
            async move { log.lock().unwrap().push("base".to_owned()) }
        };

        let config = EndpointConfig::new()
            .with(recording("d0", Arc::clone(&log)))
            .with(recording("d1", Arc::clone(&log)))
            .with(recording("d2", Arc::clone(&log)));
        drive(&config.apply(base)).await;

        assert_eq!(
            *log.lock().unwrap(),
            [
                "d0 before", "d1 before", "d2 before",
                "base",
                "d2 after", "d1 after", "d0 after",
            ]
        );
    }

    #[tokio::test]
    async fn empty_config_is_identity() {
        let log: Log = Arc::default();
        let base_log = Arc::clone(&log);
        let base = move |_: Context, _: ResponseWriter, _: Request| {
            let log = Arc::clone(&base_log);
            async move { log.lock().unwrap().push("base".to_owned()) }
        };

        let config = EndpointConfig::new();
        assert!(config.is_empty());
        drive(&config.apply(base)).await;

        assert_eq!(*log.lock().unwrap(), ["base"]);
    }

    #[tokio::test]
    async fn config_is_reusable() {
        let log: Log = Arc::default();
        let config = EndpointConfig::new().with(recording("outer", Arc::clone(&log)));
        let noop = |_: Context, _: ResponseWriter, _: Request| async {};

        let a = config.apply(noop);
        let b = config.apply(noop);
        drive(&a).await;
        drive(&b).await;

        assert_eq!(config.len(), 1);
        assert_eq!(
            *log.lock().unwrap(),
            ["outer before", "outer after", "outer before", "outer after"]
        );
    }
}

//! Handler traits and type erasure.
//!
//! hitch has two handler levels:
//!
//! - [`Handler`] is the transport level: one request in, one [`Response`]
//!   out. The [`Router`](crate::Router) is a `Handler`, and so is the
//!   [`Cors`](crate::middleware::Cors) gate wrapped around it. The server
//!   drives exactly one `Handler`.
//! - [`Endpoint`] is the route level: it gets the request [`Context`], a
//!   [`ResponseWriter`] and the request, and returns nothing. Everything it
//!   does it does by writing. Endpoints are what decorators wrap.
//!
//! Both are stored as trait objects so routes of different concrete types
//! fit in one table. The chain from user code to vtable call is:
//!
//! ```text
//! async fn get_user(ctx, w, req) { … }        ← user writes this
//!        ↓ router.on(Method::GET, "/users/{id}", get_user)
//! BoxedEndpoint::new(get_user)                ← Arc<dyn Endpoint>
//!        ↓
//! endpoint.call(ctx, w, req) at request time  ← one vtable dispatch
//!        ↓
//! Box::pin(get_user(ctx, w, req))             ← BoxFuture<()>
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::request::Request;
use crate::response::{IntoResponse, Response, ResponseWriter};

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` let tokio move the future across threads safely.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ── Handler ───────────────────────────────────────────────────────────────────

/// A transport-level request handler.
///
/// Implemented for every `async fn(Request) -> impl IntoResponse`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<Response>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let fut = self(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// A route-level handler.
///
/// Implemented for every
/// `async fn(Context, ResponseWriter, Request)`:
///
/// ```rust,no_run
/// use hitch::{Context, Request, ResponseWriter, result_response};
///
/// async fn get_user(ctx: Context, w: ResponseWriter, _req: Request) {
///     let id = ctx.params().ok().and_then(|p| p.get("id")).unwrap_or("unknown");
///     result_response(w, serde_json::json!({ "id": id }));
/// }
/// ```
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<()>;
}

impl<F, Fut> Endpoint for F
where
    F: Fn(Context, ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<()> {
        Box::pin(self(ctx, w, req))
    }
}

/// A shared, type-erased [`Endpoint`].
///
/// Cloning is one atomic increment. This is what decorators take and return.
#[derive(Clone)]
pub struct BoxedEndpoint(Arc<dyn Endpoint>);

impl BoxedEndpoint {
    pub fn new(endpoint: impl Endpoint) -> Self {
        Self(Arc::new(endpoint))
    }
}

impl Endpoint for BoxedEndpoint {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<()> {
        self.0.call(ctx, w, req)
    }
}

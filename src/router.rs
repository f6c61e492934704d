//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. No redirects: a path that
//! only matches with or without a trailing slash is a 404, like any other
//! miss. Unmatched requests get a JSON envelope, never an HTML page.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::error;

use crate::context::Params;
use crate::envelope::{JsonResult, error_response};
use crate::error::{Error, SerializationFault};
use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint, Handler};
use crate::request::Request;
use crate::response::{IntoResponse, Response, ResponseWriter};

/// The application router.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve),
/// usually wrapped in a [`Cors`](crate::middleware::Cors) gate. Every matched
/// request gets a fresh [`Context`](crate::Context) carrying the route's path
/// parameters, and the endpoint runs under a panic handler that turns a panic
/// into a 500 envelope.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedEndpoint>>,
}

enum Lookup {
    Found(BoxedEndpoint, Params),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register an endpoint for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and are read back through
    /// [`Context::params`](crate::Context::params):
    ///
    /// ```rust,no_run
    /// # use hitch::{Context, Request, ResponseWriter, Router, EndpointConfig};
    /// # use hitch::middleware::logger;
    /// # use http::Method;
    /// # async fn get_user(_: Context, _: ResponseWriter, _: Request) {}
    /// # async fn create_user(_: Context, _: ResponseWriter, _: Request) {}
    /// let logged = EndpointConfig::new().with(logger);
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", logged.apply(get_user))
    ///     .on(Method::POST, "/users",      logged.apply(create_user));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the path is not a valid template or conflicts with an
    /// existing route. Use [`add_endpoint`](Self::add_endpoint) to handle that
    /// as an error.
    pub fn on(mut self, method: Method, path: &str, endpoint: impl Endpoint) -> Self {
        if let Err(e) = self.add_endpoint(method, path, endpoint) {
            panic!("{e}");
        }
        self
    }

    /// Register an endpoint for a method + path pair.
    pub fn add_endpoint(
        &mut self,
        method: Method,
        path: &str,
        endpoint: impl Endpoint,
    ) -> Result<(), Error> {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, BoxedEndpoint::new(endpoint))
            .map_err(|source| Error::Route { path: path.to_owned(), source })
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter().collect();
            return Lookup::Found(matched.value.clone(), params);
        }

        let mut allowed: Vec<Method> = self
            .routes
            .iter()
            .filter(|(m, tree)| *m != method && tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Lookup::MethodNotAllowed(allowed)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl Handler for Router {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        match self.lookup(req.method(), req.path()) {
            Lookup::Found(endpoint, params) => Box::pin(dispatch(endpoint, params, req)),
            Lookup::MethodNotAllowed(allowed) => {
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                let mut res =
                    JsonResult::<()>::failure(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
                        .into_response();
                if let Ok(allow) = HeaderValue::from_str(&allow) {
                    res.headers_mut().insert(ALLOW, allow);
                }
                Box::pin(async move { res })
            }
            Lookup::NotFound => {
                let res =
                    JsonResult::<()>::failure(StatusCode::NOT_FOUND, "Not Found").into_response();
                Box::pin(async move { res })
            }
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one matched endpoint and collects what it wrote.
async fn dispatch(endpoint: BoxedEndpoint, params: Params, mut req: Request) -> Response {
    let ctx = req.context().with_params(params);
    req.set_context(ctx.clone());

    let (w, pending) = ResponseWriter::channel();
    let outcome = AssertUnwindSafe(async move { endpoint.call(ctx, w, req).await })
        .catch_unwind()
        .await;

    let panic = outcome.err().map(|payload| describe_panic(payload.as_ref()));
    if let Some(res) = pending.take() {
        if let Some(panic) = panic {
            error!("panic after response was written: {panic}");
        }
        return res;
    }

    match panic {
        // An endpoint that writes nothing gets the host default.
        None => Response::empty(StatusCode::OK),
        Some(panic) => {
            let (w, pending) = ResponseWriter::channel();
            error_response(w, panic);
            pending.take().unwrap_or_else(|| Response::empty(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(fault) = payload.downcast_ref::<SerializationFault>() {
        fault.to_string()
    } else if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

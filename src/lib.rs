//! # hitch
//!
//! Small glue for JSON HTTP services: a radix-tree router, request-scoped
//! context, a uniform JSON envelope, and composable endpoint decorators.
//!
//! ## The pieces
//!
//! - **Endpoints** take `(Context, ResponseWriter, Request)` and write their
//!   response. They return nothing.
//! - **Decorators** wrap endpoints. An [`EndpointConfig`] lists them
//!   outermost first: `[logger, timeout, limit_up]` times the whole chain,
//!   then sets a deadline, then caps the body.
//! - **Envelopes**: every response is `{"success", "error"?, "result"?}`
//!   with the status on the status line. See [`result_response`],
//!   [`error_response`], [`size_response`], [`no_access`].
//! - **Router**: [`Router::on`] binds method + path + endpoint. Path
//!   parameters land in the request [`Context`].
//! - **CORS**: [`middleware::cors`] wraps the router once and answers
//!   preflights.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hitch::middleware::{cors, limit_up, logger, timeout};
//! use hitch::{
//!     Context, EndpointConfig, Request, ResponseWriter, Router, Server,
//!     decode_body, error_response, result_response,
//! };
//! use http::Method;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewUser { name: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hitch::Error> {
//!     let api = EndpointConfig::new().with(logger).with(timeout).with(limit_up);
//!
//!     let app = Router::new()
//!         .on(Method::GET,  "/users/{id}", api.apply(get_user))
//!         .on(Method::POST, "/users",      api.apply(create_user));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(cors(app)).await
//! }
//!
//! async fn get_user(ctx: Context, w: ResponseWriter, _req: Request) {
//!     match ctx.params() {
//!         Ok(params) => result_response(w, params.get("id")),
//!         Err(err) => error_response(w, err),
//!     }
//! }
//!
//! async fn create_user(_ctx: Context, w: ResponseWriter, mut req: Request) {
//!     match decode_body::<NewUser>(&mut req).await {
//!         Ok(user) => result_response(w, user.name),
//!         Err(err) => error_response(w, err),
//!     }
//! }
//! ```

mod body;
mod chain;
mod config;
mod context;
mod envelope;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use body::{BUFFER_MAX, MB, READ_LIMIT, decode_body};
pub use chain::{Decorator, EndpointConfig};
pub use config::{Config, config_value};
pub use context::{CancelGuard, CancelReason, Context, Params};
pub use envelope::{
    JSON_CONTENT_TYPE, JsonResult, error_response, no_access, result_response, size_response,
};
pub use error::{BoxError, Error, SerializationFault};
pub use handler::{BoxFuture, BoxedEndpoint, Endpoint, Handler};
pub use request::{Body, Request};
pub use response::{IntoResponse, PendingResponse, Response, ResponseWriter};
pub use router::Router;
pub use server::Server;

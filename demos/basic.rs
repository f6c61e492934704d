//! Minimal hitch example: a JSON user API behind the CORS gate.
//!
//! Run with:
//!   LISTEN_ADDR=127.0.0.1:3000 cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X PUT http://localhost:3000/users/42 \
//!        -H 'authorization: Bearer demo' \
//!        -d '{"name":"alice"}'
//!   curl -X OPTIONS http://localhost:3000/users/42 \
//!        -H 'origin: https://app.example' \
//!        -H 'access-control-request-method: put' -i

use http::Method;
use serde::{Deserialize, Serialize};

use hitch::middleware::{cors, limit_up, logger, timeout};
use hitch::{
    Config, Context, EndpointConfig, Request, ResponseWriter, Router, Server, decode_body,
    error_response, no_access, result_response,
};

#[derive(Serialize)]
struct User<'a> {
    id: &'a str,
    name: String,
}

#[derive(Deserialize)]
struct Rename {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), hitch::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env(&["LISTEN_ADDR"])?;
    let addr = config.get("LISTEN_ADDR").unwrap_or("0.0.0.0:3000");

    // Outermost first: time everything, then set the deadline, then cap the body.
    let api = EndpointConfig::new().with(logger).with(timeout).with(limit_up);

    let app = Router::new()
        .on(Method::GET, "/users/{id}", api.apply(get_user))
        .on(Method::PUT, "/users/{id}", api.apply(rename_user));

    Server::bind(addr)?.serve(cors(app)).await
}

// GET /users/{id}
async fn get_user(ctx: Context, w: ResponseWriter, _req: Request) {
    let params = match ctx.params() {
        Ok(params) => params,
        Err(err) => return error_response(w, err),
    };
    let id = params.get("id").unwrap_or("unknown");
    result_response(w, User { id, name: "alice".to_owned() });
}

// PUT /users/{id}
async fn rename_user(ctx: Context, w: ResponseWriter, mut req: Request) {
    if req.header("authorization").is_none() {
        return no_access(w);
    }
    let rename: Rename = match decode_body(&mut req).await {
        Ok(rename) => rename,
        Err(err) => return error_response(w, err),
    };

    // Give up politely if the deadline already passed while decoding.
    if let Some(reason) = ctx.err() {
        return error_response(w, reason);
    }

    let id = req.param("id").unwrap_or("unknown");
    result_response(w, User { id, name: rename.name });
}

//! End-to-end: CORS gate → router → decorator chain → endpoint.

use bytes::Bytes;
use http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::Full;
use serde::Deserialize;
use serde_json::{Value, json};

use hitch::middleware::{cors, limit_up, logger, timeout};
use hitch::{
    BUFFER_MAX, CancelReason, Context, EndpointConfig, Handler, JSON_CONTENT_TYPE, Request,
    Response, ResponseWriter, Router, decode_body, error_response, no_access, result_response,
};

#[derive(Deserialize)]
struct Rename {
    name: String,
}

async fn rename_user(ctx: Context, w: ResponseWriter, mut req: Request) {
    let id = match ctx.params() {
        Ok(params) => params.get("id").unwrap_or_default().to_owned(),
        Err(err) => return error_response(w, err),
    };
    if req.header("authorization").is_none() {
        return no_access(w);
    }
    match decode_body::<Rename>(&mut req).await {
        Ok(body) => result_response(w, json!({ "id": id, "name": body.name })),
        Err(err) => error_response(w, err),
    }
}

/// Reports whether the deadline from `timeout` reached it.
async fn wait_for_deadline(ctx: Context, w: ResponseWriter, _req: Request) {
    let reason = tokio::select! {
        reason = ctx.done() => Some(reason),
        () = tokio::time::sleep(std::time::Duration::from_secs(5)) => None,
    };
    result_response(w, reason == Some(CancelReason::DeadlineExceeded));
}

fn app() -> impl Handler {
    let api = EndpointConfig::new().with(logger).with(timeout).with(limit_up);
    cors(
        Router::new()
            .on(Method::PUT, "/users/{id}", api.apply(rename_user))
            .on(Method::GET, "/slow", api.apply(wait_for_deadline)),
    )
}

fn request(method: Method, path: &str, headers: &[(&str, String)], body: &'static str) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    Request::from_http(builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap())
}

fn json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

#[tokio::test]
async fn decorated_route_decodes_body() {
    let res = app()
        .call(request(
            Method::PUT,
            "/users/42",
            &[
                ("origin", "https://app.example".into()),
                ("authorization", "Bearer t".into()),
            ],
            r#"{"name":"alice"}"#,
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");
    assert_eq!(json(&res), json!({"success": true, "result": {"id": "42", "name": "alice"}}));
}

#[tokio::test]
async fn missing_authorization_is_401() {
    let res = app()
        .call(request(Method::PUT, "/users/42", &[], r#"{"name":"alice"}"#))
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(&res), json!({"success": false, "error": "No Access"}));
}

#[tokio::test]
async fn bad_json_is_500_envelope() {
    let res = app()
        .call(request(
            Method::PUT,
            "/users/42",
            &[("authorization", "Bearer t".into())],
            "{oops",
        ))
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&res);
    assert_eq!(body["success"], false);
    assert!(body.get("result").is_none());
    assert!(body["error"].as_str().unwrap().starts_with("failed to decode body"));
}

#[tokio::test]
async fn oversized_declaration_is_417() {
    let res = app()
        .call(request(
            Method::PUT,
            "/users/42",
            &[
                ("authorization", "Bearer t".into()),
                ("content-length", (BUFFER_MAX + 1).to_string()),
            ],
            "",
        ))
        .await;

    assert_eq!(res.status(), StatusCode::EXPECTATION_FAILED);
    assert_eq!(json(&res)["success"], false);
}

#[tokio::test]
async fn preflight_short_circuits_router() {
    let res = app()
        .call(request(
            Method::OPTIONS,
            "/no/such/route",
            &[
                ("origin", "https://app.example".into()),
                ("access-control-request-method", "delete".into()),
            ],
            "",
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.body().is_empty());
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_METHODS], "DELETE");
}

#[tokio::test]
async fn timeout_reaches_base_endpoint() {
    let res = app().call(request(Method::GET, "/slow", &[], "")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(&res)["result"], true);
}

#[tokio::test]
async fn unknown_route_still_gets_cors_headers() {
    let res = app()
        .call(request(Method::GET, "/missing", &[("origin", "https://x.example".into())], ""))
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://x.example");
}

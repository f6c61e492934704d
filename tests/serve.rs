//! Real sockets: raw HTTP/1.1 against a running `Server`.

use std::net::SocketAddr;
use std::time::Duration;

use http::Method;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use hitch::middleware::{cors, limit_up, logger, timeout};
use hitch::{BUFFER_MAX, Context, EndpointConfig, Request, ResponseWriter, Router, Server};
use hitch::{error_response, result_response};

async fn user_id(ctx: Context, w: ResponseWriter, _req: Request) {
    match ctx.params() {
        Ok(params) => result_response(w, params.get("id")),
        Err(err) => error_response(w, err),
    }
}

async fn start() -> SocketAddr {
    let api = EndpointConfig::new().with(logger).with(timeout).with(limit_up);
    let app = Router::new()
        .on(Method::GET, "/users/{id}", api.apply(user_id))
        .on(Method::PUT, "/users/{id}", api.apply(user_id));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = Server::from_listener(listener).unwrap();
    let addr = server.addr();
    tokio::spawn(server.serve(cors(app)));
    addr
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.all(name).next()
    }

    fn all<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Sends `head` as-is and reads one response, framed by its Content-Length.
async fn exchange(addr: SocketAddr, head: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut chunk))
            .await
            .expect("response within 5s")
            .unwrap();
        raw.extend_from_slice(&chunk[..n]);

        if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            let reply = parse(&raw[..end], raw[end + 4..].to_vec());
            let length: usize =
                reply.header("content-length").map_or(0, |v| v.parse().unwrap());
            if reply.body.len() >= length || n == 0 {
                return reply;
            }
        }
        assert_ne!(n, 0, "connection closed before response headers");
    }
}

fn parse(head: &[u8], body: Vec<u8>) -> Reply {
    let head = std::str::from_utf8(head).unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().split(' ').nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_owned(), v.trim().to_owned()))
        .collect();
    Reply { status, headers, body }
}

#[tokio::test]
async fn get_over_socket_returns_envelope_with_cors() {
    let addr = start().await;

    let reply = exchange(
        addr,
        "GET /users/7 HTTP/1.1\r\nHost: test\r\nOrigin: https://app.example\r\n\
         Connection: close\r\n\r\n",
    )
    .await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.json(), json!({"success": true, "result": "7"}));
    assert_eq!(reply.header("access-control-allow-origin"), Some("https://app.example"));
    assert_eq!(reply.header("content-type"), Some("application/json; charset=UTF-8"));
}

#[tokio::test]
async fn oversized_declared_length_is_417() {
    let addr = start().await;

    let head = format!(
        "PUT /users/7 HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n",
        BUFFER_MAX + 1
    );
    let reply = exchange(addr, &head).await;

    assert_eq!(reply.status, 417);
    assert_eq!(
        reply.json(),
        json!({"success": false, "error": format!("request body exceeds {BUFFER_MAX} bytes")})
    );
}

#[tokio::test]
async fn preflight_over_socket() {
    let addr = start().await;

    let reply = exchange(
        addr,
        "OPTIONS /users/7 HTTP/1.1\r\nHost: test\r\nOrigin: https://app.example\r\n\
         Access-Control-Request-Method: put\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert_eq!(reply.status, 200);
    assert!(reply.body.is_empty());
    assert_eq!(reply.header("access-control-allow-methods"), Some("PUT"));
    assert_eq!(reply.header("access-control-allow-headers"), Some("authorization"));
    assert_eq!(reply.header("access-control-allow-origin"), Some("https://app.example"));
    assert_eq!(
        reply.all("vary").collect::<Vec<_>>(),
        ["Origin", "Access-Control-Request-Method", "Access-Control-Request-Headers"]
    );
}

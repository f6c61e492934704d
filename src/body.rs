//! Bounded JSON body decoding.

use bytes::BytesMut;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::request::Request;

pub const MB: usize = 1 << 20;

/// Most bytes [`decode_body`] will ever read.
pub const READ_LIMIT: usize = MB;

/// Hard cap on a raw body stream, enforced by
/// [`LimitUp`](crate::middleware::LimitUp).
pub const BUFFER_MAX: usize = 5 * MB;

/// Reads at most [`READ_LIMIT`] bytes of the request body and decodes them as
/// JSON.
///
/// Anything past the limit is never read; a body that only becomes valid JSON
/// after the limit therefore fails to decode. The body is released once
/// reading stops, whether or not it succeeded.
pub async fn decode_body<T: DeserializeOwned>(req: &mut Request) -> Result<T, Error> {
    let bytes = read_limited(req, READ_LIMIT).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_limited(req: &mut Request, limit: usize) -> Result<BytesMut, Error> {
    let mut body = req.take_body();
    let mut buf = BytesMut::new();

    while buf.len() < limit {
        let Some(frame) = body.frame().await else { break };
        let frame = frame.map_err(Error::Body)?;
        if let Ok(data) = frame.into_data() {
            let take = data.len().min(limit - buf.len());
            buf.extend_from_slice(&data[..take]);
        }
    }

    drop(body);
    Ok(buf)
}

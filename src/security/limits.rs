//! Request size limits.
//!
//! The inbound body is buffered before it is forwarded, so it is capped
//! both on the declared `Content-Length` and on the bytes actually read.

use axum::body::Body;
use axum::http::{header, HeaderMap};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyLimitError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Read the whole request body, refusing anything above `limit` bytes.
pub async fn read_limited(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, BodyLimitError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(BodyLimitError::TooLarge { limit });
    }

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(BodyLimitError::TooLarge { limit })
        }
        Err(err) => Err(BodyLimitError::Read(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn reads_small_body() {
        let bytes = read_limited(&HeaderMap::new(), Body::from("hello"), 16).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn rejects_declared_length() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("100"));
        let err = read_limited(&headers, Body::from("tiny"), 16).await.unwrap_err();
        assert!(matches!(err, BodyLimitError::TooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn rejects_oversized_stream() {
        let err = read_limited(&HeaderMap::new(), Body::from(vec![b'x'; 64]), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyLimitError::TooLarge { .. }));
    }
}

use crate::body::{RequestBody, WireResponse};
use crate::codec::{
    BodyCodec, DEFAULT_BODY_LIMIT, EncodedBody, ResponseDecoder, ResponseEncoder, collect, content_response,
    expect_success,
};
use crate::error::{DecodeError, EncodeError};
use crate::rejection::terminal;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::{error, warn};

static APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// A json document, read and written with `serde_json`.
///
/// # Example
/// ```
/// # use serde::{Deserialize, Serialize};
/// use micro_endpoints::codec::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Item {
///     name: String,
/// }
///
/// let item_body = json::<Item>().limit(64 * 1024);
/// ```
pub struct Json<T> {
    limit: usize,
    _phantom: PhantomData<fn() -> T>,
}

pub fn json<T>() -> Json<T> {
    Json { limit: DEFAULT_BODY_LIMIT, _phantom: PhantomData }
}

impl<T> Json<T> {
    /// Max request body size accepted by the router.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Json").field("limit", &self.limit).finish()
    }
}

#[async_trait]
impl<T> BodyCodec for Json<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    type Output = T;

    async fn decode_body(&self, body: RequestBody) -> Result<Self::Output, WireResponse> {
        let bytes = collect(body, self.limit).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(cause = %e, "can't decode json body");
            terminal(StatusCode::BAD_REQUEST, format!("invalid json body: {e}"))
        })
    }

    fn encode_body(&self, value: Self::Output) -> Result<EncodedBody, EncodeError> {
        let bytes = serde_json::to_vec(&value).map_err(EncodeError::body)?;
        Ok(EncodedBody::new(Some(APPLICATION_JSON.clone()), bytes))
    }
}

impl<T> ResponseEncoder for Json<T>
where
    T: Serialize,
{
    type Value = T;

    fn encode_response(&self, value: Self::Value) -> WireResponse {
        match serde_json::to_vec(&value) {
            Ok(bytes) => content_response(APPLICATION_JSON.clone(), bytes),
            Err(e) => {
                error!(cause = %e, "can't serialize json response");
                terminal(StatusCode::INTERNAL_SERVER_ERROR, "")
            }
        }
    }
}

impl<T> ResponseDecoder for Json<T>
where
    T: DeserializeOwned,
{
    type Value = T;

    fn decode_response(&self, response: http::Response<Bytes>) -> Result<Self::Value, DecodeError> {
        expect_success(&response)?;
        let status = response.status();
        let body = response.into_body();
        serde_json::from_slice(&body).map_err(|e| DecodeError::malformed(status, body.clone(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn decode_valid_body() {
        let body = RequestBody::from(r#"{"name":"pen","count":3}"#);
        let item = json::<Item>().decode_body(body).await.unwrap();
        assert_eq!(item, Item { name: "pen".into(), count: 3 });
    }

    #[tokio::test]
    async fn invalid_body_is_bad_request() {
        let response = json::<Item>().decode_body(RequestBody::from("{")).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let body = RequestBody::from(r#"{"name":"pen","count":3}"#);
        let response = json::<Item>().limit(4).decode_body(body).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn response_is_json() {
        let response = json::<u32>().encode_response(42);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"42");
    }

    #[test]
    fn client_decode_failures_are_values() {
        let malformed = http::Response::new(Bytes::from_static(b"forty-two"));
        match json::<u32>().decode_response(malformed) {
            Err(DecodeError::Malformed { status, body, source }) => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body.as_ref(), b"forty-two");
                assert!(source.downcast_ref::<serde_json::Error>().is_some());
            }
            other => panic!("expected a malformed body, got {other:?}"),
        }

        let mut failed = http::Response::new(Bytes::from_static(b"42"));
        *failed.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
        assert!(matches!(
            json::<u32>().decode_response(failed),
            Err(DecodeError::UnexpectedStatus { status: StatusCode::SERVICE_UNAVAILABLE, .. })
        ));
    }

    #[test]
    fn encode_body_sets_content_type() {
        let encoded = json::<Item>().encode_body(Item { name: "pen".into(), count: 1 }).unwrap();
        assert_eq!(encoded.content_type().unwrap(), "application/json");
        let (_, bytes) = encoded.into_parts();
        assert_eq!(bytes.as_ref(), br#"{"name":"pen","count":1}"#);
    }
}

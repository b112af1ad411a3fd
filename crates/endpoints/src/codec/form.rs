use crate::body::{RequestBody, WireResponse};
use crate::codec::{BodyCodec, DEFAULT_BODY_LIMIT, EncodedBody, collect};
use crate::error::EncodeError;
use crate::rejection::terminal;
use async_trait::async_trait;
use http::{HeaderValue, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::warn;

static APPLICATION_WWW_FORM_URLENCODED: HeaderValue = HeaderValue::from_static("application/x-www-form-urlencoded");

/// An `application/x-www-form-urlencoded` request body.
pub struct Form<T> {
    limit: usize,
    _phantom: PhantomData<fn() -> T>,
}

pub fn form<T>() -> Form<T> {
    Form { limit: DEFAULT_BODY_LIMIT, _phantom: PhantomData }
}

impl<T> Form<T> {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl<T> std::fmt::Debug for Form<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form").field("limit", &self.limit).finish()
    }
}

#[async_trait]
impl<T> BodyCodec for Form<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    type Output = T;

    async fn decode_body(&self, body: RequestBody) -> Result<Self::Output, WireResponse> {
        let bytes = collect(body, self.limit).await?;
        serde_urlencoded::from_bytes(&bytes).map_err(|e| {
            warn!(cause = %e, "can't decode form body");
            terminal(StatusCode::BAD_REQUEST, format!("invalid form body: {e}"))
        })
    }

    fn encode_body(&self, value: Self::Output) -> Result<EncodedBody, EncodeError> {
        let encoded = serde_urlencoded::to_string(&value).map_err(EncodeError::body)?;
        Ok(EncodedBody::new(Some(APPLICATION_WWW_FORM_URLENCODED.clone()), encoded))
    }
}

//! Header codecs.
//!
//! On the server a [`HeaderCodec`] extracts a value from the request headers or rejects the
//! request with a terminal response; it runs after the url matched and before anything touches
//! the body. On the client the same codec injects the value into the outgoing headers.

mod basic;

pub use basic::{BasicAuth, Credentials, basic_auth};

use crate::body::WireResponse;
use crate::combine::Combiner;
use crate::error::EncodeError;
use crate::rejection::Rejection;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

pub trait HeaderCodec: Send + Sync {
    type Output;

    fn extract(&self, headers: &HeaderMap) -> Result<Self::Output, WireResponse>;

    fn inject(&self, value: Self::Output, headers: &mut HeaderMap) -> Result<(), EncodeError>;
}

pub trait HeaderCodecExt: HeaderCodec + Sized {
    /// Extracts `self` then `other`, merging both values with `combiner`.
    ///
    /// The first rejection wins.
    fn and<H, C>(self, other: H, combiner: C) -> Both<Self, H, C>
    where
        H: HeaderCodec,
        C: Combiner<Self::Output, H::Output>,
    {
        Both { first: self, second: other, combiner }
    }
}

impl<T: HeaderCodec> HeaderCodecExt for T {}

/// Accepts any headers, decodes to `()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHeaders;

impl HeaderCodec for NoHeaders {
    type Output = ();

    #[inline]
    fn extract(&self, _headers: &HeaderMap) -> Result<Self::Output, WireResponse> {
        Ok(())
    }

    #[inline]
    fn inject(&self, _value: Self::Output, _headers: &mut HeaderMap) -> Result<(), EncodeError> {
        Ok(())
    }
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, EncodeError> {
    HeaderValue::from_str(value).map_err(|e| EncodeError::header(format!("{name}: {e}")))
}

/// A header that must be present and valid visible ascii.
#[derive(Debug, Clone)]
pub struct Required {
    name: HeaderName,
    rejection: Rejection,
}

/// Creates a [`Required`] header codec, rejecting with `400 Bad Request` by default.
pub fn required(name: HeaderName) -> Required {
    let message = format!("missing or invalid header: {name}");
    Required { name, rejection: Rejection::new(StatusCode::BAD_REQUEST, message) }
}

impl Required {
    pub fn reject_with(mut self, status: StatusCode, message: impl Into<bytes::Bytes>) -> Self {
        self.rejection = Rejection::new(status, message);
        self
    }

    pub fn rejection(mut self, rejection: Rejection) -> Self {
        self.rejection = rejection;
        self
    }
}

impl HeaderCodec for Required {
    type Output = String;

    fn extract(&self, headers: &HeaderMap) -> Result<Self::Output, WireResponse> {
        headers
            .get(&self.name)
            .map(|value| value.to_str().map(str::to_string))
            .and_then(Result::ok)
            .ok_or_else(|| self.rejection.to_response())
    }

    fn inject(&self, value: Self::Output, headers: &mut HeaderMap) -> Result<(), EncodeError> {
        headers.insert(self.name.clone(), header_value(&self.name, &value)?);
        Ok(())
    }
}

/// A header that may be absent. A present value that is not visible ascii is rejected with
/// `400 Bad Request`.
#[derive(Debug, Clone)]
pub struct Optional {
    name: HeaderName,
}

pub fn optional(name: HeaderName) -> Optional {
    Optional { name }
}

impl HeaderCodec for Optional {
    type Output = Option<String>;

    fn extract(&self, headers: &HeaderMap) -> Result<Self::Output, WireResponse> {
        match headers.get(&self.name).map(HeaderValue::to_str) {
            None => Ok(None),
            Some(Ok(value)) => Ok(Some(value.to_string())),
            Some(Err(_)) => {
                Err(Rejection::new(StatusCode::BAD_REQUEST, format!("invalid header: {}", self.name)).to_response())
            }
        }
    }

    fn inject(&self, value: Self::Output, headers: &mut HeaderMap) -> Result<(), EncodeError> {
        if let Some(value) = value {
            headers.insert(self.name.clone(), header_value(&self.name, &value)?);
        }
        Ok(())
    }
}

/// Two header codecs run in sequence.
#[derive(Debug, Clone)]
pub struct Both<H1, H2, C> {
    first: H1,
    second: H2,
    combiner: C,
}

impl<H1, H2, C> HeaderCodec for Both<H1, H2, C>
where
    H1: HeaderCodec,
    H2: HeaderCodec,
    C: Combiner<H1::Output, H2::Output>,
{
    type Output = C::Out;

    fn extract(&self, headers: &HeaderMap) -> Result<Self::Output, WireResponse> {
        let first = self.first.extract(headers)?;
        let second = self.second.extract(headers)?;
        Ok(self.combiner.combine(first, second))
    }

    fn inject(&self, value: Self::Output, headers: &mut HeaderMap) -> Result<(), EncodeError> {
        let (first, second) = self.combiner.split(value);
        self.first.inject(first, headers)?;
        self.second.inject(second, headers)
    }
}

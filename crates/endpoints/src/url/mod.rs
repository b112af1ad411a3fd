//! Url codecs: matching a request path and query into a typed value, and rendering it back.
//!
//! A url is a path codec, optionally followed by query codecs:
//!
//! ```
//! use micro_endpoints::combine::{Tupled, UnitLeft};
//! use micro_endpoints::url::{self, UrlCodec};
//!
//! // GET /inc?x=41 decodes to 41_i32
//! let inc = url::fixed("/inc").unwrap().with_query(url::param::<i32>("x"), UnitLeft);
//! assert_eq!(inc.encode(41).unwrap(), "/inc?x=41");
//!
//! // /items/7?verbose=true decodes to (7_u64, Some(true))
//! let item = url::segment::<u64>("/items/{id}")
//!     .unwrap()
//!     .with_query(url::opt_param::<bool>("verbose"), Tupled);
//! assert_eq!(item.encode((7, Some(true))).unwrap(), "/items/7?verbose=true");
//! ```
//!
//! A query that fails to decode makes the whole url fail to match, the same as a wrong path.

mod path;
mod percent;
mod query;

pub use path::{Captures, Fixed, Segment};
pub use query::{OptParam, Param, Params};

use crate::combine::Combiner;
use crate::error::{EncodeError, PatternError};
use http::Uri;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::str::FromStr;

/// Decodes a request target into `Output`, and renders `Output` as a path and query.
pub trait UrlCodec: Send + Sync {
    type Output;

    /// `None` means the url does not apply to this request.
    fn decode(&self, uri: &Uri) -> Option<Self::Output>;

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError>;

    /// The path pattern, used in logs.
    fn pattern(&self) -> &str;
}

/// Decodes a raw query string (without the leading `?`) into `Output`.
pub trait QueryCodec: Send + Sync {
    type Output;

    fn decode(&self, query: &str) -> Option<Self::Output>;

    /// An empty string means nothing is appended to the url.
    fn encode(&self, value: Self::Output) -> Result<String, EncodeError>;
}

/// An url followed by a query codec.
#[derive(Debug)]
pub struct WithQuery<U, Q, C> {
    url: U,
    query: Q,
    combiner: C,
}

impl<U, Q, C> UrlCodec for WithQuery<U, Q, C>
where
    U: UrlCodec,
    Q: QueryCodec,
    C: Combiner<U::Output, Q::Output>,
{
    type Output = C::Out;

    fn decode(&self, uri: &Uri) -> Option<Self::Output> {
        let url = self.url.decode(uri)?;
        let query = self.query.decode(uri.query().unwrap_or(""))?;
        Some(self.combiner.combine(url, query))
    }

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError> {
        let (url, query) = self.combiner.split(value);
        let mut encoded = self.url.encode(url)?;
        let query = self.query.encode(query)?;
        if !query.is_empty() {
            encoded.push(if encoded.contains('?') { '&' } else { '?' });
            encoded.push_str(&query);
        }
        Ok(encoded)
    }

    fn pattern(&self) -> &str {
        self.url.pattern()
    }
}

/// Appends a query codec to a url codec, merging both values with `combiner`.
macro_rules! impl_with_query {
    ($($ty:ident<$($param:ident),*>),+) => {
        $(
            impl<$($param),*> $ty<$($param),*>
            where
                Self: UrlCodec,
            {
                /// Appends a query codec, merging both values with `combiner`.
                pub fn with_query<Q, C>(self, query: Q, combiner: C) -> WithQuery<Self, Q, C>
                where
                    Q: QueryCodec,
                    C: Combiner<<Self as UrlCodec>::Output, Q::Output>,
                {
                    WithQuery { url: self, query, combiner }
                }
            }
        )+
    };
}

impl_with_query!(Fixed<>, Captures<P>, Segment<T>, WithQuery<U, Q0, C0>);

/// A literal path, e.g. `/health`.
pub fn fixed(pattern: &str) -> Result<Fixed, PatternError> {
    Fixed::new(pattern)
}

/// A path with named captures, e.g. `/users/{user}/files/{*path}`, decoding into the fields of `P`.
pub fn path<P>(pattern: &str) -> Result<Captures<P>, PatternError>
where
    P: Serialize + DeserializeOwned,
{
    Captures::new(pattern)
}

/// A path with a single capture, e.g. `/items/{id}`.
pub fn segment<T>(pattern: &str) -> Result<Segment<T>, PatternError>
where
    T: FromStr + Display,
{
    Segment::new(pattern)
}

pub fn param<T>(name: impl Into<String>) -> Param<T>
where
    T: FromStr + Display,
{
    Param::new(name)
}

pub fn opt_param<T>(name: impl Into<String>) -> OptParam<T>
where
    T: FromStr + Display,
{
    OptParam::new(name)
}

/// The whole query string as one `serde_qs` value.
pub fn params<Q>() -> Params<Q>
where
    Q: Serialize + DeserializeOwned,
{
    Params::new()
}

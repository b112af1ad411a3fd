//! Request protocols: one description of a request, read by the router and written by the client.
//!
//! A [`Request`] is built from a method and an url codec, then optionally given a body codec and
//! a header codec:
//!
//! ```
//! use http::header::AUTHORIZATION;
//! use micro_endpoints::codec::json;
//! use micro_endpoints::combine::Tupled;
//! use micro_endpoints::header::required;
//! use micro_endpoints::request::{RequestProtocol, post};
//! use micro_endpoints::url;
//!
//! // POST /items, decodes to (body, authorization)
//! let create = post(url::fixed("/items").unwrap())
//!     .with_body(json::<String>(), micro_endpoints::combine::UnitLeft)
//!     .with_headers(required(AUTHORIZATION), Tupled);
//! assert_eq!(create.url_for(("pen".into(), "token".into())).unwrap(), "/items");
//! ```
//!
//! On the server side, [`RequestProtocol::decode`] walks a small state machine:
//!
//! 1. wrong method, or the url codec declines: [`Matching::NoMatch`], nothing else runs,
//! 2. the header codec rejects: [`Matching::Rejected`], the request is claimed anyway,
//! 3. otherwise [`Matching::Matched`] with a [`Pending`] value that reads the body when, and
//!    only when, it is awaited.

use crate::body::{RequestBody, WireResponse};
use crate::codec::{BodyCodec, Empty};
use crate::combine::{Combiner, Transform, UnitRight};
use crate::error::EncodeError;
use crate::header::{HeaderCodec, NoHeaders};
use crate::url::UrlCodec;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::Method;
use http::request::Parts;
use std::future::Future;
use std::marker::PhantomData;

/// A request description: method, url, body and headers, merged with two combiners as
/// `combine(combine(url, body), headers)`.
#[derive(Debug, Clone)]
pub struct Request<U, B = Empty, H = NoHeaders, CB = UnitRight, CH = UnitRight> {
    method: Method,
    url: U,
    body: B,
    headers: H,
    body_combiner: CB,
    header_combiner: CH,
}

/// Creates a request matching `method` and `url`, without body nor headers.
pub fn request<U: UrlCodec>(method: Method, url: U) -> Request<U> {
    Request {
        method,
        url,
        body: Empty,
        headers: NoHeaders,
        body_combiner: UnitRight,
        header_combiner: UnitRight,
    }
}

macro_rules! method_request {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Creates a ", stringify!($upper_case_method), " request for `url`.")]
        #[inline]
        pub fn $method<U: UrlCodec>(url: U) -> Request<U> {
            request(Method::$upper_case_method, url)
        }
    };
}

method_request!(get, GET);
method_request!(post, POST);
method_request!(put, PUT);
method_request!(delete, DELETE);
method_request!(patch, PATCH);
method_request!(head, HEAD);
method_request!(options, OPTIONS);

impl<U, B, H, CB, CH> Request<U, B, H, CB, CH> {
    /// Replaces the body codec, merging its value with the url value through `combiner`.
    pub fn with_body<B2, CB2>(self, body: B2, combiner: CB2) -> Request<U, B2, H, CB2, CH>
    where
        U: UrlCodec,
        B2: BodyCodec,
        CB2: Combiner<U::Output, B2::Output>,
    {
        Request {
            method: self.method,
            url: self.url,
            body,
            headers: self.headers,
            body_combiner: combiner,
            header_combiner: self.header_combiner,
        }
    }

    /// Replaces the header codec, merging its value with the url and body value through
    /// `combiner`.
    pub fn with_headers<H2, CH2>(self, headers: H2, combiner: CH2) -> Request<U, B, H2, CB, CH2>
    where
        H2: HeaderCodec,
    {
        Request {
            method: self.method,
            url: self.url,
            body: self.body,
            headers,
            body_combiner: self.body_combiner,
            header_combiner: combiner,
        }
    }
}

/// Outcome of matching one request protocol against an incoming request head.
pub enum Matching<'a, T> {
    /// The protocol does not apply; the next candidate may be tried.
    NoMatch,
    /// The protocol applies but refuses the request. The response is final.
    Rejected(WireResponse),
    /// The protocol applies; the body is still untouched.
    Matched(Pending<'a, T>),
}

impl<'a, T> Matching<'a, T> {
    /// `true` once the protocol owns the request, whether it accepted it or not.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, Matching::NoMatch)
    }

    /// `None` for [`Matching::NoMatch`], the claim outcome otherwise.
    pub fn into_option(self) -> Option<Result<Pending<'a, T>, WireResponse>> {
        match self {
            Matching::NoMatch => None,
            Matching::Rejected(response) => Some(Err(response)),
            Matching::Matched(pending) => Some(Ok(pending)),
        }
    }
}

impl<T> std::fmt::Debug for Matching<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matching::NoMatch => f.write_str("NoMatch"),
            Matching::Rejected(response) => f.debug_tuple("Rejected").field(&response.status()).finish(),
            Matching::Matched(_) => f.write_str("Matched"),
        }
    }
}

type DecodeFn<'a, T> = Box<dyn FnOnce(RequestBody) -> BoxFuture<'a, Result<T, WireResponse>> + Send + 'a>;

/// The deferred half of a match: decodes the body, then merges it with the values already
/// taken from the url and the headers.
///
/// It can run at most once since [`Pending::decode`] takes `self`.
pub struct Pending<'a, T> {
    decode: DecodeFn<'a, T>,
}

impl<'a, T> Pending<'a, T> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(RequestBody) -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, WireResponse>> + Send + 'a,
    {
        Self { decode: Box::new(move |body| Box::pin(f(body))) }
    }

    pub async fn decode(self, body: RequestBody) -> Result<T, WireResponse> {
        (self.decode)(body).await
    }

    pub fn map<V, F>(self, f: F) -> Pending<'a, V>
    where
        T: 'a,
        V: 'a,
        F: FnOnce(T) -> V + Send + 'a,
    {
        Pending::new(move |body| async move { (self.decode)(body).await.map(f) })
    }
}

impl<T> std::fmt::Debug for Pending<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

/// A typed request, readable from an incoming request head and writable as an outgoing request.
pub trait RequestProtocol: Send + Sync {
    type Output: Send;

    fn method(&self) -> &Method;

    /// The url pattern, for logs.
    fn pattern(&self) -> &str;

    fn decode<'a>(&'a self, parts: &Parts) -> Matching<'a, Self::Output>;

    /// Builds the full outgoing request: url, then headers, then body.
    fn encode(&self, value: Self::Output) -> Result<http::Request<Bytes>, EncodeError>;

    /// Reverse routing: the path and query `value` would be decoded from.
    fn url_for(&self, value: Self::Output) -> Result<String, EncodeError>;
}

impl<U, B, H, CB, CH> RequestProtocol for Request<U, B, H, CB, CH>
where
    U: UrlCodec,
    U::Output: Send,
    B: BodyCodec,
    H: HeaderCodec,
    H::Output: Send,
    CB: Combiner<U::Output, B::Output>,
    CH: Combiner<CB::Out, H::Output>,
    CH::Out: Send,
{
    type Output = CH::Out;

    fn method(&self) -> &Method {
        &self.method
    }

    fn pattern(&self) -> &str {
        self.url.pattern()
    }

    fn decode<'a>(&'a self, parts: &Parts) -> Matching<'a, Self::Output> {
        if parts.method != self.method {
            return Matching::NoMatch;
        }
        let Some(url) = self.url.decode(&parts.uri) else {
            return Matching::NoMatch;
        };
        let headers = match self.headers.extract(&parts.headers) {
            Ok(headers) => headers,
            Err(response) => return Matching::Rejected(response),
        };

        Matching::Matched(Pending::new(move |body| async move {
            let body = self.body.decode_body(body).await?;
            let value = self.body_combiner.combine(url, body);
            Ok(self.header_combiner.combine(value, headers))
        }))
    }

    fn encode(&self, value: Self::Output) -> Result<http::Request<Bytes>, EncodeError> {
        let (value, headers) = self.header_combiner.split(value);
        let (url, body) = self.body_combiner.split(value);

        let mut request = http::Request::new(Bytes::new());
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.url.encode(url)?.parse()?;

        self.headers.inject(headers, request.headers_mut())?;

        let (content_type, bytes) = self.body.encode_body(body)?.into_parts();
        if let Some(content_type) = content_type {
            request.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
        }
        *request.body_mut() = bytes;
        Ok(request)
    }

    fn url_for(&self, value: Self::Output) -> Result<String, EncodeError> {
        let (value, _headers) = self.header_combiner.split(value);
        let (url, _body) = self.body_combiner.split(value);
        self.url.encode(url)
    }
}

pub trait RequestProtocolExt: RequestProtocol + Sized {
    /// Exposes `T` instead of `Self::Output`.
    ///
    /// `backward(forward(v)) == v` must hold, reverse routing relies on it.
    fn map<T, F, G>(self, forward: F, backward: G) -> Mapped<Self, F, G, T>
    where
        F: Fn(Self::Output) -> T + Send + Sync,
        G: Fn(T) -> Self::Output + Send + Sync,
        T: Send,
    {
        Mapped { inner: self, transform: Transform::new(forward, backward), _phantom: PhantomData }
    }
}

impl<R: RequestProtocol> RequestProtocolExt for R {}

/// A request protocol whose value goes through a [`Transform`].
pub struct Mapped<R, F, G, T> {
    inner: R,
    transform: Transform<F, G>,
    _phantom: PhantomData<fn() -> T>,
}

impl<R: std::fmt::Debug, F, G, T> std::fmt::Debug for Mapped<R, F, G, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapped").field("inner", &self.inner).finish()
    }
}

impl<R, F, G, T> RequestProtocol for Mapped<R, F, G, T>
where
    R: RequestProtocol,
    F: Fn(R::Output) -> T + Send + Sync,
    G: Fn(T) -> R::Output + Send + Sync,
    T: Send,
{
    type Output = T;

    fn method(&self) -> &Method {
        self.inner.method()
    }

    fn pattern(&self) -> &str {
        self.inner.pattern()
    }

    fn decode<'a>(&'a self, parts: &Parts) -> Matching<'a, Self::Output> {
        match self.inner.decode(parts) {
            Matching::NoMatch => Matching::NoMatch,
            Matching::Rejected(response) => Matching::Rejected(response),
            Matching::Matched(pending) => Matching::Matched(pending.map(|value| self.transform.forward(value))),
        }
    }

    fn encode(&self, value: Self::Output) -> Result<http::Request<Bytes>, EncodeError> {
        self.inner.encode(self.transform.backward(value))
    }

    fn url_for(&self, value: Self::Output) -> Result<String, EncodeError> {
        self.inner.url_for(self.transform.backward(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{json, text};
    use crate::combine::{Tupled, UnitLeft};
    use crate::header::required;
    use crate::url;
    use http::StatusCode;
    use http::header::{AUTHORIZATION, CONTENT_TYPE};

    fn parts(method: Method, uri: &str) -> Parts {
        let (parts, _) = http::Request::builder().method(method).uri(uri).body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn get_with_query() {
        let inc = get(url::fixed("/inc").unwrap().with_query(url::param::<i32>("x"), UnitLeft));

        let Matching::Matched(pending) = inc.decode(&parts(Method::GET, "/inc?x=41")) else {
            panic!("expected a match");
        };
        assert_eq!(pending.decode(RequestBody::empty()).await.unwrap(), 41);

        assert!(!inc.decode(&parts(Method::POST, "/inc?x=41")).is_claimed());
        assert!(!inc.decode(&parts(Method::GET, "/dec?x=41")).is_claimed());
        assert!(!inc.decode(&parts(Method::GET, "/inc?x=forty")).is_claimed());
        assert!(!inc.decode(&parts(Method::GET, "/inc")).is_claimed());
    }

    #[test]
    fn head_is_not_get() {
        let health = get(url::fixed("/health").unwrap());
        assert!(health.decode(&parts(Method::HEAD, "/health")).into_option().is_none());
    }

    #[tokio::test]
    async fn header_rejection_claims_the_request() {
        let items = post(url::fixed("/items").unwrap())
            .with_body(text(), UnitLeft)
            .with_headers(required(AUTHORIZATION).reject_with(StatusCode::UNAUTHORIZED, ""), Tupled);

        match items.decode(&parts(Method::POST, "/items")) {
            Matching::Rejected(response) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
            other => panic!("expected a rejection, got {other:?}"),
        }

        let mut authorized = parts(Method::POST, "/items");
        authorized.headers.insert(AUTHORIZATION, "token".parse().unwrap());
        let pending = items.decode(&authorized).into_option().unwrap().unwrap();
        let value = pending.decode(RequestBody::from("pen")).await.unwrap();
        assert_eq!(value, ("pen".to_string(), "token".to_string()));
    }

    #[tokio::test]
    async fn body_failure_happens_after_the_claim() {
        let items = post(url::fixed("/items").unwrap()).with_body(json::<u32>(), UnitLeft);
        let pending = items.decode(&parts(Method::POST, "/items")).into_option().unwrap().unwrap();
        let response = pending.decode(RequestBody::from("nope")).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn encode_in_order() {
        let items = put(url::segment::<u64>("/items/{id}").unwrap())
            .with_body(json::<String>(), Tupled)
            .with_headers(required(AUTHORIZATION), Tupled);

        let request = items.encode(((7, "pen".to_string()), "token".to_string())).unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "/items/7");
        assert_eq!(request.headers()[AUTHORIZATION], "token");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.body().as_ref(), b"\"pen\"");

        assert_eq!(items.url_for(((7, "ignored".to_string()), "ignored".to_string())).unwrap(), "/items/7");
    }

    #[tokio::test]
    async fn mapped_protocol() {
        #[derive(Debug, PartialEq)]
        struct ItemId(u64);

        let item = get(url::segment::<u64>("/items/{id}").unwrap()).map(ItemId, |ItemId(id)| id);
        assert_eq!(item.url_for(ItemId(3)).unwrap(), "/items/3");

        let pending = item.decode(&parts(Method::GET, "/items/3")).into_option().unwrap().unwrap();
        assert_eq!(pending.decode(RequestBody::empty()).await.unwrap(), ItemId(3));
    }
}

//! The server side: an ordered list of endpoints bound to handlers.
//!
//! Routing is a linear scan in declaration order. Each endpoint's request protocol is asked
//! whether it claims the request; the first endpoint that claims it, by matching or by
//! rejecting, owns the request and no later endpoint is tried. Bodies are only handed to the
//! owner.

use crate::body::{RequestBody, WireResponse};
use crate::codec::ResponseEncoder;
use crate::endpoint::Endpoint;
use crate::error::BoxError;
use crate::handler::Handler;
use crate::rejection::terminal;
use crate::request::{Matching, RequestProtocol};
use bytes::Bytes;
use futures::future::{self, BoxFuture};
use http::StatusCode;
use http::request::Parts;
use http_body::Body as HttpBody;
use tracing::{debug, trace};

type Invoke<'a> = Box<dyn FnOnce(RequestBody) -> BoxFuture<'a, WireResponse> + Send + 'a>;

enum Claim<'a> {
    Rejected(WireResponse),
    Matched(Invoke<'a>),
}

/// An endpoint bound to its handler, with the endpoint types erased.
trait Route: Send + Sync {
    fn method(&self) -> &http::Method;

    fn pattern(&self) -> &str;

    fn claim<'a>(&'a self, parts: &Parts) -> Option<Claim<'a>>;
}

struct Bound<Req, Resp, H> {
    endpoint: Endpoint<Req, Resp>,
    handler: H,
}

impl<Req, Resp, H> Route for Bound<Req, Resp, H>
where
    Req: RequestProtocol,
    Resp: ResponseEncoder,
    H: Handler<Req::Output, Output = Resp::Value>,
{
    fn method(&self) -> &http::Method {
        self.endpoint.request().method()
    }

    fn pattern(&self) -> &str {
        self.endpoint.request().pattern()
    }

    fn claim<'a>(&'a self, parts: &Parts) -> Option<Claim<'a>> {
        match self.endpoint.request().decode(parts) {
            Matching::NoMatch => None,
            Matching::Rejected(response) => Some(Claim::Rejected(response)),
            Matching::Matched(pending) => Some(Claim::Matched(Box::new(move |body| {
                Box::pin(async move {
                    match pending.decode(body).await {
                        Ok(value) => {
                            let output = self.handler.call(value).await;
                            self.endpoint.response().encode_response(output)
                        }
                        Err(response) => response,
                    }
                })
            }))),
        }
    }
}

/// Main router structure, immutable once built and shareable across requests.
pub struct Router {
    routes: Vec<Box<dyn Route>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Finds the endpoint that owns `request`.
    ///
    /// Returns `None` when no endpoint claims it; producing a not found response is then up to
    /// the caller, see [`Router::handle`]. Otherwise the returned future decodes the body, runs
    /// the handler and encodes its result, or resolves straight to the rejection. Dropping the
    /// future cancels the request without encoding anything.
    pub fn route<B>(&self, request: http::Request<B>) -> Option<BoxFuture<'_, WireResponse>>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();

        for (index, route) in self.routes.iter().enumerate() {
            trace!(index, method = %route.method(), pattern = route.pattern(), "probing route");
            match route.claim(&parts) {
                None => {}
                Some(Claim::Rejected(response)) => {
                    debug!(
                        index,
                        method = %parts.method,
                        path = parts.uri.path(),
                        status = %response.status(),
                        "request rejected"
                    );
                    return Some(Box::pin(future::ready(response)));
                }
                Some(Claim::Matched(invoke)) => {
                    debug!(index, method = %parts.method, path = parts.uri.path(), "request matched");
                    return Some(invoke(RequestBody::new(body)));
                }
            }
        }

        debug!(method = %parts.method, path = parts.uri.path(), "no route claims the request");
        None
    }

    /// Like [`Router::route`], answering unclaimed requests with an empty `404 Not Found`.
    pub async fn handle<B>(&self, request: http::Request<B>) -> WireResponse
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        match self.route(request) {
            Some(invocation) => invocation.await,
            None => terminal(StatusCode::NOT_FOUND, ""),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes = self.routes.iter().map(|route| format!("{} {}", route.method(), route.pattern()));
        f.debug_list().entries(routes).finish()
    }
}

#[derive(Default)]
pub struct RouterBuilder {
    routes: Vec<Box<dyn Route>>,
}

impl std::fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder").field("routes", &self.routes.len()).finish()
    }
}

impl RouterBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Appends `endpoint`, served by `handler`. Endpoints are tried in the order they are added.
    pub fn route<Req, Resp, H>(mut self, endpoint: Endpoint<Req, Resp>, handler: H) -> Self
    where
        Req: RequestProtocol + 'static,
        Resp: ResponseEncoder + 'static,
        H: Handler<Req::Output, Output = Resp::Value> + 'static,
    {
        self.routes.push(Box::new(Bound { endpoint, handler }));
        self
    }

    pub fn build(self) -> Router {
        Router { routes: self.routes }
    }
}

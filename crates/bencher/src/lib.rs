use http::Method;
use micro_endpoints::codec::{Text, text};
use micro_endpoints::combine::Tupled;
use micro_endpoints::request::{Request, get};
use micro_endpoints::url::{self, OptParam, Segment, WithQuery};
use micro_endpoints::{Endpoint, RequestBody, Router, endpoint};

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    request: TestRequest,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, request: TestRequest) -> Self {
        Self { name, group, request }
    }

    pub fn small(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Small, request)
    }

    pub fn normal(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Normal, request)
    }

    pub fn large(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Large, request)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn request(&self) -> &TestRequest {
        &self.request
    }

    /// Number of endpoints in the router the case runs against.
    pub fn routes(&self) -> usize {
        match self.group {
            TestGroup::Small => 4,
            TestGroup::Normal => 32,
            TestGroup::Large => 256,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestRequest {
    method: &'static str,
    uri: &'static str,
}

impl TestRequest {
    pub const fn new(method: &'static str, uri: &'static str) -> Self {
        Self { method, uri }
    }

    pub fn to_request(&self) -> http::Request<RequestBody> {
        let mut request = http::Request::new(RequestBody::empty());
        *request.method_mut() = Method::from_bytes(self.method.as_bytes()).unwrap_or(Method::GET);
        *request.uri_mut() = http::Uri::from_static(self.uri);
        request
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

pub type ResourceEndpoint = Endpoint<Request<WithQuery<Segment<u64>, OptParam<String>, Tupled>>, Text>;

/// `GET /resource{index}/{id}?tag=..`
pub fn resource_endpoint(index: usize) -> ResourceEndpoint {
    let path = format!("/resource{index}/{{id}}");
    let segment = url::segment::<u64>(&path).unwrap_or_else(|e| panic!("invalid bench pattern: {e}"));
    endpoint(get(segment.with_query(url::opt_param::<String>("tag"), Tupled)), text())
}

/// A router with `routes` resource endpoints, declared in index order.
pub fn resource_router(routes: usize) -> Router {
    (0..routes)
        .fold(Router::builder(), |builder, index| {
            builder.route(resource_endpoint(index), move |(id, tag): (u64, Option<String>)| async move {
                format!("{index}:{id}:{}", tag.unwrap_or_default())
            })
        })
        .build()
}

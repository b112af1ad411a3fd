use crate::body::RequestBody;
use crate::client::Transport;
use crate::error::TransportError;
use crate::router::Router;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use std::sync::Arc;

/// Dispatches requests straight into a [`Router`], without any socket.
///
/// Requests no endpoint claims get an empty `404 Not Found`, as [`Router::handle`] does.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    router: Arc<Router>,
}

impl LocalTransport {
    pub fn new(router: impl Into<Arc<Router>>) -> Self {
        Self { router: router.into() }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError> {
        let request = request.map(RequestBody::from);
        let response = self.router.handle(request).await;

        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.map_err(TransportError::body)?.to_bytes();
        Ok(http::Response::from_parts(parts, bytes))
    }
}

//! Typed HTTP endpoint descriptions, interpreted as a router and as a client
//!
//! An [`Endpoint`] describes a request (method, url, headers, body) and the shape of its
//! response once. The same value is then used:
//!
//! - by the [`Router`], which matches incoming requests against an ordered list of endpoints,
//!   extracts a typed value and hands it to a handler,
//! - by the [`Client`], which turns a typed value back into a request and decodes the response,
//! - for reverse routing, with [`Endpoint::url_for`].
//!
//! # Features
//!
//! - Url codecs for fixed paths, typed captures and query parameters
//! - Header codecs that reject a request before its body is touched
//! - Json, form, text and raw body codecs with size limits
//! - First-claim-wins routing: an endpoint that matches a request but rejects it still owns it
//! - A plain HTTP/1.1 client transport over tokio, and an in-process one for tests
//!
//! # Example
//!
//! ```
//! use micro_endpoints::client::{Client, LocalTransport};
//! use micro_endpoints::codec::json;
//! use micro_endpoints::combine::UnitLeft;
//! use micro_endpoints::request::get;
//! use micro_endpoints::{Router, endpoint, url};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let inc = || endpoint(get(url::fixed("/inc").unwrap().with_query(url::param::<i32>("x"), UnitLeft)), json::<i32>());
//!
//! let router = Router::builder().route(inc(), |x: i32| async move { x + 1 }).build();
//! let client = Client::new("", LocalTransport::new(router));
//!
//! assert_eq!(inc().url_for(41).unwrap(), "/inc?x=41");
//! assert_eq!(client.issue(&inc(), 41).await.unwrap().unwrap(), 42);
//! # }
//! ```

mod body;
mod handler;
mod rejection;
mod utils;

pub mod client;
pub mod codec;
pub mod combine;
pub mod endpoint;
pub mod error;
pub mod header;
pub mod request;
pub mod router;
pub mod url;

pub use body::{CollectError, RequestBody, ResponseBody, WireResponse};
pub use client::Client;
pub use endpoint::{Endpoint, endpoint};
pub use handler::Handler;
pub use rejection::{Rejection, terminal};
pub use router::Router;

//! Endpoints: a request protocol paired with a response codec.
//!
//! The same [`Endpoint`] value is bound to a handler by the [`Router`](crate::router::Router) and
//! passed to [`Client::issue`](crate::client::Client::issue) by callers, so both sides agree on
//! the url, headers, body and response shape by construction.

use crate::error::EncodeError;
use crate::request::RequestProtocol;

#[derive(Debug, Clone)]
pub struct Endpoint<Req, Resp> {
    request: Req,
    response: Resp,
}

/// Pairs `request` with `response`.
///
/// # Example
/// ```
/// use micro_endpoints::codec::json;
/// use micro_endpoints::combine::UnitLeft;
/// use micro_endpoints::endpoint::endpoint;
/// use micro_endpoints::request::get;
/// use micro_endpoints::url;
///
/// let inc = endpoint(
///     get(url::fixed("/inc").unwrap().with_query(url::param::<i32>("x"), UnitLeft)),
///     json::<i32>(),
/// );
/// assert_eq!(inc.url_for(41).unwrap(), "/inc?x=41");
/// ```
pub fn endpoint<Req, Resp>(request: Req, response: Resp) -> Endpoint<Req, Resp>
where
    Req: RequestProtocol,
{
    Endpoint { request, response }
}

impl<Req, Resp> Endpoint<Req, Resp> {
    pub fn request(&self) -> &Req {
        &self.request
    }

    pub fn response(&self) -> &Resp {
        &self.response
    }
}

impl<Req: RequestProtocol, Resp> Endpoint<Req, Resp> {
    /// The path and query that `value` would be decoded from.
    pub fn url_for(&self, value: Req::Output) -> Result<String, EncodeError> {
        self.request.url_for(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{empty, text};
    use crate::combine::Tupled;
    use crate::request::{delete, get};
    use crate::url;

    #[test]
    fn reverse_routing_encodes_captures() {
        let file = endpoint(get(url::segment::<String>("/files/{*path}").unwrap()), text());
        assert_eq!(file.url_for("docs/read me.txt".into()).unwrap(), "/files/docs/read%20me.txt");
    }

    #[test]
    fn reverse_routing_with_query() {
        let remove = endpoint(
            delete(url::segment::<u64>("/items/{id}").unwrap().with_query(url::opt_param::<bool>("force"), Tupled)),
            empty(),
        );
        assert_eq!(remove.url_for((7, None)).unwrap(), "/items/7");
        assert_eq!(remove.url_for((7, Some(true))).unwrap(), "/items/7?force=true");
    }
}

use crate::body::WireResponse;
use crate::error::EncodeError;
use crate::header::HeaderCodec;
use crate::rejection::Rejection;
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::{HeaderMap, HeaderValue, StatusCode};

/// Username and password carried by an `Authorization: Basic ..` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

/// HTTP Basic authentication.
///
/// Missing or malformed credentials are rejected with `401 Unauthorized` and a
/// `WWW-Authenticate` challenge for the configured realm. Checking the credentials is left to
/// the handler.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    rejection: Rejection,
}

pub fn basic_auth(realm: &str) -> BasicAuth {
    let challenge = format!("Basic realm=\"{}\"", realm.replace('"', "'"));
    let mut rejection = Rejection::new(StatusCode::UNAUTHORIZED, "");
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        rejection = rejection.with_header(WWW_AUTHENTICATE, value);
    }
    BasicAuth { rejection }
}

fn parse(value: &HeaderValue) -> Option<Credentials> {
    let value = value.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = String::from_utf8(base64::decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::new(username, password))
}

impl HeaderCodec for BasicAuth {
    type Output = Credentials;

    fn extract(&self, headers: &HeaderMap) -> Result<Self::Output, WireResponse> {
        headers.get(AUTHORIZATION).and_then(parse).ok_or_else(|| self.rejection.to_response())
    }

    fn inject(&self, value: Self::Output, headers: &mut HeaderMap) -> Result<(), EncodeError> {
        if value.username.contains(':') {
            return Err(EncodeError::header("basic auth username can't contain ':'"));
        }
        let encoded = base64::encode(format!("{}:{}", value.username, value.password));
        let header = HeaderValue::from_str(&format!("Basic {encoded}")).map_err(EncodeError::header)?;
        headers.insert(AUTHORIZATION, header);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_header() {
        let mut headers = HeaderMap::new();
        // "Aladdin:open sesame"
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="));
        let credentials = basic_auth("api").extract(&headers).unwrap();
        assert_eq!(credentials, Credentials::new("Aladdin", "open sesame"));
    }

    #[test]
    fn inject_then_extract() {
        let codec = basic_auth("api");
        let mut headers = HeaderMap::new();
        codec.inject(Credentials::new("user", "p:ss"), &mut headers).unwrap();
        assert_eq!(codec.extract(&headers).unwrap(), Credentials::new("user", "p:ss"));
    }

    #[test]
    fn missing_or_wrong_scheme_is_challenged() {
        let codec = basic_auth("api");

        let response = codec.extract(&HeaderMap::new()).unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Basic realm=\"api\"");

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(codec.extract(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        assert!(codec.extract(&headers).is_err());
    }

    #[test]
    fn username_with_colon_cannot_be_sent() {
        let mut headers = HeaderMap::new();
        assert!(basic_auth("api").inject(Credentials::new("a:b", "c"), &mut headers).is_err());
    }
}

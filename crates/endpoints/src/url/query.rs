use crate::error::EncodeError;
use crate::url::QueryCodec;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

fn find_param(query: &str, name: &str) -> Option<Option<String>> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    Some(pairs.into_iter().find(|(key, _)| key == name).map(|(_, value)| value))
}

fn encode_param(name: &str, value: String) -> Result<String, EncodeError> {
    serde_urlencoded::to_string(vec![(name, value)]).map_err(EncodeError::url)
}

/// A single required query parameter.
#[derive(Debug)]
pub struct Param<T> {
    name: String,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Param<T> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), _phantom: PhantomData }
    }
}

impl<T> QueryCodec for Param<T>
where
    T: FromStr + Display,
{
    type Output = T;

    fn decode(&self, query: &str) -> Option<Self::Output> {
        find_param(query, &self.name)??.parse().ok()
    }

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError> {
        encode_param(&self.name, value.to_string())
    }
}

/// A single optional query parameter.
///
/// A missing parameter decodes to `Some(None)`, a present but unparsable one doesn't match.
#[derive(Debug)]
pub struct OptParam<T> {
    name: String,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> OptParam<T> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), _phantom: PhantomData }
    }
}

impl<T> QueryCodec for OptParam<T>
where
    T: FromStr + Display,
{
    type Output = Option<T>;

    fn decode(&self, query: &str) -> Option<Self::Output> {
        match find_param(query, &self.name)? {
            Some(value) => value.parse().ok().map(Some),
            None => Some(None),
        }
    }

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError> {
        match value {
            Some(value) => encode_param(&self.name, value.to_string()),
            None => Ok(String::new()),
        }
    }
}

/// The whole query string, deserialized with `serde_qs`.
#[derive(Debug)]
pub struct Params<Q> {
    _phantom: PhantomData<fn() -> Q>,
}

impl<Q> Params<Q> {
    pub(crate) fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

impl<Q> QueryCodec for Params<Q>
where
    Q: Serialize + DeserializeOwned,
{
    type Output = Q;

    fn decode(&self, query: &str) -> Option<Self::Output> {
        serde_qs::from_str(query).ok()
    }

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError> {
        serde_qs::to_string(&value).map_err(EncodeError::url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Page {
        offset: u32,
        limit: u32,
    }

    #[test]
    fn param_decode() {
        let x = Param::<i32>::new("x");
        assert_eq!(x.decode("x=41"), Some(41));
        assert_eq!(x.decode("y=1&x=-3"), Some(-3));
        assert_eq!(x.decode("x=abc"), None);
        assert_eq!(x.decode(""), None);
    }

    #[test]
    fn param_encode_escapes_value() {
        let q = Param::<String>::new("q");
        assert_eq!(q.encode("a b&c".into()).unwrap(), "q=a+b%26c");
        assert_eq!(q.decode("q=a+b%26c"), Some("a b&c".to_string()));
    }

    #[test]
    fn opt_param() {
        let tag = OptParam::<u8>::new("tag");
        assert_eq!(tag.decode(""), Some(None));
        assert_eq!(tag.decode("tag=3"), Some(Some(3)));
        assert_eq!(tag.decode("tag=300"), None);
        assert_eq!(tag.encode(None).unwrap(), "");
        assert_eq!(tag.encode(Some(3)).unwrap(), "tag=3");
    }

    #[test]
    fn params_round_trip() {
        let page = Params::<Page>::new();
        let encoded = page.encode(Page { offset: 20, limit: 10 }).unwrap();
        assert_eq!(page.decode(&encoded), Some(Page { offset: 20, limit: 10 }));
        assert_eq!(page.decode("offset=1"), None);
    }
}

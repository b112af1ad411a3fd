use crate::error::{EncodeError, PatternError};
use crate::url::UrlCodec;
use crate::url::percent::{decode_segment, encode_segment, is_path_char};
use http::Uri;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Capture { name: String, catch_all: bool },
}

/// A parsed path pattern such as `/users/{id}/files/{*path}`.
///
/// Matching goes through `matchit`, rendering walks the parsed pieces.
struct Template {
    pattern: String,
    pieces: Vec<Piece>,
    matcher: matchit::Router<()>,
}

impl Template {
    fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::invalid(pattern, "must start with '/'"));
        }

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    let (name, catch_all) = match name.strip_prefix('*') {
                        Some(rest) => (rest.to_string(), true),
                        None => (name, false),
                    };
                    if !closed || name.is_empty() || name.contains('{') {
                        return Err(PatternError::invalid(pattern, "empty or unterminated capture"));
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Capture { name, catch_all });
                }
                '}' => return Err(PatternError::invalid(pattern, "unbalanced '}'")),
                c if is_path_char(c) => literal.push(c),
                c => return Err(PatternError::invalid(pattern, format!("'{c}' must be percent-encoded"))),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        let mut matcher = matchit::Router::new();
        matcher.insert(pattern, ()).map_err(|e| PatternError::invalid(pattern, e))?;

        Ok(Self { pattern: pattern.to_string(), pieces, matcher })
    }

    fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Capture { name, .. } => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Matches `path` and returns the percent-decoded captures, in pattern order.
    fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let matched = self.matcher.at(path).ok()?;
        matched.params.iter().map(|(name, value)| Some((name.to_string(), decode_segment(value)?))).collect()
    }

    fn render<'v, F>(&self, mut lookup: F) -> Result<String, EncodeError>
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        let mut out = String::with_capacity(self.pattern.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(literal) => out.push_str(literal),
                Piece::Capture { name, catch_all } => {
                    let value = lookup(name).ok_or_else(|| EncodeError::url(format!("no value for capture '{name}'")))?;
                    if value.is_empty() {
                        return Err(EncodeError::url(format!("empty value for capture '{name}'")));
                    }
                    if *catch_all {
                        let segments = value.split('/').map(encode_segment).collect::<Vec<_>>();
                        out.push_str(&segments.join("/"));
                    } else {
                        out.push_str(&encode_segment(value));
                    }
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("pattern", &self.pattern).field("pieces", &self.pieces).finish()
    }
}

/// A path without captures, decoding to `()`.
#[derive(Debug)]
pub struct Fixed {
    template: Template,
}

impl Fixed {
    pub(crate) fn new(pattern: &str) -> Result<Self, PatternError> {
        let template = Template::parse(pattern)?;
        if template.capture_names().next().is_some() {
            return Err(PatternError::invalid(pattern, "a fixed path can't have captures"));
        }
        Ok(Self { template })
    }
}

impl UrlCodec for Fixed {
    type Output = ();

    fn decode(&self, uri: &Uri) -> Option<Self::Output> {
        self.template.matcher.at(uri.path()).ok().map(|_| ())
    }

    fn encode(&self, _value: Self::Output) -> Result<String, EncodeError> {
        Ok(self.template.pattern.clone())
    }

    fn pattern(&self) -> &str {
        &self.template.pattern
    }
}

/// A path whose named captures deserialize into the fields of `P`.
///
/// Captures go through `serde_urlencoded`, so `P` is usually a flat struct whose field names
/// are the capture names.
pub struct Captures<P> {
    template: Template,
    _phantom: PhantomData<fn() -> P>,
}

impl<P> Captures<P> {
    pub(crate) fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self { template: Template::parse(pattern)?, _phantom: PhantomData })
    }
}

impl<P> std::fmt::Debug for Captures<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Captures").field("template", &self.template).finish()
    }
}

impl<P> UrlCodec for Captures<P>
where
    P: Serialize + DeserializeOwned,
{
    type Output = P;

    fn decode(&self, uri: &Uri) -> Option<Self::Output> {
        let captures = self.template.captures(uri.path())?;
        let form = serde_urlencoded::to_string(&captures).ok()?;
        serde_urlencoded::from_str(&form).ok()
    }

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError> {
        let form = serde_urlencoded::to_string(&value).map_err(EncodeError::url)?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&form).map_err(EncodeError::url)?;
        self.template
            .render(|name| pairs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str()))
    }

    fn pattern(&self) -> &str {
        &self.template.pattern
    }
}

/// A path with exactly one capture, parsed with [`FromStr`] and rendered with [`Display`].
pub struct Segment<T> {
    template: Template,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Segment<T> {
    pub(crate) fn new(pattern: &str) -> Result<Self, PatternError> {
        let template = Template::parse(pattern)?;
        if template.capture_names().count() != 1 {
            return Err(PatternError::invalid(pattern, "a segment path needs exactly one capture"));
        }
        Ok(Self { template, _phantom: PhantomData })
    }
}

impl<T> std::fmt::Debug for Segment<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment").field("template", &self.template).finish()
    }
}

impl<T> UrlCodec for Segment<T>
where
    T: FromStr + Display,
{
    type Output = T;

    fn decode(&self, uri: &Uri) -> Option<Self::Output> {
        let mut captures = self.template.captures(uri.path())?;
        let (_, value) = captures.pop()?;
        value.parse().ok()
    }

    fn encode(&self, value: Self::Output) -> Result<String, EncodeError> {
        let value = value.to_string();
        self.template.render(|_| Some(value.as_str()))
    }

    fn pattern(&self) -> &str {
        &self.template.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct FileRef {
        user: u64,
        path: String,
    }

    fn uri(s: &'static str) -> Uri {
        Uri::from_static(s)
    }

    #[test]
    fn parse_rejects_bad_patterns() {
        assert!(Template::parse("no-slash").is_err());
        assert!(Template::parse("/a/{}").is_err());
        assert!(Template::parse("/a/{id").is_err());
        assert!(Template::parse("/a/id}").is_err());
        assert!(Template::parse("/a b").is_err());
        assert!(Template::parse("/a?b").is_err());
        assert!(Template::parse("/caf\u{e9}").is_err());
        assert!(Fixed::new("/a/{id}").is_err());
        assert!(Segment::<u32>::new("/a/{x}/{y}").is_err());
    }

    #[test]
    fn fixed_matches_exact_path_only() {
        let fixed = Fixed::new("/inc").unwrap();
        assert_eq!(fixed.decode(&uri("/inc")), Some(()));
        assert_eq!(fixed.decode(&uri("/inc?x=1")), Some(()));
        assert_eq!(fixed.decode(&uri("/inc/")), None);
        assert_eq!(fixed.decode(&uri("/dec")), None);
        assert_eq!(fixed.encode(()).unwrap(), "/inc");
    }

    #[test]
    fn fixed_escaped_literal_matches_wire_path() {
        let fixed = Fixed::new("/a%20b").unwrap();
        assert_eq!(fixed.decode(&uri("/a%20b")), Some(()));

        let encoded = fixed.encode(()).unwrap();
        assert!(encoded.parse::<Uri>().is_ok());
        assert!(Fixed::new("/a b").is_err());
    }

    #[test]
    fn captures_decode_into_struct() {
        let codec = Captures::<FileRef>::new("/users/{user}/files/{*path}").unwrap();
        let decoded = codec.decode(&uri("/users/7/files/docs/read%20me.txt")).unwrap();
        assert_eq!(decoded, FileRef { user: 7, path: "docs/read me.txt".into() });

        assert_eq!(codec.decode(&uri("/users/x/files/a")), None);
        assert_eq!(codec.decode(&uri("/users/7")), None);
    }

    #[test]
    fn captures_round_trip() {
        let codec = Captures::<FileRef>::new("/users/{user}/files/{*path}").unwrap();
        let value = FileRef { user: 42, path: "a b/c&d+e".into() };
        let encoded = codec.encode(value).unwrap();
        assert_eq!(encoded, "/users/42/files/a%20b/c%26d%2Be");

        let uri: Uri = encoded.parse().unwrap();
        assert_eq!(codec.decode(&uri), Some(FileRef { user: 42, path: "a b/c&d+e".into() }));
    }

    #[test]
    fn empty_capture_value_is_an_encode_error() {
        let codec = Captures::<FileRef>::new("/users/{user}/files/{*path}").unwrap();
        assert!(codec.encode(FileRef { user: 1, path: String::new() }).is_err());
    }

    #[test]
    fn segment_round_trip() {
        let codec = Segment::<u32>::new("/items/{id}").unwrap();
        assert_eq!(codec.decode(&uri("/items/12")), Some(12));
        assert_eq!(codec.decode(&uri("/items/-1")), None);
        assert_eq!(codec.encode(12).unwrap(), "/items/12");
        assert_eq!(codec.pattern(), "/items/{id}");
    }
}

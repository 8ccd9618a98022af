//! URI normalization.
//!
//! [`UriProcessor`] is an immutable value: every operation appends a
//! transformed fragment and returns a new processor, so a base value can
//! be forked into independent chains.
//!
//! ```text
//!   UriProcessor::new("HTTP://Api")
//!       .literal("/Users/")      ──→ "http://api/users/"
//!       .encode("Ada Lovelace")  ──→ "http://api/users/ada%20lovelace"
//! ```
//!
//! The whole value is lowercased after every step, including any
//! percent-escapes produced by encoding (`%7B` becomes `%7b`).

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Bytes left untouched by [`UriProcessor::encode`]: unreserved characters and `/`.
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Bytes left untouched by [`UriProcessor::encode_plus`]: unreserved characters only.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A lowercased URI built from chained transformations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UriProcessor {
    uri: String,
}

impl UriProcessor {
    /// Create a processor starting from `uri`, lowercased.
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self {
            uri: uri.as_ref().to_lowercase(),
        }
    }

    fn append(&self, fragment: &str) -> Self {
        let mut joined = String::with_capacity(self.uri.len() + fragment.len());
        joined.push_str(&self.uri);
        joined.push_str(fragment);
        Self::new(joined)
    }

    /// Append `fragment` without percent processing.
    pub fn literal(&self, fragment: &str) -> Self {
        self.append(fragment)
    }

    /// Append the percent-encoding of `fragment`. Spaces become `%20`; `/` is kept.
    pub fn encode(&self, fragment: &str) -> Self {
        self.append(&utf8_percent_encode(fragment, PATH).to_string())
    }

    /// Append the percent-decoding of `fragment`.
    ///
    /// Malformed escapes are kept verbatim and invalid UTF-8 is replaced
    /// with `U+FFFD`.
    pub fn decode(&self, fragment: &str) -> Self {
        self.append(&percent_decode_str(fragment).decode_utf8_lossy())
    }

    /// Append a form-style encoding of `fragment`: spaces become `+` and `/` is escaped.
    pub fn encode_plus(&self, fragment: &str) -> Self {
        let encoded: Vec<String> = fragment
            .split(' ')
            .map(|part| utf8_percent_encode(part, FORM).to_string())
            .collect();
        self.append(&encoded.join("+"))
    }

    /// Append a form-style decoding of `fragment`: `+` becomes a space, then `%XX` is decoded.
    pub fn decode_plus(&self, fragment: &str) -> Self {
        let spaced = fragment.replace('+', " ");
        self.append(&percent_decode_str(&spaced).decode_utf8_lossy())
    }

    /// The normalized URI.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Consume the processor, returning the normalized URI.
    pub fn into_string(self) -> String {
        self.uri
    }
}

impl AsRef<str> for UriProcessor {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for UriProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl From<UriProcessor> for String {
    fn from(p: UriProcessor) -> Self {
        p.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let encoded = UriProcessor::default().encode("foo and bar/{baz}");
        assert_eq!(encoded.as_str(), "foo%20and%20bar/%7bbaz%7d");
    }

    #[test]
    fn test_literal_is_not_processed() {
        let uri = UriProcessor::new("abc").literal(": and :");
        assert_eq!(uri.as_str(), "abc: and :");
    }

    #[test]
    fn test_decode() {
        let decoded = UriProcessor::default().decode("foo%20and%20bar/%7bbaz%7d");
        assert_eq!(decoded.as_str(), "foo and bar/{baz}");
    }

    #[test]
    fn test_decode_keeps_malformed_escapes() {
        let decoded = UriProcessor::default().decode("100%zz%4");
        assert_eq!(decoded.as_str(), "100%zz%4");
    }

    #[test]
    fn test_normalized_to_lowercase() {
        assert_eq!(UriProcessor::new("FU/baR/baz%2A").as_str(), "fu/bar/baz%2a");
        assert_eq!(
            UriProcessor::default().decode("FU/baR/baz%2A").as_str(),
            "fu/bar/baz*"
        );
    }

    #[test]
    fn test_plus_forms() {
        let p = UriProcessor::default();
        assert_eq!(p.encode_plus("foo and bar").as_str(), "foo+and+bar");
        assert_eq!(p.encode_plus("a/b c").as_str(), "a%2fb+c");
        assert_eq!(p.decode_plus("foo+and+bar").as_str(), "foo and bar");
        assert_eq!(p.decode_plus("foo+%2B+bar").as_str(), "foo + bar");
    }

    #[test]
    fn test_chainable() {
        let uri = UriProcessor::default()
            .encode("foo")
            .encode("/bar")
            .decode("%20")
            .encode("and")
            .decode("%20")
            .encode("baz ");
        assert_eq!(uri.as_str(), "foo/bar and baz%20");
    }

    #[test]
    fn test_receiver_not_mutated() {
        let base = UriProcessor::new("abc");
        let def = base.encode("/def");
        let ghi = def.encode("/ghi");
        let jkl = base.encode("/jkl");
        assert_eq!(base.as_str(), "abc");
        assert_eq!(def.as_str(), "abc/def");
        assert_eq!(ghi.as_str(), "abc/def/ghi");
        assert_eq!(jkl.as_str(), "abc/jkl");
    }

    #[test]
    fn test_round_trip_unreserved_ascii() {
        for s in ["Hello", "a b c", "Path/To/Thing", "x-y_z.w~"] {
            let encoded = UriProcessor::default().encode(s);
            let decoded = UriProcessor::default().decode(encoded.as_str());
            assert_eq!(decoded.as_str(), s.to_lowercase());
        }
    }

    #[test]
    fn test_into_string() {
        let uri = UriProcessor::new("/Users/").encode("Ada");
        assert_eq!(uri.to_string(), "/users/ada");
        assert_eq!(String::from(uri.clone()), "/users/ada");
        assert_eq!(uri.into_string(), "/users/ada");
    }

    #[test]
    fn test_non_ascii_encoded_as_utf8() {
        assert_eq!(UriProcessor::default().encode("é").as_str(), "%c3%a9");
    }
}

//! Link and curie objects.
//!
//! A [`Link`] is the value stored under `_links[rel]`. Curies are links
//! stored under the `curies` relation, identified by `name` and always
//! `templated: true`.
//!
//! `href` is lowercased on every construction path, deserialization
//! included, and is only readable through [`Link::href`]. Optional fields
//! are omitted from JSON when absent.

use serde::{Deserialize, Deserializer, Serialize};

/// Optional link fields accepted by name through [`LinkOptions::with_field`].
pub const LINK_FIELDS: [&str; 5] = ["name", "hreflang", "title", "profile", "deprecation"];

/// A HAL link object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(deserialize_with = "lowercase")]
    pub(crate) href: String,
    /// Whether `href` is a URI template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    /// Media type hint for the target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Secondary key for selecting among links of one relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Language of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Profile URI of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Deprecation notice URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,
}

impl Link {
    /// Create a bare link; `href` is lowercased.
    pub fn new(href: impl AsRef<str>) -> Self {
        Self {
            href: href.as_ref().to_lowercase(),
            templated: None,
            media_type: None,
            name: None,
            hreflang: None,
            title: None,
            profile: None,
            deprecation: None,
        }
    }

    /// Build a link from `options`.
    pub fn with_options(href: impl AsRef<str>, options: LinkOptions) -> Self {
        Self {
            templated: options.templated,
            media_type: options.media_type,
            name: options.name,
            hreflang: options.hreflang,
            title: options.title,
            profile: options.profile,
            deprecation: options.deprecation,
            ..Self::new(href)
        }
    }

    /// Create a curie: named and always templated.
    pub fn curie(name: impl Into<String>, href: impl AsRef<str>) -> Self {
        Self {
            templated: Some(true),
            name: Some(name.into()),
            ..Self::new(href)
        }
    }

    /// Returns `true` if this link carries `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Target URI (lowercased).
    pub fn href(&self) -> &str {
        &self.href
    }
}

fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|href| href.to_lowercase())
}

/// Options for [`Resource::add_link_with`](crate::Resource::add_link_with).
///
/// The default records `templated: false`. Use [`LinkOptions::untemplated`]
/// to leave the flag out of the link entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    /// `Some(flag)` records the flag; `None` omits it.
    pub templated: Option<bool>,
    /// Stored as the link's `type`.
    pub media_type: Option<String>,
    /// Link name.
    pub name: Option<String>,
    /// Target language.
    pub hreflang: Option<String>,
    /// Human-readable label.
    pub title: Option<String>,
    /// Profile URI.
    pub profile: Option<String>,
    /// Deprecation notice URL.
    pub deprecation: Option<String>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            templated: Some(false),
            media_type: None,
            name: None,
            hreflang: None,
            title: None,
            profile: None,
            deprecation: None,
        }
    }
}

impl LinkOptions {
    /// Create default options (`templated: false`, nothing else).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the templated flag.
    pub fn templated(mut self, templated: bool) -> Self {
        self.templated = Some(templated);
        self
    }

    /// Omit the templated flag from the link.
    pub fn untemplated(mut self) -> Self {
        self.templated = None;
        self
    }

    /// Set the media type (`type`).
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Set the link name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the target language.
    pub fn with_hreflang(mut self, hreflang: impl Into<String>) -> Self {
        self.hreflang = Some(hreflang.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the profile URI.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the deprecation URL.
    pub fn with_deprecation(mut self, deprecation: impl Into<String>) -> Self {
        self.deprecation = Some(deprecation.into());
        self
    }

    /// Set one of [`LINK_FIELDS`] by name. Any other key is ignored.
    pub fn with_field(self, key: &str, value: impl Into<String>) -> Self {
        match key {
            "name" => self.with_name(value),
            "hreflang" => self.with_hreflang(value),
            "title" => self.with_title(value),
            "profile" => self.with_profile(value),
            "deprecation" => self.with_deprecation(value),
            _ => {
                tracing::debug!(field = key, "ignoring unrecognized link field");
                self
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_href_lowercased() {
        assert_eq!(Link::new("http://EXAMPLE.com/Page").href, "http://example.com/page");
    }

    #[test]
    fn test_default_options_record_templated_false() {
        let link = Link::with_options("x", LinkOptions::default());
        assert_eq!(serde_json::to_value(&link).unwrap(), json!({"href": "x", "templated": false}));
    }

    #[test]
    fn test_untemplated_omits_flag() {
        let link = Link::with_options("x", LinkOptions::new().untemplated());
        assert_eq!(serde_json::to_value(&link).unwrap(), json!({"href": "x"}));
    }

    #[test]
    fn test_full_link_serialization() {
        let options = LinkOptions::new()
            .templated(true)
            .with_media_type("application/hal+json")
            .with_name("nav")
            .with_hreflang("en")
            .with_title("Next page")
            .with_profile("http://example.com/profile")
            .with_deprecation("http://example.com/deprecated");
        let link = Link::with_options("http://example.com/{page}", options);
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({
                "href": "http://example.com/{page}",
                "templated": true,
                "type": "application/hal+json",
                "name": "nav",
                "hreflang": "en",
                "title": "Next page",
                "profile": "http://example.com/profile",
                "deprecation": "http://example.com/deprecated",
            })
        );
    }

    #[test]
    fn test_with_field_ignores_unknown_keys() {
        let options = LinkOptions::new()
            .with_field("title", "Home")
            .with_field("color", "blue")
            .with_field("href", "ignored");
        assert_eq!(options.title.as_deref(), Some("Home"));
        assert_eq!(options, LinkOptions::new().with_title("Home"));
    }

    #[test]
    fn test_with_field_accepts_every_link_field() {
        for field in LINK_FIELDS {
            let options = LinkOptions::new().with_field(field, "v");
            assert_ne!(options, LinkOptions::new(), "field {field} was ignored");
        }
    }

    #[test]
    fn test_deserialized_href_lowercased() {
        let link: Link =
            serde_json::from_value(json!({"href": "/Orders/{ID}", "name": "Find"})).unwrap();
        assert_eq!(link.href(), "/orders/{id}");
        assert_eq!(link.name.as_deref(), Some("Find"));
    }

    #[test]
    fn test_curie() {
        let curie = Link::curie("acme", "HTTP://Docs.Acme.com/{ref}");
        assert!(curie.is_named("acme"));
        assert_eq!(curie.templated, Some(true));
        assert_eq!(curie.href, "http://docs.acme.com/{ref}");
    }
}

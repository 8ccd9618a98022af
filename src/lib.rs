//! HAL Resource — builder for `application/hal+json` documents
//!
//! This crate builds and queries HAL (Hypertext Application Language)
//! documents: JSON representations carrying hyperlinks (`_links`),
//! embedded sub-resources (`_embedded`), curies, and plain properties.
//!
//! # Overview
//!
//! - [`Resource`]: fluent add/get/delete operations on one document
//! - [`Document`]: the shared document handle, serializable with `serde`
//! - [`Link`] / [`LinkOptions`] for link and curie objects
//! - [`UriProcessor`] for composing lowercased, percent-processed hrefs
//! - [`HalError`] with NotFound and Validation categories
//!
//! # Example
//!
//! ```
//! use hal_resource::{HalResult, LinkOptions, Resource};
//! use serde_json::json;
//!
//! fn order() -> HalResult<serde_json::Value> {
//!     let customer = Resource::new();
//!     customer.add_link("self", "/Customers/7")?.add_prop("name", "Ada")?;
//!
//!     let order = Resource::new();
//!     order
//!         .add_link("self", "/Orders/1")?
//!         .add_link_with("next", "/orders/{page}", LinkOptions::new().templated(true))?
//!         .add_curie("acme", "http://docs.acme.com/{ref}")?
//!         .add_prop("total", 30)?
//!         .add_embedded("customer", &customer)?;
//!     order.to_json()
//! }
//!
//! let doc = order().unwrap();
//! assert_eq!(doc["_links"]["self"][0], json!({"href": "/orders/1", "templated": false}));
//! assert_eq!(doc["_embedded"]["customer"][0]["name"], json!("Ada"));
//! ```
//!
//! # Sharing
//!
//! Documents are aliased, never implicitly copied: embedding a resource,
//! adopting one, or cloning a handle all point at the same mapping.
//!
//! ```text
//!   Resource ──→ Document ←── Resource::adopt(&r)
//!                    ↑
//!        parent._embedded[rel][i]
//! ```

pub mod document;
pub mod error;
pub mod link;
pub mod resource;
pub mod uri;

pub use document::{Document, DocumentSource, EMBEDDED, Embedded, LINKS, Links, RESERVED_NAMES};
pub use error::{HalError, HalResult};
pub use link::{LINK_FIELDS, Link, LinkOptions};
pub use resource::{CURIES_REL, MEDIA_TYPE, REF_PLACEHOLDER, Resource};
pub use uri::UriProcessor;

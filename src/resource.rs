//! Fluent HAL resource builder.
//!
//! [`Resource`] wraps a shared [`Document`] and exposes typed operations
//! for links, curies, properties, and embedded resources. Every mutation
//! takes `&self` and returns `HalResult<&Self>`, so calls chain with `?`:
//!
//! ```text
//!   Resource::new()
//!       .add_link("self", "/orders/1")?
//!       .add_curie("acme", "http://docs.acme.com/{ref}")?
//!       .add_prop("total", 30)?
//!       .add_embedded("customer", &customer)?
//! ```
//!
//! ## Method table
//!
//! | Section | Add | Get | Delete |
//! |---------|-----|-----|--------|
//! | `_links` | `add_link`, `add_link_with` | `get_links`, `get_named_link` | `del_link`, `del_named_link` |
//! | curies | `add_curie`, `add_curie_with` | `get_curie` | `del_curie` |
//! | properties | `add_prop` | `get_prop` | `del_prop` |
//! | `_embedded` | `add_embedded` | `get_embedded` | `del_embedded` |
//!
//! Lookups fail with a NotFound error; deletions are no-ops on absence.
//!
//! ## Aliasing
//!
//! Cloning a `Resource`, wrapping one with [`Resource::adopt`], or
//! embedding one all share the same document. Use
//! [`Resource::deep_clone`] for an isolated copy.

use std::cell::RefMut;

use serde_json::Value;

use crate::document::{Document, DocumentSource, EMBEDDED, Embedded, LINKS, Links, RESERVED_NAMES};
use crate::error::{HalError, HalResult};
use crate::link::{Link, LinkOptions};
use crate::uri::UriProcessor;

/// Media type of the produced documents.
pub const MEDIA_TYPE: &str = "application/hal+json";

/// Relation under which curies are stored.
pub const CURIES_REL: &str = "curies";

/// Placeholder a strict curie href must contain.
pub const REF_PLACEHOLDER: &str = "{ref}";

/// A HAL resource: a handle onto a shared [`Document`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    document: Document,
}

impl Resource {
    /// Create a resource with an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing document or another resource's document, by reference.
    pub fn adopt(source: impl Into<DocumentSource>) -> Self {
        Self {
            document: source.into().into_document(),
        }
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// A resource over an independent deep copy of this document.
    pub fn deep_clone(&self) -> Self {
        Self {
            document: self.document.deep_clone(),
        }
    }

    /// An empty [`UriProcessor`] for composing hrefs.
    pub fn uri() -> UriProcessor {
        UriProcessor::default()
    }

    /// Render the document as JSON.
    pub fn to_json(&self) -> HalResult<Value> {
        Ok(serde_json::to_value(&self.document)?)
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Live view of `_links`, created empty on first access.
    ///
    /// # Panics
    ///
    /// Calling any other operation on this document while the view is
    /// held panics; drop it first.
    ///
    /// The view bypasses the typed operations: relation names are not
    /// checked for emptiness. `href`s stay lowercased because [`Link`]
    /// only exposes them through its constructors.
    pub fn links(&self) -> RefMut<'_, Links> {
        RefMut::map(self.document.node_mut(), |node| {
            node.links.get_or_insert_with(Links::default)
        })
    }

    /// Live view of `_links.curies`, created empty on first access.
    ///
    /// Same borrowing rules as [`Resource::links`]. Curie names are only
    /// kept unique by [`Resource::add_curie`]. A link pushed here under an
    /// existing name is kept as a duplicate, and [`Resource::get_curie`]
    /// returns the first match.
    pub fn curies(&self) -> RefMut<'_, Vec<Link>> {
        RefMut::map(self.links(), |links| {
            links.entry(CURIES_REL.to_string()).or_default()
        })
    }

    /// Live view of `_embedded`, created empty on first access.
    ///
    /// Same borrowing rules as [`Resource::links`]. Unlike
    /// [`Resource::add_embedded`], pushing through the view is not checked
    /// for cycles; a cyclic document fails to serialize with an error.
    pub fn embedded(&self) -> RefMut<'_, Embedded> {
        RefMut::map(self.document.node_mut(), |node| {
            node.embedded.get_or_insert_with(Embedded::default)
        })
    }

    // ── Links ────────────────────────────────────────────────────────

    /// Append a link with `templated: false`.
    pub fn add_link(&self, rel: &str, uri: impl AsRef<str>) -> HalResult<&Self> {
        self.add_link_with(rel, uri, LinkOptions::default())
    }

    /// Append a link built from `options`. Links under one relation are never deduplicated.
    pub fn add_link_with(
        &self,
        rel: &str,
        uri: impl AsRef<str>,
        options: LinkOptions,
    ) -> HalResult<&Self> {
        if rel.is_empty() {
            return Err(HalError::EmptyRelation);
        }
        let link = Link::with_options(uri, options);
        tracing::trace!(rel, href = %link.href, "adding link");
        self.links().entry(rel.to_string()).or_default().push(link);
        Ok(self)
    }

    /// All links under `rel`, in insertion order.
    pub fn get_links(&self, rel: &str) -> HalResult<Vec<Link>> {
        self.document
            .node()
            .links
            .as_ref()
            .and_then(|links| links.get(rel))
            .cloned()
            .ok_or_else(|| HalError::LinkNotFound(rel.to_string()))
    }

    /// The first link under `rel` whose `name` matches.
    pub fn get_named_link(&self, rel: &str, name: &str) -> HalResult<Link> {
        self.get_links(rel)?
            .into_iter()
            .find(|link| link.is_named(name))
            .ok_or_else(|| HalError::NamedLinkNotFound {
                rel: rel.to_string(),
                name: name.to_string(),
            })
    }

    /// Remove every link under `rel`.
    pub fn del_link(&self, rel: &str) -> &Self {
        if let Some(links) = self.document.node_mut().links.as_mut() {
            if links.shift_remove(rel).is_some() {
                tracing::trace!(rel, "removed link relation");
            }
        }
        self
    }

    /// Remove the links under `rel` whose `name` matches.
    pub fn del_named_link(&self, rel: &str, name: &str) -> &Self {
        let mut node = self.document.node_mut();
        if let Some(items) = node.links.as_mut().and_then(|links| links.get_mut(rel)) {
            items.retain(|link| !link.is_named(name));
            tracing::trace!(rel, name, "removed named links");
        }
        self
    }

    // ── Curies ───────────────────────────────────────────────────────

    /// Add or update a curie; `uri` must contain `{ref}`.
    pub fn add_curie(&self, name: &str, uri: impl AsRef<str>) -> HalResult<&Self> {
        self.add_curie_with(name, uri, true)
    }

    /// Add or update a curie, checking for `{ref}` only when `strict`.
    ///
    /// An existing curie with the same name has its `href` replaced in
    /// place. Validation runs before any mutation.
    pub fn add_curie_with(
        &self,
        name: &str,
        uri: impl AsRef<str>,
        strict: bool,
    ) -> HalResult<&Self> {
        let href = uri.as_ref().to_lowercase();
        if strict && !href.contains(REF_PLACEHOLDER) {
            return Err(HalError::MissingRefPlaceholder {
                name: name.to_string(),
                href,
            });
        }
        tracing::trace!(name, href = %href, "adding curie");
        let mut curies = self.curies();
        match curies.iter_mut().find(|curie| curie.is_named(name)) {
            Some(curie) => curie.href = href,
            None => curies.push(Link::curie(name, href)),
        }
        Ok(self)
    }

    /// The curie named `name`.
    pub fn get_curie(&self, name: &str) -> HalResult<Link> {
        self.document
            .node()
            .links
            .as_ref()
            .and_then(|links| links.get(CURIES_REL))
            .and_then(|curies| curies.iter().find(|curie| curie.is_named(name)))
            .cloned()
            .ok_or_else(|| HalError::CurieNotFound(name.to_string()))
    }

    /// Remove the curie named `name`.
    pub fn del_curie(&self, name: &str) -> &Self {
        let mut node = self.document.node_mut();
        if let Some(curies) = node.links.as_mut().and_then(|links| links.get_mut(CURIES_REL)) {
            curies.retain(|curie| !curie.is_named(name));
            tracing::trace!(name, "removed curie");
        }
        self
    }

    // ── Properties ───────────────────────────────────────────────────

    /// Set a top-level property. `_links` and `_embedded` are rejected.
    pub fn add_prop(&self, name: &str, value: impl Into<Value>) -> HalResult<&Self> {
        check_reserved(name)?;
        tracing::trace!(name, "adding property");
        self.document
            .node_mut()
            .props
            .insert(name.to_string(), value.into());
        Ok(self)
    }

    /// A top-level property.
    ///
    /// `_links` and `_embedded` return the rendered section once it exists.
    pub fn get_prop(&self, name: &str) -> HalResult<Value> {
        let not_found = || HalError::PropertyNotFound(name.to_string());
        let node = self.document.node();
        match name {
            LINKS => Ok(serde_json::to_value(node.links.as_ref().ok_or_else(not_found)?)?),
            EMBEDDED => Ok(serde_json::to_value(node.embedded.as_ref().ok_or_else(not_found)?)?),
            _ => node.props.get(name).cloned().ok_or_else(not_found),
        }
    }

    /// Remove a top-level property. `_links` and `_embedded` are rejected.
    pub fn del_prop(&self, name: &str) -> HalResult<&Self> {
        check_reserved(name)?;
        if self.document.node_mut().props.shift_remove(name).is_some() {
            tracing::trace!(name, "removed property");
        }
        Ok(self)
    }

    // ── Embedded ─────────────────────────────────────────────────────

    /// Append a document (or another resource's document) under `rel`, by reference.
    pub fn add_embedded(&self, rel: &str, source: impl Into<DocumentSource>) -> HalResult<&Self> {
        if rel.is_empty() {
            return Err(HalError::EmptyRelation);
        }
        let document = source.into().into_document();
        if document.reaches(&self.document) {
            return Err(HalError::EmbeddingCycle(rel.to_string()));
        }
        tracing::trace!(rel, "embedding resource");
        self.embedded()
            .entry(rel.to_string())
            .or_default()
            .push(document);
        Ok(self)
    }

    /// The documents embedded under `rel`, in insertion order. Handles alias the originals.
    pub fn get_embedded(&self, rel: &str) -> HalResult<Vec<Document>> {
        self.document
            .node()
            .embedded
            .as_ref()
            .and_then(|embedded| embedded.get(rel))
            .cloned()
            .ok_or_else(|| HalError::EmbeddedNotFound(rel.to_string()))
    }

    /// Remove everything embedded under `rel`.
    pub fn del_embedded(&self, rel: &str) -> &Self {
        if let Some(embedded) = self.document.node_mut().embedded.as_mut() {
            if embedded.shift_remove(rel).is_some() {
                tracing::trace!(rel, "removed embedded relation");
            }
        }
        self
    }
}

fn check_reserved(name: &str) -> HalResult<()> {
    if RESERVED_NAMES.contains(&name) {
        return Err(HalError::ReservedName(name.to_string()));
    }
    Ok(())
}

impl From<Document> for Resource {
    fn from(document: Document) -> Self {
        Self { document }
    }
}

impl From<&Document> for Resource {
    fn from(document: &Document) -> Self {
        Self::from(document.clone())
    }
}

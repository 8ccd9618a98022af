//! The shared HAL document.
//!
//! A [`Document`] is a reference-counted handle: cloning it aliases the
//! same underlying mapping, so a document embedded into another stays
//! live. Mutations made through any handle (or any [`Resource`] wrapping
//! one) are visible through all of them.
//!
//! ```text
//!   Document ──→ Node { _links:    rel → [Link],
//!                       _embedded: rel → [Document],   (aliases, not copies)
//!                       props:     key → Value }
//! ```
//!
//! `_links` and `_embedded` only appear in the serialized form once they
//! have been created. Use [`Document::deep_clone`] for an isolated copy.
//!
//! The handle is single-threaded (`!Send`); wrap in external
//! synchronization (or deep-clone into per-thread copies) before sharing.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{HalError, HalResult};
use crate::link::Link;
use crate::resource::Resource;

/// Key holding link relations.
pub const LINKS: &str = "_links";

/// Key holding embedded resources.
pub const EMBEDDED: &str = "_embedded";

/// Property names that cannot be set or deleted directly.
pub const RESERVED_NAMES: [&str; 2] = [LINKS, EMBEDDED];

/// Insertion-ordered map with the Fx hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Relation → ordered links, relations in insertion order.
pub type Links = FxIndexMap<String, Vec<Link>>;

/// Relation → ordered embedded documents, relations in insertion order.
pub type Embedded = FxIndexMap<String, Vec<Document>>;

type NodePtr = *const RefCell<Node>;

#[derive(Default)]
pub(crate) struct Node {
    pub(crate) links: Option<Links>,
    pub(crate) embedded: Option<Embedded>,
    pub(crate) props: Map<String, Value>,
}

/// Shared handle to a HAL document.
///
/// `PartialEq` is structural and `Debug` prints embedded documents as
/// addresses; both terminate on cyclic graphs.
#[derive(Clone, Default)]
pub struct Document(Rc<RefCell<Node>>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if both handles alias the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if the document has no links, embedded resources, or properties.
    pub fn is_empty(&self) -> bool {
        let node = self.node();
        node.links.is_none() && node.embedded.is_none() && node.props.is_empty()
    }

    /// Recursively copy the document, embedded documents included.
    ///
    /// The copy shares nothing with `self`. A document aliased twice
    /// within the tree is copied once and aliased the same way in the copy.
    pub fn deep_clone(&self) -> Self {
        self.deep_clone_with(&mut Vec::new())
    }

    fn deep_clone_with(&self, copies: &mut Vec<(NodePtr, Document)>) -> Self {
        if let Some((_, copy)) = copies.iter().find(|(ptr, _)| *ptr == self.ptr()) {
            return copy.clone();
        }
        let copy = Document::new();
        copies.push((self.ptr(), copy.clone()));

        let node = self.node();
        let embedded: Option<Embedded> = node.embedded.as_ref().map(|embedded| {
            embedded
                .iter()
                .map(|(rel, docs)| {
                    let docs: Vec<Document> =
                        docs.iter().map(|doc| doc.deep_clone_with(copies)).collect();
                    (rel.clone(), docs)
                })
                .collect()
        });
        *copy.node_mut() = Node {
            links: node.links.clone(),
            embedded,
            props: node.props.clone(),
        };
        copy
    }

    /// Adopt a plain JSON object into the typed model.
    ///
    /// `_links[rel]` and `_embedded[rel]` may each be a single object or
    /// an array. Link hrefs are lowercased.
    pub fn from_map(map: Map<String, Value>) -> HalResult<Self> {
        let mut node = Node::default();
        for (key, value) in map {
            match key.as_str() {
                LINKS => node.links = Some(parse_links(value)?),
                EMBEDDED => node.embedded = Some(parse_embedded(value)?),
                _ => {
                    node.props.insert(key, value);
                }
            }
        }
        Ok(Self(Rc::new(RefCell::new(node))))
    }

    /// Returns `true` if `target` is this document or one of its embedded descendants.
    pub(crate) fn reaches(&self, target: &Document) -> bool {
        let mut seen: Vec<NodePtr> = Vec::new();
        let mut pending = vec![self.clone()];
        while let Some(doc) = pending.pop() {
            if doc.ptr_eq(target) {
                return true;
            }
            if seen.contains(&doc.ptr()) {
                continue;
            }
            seen.push(doc.ptr());
            if let Some(embedded) = &doc.node().embedded {
                pending.extend(embedded.values().flatten().cloned());
            }
        }
        false
    }

    /// Structural equality, treating a revisited pair as equal.
    fn equivalent(&self, other: &Document, assumed: &mut Vec<(NodePtr, NodePtr)>) -> bool {
        let pair = (self.ptr(), other.ptr());
        if pair.0 == pair.1 || assumed.contains(&pair) {
            return true;
        }
        assumed.push(pair);

        let (a, b) = (self.node(), other.node());
        if a.links != b.links || a.props != b.props {
            return false;
        }
        match (&a.embedded, &b.embedded) {
            (None, None) => true,
            (Some(ours), Some(theirs)) => {
                ours.len() == theirs.len()
                    && ours.iter().all(|(rel, docs)| {
                        theirs.get(rel).is_some_and(|others| {
                            docs.len() == others.len()
                                && docs
                                    .iter()
                                    .zip(others)
                                    .all(|(doc, other)| doc.equivalent(other, assumed))
                        })
                    })
            }
            _ => false,
        }
    }

    fn ptr(&self) -> NodePtr {
        Rc::as_ptr(&self.0)
    }

    pub(crate) fn node(&self) -> Ref<'_, Node> {
        self.0.borrow()
    }

    pub(crate) fn node_mut(&self) -> RefMut<'_, Node> {
        self.0.borrow_mut()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other, &mut Vec::new())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(node) = self.0.try_borrow() else {
            return f.write_str("Document { <mutably borrowed> }");
        };
        let embedded = node.embedded.as_ref().map(|embedded| {
            embedded
                .iter()
                .map(|(rel, docs)| (rel, docs.iter().map(Document::ptr).collect::<Vec<_>>()))
                .collect::<Vec<_>>()
        });
        f.debug_struct("Document")
            .field("ptr", &self.ptr())
            .field("links", &node.links)
            .field("embedded", &embedded)
            .field("props", &node.props)
            .finish()
    }
}

fn parse_links(value: Value) -> HalResult<Links> {
    let Value::Object(rels) = value else {
        return Err(HalError::InvalidDocument(format!("'{LINKS}' must be an object")));
    };
    rels.into_iter()
        .map(|(rel, entry)| -> HalResult<(String, Vec<Link>)> {
            let links = one_or_many(entry)
                .into_iter()
                .map(|item| -> HalResult<Link> {
                    serde_json::from_value(item).map_err(|e| {
                        HalError::InvalidDocument(format!("link under '{rel}': {e}"))
                    })
                })
                .collect::<HalResult<Vec<_>>>()?;
            Ok((rel, links))
        })
        .collect()
}

fn parse_embedded(value: Value) -> HalResult<Embedded> {
    let Value::Object(rels) = value else {
        return Err(HalError::InvalidDocument(format!("'{EMBEDDED}' must be an object")));
    };
    rels.into_iter()
        .map(|(rel, entry)| -> HalResult<(String, Vec<Document>)> {
            let docs = one_or_many(entry)
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Document::from_map(map),
                    _ => Err(HalError::InvalidDocument(format!(
                        "embedded resource under '{rel}' must be an object"
                    ))),
                })
                .collect::<HalResult<Vec<_>>>()?;
            Ok((rel, docs))
        })
        .collect()
}

fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        single => vec![single],
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = HalError;

    fn try_from(map: Map<String, Value>) -> HalResult<Self> {
        Self::from_map(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = HalError;

    fn try_from(value: Value) -> HalResult<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(HalError::InvalidDocument(format!(
                "expected a JSON object, found {other}"
            ))),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Visit {
            doc: self,
            parent: None,
        }
        .serialize(serializer)
    }
}

/// A document being serialized, linked to the documents embedding it.
struct Visit<'a> {
    doc: &'a Document,
    parent: Option<&'a Visit<'a>>,
}

impl Visit<'_> {
    fn on_path(&self, doc: &Document) -> bool {
        self.doc.ptr_eq(doc) || self.parent.is_some_and(|parent| parent.on_path(doc))
    }
}

impl Serialize for Visit<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.parent.is_some_and(|parent| parent.on_path(self.doc)) {
            return Err(serde::ser::Error::custom("cyclic document"));
        }
        let node = self
            .doc
            .0
            .try_borrow()
            .map_err(|_| serde::ser::Error::custom("document is being mutated"))?;
        let len = node.props.len()
            + usize::from(node.links.is_some())
            + usize::from(node.embedded.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(links) = &node.links {
            map.serialize_entry(LINKS, links)?;
        }
        if let Some(embedded) = &node.embedded {
            map.serialize_entry(
                EMBEDDED,
                &EmbeddedEntries {
                    embedded,
                    parent: self,
                },
            )?;
        }
        for (key, value) in &node.props {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct EmbeddedEntries<'a> {
    embedded: &'a Embedded,
    parent: &'a Visit<'a>,
}

impl Serialize for EmbeddedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.embedded.iter().map(|(rel, docs)| {
            let docs = EmbeddedDocs {
                docs,
                parent: self.parent,
            };
            (rel, docs)
        }))
    }
}

struct EmbeddedDocs<'a> {
    docs: &'a [Document],
    parent: &'a Visit<'a>,
}

impl Serialize for EmbeddedDocs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.docs.iter().map(|doc| Visit {
            doc,
            parent: Some(self.parent),
        }))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(serde::de::Error::custom)
    }
}

/// What a [`Resource`] can adopt or embed: a raw document or another resource.
///
/// Both variants are taken by reference; nothing is copied.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A document handle.
    Document(Document),
    /// The document wrapped by a resource.
    Resource(Resource),
}

impl DocumentSource {
    /// The aliased document.
    pub fn into_document(self) -> Document {
        match self {
            DocumentSource::Document(document) => document,
            DocumentSource::Resource(resource) => resource.document().clone(),
        }
    }
}

impl From<Document> for DocumentSource {
    fn from(document: Document) -> Self {
        DocumentSource::Document(document)
    }
}

impl From<&Document> for DocumentSource {
    fn from(document: &Document) -> Self {
        DocumentSource::Document(document.clone())
    }
}

impl From<Resource> for DocumentSource {
    fn from(resource: Resource) -> Self {
        DocumentSource::Resource(resource)
    }
}

impl From<&Resource> for DocumentSource {
    fn from(resource: &Resource) -> Self {
        DocumentSource::Resource(resource.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_serializes_to_empty_object() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({}));
    }

    #[test]
    fn test_clone_aliases() {
        let doc = Document::new();
        let alias = doc.clone();
        alias.node_mut().props.insert("foo".into(), json!("bar"));
        assert!(doc.ptr_eq(&alias));
        assert_eq!(doc.node().props["foo"], json!("bar"));
    }

    #[test]
    fn test_deep_clone_isolates() {
        let child = Document::new();
        let parent = Document::new();
        parent
            .node_mut()
            .embedded
            .get_or_insert_with(Default::default)
            .insert("child".into(), vec![child.clone()]);

        let copy = parent.deep_clone();
        child.node_mut().props.insert("late".into(), json!(1));

        assert!(!copy.ptr_eq(&parent));
        assert!(!copy.reaches(&child));
        assert_eq!(serde_json::to_value(&copy).unwrap(), json!({"_embedded": {"child": [{}]}}));
    }

    #[test]
    fn test_from_json_accepts_single_and_array_forms() {
        let doc = Document::try_from(json!({
            "_links": {
                "self": {"href": "/Orders/1"},
                "item": [{"href": "/A"}, {"href": "/B", "name": "b"}],
            },
            "_embedded": {
                "customer": {"name": "Ada", "_links": {"self": {"href": "/C/1"}}},
            },
            "total": 30,
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "_links": {
                    "self": [{"href": "/orders/1"}],
                    "item": [{"href": "/a"}, {"href": "/b", "name": "b"}],
                },
                "_embedded": {
                    "customer": [{"name": "Ada", "_links": {"self": [{"href": "/c/1"}]}}],
                },
                "total": 30,
            })
        );
    }

    #[test]
    fn test_from_json_rejects_malformed_sections() {
        let err = Document::try_from(json!({"_links": []})).unwrap_err();
        assert!(err.is_validation());

        let missing_href = json!({"_links": {"self": {"title": "no href"}}});
        let err = Document::try_from(missing_href).unwrap_err();
        assert!(matches!(err, HalError::InvalidDocument(_)));

        let err = Document::try_from(json!({"_embedded": {"x": [1]}})).unwrap_err();
        assert!(matches!(err, HalError::InvalidDocument(_)));

        assert!(Document::try_from(json!("not an object")).is_err());
    }

    #[test]
    fn test_deserialize() {
        let text = r#"{"_links":{"self":{"href":"/X"}},"a":true}"#;
        let doc: Document = serde_json::from_str(text).unwrap();
        assert_eq!(doc.node().links.as_ref().unwrap()["self"][0].href(), "/x");
        assert_eq!(doc.node().props["a"], json!(true));
    }

    #[test]
    fn test_structural_equality() {
        let a = Document::try_from(json!({"x": 1})).unwrap();
        let b = Document::try_from(json!({"x": 1})).unwrap();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }

    fn embed(parent: &Document, rel: &str, child: &Document) {
        parent
            .node_mut()
            .embedded
            .get_or_insert_with(Default::default)
            .entry(rel.to_string())
            .or_default()
            .push(child.clone());
    }

    #[test]
    fn test_cyclic_document_fails_to_serialize() {
        let doc = Document::new();
        embed(&doc, "me", &doc);
        let err = serde_json::to_value(&doc).unwrap_err();
        assert!(err.to_string().contains("cyclic document"));
        assert!(serde_json::to_string(&doc).is_err());
    }

    #[test]
    fn test_indirect_cycle_detected() {
        let a = Document::new();
        let b = Document::new();
        embed(&a, "b", &b);
        embed(&b, "a", &a);
        assert!(serde_json::to_string(&a).is_err());
        assert!(a.reaches(&b));
        assert!(b.reaches(&a));
        assert!(!a.reaches(&Document::new()));
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        let child = Document::new();
        let parent = Document::new();
        embed(&parent, "x", &child);
        embed(&parent, "y", &child);
        assert_eq!(
            serde_json::to_value(&parent).unwrap(),
            json!({"_embedded": {"x": [{}], "y": [{}]}})
        );

        let copy = parent.deep_clone();
        let node = copy.node();
        let embedded = node.embedded.as_ref().unwrap();
        assert!(embedded["x"][0].ptr_eq(&embedded["y"][0]));
        assert!(!embedded["x"][0].ptr_eq(&child));
    }

    #[test]
    fn test_cyclic_deep_clone_equality_and_debug() {
        let doc = Document::new();
        doc.node_mut().props.insert("id".into(), json!(1));
        embed(&doc, "me", &doc);

        let copy = doc.deep_clone();
        assert!(!copy.ptr_eq(&doc));
        assert!(copy.node().embedded.as_ref().unwrap()["me"][0].ptr_eq(&copy));
        assert_eq!(copy, doc);
        assert!(format!("{doc:?}").starts_with("Document"));
    }
}

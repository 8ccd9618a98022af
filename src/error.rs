//! HAL error types.
//!
//! Errors are categorized by what the caller did wrong:
//!
//! | Category | Variants | Meaning |
//! |----------|----------|---------|
//! | **NotFound** | `LinkNotFound`, `NamedLinkNotFound`, `CurieNotFound`, `PropertyNotFound`, `EmbeddedNotFound` | Queried something absent |
//! | **Validation** | `ReservedName`, `MissingRefPlaceholder`, `EmptyRelation`, `EmbeddingCycle`, `InvalidDocument` | Fix input |
//! | **Serialization** | `Json` | Encoder failure |
//!
//! Deletions never fail on absence; only lookups produce NotFound errors.

use thiserror::Error;

/// Errors that can occur while building or querying a HAL document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    // ── NotFound errors (recoverable query misses) ───────────────────
    /// No `_links` entry for the relation.
    #[error("Link '{0}' not found in document")]
    LinkNotFound(String),

    /// The relation exists but holds no link with that name.
    #[error("Link item with name '{name}' not found under '{rel}'")]
    NamedLinkNotFound {
        /// Relation that was searched.
        rel: String,
        /// Requested link name.
        name: String,
    },

    /// No curie with that name.
    #[error("Curie with name '{0}' not found")]
    CurieNotFound(String),

    /// No top-level property with that key.
    #[error("Property '{0}' not found on document")]
    PropertyNotFound(String),

    /// No `_embedded` entry for the relation.
    #[error("Embedded resource '{0}' not found on document")]
    EmbeddedNotFound(String),

    // ── Validation errors (fix input) ────────────────────────────────
    /// Property mutation attempted on `_links` or `_embedded`.
    #[error("'{0}' is a HAL reserved name")]
    ReservedName(String),

    /// Strict curie whose href lacks the `{{ref}}` placeholder.
    #[error("Missing '{{ref}}' placeholder in curie '{name}' uri: {href}")]
    MissingRefPlaceholder {
        /// Curie name.
        name: String,
        /// Lowercased href that was rejected.
        href: String,
    },

    /// Relation names must be non-empty.
    #[error("Relation name must not be empty")]
    EmptyRelation,

    /// Embedding would make the document reachable from itself.
    #[error("Embedding under '{0}' would create a cycle")]
    EmbeddingCycle(String),

    /// A plain JSON document could not be adopted.
    #[error("Invalid HAL document: {0}")]
    InvalidDocument(String),

    // ── Serialization errors ─────────────────────────────────────────
    /// JSON encoder failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HalError {
    /// Returns `true` if the caller asked for something absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::LinkNotFound(_)
                | Self::NamedLinkNotFound { .. }
                | Self::CurieNotFound(_)
                | Self::PropertyNotFound(_)
                | Self::EmbeddedNotFound(_)
        )
    }

    /// Returns `true` if the caller supplied input that violates a document invariant.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ReservedName(_)
                | Self::MissingRefPlaceholder { .. }
                | Self::EmptyRelation
                | Self::EmbeddingCycle(_)
                | Self::InvalidDocument(_)
        )
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

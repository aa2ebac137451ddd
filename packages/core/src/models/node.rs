//! Sitemap Node Data Structures
//!
//! This module defines the `SitemapNode` struct and the payload types used
//! to create and partially update nodes through the remote node service.
//!
//! # Identity
//!
//! Node ids are server-assigned integers: the core never mints ids, it only
//! receives them from `NodeStore::create_node`/`create_node_at`. Identity is
//! stable for the lifetime of a node, but NOT across a delete/recreate cycle
//! (undo of a deletion produces a new id, see `services::history`).
//!
//! # Hierarchy
//!
//! `parent_id` is an optional back-reference to another node's id, resolved
//! through a lookup map at tree-build time (see `services::hierarchy`).
//! Exactly one node per sitemap has `is_root = true` and `parent_id = None`.

use serde::{Deserialize, Serialize};

/// Publication status of the content behind a sitemap node.
///
/// `Unknown` is the serde catch-all so new backend statuses never fail
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Pending,
    Published,
    #[serde(other)]
    Unknown,
}

/// A single page node in the sitemap tree.
///
/// # Fields
///
/// - `id`: server-assigned integer id, stable once created
/// - `sitemap_id`: the owning sitemap aggregate (external)
/// - `parent_id`: optional back-reference to the parent node
/// - `order`: sibling ordering within the parent's children, ascending
/// - `position_x`/`position_y`: canvas coordinates (local-first, batch-saved)
/// - `is_root`: exactly one node per sitemap carries this flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapNode {
    /// Server-assigned identifier
    pub id: i64,

    /// Owning sitemap aggregate id
    pub sitemap_id: i64,

    /// Page title
    pub title: String,

    /// URL slug
    pub slug: String,

    /// Optional meta description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content-type tag (e.g. "page", "article", "landing")
    pub content_type: String,

    /// Target keywords for the page
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Canvas X coordinate
    pub position_x: f64,

    /// Canvas Y coordinate
    pub position_y: f64,

    /// Sibling order within the parent, ascending
    pub order: i64,

    /// Root flag (exactly one per sitemap)
    #[serde(default)]
    pub is_root: bool,

    /// Publication status of the generated content
    #[serde(default)]
    pub status: ContentStatus,

    /// Parent node id (None for the root and for orphans)
    pub parent_id: Option<i64>,
}

impl SitemapNode {
    /// Build the creation payload that would recreate this node as-is.
    ///
    /// Used by the history engine when undoing a deletion: everything except
    /// the id (which the server reassigns) is carried over.
    pub fn to_create_input(&self) -> CreateNodeInput {
        CreateNodeInput {
            sitemap_id: self.sitemap_id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            content_type: self.content_type.clone(),
            keywords: self.keywords.clone(),
            parent_id: self.parent_id,
            order: Some(self.order),
        }
    }
}

/// Payload for creating a node through the remote node service.
///
/// The server assigns the id and, unless `create_node_at` is used, the
/// canvas position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeInput {
    pub sitemap_id: i64,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content_type: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Parent to attach under (None creates a root-level node)
    pub parent_id: Option<i64>,
    /// Explicit sibling order; None appends after existing siblings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl CreateNodeInput {
    /// Minimal input: a titled page under an optional parent.
    pub fn new(sitemap_id: i64, title: impl Into<String>, parent_id: Option<i64>) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            sitemap_id,
            title,
            slug,
            description: None,
            content_type: "page".to_string(),
            keywords: Vec::new(),
            parent_id,
            order: None,
        }
    }
}

/// Partial update for node fields.
///
/// Every field is optional; `None` means "leave unchanged". The same struct
/// doubles as the before/after payload of `HistoryAction::UpdateNode`, so a
/// recorded update can be inverted by applying the `previous` side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Double-optional: outer None = unchanged, inner None = clear the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
}

impl NodeUpdate {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.content_type.is_none()
            && self.keywords.is_none()
            && self.status.is_none()
    }

    /// Capture the current values of exactly the fields `self` touches.
    ///
    /// This is the "before" delta recorded alongside an update so undo can
    /// restore precisely what the update overwrote, nothing more.
    pub fn snapshot_of(&self, node: &SitemapNode) -> NodeUpdate {
        NodeUpdate {
            title: self.title.as_ref().map(|_| node.title.clone()),
            slug: self.slug.as_ref().map(|_| node.slug.clone()),
            description: self.description.as_ref().map(|_| node.description.clone()),
            content_type: self.content_type.as_ref().map(|_| node.content_type.clone()),
            keywords: self.keywords.as_ref().map(|_| node.keywords.clone()),
            status: self.status.as_ref().map(|_| node.status),
        }
    }

    /// Apply this update to a node in place.
    pub fn apply_to(&self, node: &mut SitemapNode) {
        if let Some(title) = &self.title {
            node.title = title.clone();
        }
        if let Some(slug) = &self.slug {
            node.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            node.description = description.clone();
        }
        if let Some(content_type) = &self.content_type {
            node.content_type = content_type.clone();
        }
        if let Some(keywords) = &self.keywords {
            node.keywords = keywords.clone();
        }
        if let Some(status) = self.status {
            node.status = status;
        }
    }
}

/// Derive a URL slug from a title: lowercase, alphanumerics kept,
/// runs of other characters collapsed to single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

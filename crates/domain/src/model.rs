//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Declared type of a web resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Css,
    Js,
    Other,
}

impl ResourceType {
    /// Infer the type from the extension of a URI
    pub fn from_uri(uri: &str) -> Self {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("css") => ResourceType::Css,
            Some("js") => ResourceType::Js,
            _ => ResourceType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Css => "css",
            ResourceType::Js => "js",
            ResourceType::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single web resource, identified by its URI and declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    uri: String,
    #[serde(rename = "type")]
    resource_type: ResourceType,
}

impl Resource {
    pub fn new(uri: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            uri: uri.into(),
            resource_type,
        }
    }

    /// Create a resource whose type is inferred from the URI extension
    pub fn infer(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let resource_type = ResourceType::from_uri(&uri);
        Self { uri, resource_type }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn is_css(&self) -> bool {
        self.resource_type == ResourceType::Css
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uri, self.resource_type)
    }
}

/// A named, ordered collection of resources processed and cached together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub resources: Vec<Resource>,
}

impl Group {
    pub fn new(name: impl Into<String>, resources: Vec<Resource>) -> Self {
        Self {
            name: name.into(),
            resources,
        }
    }

    /// Distinct resource types present in the group, in first-seen order
    pub fn resource_types(&self) -> Vec<ResourceType> {
        let mut types = Vec::new();
        for resource in &self.resources {
            if !types.contains(&resource.resource_type()) {
                types.push(resource.resource_type());
            }
        }
        types
    }

    /// Every cache key a bundle of this group can be stored under:
    /// one per resource type present, minimized or not.
    pub fn cache_keys(&self) -> Vec<CacheKey> {
        self.resource_types()
            .into_iter()
            .flat_map(|ty| {
                [false, true]
                    .into_iter()
                    .map(move |minimize| CacheKey::new(self.name.clone(), ty, minimize))
            })
            .collect()
    }
}

/// The full set of groups known to the model layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub groups: Vec<Group>,
}

impl Model {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Get a group by name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Identifies a cacheable unit: a group plus its processing options
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub group_name: String,
    pub resource_type: ResourceType,
    pub minimize: bool,
}

impl CacheKey {
    pub fn new(group_name: impl Into<String>, resource_type: ResourceType, minimize: bool) -> Self {
        Self {
            group_name: group_name.into(),
            resource_type,
            minimize,
        }
    }

    /// A key that cannot name any group
    pub fn is_blank(&self) -> bool {
        is_blank_group_name(&self.group_name)
    }
}

/// Whether `name` cannot name any group
pub fn is_blank_group_name(name: &str) -> bool {
    name.trim().is_empty()
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group_name, self.resource_type)?;
        if self.minimize {
            f.write_str(" [minimized]")?;
        }
        Ok(())
    }
}

/// Processed bundle content together with its digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedBundle {
    pub content: String,
    /// SHA-256 of `content`, usable as an ETag
    pub hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CachedBundle {
    pub fn new(content: impl Into<String>, created_at: OffsetDateTime) -> Self {
        let content = content.into();
        let hash = crate::compute_digest(content.as_bytes());
        Self {
            content,
            hash,
            created_at,
        }
    }
}

/// Value held by the cache store for a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheValue {
    /// Up-to-date bundle
    Fresh(CachedBundle),
    /// Invalidated entry; consumers must recompute
    Tombstone,
}

impl CacheValue {
    pub fn is_tombstone(&self) -> bool {
        matches!(self, CacheValue::Tombstone)
    }
}

/// Result of evaluating one resource or one branch of an import graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Changed,
    Unchanged,
}

impl Change {
    pub fn is_changed(self) -> bool {
        self == Change::Changed
    }
}

impl From<bool> for Change {
    fn from(changed: bool) -> Self {
        if changed {
            Change::Changed
        } else {
            Change::Unchanged
        }
    }
}

/// Outcome of a single watcher check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No resource of the group changed
    Unchanged,
    /// `resource` changed and the key was tombstoned
    Invalidated { resource: String },
    /// The check was abandoned; no invalidation was performed
    Failed { reason: String },
}

impl CheckOutcome {
    pub fn is_invalidated(&self) -> bool {
        matches!(self, CheckOutcome::Invalidated { .. })
    }
}

//! TOML-file based resource model

use async_trait::async_trait;
use asset_watch_domain::{Group, Model, ModelError, ModelResolver, Resource, ResourceType};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Resolves groups from a TOML model file.
///
/// The file is re-read on every call so edits to the model are picked up
/// without a restart.
///
/// ```toml
/// [[group]]
/// name = "base"
/// resources = ["css/reset.css"]
///
/// [[group]]
/// name = "main"
/// group_refs = ["base"]
/// resources = ["css/main.css", { uri = "js/app.mjs", type = "js" }]
/// ```
pub struct TomlModelResolver {
    model_path: PathBuf,
}

impl TomlModelResolver {
    /// Create a resolver for an existing model file
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model_path = model_path.as_ref().to_path_buf();

        if !model_path.is_file() {
            return Err(ModelError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Model file not found: {}", model_path.display()),
            )));
        }

        Ok(Self { model_path })
    }

    /// Parse model file content
    pub fn parse(source_name: &str, content: &str) -> Result<Model, ModelError> {
        let file: ModelFile = toml::from_str(content).map_err(|e| ModelError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

        let mut entries: HashMap<&str, &GroupEntry> = HashMap::new();
        for entry in &file.groups {
            if entry.name.trim().is_empty() {
                return Err(ModelError::Parse {
                    source_name: source_name.to_string(),
                    message: "group name must not be empty".to_string(),
                });
            }
            if entries.insert(entry.name.as_str(), entry).is_some() {
                return Err(ModelError::DuplicateGroup(entry.name.clone()));
            }
        }

        let mut groups = Vec::with_capacity(file.groups.len());
        for entry in &file.groups {
            let mut chain = Vec::new();
            let resources = expand(entry, &entries, &mut chain)?;
            groups.push(Group::new(entry.name.clone(), resources));
        }

        Ok(Model::new(groups))
    }
}

/// Resources of `entry`: referenced groups first, in order, then its own
fn expand(
    entry: &GroupEntry,
    entries: &HashMap<&str, &GroupEntry>,
    chain: &mut Vec<String>,
) -> Result<Vec<Resource>, ModelError> {
    if chain.contains(&entry.name) {
        let mut cycle = chain.clone();
        cycle.push(entry.name.clone());
        return Err(ModelError::CircularReference { chain: cycle });
    }
    chain.push(entry.name.clone());

    let mut resources = Vec::new();
    let mut seen = HashSet::new();

    for reference in &entry.group_refs {
        let referenced =
            entries
                .get(reference.as_str())
                .ok_or_else(|| ModelError::UnknownReference {
                    group: entry.name.clone(),
                    reference: reference.clone(),
                })?;
        for resource in expand(referenced, entries, chain)? {
            if seen.insert(resource.clone()) {
                resources.push(resource);
            }
        }
    }

    for resource in entry.resources.iter().map(ResourceEntry::to_resource) {
        if seen.insert(resource.clone()) {
            resources.push(resource);
        }
    }

    chain.pop();
    Ok(resources)
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default, rename = "group")]
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
    #[serde(default)]
    group_refs: Vec<String>,
    #[serde(default)]
    resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResourceEntry {
    Uri(String),
    Typed {
        uri: String,
        #[serde(rename = "type")]
        resource_type: ResourceType,
    },
}

impl ResourceEntry {
    fn to_resource(&self) -> Resource {
        match self {
            ResourceEntry::Uri(uri) => Resource::infer(uri.clone()),
            ResourceEntry::Typed { uri, resource_type } => Resource::new(uri.clone(), *resource_type),
        }
    }
}

#[async_trait]
impl ModelResolver for TomlModelResolver {
    async fn load_model(&self) -> Result<Model, ModelError> {
        let content = tokio::fs::read_to_string(&self.model_path).await?;
        Self::parse(&self.model_path.display().to_string(), &content)
    }
}

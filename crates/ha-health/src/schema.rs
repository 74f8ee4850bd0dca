//! Hierarchy schema: the ordered component levels and their key templates.
//!
//! Loaded once at startup and read-only afterwards. Each component names its
//! parent and a key template relative to the store prefix; the templates of a
//! child must extend its parent's placeholders so that parent ids can be cut
//! from a child identity.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ha_core::errors::SchemaError;
use ha_store::KeyTemplate;

/// One schema entry as written in a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Key template relative to the store prefix.
    pub key: String,
}

impl ComponentDef {
    fn new(name: &str, parent: Option<&str>, key: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    components: Vec<ComponentDef>,
}

/// A resolved component level.
#[derive(Debug, Clone)]
pub struct ComponentLevel {
    name: String,
    parent: Option<String>,
    level: usize,
    template: KeyTemplate,
    children: Vec<String>,
}

impl ComponentLevel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Absolute key template (prefix included).
    pub fn template(&self) -> &KeyTemplate {
        &self.template
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// The placeholder holding this component's own instance id: the last
    /// one in its template.
    pub fn id_placeholder(&self) -> &str {
        self.template.placeholders().last().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct HierarchySchema {
    levels: Vec<ComponentLevel>,
    index: HashMap<String, usize>,
    root: usize,
    total_depth: usize,
}

const NODE_KEY: &str =
    "/cluster/$cluster_id/site/$site_id/rack/$rack_id/storageset/$storageset_id/node/$node_id";

impl HierarchySchema {
    /// The built-in cluster hierarchy.
    pub fn default_defs() -> Vec<ComponentDef> {
        vec![
            ComponentDef::new("cluster", None, "/cluster/$cluster_id/health"),
            ComponentDef::new("site", Some("cluster"), "/cluster/$cluster_id/site/$site_id/health"),
            ComponentDef::new(
                "rack",
                Some("site"),
                "/cluster/$cluster_id/site/$site_id/rack/$rack_id/health",
            ),
            ComponentDef::new(
                "storageset",
                Some("rack"),
                "/cluster/$cluster_id/site/$site_id/rack/$rack_id/storageset/$storageset_id/health",
            ),
            ComponentDef::new("node", Some("storageset"), &format!("{NODE_KEY}/health")),
            ComponentDef::new("server", Some("node"), &format!("{NODE_KEY}/server/$server_id/health")),
            ComponentDef::new("storage", Some("node"), &format!("{NODE_KEY}/storage/$storage_id/health")),
            ComponentDef::new("cvg", Some("node"), &format!("{NODE_KEY}/cvg/$cvg_id/health")),
            ComponentDef::new("disk", Some("cvg"), &format!("{NODE_KEY}/cvg/$cvg_id/disk/$disk_id/health")),
        ]
    }

    pub fn builtin(prefix: &str) -> Result<Self, SchemaError> {
        Self::from_defs(Self::default_defs(), prefix)
    }

    /// Load from a JSON schema file, or the built-in schema when `path` is `None`.
    pub fn load(path: Option<&Path>, prefix: &str) -> Result<Self, SchemaError> {
        let Some(path) = path else {
            return Self::builtin(prefix);
        };
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let schema = Self::from_json(&content, prefix)?;
        tracing::info!(path = %path.display(), components = schema.levels.len(), "hierarchy schema loaded");
        Ok(schema)
    }

    /// Parse `{"components": [{name, parent, key}, ...]}`.
    pub fn from_json(json: &str, prefix: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(json).map_err(|e| SchemaError::Malformed {
            message: e.to_string(),
        })?;
        Self::from_defs(file.components, prefix)
    }

    pub fn from_defs(defs: Vec<ComponentDef>, prefix: &str) -> Result<Self, SchemaError> {
        if defs.is_empty() {
            return Err(SchemaError::Malformed {
                message: "schema declares no components".to_string(),
            });
        }

        let mut index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if index.insert(def.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateComponent(def.name.clone()));
            }
        }

        let roots: Vec<usize> = defs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.parent.is_none())
            .map(|(i, _)| i)
            .collect();
        if roots.len() != 1 {
            return Err(SchemaError::RootCount { count: roots.len() });
        }

        let mut parents = Vec::with_capacity(defs.len());
        for def in &defs {
            let parent = match &def.parent {
                None => None,
                Some(p) => Some(*index.get(p).ok_or_else(|| SchemaError::UnknownParent {
                    component: def.name.clone(),
                    parent: p.clone(),
                })?),
            };
            parents.push(parent);
        }

        let prefix = prefix.trim_end_matches('/');
        let mut levels = Vec::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            let mut level = 0;
            let mut cursor = parents[i];
            while let Some(p) = cursor {
                level += 1;
                if level > defs.len() {
                    return Err(SchemaError::Cycle(def.name.clone()));
                }
                cursor = parents[p];
            }
            let template =
                KeyTemplate::parse(&format!("{prefix}/{}", def.key.trim_start_matches('/')))?;
            if template.placeholders().is_empty() {
                return Err(SchemaError::Malformed {
                    message: format!("key of {} has no id placeholder", def.name),
                });
            }
            let children = defs
                .iter()
                .filter(|d| d.parent.as_deref() == Some(def.name.as_str()))
                .map(|d| d.name.clone())
                .collect();
            levels.push(ComponentLevel {
                name: def.name.clone(),
                parent: def.parent.clone(),
                level,
                template,
                children,
            });
        }

        for component in &levels {
            let Some(parent) = component.parent.as_ref().and_then(|p| index.get(p)) else {
                continue;
            };
            let own = component.template.placeholders();
            let inherited = levels[*parent].template.placeholders();
            if own.len() <= inherited.len() || !own.starts_with(&inherited) {
                return Err(SchemaError::Malformed {
                    message: format!(
                        "key of {} must extend the placeholders of its parent {}",
                        component.name, levels[*parent].name
                    ),
                });
            }
        }

        let total_depth = levels.iter().map(|l| l.level).max().unwrap_or(0) + 1;
        Ok(Self {
            levels,
            index,
            root: roots[0],
            total_depth,
        })
    }

    pub fn component(&self, name: &str) -> Result<&ComponentLevel, SchemaError> {
        self.index
            .get(name)
            .map(|&i| &self.levels[i])
            .ok_or_else(|| SchemaError::UnknownComponent(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Depth of `name` below the root (root is 0).
    pub fn level(&self, name: &str) -> Result<usize, SchemaError> {
        self.component(name).map(ComponentLevel::level)
    }

    /// Number of distinct levels.
    pub fn total_depth(&self) -> usize {
        self.total_depth
    }

    /// Child component types of `name`, in declaration order.
    pub fn next(&self, name: &str) -> &[String] {
        self.component(name).map(ComponentLevel::children).unwrap_or(&[])
    }

    pub fn parent(&self, name: &str) -> Option<&str> {
        self.component(name).ok().and_then(ComponentLevel::parent)
    }

    pub fn root(&self) -> &ComponentLevel {
        &self.levels[self.root]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentLevel> {
        self.levels.iter()
    }
}

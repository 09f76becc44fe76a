//! Generation options. Every field is optional in JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// Decimal digits kept in emitted numbers.
    pub precision: u32,
    /// Instance geometries used by more than one mesh.
    pub instance: bool,
    /// Instance every geometry, even single-use ones. Implies `instance`.
    pub instance_all: bool,
    /// Emit `name` on every node.
    pub keep_names: bool,
    /// Keep empty / attribute-less groups.
    pub keep_groups: bool,
    /// Embed the duplicate registry as a comment.
    pub debug: bool,
    /// Emit static type descriptors.
    pub types: bool,
    /// Add cast/receive shadow flags to every mesh.
    pub shadows: bool,
    /// Emit free-form node metadata.
    pub meta: bool,
    pub asset_url: String,
    /// Passed verbatim as the loader's decoder argument.
    pub decoder: Option<String>,
    pub component_name: String,
    /// Key under which the host persists the context blob.
    pub storage_key: String,
    /// Expose a rotation control on each light rig.
    pub light_rotation_controls: bool,
    /// Nodes between two progress reports.
    pub progress_interval: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            instance: false,
            instance_all: false,
            keep_names: false,
            keep_groups: false,
            debug: false,
            types: false,
            shadows: false,
            meta: false,
            asset_url: "/model.glb".to_string(),
            decoder: None,
            component_name: "Model".to_string(),
            storage_key: "scene-context".to_string(),
            light_rotation_controls: true,
            progress_interval: 1,
        }
    }
}

impl GenerateOptions {
    pub fn instancing_requested(&self) -> bool {
        self.instance || self.instance_all
    }

    pub fn from_json_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options json at {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse options json at {}", path.display()))
    }
}

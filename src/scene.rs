//! In-memory scene graph handed to the generator.
//!
//! The graph is an arena: nodes, materials and geometries live in flat tables
//! and reference each other by index. It deserializes from the JSON shape
//! exported by scene providers, and can also be assembled in code through the
//! `add_*` builders.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use glam::DVec3;
use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(NodeId, "node");
arena_id!(MaterialId, "material");
arena_id!(GeometryId, "geometry");

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Scene {
    #[serde(default)]
    pub root: NodeId,
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub geometries: Vec<Geometry>,
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId(0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: DVec3,
    /// Euler angles in radians, XYZ order.
    #[serde(default)]
    pub rotation: DVec3,
    #[serde(default = "unit_scale")]
    pub scale: DVec3,
    #[serde(default)]
    pub geometry: Option<GeometryId>,
    #[serde(default)]
    pub material: Option<MaterialId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub cast_shadow: bool,
    #[serde(default)]
    pub receive_shadow: bool,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub camera: Option<CameraParams>,
    #[serde(default)]
    pub light: Option<LightParams>,
    #[serde(default)]
    pub skeleton: Option<Skeleton>,
    #[serde(default)]
    pub morph: Option<MorphTargets>,
    #[serde(default)]
    pub user_data: Option<serde_json::Value>,
}

fn unit_scale() -> DVec3 {
    DVec3::ONE
}

fn default_true() -> bool {
    true
}

impl SceneNode {
    pub fn new(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            name: name.into(),
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
            geometry: None,
            material: None,
            children: Vec::new(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            color: None,
            camera: None,
            light: None,
            skeleton: None,
            morph: None,
            user_data: None,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new("Group", name)
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryId, material: Option<MaterialId>) -> Self {
        Self {
            geometry: Some(geometry),
            material,
            ..Self::new("Mesh", name)
        }
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: DVec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraParams {
    #[serde(default = "one")]
    pub zoom: f64,
    #[serde(default = "default_far")]
    pub far: f64,
    #[serde(default = "default_near")]
    pub near: f64,
    /// Only meaningful for perspective cameras.
    #[serde(default = "default_fov")]
    pub fov: f64,
}

fn one() -> f64 {
    1.0
}
fn default_far() -> f64 {
    2000.0
}
fn default_near() -> f64 {
    0.1
}
fn default_fov() -> f64 {
    50.0
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            zoom: one(),
            far: default_far(),
            near: default_near(),
            fov: default_fov(),
        }
    }
}

/// Light fields as reported by the provider. Absent fields take the light's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightParams {
    #[serde(default)]
    pub intensity: Option<f64>,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub penumbra: Option<f64>,
    #[serde(default)]
    pub decay: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub up: Option<DVec3>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Skeleton {
    #[serde(default)]
    pub bones: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MorphTargets {
    #[serde(default)]
    pub dictionary: BTreeMap<String, usize>,
    #[serde(default)]
    pub influences: Vec<f64>,
}

/// Linear RGB in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Color(pub [f64; 3]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0]);

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("{r:02x}{g:02x}{b:02x}")
    }

    pub fn is_white(self) -> bool {
        self.to_hex() == "ffffff"
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default)]
    pub name: String,
    /// Concrete material class, e.g. `MeshStandardMaterial`.
    #[serde(rename = "type", default = "default_material_type")]
    pub material_type: String,
    #[serde(default)]
    pub metalness: f64,
    #[serde(default = "one")]
    pub roughness: f64,
    #[serde(default)]
    pub clearcoat: Option<f64>,
    #[serde(default)]
    pub clearcoat_roughness: Option<f64>,
    #[serde(default)]
    pub color: Color,
}

fn default_material_type() -> String {
    "MeshStandardMaterial".to_string()
}

impl Material {
    pub fn standard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material_type: default_material_type(),
            metalness: 0.0,
            roughness: 1.0,
            clearcoat: None,
            clearcoat_roughness: None,
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    /// Content identity. Entries sharing a key are the same geometry.
    pub key: String,
    #[serde(default)]
    pub owner: Option<NodeId>,
    #[serde(default)]
    pub vertex_count: Option<u32>,
}

impl Geometry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: None,
            vertex_count: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationClip {
    pub name: String,
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

impl AnimationClip {
    /// Whether this clip drives the node called `name`.
    ///
    /// Substring match against the clip name, exact membership in the target
    /// list; both case-sensitive.
    pub fn references(&self, name: &str) -> bool {
        self.name.contains(name)
            || self
                .targets
                .as_ref()
                .is_some_and(|targets| targets.iter().any(|t| t == name))
    }
}

impl Scene {
    /// A scene holding only an empty root of type `Scene`.
    pub fn new() -> Self {
        Self {
            root: NodeId(0),
            nodes: vec![SceneNode::new("Scene", "Scene")],
            materials: Vec::new(),
            geometries: Vec::new(),
            animations: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn root_node(&self) -> Option<&SceneNode> {
        self.node(self.root)
    }

    /// Appends `node` under `parent` and returns its id.
    pub fn add_node(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }
}

pub fn load_scene_from_path(path: impl AsRef<std::path::Path>) -> Result<Scene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene json at {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scene json at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults_fill_identity_transform() {
        let scene: Scene = serde_json::from_str(
            r#"{
                "nodes": [
                    { "type": "Scene", "children": [1] },
                    { "type": "Mesh", "name": "Cube", "geometry": 0, "position": [1, 2, 3] }
                ],
                "geometries": [ { "key": "g0" } ]
            }"#,
        )
        .unwrap();

        let cube = scene.node(NodeId(1)).unwrap();
        assert_eq!(cube.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(cube.scale, DVec3::ONE);
        assert!(cube.visible);
        assert_eq!(cube.geometry, Some(GeometryId(0)));
        assert_eq!(scene.root, NodeId(0));
    }

    #[test]
    fn color_hex_rounds_channels() {
        assert_eq!(Color([1.0, 0.5, 0.0]).to_hex(), "ff8000");
        assert!(Color::WHITE.is_white());
        assert!(!Color([0.99, 1.0, 1.0]).is_white());
    }

    #[test]
    fn clip_reference_is_case_sensitive_substring_or_member() {
        let clip = AnimationClip {
            name: "ArmatureAction".to_string(),
            targets: Some(vec!["Hip".to_string()]),
        };
        assert!(clip.references("Armature"));
        assert!(clip.references("Hip"));
        assert!(!clip.references("armature"));
        assert!(!clip.references("Hi"));
    }

    #[test]
    fn add_node_links_parent() {
        let mut scene = Scene::new();
        let g = scene.add_node(scene.root, SceneNode::group("Pivot"));
        let root = scene.root_node().unwrap();
        assert_eq!(root.children, vec![g]);
    }
}

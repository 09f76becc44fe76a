//! Control/context emitter.
//!
//! Builds three coupled artifacts over one schema: the default context, the
//! editable control groups (with bounds), and the synchronization plans that
//! push control values onto live materials each frame and back into the
//! context on every render.

mod catalog;

use std::collections::HashSet;

use glam::DVec3;

use crate::{
    context::ContextValue,
    emitter::NodeTree,
    naming::probe_unique,
    numeric::Canonicalizer,
    options::GenerateOptions,
    scene::Scene,
    walker::{MaterialCaps, TransformDelta, Walk},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigKind {
    Model,
    Material,
    PointLight,
    SpotLight,
    Background,
    Cloud,
    Stars,
}

impl RigKind {
    pub fn is_light(self) -> bool {
        matches!(self, RigKind::PointLight | RigKind::SpotLight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Bounds are radians.
    pub angular: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlField {
    pub name: String,
    /// `None` for toggles and colors.
    pub range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlGroup {
    /// Local binding holding the group's current values.
    pub binding: String,
    /// Panel folder title, unique within the set.
    pub title: String,
    pub kind: RigKind,
    /// Location of the group's values in the context.
    pub path: Vec<String>,
    pub fields: Vec<ControlField>,
}

/// Per-frame copy of one material group onto the live material object.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSync {
    pub path: Vec<String>,
    /// Node whose material is the live target.
    pub owner: String,
    pub fields: Vec<String>,
}

/// Per-render copy of one control group back into the context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextSync<'a> {
    pub binding: &'a str,
    pub path: &'a [String],
    pub field: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlSet {
    pub defaults: ContextValue,
    pub groups: Vec<ControlGroup>,
    pub material_sync: Vec<MaterialSync>,
}

impl ControlSet {
    pub fn context_sync(&self) -> impl Iterator<Item = ContextSync<'_>> {
        self.groups.iter().flat_map(|group| {
            group.fields.iter().map(move |field| ContextSync {
                binding: &group.binding,
                path: &group.path,
                field: &field.name,
            })
        })
    }

    pub fn group(&self, binding: &str) -> Option<&ControlGroup> {
        self.groups.iter().find(|g| g.binding == binding)
    }
}

/// Builds the context defaults, control groups and sync plans.
pub fn build_controls(
    scene: &Scene,
    walk: &Walk,
    tree: &NodeTree,
    options: &GenerateOptions,
    canon: &Canonicalizer,
) -> ControlSet {
    let mut defaults = ContextValue::group();
    let mut groups = Vec::new();
    let mut material_sync = Vec::new();
    let mut titles: HashSet<String> = HashSet::new();
    let mut unique_title = |base: &str| {
        let title = probe_unique(base, |t| titles.contains(t));
        titles.insert(title.clone());
        title
    };

    defaults.insert("model", model_defaults(scene));
    groups.push(ControlGroup {
        binding: "model".to_string(),
        title: unique_title("Model"),
        kind: RigKind::Model,
        path: vec!["model".to_string()],
        fields: fields(RigKind::Model, &["position", "rotation", "scale"]),
    });

    let mut materials = ContextValue::group();
    for (ordinal, usage) in walk.index.materials.iter().enumerate() {
        let Some(material) = scene.material(usage.id) else {
            continue;
        };
        let key = ordinal.to_string();
        let names = material_fields(usage.caps);

        let mut values = ContextValue::group()
            .with("metalness", ContextValue::Number(material.metalness))
            .with("roughness", ContextValue::Number(material.roughness));
        if let Some(v) = material.clearcoat.filter(|_| usage.caps.clearcoat) {
            values.insert("clearcoat", ContextValue::Number(v));
        }
        if let Some(v) = material
            .clearcoat_roughness
            .filter(|_| usage.caps.clearcoat_roughness)
        {
            values.insert("clearcoatRoughness", ContextValue::Number(v));
        }
        values.insert(
            "color",
            ContextValue::Text(format!("#{}", material.color.to_hex())),
        );
        materials.insert(key.clone(), values);

        let title = if material.name.is_empty() {
            format!("Material {ordinal}")
        } else {
            material.name.clone()
        };
        let path = vec!["materials".to_string(), key];
        groups.push(ControlGroup {
            binding: format!("material{ordinal}"),
            title: unique_title(&title),
            kind: RigKind::Material,
            path: path.clone(),
            fields: fields(RigKind::Material, &names),
        });
        material_sync.push(MaterialSync {
            path,
            owner: scene.nodes[usage.first_user.index()].name.clone(),
            fields: names.iter().map(|n| n.to_string()).collect(),
        });
    }
    defaults.insert("materials", materials);
    defaults.insert("transforms", transform_defaults(scene, walk, tree, canon));

    for rig in catalog::RIGS {
        let mut values = ContextValue::group();
        for f in rig.fields {
            values.insert(f.name, f.default.to_value());
        }
        defaults.insert(rig.key, values);

        let names: Vec<&str> = rig
            .fields
            .iter()
            .map(|f| f.name)
            .filter(|&n| !(rig.kind.is_light() && n == "rotation" && !options.light_rotation_controls))
            .collect();
        groups.push(ControlGroup {
            binding: rig.key.to_string(),
            title: unique_title(rig.title),
            kind: rig.kind,
            path: vec![rig.key.to_string()],
            fields: fields(rig.kind, &names),
        });
    }

    defaults.canonicalize(canon);
    ControlSet {
        defaults,
        groups,
        material_sync,
    }
}

fn fields(kind: RigKind, names: &[&str]) -> Vec<ControlField> {
    names
        .iter()
        .map(|&name| ControlField {
            name: name.to_string(),
            range: catalog::range(kind, name),
        })
        .collect()
}

fn material_fields(caps: MaterialCaps) -> Vec<&'static str> {
    let mut names = vec!["metalness", "roughness"];
    if caps.clearcoat {
        names.push("clearcoat");
    }
    if caps.clearcoat_roughness {
        names.push("clearcoatRoughness");
    }
    names.push("color");
    names
}

/// Root transform. Uniform scale collapses to a scalar.
fn model_defaults(scene: &Scene) -> ContextValue {
    let (position, rotation, scale) = scene
        .root_node()
        .map(|root| (root.position, root.rotation, root.scale))
        .unwrap_or((DVec3::ZERO, DVec3::ZERO, DVec3::ONE));
    let scale = if scale.x == scale.y && scale.y == scale.z {
        ContextValue::Number(scale.x)
    } else {
        ContextValue::vector(scale.to_array())
    };
    ContextValue::group()
        .with("position", ContextValue::vector(position.to_array()))
        .with("rotation", ContextValue::angles(rotation.to_array()))
        .with("scale", scale)
}

/// Bound transform components of every node that survived emission.
fn transform_defaults(
    scene: &Scene,
    walk: &Walk,
    tree: &NodeTree,
    canon: &Canonicalizer,
) -> ContextValue {
    let mut out = ContextValue::group();
    for (id, key) in &walk.index.transform_keys {
        if tree.is_removed(*id) {
            continue;
        }
        let node = &scene.nodes[id.index()];
        let delta = TransformDelta::of(node, canon);
        let mut entry = ContextValue::group();
        if delta.position {
            entry.insert("position", ContextValue::vector(node.position.to_array()));
        }
        if delta.rotation {
            entry.insert("rotation", ContextValue::angles(node.rotation.to_array()));
        }
        if delta.scale {
            entry.insert("scale", ContextValue::vector(node.scale.to_array()));
        }
        out.insert(key.clone(), entry);
    }
    out
}

//! Static type descriptors for the loaded asset and the context object.

use std::collections::HashSet;

use crate::{
    context::ContextValue,
    emitter::{NodeTree, tags::is_mesh_tag},
    scene::{NodeId, Scene},
    walker::Walk,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Number,
    Boolean,
    String,
    /// Fixed-length numeric tuple.
    Tuple(usize),
    Object(Vec<(String, TypeShape)>),
}

impl TypeShape {
    /// Structural type of a context value.
    pub fn of(value: &ContextValue) -> Self {
        match value {
            ContextValue::Number(_) => TypeShape::Number,
            ContextValue::Bool(_) => TypeShape::Boolean,
            ContextValue::Text(_) => TypeShape::String,
            ContextValue::Vector { values, .. } => TypeShape::Tuple(values.len()),
            ContextValue::Group(entries) => TypeShape::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), TypeShape::of(v)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptors {
    /// Node name to leaf object type, e.g. `("Cube", "Mesh")`.
    pub nodes: Vec<(String, String)>,
    /// Material name to leaf material type.
    pub materials: Vec<(String, String)>,
    /// Clip names; empty when the asset has no animations.
    pub clips: Vec<String>,
    pub context: TypeShape,
}

pub fn build_types(
    scene: &Scene,
    walk: &Walk,
    tree: &NodeTree,
    context: &ContextValue,
) -> TypeDescriptors {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::new();
    for &id in &walk.index.order {
        let node = &scene.nodes[id.index()];
        if node.name.is_empty() || tree.is_removed(id) {
            continue;
        }
        let qualifies = is_mesh_tag(&node.node_type) || is_top_level_bone(scene, walk, id);
        if qualifies && seen.insert(node.name.as_str()) {
            nodes.push((node.name.clone(), node.node_type.clone()));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut materials = Vec::new();
    for usage in &walk.index.materials {
        let Some(material) = scene.material(usage.id) else {
            continue;
        };
        if !material.name.is_empty() && seen.insert(material.name.as_str()) {
            materials.push((material.name.clone(), material.material_type.clone()));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let clips = scene
        .animations
        .iter()
        .filter(|clip| seen.insert(clip.name.as_str()))
        .map(|clip| clip.name.clone())
        .collect();

    TypeDescriptors {
        nodes,
        materials,
        clips,
        context: TypeShape::of(context),
    }
}

fn is_top_level_bone(scene: &Scene, walk: &Walk, id: NodeId) -> bool {
    scene.nodes[id.index()].node_type == "Bone"
        && walk
            .index
            .parent(id)
            .is_none_or(|p| scene.nodes[p.index()].node_type != "Bone")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dialect::ReactThreeFiber,
        emitter::emit_tree,
        numeric::Canonicalizer,
        options::GenerateOptions,
        scene::{AnimationClip, Geometry, Material, SceneNode},
        walker::walk,
    };

    fn types(scene: &Scene) -> TypeDescriptors {
        let options = GenerateOptions::default();
        let canon = Canonicalizer::default();
        let w = walk(scene, &options, &canon, None);
        let tree = emit_tree(scene, &w, &options, &canon, &ReactThreeFiber, None);
        build_types(scene, &w, &tree, &ContextValue::group())
    }

    #[test]
    fn named_meshes_and_top_level_bones() {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::new("g"));
        let mut physical = Material::standard("Glass");
        physical.material_type = "MeshPhysicalMaterial".to_string();
        let m = scene.add_material(physical);
        let armature = scene.add_node(scene.root, SceneNode::group("Armature"));
        let hip = scene.add_node(armature, SceneNode::new("Bone", "Hip"));
        scene.add_node(hip, SceneNode::new("Bone", "Spine"));
        scene.add_node(armature, SceneNode::new("SkinnedMesh", "Body"));
        scene.nodes[4].geometry = Some(g);
        scene.add_node(scene.root, SceneNode::mesh("Pane", g, Some(m)));

        let t = types(&scene);
        assert_eq!(
            t.nodes,
            vec![
                ("Hip".to_string(), "Bone".to_string()),
                ("Body".to_string(), "SkinnedMesh".to_string()),
                ("Pane".to_string(), "Mesh".to_string()),
            ]
        );
        assert_eq!(
            t.materials,
            vec![("Glass".to_string(), "MeshPhysicalMaterial".to_string())]
        );
        assert!(t.clips.is_empty());
    }

    #[test]
    fn clip_names_are_deduplicated() {
        let mut scene = Scene::new();
        for name in ["Walk", "Run", "Walk"] {
            scene.animations.push(AnimationClip {
                name: name.to_string(),
                targets: None,
            });
        }
        assert_eq!(types(&scene).clips, vec!["Walk", "Run"]);
    }

    #[test]
    fn context_shape_mirrors_values() {
        let ctx = ContextValue::group()
            .with("scale", ContextValue::Number(1.0))
            .with("position", ContextValue::vector([0.0; 3]))
            .with("fade", ContextValue::Bool(true))
            .with("top", ContextValue::Text("#000000".to_string()));
        assert_eq!(
            TypeShape::of(&ctx),
            TypeShape::Object(vec![
                ("scale".to_string(), TypeShape::Number),
                ("position".to_string(), TypeShape::Tuple(3)),
                ("fade".to_string(), TypeShape::Boolean),
                ("top".to_string(), TypeShape::String),
            ])
        );
    }
}

//! Fail-fast structural validation of an input scene.
//!
//! Runs before any walk or emission so malformed graphs never produce
//! partial text.

use std::collections::HashMap;

use thiserror::Error;

use crate::{
    emitter::tags::{NodeClass, classify, is_mesh_tag},
    scene::{GeometryId, MaterialId, NodeId, Scene},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("root {0} does not exist")]
    MissingRoot(NodeId),

    #[error("{parent} lists child {child} which does not exist")]
    DanglingChild { parent: NodeId, child: NodeId },

    #[error("{child} is attached to both {first} and {second}")]
    SharedChild {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },

    #[error("cycle detected: {node} is its own ancestor")]
    Cycle { node: NodeId },

    #[error("mesh {node} ({name:?}) has no geometry")]
    MissingGeometry { node: NodeId, name: String },

    /// The emitted tree reaches this node's live object by name.
    #[error("{node_type} {node} has no name")]
    UnnamedNode { node: NodeId, node_type: String },

    #[error("{node} references {material} which does not exist")]
    DanglingMaterial { node: NodeId, material: MaterialId },

    #[error("{node} references {geometry} which does not exist")]
    DanglingGeometry { node: NodeId, geometry: GeometryId },

    #[error("geometry {key:?} is declared with inconsistent vertex counts ({first} vs {second})")]
    InconsistentGeometry { key: String, first: u32, second: u32 },

    #[error("geometry {key:?} names owner {owner} which does not use it")]
    DanglingOwner { key: String, owner: NodeId },

    #[error("skeleton of {node} references bone {bone} which does not exist")]
    DanglingBone { node: NodeId, bone: NodeId },
}

pub fn validate_scene(scene: &Scene) -> Result<(), SceneError> {
    if scene.node(scene.root).is_none() {
        return Err(SceneError::MissingRoot(scene.root));
    }

    check_tree_shape(scene)?;

    for (index, node) in scene.nodes.iter().enumerate() {
        let id = NodeId(index);
        if let Some(geometry) = node.geometry {
            if scene.geometry(geometry).is_none() {
                return Err(SceneError::DanglingGeometry { node: id, geometry });
            }
        } else if is_mesh_tag(&node.node_type) {
            return Err(SceneError::MissingGeometry {
                node: id,
                name: node.name.clone(),
            });
        }
        if node.name.is_empty()
            && (node.geometry.is_some() || classify(&node.node_type) == NodeClass::Bone)
        {
            return Err(SceneError::UnnamedNode {
                node: id,
                node_type: node.node_type.clone(),
            });
        }
        if let Some(material) = node.material {
            if scene.material(material).is_none() {
                return Err(SceneError::DanglingMaterial { node: id, material });
            }
        }
        if let Some(skeleton) = &node.skeleton {
            if let Some(&bone) = skeleton.bones.iter().find(|b| scene.node(**b).is_none()) {
                return Err(SceneError::DanglingBone { node: id, bone });
            }
        }
    }

    check_geometries(scene)
}

/// Every node reachable from the root has exactly one parent and no node is
/// its own ancestor. Unreachable nodes are ignored.
fn check_tree_shape(scene: &Scene) -> Result<(), SceneError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unseen,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unseen; scene.nodes.len()];
    let mut parent_of: HashMap<NodeId, NodeId> = HashMap::new();

    // (node, next child index); explicit stack so deep graphs cannot overflow.
    let mut stack: Vec<(NodeId, usize)> = vec![(scene.root, 0)];
    marks[scene.root.0] = Mark::OnPath;

    while let Some((id, next)) = stack.last_mut() {
        let id = *id;
        let children = &scene.nodes[id.0].children;
        if *next >= children.len() {
            marks[id.0] = Mark::Done;
            stack.pop();
            continue;
        }
        let child = children[*next];
        *next += 1;

        if scene.node(child).is_none() {
            return Err(SceneError::DanglingChild { parent: id, child });
        }
        match marks[child.0] {
            Mark::OnPath => return Err(SceneError::Cycle { node: child }),
            Mark::Done => {
                let first = parent_of.get(&child).copied().unwrap_or(scene.root);
                return Err(SceneError::SharedChild {
                    child,
                    first,
                    second: id,
                });
            }
            Mark::Unseen => {
                parent_of.insert(child, id);
                marks[child.0] = Mark::OnPath;
                stack.push((child, 0));
            }
        }
    }
    Ok(())
}

fn check_geometries(scene: &Scene) -> Result<(), SceneError> {
    let mut vertex_counts: HashMap<&str, u32> = HashMap::new();
    for geometry in &scene.geometries {
        if let Some(count) = geometry.vertex_count {
            match vertex_counts.get(geometry.key.as_str()) {
                Some(&first) if first != count => {
                    return Err(SceneError::InconsistentGeometry {
                        key: geometry.key.clone(),
                        first,
                        second: count,
                    });
                }
                Some(_) => {}
                None => {
                    vertex_counts.insert(geometry.key.as_str(), count);
                }
            }
        }

        if let Some(owner) = geometry.owner {
            let uses_it = scene
                .node(owner)
                .and_then(|n| n.geometry)
                .and_then(|g| scene.geometry(g))
                .is_some_and(|g| g.key == geometry.key);
            if !uses_it {
                return Err(SceneError::DanglingOwner {
                    key: geometry.key.clone(),
                    owner,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, Material, SceneNode};

    fn cube_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::new("cube"));
        let m = scene.add_material(Material::standard("Steel"));
        let cube = scene.add_node(scene.root, SceneNode::mesh("Cube", g, Some(m)));
        (scene, cube)
    }

    #[test]
    fn well_formed_scene_passes() {
        let (scene, _) = cube_scene();
        assert_eq!(validate_scene(&scene), Ok(()));
    }

    #[test]
    fn mesh_without_geometry_is_rejected() {
        let (mut scene, cube) = cube_scene();
        scene.nodes[cube.0].geometry = None;
        assert!(matches!(
            validate_scene(&scene),
            Err(SceneError::MissingGeometry { node, .. }) if node == cube
        ));
    }

    #[test]
    fn unnamed_mesh_is_rejected() {
        let (mut scene, cube) = cube_scene();
        scene.nodes[cube.0].name.clear();
        assert_eq!(
            validate_scene(&scene),
            Err(SceneError::UnnamedNode {
                node: cube,
                node_type: "Mesh".to_string()
            })
        );
    }

    #[test]
    fn unnamed_bone_is_rejected_but_unnamed_group_is_fine() {
        let (mut scene, _) = cube_scene();
        scene.add_node(scene.root, SceneNode::group(""));
        assert_eq!(validate_scene(&scene), Ok(()));
        let bone = scene.add_node(scene.root, SceneNode::new("Bone", ""));
        assert!(matches!(
            validate_scene(&scene),
            Err(SceneError::UnnamedNode { node, .. }) if node == bone
        ));
    }

    #[test]
    fn dangling_material_is_rejected() {
        let (mut scene, cube) = cube_scene();
        scene.nodes[cube.0].material = Some(MaterialId(7));
        assert_eq!(
            validate_scene(&scene),
            Err(SceneError::DanglingMaterial {
                node: cube,
                material: MaterialId(7)
            })
        );
    }

    #[test]
    fn cycle_is_rejected() {
        let (mut scene, cube) = cube_scene();
        scene.nodes[cube.0].children.push(scene.root);
        assert_eq!(
            validate_scene(&scene),
            Err(SceneError::Cycle { node: scene.root })
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let (mut scene, cube) = cube_scene();
        scene.nodes[cube.0].children.push(cube);
        assert_eq!(validate_scene(&scene), Err(SceneError::Cycle { node: cube }));
    }

    #[test]
    fn shared_child_is_rejected() {
        let (mut scene, cube) = cube_scene();
        let pivot = scene.add_node(scene.root, SceneNode::group("Pivot"));
        scene.nodes[pivot.0].children.push(cube);
        assert!(matches!(
            validate_scene(&scene),
            Err(SceneError::SharedChild { child, .. }) if child == cube
        ));
    }

    #[test]
    fn dangling_child_is_rejected() {
        let (mut scene, _) = cube_scene();
        let root = scene.root;
        scene.nodes[root.0].children.push(NodeId(99));
        assert_eq!(
            validate_scene(&scene),
            Err(SceneError::DanglingChild {
                parent: root,
                child: NodeId(99)
            })
        );
    }

    #[test]
    fn inconsistent_geometry_counts_are_rejected() {
        let (mut scene, _) = cube_scene();
        scene.geometries[0].vertex_count = Some(24);
        let mut twin = Geometry::new("cube");
        twin.vertex_count = Some(36);
        scene.add_geometry(twin);
        assert!(matches!(
            validate_scene(&scene),
            Err(SceneError::InconsistentGeometry { first: 24, second: 36, .. })
        ));
    }

    #[test]
    fn owner_must_use_the_geometry() {
        let (mut scene, _) = cube_scene();
        scene.geometries[0].owner = Some(scene.root);
        assert!(matches!(
            validate_scene(&scene),
            Err(SceneError::DanglingOwner { .. })
        ));
    }
}

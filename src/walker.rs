//! Flattens the scene graph and tallies duplicate materials and geometries.
//!
//! The walker never copies nodes. It builds index structures keyed by node,
//! material and geometry identity that every emitter reads afterwards:
//!
//! - pre-order node list and parent links
//! - material usage counts by name, and one capability record per material
//! - the geometry registry: first-sighting display names, usage counts, and
//!   the node whose geometry is shared when instancing
//! - unique context keys for nodes whose transform is bound to state

use std::collections::{BTreeMap, HashMap, HashSet, hash_map::Entry};

use glam::DVec3;
use serde::Serialize;

use crate::{
    emitter::tags::is_mesh_tag,
    naming::{display_base_name, probe_unique},
    numeric::Canonicalizer,
    options::GenerateOptions,
    progress::{ProgressSink, Stage, Ticker},
    scene::{Material, MaterialId, NodeId, Scene, SceneNode},
};

/// Optional PBR fields a material exposes, computed once per material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterialCaps {
    pub clearcoat: bool,
    pub clearcoat_roughness: bool,
}

impl MaterialCaps {
    pub fn of(material: &Material) -> Self {
        Self {
            clearcoat: material.clearcoat.is_some(),
            clearcoat_roughness: material.clearcoat_roughness.is_some(),
        }
    }
}

/// A material carried by at least one mesh, in first-use order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialUse {
    pub id: MaterialId,
    pub first_user: NodeId,
    pub caps: MaterialCaps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeometryEntry {
    pub key: String,
    pub count: usize,
    /// Unique display name within the registry.
    pub name: String,
    /// Node whose geometry the shared instance is built from.
    pub owner: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateRegistry {
    pub materials: BTreeMap<String, usize>,
    pub geometries: Vec<GeometryEntry>,
    #[serde(skip)]
    by_key: HashMap<String, usize>,
}

impl DuplicateRegistry {
    pub fn geometry(&self, key: &str) -> Option<&GeometryEntry> {
        self.by_key.get(key).map(|&i| &self.geometries[i])
    }

    pub fn material_count(&self, name: &str) -> usize {
        self.materials.get(name).copied().unwrap_or(0)
    }

    fn sight_geometry(&mut self, key: &str, node_id: NodeId, node: &SceneNode, owner: Option<NodeId>) {
        if let Some(&i) = self.by_key.get(key) {
            self.geometries[i].count += 1;
            return;
        }
        let base = display_base_name(&node.name);
        let name = probe_unique(&base, |candidate| {
            self.geometries.iter().any(|g| g.name == candidate)
        });
        self.by_key.insert(key.to_string(), self.geometries.len());
        self.geometries.push(GeometryEntry {
            key: key.to_string(),
            count: 1,
            name,
            owner: owner.unwrap_or(node_id),
        });
    }

    /// Drops geometries that are not repeated. Returns how many were dropped.
    fn prune_single_use(&mut self) -> usize {
        let before = self.geometries.len();
        self.geometries.retain(|g| g.count > 1);
        self.by_key = self
            .geometries
            .iter()
            .enumerate()
            .map(|(i, g)| (g.key.clone(), i))
            .collect();
        before - self.geometries.len()
    }
}

#[derive(Debug, Clone)]
pub struct SceneIndex {
    /// Every node reachable from the root, pre-order, root first.
    pub order: Vec<NodeId>,
    pub parents: HashMap<NodeId, NodeId>,
    pub materials: Vec<MaterialUse>,
    /// State keys for nodes whose transform is not the identity, in `order`.
    pub transform_keys: Vec<(NodeId, String)>,
    material_slots: HashMap<MaterialId, usize>,
    transform_slots: HashMap<NodeId, usize>,
}

impl SceneIndex {
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn material_use(&self, id: MaterialId) -> Option<&MaterialUse> {
        self.material_slots.get(&id).map(|&i| &self.materials[i])
    }

    pub fn transform_key(&self, id: NodeId) -> Option<&str> {
        self.transform_slots
            .get(&id)
            .map(|&i| self.transform_keys[i].1.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Walk {
    pub index: SceneIndex,
    pub registry: DuplicateRegistry,
    /// Instancing was requested and at least one geometry survived pruning.
    pub instancing: bool,
}

/// Which transform components differ from the identity at `canon` precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformDelta {
    pub position: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl TransformDelta {
    pub fn of(node: &SceneNode, canon: &Canonicalizer) -> Self {
        Self {
            position: canon.round(node.position.length()) != 0.0,
            rotation: canon.round(node.rotation.length()) != 0.0,
            scale: !is_unit(node.scale, canon),
        }
    }

    pub fn any(self) -> bool {
        self.position || self.rotation || self.scale
    }
}

fn is_unit(v: DVec3, canon: &Canonicalizer) -> bool {
    v.to_array().iter().all(|&c| canon.round(c) == 1.0)
}

/// Walks a validated scene.
pub fn walk(
    scene: &Scene,
    options: &GenerateOptions,
    canon: &Canonicalizer,
    progress: Option<&dyn ProgressSink>,
) -> Walk {
    let (order, parents) = flatten(scene);
    let mut ticker = Ticker::new(progress, Stage::Walk, options.progress_interval, order.len());

    let mut registry = DuplicateRegistry::default();
    let mut materials: Vec<MaterialUse> = Vec::new();
    let mut material_slots: HashMap<MaterialId, usize> = HashMap::new();
    let mut transform_keys: Vec<(NodeId, String)> = Vec::new();
    let mut transform_slots: HashMap<NodeId, usize> = HashMap::new();
    let mut taken_keys: HashSet<String> = HashSet::new();
    // Bones and everything below them are emitted as live references.
    let mut skinned: HashSet<NodeId> = HashSet::new();

    for &id in &order {
        ticker.tick();
        let node = &scene.nodes[id.index()];

        let parent_skinned = parents.get(&id).is_some_and(|p| skinned.contains(p));
        if node.node_type == "Bone" || parent_skinned {
            skinned.insert(id);
        }

        if id != scene.root
            && !skinned.contains(&id)
            && TransformDelta::of(node, canon).any()
        {
            let base = if node.name.is_empty() {
                "node".to_string()
            } else {
                node.name.clone()
            };
            let key = probe_unique(&base, |k| taken_keys.contains(k));
            taken_keys.insert(key.clone());
            transform_slots.insert(id, transform_keys.len());
            transform_keys.push((id, key));
        }

        if !is_mesh_tag(&node.node_type) {
            continue;
        }

        if let Some(material_id) = node.material {
            if let Some(material) = scene.material(material_id) {
                *registry.materials.entry(material.name.clone()).or_insert(0) += 1;
                if let Entry::Vacant(slot) = material_slots.entry(material_id) {
                    slot.insert(materials.len());
                    materials.push(MaterialUse {
                        id: material_id,
                        first_user: id,
                        caps: MaterialCaps::of(material),
                    });
                }
            }
        }

        if let Some(geometry) = node.geometry.and_then(|g| scene.geometry(g)) {
            let owner = scene
                .geometries
                .iter()
                .find(|g| g.key == geometry.key && g.owner.is_some())
                .and_then(|g| g.owner);
            registry.sight_geometry(&geometry.key, id, node, owner);
        }
    }

    if !options.instance_all {
        let pruned = registry.prune_single_use();
        log::debug!("duplicate registry: pruned {pruned} single-use geometries");
    }
    let instancing = options.instancing_requested() && !registry.geometries.is_empty();
    if instancing {
        log::debug!(
            "instancing active for {} shared geometries",
            registry.geometries.len()
        );
    }

    Walk {
        index: SceneIndex {
            order,
            parents,
            materials,
            transform_keys,
            material_slots,
            transform_slots,
        },
        registry,
        instancing,
    }
}

fn flatten(scene: &Scene) -> (Vec<NodeId>, HashMap<NodeId, NodeId>) {
    let mut order = Vec::with_capacity(scene.nodes.len());
    let mut parents = HashMap::new();
    let mut stack = vec![scene.root];
    while let Some(id) = stack.pop() {
        order.push(id);
        let children = &scene.nodes[id.index()].children;
        for &child in children.iter().rev() {
            parents.insert(child, id);
            stack.push(child);
        }
    }
    (order, parents)
}

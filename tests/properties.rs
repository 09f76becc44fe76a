use std::collections::HashSet;
use std::f64::consts::PI;

use glam::DVec3;
use proptest::prelude::*;
use scene_forge_jsx::{
    GenerateOptions, Generator, Scene,
    naming::property_access,
    numeric::{Canonicalizer, Numeric, PiRelation},
    scene::{Geometry, Material, SceneNode},
};

#[derive(Debug, Clone)]
struct NodeSpec {
    parent: usize,
    kind: u8,
    name: String,
    geometry: usize,
    moved: bool,
}

fn node_spec() -> impl Strategy<Value = NodeSpec> {
    (
        any::<usize>(),
        0u8..4,
        "[a-zA-Z0-9_. ]{0,8}",
        0usize..4,
        any::<bool>(),
    )
        .prop_map(|(parent, kind, name, geometry, moved)| NodeSpec {
            parent,
            kind,
            name,
            geometry,
            moved,
        })
}

/// A valid tree: each node hangs off one of the nodes created before it.
fn build_scene(specs: &[NodeSpec]) -> Scene {
    let mut scene = Scene::new();
    let geometries: Vec<_> = (0..4)
        .map(|i| scene.add_geometry(Geometry::new(format!("geo-{i}"))))
        .collect();
    let materials = [
        scene.add_material(Material::standard("Paint")),
        scene.add_material(Material::standard("Steel")),
    ];
    let mut containers = vec![scene.root];
    for spec in specs {
        let parent = containers[spec.parent % containers.len()];
        let mut node = match spec.kind {
            0 => SceneNode::group(spec.name.clone()),
            1 => SceneNode::new("PointLight", spec.name.clone()),
            // Meshes are reached by name in the loaded asset.
            _ if spec.name.is_empty() => SceneNode::mesh(
                "Mesh",
                geometries[spec.geometry],
                Some(materials[spec.geometry % 2]),
            ),
            _ => SceneNode::mesh(
                spec.name.clone(),
                geometries[spec.geometry],
                Some(materials[spec.geometry % 2]),
            ),
        };
        if spec.moved {
            node = node.with_position(DVec3::new(1.0, 0.0, 0.0));
        }
        let id = scene.add_node(parent, node);
        if spec.kind == 0 {
            containers.push(id);
        }
    }
    scene
}

proptest! {
    #[test]
    fn output_is_deterministic(
        specs in prop::collection::vec(node_spec(), 0..24),
        instance in any::<bool>(),
        keep_groups in any::<bool>(),
    ) {
        let scene = build_scene(&specs);
        let options = GenerateOptions { instance, keep_groups, ..Default::default() };
        let first = Generator::new(options.clone()).generate(&scene).unwrap();
        let second = Generator::new(options).generate(&scene).unwrap();
        prop_assert_eq!(first.text, second.text);
        prop_assert_eq!(first.context, second.context);
    }

    #[test]
    fn geometry_display_names_are_unique(specs in prop::collection::vec(node_spec(), 0..32)) {
        let scene = build_scene(&specs);
        let options = GenerateOptions { instance_all: true, ..Default::default() };
        let unit = Generator::new(options).generate(&scene).unwrap();
        let mut seen = HashSet::new();
        for entry in &unit.registry.geometries {
            prop_assert!(seen.insert(entry.name.clone()), "duplicate name {}", entry.name);
        }
    }

    #[test]
    fn instanced_geometries_are_repeated(specs in prop::collection::vec(node_spec(), 0..32)) {
        let scene = build_scene(&specs);
        let options = GenerateOptions { instance: true, ..Default::default() };
        let unit = Generator::new(options).generate(&scene).unwrap();
        for entry in &unit.registry.geometries {
            prop_assert!(entry.count > 1);
        }
    }

    #[test]
    fn elision_leaves_no_empty_groups(specs in prop::collection::vec(node_spec(), 0..24)) {
        let scene = build_scene(&specs);
        let text = Generator::new(GenerateOptions::default())
            .generate(&scene)
            .unwrap()
            .text;
        prop_assert!(!text.contains("<group />"));
        prop_assert!(!text.contains("<group>"));
    }

    #[test]
    fn keep_groups_emits_every_reachable_group(specs in prop::collection::vec(node_spec(), 0..24)) {
        let scene = build_scene(&specs);
        let options = GenerateOptions { keep_groups: true, ..Default::default() };
        let text = Generator::new(options).generate(&scene).unwrap().text;
        let groups = specs.iter().filter(|s| s.kind == 0).count();
        // The model wrapper adds one more.
        let emitted = text.lines().filter(|l| l.trim_start().starts_with("<group")).count();
        prop_assert_eq!(emitted, groups + 1);
    }

    #[test]
    fn property_access_never_emits_invalid_dotted_names(name in "\\PC{0,12}") {
        let access = property_access("nodes", &name);
        if let Some(rest) = access.strip_prefix("nodes.") {
            prop_assert!(!rest.is_empty());
            prop_assert!(!rest.starts_with(|c: char| c.is_ascii_digit()));
            prop_assert!(!rest.contains(|c: char| c.is_whitespace() || c == '.' || c == '\''));
        } else {
            prop_assert!(access.starts_with("nodes['"));
            prop_assert!(access.ends_with("']"));
        }
    }

    #[test]
    fn fractions_of_pi_are_symbolic(i in 2u32..=10, negative in any::<bool>()) {
        let sign = if negative { -1.0 } else { 1.0 };
        let c = Canonicalizer::default();
        prop_assert_eq!(
            c.angle(sign * PI / f64::from(i)),
            Numeric::Pi { negative, relation: PiRelation::Div(i) }
        );
        prop_assert_eq!(
            c.angle(sign * PI * f64::from(i)),
            Numeric::Pi { negative, relation: PiRelation::Mul(i) }
        );
    }
}

#[test]
fn removal_markers_do_not_leak_between_runs() {
    let mut scene = Scene::new();
    let wrapper = scene.add_node(scene.root, SceneNode::group(""));
    scene.add_node(wrapper, SceneNode::group(""));
    let elided = Generator::new(GenerateOptions::default())
        .generate(&scene)
        .unwrap();
    assert!(!elided.text.contains("<group>"));

    let kept = Generator::new(GenerateOptions {
        keep_groups: true,
        ..Default::default()
    })
    .generate(&scene)
    .unwrap();
    assert!(kept.text.contains("<group>\n"));
    assert_eq!(scene.node(wrapper).map(|n| n.children.len()), Some(1));
}

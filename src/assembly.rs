//! Top-level assembly: validates the scene, runs every emitter and joins the
//! blocks in a fixed order.
//!
//! 1. imports
//! 2. type descriptors (typed mode only)
//! 3. default context
//! 4. node tree, inside the model component
//! 5. control descriptors and sync hooks
//! 6. host scaffold with save/load wiring

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::{
    context::ContextValue,
    controls::{ControlSet, RigKind, build_controls},
    dialect::{Dialect, ReactThreeFiber},
    emitter::emit_tree,
    numeric::Canonicalizer,
    options::GenerateOptions,
    progress::ProgressSink,
    scene::Scene,
    types_emit::build_types,
    validate::validate_scene,
    walker::{DuplicateRegistry, walk},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportNeeds {
    pub typed: bool,
    pub instancing: bool,
    pub animations: bool,
    /// Camera components used by the node tree.
    pub cameras: BTreeSet<String>,
    pub clouds: bool,
    pub stars: bool,
}

/// One entry of the shared instance table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub name: String,
    /// Node whose mesh the instance is built from.
    pub owner: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelShell<'a> {
    pub component: &'a str,
    pub asset_url: &'a str,
    pub decoder: Option<&'a str>,
    pub tree: &'a str,
    pub instances: &'a [InstanceRef],
    pub animated: bool,
    pub typed: bool,
    /// Already formatted text for the debug comment.
    pub debug_dump: Option<&'a str>,
    /// Context path of the root transform.
    pub model_path: &'a [String],
}

#[derive(Debug, Clone, Copy)]
pub struct HostShell<'a> {
    pub component: &'a str,
    pub storage_key: &'a str,
    pub instancing: bool,
    pub typed: bool,
    pub controls: &'a ControlSet,
}

#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub text: String,
    /// Context defaults, after any saved blob was applied.
    pub context: ContextValue,
    pub registry: DuplicateRegistry,
}

pub struct Generator<'p, D: Dialect = ReactThreeFiber> {
    options: GenerateOptions,
    dialect: D,
    progress: Option<&'p dyn ProgressSink>,
    saved_context: Option<serde_json::Value>,
}

impl Generator<'static, ReactThreeFiber> {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            dialect: ReactThreeFiber,
            progress: None,
            saved_context: None,
        }
    }
}

impl<'p, D: Dialect> Generator<'p, D> {
    pub fn with_dialect<E: Dialect>(self, dialect: E) -> Generator<'p, E> {
        Generator {
            options: self.options,
            dialect,
            progress: self.progress,
            saved_context: self.saved_context,
        }
    }

    pub fn with_progress<'q>(self, sink: &'q dyn ProgressSink) -> Generator<'q, D> {
        Generator {
            options: self.options,
            dialect: self.dialect,
            progress: Some(sink),
            saved_context: self.saved_context,
        }
    }

    /// Overlay a previously saved context blob onto the emitted defaults.
    pub fn with_saved_context(mut self, saved: serde_json::Value) -> Self {
        self.saved_context = Some(saved);
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn generate(&self, scene: &Scene) -> Result<GeneratedUnit> {
        validate_scene(scene).context("scene failed validation")?;

        let options = &self.options;
        let d = &self.dialect;
        let canon = Canonicalizer::new(options.precision);

        let walk = walk(scene, options, &canon, self.progress);
        let tree = emit_tree(scene, &walk, options, &canon, d, self.progress);
        let mut controls = build_controls(scene, &walk, &tree, options, &canon);
        if let Some(saved) = &self.saved_context {
            controls.defaults.apply_saved(saved);
            controls.defaults.canonicalize(&canon);
        }

        let instances: Vec<InstanceRef> = if walk.instancing {
            walk.registry
                .geometries
                .iter()
                .map(|entry| InstanceRef {
                    name: entry.name.clone(),
                    owner: scene.nodes[entry.owner.index()].name.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let debug_dump = if options.debug {
            let json = serde_json::to_string_pretty(&walk.registry)
                .context("failed to serialize duplicate registry")?;
            Some(format!("duplicate registry\n{json}"))
        } else {
            None
        };

        let animated = !scene.animations.is_empty();
        let has_kind = |kind: RigKind| controls.groups.iter().any(|g| g.kind == kind);
        let needs = ImportNeeds {
            typed: options.types,
            instancing: !instances.is_empty(),
            animations: animated,
            cameras: tree.cameras.clone(),
            clouds: has_kind(RigKind::Cloud),
            stars: has_kind(RigKind::Stars),
        };

        let model_path = controls
            .group("model")
            .map(|g| g.path.clone())
            .unwrap_or_else(|| vec!["model".to_string()]);

        let mut blocks = vec![d.imports(&needs)];
        if options.types {
            let types = build_types(scene, &walk, &tree, &controls.defaults);
            blocks.push(d.type_block(&types));
        }
        blocks.push(d.context_literal(&controls.defaults, &canon));
        blocks.push(d.model_block(&ModelShell {
            component: &options.component_name,
            asset_url: &options.asset_url,
            decoder: options.decoder.as_deref(),
            tree: &tree.text,
            instances: &instances,
            animated,
            typed: options.types,
            debug_dump: debug_dump.as_deref(),
            model_path: &model_path,
        }));
        blocks.push(d.control_block(&controls, &canon, options.types));
        blocks.push(d.host_block(&HostShell {
            component: &options.component_name,
            storage_key: &options.storage_key,
            instancing: !instances.is_empty(),
            typed: options.types,
            controls: &controls,
        }));

        let text = blocks.join("\n");
        log::info!(
            "generated {} bytes: {} nodes, {} removed, {} instanced geometries",
            text.len(),
            walk.index.order.len(),
            tree.removed.len(),
            instances.len()
        );

        Ok(GeneratedUnit {
            text,
            context: controls.defaults,
            registry: walk.registry,
        })
    }
}

/// Generates the source unit for `scene` with the default dialect.
pub fn generate(scene: &Scene, options: &GenerateOptions) -> Result<String> {
    Ok(Generator::new(options.clone()).generate(scene)?.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AnimationClip, Geometry, Material, SceneNode};
    use glam::DVec3;
    use serde_json::json;

    fn cube_scene() -> Scene {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::new("cube"));
        let m = scene.add_material(Material::standard("Steel"));
        scene.add_node(
            scene.root,
            SceneNode::mesh("Cube", g, Some(m)).with_position(DVec3::new(0.0, 1.0, 0.0)),
        );
        scene
    }

    fn position_of(text: &str, needle: &str) -> usize {
        text.find(needle)
            .unwrap_or_else(|| panic!("missing {needle:?} in output"))
    }

    #[test]
    fn blocks_follow_fixed_order() {
        let options = GenerateOptions {
            types: true,
            ..Default::default()
        };
        let text = generate(&cube_scene(), &options).unwrap();
        let order = [
            "import * as THREE",
            "type GLTFResult",
            "const defaultContext",
            "export function Model",
            "function useSceneControls",
            "export default function App",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position_of(&text, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn untyped_output_has_no_type_block() {
        let text = generate(&cube_scene(), &GenerateOptions::default()).unwrap();
        assert!(!text.contains("type GLTFResult"));
        assert!(!text.contains("import * as THREE"));
    }

    #[test]
    fn invalid_scene_produces_no_text() {
        let mut scene = cube_scene();
        scene.nodes[0].children.push(crate::scene::NodeId(42));
        let err = generate(&scene, &GenerateOptions::default()).unwrap_err();
        assert!(err.downcast_ref::<crate::validate::SceneError>().is_some());
    }

    #[test]
    fn saved_context_overrides_defaults() {
        let unit = Generator::new(GenerateOptions::default())
            .with_saved_context(json!({ "stars": { "count": 1200, "fade": false } }))
            .generate(&cube_scene())
            .unwrap();
        assert_eq!(
            unit.context.get_path(&["stars", "count"]),
            Some(&ContextValue::Number(1200.0))
        );
        assert!(unit.text.contains("count: 1200,"));
        assert!(unit.text.contains("fade: false,"));
    }

    #[test]
    fn debug_dump_embeds_registry() {
        let options = GenerateOptions {
            debug: true,
            ..Default::default()
        };
        let text = generate(&cube_scene(), &options).unwrap();
        assert!(text.contains(" * duplicate registry\n"));
        assert!(text.contains("\"Steel\": 1"));
    }

    #[test]
    fn decoder_is_passed_verbatim() {
        let options = GenerateOptions {
            decoder: Some("'/draco-gltf/'".to_string()),
            ..Default::default()
        };
        let text = generate(&cube_scene(), &options).unwrap();
        assert!(text.contains("useGLTF('/model.glb', '/draco-gltf/')"));
    }

    #[test]
    fn animations_wire_a_group_ref() {
        let mut scene = cube_scene();
        scene.animations.push(AnimationClip {
            name: "Spin".to_string(),
            targets: Some(vec!["Cube".to_string()]),
        });
        let text = generate(&scene, &GenerateOptions::default()).unwrap();
        assert!(text.contains("useAnimations(animations, group)"));
        assert!(text.contains("<group ref={group} {...props}"));
        assert!(text.contains("name=\"Cube\""));
    }

    #[test]
    fn instancing_adds_instance_table() {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::new("bolt"));
        scene.add_node(scene.root, SceneNode::mesh("Bolt", g, None));
        scene.add_node(
            scene.root,
            SceneNode::mesh("Bolt2", g, None).with_position(DVec3::X),
        );
        let options = GenerateOptions {
            instance: true,
            ..Default::default()
        };
        let text = generate(&scene, &options).unwrap();
        assert!(text.contains("export function Instances"));
        assert!(text.contains("      Bolt: nodes.Bolt,\n"));
        assert!(text.contains("<Instances>"));
        assert!(text.contains("import { useGLTF, Merged,"));
    }
}

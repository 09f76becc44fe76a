//! Attribute policy: which attributes a node carries, in emission order.

use std::f64::consts::PI;

use glam::DVec3;

use super::{EmitContext, tags::NodeClass};
use crate::{
    dialect::{Attribute, Dialect, Scope},
    numeric::Canonicalizer,
    scene::{NodeId, SceneNode},
    walker::TransformDelta,
};

const DEFAULT_ZOOM: f64 = 1.0;
const DEFAULT_FAR: f64 = 2000.0;
const DEFAULT_NEAR: f64 = 0.1;
const DEFAULT_FOV: f64 = 50.0;

const DEFAULT_INTENSITY: f64 = 1.0;
const DEFAULT_ANGLE: f64 = PI / 3.0;
const DEFAULT_PENUMBRA: f64 = 0.0;
const DEFAULT_DECAY: f64 = 2.0;
const DEFAULT_DISTANCE: f64 = 0.0;

/// Ordered attribute list. Re-adding an attribute keeps the first occurrence.
#[derive(Debug, Default)]
pub(super) struct AttrList {
    attrs: Vec<Attribute>,
}

impl AttrList {
    fn push(&mut self, attr: Attribute) {
        if !self.attrs.iter().any(|a| a.name == attr.name) {
            self.attrs.push(attr);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.attrs
    }
}

/// Whether the node keeps its `name` attribute. An empty name is contained in
/// every clip name, so unnamed nodes of an animated scene keep it too.
pub(super) fn keeps_name<D: Dialect + ?Sized>(cx: &EmitContext<'_, D>, node: &SceneNode) -> bool {
    cx.options.keep_names
        || node.morph.is_some()
        || cx.scene.animations.iter().any(|clip| clip.references(&node.name))
}

/// Attributes for a node authored directly (not through a shared instance).
pub(super) fn direct<D: Dialect + ?Sized>(
    cx: &EmitContext<'_, D>,
    id: NodeId,
    node: &SceneNode,
    class: NodeClass,
) -> AttrList {
    let d = cx.dialect;
    let canon = cx.canon;
    let node_expr = d.scoped(Scope::Nodes, &node.name);
    let mut list = AttrList::default();

    if keeps_name(cx, node) {
        list.push(Attribute::text("name", node.name.clone()));
    }

    if matches!(
        class,
        NodeClass::PerspectiveCamera | NodeClass::OrthographicCamera
    ) {
        list.push(Attribute::expr("makeDefault", "false"));
        let camera = node.camera.unwrap_or_default();
        push_number_unless(&mut list, d, canon, "zoom", camera.zoom, DEFAULT_ZOOM);
        push_number_unless(&mut list, d, canon, "far", camera.far, DEFAULT_FAR);
        push_number_unless(&mut list, d, canon, "near", camera.near, DEFAULT_NEAR);
        if class == NodeClass::PerspectiveCamera {
            push_number_unless(&mut list, d, canon, "fov", camera.fov, DEFAULT_FOV);
        }
    }

    if class == NodeClass::Mesh && cx.options.shadows {
        list.push(Attribute::flag("castShadow"));
        list.push(Attribute::flag("receiveShadow"));
    }

    if node.geometry.is_some() {
        list.push(Attribute::expr("geometry", format!("{node_expr}.geometry")));
    }

    if let Some(material) = node.material.and_then(|m| cx.scene.material(m)) {
        let expr = if !material.name.is_empty()
            && cx.walk.registry.material_count(&material.name) == 1
        {
            d.scoped(Scope::Materials, &material.name)
        } else {
            format!("{node_expr}.material")
        };
        list.push(Attribute::expr("material", expr));
    }

    if node.skeleton.is_some() {
        list.push(Attribute::expr("skeleton", format!("{node_expr}.skeleton")));
    }

    if !node.visible {
        list.push(Attribute::expr("visible", "false"));
    }
    if node.cast_shadow {
        list.push(Attribute::flag("castShadow"));
    }
    if node.receive_shadow {
        list.push(Attribute::flag("receiveShadow"));
    }

    if let Some(morph) = &node.morph {
        if !morph.dictionary.is_empty() {
            list.push(Attribute::expr(
                "morphTargetDictionary",
                format!("{node_expr}.morphTargetDictionary"),
            ));
        }
        if !morph.influences.is_empty() {
            list.push(Attribute::expr(
                "morphTargetInfluences",
                format!("{node_expr}.morphTargetInfluences"),
            ));
        }
    }

    if let Some(light) = &node.light {
        if let Some(v) = light.intensity {
            push_number_unless(&mut list, d, canon, "intensity", v, DEFAULT_INTENSITY);
        }
        if let Some(v) = light.angle.filter(|v| !canon.rounds_to(*v, DEFAULT_ANGLE)) {
            list.push(Attribute::expr("angle", d.numeric(canon.angle(v))));
        }
        if let Some(v) = light.penumbra {
            push_number_unless(&mut list, d, canon, "penumbra", v, DEFAULT_PENUMBRA);
        }
        if let Some(v) = light.decay {
            push_number_unless(&mut list, d, canon, "decay", v, DEFAULT_DECAY);
        }
        if let Some(v) = light.distance {
            push_number_unless(&mut list, d, canon, "distance", v, DEFAULT_DISTANCE);
        }
        if let Some(up) = light.up.filter(|up| !same_vector(*up, DVec3::Y, canon)) {
            let items: Vec<String> = up
                .to_array()
                .iter()
                .map(|&c| d.numeric(canon.value(c)))
                .collect();
            list.push(Attribute::expr("up", d.vector(&items)));
        }
    }

    if let Some(color) = node.color.filter(|c| !c.is_white()) {
        list.push(Attribute::text("color", format!("#{}", color.to_hex())));
    }

    push_transform(cx, id, node, &mut list);
    push_user_data(cx, node, &mut list);
    list
}

/// Attributes for a node rendered through the shared instance table. Geometry,
/// material, skeleton, morph and shadow flags come with the instance.
pub(super) fn instanced<D: Dialect + ?Sized>(
    cx: &EmitContext<'_, D>,
    id: NodeId,
    node: &SceneNode,
) -> AttrList {
    let mut list = AttrList::default();
    if keeps_name(cx, node) {
        list.push(Attribute::text("name", node.name.clone()));
    }
    if !node.visible {
        list.push(Attribute::expr("visible", "false"));
    }
    push_transform(cx, id, node, &mut list);
    push_user_data(cx, node, &mut list);
    list
}

/// Position / rotation / scale bound to the node's entry in the context.
fn push_transform<D: Dialect + ?Sized>(
    cx: &EmitContext<'_, D>,
    id: NodeId,
    node: &SceneNode,
    list: &mut AttrList,
) {
    let delta = TransformDelta::of(node, cx.canon);
    let Some(key) = cx.walk.index.transform_key(id) else {
        return;
    };
    let d = cx.dialect;
    let binding = d.path(
        d.scope(Scope::Context),
        &["transforms".to_string(), key.to_string()],
    );
    for (enabled, field) in [
        (delta.position, "position"),
        (delta.rotation, "rotation"),
        (delta.scale, "scale"),
    ] {
        if enabled {
            list.push(Attribute::expr(field, d.member(&binding, field)));
        }
    }
}

fn push_user_data<D: Dialect + ?Sized>(
    cx: &EmitContext<'_, D>,
    node: &SceneNode,
    list: &mut AttrList,
) {
    if !cx.options.meta {
        return;
    }
    let Some(data) = &node.user_data else {
        return;
    };
    let empty = match data {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if !empty {
        list.push(Attribute::expr("userData", cx.dialect.json(data)));
    }
}

fn push_number_unless<D: Dialect + ?Sized>(
    list: &mut AttrList,
    d: &D,
    canon: &Canonicalizer,
    name: &str,
    value: f64,
    default: f64,
) {
    if !canon.rounds_to(value, default) {
        list.push(Attribute::expr(name, d.numeric(canon.value(value))));
    }
}

fn same_vector(a: DVec3, b: DVec3, canon: &Canonicalizer) -> bool {
    a.to_array()
        .iter()
        .zip(b.to_array().iter())
        .all(|(x, y)| canon.rounds_to(*x, *y))
}

//! Node emitter: folds the scene tree into markup text.
//!
//! Each node yields either an element or, for structurally redundant groups,
//! the text of its children to be spliced into the parent. The fold never
//! touches the input graph; elision decisions are collected into the returned
//! [`NodeTree`].

mod attrs;
pub mod tags;

use std::collections::BTreeSet;

use crate::{
    dialect::{Dialect, Scope},
    numeric::Canonicalizer,
    options::GenerateOptions,
    progress::{ProgressSink, Stage, Ticker},
    scene::{NodeId, Scene},
    walker::Walk,
};

use tags::{GROUP_TAG, NodeClass, classify, element_tag};

pub(crate) struct EmitContext<'a, D: Dialect + ?Sized> {
    pub scene: &'a Scene,
    pub walk: &'a Walk,
    pub options: &'a GenerateOptions,
    pub canon: &'a Canonicalizer,
    pub dialect: &'a D,
}

/// Result of emitting one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Element(String),
    /// The node was dropped; its children's text takes its place.
    Elided(String),
}

impl Emission {
    pub fn text(&self) -> &str {
        match self {
            Emission::Element(t) | Emission::Elided(t) => t,
        }
    }

    fn into_text(self) -> String {
        match self {
            Emission::Element(t) | Emission::Elided(t) => t,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTree {
    /// Markup for the root's content.
    pub text: String,
    /// Nodes elided during this run.
    pub removed: BTreeSet<NodeId>,
    /// Camera component tags that appear in `text`.
    pub cameras: BTreeSet<String>,
}

impl NodeTree {
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.removed.contains(&id)
    }
}

struct Fold<'a, 'p, D: Dialect + ?Sized> {
    cx: EmitContext<'a, D>,
    ticker: Ticker<'p>,
    removed: BTreeSet<NodeId>,
    cameras: BTreeSet<String>,
}

/// Emits the content of the scene root.
///
/// A container root contributes only its children; its own transform is
/// carried by the model shell. Any other root is emitted as a node itself.
pub fn emit_tree<D: Dialect + ?Sized>(
    scene: &Scene,
    walk: &Walk,
    options: &GenerateOptions,
    canon: &Canonicalizer,
    dialect: &D,
    progress: Option<&dyn ProgressSink>,
) -> NodeTree {
    let mut fold = Fold {
        cx: EmitContext {
            scene,
            walk,
            options,
            canon,
            dialect,
        },
        ticker: Ticker::new(
            progress,
            Stage::Emit,
            options.progress_interval,
            walk.index.order.len(),
        ),
        removed: BTreeSet::new(),
        cameras: BTreeSet::new(),
    };

    let root = &scene.nodes[scene.root.index()];
    let text = if classify(&root.node_type) == NodeClass::Container {
        fold.ticker.tick();
        fold.children(scene.root)
    } else {
        fold.node(scene.root).into_text()
    };

    NodeTree {
        text,
        removed: fold.removed,
        cameras: fold.cameras,
    }
}

impl<D: Dialect + ?Sized> Fold<'_, '_, D> {
    fn children(&mut self, id: NodeId) -> String {
        let scene = self.cx.scene;
        let mut out = String::new();
        for &child in &scene.nodes[id.index()].children {
            out.push_str(self.node(child).text());
        }
        out
    }

    fn node(&mut self, id: NodeId) -> Emission {
        self.ticker.tick();
        let scene = self.cx.scene;
        let node = &scene.nodes[id.index()];
        let class = classify(&node.node_type);

        if class == NodeClass::Bone {
            let d = self.cx.dialect;
            return Emission::Element(d.live_reference(&d.scoped(Scope::Nodes, &node.name)));
        }

        let children = self.children(id);
        let cx = &self.cx;

        let shared = cx
            .walk
            .instancing
            .then(|| {
                node.geometry
                    .and_then(|g| cx.scene.geometry(g))
                    .and_then(|g| cx.walk.registry.geometry(&g.key))
            })
            .flatten();

        let (tag, attrs) = match shared {
            Some(entry) => (
                cx.dialect.scoped(Scope::Instances, &entry.name),
                attrs::instanced(cx, id, node),
            ),
            None => (
                element_tag(&node.node_type).into_owned(),
                attrs::direct(cx, id, node, class),
            ),
        };

        if !cx.options.keep_groups
            && tag == GROUP_TAG
            && (attrs.is_empty() || node.children.is_empty())
        {
            log::debug!("group {:?} ({id}) removed (empty)", node.name);
            self.removed.insert(id);
            return Emission::Elided(children);
        }

        if matches!(
            class,
            NodeClass::PerspectiveCamera | NodeClass::OrthographicCamera
        ) {
            self.cameras.insert(tag.clone());
        }

        Emission::Element(cx.dialect.element(&tag, &attrs.into_vec(), &children))
    }
}

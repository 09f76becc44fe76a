//! Output dialect.
//!
//! The emitters decide *what* to say (which attributes, which controls, which
//! types); a [`Dialect`] decides how it is spelled. Everything
//! target-language specific lives behind this trait so the markup
//! convention can be swapped without touching the walk or the policies.

pub mod r3f;

pub use r3f::ReactThreeFiber;

use crate::{
    assembly::{HostShell, ImportNeeds, ModelShell},
    context::ContextValue,
    controls::ControlSet,
    naming,
    numeric::{Canonicalizer, Numeric},
    types_emit::{TypeDescriptors, TypeShape},
};

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Bare boolean attribute.
    Flag,
    /// String literal.
    Text(String),
    /// Embedded expression.
    Expr(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Flag,
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Text(text.into()),
        }
    }

    pub fn expr(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Expr(expr.into()),
        }
    }
}

/// Root bindings every emitted expression hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Nodes,
    Materials,
    Instances,
    Context,
}

pub trait Dialect {
    fn scope(&self, scope: Scope) -> &str;

    fn member(&self, base: &str, key: &str) -> String {
        naming::property_access(base, key)
    }

    fn string_literal(&self, text: &str) -> String;
    fn numeric(&self, value: Numeric) -> String;
    fn vector(&self, items: &[String]) -> String;
    fn json(&self, value: &serde_json::Value) -> String;
    fn comment(&self, text: &str) -> String;

    /// A start/end pair around `children`, or a self-closing element when
    /// `children` is empty. Ends with a newline.
    fn element(&self, tag: &str, attrs: &[Attribute], children: &str) -> String;

    /// Opaque reference to a live node, emitted for bones.
    fn live_reference(&self, node_expr: &str) -> String;

    fn context_literal(&self, value: &ContextValue, canon: &Canonicalizer) -> String;
    fn type_shape(&self, shape: &TypeShape) -> String;
    fn type_block(&self, types: &TypeDescriptors) -> String;
    /// Control hooks plus the per-frame material sync.
    fn control_block(&self, controls: &ControlSet, canon: &Canonicalizer, typed: bool) -> String;
    fn imports(&self, needs: &ImportNeeds) -> String;
    fn model_block(&self, shell: &ModelShell<'_>) -> String;
    fn host_block(&self, shell: &HostShell<'_>) -> String;

    fn scoped(&self, scope: Scope, key: &str) -> String {
        self.member(self.scope(scope), key)
    }

    /// `base.a.b.c`, each step sanitized.
    fn path(&self, base: &str, keys: &[String]) -> String {
        keys.iter()
            .fold(base.to_string(), |acc, key| self.member(&acc, key))
    }
}

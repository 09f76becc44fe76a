//! The shared context schema: default values that the controls edit and the
//! host persists as one blob.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::numeric::Canonicalizer;

#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Number(f64),
    Bool(bool),
    /// Strings, including `#rrggbb` colors.
    Text(String),
    /// A 3-vector. `angular` vectors hold radians and render symbolically.
    Vector { values: [f64; 3], angular: bool },
    Group(Vec<(String, ContextValue)>),
}

impl ContextValue {
    pub fn group() -> Self {
        ContextValue::Group(Vec::new())
    }

    pub fn vector(values: [f64; 3]) -> Self {
        ContextValue::Vector {
            values,
            angular: false,
        }
    }

    pub fn angles(values: [f64; 3]) -> Self {
        ContextValue::Vector {
            values,
            angular: true,
        }
    }

    /// Appends `key` to a group. No-op on leaves.
    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        if let ContextValue::Group(entries) = self {
            entries.push((key.into(), value));
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: ContextValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        match self {
            ContextValue::Group(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&ContextValue> {
        path.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Rounds every number to `canon` precision, in place.
    pub fn canonicalize(&mut self, canon: &Canonicalizer) {
        match self {
            ContextValue::Number(v) => *v = canon.round(*v),
            ContextValue::Vector { values, .. } => {
                for v in values.iter_mut() {
                    *v = canon.round(*v);
                }
            }
            ContextValue::Group(entries) => {
                for (_, v) in entries.iter_mut() {
                    v.canonicalize(canon);
                }
            }
            ContextValue::Bool(_) | ContextValue::Text(_) => {}
        }
    }

    /// Overlays a saved blob onto these defaults.
    ///
    /// Only keys present in the defaults are read, and only when the saved
    /// value has the same shape; everything else keeps its default. A scalar
    /// where a vector is expected is accepted (uniform scale).
    pub fn apply_saved(&mut self, saved: &serde_json::Value) {
        match (self, saved) {
            (ContextValue::Number(v), serde_json::Value::Number(n)) => {
                if let Some(x) = n.as_f64() {
                    *v = x;
                }
            }
            (ContextValue::Bool(v), serde_json::Value::Bool(b)) => *v = *b,
            (ContextValue::Text(v), serde_json::Value::String(s)) => *v = s.clone(),
            (ContextValue::Vector { values, .. }, serde_json::Value::Array(items)) => {
                let parsed: Option<Vec<f64>> = items.iter().map(|i| i.as_f64()).collect();
                if let Some(parsed) = parsed.filter(|p| p.len() == 3) {
                    values.copy_from_slice(&parsed);
                }
            }
            (ContextValue::Vector { values, .. }, serde_json::Value::Number(n)) => {
                if let Some(x) = n.as_f64() {
                    *values = [x; 3];
                }
            }
            (ContextValue::Group(entries), serde_json::Value::Object(map)) => {
                for (key, value) in entries.iter_mut() {
                    if let Some(saved_value) = map.get(key) {
                        value.apply_saved(saved_value);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn to_blob(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ContextValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContextValue::Number(v) => serializer.serialize_f64(*v),
            ContextValue::Bool(v) => serializer.serialize_bool(*v),
            ContextValue::Text(v) => serializer.serialize_str(v),
            ContextValue::Vector { values, .. } => values.serialize(serializer),
            ContextValue::Group(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ContextValue {
        ContextValue::group()
            .with(
                "model",
                ContextValue::group()
                    .with("position", ContextValue::vector([0.0, 1.0, 0.0]))
                    .with("scale", ContextValue::Number(1.0)),
            )
            .with("fade", ContextValue::Bool(false))
    }

    #[test]
    fn blob_keeps_insertion_order() {
        let blob = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            blob,
            r#"{"model":{"position":[0.0,1.0,0.0],"scale":1.0},"fade":false}"#
        );
    }

    #[test]
    fn apply_saved_overlays_matching_shapes_only() {
        let mut ctx = sample();
        ctx.apply_saved(&json!({
            "model": { "position": [1, 2, 3], "scale": "huge", "extra": 4 },
            "fade": true,
            "unknown": 1
        }));
        assert_eq!(
            ctx.get_path(&["model", "position"]),
            Some(&ContextValue::vector([1.0, 2.0, 3.0]))
        );
        assert_eq!(
            ctx.get_path(&["model", "scale"]),
            Some(&ContextValue::Number(1.0))
        );
        assert_eq!(ctx.get("fade"), Some(&ContextValue::Bool(true)));
        assert!(ctx.get("unknown").is_none());
    }

    #[test]
    fn scalar_fills_a_vector() {
        let mut ctx = ContextValue::group().with("scale", ContextValue::vector([1.0, 2.0, 1.0]));
        ctx.apply_saved(&json!({ "scale": 3 }));
        assert_eq!(ctx.get("scale"), Some(&ContextValue::vector([3.0, 3.0, 3.0])));
    }

    #[test]
    fn short_vectors_are_ignored() {
        let mut ctx = sample();
        ctx.apply_saved(&json!({ "model": { "position": [9, 9] } }));
        assert_eq!(
            ctx.get_path(&["model", "position"]),
            Some(&ContextValue::vector([0.0, 1.0, 0.0]))
        );
    }
}

//! Fixed decorative rigs and the per-field bounds table.

use std::f64::consts::PI;

use super::{Range, RigKind};
use crate::context::ContextValue;

#[derive(Debug, Clone, Copy)]
pub(super) enum Literal {
    Number(f64),
    Bool(bool),
    Color(&'static str),
    Vector([f64; 3]),
    Angles([f64; 3]),
}

impl Literal {
    pub fn to_value(self) -> ContextValue {
        match self {
            Literal::Number(v) => ContextValue::Number(v),
            Literal::Bool(v) => ContextValue::Bool(v),
            Literal::Color(v) => ContextValue::Text(v.to_string()),
            Literal::Vector(v) => ContextValue::vector(v),
            Literal::Angles(v) => ContextValue::angles(v),
        }
    }
}

pub(super) struct FieldSpec {
    pub name: &'static str,
    pub default: Literal,
}

pub(super) struct RigSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub kind: RigKind,
    pub fields: &'static [FieldSpec],
}

const fn field(name: &'static str, default: Literal) -> FieldSpec {
    FieldSpec { name, default }
}

const fn point_light(position: [f64; 3], intensity: f64) -> [FieldSpec; 4] {
    [
        field("intensity", Literal::Number(intensity)),
        field("decay", Literal::Number(2.0)),
        field("position", Literal::Vector(position)),
        field("rotation", Literal::Angles([0.0, 0.0, 0.0])),
    ]
}

const fn cloud(position: [f64; 3], opacity: f64, speed: f64) -> [FieldSpec; 6] {
    [
        field("position", Literal::Vector(position)),
        field("opacity", Literal::Number(opacity)),
        field("speed", Literal::Number(speed)),
        field("width", Literal::Number(10.0)),
        field("depth", Literal::Number(1.5)),
        field("segments", Literal::Number(20.0)),
    ]
}

const POINT_LIGHT_1: [FieldSpec; 4] = point_light([10.0, 10.0, 10.0], 1.0);
const POINT_LIGHT_2: [FieldSpec; 4] = point_light([-10.0, -10.0, -10.0], 0.5);
const SPOT_LIGHT: [FieldSpec; 4] = [
    field("intensity", Literal::Number(1.0)),
    field("decay", Literal::Number(2.0)),
    field("position", Literal::Vector([10.0, 15.0, 10.0])),
    field("rotation", Literal::Angles([0.0, 0.0, 0.0])),
];
const BACKGROUND: [FieldSpec; 3] = [
    field("gradient", Literal::Bool(true)),
    field("top", Literal::Color("#1e1e2e")),
    field("bottom", Literal::Color("#000000")),
];
const CLOUD_1: [FieldSpec; 6] = cloud([-4.0, -2.0, -25.0], 0.5, 0.4);
const CLOUD_2: [FieldSpec; 6] = cloud([4.0, -2.0, -15.0], 0.4, 0.3);
const CLOUD_3: [FieldSpec; 6] = cloud([-4.0, 2.0, -10.0], 0.3, 0.2);
const STARS: [FieldSpec; 6] = [
    field("radius", Literal::Number(100.0)),
    field("depth", Literal::Number(50.0)),
    field("count", Literal::Number(5000.0)),
    field("factor", Literal::Number(4.0)),
    field("saturation", Literal::Number(0.0)),
    field("fade", Literal::Bool(true)),
];

/// Decoration rigs, in schema order.
pub(super) const RIGS: &[RigSpec] = &[
    RigSpec {
        key: "pointLight1",
        title: "Point light 1",
        kind: RigKind::PointLight,
        fields: &POINT_LIGHT_1,
    },
    RigSpec {
        key: "pointLight2",
        title: "Point light 2",
        kind: RigKind::PointLight,
        fields: &POINT_LIGHT_2,
    },
    RigSpec {
        key: "spotLight",
        title: "Spot light",
        kind: RigKind::SpotLight,
        fields: &SPOT_LIGHT,
    },
    RigSpec {
        key: "background",
        title: "Background",
        kind: RigKind::Background,
        fields: &BACKGROUND,
    },
    RigSpec {
        key: "cloud1",
        title: "Cloud 1",
        kind: RigKind::Cloud,
        fields: &CLOUD_1,
    },
    RigSpec {
        key: "cloud2",
        title: "Cloud 2",
        kind: RigKind::Cloud,
        fields: &CLOUD_2,
    },
    RigSpec {
        key: "cloud3",
        title: "Cloud 3",
        kind: RigKind::Cloud,
        fields: &CLOUD_3,
    },
    RigSpec {
        key: "stars",
        title: "Stars",
        kind: RigKind::Stars,
        fields: &STARS,
    },
];

const fn r(min: f64, max: f64, step: f64) -> Option<Range> {
    Some(Range {
        min,
        max,
        step,
        angular: false,
    })
}

const ANGLE: Option<Range> = Some(Range {
    min: -PI,
    max: PI,
    step: 0.01,
    angular: true,
});

/// Bounds for a numeric field. `None` for toggles and colors.
pub(super) fn range(kind: RigKind, field: &str) -> Option<Range> {
    use RigKind::*;
    match (kind, field) {
        (_, "rotation") => ANGLE,
        (_, "position") => r(-50.0, 50.0, 0.1),
        (Model, "scale") => r(0.01, 10.0, 0.01),
        (Material, "metalness" | "roughness" | "clearcoat" | "clearcoatRoughness") => {
            r(0.0, 1.0, 0.01)
        }
        (PointLight | SpotLight, "intensity") => r(0.0, 10.0, 0.1),
        (PointLight | SpotLight, "decay") => r(0.0, 5.0, 0.1),
        (Cloud, "opacity") => r(0.0, 1.0, 0.01),
        (Cloud, "speed") => r(0.0, 2.0, 0.01),
        (Cloud, "width") => r(0.0, 50.0, 0.1),
        (Cloud, "depth") => r(0.0, 10.0, 0.1),
        (Cloud, "segments") => r(1.0, 80.0, 1.0),
        (Stars, "radius") => r(1.0, 500.0, 1.0),
        (Stars, "depth") => r(1.0, 200.0, 1.0),
        (Stars, "count") => r(0.0, 20000.0, 100.0),
        (Stars, "factor") => r(0.0, 20.0, 0.1),
        (Stars, "saturation") => r(0.0, 1.0, 0.01),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_bounds_depend_on_rig() {
        assert_eq!(range(RigKind::Cloud, "depth").map(|r| r.max), Some(10.0));
        assert_eq!(range(RigKind::Stars, "depth").map(|r| r.max), Some(200.0));
    }

    #[test]
    fn toggles_and_colors_are_unbounded() {
        assert!(range(RigKind::Stars, "fade").is_none());
        assert!(range(RigKind::Background, "top").is_none());
        assert!(range(RigKind::Material, "color").is_none());
    }

    #[test]
    fn every_numeric_catalog_field_has_bounds() {
        for rig in RIGS {
            for f in rig.fields {
                let numeric = matches!(
                    f.default,
                    Literal::Number(_) | Literal::Vector(_) | Literal::Angles(_)
                );
                assert_eq!(
                    range(rig.kind, f.name).is_some(),
                    numeric,
                    "{}.{}",
                    rig.key,
                    f.name
                );
            }
        }
    }
}

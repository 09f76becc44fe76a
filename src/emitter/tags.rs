//! Node type tags: classification and element names.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Group, Object3D and Scene.
    Container,
    Mesh,
    Bone,
    PerspectiveCamera,
    OrthographicCamera,
    Light,
    /// Any other tag, known or not.
    Other,
}

pub fn classify(tag: &str) -> NodeClass {
    match tag {
        "Group" | "Object3D" | "Scene" => NodeClass::Container,
        "Mesh" | "SkinnedMesh" | "InstancedMesh" => NodeClass::Mesh,
        "Bone" => NodeClass::Bone,
        "PerspectiveCamera" => NodeClass::PerspectiveCamera,
        "OrthographicCamera" => NodeClass::OrthographicCamera,
        "PointLight" | "SpotLight" | "DirectionalLight" | "AmbientLight" | "HemisphereLight"
        | "RectAreaLight" => NodeClass::Light,
        _ => NodeClass::Other,
    }
}

/// Mesh-classified tags. These must carry geometry.
pub fn is_mesh_tag(tag: &str) -> bool {
    classify(tag) == NodeClass::Mesh
}

/// Scene object types that map to lower-camel intrinsic elements.
const INTRINSIC_TAGS: &[&str] = &[
    "Mesh",
    "SkinnedMesh",
    "InstancedMesh",
    "Bone",
    "Points",
    "Line",
    "LineSegments",
    "LineLoop",
    "Sprite",
    "LOD",
    "PointLight",
    "SpotLight",
    "DirectionalLight",
    "AmbientLight",
    "HemisphereLight",
    "RectAreaLight",
];

pub const GROUP_TAG: &str = "group";

/// Element name for a raw type tag. Unrecognized tags pass through unchanged.
pub fn element_tag(tag: &str) -> Cow<'_, str> {
    match classify(tag) {
        NodeClass::Container => Cow::Borrowed(GROUP_TAG),
        NodeClass::PerspectiveCamera | NodeClass::OrthographicCamera => Cow::Borrowed(tag),
        _ if INTRINSIC_TAGS.contains(&tag) => Cow::Owned(lower_first(tag)),
        _ => Cow::Borrowed(tag),
    }
}

fn lower_first(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containers_collapse_to_group() {
        for tag in ["Group", "Object3D", "Scene"] {
            assert_eq!(element_tag(tag), "group");
        }
    }

    #[test]
    fn cameras_keep_component_names() {
        assert_eq!(element_tag("PerspectiveCamera"), "PerspectiveCamera");
        assert_eq!(element_tag("OrthographicCamera"), "OrthographicCamera");
    }

    #[test]
    fn intrinsics_lower_first_letter() {
        assert_eq!(element_tag("Mesh"), "mesh");
        assert_eq!(element_tag("SkinnedMesh"), "skinnedMesh");
        assert_eq!(element_tag("LOD"), "lOD");
        assert_eq!(element_tag("SpotLight"), "spotLight");
    }

    #[test]
    fn mesh_tags() {
        for tag in ["Mesh", "SkinnedMesh", "InstancedMesh"] {
            assert!(is_mesh_tag(tag), "{tag}");
        }
        assert!(!is_mesh_tag("Points"));
        assert!(!is_mesh_tag("Group"));
    }

    #[test]
    fn unknown_tags_pass_through() {
        assert_eq!(element_tag("VolumeProbe"), "VolumeProbe");
        assert_eq!(classify("VolumeProbe"), NodeClass::Other);
    }
}

//! LOD mesh discovery.
//!
//! Level-of-detail variants of the character mesh are picked up by
//! naming convention: a `_LODn` suffix with n >= 1, skinned to the
//! designated character armature. `_LOD0` is the base mesh and is never
//! discovered; it is expected to be listed explicitly.

use std::sync::OnceLock;

use regex::Regex;

use crate::scene::Scene;

/// Suffix pattern for LOD meshes: `_LOD` followed by digits, first
/// digit 1-9, anchored at the end of the name.
const LOD_PATTERN: &str = r"_LOD([1-9][0-9]*)$";

static LOD_REGEX: OnceLock<Regex> = OnceLock::new();

fn lod_regex() -> &'static Regex {
    LOD_REGEX.get_or_init(|| Regex::new(LOD_PATTERN).expect("invalid regex pattern"))
}

/// Returns true if the name carries a `_LODn` (n >= 1) suffix.
pub fn is_lod_name(name: &str) -> bool {
    lod_regex().is_match(name)
}

/// The LOD level encoded in the name, if any.
pub fn lod_level(name: &str) -> Option<u32> {
    lod_regex()
        .captures(name)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Discovers LOD meshes to add to the character export set.
///
/// A mesh is included iff it is not already in `already_included`, its
/// name matches the `_LODn` suffix pattern, and it carries an
/// armature-deform modifier targeting exactly `armature`. A matching
/// mesh skinned to a *different* armature is excluded; that exclusion
/// is what keeps two characters' LOD sets from bleeding into each
/// other.
///
/// Results follow the scene's registration order (the order of
/// `scene.objects`), so discovery is deterministic for a given
/// manifest.
pub fn discover_lods(scene: &Scene, already_included: &[&str], armature: &str) -> Vec<String> {
    scene
        .objects
        .iter()
        .filter(|obj| obj.is_mesh())
        .filter(|obj| !already_included.contains(&obj.name.as_str()))
        .filter(|obj| is_lod_name(&obj.name))
        .filter(|obj| obj.is_skinned_to(armature))
        .map(|obj| obj.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bone, SceneObject};
    use pretty_assertions::assert_eq;

    fn create_test_scene() -> Scene {
        let mut scene = Scene::new("test");
        scene
            .objects
            .push(SceneObject::armature("RigA", vec![Bone::new("Root")]));
        scene
            .objects
            .push(SceneObject::armature("RigB", vec![Bone::new("Root")]));
        scene.objects.push(SceneObject::mesh("Body").skin_to("RigA"));
        scene
            .objects
            .push(SceneObject::mesh("Body_LOD1").skin_to("RigA"));
        scene
            .objects
            .push(SceneObject::mesh("Body_LOD2").skin_to("RigA"));
        scene
            .objects
            .push(SceneObject::mesh("Enemy_LOD1").skin_to("RigB"));
        scene.objects.push(SceneObject::mesh("Body_LOD0").skin_to("RigA"));
        scene.objects.push(SceneObject::mesh("Prop_LOD3"));
        scene
    }

    #[test]
    fn test_lod_name_pattern() {
        assert!(is_lod_name("Body_LOD1"));
        assert!(is_lod_name("Body_LOD42"));
        assert!(is_lod_name("Body_LOD10"));
        assert!(!is_lod_name("Body_LOD0"));
        assert!(!is_lod_name("Body_LOD01"));
        assert!(!is_lod_name("Body_LOD"));
        assert!(!is_lod_name("Body_LOD1_old"));
        assert!(!is_lod_name("Body"));
        assert!(!is_lod_name("_lod1"));
    }

    #[test]
    fn test_lod_level() {
        assert_eq!(lod_level("Body_LOD1"), Some(1));
        assert_eq!(lod_level("Body_LOD12"), Some(12));
        assert_eq!(lod_level("Body_LOD0"), None);
        assert_eq!(lod_level("Body"), None);
    }

    #[test]
    fn test_discover_includes_only_matching_skinned_meshes() {
        let scene = create_test_scene();
        let lods = discover_lods(&scene, &["Body"], "RigA");

        // Enemy_LOD1 is skinned to RigB, Prop_LOD3 is unskinned,
        // Body_LOD0 fails the name pattern.
        assert_eq!(lods, vec!["Body_LOD1".to_string(), "Body_LOD2".to_string()]);
    }

    #[test]
    fn test_discover_excludes_other_armature_even_when_target_swapped() {
        let scene = create_test_scene();
        let lods = discover_lods(&scene, &[], "RigB");
        assert_eq!(lods, vec!["Enemy_LOD1".to_string()]);
    }

    #[test]
    fn test_discover_skips_already_included() {
        let scene = create_test_scene();
        let lods = discover_lods(&scene, &["Body", "Body_LOD1"], "RigA");
        assert_eq!(lods, vec!["Body_LOD2".to_string()]);
    }

    #[test]
    fn test_discover_order_follows_registration_order() {
        let mut scene = Scene::new("test");
        scene
            .objects
            .push(SceneObject::armature("Rig", vec![Bone::new("Root")]));
        scene
            .objects
            .push(SceneObject::mesh("Zed_LOD1").skin_to("Rig"));
        scene
            .objects
            .push(SceneObject::mesh("Alpha_LOD1").skin_to("Rig"));

        let lods = discover_lods(&scene, &[], "Rig");
        assert_eq!(
            lods,
            vec!["Zed_LOD1".to_string(), "Alpha_LOD1".to_string()]
        );
    }
}

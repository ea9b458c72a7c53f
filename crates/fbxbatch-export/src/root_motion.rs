//! Root motion extraction.
//!
//! Converts a root bone's translation animation into object-space
//! movement: the bone's world-space displacement per keyframe is
//! rewritten onto the parent object's location channels and the bone's
//! own translation keys are zeroed, so a game engine can drive
//! locomotion from the object transform instead of in-place bone
//! animation.
//!
//! Extraction always operates on an independent copy of the action;
//! the registry's action is never touched.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use fbxbatch_scene::action::{Action, ChannelProperty, ChannelTarget};
use fbxbatch_scene::scene::SceneObject;

use crate::error::{ExportError, ExportResult};

/// Up-axis convention of the target engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpAxis {
    /// Y-up target; displacement is passed through unchanged.
    Y,
    /// Z-up target; converting from a Y-up authoring convention swaps
    /// the horizontal axes (X <- source Y, Y <- source X, Z unchanged).
    Z,
}

impl std::str::FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "y" => Ok(UpAxis::Y),
            "z" => Ok(UpAxis::Z),
            _ => Err(format!("unknown up axis: {}", s)),
        }
    }
}

/// Root motion configuration for one run.
///
/// The displacement scale and axis convention vary per target engine
/// and are deliberately explicit configuration rather than baked-in
/// constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootMotionConfig {
    /// Name of the root bone whose translation is extracted.
    pub root_bone: String,
    /// Scale factor applied to the world-space displacement.
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Target up-axis convention.
    #[serde(default = "default_up_axis")]
    pub up_axis: UpAxis,
    /// Also redirect the root bone's Euler-Z rotation onto the object.
    #[serde(default)]
    pub bake_rotation: bool,
}

fn default_scale() -> f32 {
    1.0
}

fn default_up_axis() -> UpAxis {
    UpAxis::Z
}

impl RootMotionConfig {
    /// Creates a config for the named root bone with scale 1.0, Z-up,
    /// and no rotation bake.
    pub fn new(root_bone: impl Into<String>) -> Self {
        Self {
            root_bone: root_bone.into(),
            scale: default_scale(),
            up_axis: default_up_axis(),
            bake_rotation: false,
        }
    }

    /// Sets the displacement scale factor.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the target up-axis convention.
    pub fn with_up_axis(mut self, up_axis: UpAxis) -> Self {
        self.up_axis = up_axis;
        self
    }

    /// Enables the Euler-Z rotation bake.
    pub fn with_bake_rotation(mut self, bake: bool) -> Self {
        self.bake_rotation = bake;
        self
    }
}

/// Extracts root motion from an action.
///
/// Returns a new, independent copy of `action` in which the root
/// bone's translation keys are zeroed and the equivalent world-space
/// displacement (scaled and axis-remapped per `config`) is keyed on
/// the object-level location channels at the same frames.
///
/// # Errors
///
/// Fails with [`ExportError::RootBoneNotFound`] when the configured
/// bone does not resolve on `armature`; the original action is left
/// untouched and no partial copy is exposed.
///
/// An action with no keys on the root bone's translation channels
/// yields an unmodified copy.
pub fn extract_root_motion(
    action: &Action,
    armature: &SceneObject,
    config: &RootMotionConfig,
) -> ExportResult<Action> {
    let data = armature
        .data
        .as_ref()
        .ok_or_else(|| ExportError::NotAnArmature {
            name: armature.name.clone(),
        })?;
    let bone = data
        .bone(&config.root_bone)
        .ok_or_else(|| ExportError::RootBoneNotFound {
            bone: config.root_bone.clone(),
            armature: armature.name.clone(),
        })?;

    let mut copy = action.clone();

    let frames = action.bone_location_frames(&config.root_bone);
    if frames.is_empty() {
        return Ok(copy);
    }

    // Pose translation lives in the bone's rest space; composing the
    // rest matrix with the object's world matrix yields the bone's
    // world position at the frame.
    let bone_to_world = armature.world_matrix() * bone.matrix_local;
    let rest_world = bone_to_world.transform_point3(Vec3::ZERO);

    for &frame in &frames {
        let pose = Vec3::new(
            sample_bone_location(action, &config.root_bone, 0, frame),
            sample_bone_location(action, &config.root_bone, 1, frame),
            sample_bone_location(action, &config.root_bone, 2, frame),
        );
        let delta = (bone_to_world.transform_point3(pose) - rest_world) * config.scale;
        let delta = match config.up_axis {
            UpAxis::Y => delta,
            UpAxis::Z => Vec3::new(delta.y, delta.x, delta.z),
        };

        for (index, value) in delta.to_array().into_iter().enumerate() {
            copy.curve_mut_or_insert(ChannelTarget::object(
                ChannelProperty::Location,
                index as u8,
            ))
            .insert_key(frame, value);
        }
    }

    // The skeletal animation must no longer double-count the
    // displacement.
    for curve in copy
        .curves
        .iter_mut()
        .filter(|c| c.target.is_bone_location(&config.root_bone))
    {
        for key in &mut curve.keyframes {
            key.value = 0.0;
        }
    }

    if config.bake_rotation {
        bake_z_rotation(action, &mut copy, &config.root_bone);
    }

    Ok(copy)
}

/// Redirects the root bone's Euler-Z rotation keys onto the object's
/// Z rotation channel and zeroes them on the bone.
fn bake_z_rotation(action: &Action, copy: &mut Action, root_bone: &str) {
    let bone_target = ChannelTarget::bone(root_bone, ChannelProperty::RotationEuler, 2);
    let Some(curve) = action.curve(&bone_target) else {
        return;
    };

    let keys: Vec<_> = curve.keyframes.clone();
    let object_curve =
        copy.curve_mut_or_insert(ChannelTarget::object(ChannelProperty::RotationEuler, 2));
    for key in &keys {
        object_curve.insert_key(key.frame, key.value);
    }

    if let Some(bone_curve) = copy.curve_mut(&bone_target) {
        for key in &mut bone_curve.keyframes {
            key.value = 0.0;
        }
    }
}

fn sample_bone_location(action: &Action, bone: &str, index: u8, frame: f32) -> f32 {
    action
        .curve(&ChannelTarget::bone(bone, ChannelProperty::Location, index))
        .map(|c| c.evaluate(frame))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbxbatch_scene::scene::{Bone, SceneObject};
    use pretty_assertions::assert_eq;

    fn create_test_armature() -> SceneObject {
        SceneObject::armature("Rig", vec![Bone::new("Root"), Bone::new("Spine")])
    }

    fn action_with_root_keys(keys: &[(f32, [f32; 3])]) -> Action {
        let mut action = Action::new("Walk", 1.0, 20.0);
        for &(frame, values) in keys {
            for (index, value) in values.into_iter().enumerate() {
                action
                    .curve_mut_or_insert(ChannelTarget::bone(
                        "Root",
                        ChannelProperty::Location,
                        index as u8,
                    ))
                    .insert_key(frame, value);
            }
        }
        action
    }

    fn object_location_at(action: &Action, index: u8, frame: f32) -> Option<f32> {
        action
            .curve(&ChannelTarget::object(ChannelProperty::Location, index))
            .and_then(|c| c.key_at(frame))
    }

    #[test]
    fn test_original_action_is_never_mutated() {
        let action = action_with_root_keys(&[(1.0, [0.0, 0.0, 5.0])]);
        let armature = create_test_armature();

        let copy = extract_root_motion(&action, &armature, &RootMotionConfig::new("Root")).unwrap();

        // Original still reports (0, 0, 5) at frame 1.
        let z = action
            .curve(&ChannelTarget::bone("Root", ChannelProperty::Location, 2))
            .unwrap();
        assert_eq!(z.key_at(1.0), Some(5.0));

        // The copy's bone key is zeroed.
        let z_copy = copy
            .curve(&ChannelTarget::bone("Root", ChannelProperty::Location, 2))
            .unwrap();
        assert_eq!(z_copy.key_at(1.0), Some(0.0));

        // The copy's object gains the displacement at the same frame.
        assert_eq!(object_location_at(&copy, 2, 1.0), Some(5.0));
    }

    #[test]
    fn test_axis_remap_swaps_horizontal_axes() {
        let action = action_with_root_keys(&[(1.0, [2.0, 3.0, 1.0])]);
        let armature = create_test_armature();

        let config = RootMotionConfig::new("Root").with_up_axis(UpAxis::Z);
        let copy = extract_root_motion(&action, &armature, &config).unwrap();

        // (dx=2, dy=3, dz=1) remaps to (x=3, y=2, z=1).
        assert_eq!(object_location_at(&copy, 0, 1.0), Some(3.0));
        assert_eq!(object_location_at(&copy, 1, 1.0), Some(2.0));
        assert_eq!(object_location_at(&copy, 2, 1.0), Some(1.0));
    }

    #[test]
    fn test_y_up_passes_through() {
        let action = action_with_root_keys(&[(1.0, [2.0, 3.0, 1.0])]);
        let armature = create_test_armature();

        let config = RootMotionConfig::new("Root").with_up_axis(UpAxis::Y);
        let copy = extract_root_motion(&action, &armature, &config).unwrap();

        assert_eq!(object_location_at(&copy, 0, 1.0), Some(2.0));
        assert_eq!(object_location_at(&copy, 1, 1.0), Some(3.0));
    }

    #[test]
    fn test_scale_factor_applies() {
        let action = action_with_root_keys(&[(1.0, [1.0, 0.0, 0.0])]);
        let armature = create_test_armature();

        let config = RootMotionConfig::new("Root")
            .with_scale(100.0)
            .with_up_axis(UpAxis::Y);
        let copy = extract_root_motion(&action, &armature, &config).unwrap();

        assert_eq!(object_location_at(&copy, 0, 1.0), Some(100.0));
    }

    #[test]
    fn test_missing_bone_is_configuration_error() {
        let action = action_with_root_keys(&[(1.0, [0.0, 0.0, 5.0])]);
        let armature = create_test_armature();

        let result =
            extract_root_motion(&action, &armature, &RootMotionConfig::new("Pelvis"));
        assert!(matches!(
            result,
            Err(ExportError::RootBoneNotFound { .. })
        ));

        // No partial copy: the original is untouched.
        let z = action
            .curve(&ChannelTarget::bone("Root", ChannelProperty::Location, 2))
            .unwrap();
        assert_eq!(z.key_at(1.0), Some(5.0));
    }

    #[test]
    fn test_no_root_keys_yields_unmodified_copy() {
        let mut action = Action::new("Pose", 1.0, 10.0);
        action
            .curve_mut_or_insert(ChannelTarget::bone(
                "Spine",
                ChannelProperty::RotationEuler,
                0,
            ))
            .insert_key(1.0, 0.7);
        let armature = create_test_armature();

        let copy = extract_root_motion(&action, &armature, &RootMotionConfig::new("Root")).unwrap();
        assert_eq!(copy, action);
    }

    #[test]
    fn test_keyframe_union_across_channels() {
        // X keyed at frame 1, Y keyed at frame 10: both frames get
        // object keys, with the unkeyed channel sampled by
        // interpolation/clamping.
        let mut action = Action::new("Walk", 1.0, 10.0);
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::Location, 0))
            .insert_key(1.0, 4.0);
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::Location, 1))
            .insert_key(10.0, 6.0);
        let armature = create_test_armature();

        let config = RootMotionConfig::new("Root").with_up_axis(UpAxis::Y);
        let copy = extract_root_motion(&action, &armature, &config).unwrap();

        assert_eq!(object_location_at(&copy, 0, 1.0), Some(4.0));
        assert_eq!(object_location_at(&copy, 1, 1.0), Some(6.0));
        assert_eq!(object_location_at(&copy, 0, 10.0), Some(4.0));
        assert_eq!(object_location_at(&copy, 1, 10.0), Some(6.0));
    }

    #[test]
    fn test_armature_transform_feeds_world_delta() {
        let action = action_with_root_keys(&[(1.0, [1.0, 0.0, 0.0])]);
        let mut armature = create_test_armature();
        armature.scale = Vec3::splat(2.0);

        let config = RootMotionConfig::new("Root").with_up_axis(UpAxis::Y);
        let copy = extract_root_motion(&action, &armature, &config).unwrap();

        // A doubled armature scale doubles the world displacement.
        assert_eq!(object_location_at(&copy, 0, 1.0), Some(2.0));
    }

    #[test]
    fn test_bake_rotation_redirects_z_euler() {
        let mut action = action_with_root_keys(&[(1.0, [0.0, 0.0, 0.0])]);
        action
            .curve_mut_or_insert(ChannelTarget::bone(
                "Root",
                ChannelProperty::RotationEuler,
                2,
            ))
            .insert_key(1.0, 1.57);
        let armature = create_test_armature();

        let config = RootMotionConfig::new("Root").with_bake_rotation(true);
        let copy = extract_root_motion(&action, &armature, &config).unwrap();

        let object_rz = copy
            .curve(&ChannelTarget::object(ChannelProperty::RotationEuler, 2))
            .unwrap();
        assert_eq!(object_rz.key_at(1.0), Some(1.57));

        let bone_rz = copy
            .curve(&ChannelTarget::bone(
                "Root",
                ChannelProperty::RotationEuler,
                2,
            ))
            .unwrap();
        assert_eq!(bone_rz.key_at(1.0), Some(0.0));
    }
}

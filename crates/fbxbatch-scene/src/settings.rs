//! FBX exporter settings.
//!
//! [`FbxExportSettings`] mirrors the full parameter record of the host's
//! FBX export operator. The defaults are the game-engine-friendly preset
//! the pipeline was built around: -Y forward / Z up, Y/X bone axes, face
//! smoothing, deform bones only, no leaf bones, baked space transform.

use serde::{Deserialize, Serialize};

/// A signed axis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// +X
    #[serde(rename = "x")]
    X,
    /// +Y
    #[serde(rename = "y")]
    Y,
    /// +Z
    #[serde(rename = "z")]
    Z,
    /// -X
    #[serde(rename = "-x")]
    NegX,
    /// -Y
    #[serde(rename = "-y")]
    NegY,
    /// -Z
    #[serde(rename = "-z")]
    NegZ,
}

impl Axis {
    /// Returns the host-side identifier (e.g., "-Y").
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            _ => Err(format!("unknown axis: {}", s)),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mesh smoothing information written to the FBX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothType {
    /// Normals only.
    Off,
    /// Face smoothing groups.
    Face,
    /// Edge smoothing.
    Edge,
}

impl SmoothType {
    /// Returns the host-side identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothType::Off => "OFF",
            SmoothType::Face => "FACE",
            SmoothType::Edge => "EDGE",
        }
    }
}

/// How texture paths are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Host decides per path.
    Auto,
    /// Absolute paths.
    Absolute,
    /// Relative paths.
    Relative,
    /// Copy textures next to the FBX.
    Copy,
}

impl PathMode {
    /// Returns the host-side identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathMode::Auto => "AUTO",
            PathMode::Absolute => "ABSOLUTE",
            PathMode::Relative => "RELATIVE",
            PathMode::Copy => "COPY",
        }
    }
}

/// Host batch-export mode. The pipeline always drives single-file
/// exports itself, so this stays `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Single file per invocation.
    Off,
    /// One file per scene.
    Scene,
    /// One file per collection.
    Collection,
}

impl BatchMode {
    /// Returns the host-side identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Off => "OFF",
            BatchMode::Scene => "SCENE",
            BatchMode::Collection => "COLLECTION",
        }
    }
}

/// How the unit scale is applied to the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyScaleOptions {
    /// Keep both scene and unit scale as-is.
    FbxScaleNone,
    /// Apply unit scale to the FBX scale.
    FbxScaleUnits,
    /// Apply custom scale to the FBX scale.
    FbxScaleCustom,
    /// Apply everything to the FBX scale.
    FbxScaleAll,
}

impl ApplyScaleOptions {
    /// Returns the host-side identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyScaleOptions::FbxScaleNone => "FBX_SCALE_NONE",
            ApplyScaleOptions::FbxScaleUnits => "FBX_SCALE_UNITS",
            ApplyScaleOptions::FbxScaleCustom => "FBX_SCALE_CUSTOM",
            ApplyScaleOptions::FbxScaleAll => "FBX_SCALE_ALL",
        }
    }
}

/// The full FBX export operator parameter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbxExportSettings {
    /// Export selected objects only.
    pub use_selection: bool,
    /// Apply modifiers to exported meshes.
    pub use_mesh_modifiers: bool,
    /// Smoothing information to write.
    pub mesh_smooth_type: SmoothType,
    /// Include loose mesh edges.
    pub use_mesh_edges: bool,
    /// Write binormal and tangent vectors.
    pub use_tspace: bool,
    /// Bake animation into the file.
    pub bake_anim: bool,
    /// Bake every action instead of only the bound one.
    pub bake_anim_use_all_actions: bool,
    /// Bake NLA strips.
    pub bake_anim_use_nla_strips: bool,
    /// Key all bones, not only animated ones.
    pub bake_anim_use_all_bones: bool,
    /// Force keys at the start and end of the range.
    pub bake_anim_force_startend_keying: bool,
    /// Frame sampling step for baking.
    pub bake_anim_step: f32,
    /// Curve simplification factor (0 disables).
    pub bake_anim_simplify_factor: f32,
    /// Append leaf bones at bone tips.
    pub add_leaf_bones: bool,
    /// Primary bone axis convention.
    pub primary_bone_axis: Axis,
    /// Secondary bone axis convention.
    pub secondary_bone_axis: Axis,
    /// Forward axis of the written file.
    pub axis_forward: Axis,
    /// Up axis of the written file.
    pub axis_up: Axis,
    /// Bake the axis conversion into object transforms.
    pub bake_space_transform: bool,
    /// Export only deform bones, skipping control bones.
    pub use_armature_deform_only: bool,
    /// Texture path handling.
    pub path_mode: PathMode,
    /// Embed textures in the FBX.
    pub embed_textures: bool,
    /// Host batch mode.
    pub batch_mode: BatchMode,
    /// Write scene metadata.
    pub use_metadata: bool,
    /// Global scale multiplier.
    pub global_scale: f32,
    /// Apply the scene unit scale.
    pub apply_unit_scale: bool,
    /// Unit-scale application mode.
    pub apply_scale_options: ApplyScaleOptions,
}

impl Default for FbxExportSettings {
    fn default() -> Self {
        Self {
            use_selection: true,
            use_mesh_modifiers: true,
            mesh_smooth_type: SmoothType::Face,
            use_mesh_edges: false,
            use_tspace: false,
            bake_anim: false,
            bake_anim_use_all_actions: false,
            bake_anim_use_nla_strips: false,
            bake_anim_use_all_bones: true,
            bake_anim_force_startend_keying: true,
            bake_anim_step: 1.0,
            bake_anim_simplify_factor: 0.0,
            add_leaf_bones: false,
            primary_bone_axis: Axis::Y,
            secondary_bone_axis: Axis::X,
            axis_forward: Axis::NegY,
            axis_up: Axis::Z,
            bake_space_transform: true,
            use_armature_deform_only: true,
            path_mode: PathMode::Copy,
            embed_textures: false,
            batch_mode: BatchMode::Off,
            use_metadata: true,
            global_scale: 1.0,
            apply_unit_scale: true,
            apply_scale_options: ApplyScaleOptions::FbxScaleNone,
        }
    }
}

impl FbxExportSettings {
    /// Creates the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the animation bake flags for one export item.
    pub fn with_bake(mut self, bake_anim: bool, use_all_actions: bool) -> Self {
        self.bake_anim = bake_anim;
        self.bake_anim_use_all_actions = use_all_actions;
        self
    }

    /// Sets the file axis convention.
    pub fn with_axes(mut self, forward: Axis, up: Axis) -> Self {
        self.axis_forward = forward;
        self.axis_up = up;
        self
    }

    /// Sets the smoothing mode.
    pub fn with_smoothing(mut self, smooth: SmoothType) -> Self {
        self.mesh_smooth_type = smooth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_engine_preset() {
        let settings = FbxExportSettings::default();
        assert!(settings.use_selection);
        assert_eq!(settings.axis_forward, Axis::NegY);
        assert_eq!(settings.axis_up, Axis::Z);
        assert_eq!(settings.primary_bone_axis, Axis::Y);
        assert_eq!(settings.secondary_bone_axis, Axis::X);
        assert_eq!(settings.mesh_smooth_type, SmoothType::Face);
        assert!(settings.use_armature_deform_only);
        assert!(!settings.add_leaf_bones);
        assert!(settings.bake_space_transform);
        assert!(!settings.bake_anim);
        assert!(settings.bake_anim_use_all_bones);
        assert_eq!(settings.bake_anim_step, 1.0);
        assert_eq!(settings.bake_anim_simplify_factor, 0.0);
        assert_eq!(settings.apply_scale_options, ApplyScaleOptions::FbxScaleNone);
    }

    #[test]
    fn test_axis_round_trip() {
        assert_eq!("-y".parse::<Axis>().unwrap(), Axis::NegY);
        assert_eq!("Z".parse::<Axis>().unwrap(), Axis::Z);
        assert_eq!(Axis::NegX.as_str(), "-X");
        assert!("w".parse::<Axis>().is_err());
    }

    #[test]
    fn test_settings_serde_defaults() {
        // An empty settings object deserializes to the full preset.
        let settings: FbxExportSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, FbxExportSettings::default());

        let json = serde_json::to_string(&settings).unwrap();
        let parsed: FbxExportSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_with_bake_overrides() {
        let settings = FbxExportSettings::new().with_bake(true, false);
        assert!(settings.bake_anim);
        assert!(!settings.bake_anim_use_all_actions);
    }
}

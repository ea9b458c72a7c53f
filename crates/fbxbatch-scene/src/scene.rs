//! Scene manifest types.
//!
//! A [`Scene`] is a JSON mirror of the mutable state of a host 3D scene:
//! the object registry (meshes, armatures, their transforms and deform
//! modifiers), the animation action registry, unit settings, frame state,
//! and the user's export configuration. The batch exporter mutates this
//! mirror during a run and ships the resulting state to the host-side
//! exporter as directives.

use std::path::{Path, PathBuf};

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::SceneError;
use crate::settings::FbxExportSettings;

/// Unit systems understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    /// No unit system (raw Blender units).
    None,
    /// Metric units.
    Metric,
    /// Imperial units.
    Imperial,
}

impl UnitSystem {
    /// Returns the host-side identifier for this unit system.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::None => "NONE",
            UnitSystem::Metric => "METRIC",
            UnitSystem::Imperial => "IMPERIAL",
        }
    }
}

/// Scene unit settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSettings {
    /// The active unit system.
    pub system: UnitSystem,
    /// Scale of one scene unit in meters.
    pub scale_length: f32,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            system: UnitSystem::Metric,
            scale_length: 1.0,
        }
    }
}

/// Object kinds relevant to the export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Mesh object.
    Mesh,
    /// Armature object.
    Armature,
    /// Empty (transform-only) object.
    Empty,
    /// Any other object kind.
    Other,
}

impl ObjectKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Mesh => "mesh",
            ObjectKind::Armature => "armature",
            ObjectKind::Empty => "empty",
            ObjectKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A modifier on a scene object.
///
/// Only the armature-deform relationship matters to LOD discovery; every
/// other modifier is carried opaquely so a probed manifest round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Modifier {
    /// Armature deform modifier targeting an armature object.
    Armature {
        /// Name of the target armature object.
        object: String,
    },
    /// Any other modifier, kept by name only.
    Other {
        /// Modifier name.
        name: String,
    },
}

/// Whether a skeleton displays its bind pose or its animated pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosePosition {
    /// Bind (rest) pose.
    Rest,
    /// Currently bound animation pose.
    Pose,
}

impl PosePosition {
    /// Returns the host-side identifier for this pose position.
    pub fn as_str(&self) -> &'static str {
        match self {
            PosePosition::Rest => "REST",
            PosePosition::Pose => "POSE",
        }
    }
}

impl Default for PosePosition {
    fn default() -> Self {
        PosePosition::Pose
    }
}

/// A bone in an armature's rest skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    /// Bone name, unique within the armature.
    pub name: String,
    /// Parent bone name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Rest matrix in armature space.
    #[serde(default = "default_matrix")]
    pub matrix_local: Mat4,
}

fn default_matrix() -> Mat4 {
    Mat4::IDENTITY
}

impl Bone {
    /// Creates a root bone with an identity rest matrix.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            matrix_local: Mat4::IDENTITY,
        }
    }

    /// Creates a bone with the given rest matrix.
    pub fn with_matrix(name: impl Into<String>, matrix_local: Mat4) -> Self {
        Self {
            name: name.into(),
            parent: None,
            matrix_local,
        }
    }
}

/// Armature data block: rest skeleton plus display pose state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmatureData {
    /// Whether the armature displays rest or pose position.
    #[serde(default)]
    pub pose_position: PosePosition,
    /// Rest skeleton bones.
    #[serde(default)]
    pub bones: Vec<Bone>,
}

impl ArmatureData {
    /// Looks up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }
}

/// One strip on an NLA track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlaStrip {
    /// Strip name.
    pub name: String,
    /// Name of the action the strip plays.
    pub action: String,
    /// First frame of the strip.
    pub frame_start: f32,
    /// Last frame of the strip.
    pub frame_end: f32,
}

/// An NLA track holding strips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlaTrack {
    /// Track name.
    pub name: String,
    /// Strips on the track, in order.
    #[serde(default)]
    pub strips: Vec<NlaStrip>,
}

/// Animation state attached to an object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationBinding {
    /// Name of the currently bound action, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// NLA tracks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nla_tracks: Vec<NlaTrack>,
}

/// A single object in the scene registry.
///
/// Object names are unique keys within a scene (enforced by validation),
/// so names stand in for host object references throughout the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object name, unique within the scene.
    pub name: String,
    /// Object kind.
    pub kind: ObjectKind,
    /// Local position.
    #[serde(default)]
    pub location: Vec3,
    /// Local rotation as XYZ Euler angles in radians.
    #[serde(default)]
    pub rotation_euler: Vec3,
    /// Local scale.
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// Modifier stack.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    /// Armature data block; present exactly when `kind` is `Armature`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ArmatureData>,
    /// Animation state, if the object has any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationBinding>,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl SceneObject {
    /// Creates a mesh object at the origin.
    pub fn mesh(name: impl Into<String>) -> Self {
        Self::new(name, ObjectKind::Mesh)
    }

    /// Creates an armature object at the origin with the given bones.
    pub fn armature(name: impl Into<String>, bones: Vec<Bone>) -> Self {
        let mut obj = Self::new(name, ObjectKind::Armature);
        obj.data = Some(ArmatureData {
            pose_position: PosePosition::default(),
            bones,
        });
        obj
    }

    fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            location: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
            modifiers: Vec::new(),
            data: None,
            animation: None,
        }
    }

    /// Returns true if this object is a mesh.
    pub fn is_mesh(&self) -> bool {
        self.kind == ObjectKind::Mesh
    }

    /// Returns true if this object is an armature.
    pub fn is_armature(&self) -> bool {
        self.kind == ObjectKind::Armature
    }

    /// The object's world matrix composed from location, rotation, scale.
    pub fn world_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler.x,
            self.rotation_euler.y,
            self.rotation_euler.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.location)
    }

    /// Returns true if this object carries an armature-deform modifier
    /// targeting exactly the named armature.
    pub fn is_skinned_to(&self, armature: &str) -> bool {
        self.modifiers
            .iter()
            .any(|m| matches!(m, Modifier::Armature { object } if object == armature))
    }

    /// Adds an armature-deform modifier targeting the named armature.
    pub fn skin_to(mut self, armature: impl Into<String>) -> Self {
        self.modifiers.push(Modifier::Armature {
            object: armature.into(),
        });
        self
    }

    /// Mutable access to the animation binding, creating it when absent.
    pub fn animation_mut(&mut self) -> &mut AnimationBinding {
        self.animation.get_or_insert_with(AnimationBinding::default)
    }

    /// Name of the currently bound action, if any.
    pub fn bound_action(&self) -> Option<&str> {
        self.animation.as_ref()?.action.as_deref()
    }
}

/// The scene manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name.
    pub name: String,
    /// Source `.blend` file this manifest mirrors, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_file: Option<PathBuf>,
    /// Unit settings.
    #[serde(default)]
    pub units: UnitSettings,
    /// Current frame.
    #[serde(default = "default_frame_start")]
    pub frame_current: i32,
    /// Playback/export range start.
    #[serde(default = "default_frame_start")]
    pub frame_start: i32,
    /// Playback/export range end.
    #[serde(default = "default_frame_end")]
    pub frame_end: i32,
    /// Object registry, in scene registration order.
    ///
    /// This order is the deterministic iteration order used by LOD
    /// discovery and everything else that scans the registry.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Animation action registry.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Names of currently selected objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<String>,
    /// Name of the active object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_object: Option<String>,
    /// Designated character armature (object name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armature: Option<String>,
    /// Character name used for the mesh export filename.
    #[serde(default = "default_character_name")]
    pub character_name: String,
    /// Meshes explicitly listed for character export.
    #[serde(default)]
    pub mesh_slots: Vec<MeshSlot>,
    /// FBX exporter settings.
    #[serde(default)]
    pub settings: FbxExportSettings,
}

fn default_frame_start() -> i32 {
    1
}

fn default_frame_end() -> i32 {
    250
}

fn default_character_name() -> String {
    "Character".to_string()
}

impl Scene {
    /// Creates an empty scene with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend_file: None,
            units: UnitSettings::default(),
            frame_current: 1,
            frame_start: default_frame_start(),
            frame_end: default_frame_end(),
            objects: Vec::new(),
            actions: Vec::new(),
            selection: Vec::new(),
            active_object: None,
            armature: None,
            character_name: default_character_name(),
            mesh_slots: Vec::new(),
            settings: FbxExportSettings::default(),
        }
    }

    /// Parses a scene manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the manifest to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a manifest from a file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Saves the manifest to a file.
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|source| SceneError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Looks up an object by name.
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Looks up an object by name, mutably.
    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Looks up an action by name.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Looks up an action by name, mutably.
    pub fn action_mut(&mut self, name: &str) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.name == name)
    }

    /// The designated character armature object, if it resolves.
    pub fn armature_object(&self) -> Option<&SceneObject> {
        self.object(self.armature.as_deref()?)
    }

    /// The designated character armature object, mutably.
    pub fn armature_object_mut(&mut self) -> Option<&mut SceneObject> {
        let name = self.armature.clone()?;
        self.object_mut(&name)
    }

    /// Actions flagged for export, in registry order.
    pub fn flagged_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| a.export)
    }

    /// Replaces the selection with the given object names.
    pub fn select_only(&mut self, names: &[String]) {
        self.selection = names
            .iter()
            .filter(|n| self.object(n).is_some())
            .cloned()
            .collect();
    }

    /// Clears the selection.
    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }
}

/// One mesh explicitly listed for character export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSlot {
    /// Name of the mesh object.
    pub object: String,
    /// Whether the mesh is included in the export.
    #[serde(default = "default_true")]
    pub export: bool,
}

fn default_true() -> bool {
    true
}

impl MeshSlot {
    /// Creates an included slot for the named object.
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            export: true,
        }
    }
}

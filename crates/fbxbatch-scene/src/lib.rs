//! fbxbatch scene manifest
//!
//! This crate holds the data model the batch FBX exporter operates on:
//! a JSON *scene manifest* mirroring the mutable state of a host 3D
//! scene, plus the pure scene-side logic the export run needs.
//!
//! # Overview
//!
//! - [`scene`] - object/action registries, transforms, units, selection
//! - [`action`] - animation actions and keyframe curves
//! - [`settings`] - the FBX export operator parameter record
//! - [`snapshot`] - scene state snapshot and the RAII restore guard
//! - [`lod`] - LOD mesh discovery by naming convention
//! - [`ops`] - CRUD over the mesh list and action flags, NLA push
//! - [`validation`] - manifest validation
//! - [`error`] - error types
//!
//! Object and action names are unique keys within a manifest (enforced
//! by [`validation::validate_scene`]); the pipeline uses names wherever
//! the host would hold object references.

pub mod action;
pub mod error;
pub mod lod;
pub mod ops;
pub mod scene;
pub mod settings;
pub mod snapshot;
pub mod validation;

// Re-export main types at crate root
pub use action::{Action, ChannelProperty, ChannelTarget, FCurve, Keyframe};
pub use error::{SceneError, ValidationError, ValidationResult, ValidationWarning};
pub use lod::discover_lods;
pub use scene::{
    AnimationBinding, ArmatureData, Bone, MeshSlot, Modifier, ObjectKind, PosePosition, Scene,
    SceneObject, UnitSettings, UnitSystem,
};
pub use settings::{Axis, FbxExportSettings, SmoothType};
pub use snapshot::{SceneSnapshot, StateGuard};
pub use validation::validate_scene;

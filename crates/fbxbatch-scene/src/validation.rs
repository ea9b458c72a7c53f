//! Scene manifest validation.

use std::collections::HashSet;

use crate::error::{
    ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::scene::Scene;

/// Validates a scene manifest and returns the accumulated result.
///
/// Errors mark states the export orchestrator cannot work with
/// (ambiguous registries, dangling references); warnings mark states
/// that export fine but usually mean a misconfigured manifest.
pub fn validate_scene(scene: &Scene) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_object_names(scene, &mut result);
    validate_action_names(scene, &mut result);
    validate_mesh_slots(scene, &mut result);
    validate_armature(scene, &mut result);
    check_warnings(scene, &mut result);

    result
}

/// Object names are the registry's identity and must be unique.
fn validate_object_names(scene: &Scene, result: &mut ValidationResult) {
    let mut seen: HashSet<&str> = HashSet::new();
    for (i, obj) in scene.objects.iter().enumerate() {
        if !seen.insert(&obj.name) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateObjectName,
                format!("duplicate object name: '{}'", obj.name),
                format!("objects[{}].name", i),
            ));
        }
    }
}

fn validate_action_names(scene: &Scene, result: &mut ValidationResult) {
    let mut seen: HashSet<&str> = HashSet::new();
    for (i, action) in scene.actions.iter().enumerate() {
        if !seen.insert(&action.name) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateActionName,
                format!("duplicate action name: '{}'", action.name),
                format!("actions[{}].name", i),
            ));
        }
    }
}

fn validate_mesh_slots(scene: &Scene, result: &mut ValidationResult) {
    for (i, slot) in scene.mesh_slots.iter().enumerate() {
        match scene.object(&slot.object) {
            None => result.add_error(ValidationError::with_path(
                ErrorCode::UnknownSlotObject,
                format!("mesh slot references unknown object '{}'", slot.object),
                format!("mesh_slots[{}].object", i),
            )),
            Some(obj) if !obj.is_mesh() => result.add_error(ValidationError::with_path(
                ErrorCode::SlotObjectNotMesh,
                format!("mesh slot object '{}' is a {}", slot.object, obj.kind),
                format!("mesh_slots[{}].object", i),
            )),
            Some(_) => {}
        }
    }
}

fn validate_armature(scene: &Scene, result: &mut ValidationResult) {
    let Some(name) = scene.armature.as_deref() else {
        return;
    };

    match scene.object(name) {
        None => result.add_error(ValidationError::with_path(
            ErrorCode::ArmatureNotFound,
            format!("designated armature '{}' does not exist", name),
            "armature",
        )),
        Some(obj) if !obj.is_armature() => result.add_error(ValidationError::with_path(
            ErrorCode::ArmatureWrongKind,
            format!("designated armature '{}' is a {}", name, obj.kind),
            "armature",
        )),
        Some(obj) if obj.data.is_none() => result.add_error(ValidationError::with_path(
            ErrorCode::MissingArmatureData,
            format!("armature object '{}' has no armature data", name),
            "armature",
        )),
        Some(_) => {}
    }
}

fn check_warnings(scene: &Scene, result: &mut ValidationResult) {
    if scene.character_name.trim().is_empty() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::BlankCharacterName,
            "character name is blank; the export falls back to 'Character'",
            "character_name",
        ));
    }

    if !scene.mesh_slots.is_empty() && !scene.mesh_slots.iter().any(|s| s.export) {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::NoMeshSlotsFlagged,
            "no mesh slots are flagged for export",
            "mesh_slots",
        ));
    }

    // Curves naming bones the designated armature does not have usually
    // mean the manifest and rig drifted apart.
    if let Some(armature) = scene.armature_object() {
        if let Some(data) = armature.data.as_ref() {
            for (ai, action) in scene.actions.iter().enumerate() {
                for curve in &action.curves {
                    if let Some(bone) = curve.target.bone.as_deref() {
                        if data.bone(bone).is_none() {
                            result.add_warning(ValidationWarning::with_path(
                                WarningCode::UnknownCurveBone,
                                format!(
                                    "action '{}' animates bone '{}' missing from '{}'",
                                    action.name, bone, armature.name
                                ),
                                format!("actions[{}]", ai),
                            ));
                        }
                    }
                }
            }
        }
    }
}

//! Collection management operations.
//!
//! Plain CRUD over the manifest's host-managed collections: the
//! character mesh list and the action registry's inclusion flags, plus
//! the NLA and unit-scale conveniences. Flag changes propagate to the
//! external animation manager's mirror flag through an explicit binding
//! function rather than an implicit change callback.

use crate::action::Action;
use crate::error::SceneError;
use crate::scene::{MeshSlot, NlaStrip, NlaTrack, Scene, UnitSystem};

/// Unit scale expected by the target game engine (1 unit = 1 cm).
pub const ENGINE_UNIT_SCALE: f32 = 0.01;

/// Adds a mesh to the character export list.
///
/// The object must exist and be a mesh; duplicates are rejected.
pub fn add_mesh_slot(scene: &mut Scene, name: &str) -> Result<(), SceneError> {
    let obj = scene
        .object(name)
        .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
    if !obj.is_mesh() {
        return Err(SceneError::NotAMesh(name.to_string()));
    }
    if scene.mesh_slots.iter().any(|s| s.object == name) {
        return Err(SceneError::DuplicateMeshSlot(name.to_string()));
    }
    scene.mesh_slots.push(MeshSlot::new(name));
    Ok(())
}

/// Removes a mesh from the character export list.
pub fn remove_mesh_slot(scene: &mut Scene, name: &str) -> Result<(), SceneError> {
    let index = scene
        .mesh_slots
        .iter()
        .position(|s| s.object == name)
        .ok_or_else(|| SceneError::MeshSlotNotFound(name.to_string()))?;
    scene.mesh_slots.remove(index);
    Ok(())
}

/// Copies an action's `export` flag into its external-manager mirror
/// flag.
///
/// The mirror is updated only when it is present: the integration is
/// optional, and its presence is expressed by the field itself instead
/// of a dynamic capability probe. Invoke after any `export` mutation.
pub fn sync_selected_flag(action: &mut Action) {
    if let Some(selected) = action.selected.as_mut() {
        if *selected != action.export {
            *selected = action.export;
        }
    }
}

/// Sets one action's export inclusion flag.
pub fn set_action_export(scene: &mut Scene, name: &str, export: bool) -> Result<(), SceneError> {
    let action = scene
        .action_mut(name)
        .ok_or_else(|| SceneError::ActionNotFound(name.to_string()))?;
    action.export = export;
    sync_selected_flag(action);
    Ok(())
}

/// Sets every action's export inclusion flag (the select-all toggle).
pub fn set_all_actions_export(scene: &mut Scene, export: bool) {
    for action in &mut scene.actions {
        action.export = export;
        sync_selected_flag(action);
    }
}

/// Deletes every action flagged for export, unbinding deleted actions
/// from any object that had them bound. Returns the number removed.
pub fn delete_flagged_actions(scene: &mut Scene) -> usize {
    let doomed: Vec<String> = scene
        .flagged_actions()
        .map(|a| a.name.clone())
        .collect();

    for name in &doomed {
        for obj in &mut scene.objects {
            if let Some(binding) = obj.animation.as_mut() {
                if binding.action.as_deref() == Some(name.as_str()) {
                    binding.action = None;
                }
                binding
                    .nla_tracks
                    .retain(|t| t.strips.first().map(|s| s.action.as_str()) != Some(name.as_str()));
            }
        }
    }

    scene.actions.retain(|a| !a.export);
    doomed.len()
}

/// Pushes every flagged action onto the designated armature's NLA
/// stack, one track per action.
///
/// An existing track whose first strip plays the same action is
/// replaced, matching the host add-on's behavior. Returns the number of
/// actions pushed.
pub fn push_actions_to_nla(scene: &mut Scene) -> Result<usize, SceneError> {
    let armature_name = scene
        .armature
        .clone()
        .ok_or(SceneError::NoArmatureDesignated)?;
    if scene.object(&armature_name).is_none() {
        return Err(SceneError::ObjectNotFound(armature_name));
    }

    let flagged: Vec<(String, f32, f32)> = scene
        .flagged_actions()
        .map(|a| (a.name.clone(), a.frame_start, a.frame_end))
        .collect();

    let armature = scene
        .object_mut(&armature_name)
        .ok_or_else(|| SceneError::ObjectNotFound(armature_name.clone()))?;
    let binding = armature.animation_mut();

    for (name, frame_start, frame_end) in &flagged {
        binding
            .nla_tracks
            .retain(|t| t.strips.first().map(|s| s.action.as_str()) != Some(name.as_str()));
        binding.nla_tracks.push(NlaTrack {
            name: name.clone(),
            strips: vec![NlaStrip {
                name: name.clone(),
                action: name.clone(),
                frame_start: *frame_start,
                frame_end: *frame_end,
            }],
        });
    }

    Ok(flagged.len())
}

/// Forces the metric unit system at the engine unit scale (0.01).
/// Returns the previous scale so callers can warn when it changed.
pub fn set_engine_unit_scale(scene: &mut Scene) -> f32 {
    let old_scale = scene.units.scale_length;
    scene.units.system = UnitSystem::Metric;
    scene.units.scale_length = ENGINE_UNIT_SCALE;
    old_scale
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
            .push(SceneObject::armature("Rig", vec![Bone::new("Root")]));
        scene.objects.push(SceneObject::mesh("Body"));
        scene.armature = Some("Rig".to_string());
        scene.actions.push(Action::new("Walk", 1.0, 20.0));
        scene.actions.push(Action::new("Idle", 1.0, 60.0));
        scene
    }

    #[test]
    fn test_add_mesh_slot_rejects_duplicates_and_non_meshes() {
        let mut scene = create_test_scene();

        add_mesh_slot(&mut scene, "Body").unwrap();
        assert!(matches!(
            add_mesh_slot(&mut scene, "Body"),
            Err(SceneError::DuplicateMeshSlot(_))
        ));
        assert!(matches!(
            add_mesh_slot(&mut scene, "Rig"),
            Err(SceneError::NotAMesh(_))
        ));
        assert!(matches!(
            add_mesh_slot(&mut scene, "Ghost"),
            Err(SceneError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_remove_mesh_slot() {
        let mut scene = create_test_scene();
        add_mesh_slot(&mut scene, "Body").unwrap();

        remove_mesh_slot(&mut scene, "Body").unwrap();
        assert!(scene.mesh_slots.is_empty());
        assert!(matches!(
            remove_mesh_slot(&mut scene, "Body"),
            Err(SceneError::MeshSlotNotFound(_))
        ));
    }

    #[test]
    fn test_sync_selected_flag_only_when_present() {
        let mut action = Action::new("Walk", 1.0, 20.0);
        action.export = false;

        // No mirror flag: nothing to sync.
        sync_selected_flag(&mut action);
        assert_eq!(action.selected, None);

        // Mirror present: follows export.
        action.selected = Some(true);
        sync_selected_flag(&mut action);
        assert_eq!(action.selected, Some(false));
    }

    #[test]
    fn test_set_all_actions_export_syncs_mirrors() {
        let mut scene = create_test_scene();
        scene.action_mut("Walk").unwrap().selected = Some(true);

        set_all_actions_export(&mut scene, false);
        assert!(scene.actions.iter().all(|a| !a.export));
        assert_eq!(scene.action("Walk").unwrap().selected, Some(false));
        assert_eq!(scene.action("Idle").unwrap().selected, None);
    }

    #[test]
    fn test_delete_flagged_actions_unbinds() {
        let mut scene = create_test_scene();
        set_action_export(&mut scene, "Idle", false).unwrap();
        scene
            .object_mut("Rig")
            .unwrap()
            .animation_mut()
            .action = Some("Walk".to_string());

        let removed = delete_flagged_actions(&mut scene);
        assert_eq!(removed, 1);
        assert!(scene.action("Walk").is_none());
        assert!(scene.action("Idle").is_some());
        assert_eq!(scene.object("Rig").unwrap().bound_action(), None);
    }

    #[test]
    fn test_push_to_nla_replaces_existing_track() {
        let mut scene = create_test_scene();

        let pushed = push_actions_to_nla(&mut scene).unwrap();
        assert_eq!(pushed, 2);

        // Pushing again replaces rather than duplicating.
        let pushed = push_actions_to_nla(&mut scene).unwrap();
        assert_eq!(pushed, 2);

        let rig = scene.object("Rig").unwrap();
        let tracks = &rig.animation.as_ref().unwrap().nla_tracks;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].strips[0].action, "Walk");
        assert_eq!(tracks[0].strips[0].frame_start, 1.0);
        assert_eq!(tracks[0].strips[0].frame_end, 20.0);
    }

    #[test]
    fn test_push_to_nla_requires_armature() {
        let mut scene = create_test_scene();
        scene.armature = None;
        assert!(matches!(
            push_actions_to_nla(&mut scene),
            Err(SceneError::NoArmatureDesignated)
        ));
    }

    #[test]
    fn test_set_engine_unit_scale() {
        let mut scene = create_test_scene();
        scene.units.scale_length = 1.0;

        let old = set_engine_unit_scale(&mut scene);
        assert_eq!(old, 1.0);
        assert_eq!(scene.units.system, UnitSystem::Metric);
        assert_eq!(scene.units.scale_length, ENGINE_UNIT_SCALE);
    }
}

//! Scene state snapshot and scoped restore.
//!
//! The batch exporter mutates process-wide scene state (units, frame,
//! the character armature's transform and pose position) on the way to
//! every export call. [`SceneSnapshot`] captures that state up front and
//! [`StateGuard`] guarantees it is written back on every exit path,
//! including unwinding, so a failed export never leaves the scene
//! corrupted.

use std::ops::{Deref, DerefMut};

use glam::Vec3;

use crate::scene::{PosePosition, Scene, UnitSettings};

/// Captured armature state, present only when a skeleton is designated.
#[derive(Debug, Clone, PartialEq)]
struct ArmatureSnapshot {
    name: String,
    location: Vec3,
    rotation_euler: Vec3,
    scale: Vec3,
    pose_position: PosePosition,
}

/// A value snapshot of the mutable scene state.
///
/// Created immediately before a mutating export step and consumed
/// exactly once by [`SceneSnapshot::restore`]. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    units: UnitSettings,
    frame_current: i32,
    armature: Option<ArmatureSnapshot>,
}

impl SceneSnapshot {
    /// Captures the current state. Side-effect free, O(1).
    ///
    /// When no skeleton is designated (or the designation does not
    /// resolve to an armature object), the armature sub-fields are
    /// simply absent and restore skips them.
    pub fn capture(scene: &Scene) -> Self {
        let armature = scene.armature_object().and_then(|obj| {
            let data = obj.data.as_ref()?;
            Some(ArmatureSnapshot {
                name: obj.name.clone(),
                location: obj.location,
                rotation_euler: obj.rotation_euler,
                scale: obj.scale,
                pose_position: data.pose_position,
            })
        });

        Self {
            units: scene.units,
            frame_current: scene.frame_current,
            armature,
        }
    }

    /// Writes every captured field back, unconditionally.
    ///
    /// Armature fields are skipped when they were not captured or the
    /// object has since vanished from the registry.
    pub fn restore(self, scene: &mut Scene) {
        scene.units = self.units;
        scene.frame_current = self.frame_current;

        if let Some(snap) = self.armature {
            if let Some(obj) = scene.object_mut(&snap.name) {
                obj.location = snap.location;
                obj.rotation_euler = snap.rotation_euler;
                obj.scale = snap.scale;
                if let Some(data) = obj.data.as_mut() {
                    data.pose_position = snap.pose_position;
                }
            }
        }
    }
}

/// RAII guard over the mutable scene state.
///
/// Captures a [`SceneSnapshot`] plus the selection set and active-object
/// designation on entry, and restores all of it on drop. This is the
/// scope-guaranteed cleanup path the export orchestrator relies on.
/// Dereferences to [`Scene`] so the guarded scene is mutated through the
/// guard.
#[derive(Debug)]
pub struct StateGuard<'a> {
    scene: &'a mut Scene,
    snapshot: Option<SceneSnapshot>,
    saved_selection: Vec<String>,
    saved_active_object: Option<String>,
}

impl<'a> StateGuard<'a> {
    /// Captures the scene state and takes ownership of the mutation
    /// window.
    pub fn capture(scene: &'a mut Scene) -> Self {
        let snapshot = SceneSnapshot::capture(scene);
        let saved_selection = scene.selection.clone();
        let saved_active_object = scene.active_object.clone();
        Self {
            scene,
            snapshot: Some(snapshot),
            saved_selection,
            saved_active_object,
        }
    }
}

impl Deref for StateGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        self.scene
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Scene {
        self.scene
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(self.scene);
        }

        // Reselect the pre-run set, skipping objects that vanished.
        let selection = std::mem::take(&mut self.saved_selection);
        self.scene.select_only(&selection);

        // Restore the active object; fall back to the first selected
        // object when the original is gone.
        let active = self
            .saved_active_object
            .take()
            .filter(|name| self.scene.object(name).is_some())
            .or_else(|| self.scene.selection.first().cloned());
        self.scene.active_object = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bone, SceneObject, UnitSystem};
    use pretty_assertions::assert_eq;

    fn create_test_scene() -> Scene {
        let mut scene = Scene::new("test");
        scene
            .objects
            .push(SceneObject::armature("Rig", vec![Bone::new("Root")]));
        scene.objects.push(SceneObject::mesh("Body"));
        scene.armature = Some("Rig".to_string());
        scene.selection = vec!["Body".to_string()];
        scene.active_object = Some("Body".to_string());
        scene.frame_current = 42;
        scene
    }

    #[test]
    fn test_restore_of_fresh_capture_is_noop() {
        let mut scene = create_test_scene();
        let before = scene.clone();

        let snapshot = SceneSnapshot::capture(&scene);
        snapshot.restore(&mut scene);

        assert_eq!(scene, before);
    }

    #[test]
    fn test_snapshot_restores_mutated_state() {
        let mut scene = create_test_scene();
        let snapshot = SceneSnapshot::capture(&scene);

        scene.units.system = UnitSystem::None;
        scene.units.scale_length = 0.01;
        scene.frame_current = 7;
        {
            let rig = scene.object_mut("Rig").unwrap();
            rig.location = Vec3::new(5.0, 0.0, 0.0);
            rig.rotation_euler = Vec3::new(0.0, 1.0, 0.0);
            rig.scale = Vec3::splat(2.0);
            rig.data.as_mut().unwrap().pose_position = PosePosition::Rest;
        }

        snapshot.restore(&mut scene);

        assert_eq!(scene.units, UnitSettings::default());
        assert_eq!(scene.frame_current, 42);
        let rig = scene.object("Rig").unwrap();
        assert_eq!(rig.location, Vec3::ZERO);
        assert_eq!(rig.scale, Vec3::ONE);
        assert_eq!(
            rig.data.as_ref().unwrap().pose_position,
            PosePosition::Pose
        );
    }

    #[test]
    fn test_snapshot_without_designated_armature() {
        let mut scene = create_test_scene();
        scene.armature = None;

        let snapshot = SceneSnapshot::capture(&scene);
        scene.object_mut("Rig").unwrap().location = Vec3::new(9.0, 9.0, 9.0);
        snapshot.restore(&mut scene);

        // No armature captured, so its transform is left alone.
        assert_eq!(
            scene.object("Rig").unwrap().location,
            Vec3::new(9.0, 9.0, 9.0)
        );
    }

    #[test]
    fn test_restore_skips_vanished_armature() {
        let mut scene = create_test_scene();
        let snapshot = SceneSnapshot::capture(&scene);

        scene.objects.retain(|o| o.name != "Rig");
        snapshot.restore(&mut scene);

        assert!(scene.object("Rig").is_none());
        assert_eq!(scene.frame_current, 42);
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut scene = create_test_scene();
        let before = scene.clone();

        {
            let mut guard = StateGuard::capture(&mut scene);
            guard.frame_current = 100;
            guard.units.system = UnitSystem::Imperial;
            guard.selection = vec!["Rig".to_string()];
            guard.active_object = Some("Rig".to_string());
            let rig = guard.object_mut("Rig").unwrap();
            rig.data.as_mut().unwrap().pose_position = PosePosition::Rest;
        }

        assert_eq!(scene, before);
    }

    #[test]
    fn test_guard_restores_on_early_exit() {
        fn mutate_and_fail(scene: &mut Scene) -> Result<(), &'static str> {
            let mut guard = StateGuard::capture(scene);
            guard.frame_current = 999;
            guard.deselect_all();
            Err("export failed")
        }

        let mut scene = create_test_scene();
        let before = scene.clone();
        assert!(mutate_and_fail(&mut scene).is_err());
        assert_eq!(scene, before);
    }

    #[test]
    fn test_guard_active_falls_back_when_original_vanished() {
        let mut scene = create_test_scene();
        scene.selection = vec!["Rig".to_string(), "Body".to_string()];

        {
            let mut guard = StateGuard::capture(&mut scene);
            guard.objects.retain(|o| o.name != "Body");
        }

        // "Body" was active but vanished mid-run; the first surviving
        // selected object takes over.
        assert_eq!(scene.selection, vec!["Rig".to_string()]);
        assert_eq!(scene.active_object, Some("Rig".to_string()));
    }
}

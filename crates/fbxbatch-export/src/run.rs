//! The batch export run.
//!
//! One sequential routine drives the whole batch: validate inputs, gate
//! on output collisions, snapshot the scene state, export the character
//! mesh and each flagged animation action, and restore. Per-item
//! failures are counted and reported but never abort the run; the
//! restore guard runs on every exit path.

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use fbxbatch_scene::lod::discover_lods;
use fbxbatch_scene::scene::{PosePosition, Scene, UnitSystem};
use fbxbatch_scene::snapshot::StateGuard;

use crate::error::{ExportError, ExportResult};
use crate::exporter::{ExportJob, FbxExporter};
use crate::reporter::Reporter;
use crate::root_motion::{extract_root_motion, RootMotionConfig};

/// Fallback character name when the configured one is blank.
const DEFAULT_CHARACTER_NAME: &str = "Character";

/// Fallback file stem for actions with blank names.
const DEFAULT_ANIMATION_NAME: &str = "UnnamedAnimation";

/// Options for one batch export run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Flat output directory all files are written into.
    pub output_dir: PathBuf,
    /// Export the character mesh (`<character_name>.fbx`).
    pub export_character: bool,
    /// Export every flagged action (`<action_name>.fbx` each).
    pub export_animations: bool,
    /// Expand the character export set with discovered LOD meshes.
    pub export_lods: bool,
    /// Proceed past existing output files, replacing them.
    pub overwrite: bool,
    /// Zero the armature transform for the character export instead of
    /// preserving it.
    pub zero_transform: bool,
    /// Character name override; falls back to the scene's.
    pub character_name: Option<String>,
    /// Root motion extraction, applied to every exported action.
    pub root_motion: Option<RootMotionConfig>,
}

impl RunOptions {
    /// Creates options exporting character and animations into
    /// `output_dir`, without LODs, overwriting, or root motion.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            export_character: true,
            export_animations: true,
            export_lods: false,
            overwrite: false,
            zero_transform: true,
            character_name: None,
            root_motion: None,
        }
    }

    /// Enables or disables the character mesh export.
    pub fn with_character(mut self, export: bool) -> Self {
        self.export_character = export;
        self
    }

    /// Enables or disables the animation export.
    pub fn with_animations(mut self, export: bool) -> Self {
        self.export_animations = export;
        self
    }

    /// Enables LOD discovery for the character export set.
    pub fn with_lods(mut self, lods: bool) -> Self {
        self.export_lods = lods;
        self
    }

    /// Confirms overwriting existing output files.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets whether the armature transform is zeroed for the character
    /// export.
    pub fn with_zero_transform(mut self, zero: bool) -> Self {
        self.zero_transform = zero;
        self
    }

    /// Overrides the character name.
    pub fn with_character_name(mut self, name: impl Into<String>) -> Self {
        self.character_name = Some(name.into());
        self
    }

    /// Enables root motion extraction.
    pub fn with_root_motion(mut self, config: RootMotionConfig) -> Self {
        self.root_motion = Some(config);
        self
    }
}

/// What kind of item one export invocation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// The character mesh export.
    Character,
    /// One animation action export.
    Animation,
}

/// Result of one export item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// Item name (character name or action name).
    pub name: String,
    /// Item kind.
    pub kind: ItemKind,
    /// Output filename within the run's output directory.
    pub file: String,
    /// Whether the export succeeded.
    pub success: bool,
    /// Error message if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Export time in milliseconds.
    pub duration_ms: u64,
}

impl ItemResult {
    fn success(name: &str, kind: ItemKind, file: &str, duration_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            file: file.to_string(),
            success: true,
            error: None,
            duration_ms,
        }
    }

    fn failure(name: &str, kind: ItemKind, file: &str, error: String, duration_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            file: file.to_string(),
            success: false,
            error: Some(error),
            duration_ms,
        }
    }
}

/// Classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every item exported.
    Success,
    /// Some items failed; the rest exported.
    Partial,
    /// The run completed but nothing was exported.
    NothingExported,
}

impl RunOutcome {
    /// Classifies a run from its counters.
    pub fn classify(exported: usize, failed: usize) -> Self {
        if failed > 0 {
            RunOutcome::Partial
        } else if exported == 0 {
            RunOutcome::NothingExported
        } else {
            RunOutcome::Success
        }
    }
}

/// Summary of a finished batch export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of items exported.
    pub exported: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Run classification.
    pub outcome: RunOutcome,
    /// Per-item results, in export order.
    pub items: Vec<ItemResult>,
}

impl RunSummary {
    /// Serializes the summary to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The batch export orchestrator.
pub struct BatchExport<'a, E: FbxExporter, R: Reporter> {
    exporter: &'a E,
    reporter: &'a R,
    options: RunOptions,
}

impl<'a, E: FbxExporter, R: Reporter> BatchExport<'a, E, R> {
    /// Creates an orchestrator.
    pub fn new(exporter: &'a E, reporter: &'a R, options: RunOptions) -> Self {
        Self {
            exporter,
            reporter,
            options,
        }
    }

    /// Runs the batch export.
    ///
    /// Fatal configuration and IO problems (missing output directory,
    /// missing or wrong-kind armature, unresolved root motion bone,
    /// unconfirmed output collisions) abort with an error before any
    /// scene mutation. Everything after that point is per-item: one
    /// broken action never blocks the rest, and the captured scene
    /// state is restored on every exit path.
    pub fn run(&self, scene: &mut Scene) -> ExportResult<RunSummary> {
        // --- Validate inputs (no mutation yet) ---
        if self.options.output_dir.as_os_str().is_empty() {
            return Err(ExportError::MissingOutputDir);
        }

        let needs_armature = self.options.export_character || self.options.export_animations;
        let armature_name = if needs_armature {
            let name = scene.armature.clone().ok_or(ExportError::NoArmature)?;
            let obj = scene
                .object(&name)
                .ok_or_else(|| ExportError::MissingObject(name.clone()))?;
            if !obj.is_armature() || obj.data.is_none() {
                return Err(ExportError::NotAnArmature { name });
            }
            Some(name)
        } else {
            None
        };

        // Root motion misconfiguration is fatal before any mutation,
        // not a per-item surprise in the middle of the run.
        if self.options.export_animations {
            if let (Some(config), Some(name)) = (&self.options.root_motion, &armature_name) {
                let has_bone = scene
                    .object(name)
                    .and_then(|o| o.data.as_ref())
                    .is_some_and(|d| d.bone(&config.root_bone).is_some());
                if !has_bone {
                    return Err(ExportError::RootBoneNotFound {
                        bone: config.root_bone.clone(),
                        armature: name.clone(),
                    });
                }
            }
        }

        std::fs::create_dir_all(&self.options.output_dir).map_err(|source| {
            ExportError::OutputDirCreateFailed {
                path: self.options.output_dir.clone(),
                source,
            }
        })?;

        // --- Overwrite gate ---
        let character_name = self.resolved_character_name(scene);
        let planned = self.planned_files(scene, &character_name);
        let collisions: Vec<String> = planned
            .iter()
            .filter(|f| self.options.output_dir.join(f).exists())
            .cloned()
            .collect();
        if !collisions.is_empty() && !self.options.overwrite {
            return Err(ExportError::OverwriteBlocked { files: collisions });
        }

        // --- Export under the restore guard ---
        let mut items: Vec<ItemResult> = Vec::new();
        {
            let mut guard = StateGuard::capture(scene);
            // Exports always run in the metric unit system; the guard
            // puts the user's units back afterwards.
            guard.units.system = UnitSystem::Metric;

            if let Some(armature) = armature_name.as_deref() {
                if self.options.export_character {
                    self.run_character(&mut guard, armature, &character_name, &mut items);
                }
                if self.options.export_animations {
                    self.run_animations(&mut guard, armature, &mut items);
                }
            }
        }

        // --- Summarize ---
        let exported = items.iter().filter(|i| i.success).count();
        let failed = items.len() - exported;
        let outcome = RunOutcome::classify(exported, failed);
        match outcome {
            RunOutcome::Partial => self
                .reporter
                .warning(&format!("Export finished with {} error(s).", failed)),
            RunOutcome::NothingExported => self
                .reporter
                .warning("Export finished, but nothing was exported. Check settings."),
            RunOutcome::Success => self.reporter.info(&format!(
                "Batch export finished successfully ({} files).",
                exported
            )),
        }

        Ok(RunSummary {
            exported,
            failed,
            outcome,
            items,
        })
    }

    /// Character name after override and blank-name fallback.
    fn resolved_character_name(&self, scene: &Scene) -> String {
        let name = self
            .options
            .character_name
            .clone()
            .unwrap_or_else(|| scene.character_name.clone());
        let trimmed = name.trim();
        if trimmed.is_empty() {
            DEFAULT_CHARACTER_NAME.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Every filename the run would produce, for the overwrite gate.
    fn planned_files(&self, scene: &Scene, character_name: &str) -> Vec<String> {
        let mut planned = Vec::new();
        if self.options.export_character {
            planned.push(format!("{}.fbx", character_name));
        }
        if self.options.export_animations {
            for action in scene.flagged_actions() {
                planned.push(format!("{}.fbx", action_file_stem(&action.name)));
            }
        }
        planned
    }

    /// Rest-pose character mesh export: one file, no animation baked.
    fn run_character(
        &self,
        scene: &mut Scene,
        armature: &str,
        character_name: &str,
        items: &mut Vec<ItemResult>,
    ) {
        self.reporter.info("Starting character mesh export...");

        match scene.object_mut(armature) {
            Some(obj) => {
                if self.options.zero_transform {
                    obj.location = Vec3::ZERO;
                    obj.rotation_euler = Vec3::ZERO;
                }
                if let Some(data) = obj.data.as_mut() {
                    data.pose_position = PosePosition::Rest;
                }
            }
            None => {
                items.push(ItemResult::failure(
                    character_name,
                    ItemKind::Character,
                    "",
                    format!("armature '{}' vanished from the scene", armature),
                    0,
                ));
                return;
            }
        }
        // The rest pose is sampled at frame 0.
        scene.frame_current = 0;

        // Explicitly listed meshes (LOD0 / base).
        let slots = scene.mesh_slots.clone();
        let mut export_set = vec![armature.to_string()];
        for slot in slots.iter().filter(|s| s.export) {
            match scene.object(&slot.object) {
                Some(obj) if obj.is_mesh() => export_set.push(slot.object.clone()),
                _ => self.reporter.warning(&format!(
                    "Mesh '{}' in list but not in scene. Skipping.",
                    slot.object
                )),
            }
        }

        if self.options.export_lods {
            self.reporter
                .info("LOD export enabled, searching for LOD meshes...");
            let included: Vec<&str> = export_set.iter().map(String::as_str).collect();
            let lods = discover_lods(scene, &included, armature);
            if lods.is_empty() {
                self.reporter.warning(
                    "LOD export enabled, but no additional LOD meshes matched the \
                     _LODn pattern on this armature.",
                );
            } else {
                self.reporter
                    .info(&format!("Found {} additional LOD meshes.", lods.len()));
                export_set.extend(lods);
            }
        }

        if export_set.len() == 1 {
            // Only the armature: nothing worth writing.
            self.reporter
                .warning("Exporting character but no meshes selected in list.");
            return;
        }

        // Detach the bound action so the rest pose is not perturbed.
        let detached = scene
            .object_mut(armature)
            .and_then(|o| o.animation.as_mut())
            .and_then(|b| b.action.take());

        scene.select_only(&export_set);
        scene.active_object = Some(armature.to_string());

        let file_name = format!("{}.fbx", character_name);
        let job = ExportJob {
            output_path: self.options.output_dir.join(&file_name),
            selection: export_set,
            active_object: Some(armature.to_string()),
            settings: scene.settings.clone().with_bake(false, false),
            replacement_action: None,
        };

        let start = Instant::now();
        let result = self.exporter.export(scene, &job);
        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                self.reporter
                    .info(&format!("Exported character: {}", file_name));
                items.push(ItemResult::success(
                    character_name,
                    ItemKind::Character,
                    &file_name,
                    duration_ms,
                ));
            }
            Err(e) => {
                self.reporter
                    .error(&format!("Failed exporting character: {}", e));
                items.push(ItemResult::failure(
                    character_name,
                    ItemKind::Character,
                    &file_name,
                    e.to_string(),
                    duration_ms,
                ));
            }
        }

        // Rebind whatever was playing before.
        if let Some(action) = detached {
            if let Some(obj) = scene.object_mut(armature) {
                obj.animation_mut().action = Some(action);
            }
        }
    }

    /// Pose-mode animation export: one file per flagged action.
    fn run_animations(&self, scene: &mut Scene, armature: &str, items: &mut Vec<ItemResult>) {
        if let Some(data) = scene.object_mut(armature).and_then(|o| o.data.as_mut()) {
            data.pose_position = PosePosition::Pose;
        }

        let flagged: Vec<String> = scene.flagged_actions().map(|a| a.name.clone()).collect();
        if flagged.is_empty() {
            self.reporter
                .warning("Animation export enabled, but no actions marked for export.");
            return;
        }
        self.reporter.info("Starting animation export...");

        let original_action = scene
            .object(armature)
            .and_then(|o| o.bound_action())
            .map(str::to_string);

        for name in &flagged {
            let file_name = format!("{}.fbx", action_file_stem(name));
            let start = Instant::now();
            let result = self.export_one_animation(scene, armature, name, &file_name);
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    self.reporter
                        .info(&format!("Exported animation: {}", file_name));
                    items.push(ItemResult::success(
                        name,
                        ItemKind::Animation,
                        &file_name,
                        duration_ms,
                    ));
                }
                Err(e) => {
                    self.reporter
                        .error(&format!("Failed exporting animation '{}': {}", name, e));
                    items.push(ItemResult::failure(
                        name,
                        ItemKind::Animation,
                        &file_name,
                        e.to_string(),
                        duration_ms,
                    ));
                }
            }
        }

        // Rebind the originally bound action, or leave unbound if it
        // was deleted mid-run.
        let rebind = original_action.filter(|n| scene.action(n).is_some());
        if let Some(obj) = scene.object_mut(armature) {
            if obj.animation.is_some() || rebind.is_some() {
                obj.animation_mut().action = rebind;
            }
        }
    }

    fn export_one_animation(
        &self,
        scene: &mut Scene,
        armature: &str,
        action_name: &str,
        file_name: &str,
    ) -> ExportResult<()> {
        let action = scene
            .action(action_name)
            .cloned()
            .ok_or_else(|| ExportError::MissingAction(action_name.to_string()))?;
        if scene.object(armature).is_none() {
            return Err(ExportError::MissingObject(armature.to_string()));
        }

        scene.select_only(&[armature.to_string()]);
        scene.active_object = Some(armature.to_string());
        if let Some(data) = scene.object_mut(armature).and_then(|o| o.data.as_mut()) {
            data.pose_position = PosePosition::Pose;
        }

        // Bind the action and adopt its stored frame range.
        if let Some(obj) = scene.object_mut(armature) {
            obj.animation_mut().action = Some(action_name.to_string());
        }
        scene.frame_start = action.frame_start as i32;
        scene.frame_end = action.frame_end as i32;

        // The root-motion rewrite ships with the job; the registry's
        // action stays untouched.
        let replacement_action = match &self.options.root_motion {
            Some(config) => {
                let obj = scene
                    .object(armature)
                    .ok_or_else(|| ExportError::MissingObject(armature.to_string()))?;
                Some(extract_root_motion(&action, obj, config)?)
            }
            None => None,
        };

        let job = ExportJob {
            output_path: self.options.output_dir.join(file_name),
            selection: vec![armature.to_string()],
            active_object: Some(armature.to_string()),
            settings: scene.settings.clone().with_bake(true, false),
            replacement_action,
        };
        self.exporter.export(scene, &job)?;
        Ok(())
    }
}

fn action_file_stem(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_ANIMATION_NAME
    } else {
        trimmed
    }
}

/// Convenience entry point: runs a batch export with the given
/// exporter, reporter, and options.
pub fn run_batch_export<E: FbxExporter, R: Reporter>(
    scene: &mut Scene,
    exporter: &E,
    reporter: &R,
    options: RunOptions,
) -> ExportResult<RunSummary> {
    BatchExport::new(exporter, reporter, options).run(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(RunOutcome::classify(3, 0), RunOutcome::Success);
        assert_eq!(RunOutcome::classify(2, 1), RunOutcome::Partial);
        assert_eq!(RunOutcome::classify(0, 2), RunOutcome::Partial);
        assert_eq!(RunOutcome::classify(0, 0), RunOutcome::NothingExported);
    }

    #[test]
    fn test_action_file_stem_fallback() {
        assert_eq!(action_file_stem("Walk"), "Walk");
        assert_eq!(action_file_stem("  "), "UnnamedAnimation");
    }

    #[test]
    fn test_run_options_builders() {
        let options = RunOptions::new("out")
            .with_character(false)
            .with_lods(true)
            .with_overwrite(true);
        assert!(!options.export_character);
        assert!(options.export_animations);
        assert!(options.export_lods);
        assert!(options.overwrite);
        assert_eq!(options.output_dir, PathBuf::from("out"));
    }
}

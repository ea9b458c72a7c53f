//! The FBX exporter seam and its Blender subprocess implementation.
//!
//! The batch run treats "export the scene to FBX" as a black box behind
//! the [`FbxExporter`] trait: it assembles an [`ExportJob`] from user
//! settings and the mutated scene state, invokes the exporter, and never
//! inspects the produced file.
//!
//! [`BlenderFbxExporter`] is the production implementation. It spawns
//! Blender in background mode on the manifest's source `.blend`, hands
//! it a directives JSON (the scene mutations to apply plus the FBX
//! operator parameters) through an embedded Python entrypoint, and reads
//! back a report JSON.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fbxbatch_scene::action::Action;
use fbxbatch_scene::scene::{PosePosition, Scene};
use fbxbatch_scene::settings::FbxExportSettings;

const EMBEDDED_ENTRYPOINT_PY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../blender/entrypoint.py"
));

/// Default timeout for one Blender export invocation (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Result type for exporter operations.
pub type ExporterResult<T> = Result<T, ExporterError>;

/// Errors from an exporter implementation.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Blender executable not found.
    #[error("Blender executable not found. Ensure Blender is installed and in PATH, or set FBXBATCH_BLENDER")]
    BlenderNotFound,

    /// The scene manifest has no source `.blend` to export from.
    #[error("scene manifest has no source .blend file")]
    MissingBlendFile,

    /// Failed to spawn the Blender process.
    #[error("failed to spawn Blender process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// The Blender process timed out.
    #[error("Blender process timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The Blender process exited with a non-zero status.
    #[error("Blender process exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Failed to serialize the directives for Blender.
    #[error("failed to serialize export directives: {0}")]
    SerializeDirectivesFailed(#[source] serde_json::Error),

    /// Failed to write the directives file for Blender.
    #[error("failed to write export directives: {0}")]
    WriteDirectivesFailed(#[source] std::io::Error),

    /// Failed to read the report back from Blender.
    #[error("failed to read export report from {path}: {source}")]
    ReadReportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report JSON did not parse.
    #[error("failed to parse export report: {0}")]
    ParseReportFailed(#[source] serde_json::Error),

    /// Blender ran but reported an export failure.
    #[error("export failed: {message}")]
    ExportFailed { message: String },

    /// The expected output file is missing after a reported success.
    #[error("expected output file not found: {path}")]
    OutputNotFound { path: PathBuf },

    /// The Python entrypoint script was not found.
    #[error("entrypoint script not found at: {path}")]
    EntrypointNotFound { path: PathBuf },

    /// IO error during exporter file handling.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new export failed error.
    pub fn export_failed(message: impl Into<String>) -> Self {
        Self::ExportFailed {
            message: message.into(),
        }
    }
}

/// One export invocation, assembled by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct ExportJob {
    /// Destination file.
    pub output_path: PathBuf,
    /// Names of the objects to export.
    pub selection: Vec<String>,
    /// Name of the active object.
    pub active_object: Option<String>,
    /// Operator settings, with the per-item bake flags already applied.
    pub settings: FbxExportSettings,
    /// Inline replacement for the bound action (a root-motion rewrite),
    /// shipped with the job instead of entering the scene's registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_action: Option<Action>,
}

/// Exports a scene selection to FBX.
///
/// Implementations receive the scene *after* the orchestrator has
/// mutated it for the item (pose position, frame range, bound action,
/// units) and must not mutate it further.
pub trait FbxExporter {
    /// Performs one export invocation.
    fn export(&self, scene: &Scene, job: &ExportJob) -> ExporterResult<()>;
}

/// Report written by the Blender entrypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlenderReport {
    /// Whether the entrypoint succeeded.
    pub ok: bool,
    /// Error message when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Path of the written file, relative or absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

/// Probe-mode report wrapping the dumped scene manifest. The shared
/// `ok`/`error` envelope is handled by `run_entrypoint`.
#[derive(Debug, Deserialize)]
struct ProbeReport {
    manifest: Option<Scene>,
}

/// Configuration for the Blender exporter.
#[derive(Debug, Clone)]
pub struct BlenderConfig {
    /// Path to the Blender executable.
    pub blender_path: Option<PathBuf>,
    /// Path to the Python entrypoint script.
    pub entrypoint_path: PathBuf,
    /// Timeout for one Blender invocation.
    pub timeout: Duration,
    /// Whether to capture Blender's stderr.
    pub capture_output: bool,
}

impl Default for BlenderConfig {
    fn default() -> Self {
        Self {
            blender_path: None,
            entrypoint_path: PathBuf::from("blender/entrypoint.py"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            capture_output: true,
        }
    }
}

impl BlenderConfig {
    /// Sets the Blender executable path.
    pub fn blender_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.blender_path = Some(path.into());
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

struct ResolvedEntrypoint {
    path: PathBuf,
    _tempfile: Option<tempfile::NamedTempFile>,
}

/// The Blender subprocess FBX exporter.
pub struct BlenderFbxExporter {
    config: BlenderConfig,
}

impl BlenderFbxExporter {
    /// Creates an exporter with default configuration.
    pub fn new() -> Self {
        Self {
            config: BlenderConfig::default(),
        }
    }

    /// Creates an exporter with the given configuration.
    pub fn with_config(config: BlenderConfig) -> Self {
        Self { config }
    }

    /// Finds the Blender executable.
    fn find_blender(&self) -> ExporterResult<PathBuf> {
        // Check config override first
        if let Some(ref path) = self.config.blender_path {
            if path.exists() {
                return Ok(path.clone());
            }
        }

        // Check FBXBATCH_BLENDER environment variable
        if let Ok(path) = std::env::var("FBXBATCH_BLENDER") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        // Try to find Blender in PATH
        let blender_names = if cfg!(windows) {
            vec!["blender.exe", "blender"]
        } else {
            vec!["blender"]
        };

        for name in blender_names {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        // Try common installation paths
        let common_paths = if cfg!(windows) {
            vec![
                "C:\\Program Files\\Blender Foundation\\Blender 4.0\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender 3.6\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender\\blender.exe",
            ]
        } else if cfg!(target_os = "macos") {
            vec![
                "/Applications/Blender.app/Contents/MacOS/Blender",
                "/Applications/Blender.app/Contents/MacOS/blender",
            ]
        } else {
            vec![
                "/usr/bin/blender",
                "/usr/local/bin/blender",
                "/snap/bin/blender",
            ]
        };

        for path_str in common_paths {
            let path = PathBuf::from(path_str);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(ExporterError::BlenderNotFound)
    }

    fn resolve_entrypoint(&self) -> ExporterResult<ResolvedEntrypoint> {
        // Config override first.
        if self.config.entrypoint_path.exists() {
            return Ok(ResolvedEntrypoint {
                path: self.config.entrypoint_path.clone(),
                _tempfile: None,
            });
        }

        // Environment override (fallback).
        if let Ok(path) = std::env::var("FBXBATCH_ENTRYPOINT") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(ResolvedEntrypoint {
                    path,
                    _tempfile: None,
                });
            }
            return Err(ExporterError::EntrypointNotFound { path });
        }

        // Last resort: write the embedded entrypoint to a temp file.
        let mut file = tempfile::Builder::new()
            .prefix("fbxbatch_entrypoint_")
            .suffix(".py")
            .tempfile()
            .map_err(ExporterError::Io)?;
        file.write_all(EMBEDDED_ENTRYPOINT_PY.as_bytes())
            .map_err(ExporterError::Io)?;
        file.flush().map_err(ExporterError::Io)?;

        Ok(ResolvedEntrypoint {
            path: file.path().to_path_buf(),
            _tempfile: Some(file),
        })
    }

    /// Runs the entrypoint in the given mode and reads its report.
    fn run_entrypoint(
        &self,
        blend_file: &Path,
        mode: &str,
        directives_path: Option<&Path>,
        report_path: &Path,
    ) -> ExporterResult<BlenderReport> {
        let blender_path = self.find_blender()?;
        let entrypoint = self.resolve_entrypoint()?;

        // blender --background file.blend --python entrypoint.py --
        //     --mode <mode> [--directives <path>] --report <path>
        let mut cmd = Command::new(&blender_path);
        cmd.arg("--background")
            .arg(blend_file)
            .arg("--python")
            .arg(&entrypoint.path)
            .arg("--")
            .arg("--mode")
            .arg(mode);
        if let Some(directives) = directives_path {
            cmd.arg("--directives").arg(directives);
        }
        cmd.arg("--report").arg(report_path);

        if self.config.capture_output {
            // Only stderr is surfaced; keep stdout unpiped to avoid
            // subprocess deadlocks from a filled stdout pipe.
            cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        }

        let child = cmd.spawn().map_err(ExporterError::SpawnFailed)?;
        let (status, stderr) =
            wait_with_timeout(child, self.config.timeout, self.config.capture_output)?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            return Err(ExporterError::process_failed(exit_code, stderr));
        }

        let report_content =
            std::fs::read_to_string(report_path).map_err(|e| ExporterError::ReadReportFailed {
                path: report_path.to_path_buf(),
                source: e,
            })?;
        let report: BlenderReport =
            serde_json::from_str(&report_content).map_err(ExporterError::ParseReportFailed)?;

        if !report.ok {
            return Err(ExporterError::export_failed(
                report.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(report)
    }

    /// Probes a `.blend` file and returns its scene manifest.
    pub fn probe(&self, blend_file: &Path) -> ExporterResult<Scene> {
        let temp_dir = tempfile::tempdir().map_err(ExporterError::Io)?;
        let report_path = temp_dir.path().join("report.json");

        self.run_entrypoint(blend_file, "probe", None, &report_path)?;

        let content =
            std::fs::read_to_string(&report_path).map_err(|e| ExporterError::ReadReportFailed {
                path: report_path.clone(),
                source: e,
            })?;
        let report: ProbeReport =
            serde_json::from_str(&content).map_err(ExporterError::ParseReportFailed)?;
        let mut scene = report
            .manifest
            .ok_or_else(|| ExporterError::export_failed("no manifest in probe report"))?;
        scene.blend_file = Some(blend_file.to_path_buf());
        Ok(scene)
    }
}

impl Default for BlenderFbxExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl FbxExporter for BlenderFbxExporter {
    fn export(&self, scene: &Scene, job: &ExportJob) -> ExporterResult<()> {
        let blend_file = scene
            .blend_file
            .as_deref()
            .ok_or(ExporterError::MissingBlendFile)?;

        let directives = ExportDirectives::assemble(scene, job);
        let directives_json = serde_json::to_string(&directives)
            .map_err(ExporterError::SerializeDirectivesFailed)?;

        let temp_dir = tempfile::tempdir().map_err(ExporterError::Io)?;
        let directives_path = temp_dir.path().join("directives.json");
        let report_path = temp_dir.path().join("report.json");
        std::fs::write(&directives_path, directives_json)
            .map_err(ExporterError::WriteDirectivesFailed)?;

        self.run_entrypoint(blend_file, "export", Some(&directives_path), &report_path)?;

        if !job.output_path.exists() {
            return Err(ExporterError::OutputNotFound {
                path: job.output_path.clone(),
            });
        }

        Ok(())
    }
}

/// Everything the host-side entrypoint needs to reproduce the mutated
/// scene state and invoke the FBX operator.
#[derive(Debug, Clone, Serialize)]
struct ExportDirectives {
    output_path: PathBuf,
    unit_system: String,
    unit_scale: f32,
    frame_current: i32,
    frame_start: i32,
    frame_end: i32,
    selection: Vec<String>,
    active_object: Option<String>,
    armature: Option<ArmatureDirective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replacement_action: Option<ActionDirective>,
    operator_params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
struct ArmatureDirective {
    name: String,
    pose_position: String,
    location: [f32; 3],
    rotation_euler: [f32; 3],
    scale: [f32; 3],
    bound_action: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ActionDirective {
    name: String,
    frame_start: f32,
    frame_end: f32,
    curves: Vec<CurveDirective>,
}

#[derive(Debug, Clone, Serialize)]
struct CurveDirective {
    data_path: String,
    array_index: u8,
    keyframes: Vec<[f32; 2]>,
}

impl ExportDirectives {
    fn assemble(scene: &Scene, job: &ExportJob) -> Self {
        let armature = scene.armature_object().map(|obj| ArmatureDirective {
            name: obj.name.clone(),
            pose_position: obj
                .data
                .as_ref()
                .map(|d| d.pose_position)
                .unwrap_or(PosePosition::Pose)
                .as_str()
                .to_string(),
            location: obj.location.to_array(),
            rotation_euler: obj.rotation_euler.to_array(),
            scale: obj.scale.to_array(),
            bound_action: obj.bound_action().map(str::to_string),
        });

        let replacement_action = job.replacement_action.as_ref().map(|action| ActionDirective {
            name: action.name.clone(),
            frame_start: action.frame_start,
            frame_end: action.frame_end,
            curves: action
                .curves
                .iter()
                .map(|curve| CurveDirective {
                    data_path: curve.target.data_path(),
                    array_index: curve.target.index,
                    keyframes: curve.keyframes.iter().map(|k| [k.frame, k.value]).collect(),
                })
                .collect(),
        });

        Self {
            output_path: job.output_path.clone(),
            unit_system: scene.units.system.as_str().to_string(),
            unit_scale: scene.units.scale_length,
            frame_current: scene.frame_current,
            frame_start: scene.frame_start,
            frame_end: scene.frame_end,
            selection: job.selection.clone(),
            active_object: job.active_object.clone(),
            armature,
            replacement_action,
            operator_params: operator_params(&job.settings),
        }
    }
}

/// Maps the settings record onto the host operator's keyword arguments.
fn operator_params(settings: &FbxExportSettings) -> serde_json::Value {
    serde_json::json!({
        "use_selection": settings.use_selection,
        "use_active_collection": false,
        "use_mesh_modifiers": settings.use_mesh_modifiers,
        "mesh_smooth_type": settings.mesh_smooth_type.as_str(),
        "use_mesh_edges": settings.use_mesh_edges,
        "use_tspace": settings.use_tspace,
        "bake_anim": settings.bake_anim,
        "bake_anim_use_all_actions": settings.bake_anim_use_all_actions,
        "bake_anim_use_nla_strips": settings.bake_anim_use_nla_strips,
        "bake_anim_use_all_bones": settings.bake_anim_use_all_bones,
        "bake_anim_force_startend_keying": settings.bake_anim_force_startend_keying,
        "bake_anim_step": settings.bake_anim_step,
        "bake_anim_simplify_factor": settings.bake_anim_simplify_factor,
        "add_leaf_bones": settings.add_leaf_bones,
        "primary_bone_axis": settings.primary_bone_axis.as_str(),
        "secondary_bone_axis": settings.secondary_bone_axis.as_str(),
        "axis_forward": settings.axis_forward.as_str(),
        "axis_up": settings.axis_up.as_str(),
        "bake_space_transform": settings.bake_space_transform,
        "use_subsurf": false,
        "use_armature_deform_only": settings.use_armature_deform_only,
        "path_mode": settings.path_mode.as_str(),
        "embed_textures": settings.embed_textures,
        "batch_mode": settings.batch_mode.as_str(),
        "use_batch_own_dir": false,
        "use_metadata": settings.use_metadata,
        "global_scale": settings.global_scale,
        "apply_unit_scale": settings.apply_unit_scale,
        "apply_scale_options": settings.apply_scale_options.as_str(),
    })
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    capture_output: bool,
) -> ExporterResult<(ExitStatus, String)> {
    let start = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExporterError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(ExporterError::SpawnFailed(e)),
        }
    };

    let stderr = if capture_output {
        let mut buf = String::new();
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut buf);
        }
        buf
    } else {
        String::new()
    };

    Ok((status, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbxbatch_scene::action::{Action, ChannelProperty, ChannelTarget};
    use fbxbatch_scene::scene::{Bone, SceneObject};

    fn create_test_scene() -> Scene {
        let mut scene = Scene::new("test");
        scene
            .objects
            .push(SceneObject::armature("Rig", vec![Bone::new("Root")]));
        scene.objects.push(SceneObject::mesh("Body").skin_to("Rig"));
        scene.armature = Some("Rig".to_string());
        scene
    }

    fn create_test_job() -> ExportJob {
        ExportJob {
            output_path: PathBuf::from("out/Character.fbx"),
            selection: vec!["Rig".to_string(), "Body".to_string()],
            active_object: Some("Rig".to_string()),
            settings: FbxExportSettings::default(),
            replacement_action: None,
        }
    }

    #[test]
    fn test_config_builder() {
        let config = BlenderConfig::default()
            .blender_path("/usr/bin/blender")
            .timeout_secs(600);

        assert_eq!(config.blender_path, Some(PathBuf::from("/usr/bin/blender")));
        assert_eq!(config.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_operator_params_use_host_spellings() {
        let params = operator_params(&FbxExportSettings::default());
        assert_eq!(params["axis_forward"], "-Y");
        assert_eq!(params["axis_up"], "Z");
        assert_eq!(params["mesh_smooth_type"], "FACE");
        assert_eq!(params["apply_scale_options"], "FBX_SCALE_NONE");
        assert_eq!(params["batch_mode"], "OFF");
        assert_eq!(params["path_mode"], "COPY");
        assert_eq!(params["bake_anim"], false);
        assert_eq!(params["use_batch_own_dir"], false);
    }

    #[test]
    fn test_directives_capture_mutated_scene_state() {
        let mut scene = create_test_scene();
        scene.frame_start = 5;
        scene.frame_end = 30;
        scene
            .object_mut("Rig")
            .unwrap()
            .animation_mut()
            .action = Some("Walk".to_string());

        let job = create_test_job();
        let directives = ExportDirectives::assemble(&scene, &job);

        assert_eq!(directives.frame_start, 5);
        assert_eq!(directives.frame_end, 30);
        assert_eq!(directives.unit_system, "METRIC");
        let armature = directives.armature.unwrap();
        assert_eq!(armature.name, "Rig");
        assert_eq!(armature.bound_action.as_deref(), Some("Walk"));
        assert_eq!(armature.pose_position, "POSE");
    }

    #[test]
    fn test_directives_ship_replacement_action_curves() {
        let scene = create_test_scene();
        let mut action = Action::new("Walk_rm", 1.0, 20.0);
        action
            .curve_mut_or_insert(ChannelTarget::object(ChannelProperty::Location, 0))
            .insert_key(1.0, 2.5);
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::Location, 2))
            .insert_key(1.0, 0.0);

        let mut job = create_test_job();
        job.replacement_action = Some(action);

        let directives = ExportDirectives::assemble(&scene, &job);
        let shipped = directives.replacement_action.unwrap();
        assert_eq!(shipped.name, "Walk_rm");
        assert_eq!(shipped.curves.len(), 2);
        assert_eq!(shipped.curves[0].data_path, "location");
        assert_eq!(shipped.curves[0].keyframes, vec![[1.0, 2.5]]);
        assert_eq!(shipped.curves[1].data_path, "pose.bones[\"Root\"].location");
    }

    #[test]
    fn test_wait_with_timeout_captures_stderr() {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "echo hello 1>&2"]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", "echo hello 1>&2"]);
            cmd
        };

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let child = cmd.spawn().unwrap();

        let (status, stderr) = wait_with_timeout(child, Duration::from_secs(2), true).unwrap();
        assert!(status.success());
        assert!(stderr.to_lowercase().contains("hello"));
    }

    #[test]
    fn test_resolve_entrypoint_falls_back_to_embedded() {
        // If the user has configured an environment override, don't stomp it.
        if std::env::var_os("FBXBATCH_ENTRYPOINT").is_some() {
            eprintln!("FBXBATCH_ENTRYPOINT is set; skipping embedded entrypoint test");
            return;
        }

        let config = BlenderConfig {
            entrypoint_path: PathBuf::from("this/does/not/exist.py"),
            ..Default::default()
        };
        let exporter = BlenderFbxExporter::with_config(config);

        let entrypoint = exporter.resolve_entrypoint().unwrap();
        assert!(entrypoint.path.exists());

        let content = std::fs::read_to_string(&entrypoint.path).unwrap();
        assert!(content.contains("fbxbatch entrypoint"));
    }

    #[test]
    fn test_export_requires_blend_file() {
        let scene = create_test_scene();
        let exporter = BlenderFbxExporter::new();
        let result = exporter.export(&scene, &create_test_job());
        assert!(matches!(result, Err(ExporterError::MissingBlendFile)));
    }
}

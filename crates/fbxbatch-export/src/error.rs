//! Error types for the export engine.

use std::path::PathBuf;
use thiserror::Error;

use crate::exporter::ExporterError;

/// Result type for export engine operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised by the batch export run.
///
/// Configuration and IO variants are fatal and abort a run before any
/// scene mutation. Exporter and reference variants are recovered per
/// item by the orchestrator: logged, counted, and the run continues.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No output directory configured.
    #[error("no export directory set")]
    MissingOutputDir,

    /// Output directory could not be created.
    #[error("failed to create export directory {path}: {source}")]
    OutputDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Character or animation export requested without a designated
    /// armature.
    #[error("no character armature designated")]
    NoArmature,

    /// The designated armature is not an armature object.
    #[error("'{name}' is not an armature object")]
    NotAnArmature { name: String },

    /// Existing output files collide with the run and overwriting was
    /// not confirmed.
    #[error("{} existing file(s) would be overwritten: {}", files.len(), files.join(", "))]
    OverwriteBlocked { files: Vec<String> },

    /// The configured root motion bone does not exist on the armature.
    #[error("root motion bone '{bone}' not found on armature '{armature}'")]
    RootBoneNotFound { bone: String, armature: String },

    /// An object vanished from the scene registry mid-run.
    #[error("object '{0}' vanished from the scene")]
    MissingObject(String),

    /// An action vanished from the registry mid-run.
    #[error("action '{0}' vanished from the registry")]
    MissingAction(String),

    /// The external exporter call failed.
    #[error(transparent)]
    Exporter(#[from] ExporterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_blocked_lists_files() {
        let err = ExportError::OverwriteBlocked {
            files: vec!["Idle.fbx".to_string(), "Walk.fbx".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 existing file(s)"));
        assert!(msg.contains("Idle.fbx, Walk.fbx"));
    }

    #[test]
    fn test_root_bone_not_found_display() {
        let err = ExportError::RootBoneNotFound {
            bone: "Root".to_string(),
            armature: "Rig".to_string(),
        };
        assert!(err.to_string().contains("'Root'"));
        assert!(err.to_string().contains("'Rig'"));
    }
}

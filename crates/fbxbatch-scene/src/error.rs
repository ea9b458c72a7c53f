//! Error types for scene manifest loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or editing a scene manifest.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Referenced object does not exist in the scene registry.
    #[error("object '{0}' not found in scene")]
    ObjectNotFound(String),

    /// An operation required a mesh object.
    #[error("object '{0}' is not a mesh")]
    NotAMesh(String),

    /// An operation required an armature object.
    #[error("object '{0}' is not an armature")]
    NotAnArmature(String),

    /// Mesh slot insertion rejected because the object is already listed.
    #[error("mesh '{0}' is already in the export list")]
    DuplicateMeshSlot(String),

    /// Mesh slot removal failed because the object is not listed.
    #[error("mesh '{0}' is not in the export list")]
    MeshSlotNotFound(String),

    /// Referenced action does not exist in the action registry.
    #[error("action '{0}' not found")]
    ActionNotFound(String),

    /// No character armature has been designated on the scene.
    #[error("no character armature designated")]
    NoArmatureDesignated,

    /// Failed to read a manifest file.
    #[error("failed to read scene manifest from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a manifest file.
    #[error("failed to write scene manifest to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON did not parse.
    #[error("failed to parse scene manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Error codes for scene validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Duplicate object name
    DuplicateObjectName,
    /// E002: Duplicate action name
    DuplicateActionName,
    /// E003: Mesh slot references an unknown object
    UnknownSlotObject,
    /// E004: Mesh slot references a non-mesh object
    SlotObjectNotMesh,
    /// E005: Designated armature not found
    ArmatureNotFound,
    /// E006: Designated armature is not an armature object
    ArmatureWrongKind,
    /// E007: Armature object has no armature data block
    MissingArmatureData,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::DuplicateObjectName => "E001",
            ErrorCode::DuplicateActionName => "E002",
            ErrorCode::UnknownSlotObject => "E003",
            ErrorCode::SlotObjectNotMesh => "E004",
            ErrorCode::ArmatureNotFound => "E005",
            ErrorCode::ArmatureWrongKind => "E006",
            ErrorCode::MissingArmatureData => "E007",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for scene validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Character name is blank
    BlankCharacterName,
    /// W002: Action curve targets a bone missing from the designated armature
    UnknownCurveBone,
    /// W003: No mesh slots are flagged for export
    NoMeshSlotsFlagged,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::BlankCharacterName => "W001",
            WarningCode::UnknownCurveBone => "W002",
            WarningCode::NoMeshSlotsFlagged => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and the offending path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "mesh_slots[0].object").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and the offending path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a field path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of scene validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::DuplicateObjectName.code(), "E001");
        assert_eq!(ErrorCode::ArmatureWrongKind.code(), "E006");
        assert_eq!(WarningCode::BlankCharacterName.code(), "W001");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::with_path(
            ErrorCode::UnknownSlotObject,
            "object 'Body' does not exist",
            "mesh_slots[0].object",
        );
        assert_eq!(
            err.to_string(),
            "E003: object 'Body' does not exist (at mesh_slots[0].object)"
        );
    }

    #[test]
    fn test_validation_result_accumulation() {
        let mut result = ValidationResult::success();
        assert!(result.is_ok());

        result.add_warning(ValidationWarning::new(
            WarningCode::BlankCharacterName,
            "character name is blank",
        ));
        assert!(result.is_ok());

        result.add_error(ValidationError::new(
            ErrorCode::ArmatureNotFound,
            "no such armature",
        ));
        assert!(!result.is_ok());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }
}

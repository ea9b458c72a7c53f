//! fbxbatch export engine
//!
//! This crate drives the batch FBX export: it sequences snapshot ->
//! mutate-for-export -> invoke exporter -> restore, once for the
//! character mesh (rest pose, no animation) and once per flagged
//! animation action (pose mode, single baked action), tracking per-item
//! success and failure.
//!
//! # Architecture
//!
//! The exporter itself is a black box behind the [`FbxExporter`] trait.
//! The production implementation, [`BlenderFbxExporter`], uses a
//! two-part design:
//!
//! 1. **Rust orchestrator** - mutates the scene manifest, assembles the
//!    export job, and spawns Blender
//! 2. **Python entrypoint** - runs inside Blender, applies the shipped
//!    directives to the real scene, and invokes the host FBX operator
//!
//! Communication happens via JSON files: directives out, a report back.
//!
//! # Crate structure
//!
//! - [`run`] - the batch orchestrator and run summary
//! - [`exporter`] - the exporter seam and Blender implementation
//! - [`root_motion`] - root bone translation -> object motion rewrite
//! - [`reporter`] - severity-tagged message reporting
//! - [`error`] - error types

pub mod error;
pub mod exporter;
pub mod reporter;
pub mod root_motion;
pub mod run;

// Re-export main types at crate root
pub use error::{ExportError, ExportResult};
pub use exporter::{
    BlenderConfig, BlenderFbxExporter, BlenderReport, ExportJob, ExporterError, FbxExporter,
};
pub use reporter::{NullReporter, Reporter, Severity};
pub use root_motion::{extract_root_motion, RootMotionConfig, UpAxis};
pub use run::{run_batch_export, BatchExport, ItemKind, ItemResult, RunOptions, RunOutcome, RunSummary};

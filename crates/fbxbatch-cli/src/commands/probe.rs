//! Probe command implementation.
//!
//! Runs the Blender entrypoint in probe mode against a `.blend` file
//! and writes the dumped scene manifest.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use fbxbatch_export::exporter::{BlenderConfig, BlenderFbxExporter};

/// Runs the probe command.
pub fn run(blend: &Path, manifest: &Path, blender: Option<&Path>) -> Result<ExitCode> {
    let mut config = BlenderConfig::default();
    if let Some(path) = blender {
        config = config.blender_path(path);
    }
    let exporter = BlenderFbxExporter::with_config(config);

    println!(
        "{} probing {}",
        "INFO".blue().bold(),
        blend.display()
    );
    let scene = exporter
        .probe(blend)
        .with_context(|| format!("failed to probe {}", blend.display()))?;

    scene
        .save(manifest)
        .with_context(|| format!("failed to write manifest {}", manifest.display()))?;

    println!(
        "{} wrote {} ({} objects, {} actions)",
        "INFO".blue().bold(),
        manifest.display(),
        scene.objects.len(),
        scene.actions.len()
    );
    Ok(ExitCode::SUCCESS)
}

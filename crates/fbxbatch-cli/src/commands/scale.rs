//! Unit scale command implementation.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use fbxbatch_scene::ops;
use fbxbatch_scene::scene::Scene;

/// Sets the manifest's unit system to metric at the engine scale
/// (0.01), warning when existing content may be affected.
pub fn run(manifest: &Path) -> Result<ExitCode> {
    let mut scene = Scene::load(manifest)
        .with_context(|| format!("failed to load manifest {}", manifest.display()))?;

    let old_scale = ops::set_engine_unit_scale(&mut scene);

    if !scene.objects.is_empty() && (old_scale - ops::ENGINE_UNIT_SCALE).abs() > 0.0001 {
        println!(
            "{} scale changed from {:.4} to {:.2}; this may affect existing objects and rigs",
            "WARNING".yellow().bold(),
            old_scale,
            ops::ENGINE_UNIT_SCALE
        );
    } else {
        println!(
            "{} unit scale set to {:.2}",
            "INFO".blue().bold(),
            ops::ENGINE_UNIT_SCALE
        );
    }

    scene
        .save(manifest)
        .with_context(|| format!("failed to save manifest {}", manifest.display()))?;
    Ok(ExitCode::SUCCESS)
}

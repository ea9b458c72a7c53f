//! Character mesh list management commands.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use fbxbatch_scene::ops;
use fbxbatch_scene::scene::Scene;

use crate::MeshesCommand;

/// Runs a meshes subcommand against the manifest, saving it back after
/// any mutation.
pub fn run(manifest: &Path, command: &MeshesCommand) -> Result<ExitCode> {
    let mut scene = Scene::load(manifest)
        .with_context(|| format!("failed to load manifest {}", manifest.display()))?;

    match command {
        MeshesCommand::List => {
            list(&scene);
            return Ok(ExitCode::SUCCESS);
        }
        MeshesCommand::Add { name } => {
            ops::add_mesh_slot(&mut scene, name)?;
            println!("{} added '{}'", "INFO".blue().bold(), name);
        }
        MeshesCommand::Remove { name } => {
            ops::remove_mesh_slot(&mut scene, name)?;
            println!("{} removed '{}'", "INFO".blue().bold(), name);
        }
    }

    scene
        .save(manifest)
        .with_context(|| format!("failed to save manifest {}", manifest.display()))?;
    Ok(ExitCode::SUCCESS)
}

fn list(scene: &Scene) {
    if scene.mesh_slots.is_empty() {
        println!("{} character mesh list is empty", "INFO".blue().bold());
        return;
    }
    for slot in &scene.mesh_slots {
        let flag = if slot.export {
            "[x]".green()
        } else {
            "[ ]".normal()
        };
        let missing = if scene.object(&slot.object).is_none() {
            " (missing)".red().to_string()
        } else {
            String::new()
        };
        println!("  {} {}{}", flag, slot.object, missing);
    }
}

//! Validate command implementation.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use fbxbatch_scene::scene::Scene;
use fbxbatch_scene::validation::validate_scene;

/// Runs the validate command.
///
/// # Returns
/// Exit code: 0 when the manifest is valid, 1 otherwise.
pub fn run(manifest: &Path) -> Result<ExitCode> {
    let scene = Scene::load(manifest)
        .with_context(|| format!("failed to load manifest {}", manifest.display()))?;

    let result = validate_scene(&scene);

    for warning in &result.warnings {
        println!("{} {}", "WARNING".yellow().bold(), warning);
    }
    for error in &result.errors {
        eprintln!("{} {}", "ERROR".red().bold(), error);
    }

    if result.is_ok() {
        println!(
            "{} manifest is valid ({} warning(s))",
            "OK".green().bold(),
            result.warnings.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "{} {} error(s), {} warning(s)",
            "INVALID".red().bold(),
            result.errors.len(),
            result.warnings.len()
        );
        Ok(ExitCode::from(1))
    }
}

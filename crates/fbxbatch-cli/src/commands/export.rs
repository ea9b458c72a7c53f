//! Export command implementation.
//!
//! Loads the scene manifest, validates it, runs the batch export
//! through the Blender exporter (or a no-op exporter for dry runs), and
//! prints the run summary.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use fbxbatch_export::exporter::{
    BlenderConfig, BlenderFbxExporter, ExportJob, ExporterError, FbxExporter,
};
use fbxbatch_export::root_motion::{RootMotionConfig, UpAxis};
use fbxbatch_export::run::{run_batch_export, RunOptions, RunOutcome, RunSummary};
use fbxbatch_scene::scene::Scene;
use fbxbatch_scene::validation::validate_scene;

use crate::console::ConsoleReporter;
use crate::ExportArgs;

/// Succeeds without touching anything; used for --dry-run.
struct DryRunExporter;

impl FbxExporter for DryRunExporter {
    fn export(&self, _scene: &Scene, _job: &ExportJob) -> Result<(), ExporterError> {
        Ok(())
    }
}

/// Runs the export command.
///
/// # Returns
/// Exit code: 0 on full success, 1 when any item failed.
pub fn run(args: &ExportArgs) -> Result<ExitCode> {
    let mut scene = Scene::load(&args.manifest)
        .with_context(|| format!("failed to load manifest {}", args.manifest.display()))?;
    if let Some(blend) = &args.blend {
        scene.blend_file = Some(blend.clone());
    }

    // A broken manifest aborts before anything runs.
    let validation = validate_scene(&scene);
    for warning in &validation.warnings {
        println!("{} {}", "WARNING".yellow().bold(), warning);
    }
    if !validation.is_ok() {
        for error in &validation.errors {
            eprintln!("{} {}", "ERROR".red().bold(), error);
        }
        bail!("manifest validation failed with {} error(s)", validation.errors.len());
    }

    let mut options = RunOptions::new(&args.out_dir)
        .with_character(!args.no_character)
        .with_animations(!args.no_animations)
        .with_lods(args.lods)
        .with_overwrite(args.overwrite)
        .with_zero_transform(!args.keep_transform);
    if let Some(name) = &args.character_name {
        options = options.with_character_name(name);
    }
    if let Some(bone) = &args.root_motion_bone {
        let up_axis: UpAxis = args
            .up_axis
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        options = options.with_root_motion(
            RootMotionConfig::new(bone)
                .with_scale(args.root_motion_scale)
                .with_up_axis(up_axis)
                .with_bake_rotation(args.bake_rotation),
        );
    }

    println!("{}", "======================================".cyan());
    println!("{}", "  fbxbatch Export".cyan());
    println!("{}", "======================================".cyan());
    println!();
    println!("{} {}", "Manifest:".blue().bold(), args.manifest.display());
    println!("{} {}", "Output directory:".blue().bold(), args.out_dir.display());
    if args.dry_run {
        println!("{} dry run, nothing is written", "Mode:".blue().bold());
    }
    println!();

    let reporter = ConsoleReporter::new();
    let summary = if args.dry_run {
        run_batch_export(&mut scene, &DryRunExporter, &reporter, options)?
    } else {
        let mut config = BlenderConfig::default().timeout_secs(args.timeout);
        if let Some(path) = &args.blender {
            config = config.blender_path(path);
        }
        let exporter = BlenderFbxExporter::with_config(config);
        run_batch_export(&mut scene, &exporter, &reporter, options)?
    };

    print_summary(&summary);

    if let Some(path) = &args.summary {
        let json = summary
            .to_json_pretty()
            .context("failed to serialize run summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        println!("{} {}", "Summary report:".blue().bold(), path.display());
    }

    if summary.failed > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "======================================".cyan());
    println!("{}", "  Export Summary".cyan());
    println!("{}", "======================================".cyan());
    println!();
    println!("{} {}", "Exported:".green().bold(), summary.exported);
    println!("{} {}", "Failed:".red().bold(), summary.failed);
    println!();

    for item in &summary.items {
        if item.success {
            println!(
                "  {} {} ({}ms)",
                "SUCCESS".green(),
                item.file,
                item.duration_ms
            );
        } else {
            println!(
                "  {} {} - {}",
                "FAILED".red(),
                item.file,
                item.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    if !summary.items.is_empty() {
        println!();
    }

    let outcome = match summary.outcome {
        RunOutcome::Success => "success".green().bold(),
        RunOutcome::Partial => "partial".yellow().bold(),
        RunOutcome::NothingExported => "nothing exported".yellow().bold(),
    };
    println!("{} {}", "Outcome:".blue().bold(), outcome);
}

//! Action list management commands.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use fbxbatch_scene::ops;
use fbxbatch_scene::scene::Scene;

use crate::ActionsCommand;

/// Runs an actions subcommand against the manifest, saving it back
/// after any mutation.
pub fn run(manifest: &Path, command: &ActionsCommand) -> Result<ExitCode> {
    let mut scene = Scene::load(manifest)
        .with_context(|| format!("failed to load manifest {}", manifest.display()))?;

    match command {
        ActionsCommand::List => {
            list(&scene);
            return Ok(ExitCode::SUCCESS);
        }
        ActionsCommand::Select { name, all } => {
            set_flags(&mut scene, name.as_deref(), *all, true)?;
        }
        ActionsCommand::Deselect { name, all } => {
            set_flags(&mut scene, name.as_deref(), *all, false)?;
        }
        ActionsCommand::Delete => {
            let removed = ops::delete_flagged_actions(&mut scene);
            if removed == 0 {
                println!(
                    "{} no actions marked for export; nothing deleted",
                    "WARNING".yellow().bold()
                );
            } else {
                println!("{} deleted {} action(s)", "INFO".blue().bold(), removed);
            }
        }
        ActionsCommand::PushNla => {
            let pushed = ops::push_actions_to_nla(&mut scene)?;
            if pushed == 0 {
                println!(
                    "{} no actions marked for export; nothing pushed",
                    "WARNING".yellow().bold()
                );
            } else {
                println!(
                    "{} pushed {} action(s) to NLA",
                    "INFO".blue().bold(),
                    pushed
                );
            }
        }
    }

    scene
        .save(manifest)
        .with_context(|| format!("failed to save manifest {}", manifest.display()))?;
    Ok(ExitCode::SUCCESS)
}

fn list(scene: &Scene) {
    if scene.actions.is_empty() {
        println!("{} manifest has no actions", "INFO".blue().bold());
        return;
    }
    for action in &scene.actions {
        let flag = if action.export {
            "[x]".green()
        } else {
            "[ ]".normal()
        };
        println!(
            "  {} {} ({:.0}..{:.0})",
            flag, action.name, action.frame_start, action.frame_end
        );
    }
}

fn set_flags(scene: &mut Scene, name: Option<&str>, all: bool, export: bool) -> Result<()> {
    match (name, all) {
        (_, true) => {
            ops::set_all_actions_export(scene, export);
            println!(
                "{} {} all actions",
                "INFO".blue().bold(),
                if export { "flagged" } else { "unflagged" }
            );
        }
        (Some(name), false) => {
            ops::set_action_export(scene, name, export)?;
            println!(
                "{} {} '{}'",
                "INFO".blue().bold(),
                if export { "flagged" } else { "unflagged" },
                name
            );
        }
        (None, false) => bail!("provide an action name or --all"),
    }
    Ok(())
}

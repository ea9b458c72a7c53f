//! fbxbatch CLI - batch character FBX export
//!
//! This binary drives the export pipeline from a scene manifest: it
//! batch-exports a character mesh and its flagged animation actions to
//! separate FBX files, and provides manifest probing, validation, and
//! collection-management commands.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

mod commands;
mod console;

/// fbxbatch - batch character FBX export pipeline
#[derive(Parser)]
#[command(name = "fbxbatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Batch export the character mesh and flagged animations to FBX
    Export(ExportArgs),

    /// Dump a scene manifest from a .blend file
    Probe {
        /// Path to the .blend file
        #[arg(long)]
        blend: PathBuf,

        /// Path the manifest is written to
        #[arg(short, long)]
        manifest: PathBuf,

        /// Blender executable override
        #[arg(long)]
        blender: Option<PathBuf>,
    },

    /// Validate a scene manifest without exporting
    Validate {
        /// Path to the scene manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Manage the animation action list
    Actions {
        /// Path to the scene manifest
        #[arg(short, long)]
        manifest: PathBuf,

        #[command(subcommand)]
        command: ActionsCommand,
    },

    /// Manage the character mesh list
    Meshes {
        /// Path to the scene manifest
        #[arg(short, long)]
        manifest: PathBuf,

        #[command(subcommand)]
        command: MeshesCommand,
    },

    /// Set the manifest's unit scale to the engine preset (0.01)
    Scale {
        /// Path to the scene manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

/// Arguments for the export command.
#[derive(Args)]
struct ExportArgs {
    /// Path to the scene manifest
    #[arg(short, long)]
    manifest: PathBuf,

    /// Directory the FBX files are written into
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Source .blend file override
    #[arg(long)]
    blend: Option<PathBuf>,

    /// Blender executable override
    #[arg(long)]
    blender: Option<PathBuf>,

    /// Overwrite existing output files
    #[arg(long)]
    overwrite: bool,

    /// Expand the character export with LOD meshes discovered by name
    #[arg(long)]
    lods: bool,

    /// Skip the character mesh export
    #[arg(long)]
    no_character: bool,

    /// Skip the animation export
    #[arg(long)]
    no_animations: bool,

    /// Keep the armature transform instead of zeroing it for the
    /// character export
    #[arg(long)]
    keep_transform: bool,

    /// Character name override
    #[arg(long)]
    character_name: Option<String>,

    /// Extract root motion from this bone
    #[arg(long)]
    root_motion_bone: Option<String>,

    /// Root motion displacement scale factor
    #[arg(long, default_value_t = 1.0)]
    root_motion_scale: f32,

    /// Target up axis for root motion (y or z)
    #[arg(long, default_value = "z")]
    up_axis: String,

    /// Also bake the root bone's Z rotation onto the object
    #[arg(long)]
    bake_rotation: bool,

    /// Timeout per Blender invocation, in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Run the batch without invoking Blender or writing files
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ActionsCommand {
    /// List actions with their export flags and frame ranges
    List,
    /// Flag an action (or all actions) for export
    Select {
        /// Action name
        name: Option<String>,
        /// Flag every action
        #[arg(long)]
        all: bool,
    },
    /// Unflag an action (or all actions)
    Deselect {
        /// Action name
        name: Option<String>,
        /// Unflag every action
        #[arg(long)]
        all: bool,
    },
    /// Delete every flagged action
    Delete,
    /// Push every flagged action onto the armature's NLA stack
    PushNla,
}

#[derive(Subcommand)]
enum MeshesCommand {
    /// List the character mesh slots
    List,
    /// Add a mesh to the character export list
    Add {
        /// Mesh object name
        name: String,
    },
    /// Remove a mesh from the character export list
    Remove {
        /// Mesh object name
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export(args) => commands::export::run(&args),
        Commands::Probe {
            blend,
            manifest,
            blender,
        } => commands::probe::run(&blend, &manifest, blender.as_deref()),
        Commands::Validate { manifest } => commands::validate::run(&manifest),
        Commands::Actions { manifest, command } => commands::actions::run(&manifest, &command),
        Commands::Meshes { manifest, command } => commands::meshes::run(&manifest, &command),
        Commands::Scale { manifest } => commands::scale::run(&manifest),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "ERROR".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

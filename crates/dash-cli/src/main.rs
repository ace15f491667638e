//! `dash`: command-line companion to the dashboard builder.
//!
//! Inspects, validates, converts and packages project documents without the
//! GUI, going through the same editor engine the GUI uses.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dash_core::{EditorSettings, NodeId, SceneGraph, content};
use dash_editor::Editor;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    /// Settings file to use instead of the platform default
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the widget hierarchy of a project
    Tree {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
    /// Load a project and report anything the loader had to repair
    Validate {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Rewrite the file in normalized form
        #[arg(long)]
        fix: bool,
    },
    /// Print the current display text of every text, clock and date widget
    Preview {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
    /// Bundle a project into a widget package (zip)
    Export {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(value_name = "PACKAGE")]
        package: PathBuf,
    },
    /// Unpack a widget package into a project file
    Import {
        #[arg(value_name = "PACKAGE")]
        package: PathBuf,
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
    /// Write an empty project
    New {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
    /// Show the effective editor settings
    Settings,
}

fn init_logging(verbosity: u8) {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn load_settings(path: Option<&Path>) -> EditorSettings {
    match path {
        Some(path) => EditorSettings::load_from(path),
        None => EditorSettings::load(),
    }
}

fn open(settings: EditorSettings, project: &Path) -> Result<Editor> {
    let mut editor = Editor::new(settings);
    editor
        .open(project)
        .with_context(|| format!("cannot open {}", project.display()))?;
    Ok(editor)
}

fn print_tree(scene: &SceneGraph, id: NodeId, depth: usize) {
    let Some(node) = scene.get(id) else {
        return;
    };
    let r = node.rect;
    let mut flags = String::new();
    if node.is_locked {
        flags.push_str(" locked");
    }
    if !node.is_visible {
        flags.push_str(" hidden");
    }
    println!(
        "{:indent$}{} [{}] \"{}\" {},{} {}x{} z={}{}",
        "",
        node.id,
        node.kind,
        node.name,
        r.x,
        r.y,
        r.width,
        r.height,
        node.z_index,
        flags,
        indent = depth * 2
    );
    for child in scene.children(id) {
        print_tree(scene, child, depth + 1);
    }
}

/// Count widget records in the raw file, before any recovery.
fn raw_widget_count(project: &Path) -> Result<usize> {
    let bytes =
        std::fs::read(project).with_context(|| format!("cannot read {}", project.display()))?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not JSON", project.display()))?;
    Ok(value
        .get("widgets")
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len))
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(args.settings.as_deref());
    debug!("settings: {settings:?}");

    match args.command {
        Cmd::Tree { project } => {
            let editor = open(settings, &project)?;
            let scene = editor.scene();
            print_tree(scene, scene.root_id(), 0);
        }
        Cmd::Validate { project, fix } => {
            let raw = raw_widget_count(&project)?;
            let mut editor = open(settings, &project)?;
            let loaded = editor.scene().widget_count();
            if loaded == raw {
                println!("{}: ok ({loaded} widgets)", project.display());
            } else {
                warn!("{} widget records could not be loaded", raw - loaded.min(raw));
                println!(
                    "{}: repaired ({loaded} of {raw} widgets kept)",
                    project.display()
                );
            }
            if fix {
                editor
                    .save(&project)
                    .with_context(|| format!("cannot write {}", project.display()))?;
                info!("rewrote {}", project.display());
            }
        }
        Cmd::Preview { project } => {
            let editor = open(settings, &project)?;
            let scene = editor.scene();
            let now = content::local_now();
            for id in scene.traverse(scene.root_id()) {
                let Some(node) = scene.get(id) else { continue };
                if let Some(text) = content::display_text(node, &now) {
                    println!("{id}: {text}");
                }
            }
        }
        Cmd::Export { project, package } => {
            let mut editor = open(settings, &project)?;
            editor
                .export_package(&package)
                .with_context(|| format!("cannot write {}", package.display()))?;
            println!("exported {}", package.display());
        }
        Cmd::Import { package, project } => {
            let mut editor = Editor::new(settings);
            editor
                .import_package(&package)
                .with_context(|| format!("cannot import {}", package.display()))?;
            editor
                .save(&project)
                .with_context(|| format!("cannot write {}", project.display()))?;
            println!(
                "imported {} widgets into {}",
                editor.scene().widget_count(),
                project.display()
            );
        }
        Cmd::New { project } => {
            if project.exists() {
                anyhow::bail!("{} already exists", project.display());
            }
            let mut editor = Editor::new(settings);
            editor
                .save(&project)
                .with_context(|| format!("cannot write {}", project.display()))?;
            println!("created {}", project.display());
        }
        Cmd::Settings => {
            let path = args
                .settings
                .unwrap_or_else(EditorSettings::default_path);
            println!("# {}", path.display());
            println!("{settings:#?}");
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbosity);
    debug!("Command-line args: {args:?}");

    if let Err(e) = run(args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

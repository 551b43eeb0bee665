use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tabtile::common::config::{Config, config_file};
use tabtile::common::log;
use tabtile::layout_engine::{
    EngineOptions, LayoutCommand, LayoutEngine, LayoutTemplate, LayoutTree, Point, Rect, drop_side,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check whether the configuration file is valid and exit.
    #[arg(long)]
    validate: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a layout template and print the resulting tree.
    Show {
        /// Template file (.toml, .ron or .json).
        template: PathBuf,
    },
    /// Run a list of layout commands against a template.
    Apply {
        /// Template file (.toml, .ron or .json).
        template: PathBuf,
        /// Commands to run, in order (.ron or .json).
        script: PathBuf,
        /// Write the final layout here, in the format given by its extension.
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },
    /// Print the drop side for a pointer position over a rectangle.
    Side {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(long, default_value_t = 0.0)]
        left: f64,
        #[arg(long, default_value_t = 0.0)]
        top: f64,
    },
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);

    if opt.validate {
        let config = match Config::read(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e:#}");
                process::exit(1);
            }
        };
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config validation passed");
        } else {
            for issue in issues {
                eprintln!("{}", issue);
            }
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(opt.command, &config_path) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn run(command: Option<Commands>, config_path: &Path) -> anyhow::Result<()> {
    let config = Config::read_or_default(config_path)?;
    debug!(?config, "loaded config");
    let Some(command) = command else {
        println!("Nothing to do. See --help.");
        return Ok(());
    };

    match command {
        Commands::Show { template } => {
            let template: LayoutTemplate = read_file(&template)?;
            let tree = LayoutTree::build(&template)?;
            print!("{}", tree.draw_tree());
        }
        Commands::Apply { template, script, save } => {
            let template: LayoutTemplate = read_file(&template)?;
            let commands: Vec<LayoutCommand> = read_file(&script)?;
            let mut engine =
                LayoutEngine::new(&template, EngineOptions::from_settings(&config.settings))?;
            for (index, command) in commands.into_iter().enumerate() {
                let change = engine
                    .handle_command(command)
                    .with_context(|| format!("command {} in {}", index + 1, script.display()))?;
                match change {
                    Some(change) => info!(index, ?change, "applied"),
                    None => info!(index, "no change"),
                }
            }
            print!("{}", engine.tree().draw_tree());
            if let Some(out) = save {
                write_file(&out, &engine.snapshot())?;
                println!("Saved layout to {}", out.display());
            }
        }
        Commands::Side { x, y, width, height, left, top } => {
            let bounds = Rect::new(left, top, width, height);
            match drop_side(Point { x, y }, bounds, config.settings.drop_zones.edge_band) {
                Some(side) => println!("{side}"),
                None => println!("outside"),
            }
        }
    }
    Ok(())
}

fn read_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let buf = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let parsed = match path.extension().and_then(OsStr::to_str) {
        Some("toml") => toml::from_str(&buf).map_err(anyhow::Error::from),
        Some("ron") => ron::from_str(&buf).map_err(anyhow::Error::from),
        _ => serde_json::from_str(&buf).map_err(anyhow::Error::from),
    };
    parsed.with_context(|| format!("parsing {}", path.display()))
}

fn write_file<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let buf = match path.extension().and_then(OsStr::to_str) {
        Some("toml") => toml::to_string_pretty(value)?,
        Some("ron") => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?,
        _ => serde_json::to_string_pretty(value)?,
    };
    std::fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}

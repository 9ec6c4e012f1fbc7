use anyhow::Context;
use clap::{Parser, Subcommand};
use sketchpad_core::storage::FileStore;
use sketchpad_core::{DrawingSurface, EngineConfig, IdentityToken, SketchStore};
use sketchpad_render::{export_surface_png, load_sketch, save_sketch};
use std::fs;
use std::path::{Path, PathBuf};

mod script;

use script::{Replayer, Script};

#[derive(Parser, Debug)]
#[command(name = "sketchpad")]
#[command(version, about = "Scriptable sketch canvas with PNG export")]
struct Cli {
    /// Config file (defaults to <config dir>/sketchpad/config.toml)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a gesture script and export the result as PNG
    Replay {
        script: PathBuf,
        /// Output file (defaults to export.file_name from the config)
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Replay a gesture script and save the sketch to the store
    Save {
        script: PathBuf,
        #[arg(long, short = 't')]
        title: String,
        #[arg(long)]
        token: String,
        /// Store directory (defaults to the user data directory)
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// List saved sketches, oldest first
    List {
        #[arg(long)]
        token: String,
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// Load a saved sketch onto a fresh canvas and export it
    Load {
        id: String,
        #[arg(long)]
        token: String,
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        #[arg(long, short = 'o', value_name = "FILE")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Replay { script, out } => {
            let surface = replay(config.clone(), &script)?;
            let out = out.unwrap_or_else(|| PathBuf::from(&config.export.file_name));
            write_png(&surface, &out)?;
            println!("{}", out.display());
        }
        Command::Save {
            script,
            title,
            token,
            store,
        } => {
            let surface = replay(config, &script)?;
            let store = open_store(store)?;
            let saved = pollster::block_on(save_sketch(
                &surface,
                &store,
                &IdentityToken::new(token),
                &title,
            ))?;
            println!("{}\t{}", saved.id, saved.url);
        }
        Command::List { token, store } => {
            let store = open_store(store)?;
            let sketches = pollster::block_on(store.list(&IdentityToken::new(token)))?;
            if sketches.is_empty() {
                log::info!("No saved sketches");
            }
            for sketch in sketches {
                println!(
                    "{}\t{}\t{}\t{}",
                    sketch.id,
                    sketch.created_at.to_rfc3339(),
                    sketch.title,
                    sketch.url
                );
            }
        }
        Command::Load {
            id,
            token,
            store,
            out,
        } => {
            let store = open_store(store)?;
            let mut surface = DrawingSurface::new(config);
            pollster::block_on(load_sketch(
                &mut surface,
                &store,
                &IdentityToken::new(token),
                &id,
            ))?;
            write_png(&surface, &out)?;
            println!("{}", out.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => match EngineConfig::default_path() {
            Ok(path) => Ok(EngineConfig::load(&path)?),
            Err(e) => {
                log::warn!("{e}; using default config");
                Ok(EngineConfig::default())
            }
        },
    }
}

fn replay(config: EngineConfig, path: &Path) -> anyhow::Result<DrawingSurface> {
    let script = Script::load(path)?;
    let mut replayer = Replayer::new(DrawingSurface::new(config))?;
    replayer.run(&script)?;
    Ok(replayer.into_surface())
}

fn open_store(dir: Option<PathBuf>) -> anyhow::Result<FileStore> {
    let store = match dir {
        Some(dir) => FileStore::new(dir)?,
        None => FileStore::default_location()?,
    };
    log::debug!("Using sketch store at {}", store.base_path().display());
    Ok(store)
}

fn write_png(surface: &DrawingSurface, out: &Path) -> anyhow::Result<()> {
    let png = export_surface_png(surface)?;
    fs::write(out, png).with_context(|| format!("Failed to write {}", out.display()))?;
    log::info!("Wrote {}", out.display());
    Ok(())
}

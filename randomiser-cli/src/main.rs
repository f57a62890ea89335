use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use randomiser_settings::{
    read_from, write_to, ProfileRegistry, ResourceChecksums, Settings, VersionGate,
    CURRENT_VERSION,
};

#[derive(Debug, Parser)]
#[command(name = "rnqs", version, about = "Inspect, create and upgrade randomiser quick-settings files")]
struct Args {
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a settings file (any supported version) and print it as JSON.
    Inspect {
        file: PathBuf,

        /// JSON list of profiles to resolve the settings against.
        #[arg(long)]
        profiles: PathBuf,
    },

    /// Write a settings file at the current version from a JSON snapshot.
    Create {
        #[arg(long)]
        json: PathBuf,

        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_name = "FILE")]
        trainer_classes: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        trainer_names: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        nicknames: Option<PathBuf>,
    },

    /// Rewrite outdated settings files at the current version. A directory
    /// is searched for `*.rnqs` files.
    Upgrade {
        path: PathBuf,

        #[arg(long)]
        profiles: PathBuf,
    },
}

type CliResult<T> = Result<T, String>;

fn load_registry(path: &Path) -> CliResult<ProfileRegistry> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    ProfileRegistry::from_json(&json).map_err(|e| format!("Invalid profiles in {:?}: {}", path, e))
}

/// Checksum of a custom names file; 0 when no file is given.
fn file_checksum(path: Option<&PathBuf>) -> CliResult<u32> {
    match path {
        Some(path) => fs::read(path)
            .map(|data| crc32fast::hash(&data))
            .map_err(|e| format!("Failed to read {:?}: {}", path, e)),
        None => Ok(0),
    }
}

fn inspect(file: &Path, profiles: &Path) -> CliResult<()> {
    let registry = load_registry(profiles)?;
    let gate = VersionGate::new(&registry);
    let data = fs::read(file).map_err(|e| format!("Failed to read {:?}: {}", file, e))?;

    let (version, text) = read_from(&mut Cursor::new(data)).map_err(|e| e.to_string())?;
    if version < CURRENT_VERSION {
        info!("{:?} was written by version {}", file, version);
    }
    let settings = gate.load(version, &text).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&settings).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn create(
    json: &Path,
    out: &Path,
    trainer_classes: Option<&PathBuf>,
    trainer_names: Option<&PathBuf>,
    nicknames: Option<&PathBuf>,
) -> CliResult<()> {
    let data = fs::read_to_string(json).map_err(|e| format!("Failed to read {:?}: {}", json, e))?;
    let mut settings: Settings =
        serde_json::from_str(&data).map_err(|e| format!("Invalid settings in {:?}: {}", json, e))?;

    if trainer_classes.is_some() || trainer_names.is_some() || nicknames.is_some() {
        settings.resource_checksums = ResourceChecksums {
            trainer_classes: file_checksum(trainer_classes)?,
            trainer_names: file_checksum(trainer_names)?,
            nicknames: file_checksum(nicknames)?,
        };
    }

    let mut buf = Vec::new();
    write_to(&mut buf, &settings).map_err(|e| e.to_string())?;
    fs::write(out, buf).map_err(|e| format!("Failed to write {:?}: {}", out, e))?;
    info!("wrote {:?} at version {}", out, CURRENT_VERSION);
    Ok(())
}

/// Returns whether the file was rewritten.
fn upgrade_file(gate: &VersionGate<'_>, file: &Path) -> CliResult<bool> {
    let data = fs::read(file).map_err(|e| format!("Failed to read {:?}: {}", file, e))?;
    let (version, text) = read_from(&mut Cursor::new(data)).map_err(|e| e.to_string())?;
    if version == CURRENT_VERSION {
        return Ok(false);
    }

    let settings = gate.load(version, &text).map_err(|e| e.to_string())?;
    let mut buf = Vec::new();
    gate.write_settings(&mut buf, &settings)
        .map_err(|e| e.to_string())?;
    fs::write(file, buf).map_err(|e| format!("Failed to write {:?}: {}", file, e))?;
    info!("upgraded {:?} from version {}", file, version);
    Ok(true)
}

fn upgrade(path: &Path, profiles: &Path) -> CliResult<()> {
    let registry = load_registry(profiles)?;
    let gate = VersionGate::new(&registry);

    if path.is_file() {
        upgrade_file(&gate, path)?;
        return Ok(());
    }

    let mut upgraded = 0usize;
    let mut failed = 0usize;
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        let file = entry.path();
        if !entry.file_type().is_file()
            || !file
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("rnqs"))
        {
            continue;
        }
        match upgrade_file(&gate, file) {
            Ok(true) => upgraded += 1,
            Ok(false) => {}
            Err(e) => {
                warn!("skipping {:?}: {}", file, e);
                failed += 1;
            }
        }
    }

    println!("Upgraded {} file(s), {} failed", upgraded, failed);
    if failed > 0 {
        return Err(format!("{} file(s) could not be upgraded", failed));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match &args.command {
        Command::Inspect { file, profiles } => inspect(file, profiles),
        Command::Create {
            json,
            out,
            trainer_classes,
            trainer_names,
            nicknames,
        } => create(
            json,
            out,
            trainer_classes.as_ref(),
            trainer_names.as_ref(),
            nicknames.as_ref(),
        ),
        Command::Upgrade { path, profiles } => upgrade(path, profiles),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

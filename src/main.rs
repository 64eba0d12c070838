//! songbook - EPUB songbook builder

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::Deserialize;

use songbook::{Build, Settings, write_epub};

#[derive(Parser)]
#[command(name = "songbook")]
#[command(version, about = "Build an EPUB songbook from XML", long_about = None)]
#[command(after_help = "EXAMPLES:
    songbook songbook.xml                     Write XHTML pages and manifests
    songbook songbook.xml --epub book.epub    Also package them as EPUB
    songbook songbook.xml --list              Print the reconciled songs as JSON")]
struct Cli {
    /// Master songbook document
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (overrides the output_dir setting)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Keep at most this many songs, 0 for all
    #[arg(short = 'n', long, value_name = "N")]
    max_songs: Option<usize>,

    /// Settings overrides as a JSON object, e.g. '{"title": "Campfire"}'
    #[arg(long, value_name = "JSON")]
    settings: Option<String>,

    /// Zip the output directory into this EPUB file
    #[arg(long, value_name = "FILE")]
    epub: Option<PathBuf>,

    /// Print the reconciled song list as JSON instead of writing files
    #[arg(short, long)]
    list: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

/// Settings keys mapped to their values; strings, numbers and booleans are
/// accepted.
#[derive(Deserialize)]
#[serde(transparent)]
struct SettingsOverrides(BTreeMap<String, serde_json::Value>);

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => eprintln!("{}", record.args()),
            level => eprintln!("{}: {}", level.as_str().to_lowercase(), record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        cli.log_level
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut build = Build::open(&cli.input).map_err(|e| e.to_string())?;

    if let Some(json) = &cli.settings {
        apply_overrides(&mut build.settings, json)?;
    }
    if let Some(dir) = &cli.output_dir {
        let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
        build.settings.output_dir = cwd.join(dir);
    }
    if let Some(max) = cli.max_songs {
        build.settings.max_songs = max;
    }

    if cli.list {
        build.reconcile().map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(&build.songs()).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    let report = build.write().map_err(|e| e.to_string())?;
    if let Some(epub) = &cli.epub {
        write_epub(&report.output_dir, epub).map_err(|e| e.to_string())?;
        if !cli.quiet {
            println!("Wrote {}", epub.display());
        }
    }
    Ok(())
}

/// Apply a `--settings` JSON object key by key, then check the result as a
/// whole.
fn apply_overrides(settings: &mut Settings, json: &str) -> Result<(), String> {
    let overrides: SettingsOverrides =
        serde_json::from_str(json).map_err(|e| format!("invalid --settings: {e}"))?;
    for (key, value) in overrides.0 {
        let value = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        settings.apply(&key, &value).map_err(|e| e.to_string())?;
    }
    settings.validate().map_err(|e| e.to_string())
}

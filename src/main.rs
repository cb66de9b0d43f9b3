//! radroach CLI - convert a mysqldump file into a CockroachDB dump.

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use radroach::{ConversionOptions, convert};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "radroach")]
#[command(about = "Convert a mysqldump file into a CockroachDB dump")]
#[command(override_usage = "radroach [FLAGS...] SOURCE_MYSQL_DUMP DESTINATION_CRDB_DUMP")]
#[command(version)]
struct Cli {
    /// Verbose logging mode
    #[arg(short, long)]
    verbose: bool,

    /// Convert enums to check constraints
    #[arg(long, env = "RADROACH_ENUM_TO_CHECK")]
    enum_to_check: bool,

    /// Map enum columns to CREATE TYPE ... AS ENUM types
    #[arg(long)]
    native_enums: bool,

    /// Fail on statements that have no translation instead of passing them through
    #[arg(long)]
    strict: bool,

    /// Leave dropped table options behind as a comment
    #[arg(long)]
    annotate_dropped: bool,

    /// TOML file with conversion options; flags are added on top
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// mysqldump file to convert
    source: PathBuf,

    /// Where to write the CockroachDB dump
    destination: PathBuf,
}

/// Step that failed, each with its own message for the user.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Read,
    Config,
    Convert,
    Write,
}

impl Stage {
    fn message(self) -> &'static str {
        match self {
            Stage::Read => {
                "Hmm, couldn't open the source mysql file for reading. Make sure the path and permissions are correct."
            }
            Stage::Config => {
                "Hmm, couldn't load the config file. Make sure it exists and is valid TOML."
            }
            Stage::Convert => {
                "Damn, couldn't convert the mysql dump to crdb. Make sure the source file was prepared correctly."
            }
            Stage::Write => {
                "Oh dear, couldn't write the crdb data. Make sure you have the correct permissions."
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            e.print().ok();
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        setup_logging();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err((stage, err)) => {
            // Only reaches the terminal with -v
            error!("{:#}", err);
            println!("{}", stage.message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> std::result::Result<(), (Stage, anyhow::Error)> {
    let options = load_options(cli).map_err(|e| (Stage::Config, e))?;

    let metadata = fs::metadata(&cli.source)
        .with_context(|| format!("could not stat source file {}", cli.source.display()))
        .map_err(|e| (Stage::Read, e))?;
    let input = fs::read(&cli.source)
        .with_context(|| format!("could not read file {}", cli.source.display()))
        .map_err(|e| (Stage::Read, e))?;
    debug!(source = %cli.source.display(), bytes = input.len(), ?options, "read source dump");

    let output = convert(&input, &options)
        .context("could not convert mysql data")
        .map_err(|e| (Stage::Convert, e))?;

    write_output(cli, &output, metadata.permissions()).map_err(|e| (Stage::Write, e))?;
    debug!(destination = %cli.destination.display(), bytes = output.len(), "wrote crdb dump");
    Ok(())
}

fn load_options(cli: &Cli) -> Result<ConversionOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("could not parse config file {}", path.display()))?
        }
        None => ConversionOptions::default(),
    };
    options.enum_to_check |= cli.enum_to_check;
    options.native_enums |= cli.native_enums;
    options.strict |= cli.strict;
    options.annotate_dropped |= cli.annotate_dropped;
    Ok(options)
}

/// Write the dump with the same permission bits as the source file.
fn write_output(cli: &Cli, output: &[u8], permissions: fs::Permissions) -> Result<()> {
    let destination = &cli.destination;
    fs::write(destination, output).with_context(|| {
        format!("could not save the crdb data to file {}", destination.display())
    })?;
    fs::set_permissions(destination, permissions)
        .with_context(|| format!("could not set permissions on {}", destination.display()))?;
    Ok(())
}

/// Setup logging to stderr.
fn setup_logging() {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

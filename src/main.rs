//! cellgen - fill translation and prompt columns of a CSV table

mod fields;

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cellgen_core::{ComputeBackend, Config, StubBackend, Table, storage};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fields::FieldsFile;

fn print_usage() {
    eprintln!("Usage: cellgen [OPTIONS] <INPUT.csv>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <INPUT.csv>               Table to fill; the header names the fields");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -F, --fields <FILE>       TOML file declaring computed fields");
    eprintln!("  -c, --config <FILE>       Configuration file (default: user config dir)");
    eprintln!("  -o, --output <FILE>       Write CSV here (default: stdout)");
    eprintln!("  --stub                    Use the offline stub backend");
    eprintln!("  -v, --verbose             Debug logging");
    eprintln!("  -h, --help                Print help");
}

struct Args {
    input: PathBuf,
    fields_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    stub: bool,
    verbose: bool,
}

fn parse_args(args: &[String]) -> Args {
    let mut input: Option<PathBuf> = None;
    let mut fields_file: Option<PathBuf> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut output_file: Option<PathBuf> = None;
    let mut stub = false;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-F" | "--fields" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --fields requires a file path");
                    std::process::exit(1);
                }
                fields_file = Some(PathBuf::from(&args[i]));
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                output_file = Some(PathBuf::from(&args[i]));
            }
            "--stub" => stub = true,
            "-v" | "--verbose" => verbose = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if input.is_none() {
                    input = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        eprintln!("Error: missing input file");
        print_usage();
        std::process::exit(1);
    };

    Args {
        input,
        fields_file,
        config_file,
        output_file,
        stub,
        verbose,
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},cellgen={level},cellgen_core={level},cellgen_engine={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Config::load_default().context("Failed to load user config"),
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config_file.as_deref())?;
    let backend: Box<dyn ComputeBackend> = if args.stub {
        Box::new(StubBackend)
    } else {
        config.build_backend_lenient()?
    };
    debug!(backend = ?config.compute.backend, stub = args.stub, "compute backend ready");

    let mut table = Table::new(backend).with_batch_size(config.compute.batch_size);
    let rows = storage::load_csv(&mut table, &args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if let Some(path) = &args.fields_file {
        let fields = FieldsFile::load(path)?;
        let ids = fields.apply(&mut table)?;
        info!(fields = ids.len(), rows, "computed fields");
    }

    match &args.output_file {
        Some(path) => {
            storage::write_csv(path, &table)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} rows to {}", rows, path.display());
        }
        None => {
            let csv = storage::to_csv_string(&table)?;
            std::io::stdout().write_all(csv.as_bytes())?;
        }
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let args = parse_args(&args);
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glang::{Engine, Error, Result, RuntimeConfig, RuntimeError};
use glang_core::namespace_for_path;
use log::debug;

/// Compile and run a glang script.
#[derive(Debug, Parser)]
#[command(name = "glang", version, about)]
struct Cli {
    /// Only compile the script and report diagnostics.
    #[arg(long)]
    compile: bool,

    /// Print the position and value of every top-level expression statement
    /// to stderr.
    #[arg(long)]
    debug_prints: bool,

    /// Extra directory to search for imported units. Repeatable.
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// The script to run. Its directory is searched for imports first.
    script: PathBuf,

    /// Arguments passed to the script's `args`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.compile_errors() {
                Some(errors) => eprintln!("{errors}"),
                None => eprintln!("error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let file_name = cli
        .script
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidPath(cli.script.display().to_string()))?
        .to_string();
    let script_dir = cli
        .script
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = RuntimeConfig::from_env()?;
    if cli.debug_prints {
        config = config.with_debug_prints(true);
    }
    let mut builder = Engine::builder().config(config).include_dir(script_dir);
    for dir in cli.include {
        builder = builder.include_dir(dir);
    }
    let engine = builder.build();

    if cli.compile {
        let namespace =
            namespace_for_path(&file_name).ok_or_else(|| Error::InvalidPath(file_name.clone()))?;
        let source = fs::read_to_string(&cli.script).map_err(|e| {
            RuntimeError::Io(format!("{}: {e}", cli.script.display()))
        })?;
        let unit = engine.compile(&namespace, &source)?;
        debug!("compiled {} ({} constants)", unit.type_name, unit.constants.len());
        return Ok(());
    }

    debug!("running {file_name}");
    engine.run_path(&file_name, cli.args)?;
    Ok(())
}

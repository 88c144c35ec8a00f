mod emit;
mod error;
mod model;
mod source;

use clap::Parser;
use emit::EmitOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

/// Converts an MXF dictionary XML file into a Rust source file of UL
/// constants and dictionary-registration functions.
#[derive(Parser)]
#[command(name = "dictconvert", version, about)]
struct Cli {
    /// Only emit the UL const table, skipping registration functions.
    #[arg(short = 'c')]
    only_consts: bool,

    /// Name used for the generated registration functions (default "DictData").
    #[arg(short = 'n', value_name = "NAME")]
    name: Option<String>,

    /// Always qualify UL const names with the namespace, even when short
    /// names would not collide.
    #[arg(short = 'l')]
    long_form: bool,

    /// Namespace module name for the UL const table (default "mxflib").
    #[arg(short = 's', value_name = "NAMESPACE")]
    namespace: Option<String>,

    /// Verbose mode.
    #[arg(short = 'v')]
    verbose: bool,

    /// Don't emit UL consts at all.
    #[arg(short = 'x')]
    no_consts: bool,

    /// Pause for input before exiting (ignored in this port; kept for
    /// command-line compatibility).
    #[arg(short = 'z')]
    pause_before_exit: bool,

    input: PathBuf,
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    match run(&cli) {
        Ok(()) => {
            if cli.pause_before_exit {
                info!("done; -z requested a pause, but this port does not block on stdin");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("dictconvert: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    info!(input = %cli.input.display(), "reading dictionary");
    let xml = std::fs::read_to_string(&cli.input).map_err(|source| error::DictConvertError::ReadInput {
        path: cli.input.display().to_string(),
        source,
    })?;

    let entries = source::scan(&xml)?;
    debug!(count = entries.len(), "scanned dictionary entries");
    let dict = model::build(&entries)?;
    debug!(
        basics = dict.basics.len(),
        classes = dict.classes.len(),
        uls = dict.uls.len(),
        "built dictionary model"
    );

    let opts = EmitOptions {
        only_consts: cli.only_consts,
        skip_consts: cli.no_consts,
        long_form_consts: cli.long_form,
        use_name: cli.name.clone().unwrap_or_else(|| "DictData".to_string()),
        ul_namespace: cli.namespace.clone().unwrap_or_else(|| "mxflib".to_string()),
    };
    let rendered = emit::emit(&dict, &opts);

    std::fs::write(&cli.output, rendered).map_err(|source| error::DictConvertError::WriteOutput {
        path: cli.output.display().to_string(),
        source,
    })?;
    info!(output = %cli.output.display(), "wrote generated source");

    Ok(())
}

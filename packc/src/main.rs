//! packc - packet schema compiler
//!
//! Command-line interface over the `packc` library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use packc::{GeneratorConfig, Target, compile_file, compile_to_dir, tree::render_tree};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Packet schema compiler
#[derive(Parser, Debug)]
#[command(name = "packc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a schema into source files
    Compile {
        /// Root schema file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory receiving the generated units
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Target language (c, rust)
        #[arg(short, long, default_value = "c")]
        target: Target,

        /// Base name of the generated files
        #[arg(short, long, value_name = "NAME", default_value = "packets")]
        unit: String,

        /// Header guard macro (C target)
        #[arg(long, value_name = "MACRO")]
        header_guard: Option<String>,

        /// Omit the generated-file banner
        #[arg(long)]
        no_banner: bool,
    },
    /// Parse and validate a schema without generating code
    Check {
        /// Root schema file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Print the declaration tree of a schema
    Ast {
        /// Root schema file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            input,
            output_dir,
            target,
            unit,
            header_guard,
            no_banner,
        } => {
            let mut config = GeneratorConfig::new()
                .target(target)
                .unit_name(unit)
                .banner(!no_banner);
            if let Some(guard) = header_guard {
                config = config.header_guard(guard);
            }
            let written = compile_to_dir(&input, &output_dir, &config)
                .with_context(|| format!("failed to compile '{}'", input.display()))?;
            println!(
                "Generated {} files in {}",
                written.len(),
                output_dir.display()
            );
        }
        Command::Check { input } => {
            let compilation = compile_file(&input)
                .with_context(|| format!("failed to check '{}'", input.display()))?;
            println!(
                "{}: OK ({} files)",
                input.display(),
                compilation.files.len()
            );
        }
        Command::Ast { input } => {
            let compilation = compile_file(&input)
                .with_context(|| format!("failed to parse '{}'", input.display()))?;
            print!("{}", render_tree(&compilation.program));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use mystq::convert::{convert_directory, ConvertOptions, Direction};
use mystq::warnings::WarningCollector;

#[derive(Parser)]
#[command(name = "mystq", author, version)]
#[command(about = "Bidirectional MyST <-> Quarto markdown converter")]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert MyST markdown files to Quarto format
    ToQuarto(ConvertArgs),
    /// Convert Quarto markdown files to MyST format
    ToMyst(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file or directory
    path: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Modify files in-place
    #[arg(long)]
    in_place: bool,

    /// Only convert config files
    #[arg(long)]
    config_only: bool,

    /// Skip config file conversion
    #[arg(long)]
    no_config: bool,

    /// Show what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,
}

fn run_conversion(args: &ConvertArgs, direction: Direction, quiet: bool) -> ExitCode {
    if !args.path.exists() {
        eprintln!(
            "{}: path does not exist: {}",
            "error".red().bold(),
            args.path.display()
        );
        return ExitCode::FAILURE;
    }

    let options = ConvertOptions {
        in_place: args.in_place,
        config_only: args.config_only,
        no_config: args.no_config,
        dry_run: args.dry_run,
    };

    let results = match convert_directory(&args.path, args.output.as_deref(), direction, options) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut collector = WarningCollector::new(args.strict);
    for result in &results {
        for warning in &result.warnings {
            collector.warn(warning, "", 0);
        }
        for error in &result.errors {
            collector.error(error, "", 0);
        }
    }

    let converted_count = results
        .iter()
        .filter(|r| !r.skipped && r.errors.is_empty())
        .count();

    if !quiet {
        if args.dry_run {
            for result in &results {
                if result.skipped {
                    continue;
                }
                if let Some(output_path) = &result.output_path {
                    println!(
                        "  {} -> {}",
                        result.input_path.display(),
                        output_path.display()
                    );
                }
            }
        }

        let label = if args.dry_run { "Would convert" } else { "Converted" };
        let summary = format!("{label} {converted_count} file(s).");
        if collector.has_errors() {
            println!("{summary}");
        } else {
            println!("{}", summary.green());
        }
    }

    if !collector.warnings.is_empty() || !collector.errors.is_empty() {
        println!("{}", collector.report());
    }

    if collector.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match &cli.command {
        Commands::ToQuarto(args) => run_conversion(args, Direction::MystToQuarto, cli.quiet),
        Commands::ToMyst(args) => run_conversion(args, Direction::QuartoToMyst, cli.quiet),
    }
}

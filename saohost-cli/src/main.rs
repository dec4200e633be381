//! saohost CLI - KiCad checks and release exports from the command line.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use saohost::{CleanOptions, ProcessRunner, Project, SaoHostError, Task, TaskEngine, TASKS};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "saohost")]
#[command(
    about = "KiCad checks and release exports for the Raspberry Pi Pico SAO Host",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Project directory holding the KiCad files
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".", global = true)]
    project_dir: PathBuf,

    /// Config file (default: saohost.toml in the project directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// List available tasks
    #[arg(short, long)]
    list: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run KiCad checks (ERC and DRC)
    Check,

    /// Generate release files (runs env and check first)
    Release,

    /// Remove generated files
    Clean {
        /// Also remove the KiCad backups directory
        #[arg(long)]
        kicad_backups: bool,

        /// Also remove the footprint info cache
        #[arg(long)]
        kicad_cache_files: bool,

        /// Remove everything above
        #[arg(long)]
        all: bool,
    },

    /// Print project environment info
    Env,

    /// List available tasks
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: ListFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum ListFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let task = match cli.command {
        _ if cli.list => {
            process::exit(handle_list(&ListFormat::Human));
        }
        None => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
            println!();
            process::exit(handle_list(&ListFormat::Human));
        }
        Some(Commands::List { format }) => process::exit(handle_list(&format)),
        Some(Commands::Check) => Task::Check,
        Some(Commands::Release) => Task::Release,
        Some(Commands::Env) => Task::Env,
        Some(Commands::Clean {
            kicad_backups,
            kicad_cache_files,
            all,
        }) => Task::Clean(CleanOptions {
            kicad_backups,
            kicad_cache_files,
            all,
        }),
    };

    let exit_code = match handle_task(&cli.project_dir, cli.config, task) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .with_target(false)
        .init();
}

fn handle_task(
    project_dir: &Path,
    config: Option<PathBuf>,
    task: Task,
) -> Result<(), SaoHostError> {
    tracing::debug!("Running {} in {}", task.name(), project_dir.display());
    let project = Project::open(project_dir, config.as_deref())?;
    let mut engine = TaskEngine::new(project, ProcessRunner::default());
    engine.run_all(&[task])
}

fn handle_list(format: &ListFormat) -> i32 {
    match format {
        ListFormat::Human => {
            println!("Available tasks:\n");
            for (name, description) in TASKS {
                println!("  {:<10} {}", name, description);
            }
            println!();
            0
        }
        ListFormat::Json => {
            let output = serde_json::json!({
                "tasks": TASKS.iter().map(|(name, description)| {
                    serde_json::json!({
                        "name": name,
                        "description": description,
                    })
                }).collect::<Vec<_>>(),
            });
            match serde_json::to_string_pretty(&output) {
                Ok(text) => {
                    println!("{}", text);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}

#![forbid(unsafe_code)]

mod cmd;
mod output;
mod transport;
mod tui;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "mapform: map-based collections with optimistic ordered sync",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, env, and user config.
    fn output_mode(&self) -> OutputMode {
        let user_output = mapform_core::config::load_user_config()
            .ok()
            .and_then(|cfg| cfg.output);
        output::resolve_output_mode(self.format, self.json, user_output.as_deref())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a mapform workspace",
        long_about = "Initialize a mapform workspace in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a workspace in the current directory\n    mf init\n\n    # Name the workspace explicitly\n    mf init --name \"Acme Maps\"\n\n    # Emit machine-readable output\n    mf init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Build",
        about = "Manage projects",
        after_help = "EXAMPLES:\n    # Create a project (seeds its first page)\n    mf project create --name \"Field Survey\"\n\n    # List projects\n    mf project list --json"
    )]
    Project {
        #[command(subcommand)]
        command: cmd::project::ProjectCommand,
    },

    #[command(
        next_help_heading = "Build",
        about = "Manage a project's ordered pages",
        after_help = "EXAMPLES:\n    # Append a page\n    mf page add --project 1 --title \"First stop\"\n\n    # Move a page to the top\n    mf page move 3 --to 0\n\n    # List pages in collection order\n    mf page list --project 1 --json"
    )]
    Page {
        #[command(subcommand)]
        command: cmd::page::PageCommand,
    },

    #[command(
        next_help_heading = "Build",
        about = "Manage layers and per-page layer stacks",
        after_help = "EXAMPLES:\n    # Create a marker layer over a dataset\n    mf layer add --dataset 1 --name Pins --kind marker\n\n    # Attach it to a page\n    mf layer attach --page 2 --layer 1"
    )]
    Layer {
        #[command(subcommand)]
        command: cmd::layer::LayerCommand,
    },

    #[command(
        next_help_heading = "Build",
        about = "Manage a project's ordered views",
        after_help = "EXAMPLES:\n    # Add a table view bound to a dataset\n    mf view add --project 1 --name Data --kind table --dataset 1"
    )]
    View {
        #[command(subcommand)]
        command: cmd::view::ViewCommand,
    },

    #[command(
        next_help_heading = "Data",
        about = "Manage datasets, columns, and rows",
        after_help = "EXAMPLES:\n    # Create a dataset with a typed column\n    mf dataset create --name Sightings\n    mf dataset add-column --dataset 1 --name location --kind point\n\n    # Append a row\n    mf dataset add-row --dataset 1 --cell \"location=2.35,48.85\""
    )]
    Dataset {
        #[command(subcommand)]
        command: cmd::dataset::DatasetCommand,
    },

    #[command(
        next_help_heading = "Interactive",
        about = "Open the interactive board",
        long_about = "Open a full-screen board for one project: drag pages and layers to reorder, rename inline, watch sync settle.",
        after_help = "EXAMPLES:\n    # Open project 1\n    mf open --project 1"
    )]
    Open(cmd::open::OpenArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    mf completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MAPFORM_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "mapform=debug,info"
        } else {
            "mapform=info,warn"
        })
    });

    let format = env::var("MAPFORM_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose && !cli.quiet {
        info!("Verbose mode enabled");
    }

    let root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &root),
        Commands::Project { ref command } => cmd::project::run(command, output, &root),
        Commands::Page { ref command } => cmd::page::run(command, output, &root),
        Commands::Layer { ref command } => cmd::layer::run(command, output, &root),
        Commands::View { ref command } => cmd::view::run(command, output, &root),
        Commands::Dataset { ref command } => cmd::dataset::run(command, output, &root),
        Commands::Open(ref args) => cmd::open::run_open(args, output, &root),
        Commands::Completions(ref args) => cmd::completions::run_completions(args),
    }
}

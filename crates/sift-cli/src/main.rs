#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use sift_search::Relevance;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sift: multi-signal search over your documents and screenshots",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (defaults to $SIFT_HOME, then the OS data directory).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Corpus file (defaults to <data-dir>/corpus.json).
    #[arg(long, global = true, value_name = "FILE")]
    corpus: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(next_help_heading = "Search")]
    Search(cmd::search::SearchArgs),

    #[command(next_help_heading = "Search")]
    Dup(cmd::dup::DupArgs),

    #[command(next_help_heading = "Search")]
    Recent(cmd::recent::RecentArgs),

    #[command(
        next_help_heading = "Feedback",
        about = "Mark a document as a good result",
        after_help = "EXAMPLES:\n    sift good report.txt"
    )]
    Good(cmd::feedback::FeedbackArgs),

    #[command(
        next_help_heading = "Feedback",
        about = "Mark a document as a bad result",
        after_help = "EXAMPLES:\n    sift bad notes.txt"
    )]
    Bad(cmd::feedback::FeedbackArgs),

    #[command(next_help_heading = "Metadata")]
    Tag(cmd::tag::TagArgs),

    #[command(next_help_heading = "Metadata", about = "List every tag in the corpus")]
    Tags,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "sift=debug,info"
        } else {
            "sift=info,warn"
        })
    });

    let format = env::var("SIFT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let ctx = cmd::Context::load(cli.data_dir.clone(), cli.corpus.clone(), output)?;
    debug!(data_dir = %ctx.paths.root.display(), "resolved data directory");

    match &cli.command {
        Commands::Search(args) => cmd::search::run_search(args, &ctx),
        Commands::Dup(args) => cmd::dup::run_dup(args, &ctx),
        Commands::Recent(args) => cmd::recent::run_recent(args, &ctx),
        Commands::Good(args) => cmd::feedback::run_feedback(args, Relevance::Good, &ctx),
        Commands::Bad(args) => cmd::feedback::run_feedback(args, Relevance::Bad, &ctx),
        Commands::Tag(args) => cmd::tag::run_tag(args, &ctx),
        Commands::Tags => cmd::tag::run_tags(&ctx),
    }
}

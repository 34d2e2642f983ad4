mod analysis;
mod conversation;
mod pages;
mod render;
mod settings;
mod site;
mod transcript;

use anyhow::{Context, Result};
use clap::Parser;
use settings::Settings;
use site::SiteOptions;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Turn a Claude Code session log into a paginated HTML transcript.
#[derive(Parser, Debug)]
#[command(name = "claudescroll")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session log: a `{"loglines": [...]}` document or a JSONL file
    input: PathBuf,

    /// Directory to write index.html and the page files into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GitHub `owner/repo` used to link commit hashes
    #[arg(long)]
    repo: Option<String>,

    /// Settings file (default: ./claudescroll.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "claudescroll=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Keep only identifiers shaped like `owner/repo`.
fn checked_repo(repo: Option<String>) -> Option<String> {
    repo.filter(|repo| {
        let ok = analysis::is_repo_identifier(repo);
        if !ok {
            warn!(repo = %repo, "ignoring repository that is not of the form owner/repo");
        }
        ok
    })
}

fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref())?;
    let output = args
        .output
        .or(settings.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let options = SiteOptions {
        repo: checked_repo(args.repo.or(settings.repo)),
    };

    let entries = transcript::load_path(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let files = site::build_site(&entries, &options).context("rendering transcript")?;

    fs::create_dir_all(&output).with_context(|| format!("creating {}", output.display()))?;
    for (name, html) in &files {
        let path = output.join(name);
        fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = html.len(), "wrote document");
    }

    println!("Wrote {} files to {}", files.len(), output.display());
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("claudescroll: {err:#}");
        process::exit(1);
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitekit_cli::preview::{DEFAULT_OUT_DIR, PreviewServer};
use sitekit_cli::project::{build_site, has_errors, load_project};
use sitekit_cli::walk::resolve_dir;
use sitekit_core::model::{Diagnostic, Project};

#[derive(Debug, Parser)]
#[command(name = "sitekit", about = "Build the bilingual company site.")]
struct Cli {
    #[arg(long = "source-dir", short = 's', global = true)]
    source_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Walk content and report collections and diagnostics.")]
    Scan,
    #[command(about = "Build site from site.yaml.")]
    Build {
        #[arg(long, value_name = "PATH", default_value = DEFAULT_OUT_DIR)]
        out: PathBuf,
        #[arg(long)]
        preview: bool,
        #[arg(long, default_value = "127.0.0.1", requires = "preview")]
        preview_host: String,
        #[arg(long, default_value_t = 8080, requires = "preview")]
        preview_port: u16,
        #[arg(long, requires = "preview")]
        preview_no_open: bool,
    },
    #[command(about = "Serve a built site locally.")]
    Preview {
        #[arg(long, value_name = "PATH", default_value = DEFAULT_OUT_DIR)]
        out: PathBuf,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long)]
        no_open: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("sitekit=info,sitekit_cli=info,sitekit_core=info"),
    )
    .init();
    let cli = Cli::parse();
    match &cli.command {
        Command::Scan => run_scan(&cli),
        Command::Build {
            out,
            preview,
            preview_host,
            preview_port,
            preview_no_open,
        } => run_build(&cli, out, *preview, preview_host, *preview_port, *preview_no_open),
        Command::Preview {
            out,
            host,
            port,
            no_open,
        } => {
            let root = root_dir(&cli)?;
            serve_preview(&resolve_dir(&root, out), host, *port, *no_open)
        }
    }
}

fn run_scan(cli: &Cli) -> Result<()> {
    let root = root_dir(cli)?;
    let project = load_project(&root)?;
    print_diagnostics(&project.content.diagnostics);
    print_summary(&project);
    if has_errors(&project) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_build(
    cli: &Cli,
    out: &PathBuf,
    preview: bool,
    preview_host: &str,
    preview_port: u16,
    preview_no_open: bool,
) -> Result<()> {
    let root = root_dir(cli)?;
    let project = load_project(&root)?;
    print_diagnostics(&project.content.diagnostics);
    if has_errors(&project) {
        std::process::exit(1);
    }

    let out_dir = resolve_dir(&root, out);
    let report = build_site(&project, &out_dir)
        .with_context(|| format!("failed to build into {}", out_dir.display()))?;
    print_summary(&project);
    println!("out: {}", out_dir.display());
    println!("executed: {}", report.executed);
    println!("written: {}", report.written);
    println!("copied: {}", report.copied);

    if preview {
        serve_preview(&out_dir, preview_host, preview_port, preview_no_open)?;
    }
    Ok(())
}

fn serve_preview(out_dir: &Path, host: &str, port: u16, no_open: bool) -> Result<()> {
    let server = PreviewServer::bind(out_dir, host, port)?;
    println!("preview: {}", server.url());
    if !no_open {
        if let Err(err) = webbrowser::open(server.url()) {
            log::warn!("failed to open browser: {err}");
        }
    }
    server.run();
    Ok(())
}

fn print_summary(project: &Project) {
    let collections = &project.content.collections;
    println!("pages: {}", project.content.pages.len());
    println!("news: {}", collections.news.len());
    println!("tags: {}", collections.tags.len());
    println!("jobs: {}", collections.jobs.len());
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let label = diag.label();
        if let Some(path) = &diag.source_path {
            eprintln!("{label}: {path}: {}", diag.message);
        } else {
            eprintln!("{label}: {}", diag.message);
        }
    }
}

fn root_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.source_dir {
        Some(path) => {
            if path.is_absolute() {
                Ok(path.clone())
            } else {
                let cwd = std::env::current_dir().context("failed to read current directory")?;
                Ok(cwd.join(path))
            }
        }
        None => std::env::current_dir().context("failed to read current directory"),
    }
}

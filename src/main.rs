mod config;
mod error;
mod logging;
mod render;
mod route;
mod scan;
mod text;
mod vcs;

use anyhow::{Context, Result};
use clap::Parser;
use route::Route;
use std::io::Write;
use std::path::PathBuf;

/// Cross-linked blame and diff pages for git and Subversion working copies
#[derive(Parser)]
#[command(name = "vcs-ann", version, about)]
struct Cli {
    /// File inside a git or svn working copy
    target: PathBuf,

    /// Render this request path (e.g. /commit/<rev>) instead of the file view
    #[arg(long)]
    page: Option<String>,

    /// Show the reverse blame of TARGET (last revision each line survived in)
    #[arg(long, conflicts_with = "page")]
    reverse: bool,

    /// Print the request path of TARGET's file view and exit
    #[arg(long)]
    print_path: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Write the page to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let checkout = vcs::locate(&cli.target)
        .with_context(|| format!("Cannot open {}", cli.target.display()))?;
    let config = config::load_config(&checkout.root);

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let located = checkout.open(&config)?;
    let route = match cli.page.as_deref() {
        Some(path) => Route::parse(path)?,
        None => located.file_route(cli.reverse),
    };

    if cli.print_path {
        println!("{}", route.to_path());
        return Ok(());
    }

    log::info!("rendering {} at revision {}", route.to_path(), route.revision());
    let body = located
        .repository
        .render(&route)
        .with_context(|| format!("Failed to render {}", route.to_path()))?;
    let page = render::document(&route.to_path(), &body);

    match cli.output {
        Some(path) => std::fs::write(&path, page)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(page.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}

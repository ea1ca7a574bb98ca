use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unifs_core::types::{LogLevel, UnifsConfig};
use unifs_core::{MountIdentity, VirtualPath};
use unifs_memory::MemoryProvider;

#[derive(Parser)]
#[command(name = "unifs")]
#[command(about = "Inspect paths and mounts of unified virtual filesystems")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a path URI parses and normalizes
    Path {
        /// Path URI, e.g. mem://a/foo/../bar
        uri: String,

        /// Further fragments joined onto the path
        more: Vec<String>,
    },

    /// Construct the relative path from one URI to another
    Relativize {
        from: String,
        to: String,
    },

    /// Open every configured mount, list it, then close all
    Mounts,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => UnifsConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => UnifsConfig::default(),
    };
    init_tracing(config.log_level);

    let provider = unifs_memory::provider();
    match cli.command {
        Commands::Path { uri, more } => show_path(&provider, &uri, &more)?,
        Commands::Relativize { from, to } => relativize(&provider, &from, &to)?,
        Commands::Mounts => {
            if cli.config.is_none() {
                bail!("`mounts` needs --config <file>");
            }
            show_mounts(&provider, &config)?;
        }
    }

    provider.close_all();
    debug!("Provider stats: {:?}", provider.stats());
    Ok(())
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("unifs={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn path_of(provider: &MemoryProvider, uri: &str, more: &[String]) -> Result<VirtualPath> {
    let (identity, path) = MountIdentity::parse_uri(uri)?;
    let fs = provider
        .get_or_create_file_system(&identity)
        .with_context(|| format!("Failed to open {}", identity))?;
    let more: Vec<&str> = more.iter().map(String::as_str).collect();
    Ok(fs.get_path(&path, &more)?)
}

fn display_or_none(path: Option<VirtualPath>) -> String {
    path.map_or_else(|| "(none)".to_string(), |p| p.to_string())
}

fn show_path(provider: &MemoryProvider, uri: &str, more: &[String]) -> Result<()> {
    let path = path_of(provider, uri, more)?;

    println!("uri:        {}", path.to_uri());
    println!("path:       {}", path);
    println!("normalized: {}", path.normalize());
    println!("absolute:   {}", path.to_absolute());
    println!("parent:     {}", display_or_none(path.parent()));
    println!("file name:  {}", display_or_none(path.file_name()));
    println!("names:      {}", path.name_count());
    Ok(())
}

fn relativize(provider: &MemoryProvider, from: &str, to: &str) -> Result<()> {
    let from = path_of(provider, from, &[])?;
    let to = path_of(provider, to, &[])?;
    let relative = from
        .relativize(&to)
        .with_context(|| format!("Cannot relativize {} against {}", to.to_uri(), from.to_uri()))?;
    println!("{}", relative);
    Ok(())
}

fn show_mounts(provider: &MemoryProvider, config: &UnifsConfig) -> Result<()> {
    if let Err(problems) = config.validate() {
        bail!("Invalid configuration:\n  {}", problems.join("\n  "));
    }

    for record in &config.mounts {
        let fs = provider
            .new_file_system(&record.identity, &record.options)
            .with_context(|| format!("Failed to open {}", record.identity))?;
        info!("Opened {} (serial {})", fs, fs.serial());
    }

    for fs in provider.open_file_systems() {
        println!(
            "{}\troot={}\tread_only={}",
            fs.identity(),
            fs.root(),
            fs.is_read_only()
        );
    }

    let closed = provider.close_all();
    info!("Closed {} filesystems", closed);
    Ok(())
}

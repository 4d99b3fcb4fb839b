use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use trellis_resolve::{open_build, PagedTrieFactory, ResolverCache, SyncedResolver};
use trellis_server::config::default_data_root;
use trellis_server::{ServerConfig, TrellisServer};
use trellis_store::FsBlobStore;
use trellis_types::{validate_identifier, Location};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Resolve(args) => cmd_resolve(args, &cli.format),
        Command::Relay(args) => cmd_relay(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = args.root {
        config.data_root = root;
    }

    println!(
        "{} trellis server on {} (data: {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.graph_dir().display()
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(TrellisServer::new(config).serve())?;
    Ok(())
}

fn cmd_resolve(args: ResolveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let location = resolve_url(&args.target, &args.url)?;
    match format {
        OutputFormat::Text => println!("{}", location.to_url().cyan()),
        OutputFormat::Json => println!(
            "{}",
            json!({ "url": args.url, "location": location.to_url(), "resolved": location })
        ),
    }
    Ok(())
}

fn cmd_relay(args: RelayArgs) -> anyhow::Result<()> {
    let bytes = relay_bytes(&args.target, &args.url, args.raw)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} wrote {} bytes to {}",
                "✓".green(),
                bytes.len(),
                path.display().to_string().bold()
            );
        }
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}

fn open_target(target: &BuildTarget) -> anyhow::Result<SyncedResolver> {
    let repo = validate_identifier("repo", &target.repo)?;
    let build = validate_identifier("build", &target.build)?;
    let config = ServerConfig {
        data_root: target.root.clone().unwrap_or_else(default_data_root),
        ..ServerConfig::default()
    };
    let store = Arc::new(FsBlobStore::new(config.graph_dir()));
    // One-shot commands open exactly one build.
    let cache = ResolverCache::new(1, Arc::new(PagedTrieFactory));
    open_build(&cache, store, repo, build)
        .with_context(|| format!("opening build {build} of {repo}"))
}

fn resolve_url(target: &BuildTarget, url: &str) -> anyhow::Result<Location> {
    let resolver = open_target(target)?;
    resolver
        .resolve(url)
        .with_context(|| format!("resolving {url}"))
}

fn relay_bytes(target: &BuildTarget, url: &str, raw: bool) -> anyhow::Result<Vec<u8>> {
    let resolver = open_target(target)?;
    let (_, bytes) = resolver
        .get(url, raw)
        .with_context(|| format!("relaying {url}"))?;
    Ok(bytes)
}

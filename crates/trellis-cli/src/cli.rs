use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trellis",
    about = "Trellis: lazy code-graph resolution over blob storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the resolution server
    Serve(ServeArgs),
    /// Resolve a node URL to its location
    Resolve(ResolveArgs),
    /// Print the bytes a node URL points at
    Relay(RelayArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Data root (defaults to $TRELLIS_DIR or ~/.trellis)
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Which published build to open.
#[derive(Args)]
pub struct BuildTarget {
    /// Data root (defaults to $TRELLIS_DIR or ~/.trellis)
    #[arg(long)]
    pub root: Option<PathBuf>,
    #[arg(long)]
    pub repo: String,
    #[arg(long)]
    pub build: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub target: BuildTarget,
    pub url: String,
}

#[derive(Args)]
pub struct RelayArgs {
    #[command(flatten)]
    pub target: BuildTarget,
    pub url: String,
    /// Return stored bytes without decoding
    #[arg(long)]
    pub raw: bool,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["trellis", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.bind.is_none());
            assert!(args.root.is_none());
            assert!(args.config.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from([
            "trellis", "serve", "--bind", "0.0.0.0:8080", "--root", "/srv/trellis",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert_eq!(args.root, Some(PathBuf::from("/srv/trellis")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["trellis", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_resolve() {
        let cli = Cli::try_parse_from([
            "trellis", "resolve", "--repo", "repo1", "--build", "b1", "id:42",
        ])
        .unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(args.target.repo, "repo1");
            assert_eq!(args.target.build, "b1");
            assert_eq!(args.url, "id:42");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_resolve_requires_build() {
        assert!(Cli::try_parse_from(["trellis", "resolve", "--repo", "r", "path:"]).is_err());
    }

    #[test]
    fn parse_relay() {
        let cli = Cli::try_parse_from([
            "trellis", "relay", "--repo", "r", "--build", "b", "--raw", "-o", "node.bin", "path:",
        ])
        .unwrap();
        if let Command::Relay(args) = cli.command {
            assert!(args.raw);
            assert_eq!(args.out, Some(PathBuf::from("node.bin")));
            assert_eq!(args.url, "path:");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["trellis", "serve", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from([
            "trellis", "--format", "json", "resolve", "--repo", "r", "--build", "b", "path:",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}

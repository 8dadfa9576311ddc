//! CLI definitions using clap derive API
//!
//! Submodules hold each command's argument types:
//! - explode: Explode command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod completions;
pub mod explode;

pub use completions::CompletionsArgs;
pub use explode::ExplodeArgs;

/// bigip-explode - BIG-IP configuration explosion
///
/// Split BIG-IP configuration bundles into per-application configurations.
#[derive(Parser, Debug)]
#[command(
    name = "bigip-explode",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Split BIG-IP configuration bundles into applications",
    long_about = "bigip-explode reads a BIG-IP configuration bundle (bigip.conf, UCS backup, \
                  qkview snapshot or a previous object export), parses every object, resolves \
                  the references between them and groups them into applications rooted at \
                  virtual servers and wide IPs.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  bigip-explode explode bigip.conf                 \x1b[90m# Summarize applications\x1b[0m\n   \
                  bigip-explode explode backup.ucs --json          \x1b[90m# Full result as JSON\x1b[0m\n   \
                  bigip-explode explode snap.qkview -o result.json \x1b[90m# Write result to a file\x1b[0m\n   \
                  bigip-explode explode backup.ucs --export-objects objects.json\n\n\
                  "
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explode a configuration bundle into applications
    Explode(ExplodeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parsing_explode() {
        let cli = Cli::try_parse_from(["bigip-explode", "explode", "bigip.conf"]).unwrap();
        match cli.command {
            Commands::Explode(args) => {
                assert_eq!(args.bundle, PathBuf::from("bigip.conf"));
                assert!(!args.json);
                assert!(args.output.is_none());
            }
            _ => panic!("Expected Explode command"),
        }
    }

    #[test]
    fn test_cli_parsing_explode_options() {
        let cli = Cli::try_parse_from([
            "bigip-explode",
            "explode",
            "backup.ucs",
            "--json",
            "-o",
            "out.json",
            "--export-objects",
            "objects.json",
            "-q",
        ])
        .unwrap();
        match cli.command {
            Commands::Explode(args) => {
                assert!(args.json);
                assert!(args.quiet);
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert_eq!(args.export_objects, Some(PathBuf::from("objects.json")));
            }
            _ => panic!("Expected Explode command"),
        }
    }

    #[test]
    fn test_cli_global_verbose() {
        let cli = Cli::try_parse_from(["bigip-explode", "explode", "x.conf", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_explode_requires_bundle() {
        assert!(Cli::try_parse_from(["bigip-explode", "explode"]).is_err());
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["bigip-explode", "completions", "bash"]).unwrap();
        match cli.command {
            Commands::Completions(args) => {
                assert_eq!(args.shell, "bash");
            }
            _ => panic!("Expected Completions command"),
        }
    }
}

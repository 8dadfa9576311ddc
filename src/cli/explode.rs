use clap::Parser;
use std::path::PathBuf;

/// Arguments for explode command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Summarize the applications in a backup:\n    bigip-explode explode backup.ucs\n\n\
                  List every member and issue:\n    bigip-explode explode bigip.conf --verbose\n\n\
                  Keep the parsed objects for a later run:\n    bigip-explode explode snap.qkview --export-objects objects.json\n    \
                  bigip-explode explode objects.json")]
pub struct ExplodeArgs {
    /// Bundle to explode (bigip.conf, .ucs, .qkview or an object export)
    pub bundle: PathBuf,

    /// Configuration file layered over the global one
    #[arg(long, short = 'c', env = "BIGIP_EXPLODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Write the JSON result to a file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write all parsed objects as a re-loadable export
    #[arg(long)]
    pub export_objects: Option<PathBuf>,

    /// Do not show progress bars
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

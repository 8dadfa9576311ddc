//! Explode command implementation
//!
//! Loads the layered configuration, runs the pipeline over one bundle and
//! reports the result as a console summary or as JSON.

use std::fs;
use std::path::Path;

use crate::cli::ExplodeArgs;
use crate::config::ConfigLoader;
use crate::error::{Result, file_write_failed, io_error};
use crate::pipeline::{Exploder, Explosion};
use crate::progress::{CancellationToken, SilentProgress};
use crate::ui::InteractiveProgressReporter;
use crate::ui::display::render_summary;

/// Run explode command
pub fn run(args: ExplodeArgs, verbose: bool) -> Result<()> {
    let config = ConfigLoader::new()
        .with_explicit(args.config.clone())
        .load()?;
    let exploder = Exploder::new(config);
    let explosion = explode(&exploder, &args)?;

    if let Some(path) = &args.export_objects {
        let json = explosion
            .store
            .export()
            .to_json()
            .map_err(|e| io_error(format!("Failed to serialize objects: {e}")))?;
        write_file(path, &json)?;
    }

    let result_json = || {
        serde_json::to_string_pretty(&explosion.result)
            .map_err(|e| io_error(format!("Failed to serialize result: {e}")))
    };
    if let Some(path) = &args.output {
        write_file(path, &result_json()?)?;
    }
    if args.json {
        println!("{}", result_json()?);
    } else {
        print!("{}", render_summary(&explosion.result, verbose));
    }
    Ok(())
}

fn explode(exploder: &Exploder, args: &ExplodeArgs) -> Result<Explosion> {
    let cancel = CancellationToken::new();
    if args.quiet {
        return exploder.explode_with(&args.bundle, &mut SilentProgress, &cancel);
    }
    let mut reporter = InteractiveProgressReporter::new();
    let outcome = exploder.explode_with(&args.bundle, &mut reporter, &cancel);
    match outcome {
        Ok(_) => reporter.finish(),
        Err(_) => reporter.abandon(),
    }
    outcome
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| file_write_failed(path, e))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

//! The explosion pipeline
//!
//! ```text
//! bundle -> ArchiveLoader -> Parser (per file) -> ObjectStore -> Resolver -> Extractor
//!                                                                              |
//!                                  ExplosionResult { applications, orphans, stats }
//! ```
//!
//! Stages run strictly in order on one thread. Progress events are delivered
//! synchronously to the caller's [`ProgressSink`]. Cancellation is polled
//! before each file, before each object and before each application:
//!
//! - observed while parsing: parsing stops, the objects of every fully parsed
//!   file are still resolved and extracted, status is
//!   `Cancelled { stage: parse }`. A file cut short contributes nothing.
//! - observed while extracting: extraction stops, status is
//!   `Cancelled { stage: extract }`
//!
//! Only bundle-level failures are returned as errors; everything else ends up
//! in [`Stats`].

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::archive::{ArchiveLoader, LoadedBundle};
use crate::config::ExplodeConfig;
use crate::domain::{BundleKind, Value};
use crate::error::Result;
use crate::extract::{Application, Extractor};
use crate::parser::Parser;
use crate::progress::{CancellationToken, ProgressSink, SilentProgress};
use crate::resolver::Resolver;
use crate::resolver::schema::ReferenceSchema;
use crate::stats::{Stats, micros};
use crate::store::{InsertOutcome, ObjectStore};

/// Type tag and identity of the device settings singleton
const GLOBAL_SETTINGS: &str = "sys global-settings";

/// Pipeline stage a run was cancelled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Extract,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Cancelled { stage: Stage },
}

impl RunStatus {
    pub fn is_cancelled(self) -> bool {
        matches!(self, RunStatus::Cancelled { .. })
    }
}

/// A configuration file consumed by the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    /// Size of the file text in bytes
    pub size: usize,
}

/// Top-level output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionResult {
    /// BLAKE3 digest of the bundle
    pub id: String,
    pub bundle_kind: BundleKind,
    pub status: RunStatus,
    pub tmos_version: Option<String>,
    pub hostname: Option<String>,
    pub sources: Vec<SourceFile>,
    pub applications: Vec<Application>,
    /// Objects reached by no application, in store order
    pub orphan_objects: Vec<String>,
    pub stats: Stats,
}

impl ExplosionResult {
    /// Copy with every wall-clock measurement zeroed, for comparing runs
    pub fn without_timings(&self) -> Self {
        let mut result = self.clone();
        result.stats.timings = Default::default();
        for app in &mut result.applications {
            app.extraction_duration_micros = 0;
        }
        result
    }

    pub fn application(&self, entry_point: &str) -> Option<&Application> {
        self.applications
            .iter()
            .find(|app| app.entry_point == entry_point)
    }
}

/// Result plus the object store it was computed from
#[derive(Debug, Clone)]
pub struct Explosion {
    pub result: ExplosionResult,
    pub store: ObjectStore,
}

impl Explosion {
    /// Configuration text of one application
    pub fn application_config(&self, entry_point: &str) -> Option<String> {
        self.result
            .application(entry_point)
            .map(|app| app.render_config(&self.store))
    }
}

/// Runs the pipeline with one configuration
#[derive(Debug, Clone)]
pub struct Exploder {
    config: ExplodeConfig,
    schema: ReferenceSchema,
}

impl Default for Exploder {
    fn default() -> Self {
        Self::new(ExplodeConfig::default())
    }
}

impl Exploder {
    pub fn new(config: ExplodeConfig) -> Self {
        let schema = ReferenceSchema::with_rules(&config.references);
        Self { config, schema }
    }

    pub fn config(&self) -> &ExplodeConfig {
        &self.config
    }

    /// Explode the bundle at `path` without progress or cancellation
    pub fn explode(&self, path: &Path) -> Result<Explosion> {
        self.explode_with(path, &mut SilentProgress, &CancellationToken::new())
    }

    /// Explode the bundle at `path`
    pub fn explode_with<P: ProgressSink>(
        &self,
        path: &Path,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<Explosion> {
        let span = tracing::info_span!("explode", bundle = %path.display());
        let _enter = span.enter();
        let started = Instant::now();

        let loader = ArchiveLoader::new(&self.config.archive)?;
        let loaded = loader.load(path)?;
        Ok(self.run(loaded, started, progress, cancel))
    }

    /// Explode an in-memory bundle; `name` stands in for its path
    pub fn explode_bytes<P: ProgressSink>(
        &self,
        name: &str,
        bytes: &[u8],
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<Explosion> {
        let span = tracing::info_span!("explode", bundle = name);
        let _enter = span.enter();
        let started = Instant::now();

        let loader = ArchiveLoader::new(&self.config.archive)?;
        let loaded = loader.load_bytes(Path::new(name), bytes)?;
        Ok(self.run(loaded, started, progress, cancel))
    }

    fn run<P: ProgressSink>(
        &self,
        loaded: LoadedBundle,
        started: Instant,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Explosion {
        let mut stats = Stats::default();
        stats.timings.load = micros(started.elapsed());

        let stage_start = Instant::now();
        let parser = Parser::new(&self.config.parser);
        let mut store = ObjectStore::new();
        let mut sources = Vec::new();
        let mut tmos_version = None;
        let mut cancelled = None;

        'files: for file in loaded.files {
            if cancel.is_cancelled() {
                cancelled = Some(Stage::Parse);
                break;
            }
            progress.file_started(file.sequence_index, file.total_count, &file.name);
            tracing::debug!(file = %file.name, "parsing");

            let mut outcomes = parser.parse(&file);
            let file_version = outcomes.tmos_version().map(str::to_string);
            let total = outcomes.total();
            // committed only once the whole file has been read
            let mut pending = Vec::with_capacity(total);
            let mut parsed = 0;
            loop {
                if cancel.is_cancelled() {
                    tracing::debug!(
                        file = %file.name,
                        dropped = pending.len(),
                        "cancelled mid-file"
                    );
                    cancelled = Some(Stage::Parse);
                    break 'files;
                }
                let Some(outcome) = outcomes.next() else {
                    break;
                };
                if outcome.is_ok() {
                    parsed += 1;
                    progress.object_parsed(parsed, total);
                }
                pending.push(outcome);
            }
            for outcome in pending {
                match outcome {
                    Ok(object) => {
                        stats.record_object(&object.type_tag);
                        match store.insert(object) {
                            InsertOutcome::Inserted => {}
                            InsertOutcome::Merged => stats.objects_merged += 1,
                            InsertOutcome::Conflict(conflict) => {
                                stats.record_type_conflict(conflict);
                            }
                        }
                    }
                    Err(error) => stats.record_parse_error(error),
                }
            }
            if tmos_version.is_none() {
                tmos_version = file_version;
            }
            stats.files_processed += 1;
            sources.push(SourceFile {
                name: file.name.clone(),
                size: file.text.len(),
            });
        }
        stats.timings.parse = micros(stage_start.elapsed());
        tracing::info!(
            files = stats.files_processed,
            objects = store.len(),
            parse_errors = stats.parse_errors.len(),
            "parsing finished"
        );

        let stage_start = Instant::now();
        let graph = Resolver::new(self.schema.clone()).resolve(&store, &mut stats);
        stats.timings.resolve = micros(stage_start.elapsed());

        let stage_start = Instant::now();
        let extractor = Extractor::new(&self.config.entry_points)
            .with_max_members(self.config.extract.max_members);
        // a run already cancelled while parsing still extracts what it has
        let extract_cancel = cancelled.is_none().then_some(cancel);
        let extraction = extractor.extract(&store, &graph, &mut stats, progress, extract_cancel);
        stats.timings.extract = micros(stage_start.elapsed());
        if extraction.cancelled && cancelled.is_none() {
            cancelled = Some(Stage::Extract);
        }

        stats.timings.total = micros(started.elapsed());
        let status = cancelled.map_or(RunStatus::Complete, |stage| RunStatus::Cancelled { stage });
        let hostname = store
            .get(GLOBAL_SETTINGS)
            .and_then(|settings| settings.get("hostname"))
            .and_then(Value::as_scalar)
            .map(str::to_string);

        tracing::info!(
            applications = extraction.applications.len(),
            orphans = extraction.orphans.len(),
            issues = stats.issue_count(),
            ?status,
            "explosion finished"
        );

        Explosion {
            result: ExplosionResult {
                id: loaded.id,
                bundle_kind: loaded.bundle.kind,
                status,
                tmos_version,
                hostname,
                sources,
                applications: extraction.applications,
                orphan_objects: extraction.orphans,
                stats,
            },
            store,
        }
    }
}

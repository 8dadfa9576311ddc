//! Application extraction
//!
//! An application is one entry-point object (by default an `ltm virtual`)
//! plus everything it reaches over outgoing references. Extraction walks the
//! [`ReferenceGraph`] breadth-first from each entry point:
//!
//! ```text
//! /Common/vs -> /Common/pool -> /Common/n1
//!                            -> /Common/n2
//!                            -> /Common/mon
//! ```
//!
//! Dependencies shared by several entry points (a common pool, a profile)
//! are members of every application that reaches them. That includes other
//! entry points: every entry point heads exactly one application of its own,
//! whether or not another traversal reached it. Objects no application
//! reaches are orphans.
//!
//! A fault while materializing one application is recorded as an
//! [`ExtractionError`] and only that entry point is skipped.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::progress::{CancellationToken, ProgressSink};
use crate::resolver::ReferenceGraph;
use crate::resolver::schema::in_family;
use crate::stats::{ExtractionError, Stats, micros};
use crate::store::ObjectStore;

/// One extracted application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub entry_point: String,
    /// Type tag of the entry point
    pub kind: String,
    /// Entry point first, then reachable objects in breadth-first order
    pub members: Vec<String>,
    pub extraction_duration_micros: u64,
}

impl Application {
    pub fn contains(&self, full_path: &str) -> bool {
        self.members.iter().any(|m| m == full_path)
    }

    /// The application's own configuration: the statement text of every
    /// member, in store order
    pub fn render_config(&self, store: &ObjectStore) -> String {
        let mut indexed: Vec<(usize, &str)> = self
            .members
            .iter()
            .filter_map(|path| {
                let index = store.index_of(path)?;
                let object = store.at(index)?;
                Some((index, object.source_text.as_str()))
            })
            .filter(|(_, text)| !text.is_empty())
            .collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Output of one extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub applications: Vec<Application>,
    /// Objects reached by no application, in store order
    pub orphans: Vec<String>,
    /// Stopped early on cancellation
    pub cancelled: bool,
}

/// Extracts applications from a resolved store
#[derive(Debug, Clone)]
pub struct Extractor<'a> {
    entry_points: &'a [String],
    max_members: Option<usize>,
}

impl<'a> Extractor<'a> {
    pub fn new(entry_points: &'a [String]) -> Self {
        Self {
            entry_points,
            max_members: None,
        }
    }

    /// Treat applications larger than `limit` as extraction errors
    pub fn with_max_members(mut self, limit: Option<usize>) -> Self {
        self.max_members = limit;
        self
    }

    fn is_entry_point(&self, type_tag: &str) -> bool {
        self.entry_points
            .iter()
            .any(|kind| in_family(type_tag, kind))
    }

    pub fn extract<P: ProgressSink>(
        &self,
        store: &ObjectStore,
        graph: &ReferenceGraph,
        stats: &mut Stats,
        progress: &mut P,
        cancel: Option<&CancellationToken>,
    ) -> Extraction {
        let mut extraction = Extraction::default();
        let mut reached = vec![false; store.len()];

        for (index, object) in store.all().enumerate() {
            if !self.is_entry_point(&object.type_tag) {
                continue;
            }
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                tracing::info!("extraction cancelled");
                extraction.cancelled = true;
                break;
            }

            let started = Instant::now();
            match self.walk(index, store, graph) {
                Ok(member_indices) => {
                    let elapsed = micros(started.elapsed());
                    let mut members = Vec::with_capacity(member_indices.len());
                    for member in member_indices {
                        reached[member] = true;
                        if let Some(obj) = store.at(member) {
                            members.push(obj.full_path.clone());
                        }
                    }
                    tracing::debug!(
                        entry_point = %object.full_path,
                        members = members.len(),
                        "application extracted"
                    );
                    progress.application_extracted(&object.full_path, elapsed);
                    extraction.applications.push(Application {
                        entry_point: object.full_path.clone(),
                        kind: object.type_tag.clone(),
                        members,
                        extraction_duration_micros: elapsed,
                    });
                }
                Err(cause) => stats.record_extraction_error(ExtractionError {
                    entry_point: object.full_path.clone(),
                    cause,
                }),
            }
        }

        extraction.orphans = store
            .all()
            .zip(&reached)
            .filter(|(_, reached)| !**reached)
            .map(|(object, _)| object.full_path.clone())
            .collect();

        stats.applications_extracted = extraction.applications.len();
        stats.orphan_count = extraction.orphans.len();
        tracing::info!(
            applications = stats.applications_extracted,
            orphans = stats.orphan_count,
            "applications extracted"
        );
        extraction
    }

    /// Breadth-first walk over outgoing edges from `start`
    fn walk(
        &self,
        start: usize,
        store: &ObjectStore,
        graph: &ReferenceGraph,
    ) -> Result<Vec<usize>, String> {
        let mut visited = vec![false; store.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;

        while let Some(current) = queue.pop_front() {
            order.push(current);
            if self.max_members.is_some_and(|limit| order.len() > limit) {
                return Err(format!(
                    "application exceeds {} members",
                    self.max_members.unwrap_or_default()
                ));
            }
            let outgoing = graph
                .outgoing(current)
                .ok_or_else(|| format!("object #{current} is missing from the reference graph"))?;
            for &next in outgoing {
                let Some(seen) = visited.get_mut(next) else {
                    return Err(format!("reference to unknown object #{next}"));
                };
                if !*seen {
                    *seen = true;
                    queue.push_back(next);
                }
            }
        }
        Ok(order)
    }
}

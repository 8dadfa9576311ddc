//! Progress events and cooperative cancellation
//!
//! The pipeline pushes three kinds of events into a [`ProgressSink`]. Sinks
//! decide how to deliver them: the CLI draws progress bars, a UI might forward
//! them over a channel, tests simply record them. Every event is delivered
//! before the pipeline resumes at its next suspension point.
//!
//! Cancellation is cooperative: callers flip a [`CancellationToken`] from any
//! thread and the pipeline observes it only between files, between objects and
//! between applications.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

/// A progress notification emitted by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Parsing of a file began (`index` is 1-based)
    FileStarted {
        index: usize,
        total: usize,
        name: String,
    },
    /// One object was parsed (`index` is 1-based, `total` counts statements in the file)
    ObjectParsed { index: usize, total: usize },
    /// One application was extracted
    ApplicationExtracted {
        entry_point: String,
        elapsed_micros: u64,
    },
}

/// Receiver of pipeline progress
///
/// This trait allows different progress reporting strategies:
/// - Interactive progress bars (see [`crate::ui::InteractiveProgressReporter`])
/// - Silent/no-op progress for quiet mode
/// - Forwarding to another thread through a channel
pub trait ProgressSink {
    /// Parsing of a file began
    fn file_started(&mut self, index: usize, total: usize, name: &str);

    /// One object was parsed out of the current file
    fn object_parsed(&mut self, index: usize, total: usize);

    /// One application was extracted
    fn application_extracted(&mut self, entry_point: &str, elapsed_micros: u64);

    /// Deliver an event through the matching callback
    fn emit(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::FileStarted { index, total, name } => {
                self.file_started(*index, *total, name);
            }
            ProgressEvent::ObjectParsed { index, total } => self.object_parsed(*index, *total),
            ProgressEvent::ApplicationExtracted {
                entry_point,
                elapsed_micros,
            } => self.application_extracted(entry_point, *elapsed_micros),
        }
    }
}

/// Silent progress sink
///
/// No-op implementation used in quiet mode and by callers that do not care.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn file_started(&mut self, _index: usize, _total: usize, _name: &str) {}

    fn object_parsed(&mut self, _index: usize, _total: usize) {}

    fn application_extracted(&mut self, _entry_point: &str, _elapsed_micros: u64) {}
}

/// Recording sink: keeps every event in order
impl ProgressSink for Vec<ProgressEvent> {
    fn file_started(&mut self, index: usize, total: usize, name: &str) {
        self.push(ProgressEvent::FileStarted {
            index,
            total,
            name: name.to_string(),
        });
    }

    fn object_parsed(&mut self, index: usize, total: usize) {
        self.push(ProgressEvent::ObjectParsed { index, total });
    }

    fn application_extracted(&mut self, entry_point: &str, elapsed_micros: u64) {
        self.push(ProgressEvent::ApplicationExtracted {
            entry_point: entry_point.to_string(),
            elapsed_micros,
        });
    }
}

/// Channel sink: forwards events to a receiver on another thread.
///
/// A disconnected receiver is ignored; progress is advisory.
impl ProgressSink for Sender<ProgressEvent> {
    fn file_started(&mut self, index: usize, total: usize, name: &str) {
        let _ = self.send(ProgressEvent::FileStarted {
            index,
            total,
            name: name.to_string(),
        });
    }

    fn object_parsed(&mut self, index: usize, total: usize) {
        let _ = self.send(ProgressEvent::ObjectParsed { index, total });
    }

    fn application_extracted(&mut self, entry_point: &str, elapsed_micros: u64) {
        let _ = self.send(ProgressEvent::ApplicationExtracted {
            entry_point: entry_point.to_string(),
            elapsed_micros,
        });
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn file_started(&mut self, index: usize, total: usize, name: &str) {
        (**self).file_started(index, total, name);
    }

    fn object_parsed(&mut self, index: usize, total: usize) {
        (**self).object_parsed(index, total);
    }

    fn application_extracted(&mut self, entry_point: &str, elapsed_micros: u64) {
        (**self).application_extracted(entry_point, elapsed_micros);
    }
}

/// Shared cancellation flag
///
/// Cloning shares the flag: cancel from one clone, observe from another.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next suspension point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

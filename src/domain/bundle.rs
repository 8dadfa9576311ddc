//! Bundle domain types
//!
//! A bundle is the artifact handed to the pipeline; the loader turns it into an
//! ordered list of [`ConfigFile`]s.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Container kind of a bundle, determined from its signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleKind {
    /// A single bigip.conf-style text file
    PlainConfig,
    /// A full system backup (UCS): gzip-compressed tar
    SystemArchive,
    /// A diagnostic snapshot (qkview): gzip-compressed tar with diagnostic entries
    DiagnosticSnapshot,
    /// An object list previously exported by this tool
    PreParsedBundle,
}

impl BundleKind {
    /// Whether this kind is a tar container holding several entries
    pub fn is_container(self) -> bool {
        matches!(
            self,
            BundleKind::SystemArchive | BundleKind::DiagnosticSnapshot
        )
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BundleKind::PlainConfig => "plain config",
            BundleKind::SystemArchive => "system archive",
            BundleKind::DiagnosticSnapshot => "diagnostic snapshot",
            BundleKind::PreParsedBundle => "pre-parsed bundle",
        };
        f.write_str(name)
    }
}

/// Input descriptor for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub path: PathBuf,
    pub kind: BundleKind,
}

/// How the text of a [`ConfigFile`] is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// tmsh configuration language
    Tmsh,
    /// JSON object export, see [`crate::store::ObjectExport`]
    ObjectList,
}

/// One unit of configuration text yielded by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Entry name inside the bundle (e.g. `config/bigip.conf`)
    pub name: String,
    /// 1-based position in loader order
    pub sequence_index: usize,
    /// Number of files the loader yields for this bundle
    pub total_count: usize,
    pub format: FileFormat,
    pub text: String,
}

impl ConfigFile {
    /// Create a tmsh-formatted file, mostly useful in tests and for plain bundles
    pub fn tmsh(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence_index: 1,
            total_count: 1,
            format: FileFormat::Tmsh,
            text: text.into(),
        }
    }
}

//! Runtime configuration for bigip-explode
//!
//! Every table that is "data, not code" lives here: which object kinds head an
//! application, which extra properties hold references, which archive entries
//! are configuration, and how the parser treats script bodies and pathless
//! singleton statements. Built-in defaults cover a stock BIG-IP; YAML files
//! layered on top (see [`loader`]) adjust them.

pub mod loader;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wax::Glob;

use crate::error::{Result, config_invalid};
use crate::resolver::schema::ReferenceRule;

pub use loader::ConfigLoader;

/// Archive entries read as configuration, in file order
pub const DEFAULT_ARCHIVE_INCLUDE: &[&str] = &[
    "config/bigip_base.conf",
    "config/bigip.conf",
    "config/bigip_script.conf",
    "config/bigip_gtm.conf",
    "config/partitions/*/bigip_base.conf",
    "config/partitions/*/bigip.conf",
];

/// Entries only a diagnostic snapshot carries
pub const DEFAULT_DIAGNOSTIC_MARKERS: &[&str] =
    &["commands/**", "procs/**", "xml_stats/**", "*qkview*"];

/// Script objects whose body is TCL, not tmsh properties
pub const DEFAULT_RAW_BODY_TYPES: &[&str] =
    &["ltm rule", "gtm rule", "pem irule", "sys icall script"];

/// Pathless singleton statements, matched as whole-word type prefixes
pub const DEFAULT_GLOBAL_KINDS: &[&str] = &[
    "sys",
    "cm",
    "auth",
    "net",
    "ltm default-node-monitor",
    "ltm global-settings",
    "gtm global-settings",
    "analytics global-settings",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Full configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeConfig {
    /// Object kinds that head an application
    pub entry_points: Vec<String>,
    /// Reference rules appended after the built-in ones, keyed by type tag
    pub references: IndexMap<String, Vec<ReferenceRule>>,
    pub archive: ArchiveSettings,
    pub parser: ParserSettings,
    pub extract: ExtractSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    pub include: Vec<String>,
    pub diagnostic_markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserSettings {
    pub raw_body_types: Vec<String>,
    pub global_kinds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractSettings {
    /// Applications larger than this are reported as extraction errors
    pub max_members: Option<usize>,
}

impl Default for ExplodeConfig {
    fn default() -> Self {
        Self {
            entry_points: vec!["ltm virtual".to_string()],
            references: IndexMap::new(),
            archive: ArchiveSettings::default(),
            parser: ParserSettings::default(),
            extract: ExtractSettings::default(),
        }
    }
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            include: strings(DEFAULT_ARCHIVE_INCLUDE),
            diagnostic_markers: strings(DEFAULT_DIAGNOSTIC_MARKERS),
        }
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            raw_body_types: strings(DEFAULT_RAW_BODY_TYPES),
            global_kinds: strings(DEFAULT_GLOBAL_KINDS),
        }
    }
}

impl ParserSettings {
    pub fn is_raw_body(&self, type_tag: &str) -> bool {
        self.raw_body_types.iter().any(|t| t == type_tag)
    }

    pub fn is_global_kind(&self, type_tag: &str) -> bool {
        self.global_kinds.iter().any(|kind| {
            type_tag == kind
                || type_tag
                    .strip_prefix(kind.as_str())
                    .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

/// One configuration layer as written in a YAML file.
///
/// Absent fields leave the layer below untouched. `references` extends the
/// rules of lower layers; every other present field replaces them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    pub entry_points: Option<Vec<String>>,
    #[serde(default)]
    pub references: IndexMap<String, Vec<ReferenceRule>>,
    pub archive: Option<ArchiveOverlay>,
    pub parser: Option<ParserOverlay>,
    pub extract: Option<ExtractSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveOverlay {
    pub include: Option<Vec<String>>,
    pub diagnostic_markers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserOverlay {
    pub raw_body_types: Option<Vec<String>>,
    pub global_kinds: Option<Vec<String>>,
}

impl ConfigOverlay {
    /// Parse an overlay from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl ExplodeConfig {
    /// Apply a layer on top of this configuration
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(entry_points) = overlay.entry_points {
            self.entry_points = entry_points;
        }
        for (type_tag, rules) in overlay.references {
            self.references.entry(type_tag).or_default().extend(rules);
        }
        if let Some(archive) = overlay.archive {
            if let Some(include) = archive.include {
                self.archive.include = include;
            }
            if let Some(markers) = archive.diagnostic_markers {
                self.archive.diagnostic_markers = markers;
            }
        }
        if let Some(parser) = overlay.parser {
            if let Some(raw) = parser.raw_body_types {
                self.parser.raw_body_types = raw;
            }
            if let Some(kinds) = parser.global_kinds {
                self.parser.global_kinds = kinds;
            }
        }
        if let Some(extract) = overlay.extract {
            self.extract = extract;
        }
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.entry_points.is_empty() {
            return Err(config_invalid("entry_points must name at least one type"));
        }
        if self.archive.include.is_empty() {
            return Err(config_invalid("archive.include must not be empty"));
        }
        for pattern in self
            .archive
            .include
            .iter()
            .chain(&self.archive.diagnostic_markers)
        {
            Glob::new(pattern)
                .map_err(|e| config_invalid(format!("invalid glob '{pattern}': {e}")))?;
        }
        for (type_tag, rules) in &self.references {
            if type_tag.trim().is_empty() {
                return Err(config_invalid("reference rules need a type tag"));
            }
            if let Some(rule) = rules.iter().find(|r| r.path.split('.').any(str::is_empty)) {
                return Err(config_invalid(format!(
                    "invalid reference path '{}' for '{}'",
                    rule.path, type_tag
                )));
            }
        }
        if self.extract.max_members == Some(0) {
            return Err(config_invalid("extract.max_members must be at least 1"));
        }
        Ok(())
    }
}

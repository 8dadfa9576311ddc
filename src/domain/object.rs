//! Configuration object model
//!
//! A parsed statement such as
//!
//! ```text
//! ltm pool /Common/web_pool {
//!     members {
//!         /Common/10.0.0.1:80 {
//!             address 10.0.0.1
//!         }
//!     }
//!     monitor /Common/http
//! }
//! ```
//!
//! becomes a [`ConfigObject`] with type tag `ltm pool`, full path
//! `/Common/web_pool` and an ordered property tree of [`Value`]s.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered property tree of one object or nested block
pub type Properties = IndexMap<String, Value>;

/// A property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
    Block(Properties),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Properties> {
        match self {
            Value::Block(props) => Some(props),
            _ => None,
        }
    }

    /// The strings this value names when read as a reference holder.
    ///
    /// Scalars name themselves, lists name every item and blocks name their
    /// keys (`members { /Common/n1:80 { ... } }` keys members by name).
    pub fn named_items(&self) -> Vec<&str> {
        match self {
            Value::Scalar(s) => vec![s.as_str()],
            Value::List(items) => items.iter().map(String::as_str).collect(),
            Value::Block(props) => props.keys().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => f.write_str(s),
            Value::List(items) => write!(f, "{{ {} }}", items.join(" ")),
            Value::Block(props) => write!(f, "{{ {} keys }}", props.len()),
        }
    }
}

/// Inclusive 1-based line span inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A structured configuration object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigObject {
    /// Object kind, e.g. `ltm virtual` or `ltm profile http`
    pub type_tag: String,
    /// Partition-qualified unique name, e.g. `/Common/app_vs`
    pub full_path: String,
    pub properties: Properties,
    /// Every file that defined this object, in definition order
    pub source_files: Vec<String>,
    /// Lines of the most recent definition
    pub lines: LineRange,
    /// Verbatim statement text of every definition, in order
    #[serde(default)]
    pub source_text: String,
}

impl ConfigObject {
    pub fn new(
        type_tag: impl Into<String>,
        full_path: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            full_path: full_path.into(),
            properties,
            source_files: Vec::new(),
            lines: LineRange::new(0, 0),
            source_text: String::new(),
        }
    }

    /// Look up a top-level property
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Merge a later definition of the same object over this one.
    ///
    /// Keys are overwritten one by one; keys only present here survive. The
    /// later definition's provenance is appended.
    pub fn merge(&mut self, later: ConfigObject) {
        for (key, value) in later.properties {
            self.properties.insert(key, value);
        }
        self.source_files.extend(later.source_files);
        self.lines = later.lines;
        if !later.source_text.is_empty() {
            if !self.source_text.is_empty() {
                self.source_text.push('\n');
            }
            self.source_text.push_str(&later.source_text);
        }
    }
}

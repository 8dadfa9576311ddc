//! Block parser for tmsh configuration text
//!
//! Parsing is two-pass. [`scan`] cuts the file into top-level statements and
//! isolates broken regions; [`statement`] turns each statement into a
//! [`ConfigObject`]. The first pass makes the per-file object total exact
//! before the first object is handed out, which is what progress reporting
//! needs.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bigip_explode::config::ParserSettings;
//! use bigip_explode::domain::ConfigFile;
//! use bigip_explode::parser::Parser;
//!
//! let settings = ParserSettings::default();
//! let file = ConfigFile::tmsh("bigip.conf", "ltm pool /Common/p1 { }\n");
//! for outcome in Parser::new(&settings).parse(&file) {
//!     match outcome {
//!         Ok(object) => println!("{} {}", object.type_tag, object.full_path),
//!         Err(error) => eprintln!("{error}"),
//!     }
//! }
//! ```

pub mod lexer;
pub mod path;
pub mod scan;
pub mod statement;

use crate::config::ParserSettings;
use crate::domain::{ConfigFile, ConfigObject, FileFormat, LineRange};
use crate::stats::ParseError;
use crate::store::ObjectExport;

use scan::Scanned;

/// Outcome of one statement
pub type ParseOutcome = std::result::Result<ConfigObject, ParseError>;

/// Parser configured for one run
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    settings: &'a ParserSettings,
}

impl<'a> Parser<'a> {
    pub fn new(settings: &'a ParserSettings) -> Self {
        Self { settings }
    }

    /// Parse one file. Scanning happens here; objects are built lazily as the
    /// returned iterator is advanced.
    pub fn parse<'f>(&self, file: &'f ConfigFile) -> FileParser<'f>
    where
        'a: 'f,
    {
        let (source, total, tmos_version) = match file.format {
            FileFormat::Tmsh => {
                let scan = scan::scan(&file.name, &file.text);
                let total = scan.statement_count();
                (
                    Source::Tmsh(scan.items.into_iter()),
                    total,
                    scan.tmos_version,
                )
            }
            FileFormat::ObjectList => match serde_json::from_str::<ObjectExport>(&file.text) {
                Ok(export) => {
                    let total = export.objects.len();
                    (Source::Objects(export.objects.into_iter()), total, None)
                }
                Err(e) => {
                    let error = ParseError::new(
                        file.name.as_str(),
                        LineRange::new(e.line(), e.line()),
                        format!("invalid object export: {e}"),
                        "",
                    );
                    (Source::Failed(Some(error)), 0, None)
                }
            },
        };
        FileParser {
            file,
            settings: self.settings,
            source,
            total,
            tmos_version,
        }
    }
}

enum Source {
    Tmsh(std::vec::IntoIter<Scanned>),
    Objects(std::vec::IntoIter<ConfigObject>),
    Failed(Option<ParseError>),
}

/// Lazy sequence of parse outcomes for one file, in file order
pub struct FileParser<'f> {
    file: &'f ConfigFile,
    settings: &'f ParserSettings,
    source: Source,
    total: usize,
    tmos_version: Option<String>,
}

impl FileParser<'_> {
    /// Number of statements (or exported objects) in the file
    pub fn total(&self) -> usize {
        self.total
    }

    /// Version from the file's `#TMSH-VERSION:` header
    pub fn tmos_version(&self) -> Option<&str> {
        self.tmos_version.as_deref()
    }
}

impl Iterator for FileParser<'_> {
    type Item = ParseOutcome;

    fn next(&mut self) -> Option<ParseOutcome> {
        match &mut self.source {
            Source::Tmsh(items) => {
                let item = items.next()?;
                Some(match item {
                    Scanned::Broken(error) => Err(error),
                    Scanned::Statement(raw) => {
                        match statement::parse_statement(&raw, self.settings) {
                            Ok(mut object) => {
                                object.source_files.push(self.file.name.clone());
                                object.lines = raw.lines;
                                object.source_text = raw.text;
                                Ok(object)
                            }
                            Err(reason) => Err(ParseError::new(
                                self.file.name.as_str(),
                                raw.lines,
                                reason,
                                &raw.text,
                            )),
                        }
                    }
                })
            }
            Source::Objects(objects) => {
                let mut object = objects.next()?;
                if object.source_files.is_empty() {
                    object.source_files.push(self.file.name.clone());
                }
                Some(Ok(object))
            }
            Source::Failed(error) => error.take().map(Err),
        }
    }
}

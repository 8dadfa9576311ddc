//! First pass: split a file into top-level statements
//!
//! The scanner walks the text line by line, tracking brace depth, quote state
//! and comments, and cuts it into statements without interpreting them. This
//! gives the exact number of statements before any object is built, and it is
//! where broken regions are isolated:
//!
//! - a stray `}` or indented text outside any statement opens a broken region
//!   that ends at the next line starting a statement
//! - a statement still open (unbalanced braces or an unterminated quote) when a
//!   new top-level statement begins at column 0 is cut off there
//! - a statement still open at end of file is reported as well
//!
//! Each broken region produces exactly one [`ParseError`].

use crate::domain::LineRange;
use crate::stats::ParseError;

/// First words of top-level statements, one per configuration module
const MODULE_KEYWORDS: &[&str] = &[
    "afm", "analytics", "apm", "asm", "auth", "avr", "cli", "cm", "dos", "gtm", "ilx", "ltm",
    "net", "pem", "security", "sys", "vcmp", "wom",
];

const VERSION_MARKER: &str = "#TMSH-VERSION:";

/// One top-level statement cut out of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    pub lines: LineRange,
    /// Verbatim text, comments included
    pub text: String,
    /// Text with comments removed, fed to the tokenizer
    pub stripped: String,
}

/// A unit produced by the scanner, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    Statement(RawStatement),
    Broken(ParseError),
}

/// Scanner output for one file
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub items: Vec<Scanned>,
    /// Version announced by a `#TMSH-VERSION:` comment
    pub tmos_version: Option<String>,
}

impl Scan {
    pub fn statement_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, Scanned::Statement(_)))
            .count()
    }
}

/// Whether a line begins a new top-level statement
fn starts_statement(line: &str) -> bool {
    if line.starts_with(char::is_whitespace) {
        return false;
    }
    let word = line.split_whitespace().next().unwrap_or("");
    MODULE_KEYWORDS.contains(&word)
}

struct Pending {
    start: usize,
    text: Vec<String>,
    stripped: Vec<String>,
    /// Saw the opening brace of the body
    opened: bool,
}

struct BrokenRegion {
    start: usize,
    reason: String,
    text: Vec<String>,
}

/// Outcome of feeding one line into an open statement
enum LineEnd {
    /// The statement continues on the next line
    Open,
    /// The statement closed; anything after the close is returned
    Closed { trailing: bool },
    /// A `}` appeared before the body was opened
    Unbalanced,
}

struct Scanner<'a> {
    file: &'a str,
    depth: usize,
    in_quote: bool,
    pending: Option<Pending>,
    broken: Option<BrokenRegion>,
    scan: Scan,
}

/// Scan `text` belonging to file `file`
pub fn scan(file: &str, text: &str) -> Scan {
    let mut scanner = Scanner {
        file,
        depth: 0,
        in_quote: false,
        pending: None,
        broken: None,
        scan: Scan::default(),
    };
    let mut last = 0;
    for (idx, line) in text.lines().enumerate() {
        last = idx + 1;
        scanner.line(idx + 1, line);
    }
    scanner.finish(last);
    scanner.scan
}

impl Scanner<'_> {
    fn line(&mut self, number: usize, line: &str) {
        if self.broken.is_some() {
            if starts_statement(line) {
                self.close_broken(number - 1);
            } else {
                if let Some(region) = self.broken.as_mut() {
                    region.text.push(line.to_string());
                }
                return;
            }
        }

        if self.pending.is_some() {
            if starts_statement(line) && (self.depth > 0 || self.in_quote || !self.opened()) {
                let reason = if self.in_quote {
                    "unterminated quote"
                } else {
                    "unterminated statement"
                };
                self.fail_pending(number - 1, reason);
            } else {
                self.continue_statement(number, line);
                return;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed.starts_with('#') {
            if self.scan.tmos_version.is_none() {
                self.scan.tmos_version = trimmed
                    .strip_prefix(VERSION_MARKER)
                    .map(|version| version.trim().to_string());
            }
            return;
        }
        if trimmed.starts_with('}') {
            self.open_broken(number, "unexpected '}' outside a statement", line);
            return;
        }
        if line.starts_with(char::is_whitespace) && !starts_statement(trimmed) {
            self.open_broken(number, "unexpected text outside a statement", line);
            return;
        }

        self.pending = Some(Pending {
            start: number,
            text: Vec::new(),
            stripped: Vec::new(),
            opened: false,
        });
        self.continue_statement(number, line);
    }

    fn opened(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.opened)
    }

    fn continue_statement(&mut self, number: usize, line: &str) {
        let (stripped, end) = self.feed(line);
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.text.push(line.to_string());
        pending.stripped.push(stripped);

        match end {
            LineEnd::Open => {}
            LineEnd::Closed { trailing } => {
                self.complete_pending(number);
                if trailing {
                    self.open_broken(number, "unexpected text after statement", line);
                }
            }
            LineEnd::Unbalanced => {
                self.fail_pending(number, "unexpected '}' before statement body");
            }
        }
    }

    /// Track quotes, escapes, comments and braces over one line
    fn feed(&mut self, line: &str) -> (String, LineEnd) {
        let mut stripped = String::with_capacity(line.len());
        let mut escaped = false;
        let mut prev_blank = true;
        let mut closed_at = None;

        for (pos, c) in line.char_indices() {
            if let Some(close) = closed_at {
                let rest = &line[close..];
                let trailing = !rest.trim().is_empty() && !rest.trim_start().starts_with('#');
                return (stripped, LineEnd::Closed { trailing });
            }
            if escaped {
                escaped = false;
                stripped.push(c);
                prev_blank = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => self.in_quote = !self.in_quote,
                '#' if !self.in_quote && prev_blank => break,
                '{' if !self.in_quote => {
                    self.depth += 1;
                    if let Some(p) = self.pending.as_mut() {
                        p.opened = true;
                    }
                }
                '}' if !self.in_quote => {
                    if self.depth == 0 {
                        return (stripped, LineEnd::Unbalanced);
                    }
                    self.depth -= 1;
                    if self.depth == 0 {
                        closed_at = Some(pos + c.len_utf8());
                    }
                }
                _ => {}
            }
            stripped.push(c);
            prev_blank = c.is_whitespace();
        }

        if closed_at.is_some() {
            return (stripped, LineEnd::Closed { trailing: false });
        }
        (stripped, LineEnd::Open)
    }

    fn complete_pending(&mut self, end: usize) {
        if let Some(pending) = self.pending.take() {
            self.scan.items.push(Scanned::Statement(RawStatement {
                lines: LineRange::new(pending.start, end),
                text: pending.text.join("\n"),
                stripped: pending.stripped.join("\n"),
            }));
        }
        self.reset();
    }

    fn fail_pending(&mut self, end: usize, reason: &str) {
        if let Some(pending) = self.pending.take() {
            let text = pending.text.join("\n");
            self.scan.items.push(Scanned::Broken(ParseError::new(
                self.file,
                LineRange::new(pending.start, end.max(pending.start)),
                reason,
                &text,
            )));
        }
        self.reset();
    }

    fn open_broken(&mut self, number: usize, reason: &str, line: &str) {
        self.broken = Some(BrokenRegion {
            start: number,
            reason: reason.to_string(),
            text: vec![line.to_string()],
        });
    }

    fn close_broken(&mut self, end: usize) {
        if let Some(region) = self.broken.take() {
            self.scan.items.push(Scanned::Broken(ParseError::new(
                self.file,
                LineRange::new(region.start, end.max(region.start)),
                region.reason,
                &region.text.join("\n"),
            )));
        }
    }

    fn reset(&mut self) {
        self.depth = 0;
        self.in_quote = false;
    }

    fn finish(&mut self, last: usize) {
        if self.broken.is_some() {
            self.close_broken(last);
        }
        if self.pending.is_some() {
            let reason = if self.in_quote {
                "unterminated quote at end of file"
            } else {
                "unterminated statement at end of file"
            };
            self.fail_pending(last, reason);
        }
    }
}

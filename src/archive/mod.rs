//! Archive loader: from a bundle on disk to an ordered list of config files
//!
//! Supported bundles, told apart by signature:
//!
//! | Kind                 | Container                 | Files yielded                    |
//! |----------------------|---------------------------|----------------------------------|
//! | `PlainConfig`        | text (optionally gzipped) | the bundle itself                |
//! | `SystemArchive`      | ustar (optionally gzipped)| entries matching `archive.include` |
//! | `DiagnosticSnapshot` | same, with marker entries | entries matching `archive.include` |
//! | `PreParsedBundle`    | JSON object export        | one object-list file             |
//!
//! Inside archives only configured entries are read, ordered by the position
//! of the first include pattern they match and then by name. Every failure
//! here is fatal: without configuration text there is nothing to explode.

pub mod detect;
pub mod tar;

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use wax::{CandidatePath, Glob, Pattern};

use crate::config::ArchiveSettings;
use crate::domain::{Bundle, BundleKind, ConfigFile, FileFormat};
use crate::error::{
    Result, archive_empty, archive_malformed, archive_unreadable, archive_unrecognized,
    config_invalid,
};
use crate::hash;
use crate::store::ObjectExport;

use detect::{Signature, looks_like_text, sniff};
use tar::{TAR_BLOCK_LEN, TarReader, is_ustar_header};

/// A loaded bundle and the files it yields
#[derive(Debug)]
pub struct LoadedBundle {
    pub bundle: Bundle,
    /// BLAKE3 digest of the bundle bytes
    pub id: String,
    pub files: ConfigFiles,
}

/// Ordered, finite, single-pass sequence of configuration files
#[derive(Debug)]
pub struct ConfigFiles {
    inner: std::vec::IntoIter<ConfigFile>,
}

impl ConfigFiles {
    fn new(mut files: Vec<ConfigFile>) -> Self {
        let total = files.len();
        for (idx, file) in files.iter_mut().enumerate() {
            file.sequence_index = idx + 1;
            file.total_count = total;
        }
        Self {
            inner: files.into_iter(),
        }
    }
}

impl Iterator for ConfigFiles {
    type Item = ConfigFile;

    fn next(&mut self) -> Option<ConfigFile> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ConfigFiles {}

/// Reads bundles according to [`ArchiveSettings`]
pub struct ArchiveLoader<'a> {
    include: Vec<Glob<'a>>,
    markers: Vec<Glob<'a>>,
}

impl<'a> ArchiveLoader<'a> {
    pub fn new(settings: &'a ArchiveSettings) -> Result<Self> {
        let compile = |patterns: &'a [String]| -> Result<Vec<Glob<'a>>> {
            patterns
                .iter()
                .map(|p| {
                    Glob::new(p).map_err(|e| config_invalid(format!("invalid glob '{p}': {e}")))
                })
                .collect()
        };
        Ok(Self {
            include: compile(&settings.include)?,
            markers: compile(&settings.diagnostic_markers)?,
        })
    }

    /// Read and classify the bundle at `path`
    pub fn load(&self, path: &Path) -> Result<LoadedBundle> {
        let bytes = fs::read(path).map_err(|e| archive_unreadable(path, e))?;
        self.load_bytes(path, &bytes)
    }

    /// Classify an in-memory bundle; `path` is used for naming and errors only
    pub fn load_bytes(&self, path: &Path, bytes: &[u8]) -> Result<LoadedBundle> {
        let (kind, files) = match sniff(bytes) {
            Signature::Empty => return Err(archive_empty(path)),
            Signature::Gzip => self.load_gzip(path, bytes)?,
            Signature::Tar => self.read_tar(path, bytes)?,
            Signature::Json => (BundleKind::PreParsedBundle, vec![export_file(path, bytes)?]),
            Signature::Text => (
                BundleKind::PlainConfig,
                vec![ConfigFile::tmsh(plain_name(path), String::from_utf8_lossy(bytes))],
            ),
            Signature::Unknown => return Err(archive_unrecognized(path)),
        };

        tracing::info!(
            bundle = %path.display(),
            %kind,
            files = files.len(),
            "bundle loaded"
        );
        for file in &files {
            tracing::debug!(name = %file.name, bytes = file.text.len(), "config file");
        }

        Ok(LoadedBundle {
            bundle: Bundle {
                path: path.to_path_buf(),
                kind,
            },
            id: hash::hash_bytes(bytes),
            files: ConfigFiles::new(files),
        })
    }

    fn load_gzip(&self, path: &Path, bytes: &[u8]) -> Result<(BundleKind, Vec<ConfigFile>)> {
        let mut decoder = MultiGzDecoder::new(bytes);
        let mut head = Vec::with_capacity(TAR_BLOCK_LEN);
        (&mut decoder)
            .take(TAR_BLOCK_LEN as u64)
            .read_to_end(&mut head)
            .map_err(|e| archive_malformed(path, format!("gzip: {e}")))?;

        if is_ustar_header(&head) {
            return self.read_tar(path, Cursor::new(head).chain(decoder));
        }

        let mut text = head;
        decoder
            .read_to_end(&mut text)
            .map_err(|e| archive_malformed(path, format!("gzip: {e}")))?;
        if text.iter().all(u8::is_ascii_whitespace) {
            return Err(archive_empty(path));
        }
        if !looks_like_text(&text) {
            return Err(archive_unrecognized(path));
        }
        let name = plain_name(path);
        let name = name.strip_suffix(".gz").unwrap_or(&name).to_string();
        Ok((
            BundleKind::PlainConfig,
            vec![ConfigFile::tmsh(name, String::from_utf8_lossy(&text))],
        ))
    }

    fn read_tar<R: Read>(&self, path: &Path, input: R) -> Result<(BundleKind, Vec<ConfigFile>)> {
        let mut reader = TarReader::new(input);
        let mut diagnostic = false;
        let mut matched: Vec<(usize, ConfigFile)> = Vec::new();

        while let Some(entry) = reader
            .next_entry()
            .map_err(|e| archive_malformed(path, e))?
        {
            let name = normalize_entry_name(&entry.name);
            let (is_marker, rank) = {
                let candidate = CandidatePath::from(name.as_str());
                (
                    self.markers.iter().any(|g| g.matched(&candidate).is_some()),
                    self.include
                        .iter()
                        .position(|g| g.matched(&candidate).is_some()),
                )
            };
            diagnostic |= is_marker;
            let Some(rank) = rank.filter(|_| entry.is_regular()) else {
                continue;
            };
            let data = reader
                .read_payload(&entry)
                .map_err(|e| archive_malformed(path, format!("{name}: {e}")))?;
            matched.push((rank, ConfigFile::tmsh(name, String::from_utf8_lossy(&data))));
        }

        if matched.is_empty() {
            return Err(archive_empty(path));
        }
        matched.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.name.cmp(&b.name)));

        let kind = if diagnostic {
            BundleKind::DiagnosticSnapshot
        } else {
            BundleKind::SystemArchive
        };
        Ok((kind, matched.into_iter().map(|(_, file)| file).collect()))
    }
}

fn export_file(path: &Path, bytes: &[u8]) -> Result<ConfigFile> {
    let export: ObjectExport = serde_json::from_slice(bytes)
        .map_err(|e| archive_malformed(path, format!("object export: {e}")))?;
    if export.objects.is_empty() {
        return Err(archive_empty(path));
    }
    Ok(ConfigFile {
        name: plain_name(path),
        sequence_index: 1,
        total_count: 1,
        format: FileFormat::ObjectList,
        text: String::from_utf8_lossy(bytes).into_owned(),
    })
}

fn plain_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `./config/bigip.conf` and `/config/bigip.conf` both become `config/bigip.conf`
pub fn normalize_entry_name(name: &str) -> String {
    let mut rest = name;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

//! Sequential ustar reader
//!
//! # Algorithm
//! - Read 512-byte header blocks; two zero blocks end the archive.
//! - Resolve GNU longname (`L`) and PAX `path=` (`x`) overrides for the next
//!   entry only.
//! - Hand every other entry to the caller, who either reads its payload or
//!   lets the reader skip it on the next call.
//!
//! Size fields are untrusted: overflow and short reads surface as
//! `io::ErrorKind::InvalidData` / `UnexpectedEof`. No seeks are performed, so
//! the reader works directly on a gzip stream.

use std::io::{self, Read};

pub const TAR_BLOCK_LEN: usize = 512;
pub const USTAR_MAGIC_OFFSET: usize = 257;

/// Longest GNU longname / PAX record accepted
const MAX_METADATA_LEN: u64 = 64 * 1024;

/// Payload buffers grow past this only as bytes actually arrive
const PAYLOAD_PREALLOC: u64 = 1024 * 1024;

pub fn is_ustar_header(header: &[u8]) -> bool {
    header.len() >= TAR_BLOCK_LEN && &header[USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + 5] == b"ustar"
}

/// Metadata of one archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Entry name with GNU/PAX overrides applied, not normalized
    pub name: String,
    pub size: u64,
    pub typeflag: u8,
}

impl TarEntry {
    pub fn is_regular(&self) -> bool {
        self.typeflag == 0 || self.typeflag == b'0'
    }
}

/// Stateful reader over a tar stream
pub struct TarReader<R> {
    input: R,
    header: [u8; TAR_BLOCK_LEN],
    /// Payload bytes plus padding not yet consumed by the caller
    unread: u64,
    gnu_longname: Option<String>,
    pax_path: Option<String>,
    finished: bool,
}

impl<R: Read> TarReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            header: [0; TAR_BLOCK_LEN],
            unread: 0,
            gnu_longname: None,
            pax_path: None,
            finished: false,
        }
    }

    /// Advance to the next real entry, skipping any unread payload
    pub fn next_entry(&mut self) -> io::Result<Option<TarEntry>> {
        if self.finished {
            return Ok(None);
        }
        self.skip(self.unread)?;
        self.unread = 0;

        let mut zero_blocks = 0;
        loop {
            if !read_exact_or_eof(&mut self.input, &mut self.header)? {
                self.finished = true;
                return Ok(None);
            }
            if self.header.iter().all(|&b| b == 0) {
                zero_blocks += 1;
                if zero_blocks >= 2 {
                    self.finished = true;
                    return Ok(None);
                }
                continue;
            }
            zero_blocks = 0;

            verify_checksum(&self.header)?;
            let typeflag = self.header[156];
            let size = parse_octal(&self.header[124..136]).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "tar size field is not octal")
            })?;
            let padded = size
                .checked_add(tar_pad(size))
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "tar size overflow"))?;

            match typeflag {
                b'L' => {
                    let data = self.read_metadata(size, padded)?;
                    self.gnu_longname = Some(cstr_lossy(&data));
                }
                b'x' => {
                    let data = self.read_metadata(size, padded)?;
                    if let Some(path) = pax_path(&data) {
                        self.pax_path = Some(path);
                    }
                }
                b'g' => {
                    // global PAX records are consumed but not applied
                    self.skip(padded)?;
                }
                _ => {
                    let base = ustar_name(&self.header);
                    let name = self
                        .pax_path
                        .take()
                        .or_else(|| self.gnu_longname.take())
                        .unwrap_or(base);
                    self.gnu_longname = None;
                    self.unread = padded;
                    return Ok(Some(TarEntry {
                        name,
                        size,
                        typeflag,
                    }));
                }
            }
        }
    }

    /// Read the payload of the entry just returned by [`Self::next_entry`]
    pub fn read_payload(&mut self, entry: &TarEntry) -> io::Result<Vec<u8>> {
        let mut data =
            Vec::with_capacity(usize::try_from(entry.size.min(PAYLOAD_PREALLOC)).unwrap_or_default());
        let read = (&mut self.input).take(entry.size).read_to_end(&mut data)? as u64;
        self.unread = self.unread.saturating_sub(read);
        if read < entry.size {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "tar truncated"));
        }
        Ok(data)
    }

    fn read_metadata(&mut self, size: u64, padded: u64) -> io::Result<Vec<u8>> {
        if size > MAX_METADATA_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "tar metadata record too large",
            ));
        }
        let mut data = vec![0; usize::try_from(size).unwrap_or_default()];
        self.input.read_exact(&mut data)?;
        self.skip(padded - size)?;
        Ok(data)
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        let copied = io::copy(&mut (&mut self.input).take(n), &mut io::sink())?;
        if copied < n {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "tar truncated"));
        }
        Ok(())
    }
}

fn tar_pad(size: u64) -> u64 {
    let rem = size % TAR_BLOCK_LEN as u64;
    if rem == 0 {
        0
    } else {
        TAR_BLOCK_LEN as u64 - rem
    }
}

/// Read a full block, or report a clean EOF at a block boundary
fn read_exact_or_eof<R: Read>(r: &mut R, dst: &mut [u8]) -> io::Result<bool> {
    let mut off = 0;
    while off < dst.len() {
        let n = match r.read(&mut dst[off..]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            if off == 0 {
                return Ok(false);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "tar truncated header",
            ));
        }
        off += n;
    }
    Ok(true)
}

/// NUL/space padded octal
fn parse_octal(field: &[u8]) -> Option<u64> {
    let digits: &[u8] = {
        let start = field.iter().position(|&b| b != 0 && b != b' ').unwrap_or(field.len());
        let rest = &field[start..];
        let end = rest
            .iter()
            .position(|b| !(b'0'..=b'7').contains(b))
            .unwrap_or(rest.len());
        if rest[end..].iter().any(|&b| b != 0 && b != b' ') {
            return None;
        }
        &rest[..end]
    };
    digits.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(8)?.checked_add(u64::from(d - b'0'))
    })
}

fn verify_checksum(header: &[u8; TAR_BLOCK_LEN]) -> io::Result<()> {
    let stored = parse_octal(&header[148..156])
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "tar checksum is not octal"))?;
    let computed: u64 = header
        .iter()
        .enumerate()
        .map(|(i, &b)| if (148..156).contains(&i) { u64::from(b' ') } else { u64::from(b) })
        .sum();
    if stored != computed {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "tar header checksum mismatch",
        ));
    }
    Ok(())
}

fn cstr(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

fn cstr_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(cstr(bytes))
        .trim_end_matches('\n')
        .to_string()
}

fn ustar_name(header: &[u8; TAR_BLOCK_LEN]) -> String {
    let name = String::from_utf8_lossy(cstr(&header[0..100]));
    let prefix = String::from_utf8_lossy(cstr(&header[345..500]));
    if is_ustar_header(header) && !prefix.is_empty() {
        format!("{}/{}", prefix.trim_end_matches('/'), name)
    } else {
        name.into_owned()
    }
}

/// Extract `path=` from PAX records (`"<len> <key>=<value>\n"`)
fn pax_path(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    text.lines().find_map(|record| {
        let (_, kv) = record.split_once(' ')?;
        kv.strip_prefix("path=").map(str::to_string)
    })
}

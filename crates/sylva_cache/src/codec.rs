//! Binary framing for cache files.
//!
//! Every cache file is `magic(4) | header_len(u32 LE) | header | record`,
//! with header and record encoded by bincode. The magic distinguishes
//! preprocess from parse caches; the header carries the schema version,
//! origin path and origin mtime. Saves are atomic (write-temp-then-rename)
//! so a concurrent reader never observes a partial file.

use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Which cache a buffer belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CacheKind {
    /// Preprocess cache (`.slpp`).
    Preproc,
    /// Parse cache (`.slpa`).
    Parse,
}

impl CacheKind {
    /// The 4-byte identifier magic at the head of every buffer.
    pub fn magic(self) -> [u8; 4] {
        match self {
            CacheKind::Preproc => *b"SYPP",
            CacheKind::Parse => *b"SYPA",
        }
    }
}

/// Header prepended to every cache record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHeader {
    /// Schema version string, compared exactly on load.
    pub schema_version: String,
    /// Path of the file this cache was produced from.
    pub origin_path: String,
    /// Modification time of the origin at save time (seconds since epoch,
    /// 0 if unavailable).
    pub origin_mtime: u64,
    /// Identifier of the build that produced this cache.
    pub build_id: String,
}

/// Build identifier written into headers produced by this binary.
fn build_id() -> String {
    format!("SYLVA {}", env!("CARGO_PKG_VERSION"))
}

/// Creates a header for a cache of `origin`, stamping its current mtime.
pub fn create_header(schema_version: &str, origin: &Path) -> CacheHeader {
    CacheHeader {
        schema_version: schema_version.to_string(),
        origin_path: origin.to_string_lossy().into_owned(),
        origin_mtime: mtime_secs(origin),
        build_id: build_id(),
    }
}

/// Returns the mtime of `path` in seconds since the epoch, 0 if unavailable.
pub fn mtime_secs(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Returns `true` iff the header's schema version matches exactly and the
/// origin file's mtime is not newer than the cache file's mtime.
pub fn check_header(header: &CacheHeader, expected_version: &str, cache_path: &Path) -> bool {
    if header.schema_version != expected_version {
        return false;
    }
    let origin = Path::new(&header.origin_path);
    let origin_mtime = match std::fs::metadata(origin) {
        Ok(_) => mtime_secs(origin),
        // Origin no longer on disk (e.g. a virtual file); fall back to the
        // mtime recorded at save time.
        Err(_) => header.origin_mtime,
    };
    origin_mtime <= mtime_secs(cache_path)
}

/// An opened cache file: decoded header plus the still-encoded record.
#[derive(Debug)]
pub struct CacheFile {
    /// The decoded header.
    pub header: CacheHeader,
    payload: Vec<u8>,
}

impl CacheFile {
    /// Decodes the record. Any decode failure is a cache miss.
    pub fn decode_record<T: DeserializeOwned>(&self) -> Option<T> {
        bincode::serde::decode_from_slice(&self.payload, bincode::config::standard())
            .ok()
            .map(|(record, _)| record)
    }
}

/// Opens a cache file.
///
/// Returns `None` if the file is absent, unreadable, too short, carries the
/// wrong magic, or its header fails to decode. All of these are soft
/// failures treated as cache misses.
pub fn open(path: &Path, kind: CacheKind) -> Option<CacheFile> {
    let raw = std::fs::read(path).ok()?;
    if raw.len() < 8 {
        return None;
    }
    if raw[..4] != kind.magic() {
        return None;
    }
    let header_len = u32::from_le_bytes(raw[4..8].try_into().ok()?) as usize;
    if raw.len() < 8 + header_len {
        return None;
    }
    let header: CacheHeader =
        bincode::serde::decode_from_slice(&raw[8..8 + header_len], bincode::config::standard())
            .ok()?
            .0;
    Some(CacheFile {
        header,
        payload: raw[8 + header_len..].to_vec(),
    })
}

/// Serializes and writes a cache record atomically.
///
/// The buffer is written to a sibling temporary file and renamed into
/// place; concurrent writers of identical content are last-wins.
pub fn save_record<T: Serialize>(
    path: &Path,
    kind: CacheKind,
    header: &CacheHeader,
    record: &T,
) -> Result<(), CacheError> {
    let header_bytes = bincode::serde::encode_to_vec(header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
    let record_bytes = bincode::serde::encode_to_vec(record, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let mut out = Vec::with_capacity(8 + header_bytes.len() + record_bytes.len());
    out.extend_from_slice(&kind.magic());
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&record_bytes);

    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    std::fs::write(&tmp, &out).map_err(|e| CacheError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Record {
        body: String,
        values: Vec<u32>,
    }

    fn sample() -> Record {
        Record {
            body: "module m; endmodule".to_string(),
            values: vec![1, 2, 3],
        }
    }

    #[test]
    fn save_and_open_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.slpp");
        let header = create_header("1.2", &path);
        save_record(&path, CacheKind::Preproc, &header, &sample()).unwrap();

        let file = open(&path, CacheKind::Preproc).unwrap();
        assert_eq!(file.header.schema_version, "1.2");
        assert_eq!(file.decode_record::<Record>().unwrap(), sample());
    }

    #[test]
    fn open_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open(&dir.path().join("absent.slpp"), CacheKind::Preproc).is_none());
    }

    #[test]
    fn wrong_magic_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.slpp");
        let header = create_header("1.2", &path);
        save_record(&path, CacheKind::Parse, &header, &sample()).unwrap();
        assert!(open(&path, CacheKind::Preproc).is_none());
        assert!(open(&path, CacheKind::Parse).is_some());
    }

    #[test]
    fn truncated_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.slpp");
        std::fs::write(&path, b"SYP").unwrap();
        assert!(open(&path, CacheKind::Preproc).is_none());
        std::fs::write(&path, b"SYPP\xff\xff\xff\xff").unwrap();
        assert!(open(&path, CacheKind::Preproc).is_none());
    }

    #[test]
    fn garbage_body_fails_record_decode_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.slpp");
        let header = create_header("1.2", &path);
        save_record(&path, CacheKind::Preproc, &header, &sample()).unwrap();
        let file = open(&path, CacheKind::Preproc).unwrap();
        assert!(file.decode_record::<Vec<Vec<String>>>().is_none());
    }

    #[test]
    fn header_version_must_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("top.sv");
        std::fs::write(&origin, "module m; endmodule").unwrap();
        let cache = dir.path().join("top.slpp");
        let header = create_header("1.2", &origin);
        save_record(&cache, CacheKind::Preproc, &header, &sample()).unwrap();

        let opened = open(&cache, CacheKind::Preproc).unwrap();
        assert!(check_header(&opened.header, "1.2", &cache));
        assert!(!check_header(&opened.header, "1.3", &cache));
    }

    #[test]
    fn stale_cache_fails_header_check() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("top.sv");
        std::fs::write(&origin, "module m; endmodule").unwrap();
        let cache = dir.path().join("top.slpp");
        let header = create_header("1.2", &origin);
        save_record(&cache, CacheKind::Preproc, &header, &sample()).unwrap();

        // Make the origin newer than the cache file.
        let future = std::time::SystemTime::now() + std::time::Duration::from_secs(60);
        let f = std::fs::File::options().write(true).open(&origin).unwrap();
        f.set_modified(future).unwrap();
        drop(f);

        let opened = open(&cache, CacheKind::Preproc).unwrap();
        assert!(!check_header(&opened.header, "1.2", &cache));
    }

    #[test]
    fn missing_origin_falls_back_to_saved_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("builtin.slpp");
        let header = CacheHeader {
            schema_version: "1.2".to_string(),
            origin_path: "/nonexistent/builtin.sv".to_string(),
            origin_mtime: 0,
            build_id: "SYLVA test".to_string(),
        };
        save_record(&cache, CacheKind::Preproc, &header, &sample()).unwrap();
        let opened = open(&cache, CacheKind::Preproc).unwrap();
        assert!(check_header(&opened.header, "1.2", &cache));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.slpp");
        let header = create_header("1.2", &path);
        save_record(&path, CacheKind::Preproc, &header, &sample()).unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != path)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn identical_saves_are_byte_equal() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("top.sv");
        std::fs::write(&origin, "x").unwrap();
        let a = dir.path().join("a.slpp");
        let b = dir.path().join("b.slpp");
        let header = create_header("1.2", &origin);
        save_record(&a, CacheKind::Preproc, &header, &sample()).unwrap();
        save_record(&b, CacheKind::Preproc, &header, &sample()).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }
}

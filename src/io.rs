//! Dataset path resolution and file loading

use crate::compression::{get_decompressor, CompressionMethod, GZIP_SUFFIX};
use crate::error::{BrikError, Result};
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};

/// Conventional suffix of the metadata file
pub const HEAD_SUFFIX: &str = ".HEAD";

/// Conventional suffix of the payload file
pub const BRIK_SUFFIX: &str = ".BRIK";

/// Suffix of a gzip-compressed payload file
pub const COMPRESSED_BRIK_SUFFIX: &str = ".BRIK.gz";

/// Apply the suffix rule to `path`
///
/// A path ending in `suffix` is returned unchanged, a trailing `.` is
/// completed with the suffix, and anything else gets the suffix appended.
pub fn resolve_path(path: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let name = path.as_os_str();
    let text = name.to_string_lossy();

    if text.ends_with(suffix) {
        return path.to_path_buf();
    }

    let mut resolved = name.to_os_string();
    match suffix.strip_prefix('.') {
        Some(bare) if text.ends_with('.') => resolved.push(bare),
        _ => resolved.push(suffix),
    }
    PathBuf::from(resolved)
}

/// The HEAD/BRIK file pair of one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub head: PathBuf,
    pub brik: PathBuf,
}

impl DatasetPaths {
    /// Resolve both files from a prefix or from either file's name
    ///
    /// Unlike a plain suffix append, a companion suffix is dropped first, so
    /// `anat+orig.HEAD` resolves its payload to `anat+orig.BRIK` rather than
    /// `anat+orig.HEAD.BRIK`. An explicit `anat+orig.BRIK.gz` is kept as the
    /// payload path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let head_source = strip_suffix(path, &[COMPRESSED_BRIK_SUFFIX, BRIK_SUFFIX]);
        let brik = if has_suffix(path, COMPRESSED_BRIK_SUFFIX) {
            path.to_path_buf()
        } else {
            resolve_path(strip_suffix(path, &[HEAD_SUFFIX]), BRIK_SUFFIX)
        };

        let paths = Self {
            head: resolve_path(head_source, HEAD_SUFFIX),
            brik,
        };
        tracing::debug!(head = %paths.head.display(), brik = %paths.brik.display(), "resolved dataset paths");
        paths
    }

    /// Location of the gzip-compressed payload
    pub fn compressed_brik(&self) -> PathBuf {
        if CompressionMethod::from_path(&self.brik) == CompressionMethod::Gzip {
            return self.brik.clone();
        }
        let mut name = self.brik.clone().into_os_string();
        name.push(GZIP_SUFFIX);
        PathBuf::from(name)
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_str()
        .and_then(|text| text.strip_suffix(suffix))
        .is_some_and(|stem| !stem.is_empty())
}

fn strip_suffix(path: &Path, suffixes: &[&str]) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    suffixes
        .iter()
        .filter_map(|suffix| text.strip_suffix(*suffix))
        .find(|stem| !stem.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf())
}

/// Read a HEAD file as text
///
/// Bytes that are not valid UTF-8 (legacy `HISTORY_NOTE` contents, for
/// instance) are replaced rather than rejected.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| BrikError::file(path, e))?;
    match String::from_utf8(data) {
        Ok(text) => Ok(text),
        Err(err) => {
            tracing::warn!(path = %path.display(), "HEAD file is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// Read a payload file, inflating it if stored compressed
///
/// Inflation stops after `max_size` bytes, so an oversized compressed
/// payload is cut short and later rejected by the size check.
pub fn read_payload(path: impl AsRef<Path>, max_size: Option<usize>) -> Result<Bytes> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| BrikError::file(path, e))?;
    let stored = data.len();

    let decompressor = get_decompressor(CompressionMethod::from_path(path));
    let payload = decompressor.decompress(data, max_size)?;
    if decompressor.method() != CompressionMethod::None {
        tracing::debug!(
            path = %path.display(),
            method = ?decompressor.method(),
            stored = %crate::utils::format_bytes(stored),
            inflated = %crate::utils::format_bytes(payload.len()),
            "decompressed BRIK payload"
        );
    }
    Ok(Bytes::from(payload))
}

/// Read the payload of `paths`, trying `<brik>.gz` when the plain file is missing
///
/// `expected` is the payload size the header promises; a compressed payload
/// is inflated to at most one byte more than that.
pub fn read_dataset_payload(
    paths: &DatasetPaths,
    allow_compressed: bool,
    expected: Option<usize>,
) -> Result<Bytes> {
    let max_size = expected.map(|size| size.saturating_add(1));
    if allow_compressed && !paths.brik.exists() {
        let compressed = paths.compressed_brik();
        if compressed.exists() {
            return read_payload(compressed, max_size);
        }
    }
    read_payload(&paths.brik, max_size)
}

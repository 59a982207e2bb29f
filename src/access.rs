//! Dataset access - main API for reading BRIK/HEAD pairs

use crate::error::Result;
use crate::header::{parse_header, Header};
use crate::io::{read_dataset_payload, read_text, DatasetPaths};
use crate::metadata::DecodeParams;
use crate::types::{ByteOrder, DataType};
use crate::volume::{decode_with_params, Volume};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reader configuration
///
/// Every decision the HEAD file can leave open is made here explicitly
/// rather than guessed at decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Data type to assume when `BRICK_TYPES` is absent; `None` makes it an error
    pub missing_brick_type: Option<DataType>,

    /// Byte order used when `BYTEORDER_STRING` is absent or unrecognised
    pub fallback_byte_order: ByteOrder,

    /// Apply `BRICK_FLOAT_FACS` after decoding
    pub apply_scaling: bool,

    /// Look for `<prefix>.BRIK.gz` when `<prefix>.BRIK` does not exist
    pub allow_compressed: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            missing_brick_type: None,
            fallback_byte_order: ByteOrder::Native,
            apply_scaling: true,
            allow_compressed: true,
        }
    }
}

impl ReaderOptions {
    /// Load options from JSON; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the data type assumed for a missing `BRICK_TYPES`
    pub fn with_missing_brick_type(mut self, data_type: Option<DataType>) -> Self {
        self.missing_brick_type = data_type;
        self
    }

    /// Set the byte order used when the header does not declare one
    pub fn with_fallback_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.fallback_byte_order = byte_order;
        self
    }

    /// Enable or disable `BRICK_FLOAT_FACS` scaling
    pub fn with_apply_scaling(mut self, apply: bool) -> Self {
        self.apply_scaling = apply;
        self
    }

    /// Enable or disable `.BRIK.gz` lookup
    pub fn with_allow_compressed(mut self, allow: bool) -> Self {
        self.allow_compressed = allow;
        self
    }
}

/// Reads HEAD/BRIK datasets with a fixed set of options
///
/// Holds no file handles or caches; every call opens and closes its own files.
#[derive(Debug, Clone, Default)]
pub struct BrikReader {
    options: ReaderOptions,
}

impl BrikReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Parse the HEAD file of the dataset at `path`
    pub fn read_header(&self, path: impl AsRef<Path>) -> Result<Header> {
        let paths = DatasetPaths::new(path);
        let text = read_text(&paths.head)?;
        parse_header(&text)
    }

    /// Decode the BRIK file of the dataset at `path` using `header`
    pub fn read_volume(&self, path: impl AsRef<Path>, header: &Header) -> Result<Volume> {
        let paths = DatasetPaths::new(path);
        let params = DecodeParams::from_header(header, &self.options)?;
        let expected = params.expected_bytes()?;
        let payload = read_dataset_payload(&paths, self.options.allow_compressed, Some(expected))?;
        decode_with_params(&payload, &params)
    }

    /// Read both files of the dataset at `path`
    ///
    /// `path` may be the prefix or either file's name. A companion suffix is
    /// replaced rather than appended to, so `foo.HEAD` pairs with `foo.BRIK`
    /// instead of `foo.HEAD.BRIK`; see [`DatasetPaths::new`].
    pub fn read(&self, path: impl AsRef<Path>) -> Result<(Header, Volume)> {
        let path = path.as_ref();
        let header = self.read_header(path)?;
        let volume = self.read_volume(path, &header)?;
        tracing::debug!(path = %path.display(), volume = %volume.summary(), "read dataset");
        Ok((header, volume))
    }
}

/// Parse the HEAD file of the dataset at `path` with default options
pub fn read_header(path: impl AsRef<Path>) -> Result<Header> {
    BrikReader::default().read_header(path)
}

/// Decode the BRIK file of the dataset at `path` with default options
pub fn read_volume(path: impl AsRef<Path>, header: &Header) -> Result<Volume> {
    BrikReader::default().read_volume(path, header)
}

/// Read the HEAD/BRIK pair at `path` with default options
///
/// Path forms are resolved as in [`BrikReader::read`].
pub fn read(path: impl AsRef<Path>) -> Result<(Header, Volume)> {
    BrikReader::default().read(path)
}

//! Decompression of stored BRIK payloads
//!
//! AFNI can store the payload gzip-compressed as `<prefix>.BRIK.gz`. The HEAD
//! file is always plain text.

use crate::error::{BrikError, Result};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Suffix appended to a compressed BRIK file
pub const GZIP_SUFFIX: &str = ".gz";

/// How a payload file is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Raw bytes
    None = 0,
    /// gzip, possibly with several members
    Gzip = 1,
}

impl CompressionMethod {
    /// Choose a method from the file name
    ///
    /// Raw payloads may legitimately begin with the gzip magic, so the
    /// leading bytes alone are never trusted.
    pub fn from_path(path: &Path) -> Self {
        let gz_name = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);
        if gz_name {
            CompressionMethod::Gzip
        } else {
            CompressionMethod::None
        }
    }
}

/// Trait for payload decompression
pub trait Decompressor: Send + Sync {
    /// Decompress data, producing at most `max_size` bytes when a limit is given
    fn decompress(&self, data: Vec<u8>, max_size: Option<usize>) -> Result<Vec<u8>>;

    /// Get the compression method
    fn method(&self) -> CompressionMethod;
}

/// No compression
#[derive(Debug, Default)]
pub struct NoneDecompressor;

impl Decompressor for NoneDecompressor {
    fn decompress(&self, data: Vec<u8>, _max_size: Option<usize>) -> Result<Vec<u8>> {
        Ok(data)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::None
    }
}

/// Gzip decompression
#[derive(Debug, Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn decompress(&self, data: Vec<u8>, max_size: Option<usize>) -> Result<Vec<u8>> {
        let decoder = MultiGzDecoder::new(data.as_slice());
        let limit = max_size.map_or(u64::MAX, |size| size as u64);
        let mut decompressed = Vec::with_capacity(data.len());
        decoder
            .take(limit)
            .read_to_end(&mut decompressed)
            .map_err(|e| BrikError::Decompression(e.to_string()))?;
        Ok(decompressed)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::Gzip
    }
}

/// Get a decompressor for a given method
pub fn get_decompressor(method: CompressionMethod) -> Box<dyn Decompressor> {
    match method {
        CompressionMethod::None => Box::new(NoneDecompressor),
        CompressionMethod::Gzip => Box::new(GzipDecompressor),
    }
}

//! afni-brik - AFNI BRIK/HEAD dataset reader
//!
//! A pure Rust reader for the AFNI neuroimaging format, where a dataset is a
//! pair of files: a plain-text `.HEAD` file of typed attributes and a raw
//! binary `.BRIK` file holding the voxel data.
//!
//! # Features
//!
//! - Single-pass HEAD parser producing typed attributes
//! - Decoding of all AFNI brick types (u8, i16, i32, f32, f64, complex) in
//!   either byte order into `ndarray` 4-D arrays indexed `[x, y, z, t]`
//! - `BRICK_FLOAT_FACS` scaling into a promoted floating point buffer
//! - Transparent loading of gzip-compressed `.BRIK.gz` payloads
//!
//! Reading is synchronous; nothing is cached between calls, so distinct
//! datasets may be read from several threads at once.
//!
//! # Example
//!
//! ```rust,no_run
//! use afni_brik::read;
//!
//! # fn example() -> afni_brik::Result<()> {
//! let (header, volume) = read("/data/anat+orig")?;
//! println!("{:?}", header.integers("DATASET_DIMENSIONS")?);
//! println!("{}", volume.summary());
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod compression;
pub mod error;
pub mod header;
pub mod io;
pub mod layout;
pub mod lexer;
pub mod metadata;
pub mod scaling;
pub mod types;
pub mod utils;
pub mod volume;

// Re-exports
pub use access::{read, read_header, read_volume, BrikReader, ReaderOptions};
pub use error::{BrikError, Result};
pub use header::{parse_header, Attribute, AttributeKind, AttributeValue, Header};
pub use io::DatasetPaths;
pub use layout::VolumeLayout;
pub use metadata::DecodeParams;
pub use scaling::ScaleFactors;
pub use types::{ByteOrder, DataType};
pub use volume::{decode_volume, Volume, VolumeData, Voxel};

/// Version of this crate
pub const AFNI_BRIK_VERSION: &str = env!("CARGO_PKG_VERSION");

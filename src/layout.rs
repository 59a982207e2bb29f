//! Volume layout - extents and the column-major voxel ordering of a BRIK file

use crate::error::{BrikError, Result};
use crate::header::Header;
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// Extents of a dataset: three spatial axes plus the sub-brick axis
///
/// Voxel `(i, j, k)` of sub-brick `t` is stored at linear position
/// `i + j*nx + k*nx*ny + t*nx*ny*nz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLayout {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Number of sub-bricks
    pub ntp: usize,
}

impl VolumeLayout {
    pub fn new(nx: usize, ny: usize, nz: usize, ntp: usize) -> Self {
        Self { nx, ny, nz, ntp }
    }

    /// Read extents from `DATASET_DIMENSIONS` and `DATASET_RANK`
    pub fn from_header(header: &Header) -> Result<Self> {
        let dims = header.integers("DATASET_DIMENSIONS")?;
        let rank = header.integers("DATASET_RANK")?;

        if dims.len() < 3 {
            return Err(BrikError::InvalidDimensions(format!(
                "DATASET_DIMENSIONS has {} values, need at least 3",
                dims.len()
            )));
        }
        if rank.len() < 2 {
            return Err(BrikError::InvalidDimensions(format!(
                "DATASET_RANK has {} values, need at least 2",
                rank.len()
            )));
        }

        Ok(Self {
            nx: extent("DATASET_DIMENSIONS", dims[0])?,
            ny: extent("DATASET_DIMENSIONS", dims[1])?,
            nz: extent("DATASET_DIMENSIONS", dims[2])?,
            ntp: extent("DATASET_RANK", rank[1])?,
        })
    }

    /// Shape as `[nx, ny, nz, ntp]`
    pub fn shape(&self) -> [usize; 4] {
        [self.nx, self.ny, self.nz, self.ntp]
    }

    /// Number of voxels in one sub-brick
    pub fn voxels_per_brick(&self) -> Result<usize> {
        self.nx
            .checked_mul(self.ny)
            .and_then(|n| n.checked_mul(self.nz))
            .ok_or_else(|| self.overflow())
    }

    /// Number of elements across all sub-bricks
    pub fn total_elements(&self) -> Result<usize> {
        self.voxels_per_brick()?
            .checked_mul(self.ntp)
            .ok_or_else(|| self.overflow())
    }

    /// Exact payload length for elements of `data_type`
    pub fn expected_bytes(&self, data_type: DataType) -> Result<usize> {
        self.total_elements()?
            .checked_mul(data_type.size_in_bytes())
            .ok_or_else(|| self.overflow())
    }

    /// Get a summary string of the layout
    pub fn summary(&self, data_type: DataType) -> String {
        let size = self
            .expected_bytes(data_type)
            .map(crate::utils::format_bytes)
            .unwrap_or_else(|_| "overflowing".to_string());
        format!(
            "{} x {} x {} voxels, {} sub-brick(s) of {}, {}",
            self.nx, self.ny, self.nz, self.ntp, data_type, size
        )
    }

    fn overflow(&self) -> BrikError {
        BrikError::InvalidDimensions(format!(
            "{} x {} x {} x {} overflows the addressable size",
            self.nx, self.ny, self.nz, self.ntp
        ))
    }
}

fn extent(attribute: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| BrikError::InvalidDimensions(format!("{} has negative extent {}", attribute, value)))
}

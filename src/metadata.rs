//! Decode parameters resolved from HEAD attributes

use crate::access::ReaderOptions;
use crate::error::{BrikError, Result};
use crate::header::Header;
use crate::layout::VolumeLayout;
use crate::scaling::ScaleFactors;
use crate::types::{ByteOrder, DataType};
use serde::{Deserialize, Serialize};

/// Everything needed to decode a BRIK payload, without reading it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeParams {
    /// Extents of the dataset
    pub layout: VolumeLayout,

    /// Element type stored in the payload
    pub data_type: DataType,

    /// Byte order used for decoding
    pub byte_order: ByteOrder,

    /// Scale factors to apply after decoding
    pub scale: Option<ScaleFactors>,
}

impl DecodeParams {
    /// Resolve decode parameters from `header`
    pub fn from_header(header: &Header, options: &ReaderOptions) -> Result<Self> {
        let layout = VolumeLayout::from_header(header)?;
        let data_type = resolve_data_type(header, options)?;
        let byte_order = resolve_byte_order(header, options);

        let scale = ScaleFactors::from_header(header)?;
        if let Some(factors) = &scale {
            factors.validate(layout.ntp)?;
            let skipped = factors.skipped();
            if skipped > 0 {
                tracing::warn!(skipped, "non-positive BRICK_FLOAT_FACS left unscaled");
            }
        }
        let scale = scale.filter(|_| options.apply_scaling);

        tracing::debug!(
            shape = ?layout.shape(),
            %data_type,
            %byte_order,
            scaled = scale.is_some(),
            "resolved decode parameters"
        );

        Ok(Self {
            layout,
            data_type,
            byte_order,
            scale,
        })
    }

    /// Exact payload length these parameters require
    pub fn expected_bytes(&self) -> Result<usize> {
        self.layout.expected_bytes(self.data_type)
    }

    pub fn summary(&self) -> String {
        format!("{}, {}", self.layout.summary(self.data_type), self.byte_order)
    }
}

/// Collapse `BRICK_TYPES` to a single data type
fn resolve_data_type(header: &Header, options: &ReaderOptions) -> Result<DataType> {
    let codes: &[i64] = match header.get("BRICK_TYPES") {
        Some(value) => value.integers("BRICK_TYPES")?,
        None => &[],
    };

    let Some((&first, rest)) = codes.split_first() else {
        return match options.missing_brick_type {
            Some(data_type) => {
                tracing::debug!(%data_type, "BRICK_TYPES absent, using configured type");
                Ok(data_type)
            }
            None => Err(BrikError::MissingRequiredAttribute("BRICK_TYPES".to_string())),
        };
    };

    if rest.iter().any(|&code| code != first) {
        let mut distinct = codes.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        return Err(BrikError::HeterogeneousBrickTypes(distinct));
    }

    DataType::from_brick_code(first)
}

fn resolve_byte_order(header: &Header, options: &ReaderOptions) -> ByteOrder {
    let declared = header
        .get("BYTEORDER_STRING")
        .and_then(|value| value.as_text())
        .and_then(ByteOrder::from_header_string);

    declared.unwrap_or_else(|| {
        tracing::debug!(
            fallback = %options.fallback_byte_order,
            "BYTEORDER_STRING absent or unrecognised"
        );
        options.fallback_byte_order
    })
}

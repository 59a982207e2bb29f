//! BRIK payload decoding into typed 4-D arrays

use crate::access::ReaderOptions;
use crate::error::{BrikError, Result};
use crate::header::Header;
use crate::layout::VolumeLayout;
use crate::metadata::DecodeParams;
use crate::scaling;
use crate::types::{ByteOrder, DataType};
use byteorder::{BigEndian, LittleEndian, NativeEndian};
use ndarray::{Array4, ArrayView3, Axis, ShapeBuilder};
use num_complex::Complex64;
use num_traits::AsPrimitive;

/// Voxel values of a dataset, indexed `[x, y, z, t]`
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    U8(Array4<u8>),
    I16(Array4<i16>),
    I32(Array4<i32>),
    F32(Array4<f32>),
    F64(Array4<f64>),
    Complex64(Array4<Complex64>),
}

impl VolumeData {
    /// Element type currently held
    pub fn data_type(&self) -> DataType {
        match self {
            VolumeData::U8(_) => DataType::U8,
            VolumeData::I16(_) => DataType::I16,
            VolumeData::I32(_) => DataType::I32,
            VolumeData::F32(_) => DataType::F32,
            VolumeData::F64(_) => DataType::F64,
            VolumeData::Complex64(_) => DataType::Complex64,
        }
    }

    /// Extents as `[nx, ny, nz, ntp]`
    pub fn shape(&self) -> [usize; 4] {
        let dims = match self {
            VolumeData::U8(a) => a.dim(),
            VolumeData::I16(a) => a.dim(),
            VolumeData::I32(a) => a.dim(),
            VolumeData::F32(a) => a.dim(),
            VolumeData::F64(a) => a.dim(),
            VolumeData::Complex64(a) => a.dim(),
        };
        [dims.0, dims.1, dims.2, dims.3]
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen real-valued data to `f64`; `None` for complex data
    pub fn to_f64(&self) -> Option<Array4<f64>> {
        match self {
            VolumeData::U8(a) => Some(widen(a)),
            VolumeData::I16(a) => Some(widen(a)),
            VolumeData::I32(a) => Some(widen(a)),
            VolumeData::F32(a) => Some(widen(a)),
            VolumeData::F64(a) => Some(a.clone()),
            VolumeData::Complex64(_) => None,
        }
    }
}

fn widen<T: AsPrimitive<f64>>(array: &Array4<T>) -> Array4<f64> {
    array.mapv(|v| v.as_())
}

/// Element types that can be borrowed out of a [`VolumeData`]
pub trait Voxel: Sized {
    fn array(data: &VolumeData) -> Option<&Array4<Self>>;
}

macro_rules! impl_voxel {
    ($ty:ty, $variant:ident) => {
        impl Voxel for $ty {
            fn array(data: &VolumeData) -> Option<&Array4<Self>> {
                match data {
                    VolumeData::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_voxel!(u8, U8);
impl_voxel!(i16, I16);
impl_voxel!(i32, I32);
impl_voxel!(f32, F32);
impl_voxel!(f64, F64);
impl_voxel!(Complex64, Complex64);

/// A decoded BRIK dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: VolumeData,
    source_type: DataType,
    byte_order: ByteOrder,
    scaled: bool,
}

impl Volume {
    pub fn data(&self) -> &VolumeData {
        &self.data
    }

    pub fn into_data(self) -> VolumeData {
        self.data
    }

    /// Borrow the voxel array if it holds elements of type `T`
    pub fn as_array<T: Voxel>(&self) -> Option<&Array4<T>> {
        T::array(&self.data)
    }

    /// 3-D view of sub-brick `t`
    pub fn sub_brick<T: Voxel>(&self, t: usize) -> Option<ArrayView3<'_, T>> {
        let array = self.as_array::<T>()?;
        (t < array.len_of(Axis(3))).then(|| array.index_axis(Axis(3), t))
    }

    pub fn shape(&self) -> [usize; 4] {
        self.data.shape()
    }

    pub fn layout(&self) -> VolumeLayout {
        let [nx, ny, nz, ntp] = self.shape();
        VolumeLayout::new(nx, ny, nz, ntp)
    }

    /// Element type after any scaling
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Element type as stored in the BRIK file
    pub fn source_type(&self) -> DataType {
        self.source_type
    }

    /// Byte order used to decode the payload; `Native` when the header did not declare one
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Whether `BRICK_FLOAT_FACS` changed any values
    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    pub fn to_f64(&self) -> Option<Array4<f64>> {
        self.data.to_f64()
    }

    pub fn summary(&self) -> String {
        let mut summary = self.layout().summary(self.source_type);
        summary.push_str(&format!(", {}", self.byte_order));
        if self.scaled {
            summary.push_str(&format!(", scaled to {}", self.data_type()));
        }
        summary
    }
}

/// Decode a raw BRIK payload described by `header`
pub fn decode_volume(raw: &[u8], header: &Header, options: &ReaderOptions) -> Result<Volume> {
    let params = DecodeParams::from_header(header, options)?;
    decode_with_params(raw, &params)
}

/// Decode a raw BRIK payload with already resolved parameters
pub fn decode_with_params(raw: &[u8], params: &DecodeParams) -> Result<Volume> {
    let expected = params.expected_bytes()?;
    if raw.len() != expected {
        return Err(BrikError::SizeMismatch {
            actual: raw.len(),
            expected,
        });
    }

    let shape = params.layout.shape();
    let stored = match params.byte_order {
        ByteOrder::LittleEndian => decode_elements::<LittleEndian>(raw, params.data_type, shape)?,
        ByteOrder::BigEndian => decode_elements::<BigEndian>(raw, params.data_type, shape)?,
        ByteOrder::Native => decode_elements::<NativeEndian>(raw, params.data_type, shape)?,
    };

    let (data, scaled) = match &params.scale {
        Some(factors) if factors.is_effective(params.layout.ntp) => {
            (scaling::apply(&stored, factors), true)
        }
        _ => (stored, false),
    };

    tracing::debug!(
        shape = ?shape,
        source_type = %params.data_type,
        data_type = %data.data_type(),
        byte_order = %params.byte_order,
        scaled,
        "decoded BRIK payload"
    );

    Ok(Volume {
        data,
        source_type: params.data_type,
        byte_order: params.byte_order,
        scaled,
    })
}

/// Reinterpret `raw` as column-major elements; `raw` must already be the exact size
fn decode_elements<B: byteorder::ByteOrder>(
    raw: &[u8],
    data_type: DataType,
    [nx, ny, nz, ntp]: [usize; 4],
) -> Result<VolumeData> {
    let count = raw.len() / data_type.size_in_bytes();
    let shape = (nx, ny, nz, ntp).f();

    let data = match data_type {
        DataType::U8 => VolumeData::U8(Array4::from_shape_vec(shape, raw.to_vec())?),
        DataType::I16 => {
            let mut values = vec![0i16; count];
            B::read_i16_into(raw, &mut values);
            VolumeData::I16(Array4::from_shape_vec(shape, values)?)
        }
        DataType::I32 => {
            let mut values = vec![0i32; count];
            B::read_i32_into(raw, &mut values);
            VolumeData::I32(Array4::from_shape_vec(shape, values)?)
        }
        DataType::F32 => {
            let mut values = vec![0f32; count];
            B::read_f32_into(raw, &mut values);
            VolumeData::F32(Array4::from_shape_vec(shape, values)?)
        }
        DataType::F64 => {
            let mut values = vec![0f64; count];
            B::read_f64_into(raw, &mut values);
            VolumeData::F64(Array4::from_shape_vec(shape, values)?)
        }
        DataType::Complex64 => {
            let mut parts = vec![0f64; count * 2];
            B::read_f64_into(raw, &mut parts);
            let values = parts
                .chunks_exact(2)
                .map(|pair| Complex64::new(pair[0], pair[1]))
                .collect();
            VolumeData::Complex64(Array4::from_shape_vec(shape, values)?)
        }
    };

    Ok(data)
}

//! `BRICK_FLOAT_FACS` scale factors
//!
//! Scaling never mutates a decoded buffer in place. [`apply`] produces a new
//! floating point buffer, so an integer volume is promoted rather than
//! overwritten with truncated values.

use crate::error::{BrikError, Result};
use crate::header::Header;
use crate::types::DataType;
use crate::volume::VolumeData;
use ndarray::{Array4, Axis};
use num_complex::Complex64;
use num_traits::{AsPrimitive, Float};
use serde::{Deserialize, Serialize};

/// Scale factors as declared in the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScaleFactors {
    /// A single factor applied to every sub-brick
    Uniform(f64),
    /// One factor per sub-brick; missing trailing entries leave bricks unscaled
    PerBrick(Vec<f64>),
}

impl ScaleFactors {
    /// Read `BRICK_FLOAT_FACS`, if present
    pub fn from_header(header: &Header) -> Result<Option<Self>> {
        let Some(value) = header.get("BRICK_FLOAT_FACS") else {
            return Ok(None);
        };
        let factors = value.floats("BRICK_FLOAT_FACS")?;
        Ok(Some(if value.is_scalar() {
            ScaleFactors::Uniform(factors[0])
        } else {
            ScaleFactors::PerBrick(factors.to_vec())
        }))
    }

    /// Fail if more factors are declared than there are sub-bricks
    pub fn validate(&self, bricks: usize) -> Result<()> {
        match self {
            ScaleFactors::PerBrick(factors) if factors.len() > bricks => {
                Err(BrikError::FactorCountExceedsBricks {
                    factors: factors.len(),
                    bricks,
                })
            }
            _ => Ok(()),
        }
    }

    /// Factor to apply to sub-brick `t`
    ///
    /// Factors `<= 0` mean "not scaled" by AFNI convention and yield `None`.
    pub fn factor_for(&self, t: usize) -> Option<f64> {
        let factor = match self {
            ScaleFactors::Uniform(f) => *f,
            ScaleFactors::PerBrick(factors) => *factors.get(t)?,
        };
        (factor > 0.0).then_some(factor)
    }

    /// Whether any sub-brick among `bricks` is actually scaled
    pub fn is_effective(&self, bricks: usize) -> bool {
        (0..bricks).any(|t| self.factor_for(t).is_some())
    }

    /// Number of non-positive factors that will be skipped
    pub fn skipped(&self) -> usize {
        match self {
            ScaleFactors::Uniform(f) => usize::from(*f <= 0.0),
            ScaleFactors::PerBrick(factors) => factors.iter().filter(|&&f| f <= 0.0).count(),
        }
    }
}

/// Multiply each sub-brick by its factor into a new floating point buffer
///
/// The output element type is [`DataType::scaled`] of the input type.
pub fn apply(data: &VolumeData, factors: &ScaleFactors) -> VolumeData {
    let target = data.data_type().scaled();
    match data {
        VolumeData::U8(a) => promote(a, target, factors),
        VolumeData::I16(a) => promote(a, target, factors),
        VolumeData::I32(a) => promote(a, target, factors),
        VolumeData::F32(a) => promote(a, target, factors),
        VolumeData::F64(a) => promote(a, target, factors),
        VolumeData::Complex64(a) => VolumeData::Complex64(scale_complex(a, factors)),
    }
}

fn promote<T>(data: &Array4<T>, target: DataType, factors: &ScaleFactors) -> VolumeData
where
    T: AsPrimitive<f32> + AsPrimitive<f64>,
{
    if target == DataType::F64 {
        VolumeData::F64(scale_real(data, factors))
    } else {
        VolumeData::F32(scale_real(data, factors))
    }
}

fn scale_real<T, U>(data: &Array4<T>, factors: &ScaleFactors) -> Array4<U>
where
    T: AsPrimitive<U>,
    U: Float + 'static,
    f64: AsPrimitive<U>,
{
    let mut scaled = data.mapv(|v| v.as_());
    for (t, mut brick) in scaled.axis_iter_mut(Axis(3)).enumerate() {
        if let Some(factor) = factors.factor_for(t) {
            let factor: U = factor.as_();
            brick.mapv_inplace(|v| v * factor);
        }
    }
    scaled
}

fn scale_complex(data: &Array4<Complex64>, factors: &ScaleFactors) -> Array4<Complex64> {
    let mut scaled = data.clone();
    for (t, mut brick) in scaled.axis_iter_mut(Axis(3)).enumerate() {
        if let Some(factor) = factors.factor_for(t) {
            brick.mapv_inplace(|v| v * factor);
        }
    }
    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::AttributeValue;
    use crate::types::DataType;
    use ndarray::ShapeBuilder;

    fn shorts(values: Vec<i16>, shape: (usize, usize, usize, usize)) -> VolumeData {
        VolumeData::I16(Array4::from_shape_vec(shape.f(), values).unwrap())
    }

    #[test]
    fn test_from_header() {
        let mut header = Header::new();
        assert_eq!(ScaleFactors::from_header(&header).unwrap(), None);

        header.insert("BRICK_FLOAT_FACS", AttributeValue::FloatScalar(2.0));
        assert_eq!(
            ScaleFactors::from_header(&header).unwrap(),
            Some(ScaleFactors::Uniform(2.0))
        );

        header.insert("BRICK_FLOAT_FACS", AttributeValue::FloatSequence(vec![0.0, 3.0]));
        assert_eq!(
            ScaleFactors::from_header(&header).unwrap(),
            Some(ScaleFactors::PerBrick(vec![0.0, 3.0]))
        );

        header.insert("BRICK_FLOAT_FACS", AttributeValue::IntegerScalar(2));
        assert!(matches!(
            ScaleFactors::from_header(&header),
            Err(BrikError::AttributeTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_validate() {
        let factors = ScaleFactors::PerBrick(vec![1.0, 2.0, 3.0]);
        assert!(factors.validate(3).is_ok());
        assert!(matches!(
            factors.validate(2),
            Err(BrikError::FactorCountExceedsBricks { factors: 3, bricks: 2 })
        ));
        assert!(ScaleFactors::Uniform(2.0).validate(1).is_ok());
    }

    #[test]
    fn test_non_positive_factor_is_skipped() {
        let factors = ScaleFactors::PerBrick(vec![0.0, -1.0, 2.0]);
        assert_eq!(factors.factor_for(0), None);
        assert_eq!(factors.factor_for(1), None);
        assert_eq!(factors.factor_for(2), Some(2.0));
        assert_eq!(factors.factor_for(3), None);
        assert_eq!(factors.skipped(), 2);
        assert!(factors.is_effective(3));
        assert!(!factors.is_effective(2));
        assert!(!ScaleFactors::Uniform(0.0).is_effective(4));
    }

    #[test]
    fn test_uniform_promotes_and_scales() {
        let data = shorts(vec![1, 2, 3, 4], (2, 2, 1, 1));
        let scaled = apply(&data, &ScaleFactors::Uniform(2.0));
        assert_eq!(scaled.data_type(), DataType::F32);
        match scaled {
            VolumeData::F32(a) => assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec![2.0, 4.0, 6.0, 8.0]),
            other => panic!("unexpected data: {:?}", other.data_type()),
        }
        // source untouched
        assert_eq!(data.data_type(), DataType::I16);
    }

    #[test]
    fn test_per_brick_factors() {
        let data = shorts(vec![1, 2, 10, 20], (2, 1, 1, 2));
        let scaled = apply(&data, &ScaleFactors::PerBrick(vec![0.0, 0.5]));
        let VolumeData::F32(a) = scaled else {
            panic!("expected f32 data");
        };
        assert_eq!(a[[0, 0, 0, 0]], 1.0);
        assert_eq!(a[[1, 0, 0, 0]], 2.0);
        assert_eq!(a[[0, 0, 0, 1]], 5.0);
        assert_eq!(a[[1, 0, 0, 1]], 10.0);
    }

    #[test]
    fn test_int32_promotes_to_f64() {
        let data = VolumeData::I32(Array4::from_shape_vec((1, 1, 1, 1).f(), vec![i32::MAX]).unwrap());
        let scaled = apply(&data, &ScaleFactors::Uniform(1.0));
        let VolumeData::F64(a) = scaled else {
            panic!("expected f64 data");
        };
        assert_eq!(a[[0, 0, 0, 0]], i32::MAX as f64);
    }

    #[test]
    fn test_complex_scaled_by_real_factor() {
        let data = VolumeData::Complex64(
            Array4::from_shape_vec((1, 1, 1, 1).f(), vec![Complex64::new(1.0, -2.0)]).unwrap(),
        );
        let VolumeData::Complex64(a) = apply(&data, &ScaleFactors::Uniform(3.0)) else {
            panic!("expected complex data");
        };
        assert_eq!(a[[0, 0, 0, 0]], Complex64::new(3.0, -6.0));
    }
}

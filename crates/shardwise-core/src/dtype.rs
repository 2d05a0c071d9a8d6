//! Data Types - Shardwise Type System
//!
//! Defines the element types a tensor can be tagged with. Tensor payloads are
//! held as `f64`, and every value written into a tensor is first rounded to
//! what its `DType` can represent, so a `U8` tensor only ever holds integers
//! in `0..=255` and an `F16` tensor only values representable in half
//! precision.
//!
//! # Key Features
//! - Runtime dtype information via `DType` enum
//! - Half-precision (f16, bf16) rounding through the `half` crate
//! - Float promotion for integer inputs of float-valued ops
//! - Legacy tensor type names (`FloatTensor`, `LongTensor`, ...)
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use half::{bf16, f16};
use serde::{Deserialize, Serialize};

// =============================================================================
// DType Enum
// =============================================================================

/// Runtime representation of tensor data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 16-bit floating point (half precision).
    F16,
    /// 16-bit brain floating point.
    BF16,
    /// 32-bit floating point (single precision).
    F32,
    /// 64-bit floating point (double precision).
    F64,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 8-bit unsigned integer.
    U8,
    /// Boolean type.
    Bool,
}

impl DType {
    /// All supported data types.
    pub const ALL: [DType; 10] = [
        Self::F16,
        Self::BF16,
        Self::F32,
        Self::F64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::Bool,
    ];

    /// Returns the size in bytes of this data type.
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::Bool => 1,
            Self::F16 | Self::BF16 | Self::I16 => 2,
            Self::F32 | Self::I32 => 4,
            Self::F64 | Self::I64 => 8,
        }
    }

    /// Returns true if this is a floating point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32 | Self::F64)
    }

    /// Returns true if this is an integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8)
    }

    /// Returns true if this is the boolean type.
    #[must_use]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns true if this type can hold negative values.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        !matches!(self, Self::U8 | Self::Bool)
    }

    /// Returns the name of this data type as a string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::Bool => "bool",
        }
    }

    /// Returns the legacy tensor type name for this dtype.
    #[must_use]
    pub const fn tensor_type_name(self) -> &'static str {
        match self {
            Self::F16 => "HalfTensor",
            Self::BF16 => "BFloat16Tensor",
            Self::F32 => "FloatTensor",
            Self::F64 => "DoubleTensor",
            Self::I8 => "CharTensor",
            Self::I16 => "ShortTensor",
            Self::I32 => "IntTensor",
            Self::I64 => "LongTensor",
            Self::U8 => "ByteTensor",
            Self::Bool => "BoolTensor",
        }
    }

    /// Parses a dtype from either its short name (`f32`) or its legacy
    /// tensor type name (`FloatTensor`, optionally prefixed with a device
    /// namespace such as `cuda.`).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let bare = name.rsplit('.').next().unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|dtype| dtype.name() == bare || dtype.tensor_type_name() == bare)
    }

    /// Returns the default floating point type (f32).
    #[must_use]
    pub const fn default_float() -> Self {
        Self::F32
    }

    /// Returns the dtype a float-valued op produces for this input dtype.
    ///
    /// Floating point types are kept, integers and booleans promote to the
    /// default float type.
    #[must_use]
    pub const fn to_float(self) -> Self {
        if self.is_float() {
            self
        } else {
            Self::default_float()
        }
    }

    /// Largest finite value representable by this dtype.
    #[must_use]
    pub fn max_value(self) -> f64 {
        match self {
            Self::F16 => f16::MAX.to_f64(),
            Self::BF16 => bf16::MAX.to_f64(),
            Self::F32 => f64::from(f32::MAX),
            Self::F64 => f64::MAX,
            Self::I8 => f64::from(i8::MAX),
            Self::I16 => f64::from(i16::MAX),
            Self::I32 => f64::from(i32::MAX),
            Self::I64 => i64::MAX as f64,
            Self::U8 => f64::from(u8::MAX),
            Self::Bool => 1.0,
        }
    }

    /// Smallest finite value representable by this dtype.
    #[must_use]
    pub fn min_value(self) -> f64 {
        match self {
            Self::F16 => f16::MIN.to_f64(),
            Self::BF16 => bf16::MIN.to_f64(),
            Self::F32 => f64::from(f32::MIN),
            Self::F64 => f64::MIN,
            Self::I8 => f64::from(i8::MIN),
            Self::I16 => f64::from(i16::MIN),
            Self::I32 => f64::from(i32::MIN),
            Self::I64 => i64::MIN as f64,
            Self::U8 | Self::Bool => 0.0,
        }
    }

    /// Rounds a value to what this dtype can represent.
    ///
    /// Integer conversion truncates toward zero and saturates at the type
    /// bounds; NaN converts to zero. Booleans map every non-zero value to 1.
    #[must_use]
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            Self::F16 => f16::from_f64(value).to_f64(),
            Self::BF16 => bf16::from_f64(value).to_f64(),
            Self::F32 => f64::from(value as f32),
            Self::F64 => value,
            Self::I8 => f64::from(value as i8),
            Self::I16 => f64::from(value as i16),
            Self::I32 => f64::from(value as i32),
            Self::I64 => (value as i64) as f64,
            Self::U8 => f64::from(value as u8),
            Self::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl Default for DType {
    fn default() -> Self {
        Self::F32
    }
}

impl core::fmt::Display for DType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_properties() {
        assert!(DType::F32.is_float());
        assert!(DType::BF16.is_float());
        assert!(!DType::I32.is_float());
        assert!(DType::U8.is_integer());
        assert!(!DType::U8.is_signed());
        assert!(DType::Bool.is_bool());
        assert_eq!(DType::F16.size_of(), 2);
        assert_eq!(DType::I64.size_of(), 8);
    }

    #[test]
    fn test_quantize_integers() {
        assert_eq!(DType::I32.quantize(2.9), 2.0);
        assert_eq!(DType::I32.quantize(-2.9), -2.0);
        assert_eq!(DType::U8.quantize(300.0), 255.0);
        assert_eq!(DType::U8.quantize(-4.0), 0.0);
        assert_eq!(DType::I8.quantize(f64::NAN), 0.0);
    }

    #[test]
    fn test_quantize_bool() {
        assert_eq!(DType::Bool.quantize(-0.5), 1.0);
        assert_eq!(DType::Bool.quantize(0.0), 0.0);
        assert_eq!(DType::Bool.quantize(f64::NAN), 1.0);
    }

    #[test]
    fn test_quantize_half() {
        let x = DType::F16.quantize(0.1);
        assert!((x - 0.1).abs() < 1e-3);
        assert_ne!(x, 0.1);
        assert_eq!(DType::BF16.quantize(1.0), 1.0);
        assert!(DType::F16.quantize(1e6).is_infinite());
    }

    #[test]
    fn test_to_float() {
        assert_eq!(DType::I64.to_float(), DType::F32);
        assert_eq!(DType::Bool.to_float(), DType::F32);
        assert_eq!(DType::F64.to_float(), DType::F64);
        assert_eq!(DType::F16.to_float(), DType::F16);
    }

    #[test]
    fn test_parse() {
        assert_eq!(DType::parse("f32"), Some(DType::F32));
        assert_eq!(DType::parse("LongTensor"), Some(DType::I64));
        assert_eq!(DType::parse("cuda.HalfTensor"), Some(DType::F16));
        assert_eq!(DType::parse("complex64"), None);
    }

    #[test]
    fn test_dtype_display_and_serde() {
        assert_eq!(format!("{}", DType::BF16), "bf16");
        let json = serde_json::to_string(&DType::I16).unwrap();
        assert_eq!(json, "\"i16\"");
        let back: DType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DType::I16);
    }
}

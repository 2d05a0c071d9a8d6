//! Conversion Kernels
//!
//! Dtype casts (`half`, `long`, `to`, `type`, ...), device moves (`cpu`,
//! `cuda`) and the copy family (`clone`, `contiguous`, `detach`).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use shardwise_core::error::{Error, Result};
use shardwise_core::{DType, Device};

use crate::tensor::Tensor;
use crate::value::{Args, Value};

// =============================================================================
// Casts
// =============================================================================

/// Named cast methods and the dtype each produces.
pub const CASTS: [(&str, DType); 10] = [
    ("bfloat16", DType::BF16),
    ("half", DType::F16),
    ("float", DType::F32),
    ("double", DType::F64),
    ("bool", DType::Bool),
    ("byte", DType::U8),
    ("char", DType::I8),
    ("short", DType::I16),
    ("int", DType::I32),
    ("long", DType::I64),
];

/// Converts to `dtype`. Returns the input itself when it already has that
/// dtype.
#[must_use]
pub fn cast(x: &Tensor, dtype: DType) -> Value {
    x.cast(dtype).into()
}

/// Type name reported by `type()`, e.g. `FloatTensor` or
/// `cuda.HalfTensor`.
#[must_use]
pub fn type_name(x: &Tensor) -> String {
    let name = x.dtype().tensor_type_name();
    if x.device().is_gpu() {
        format!("cuda.{name}")
    } else {
        name.to_string()
    }
}

/// `type(dtype=None)`: without an argument returns the type name as a
/// string, otherwise casts.
pub fn type_(x: &Tensor, args: &Args) -> Result<Value> {
    match args.get(0, "dtype") {
        None => Ok(Value::Str(type_name(x))),
        Some(Value::Str(s)) => {
            let dtype = DType::parse(s).ok_or_else(|| {
                Error::invalid_argument("type", "dtype", format!("invalid type: '{s}'"))
            })?;
            let out = x.cast(dtype);
            if s.starts_with("cuda.") && !x.device().is_gpu() {
                Ok(out.to_device(Device::cuda(0)).into())
            } else if !s.contains('.') && x.device().is_gpu() {
                Ok(out.to_device(Device::Cpu).into())
            } else {
                Ok(out.into())
            }
        }
        Some(_) => {
            let dtype = args.opt_dtype("type", 0, "dtype")?.unwrap_or(x.dtype());
            Ok(x.cast(dtype).into())
        }
    }
}

/// `type_as(other)`: converts to the dtype and device of `other`.
pub fn type_as(x: &Tensor, args: &Args) -> Result<Value> {
    let Some(Value::Tensor(other)) = args.get(0, "other") else {
        return Err(match args.get(0, "other") {
            None => Error::missing_argument("type_as", "other"),
            Some(v) => Error::invalid_argument(
                "type_as",
                "other",
                format!("must be a tensor, not {}", v.kind()),
            ),
        });
    };
    Ok(x.cast(other.dtype()).to_device(other.device()).into())
}

// =============================================================================
// `to`
// =============================================================================

#[derive(Debug, Default)]
struct Target {
    dtype: Option<DType>,
    device: Option<Device>,
}

fn parse_target(op: &str, value: &Value, target: &mut Target) -> Result<()> {
    match value {
        Value::DType(dtype) => target.dtype = Some(*dtype),
        Value::Device(device) => target.device = Some(*device),
        Value::Tensor(other) => {
            target.dtype = Some(other.dtype());
            target.device = Some(other.device());
        }
        Value::Str(s) => {
            if let Some(device) = Device::parse(s) {
                target.device = Some(device);
            } else if let Some(dtype) = DType::parse(s) {
                target.dtype = Some(dtype);
            } else {
                return Err(Error::invalid_argument(
                    op,
                    "dtype",
                    format!("expected a dtype or device, got '{s}'"),
                ));
            }
        }
        other => {
            return Err(Error::invalid_argument(
                op,
                "dtype",
                format!("expected a dtype, device or tensor, got {}", other.kind()),
            ))
        }
    }
    Ok(())
}

/// `to(device=None, dtype=None, non_blocking=False, copy=False)`.
///
/// The first positional argument may be a dtype, a device, a device or
/// dtype name, or another tensor whose dtype and device are adopted. A
/// second positional dtype is accepted after a device. Without `copy` the
/// input itself is returned when nothing changes.
pub fn to(x: &Tensor, args: &Args) -> Result<Value> {
    let mut target = Target::default();
    let positional = args.positional();
    let mut flags_at = 0;
    for value in positional.iter().take(2) {
        if matches!(value, Value::Bool(_) | Value::None) {
            break;
        }
        parse_target("to", value, &mut target)?;
        flags_at += 1;
    }
    if let Some(value) = args.keyword().get("device").filter(|v| !v.is_none()) {
        parse_target("to", value, &mut target)?;
    }
    if let Some(dtype) = args.keyword().get("dtype").filter(|v| !v.is_none()) {
        parse_target("to", dtype, &mut target)?;
    }
    let copy = args.bool_or("to", flags_at + 1, "copy", false)?;

    let mut out = match target.dtype {
        Some(dtype) => x.cast(dtype),
        None => x.clone(),
    };
    if let Some(device) = target.device {
        out = out.to_device(device);
    }
    if copy && out.shares_data(x) {
        out = out.deep_clone();
    }
    Ok(out.into())
}

// =============================================================================
// Devices
// =============================================================================

/// `cpu()`.
pub fn cpu(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(x.to_device(Device::Cpu).into())
}

/// `cuda(device=None)`: moves to the given GPU, default index 0.
pub fn cuda(x: &Tensor, args: &Args) -> Result<Value> {
    let device = match args.get(0, "device") {
        None => Device::cuda(0),
        Some(Value::Device(device)) if device.is_gpu() => *device,
        Some(Value::Int(index)) if *index >= 0 => Device::cuda(*index as usize),
        Some(Value::Str(s)) => Device::parse(s).filter(|d| d.is_gpu()).ok_or_else(|| {
            Error::invalid_argument("cuda", "device", format!("invalid cuda device '{s}'"))
        })?,
        Some(other) => {
            return Err(Error::invalid_argument(
                "cuda",
                "device",
                format!("expected a cuda device, got {}", other.kind()),
            ))
        }
    };
    Ok(x.to_device(device).into())
}

// =============================================================================
// Copies
// =============================================================================

/// `clone()`: a copy with its own buffer.
pub fn clone(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(x.deep_clone().into())
}

/// `contiguous()`: tensors are always contiguous, so the input is returned.
pub fn contiguous(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(x.clone().into())
}

/// `detach()`: same data, no gradient tracking.
pub fn detach(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(x.clone().with_requires_grad(false).into())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor {
        Tensor::from_vec(vec![1.5, -2.25, 0.0], &[3]).unwrap()
    }

    fn tensor(value: Value) -> Tensor {
        value.into_tensor().unwrap()
    }

    #[test]
    fn test_named_casts() {
        for (name, dtype) in CASTS {
            let out = tensor(cast(&sample(), dtype));
            assert_eq!(out.dtype(), dtype, "{name}");
            assert_eq!(out.shape(), &[3]);
        }
        assert_eq!(tensor(cast(&sample(), DType::I64)).to_vec(), vec![1.0, -2.0, 0.0]);
        assert_eq!(
            tensor(cast(&sample(), DType::Bool)).to_bool_vec(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_type_without_args_is_a_string() {
        assert_eq!(type_(&sample(), &Args::new()).unwrap(), Value::from("FloatTensor"));
        let gpu = sample().to_device(Device::cuda(1));
        assert_eq!(
            type_(&gpu, &Args::new()).unwrap(),
            Value::from("cuda.FloatTensor")
        );
    }

    #[test]
    fn test_type_with_name_casts() {
        let out = tensor(type_(&sample(), &Args::new().arg("LongTensor")).unwrap());
        assert_eq!(out.dtype(), DType::I64);
        let out = tensor(type_(&sample(), &Args::new().arg(DType::F64)).unwrap());
        assert_eq!(out.dtype(), DType::F64);
        assert!(type_(&sample(), &Args::new().arg("NopeTensor")).is_err());
    }

    #[test]
    fn test_type_as() {
        let other = Tensor::from_vec_dtype(vec![1.0], &[1], DType::I32)
            .unwrap()
            .to_device(Device::cuda(0));
        let out = tensor(type_as(&sample(), &Args::new().arg(other)).unwrap());
        assert_eq!(out.dtype(), DType::I32);
        assert_eq!(out.device(), Device::cuda(0));
        assert!(type_as(&sample(), &Args::new()).is_err());
        assert!(type_as(&sample(), &Args::new().arg(1.0)).is_err());
    }

    #[test]
    fn test_to_variants() {
        let x = sample();
        let out = tensor(to(&x, &Args::new().arg(DType::F16)).unwrap());
        assert_eq!(out.dtype(), DType::F16);

        let out = tensor(to(&x, &Args::new().arg("cuda:1").arg(DType::F64)).unwrap());
        assert_eq!(out.device(), Device::cuda(1));
        assert_eq!(out.dtype(), DType::F64);

        let out = tensor(to(&x, &Args::new().kwarg("device", Device::cuda(0))).unwrap());
        assert_eq!(out.device(), Device::cuda(0));
        assert_eq!(out.dtype(), DType::F32);

        assert!(to(&x, &Args::new().arg(3.0)).is_err());
    }

    #[test]
    fn test_to_copy_flag() {
        let x = sample();
        let same = tensor(to(&x, &Args::new().arg(DType::F32)).unwrap());
        assert!(same.shares_data(&x));
        let copied = tensor(to(&x, &Args::new().arg(DType::F32).kwarg("copy", true)).unwrap());
        assert!(!copied.shares_data(&x));
        assert_eq!(copied, x);
    }

    #[test]
    fn test_device_moves() {
        let x = sample();
        let gpu = tensor(cuda(&x, &Args::new()).unwrap());
        assert_eq!(gpu.device(), Device::cuda(0));
        let gpu = tensor(cuda(&x, &Args::new().arg(2_i64)).unwrap());
        assert_eq!(gpu.device(), Device::cuda(2));
        assert_eq!(tensor(cpu(&gpu, &Args::new()).unwrap()).device(), Device::Cpu);
        assert!(cuda(&x, &Args::new().arg("cpu")).is_err());
    }

    #[test]
    fn test_copies() {
        let x = sample().with_requires_grad(true);
        let c = tensor(clone(&x, &Args::new()).unwrap());
        assert!(!c.shares_data(&x));
        assert!(c.requires_grad());
        let d = tensor(detach(&x, &Args::new()).unwrap());
        assert!(d.shares_data(&x));
        assert!(!d.requires_grad());
        assert_eq!(tensor(contiguous(&x, &Args::new()).unwrap()), x);
    }
}

//! Pointwise Kernels
//!
//! Element-wise math kernels: the float-valued unary functions, the
//! dtype-preserving rounding/sign family, parameterised ops such as `clamp`
//! and `pow`, binary ops with a broadcast second operand, and predicates.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use shardwise_core::error::{Error, Result};
use shardwise_core::DType;

use super::{bounded_operand, float_result, same_dtype};
use crate::tensor::Tensor;
use crate::value::{Args, Value};

// =============================================================================
// Dtype-preserving unary ops
// =============================================================================

/// `neg`/`negative`; booleans cannot be negated.
pub fn neg(x: &Tensor, _args: &Args) -> Result<Value> {
    if x.dtype().is_bool() {
        return Err(Error::dtype_not_supported("neg", x.dtype()));
    }
    Ok(same_dtype(x, |v| -v).into())
}

/// `sign`/`sgn`: -1, 0 or 1; NaN stays NaN.
pub fn sign(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(same_dtype(x, |v| {
        if v > 0.0 {
            1.0
        } else if v < 0.0 {
            -1.0
        } else {
            v
        }
    })
    .into())
}

/// `round(decimals=0)` with ties to even.
pub fn round(x: &Tensor, args: &Args) -> Result<Value> {
    let decimals = args.opt_i64("round", 0, "decimals")?.unwrap_or(0);
    let decimals = i32::try_from(decimals).map_err(|_| {
        Error::invalid_argument("round", "decimals", format!("{decimals} is out of range"))
    })?;
    if !x.dtype().is_float() {
        return Ok(x.clone().into());
    }
    if decimals == 0 {
        return Ok(same_dtype(x, f64::round_ties_even).into());
    }
    let scale = 10f64.powi(decimals);
    Ok(same_dtype(x, |v| (v * scale).round_ties_even() / scale).into())
}

// =============================================================================
// Parameterised ops
// =============================================================================

fn clamp_value(v: f64, lo: Option<f64>, hi: Option<f64>) -> f64 {
    if v.is_nan() {
        return v;
    }
    let mut out = v;
    if let Some(lo) = lo {
        out = if lo.is_nan() { lo } else { out.max(lo) };
    }
    if let Some(hi) = hi {
        out = if hi.is_nan() { hi } else { out.min(hi) };
    }
    out
}

fn clamp_impl(op: &str, x: &Tensor, lo: Option<Tensor>, hi: Option<Tensor>) -> Result<Tensor> {
    let dtype = x.dtype();
    match (lo, hi) {
        (None, None) => Err(Error::invalid_operation(format!(
            "{op}: At least one of 'min' or 'max' must not be None"
        ))),
        (Some(lo), None) => x.zip_with(&lo, dtype, |v, l| clamp_value(v, Some(l), None)),
        (None, Some(hi)) => x.zip_with(&hi, dtype, |v, h| clamp_value(v, None, Some(h))),
        (Some(lo), Some(hi)) => x
            .zip_with(&lo, dtype, |v, l| clamp_value(v, Some(l), None))?
            .zip_with(&hi, dtype, |v, h| clamp_value(v, None, Some(h))),
    }
}

/// `clamp(min=None, max=None)`, also registered as `clip`.
pub fn clamp(x: &Tensor, args: &Args) -> Result<Value> {
    let lo = bounded_operand(args, "clamp", 0, "min")?;
    let hi = bounded_operand(args, "clamp", 1, "max")?;
    Ok(clamp_impl("clamp", x, lo, hi)?.into())
}

/// `clamp_min(min)`.
pub fn clamp_min(x: &Tensor, args: &Args) -> Result<Value> {
    let lo = args.require_tensor("clamp_min", 0, "min")?;
    Ok(clamp_impl("clamp_min", x, Some(lo), None)?.into())
}

/// `clamp_max(max)`.
pub fn clamp_max(x: &Tensor, args: &Args) -> Result<Value> {
    let hi = args.require_tensor("clamp_max", 0, "max")?;
    Ok(clamp_impl("clamp_max", x, None, Some(hi))?.into())
}

/// `hardshrink(lambd=0.5)`.
pub fn hardshrink(x: &Tensor, args: &Args) -> Result<Value> {
    let lambd = args.f64_or("hardshrink", 0, "lambd", 0.5)?;
    Ok(same_dtype(x, |v| if v > lambd || v < -lambd { v } else { 0.0 }).into())
}

/// `logit(eps=None)`.
pub fn logit(x: &Tensor, args: &Args) -> Result<Value> {
    let eps = args.opt_f64("logit", 0, "eps")?;
    Ok(float_result(x, |v| {
        let z = match eps {
            Some(eps) if !v.is_nan() => v.clamp(eps, 1.0 - eps),
            _ => v,
        };
        (z / (1.0 - z)).ln()
    })
    .into())
}

/// `nan_to_num(nan=0.0, posinf=None, neginf=None)`.
///
/// Infinities default to the largest and smallest finite value of the
/// tensor's dtype.
pub fn nan_to_num(x: &Tensor, args: &Args) -> Result<Value> {
    let dtype = x.dtype();
    let nan = args.f64_or("nan_to_num", 0, "nan", 0.0)?;
    let posinf = args.f64_or("nan_to_num", 1, "posinf", dtype.max_value())?;
    let neginf = args.f64_or("nan_to_num", 2, "neginf", dtype.min_value())?;
    Ok(same_dtype(x, |v| {
        if v.is_nan() {
            nan
        } else if v == f64::INFINITY {
            posinf
        } else if v == f64::NEG_INFINITY {
            neginf
        } else {
            v
        }
    })
    .into())
}

// =============================================================================
// Binary ops
// =============================================================================

fn is_float_operand(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Float(_)) => true,
        Some(Value::Tensor(t)) => t.dtype().is_float(),
        _ => false,
    }
}

/// `pow(exponent)` with a scalar or broadcast tensor exponent.
pub fn pow(x: &Tensor, args: &Args) -> Result<Value> {
    let exponent = args.require_tensor("pow", 0, "exponent")?;
    let dtype = if x.dtype().is_float() || is_float_operand(args.get(0, "exponent")) {
        x.dtype().to_float()
    } else {
        x.dtype()
    };

    if !dtype.is_float() && exponent.data().iter().any(|&e| e < 0.0) {
        return Err(Error::invalid_operation(
            "Integers to negative integer powers are not allowed.",
        ));
    }

    Ok(x.zip_with(&exponent, dtype, f64::powf)?.into())
}

/// `float_power(exponent)`; always computes and returns double precision.
pub fn float_power(x: &Tensor, args: &Args) -> Result<Value> {
    let exponent = args.require_tensor("float_power", 0, "exponent")?;
    Ok(x.zip_with(&exponent, DType::F64, f64::powf)?.into())
}

/// `copysign(other)`.
pub fn copysign(x: &Tensor, args: &Args) -> Result<Value> {
    let other = args.require_tensor("copysign", 0, "other")?;
    Ok(x.zip_with(&other, x.dtype().to_float(), f64::copysign)?.into())
}

/// `heaviside(values)`: `values` where the input is zero, else the step.
pub fn heaviside(x: &Tensor, args: &Args) -> Result<Value> {
    let values = args.require_tensor("heaviside", 0, "values")?;
    if values.dtype() != x.dtype() && args.get(0, "values").and_then(Value::as_tensor).is_some() {
        return Err(Error::invalid_operation(format!(
            "heaviside is not yet implemented for tensors with different dtypes ({} and {})",
            x.dtype(),
            values.dtype()
        )));
    }
    Ok(x.zip_with(&values, x.dtype(), |v, h| {
        if v == 0.0 {
            h
        } else if v > 0.0 {
            1.0
        } else {
            0.0
        }
    })?
    .into())
}

// =============================================================================
// Predicates
// =============================================================================

/// Builds a predicate kernel result: a bool tensor shaped like the input.
fn predicate(x: &Tensor, f: impl Fn(f64) -> bool) -> Value {
    x.map(DType::Bool, |v| if f(v) { 1.0 } else { 0.0 }).into()
}

/// `isfinite`.
pub fn isfinite(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, f64::is_finite))
}

/// `isinf`.
pub fn isinf(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, f64::is_infinite))
}

/// `isposinf`.
pub fn isposinf(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, |v| v == f64::INFINITY))
}

/// `isneginf`.
pub fn isneginf(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, |v| v == f64::NEG_INFINITY))
}

/// `isnan`.
pub fn isnan(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, f64::is_nan))
}

/// `signbit`: true for negative values including `-0.0`.
pub fn signbit(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, f64::is_sign_negative))
}

/// `logical_not`.
pub fn logical_not(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(predicate(x, |v| v == 0.0))
}

/// `bitwise_not`: logical not for booleans, two's complement for integers.
pub fn bitwise_not(x: &Tensor, _args: &Args) -> Result<Value> {
    let dtype = x.dtype();
    if dtype.is_bool() {
        return Ok(x.map(dtype, |v| if v == 0.0 { 1.0 } else { 0.0 }).into());
    }
    if !dtype.is_integer() {
        return Err(Error::dtype_not_supported("bitwise_not", dtype));
    }
    Ok(x.map(dtype, |v| {
        let bits = !(v as i64);
        if dtype == DType::U8 {
            f64::from(bits as u8)
        } else {
            bits as f64
        }
    })
    .into())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t(values: &[f64]) -> Tensor {
        Tensor::from_vec(values.to_vec(), &[values.len()]).unwrap()
    }

    fn out(value: Result<Value>) -> Tensor {
        value.unwrap().into_tensor().unwrap()
    }

    #[test]
    fn test_neg_rejects_bool() {
        let b = Tensor::from_bools(&[true], &[1]).unwrap();
        assert!(neg(&b, &Args::new()).is_err());
        assert_eq!(out(neg(&t(&[1.0, -2.0]), &Args::new())).to_vec(), vec![-1.0, 2.0]);
    }

    #[test]
    fn test_sign_keeps_nan() {
        let r = out(sign(&t(&[-3.0, 0.0, 2.0, f64::NAN]), &Args::new()));
        assert_eq!(&r.to_vec()[..3], &[-1.0, 0.0, 1.0]);
        assert!(r.to_vec()[3].is_nan());
    }

    #[test]
    fn test_round_half_to_even() {
        let x = Tensor::from_vec_dtype(vec![0.5, 1.5, 2.5, -0.5], &[4], DType::F64).unwrap();
        assert_eq!(out(round(&x, &Args::new())).to_vec(), vec![0.0, 2.0, 2.0, -0.0]);

        let x = Tensor::from_vec_dtype(vec![1.2345], &[1], DType::F64).unwrap();
        let r = out(round(&x, &Args::new().kwarg("decimals", 2_i64)));
        assert!((r.to_vec()[0] - 1.23).abs() < 1e-12);
    }

    #[test]
    fn test_round_decimals_out_of_range() {
        let x = Tensor::from_vec_dtype(vec![1.2345], &[1], DType::F64).unwrap();
        let err = round(&x, &Args::new().kwarg("decimals", (1_i64 << 32) + 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == "decimals"));
    }

    #[test]
    fn test_clamp_variants() {
        let x = t(&[-2.0, 0.5, 3.0]);
        let r = out(clamp(&x, &Args::new().arg(-1.0).arg(1.0)));
        assert_eq!(r.to_vec(), vec![-1.0, 0.5, 1.0]);

        let r = out(clamp(&x, &Args::new().kwarg("max", 0.0)));
        assert_eq!(r.to_vec(), vec![-2.0, 0.0, 0.0]);

        let r = out(clamp_min(&x, &Args::new().arg(0.0)));
        assert_eq!(r.to_vec(), vec![0.0, 0.5, 3.0]);

        let r = out(clamp_max(&x, &Args::new().arg(0.0)));
        assert_eq!(r.to_vec(), vec![-2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clamp_requires_a_bound() {
        let err = clamp(&t(&[1.0]), &Args::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[test]
    fn test_clamp_min_greater_than_max() {
        let r = out(clamp(&t(&[0.0, 5.0]), &Args::new().arg(2.0).arg(1.0)));
        assert_eq!(r.to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_clamp_tensor_bounds() {
        let x = t(&[0.0, 5.0]);
        let lo = t(&[1.0, 2.0]);
        let r = out(clamp(&x, &Args::new().arg(lo)));
        assert_eq!(r.to_vec(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_pow_scalar_and_tensor() {
        let x = t(&[1.0, 2.0, 3.0]);
        assert_eq!(out(pow(&x, &Args::new().arg(2.0))).to_vec(), vec![1.0, 4.0, 9.0]);
        let e = t(&[0.0, 1.0, 2.0]);
        assert_eq!(out(pow(&x, &Args::new().arg(e))).to_vec(), vec![1.0, 2.0, 9.0]);
    }

    #[test]
    fn test_pow_integer_rules() {
        let x = Tensor::from_vec_dtype(vec![2.0, 3.0], &[2], DType::I64).unwrap();
        let r = out(pow(&x, &Args::new().arg(2_i64)));
        assert_eq!(r.dtype(), DType::I64);
        assert!(pow(&x, &Args::new().arg(-1_i64)).is_err());
        let r = out(pow(&x, &Args::new().arg(0.5)));
        assert_eq!(r.dtype(), DType::F32);
    }

    #[test]
    fn test_float_power_is_double() {
        let x = t(&[2.0]);
        let r = out(float_power(&x, &Args::new().arg(3_i64)));
        assert_eq!(r.dtype(), DType::F64);
        assert_eq!(r.to_vec(), vec![8.0]);
    }

    #[test]
    fn test_copysign_and_heaviside() {
        let x = t(&[1.0, -2.0, 0.0]);
        let r = out(copysign(&x, &Args::new().arg(-1.0)));
        assert_eq!(r.to_vec(), vec![-1.0, -2.0, -0.0]);

        let r = out(heaviside(&x, &Args::new().arg(t(&[0.5]))));
        assert_eq!(r.to_vec(), vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_heaviside_dtype_mismatch() {
        let x = t(&[1.0]);
        let values = Tensor::from_vec_dtype(vec![0.5], &[1], DType::F64).unwrap();
        assert!(heaviside(&x, &Args::new().arg(values)).is_err());
    }

    #[test]
    fn test_hardshrink() {
        let r = out(hardshrink(&t(&[-1.0, 0.3, 0.6]), &Args::new()));
        assert_eq!(r.to_vec(), vec![-1.0, 0.0, 0.6000000238418579]);
    }

    #[test]
    fn test_logit_eps() {
        let x = Tensor::from_vec_dtype(vec![0.0, 0.5], &[2], DType::F64).unwrap();
        let r = out(logit(&x, &Args::new()));
        assert_eq!(r.to_vec()[0], f64::NEG_INFINITY);
        assert_eq!(r.to_vec()[1], 0.0);

        let r = out(logit(&x, &Args::new().arg(0.25)));
        assert!((r.to_vec()[0] - (1.0_f64 / 3.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_nan_to_num_defaults() {
        let x = t(&[f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.0]);
        let r = out(nan_to_num(&x, &Args::new()));
        assert_eq!(
            r.to_vec(),
            vec![0.0, f64::from(f32::MAX), f64::from(f32::MIN), 1.0]
        );

        let r = out(nan_to_num(&x, &Args::new().arg(-1.0).kwarg("posinf", 9.0)));
        assert_eq!(r.to_vec()[0], -1.0);
        assert_eq!(r.to_vec()[1], 9.0);
    }

    #[test]
    fn test_predicates() {
        let x = t(&[1.0, f64::NAN, f64::INFINITY, -0.0]);
        let as_bools = |v: Result<Value>| out(v).to_bool_vec();
        assert_eq!(as_bools(isfinite(&x, &Args::new())), vec![true, false, false, true]);
        assert_eq!(as_bools(isnan(&x, &Args::new())), vec![false, true, false, false]);
        assert_eq!(as_bools(isposinf(&x, &Args::new())), vec![false, false, true, false]);
        assert_eq!(as_bools(signbit(&x, &Args::new())), vec![false, false, false, true]);
        assert_eq!(as_bools(logical_not(&x, &Args::new())), vec![false, false, false, true]);
        assert_eq!(out(isinf(&x, &Args::new())).dtype(), DType::Bool);
    }

    #[test]
    fn test_bitwise_not() {
        let x = Tensor::from_vec_dtype(vec![0.0, 5.0, -1.0], &[3], DType::I32).unwrap();
        assert_eq!(out(bitwise_not(&x, &Args::new())).to_vec(), vec![-1.0, -6.0, 0.0]);

        let x = Tensor::from_vec_dtype(vec![0.0, 255.0], &[2], DType::U8).unwrap();
        assert_eq!(out(bitwise_not(&x, &Args::new())).to_vec(), vec![255.0, 0.0]);

        let b = Tensor::from_bools(&[true, false], &[2]).unwrap();
        assert_eq!(out(bitwise_not(&b, &Args::new())).to_bool_vec(), vec![false, true]);

        assert!(bitwise_not(&t(&[1.0]), &Args::new()).is_err());
    }
}

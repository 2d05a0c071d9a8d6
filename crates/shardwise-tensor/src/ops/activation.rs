//! Activation Kernels - `nn.functional` Activations
//!
//! Stateless activation functions and the softmax family. Every kernel
//! takes its hyper-parameters from `Args` with the conventional defaults.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::f64::consts::{PI, SQRT_2};

use shardwise_core::error::{Error, Result};
use shardwise_core::DType;

use super::reduce::map_lanes;
use super::special::{self, erf};
use super::{float_result, implicit_softmax_dim, same_dtype};
use crate::random;
use crate::shape::{normalize_dim, split_at_dim};
use crate::tensor::Tensor;
use crate::value::{Args, Value};

const SELU_ALPHA: f64 = 1.673_263_242_354_377_284_817_042_991_671_7;
const SELU_SCALE: f64 = 1.050_700_987_355_480_493_419_334_985_294_6;

// =============================================================================
// Rectifiers
// =============================================================================

/// `threshold(threshold, value)`: keeps `x` where `x > threshold`,
/// otherwise writes `value`.
pub fn threshold(x: &Tensor, args: &Args) -> Result<Value> {
    let th = args.require_f64("threshold", 0, "threshold")?;
    let value = args.require_f64("threshold", 1, "value")?;
    Ok(same_dtype(x, |v| if v <= th { value } else { v }).into())
}

/// `relu()`. NaN propagates.
pub fn relu(x: &Tensor, _args: &Args) -> Result<Value> {
    if x.dtype().is_bool() {
        return Err(Error::dtype_not_supported("relu", x.dtype()));
    }
    Ok(same_dtype(x, |v| if v <= 0.0 { 0.0 } else { v }).into())
}

fn clamp_nan(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        v
    } else {
        v.max(lo).min(hi)
    }
}

/// `hardtanh(min_val=-1.0, max_val=1.0)`.
pub fn hardtanh(x: &Tensor, args: &Args) -> Result<Value> {
    let lo = args.f64_or("hardtanh", 0, "min_val", -1.0)?;
    let hi = args.f64_or("hardtanh", 1, "max_val", 1.0)?;
    if lo > hi {
        return Err(Error::invalid_argument(
            "hardtanh",
            "max_val",
            format!("must be greater than or equal to min_val ({lo} > {hi})"),
        ));
    }
    Ok(same_dtype(x, |v| clamp_nan(v, lo, hi)).into())
}

/// `relu6()`.
pub fn relu6(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(same_dtype(x, |v| clamp_nan(v, 0.0, 6.0)).into())
}

/// `leaky_relu(negative_slope=0.01)`.
pub fn leaky_relu(x: &Tensor, args: &Args) -> Result<Value> {
    let slope = args.f64_or("leaky_relu", 0, "negative_slope", 0.01)?;
    Ok(float_result(x, |v| if v > 0.0 { v } else { v * slope }).into())
}

/// `prelu(weight)`: a learned slope per channel, or one shared slope.
///
/// The channel dimension is 1 for inputs with two or more dimensions.
pub fn prelu(x: &Tensor, args: &Args) -> Result<Value> {
    let weight = args.require_tensor("prelu", 0, "weight")?;
    let channels = if x.ndim() >= 2 { x.shape()[1] } else { x.shape().first().copied().unwrap_or(1) };
    let slopes = weight.data();

    if slopes.len() == 1 {
        let slope = slopes[0];
        return Ok(float_result(x, |v| if v > 0.0 { v } else { v * slope }).into());
    }
    if slopes.len() != channels {
        return Err(Error::invalid_argument(
            "prelu",
            "weight",
            format!(
                "has {} elements but the input has {channels} channels",
                slopes.len()
            ),
        ));
    }

    let channel_dim = usize::from(x.ndim() >= 2);
    let (_, size, inner) = split_at_dim(x.shape(), channel_dim);
    let values = x
        .data()
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let slope = slopes[(i / inner) % size];
            if v > 0.0 {
                v
            } else {
                v * slope
            }
        })
        .collect();
    Ok(x.with_values(values, x.dtype().to_float())?.into())
}

/// `rrelu(lower=1/8, upper=1/3, training=False)`.
///
/// In training mode each negative element gets a slope drawn uniformly from
/// `[lower, upper]`; otherwise the slope is their mean.
pub fn rrelu(x: &Tensor, args: &Args) -> Result<Value> {
    let lower = args.f64_or("rrelu", 0, "lower", 1.0 / 8.0)?;
    let upper = args.f64_or("rrelu", 1, "upper", 1.0 / 3.0)?;
    let training = args.bool_or("rrelu", 2, "training", false)?;
    if lower > upper {
        return Err(Error::invalid_argument(
            "rrelu",
            "upper",
            format!("must be greater than or equal to lower ({lower} > {upper})"),
        ));
    }

    if !training {
        let slope = (lower + upper) / 2.0;
        return Ok(float_result(x, |v| if v >= 0.0 { v } else { v * slope }).into());
    }

    let draws = random::uniform(x.numel());
    let values = x
        .data()
        .iter()
        .zip(draws)
        .map(|(&v, u)| if v >= 0.0 { v } else { v * (lower + u * (upper - lower)) })
        .collect();
    Ok(x.with_values(values, x.dtype().to_float())?.into())
}

// =============================================================================
// Exponential family
// =============================================================================

/// `elu(alpha=1.0)`.
pub fn elu(x: &Tensor, args: &Args) -> Result<Value> {
    let alpha = args.f64_or("elu", 0, "alpha", 1.0)?;
    Ok(float_result(x, |v| if v > 0.0 { v } else { alpha * v.exp_m1() }).into())
}

/// `selu()`.
pub fn selu(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| {
        SELU_SCALE * if v > 0.0 { v } else { SELU_ALPHA * v.exp_m1() }
    })
    .into())
}

/// `celu(alpha=1.0)`; `alpha` must be non-zero.
pub fn celu(x: &Tensor, args: &Args) -> Result<Value> {
    let alpha = args.f64_or("celu", 0, "alpha", 1.0)?;
    if alpha == 0.0 {
        return Err(Error::invalid_argument("celu", "alpha", "must not be zero"));
    }
    Ok(float_result(x, |v| v.max(0.0) + (alpha * (v / alpha).exp_m1()).min(0.0)).into())
}

/// `gelu(approximate='none')`; `approximate` may also be `'tanh'`.
pub fn gelu(x: &Tensor, args: &Args) -> Result<Value> {
    match args.opt_str("gelu", 0, "approximate")?.unwrap_or("none") {
        "none" => Ok(float_result(x, |v| 0.5 * v * (1.0 + erf(v / SQRT_2))).into()),
        "tanh" => {
            let k = (2.0 / PI).sqrt();
            Ok(float_result(x, |v| {
                0.5 * v * (1.0 + (k * (v + 0.044_715 * v * v * v)).tanh())
            })
            .into())
        }
        other => Err(Error::invalid_argument(
            "gelu",
            "approximate",
            format!("must be 'none' or 'tanh', got '{other}'"),
        )),
    }
}

/// `softplus(beta=1.0, threshold=20.0)`: reverts to the identity where
/// `x * beta > threshold`.
pub fn softplus(x: &Tensor, args: &Args) -> Result<Value> {
    let beta = args.f64_or("softplus", 0, "beta", 1.0)?;
    let th = args.f64_or("softplus", 1, "threshold", 20.0)?;
    Ok(float_result(x, |v| {
        if v * beta > th {
            v
        } else {
            special::softplus(v * beta) / beta
        }
    })
    .into())
}

/// `logsigmoid()`.
pub fn logsigmoid(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| -special::softplus(-v)).into())
}

/// `sigmoid()`.
pub fn sigmoid(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, special::sigmoid).into())
}

/// `tanh()`.
pub fn tanh(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, f64::tanh).into())
}

/// `silu()`: `x * sigmoid(x)`.
pub fn silu(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| v * special::sigmoid(v)).into())
}

/// `mish()`: `x * tanh(softplus(x))`.
pub fn mish(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| v * special::softplus(v).tanh()).into())
}

// =============================================================================
// Piecewise-linear family
// =============================================================================

/// `hardsigmoid()`.
pub fn hardsigmoid(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| clamp_nan(v + 3.0, 0.0, 6.0) / 6.0).into())
}

/// `hardswish()`.
pub fn hardswish(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| v * clamp_nan(v + 3.0, 0.0, 6.0) / 6.0).into())
}

/// `tanhshrink()`: `x - tanh(x)`.
pub fn tanhshrink(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| v - v.tanh()).into())
}

/// `softsign()`: `x / (1 + |x|)`.
pub fn softsign(x: &Tensor, _args: &Args) -> Result<Value> {
    Ok(float_result(x, |v| v / (1.0 + v.abs())).into())
}

/// `softshrink(lambd=0.5)`; `lambd` must be non-negative.
pub fn softshrink(x: &Tensor, args: &Args) -> Result<Value> {
    let lambd = args.f64_or("softshrink", 0, "lambd", 0.5)?;
    if lambd < 0.0 {
        return Err(Error::invalid_argument(
            "softshrink",
            "lambd",
            format!("must be non-negative, got {lambd}"),
        ));
    }
    Ok(float_result(x, |v| {
        if v > lambd {
            v - lambd
        } else if v < -lambd {
            v + lambd
        } else {
            0.0
        }
    })
    .into())
}

// =============================================================================
// Softmax family
// =============================================================================

fn softmax_lane(lane: &mut [f64]) {
    let max = lane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in lane.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in lane.iter_mut() {
        *v /= sum;
    }
}

fn log_softmax_lane(lane: &mut [f64]) {
    let max = lane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let log_sum = lane.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
    for v in lane.iter_mut() {
        *v = *v - max - log_sum;
    }
}

/// Shared `(dim=None, _stacklevel=3, dtype=None)` handling: returns the
/// input values, the resolved dim and the output dtype.
fn softmax_setup(op: &str, x: &Tensor, args: &Args) -> Result<(Vec<f64>, usize, DType)> {
    let dim = args
        .opt_i64(op, 0, "dim")?
        .unwrap_or_else(|| implicit_softmax_dim(x.ndim()));
    let dim = normalize_dim(dim, x.ndim())?;
    let dtype = match args.opt_dtype(op, 2, "dtype")? {
        Some(dtype) => dtype,
        None if x.dtype().is_float() => x.dtype(),
        None => return Err(Error::dtype_not_supported(op, x.dtype())),
    };
    let values = x.cast(dtype).to_vec();
    Ok((values, dim, dtype))
}

fn softmax_with(op: &str, x: &Tensor, args: &Args, negate: bool, lane_fn: fn(&mut [f64])) -> Result<Value> {
    let (mut values, dim, dtype) = softmax_setup(op, x, args)?;
    if negate {
        for v in &mut values {
            *v = -*v;
        }
    }
    map_lanes(&mut values, x.shape(), dim, lane_fn);
    Ok(x.with_values(values, dtype)?.into())
}

/// `softmax(dim=None, _stacklevel=3, dtype=None)`.
pub fn softmax(x: &Tensor, args: &Args) -> Result<Value> {
    softmax_with("softmax", x, args, false, softmax_lane)
}

/// `softmin(dim=None, _stacklevel=3, dtype=None)`: softmax of `-x`.
pub fn softmin(x: &Tensor, args: &Args) -> Result<Value> {
    softmax_with("softmin", x, args, true, softmax_lane)
}

/// `log_softmax(dim=None, _stacklevel=3, dtype=None)`.
pub fn log_softmax(x: &Tensor, args: &Args) -> Result<Value> {
    softmax_with("log_softmax", x, args, false, log_softmax_lane)
}

/// `gumbel_softmax(tau=1, hard=False, eps=1e-10, dim=-1)`.
///
/// Adds Gumbel noise to the logits and applies a softmax with temperature
/// `tau`. With `hard` the result is the one-hot of each lane's maximum.
/// `eps` is accepted and ignored.
pub fn gumbel_softmax(x: &Tensor, args: &Args) -> Result<Value> {
    let tau = args.f64_or("gumbel_softmax", 0, "tau", 1.0)?;
    let hard = args.bool_or("gumbel_softmax", 1, "hard", false)?;
    let dim = args.opt_i64("gumbel_softmax", 3, "dim")?.unwrap_or(-1);
    let dim = normalize_dim(dim, x.ndim())?;
    if !x.dtype().is_float() {
        return Err(Error::dtype_not_supported("gumbel_softmax", x.dtype()));
    }

    let noise = random::uniform(x.numel());
    let mut values: Vec<f64> = x
        .data()
        .iter()
        .zip(noise)
        .map(|(&v, u)| {
            let gumbel = -(-(1.0 - u).ln()).ln();
            (v + gumbel) / tau
        })
        .collect();

    map_lanes(&mut values, x.shape(), dim, |lane| {
        softmax_lane(lane);
        if hard {
            let argmax = lane
                .iter()
                .enumerate()
                .fold(0, |best, (i, &v)| if v > lane[best] { i } else { best });
            for (i, v) in lane.iter_mut().enumerate() {
                *v = if i == argmax { 1.0 } else { 0.0 };
            }
        }
    });
    Ok(x.with_values(values, x.dtype())?.into())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t(values: &[f64]) -> Tensor {
        Tensor::from_vec_dtype(values.to_vec(), &[values.len()], DType::F64).unwrap()
    }

    fn run(kernel: fn(&Tensor, &Args) -> Result<Value>, x: &Tensor, args: Args) -> Vec<f64> {
        kernel(x, &args).unwrap().into_tensor().unwrap().to_vec()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_relu() {
        assert_eq!(run(relu, &t(&[-1.0, 0.0, 2.0]), Args::new()), vec![0.0, 0.0, 2.0]);
        assert!(run(relu, &t(&[f64::NAN]), Args::new())[0].is_nan());
        let ints = Tensor::from_vec_dtype(vec![-3.0, 4.0], &[2], DType::I64).unwrap();
        let out = relu(&ints, &Args::new()).unwrap().into_tensor().unwrap();
        assert_eq!(out.dtype(), DType::I64);
        assert_eq!(out.to_vec(), vec![0.0, 4.0]);
    }

    #[test]
    fn test_threshold_requires_both_arguments() {
        let x = t(&[0.5, 1.0, 2.0]);
        assert_eq!(
            run(threshold, &x, Args::new().arg(1.0).arg(-5.0)),
            vec![-5.0, -5.0, 2.0]
        );
        let err = threshold(&x, &Args::new().arg(1.0)).unwrap_err();
        assert_eq!(err, Error::missing_argument("threshold", "value"));
    }

    #[test]
    fn test_hardtanh_and_relu6() {
        let x = t(&[-3.0, 0.5, 8.0]);
        assert_eq!(run(hardtanh, &x, Args::new()), vec![-1.0, 0.5, 1.0]);
        assert_eq!(
            run(hardtanh, &x, Args::new().kwarg("min_val", 0.0).kwarg("max_val", 2.0)),
            vec![0.0, 0.5, 2.0]
        );
        assert!(hardtanh(&x, &Args::new().arg(2.0).arg(1.0)).is_err());
        assert_eq!(run(relu6, &x, Args::new()), vec![0.0, 0.5, 6.0]);
    }

    #[test]
    fn test_exponential_family() {
        let x = t(&[-1.0, 0.0, 2.0]);
        let e = (-1.0f64).exp_m1();
        assert_close(&run(elu, &x, Args::new()), &[e, 0.0, 2.0]);
        assert_close(&run(elu, &x, Args::new().arg(2.0)), &[2.0 * e, 0.0, 2.0]);
        assert_close(
            &run(selu, &x, Args::new()),
            &[SELU_SCALE * SELU_ALPHA * e, 0.0, SELU_SCALE * 2.0],
        );
        assert_close(&run(celu, &x, Args::new()), &[e, 0.0, 2.0]);
        assert!(celu(&x, &Args::new().arg(0.0)).is_err());
    }

    #[test]
    fn test_leaky_and_parametric_relu() {
        let x = t(&[-2.0, 3.0]);
        assert_close(&run(leaky_relu, &x, Args::new()), &[-0.02, 3.0]);
        assert_close(&run(leaky_relu, &x, Args::new().arg(0.5)), &[-1.0, 3.0]);

        let x = Tensor::from_vec_dtype(vec![-1.0, -1.0, -1.0, -1.0], &[1, 2, 2], DType::F64).unwrap();
        let w = t(&[0.1, 0.2]);
        assert_close(&run(prelu, &x, Args::new().arg(w)), &[-0.1, -0.1, -0.2, -0.2]);
        assert_close(&run(prelu, &x, Args::new().arg(t(&[0.5]))), &[-0.5; 4]);
        assert!(prelu(&x, &Args::new().arg(t(&[0.1, 0.2, 0.3]))).is_err());
    }

    #[test]
    fn test_rrelu() {
        let x = t(&[-3.0, 1.0]);
        let mean = (1.0 / 8.0 + 1.0 / 3.0) / 2.0;
        assert_close(&run(rrelu, &x, Args::new()), &[-3.0 * mean, 1.0]);

        let out = run(rrelu, &x, Args::new().arg(0.1).arg(0.2).arg(true));
        assert!(out[0] <= -0.3 + 1e-12 && out[0] >= -0.6 - 1e-12);
        assert_eq!(out[1], 1.0);
    }

    #[test]
    fn test_gelu_variants() {
        let x = t(&[0.0, 1.0]);
        assert_close(&run(gelu, &x, Args::new()), &[0.0, 0.841_344_746_068_542_9]);
        let approx = run(gelu, &x, Args::new().kwarg("approximate", "tanh"));
        assert!((approx[1] - 0.841_192).abs() < 1e-5);
        assert!(gelu(&x, &Args::new().arg("fast")).is_err());
    }

    #[test]
    fn test_smooth_activations() {
        let x = t(&[0.0]);
        assert_close(&run(softplus, &x, Args::new()), &[2f64.ln()]);
        assert_close(&run(logsigmoid, &x, Args::new()), &[-(2f64.ln())]);
        assert_close(&run(sigmoid, &x, Args::new()), &[0.5]);
        assert_close(&run(silu, &t(&[2.0]), Args::new()), &[2.0 * special::sigmoid(2.0)]);
        assert_close(&run(mish, &x, Args::new()), &[0.0]);
        assert_close(&run(tanh, &x, Args::new()), &[0.0]);
        // Above the threshold softplus is the identity.
        assert_close(&run(softplus, &t(&[30.0]), Args::new()), &[30.0]);
    }

    #[test]
    fn test_piecewise_activations() {
        let x = t(&[-4.0, 0.0, 4.0]);
        assert_close(&run(hardsigmoid, &x, Args::new()), &[0.0, 0.5, 1.0]);
        assert_close(&run(hardswish, &x, Args::new()), &[0.0, 0.0, 4.0]);
        assert_close(&run(softsign, &x, Args::new()), &[-0.8, 0.0, 0.8]);
        assert_close(&run(tanhshrink, &x, Args::new()), &[-4.0 + 4f64.tanh(), 0.0, 4.0 - 4f64.tanh()]);
        assert_close(&run(softshrink, &t(&[-1.0, 0.2, 1.0]), Args::new()), &[-0.5, 0.0, 0.5]);
        assert!(softshrink(&x, &Args::new().arg(-0.1)).is_err());
    }

    #[test]
    fn test_softmax_family() {
        let x = Tensor::from_vec_dtype(vec![1.0, 2.0, 3.0, 1.0, 1.0, 1.0], &[2, 3], DType::F64).unwrap();
        let out = run(softmax, &x, Args::new());
        let row: f64 = out[..3].iter().sum();
        assert!((row - 1.0).abs() < 1e-12);
        assert_close(&out[3..], &[1.0 / 3.0; 3]);

        let cols = run(softmax, &x, Args::new().arg(0_i64));
        assert_close(&[cols[2] + cols[5]], &[1.0]);

        let logs = run(log_softmax, &x, Args::new());
        assert_close(&logs, &out.iter().map(|v| v.ln()).collect::<Vec<_>>());

        let mins = run(softmin, &x, Args::new().kwarg("dim", 1_i64));
        assert!(mins[0] > mins[1] && mins[1] > mins[2]);
    }

    #[test]
    fn test_softmax_dtype_argument() {
        let ints = Tensor::from_vec_dtype(vec![0.0, 0.0], &[2], DType::I64).unwrap();
        assert!(softmax(&ints, &Args::new()).is_err());
        let out = softmax(&ints, &Args::new().kwarg("dtype", DType::F64))
            .unwrap()
            .into_tensor()
            .unwrap();
        assert_eq!(out.dtype(), DType::F64);
        assert_close(&out.to_vec(), &[0.5, 0.5]);
    }

    #[test]
    fn test_gumbel_softmax() {
        let x = Tensor::from_vec_dtype(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], &[2, 3], DType::F64).unwrap();
        let soft = run(gumbel_softmax, &x, Args::new());
        assert!((soft[..3].iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((soft[3..].iter().sum::<f64>() - 1.0).abs() < 1e-9);

        let hard = run(gumbel_softmax, &x, Args::new().kwarg("hard", true));
        assert_eq!(hard.iter().filter(|&&v| v == 1.0).count(), 2);
        assert_eq!(hard.iter().filter(|&&v| v == 0.0).count(), 4);
    }
}

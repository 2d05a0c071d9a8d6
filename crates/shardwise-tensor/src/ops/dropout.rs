//! Random Kernels - Dropout and Bernoulli Sampling
//!
//! Kernels whose output depends on the process-wide generator in
//! [`crate::random`]. `inplace=True` is accepted and still produces a new
//! tensor.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use shardwise_core::error::{Error, Result};

use crate::random;
use crate::tensor::Tensor;
use crate::value::{Args, Value};

/// Self-normalizing constants shared by the alpha dropout variants.
const ALPHA: f64 = 1.758_099_340_847_376_6;

// =============================================================================
// Helpers
// =============================================================================

fn probability(op: &str, args: &Args, default: f64) -> Result<f64> {
    let p = args.f64_or(op, 0, "p", default)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::invalid_argument(
            op,
            "p",
            format!("dropout probability has to be between 0 and 1, but got {p}"),
        ));
    }
    Ok(p)
}

fn require_float(op: &str, x: &Tensor) -> Result<()> {
    if x.dtype().is_float() {
        Ok(())
    } else {
        Err(Error::dtype_not_supported(op, x.dtype()))
    }
}

/// Draws one keep decision per group of `group` consecutive elements.
fn keep_mask(numel: usize, group: usize, p: f64) -> Vec<bool> {
    let groups = if group == 0 { 0 } else { numel / group };
    let draws = random::uniform(groups);
    (0..numel).map(|i| draws[i / group] >= p).collect()
}

/// Shared alpha dropout body; `group` is the number of elements sharing
/// one keep decision.
fn alpha_dropout_impl(op: &str, x: &Tensor, args: &Args, group: usize) -> Result<Value> {
    let p = probability(op, args, 0.5)?;
    let training = args.bool_or(op, 1, "training", false)?;
    require_float(op, x)?;
    if !training || p == 0.0 || x.is_empty() {
        return Ok(x.clone().into());
    }
    if p == 1.0 {
        return Ok(x.map(x.dtype(), |_| 0.0).into());
    }

    let a = 1.0 / ((ALPHA * ALPHA * p + 1.0) * (1.0 - p)).sqrt();
    let b = ALPHA * a * p;
    let keep = keep_mask(x.numel(), group, p);
    let values = x
        .data()
        .iter()
        .zip(keep)
        .map(|(&v, keep)| {
            let k = if keep { 1.0 } else { 0.0 };
            v * k * a + ((k - 1.0) * ALPHA * a + b)
        })
        .collect();
    Ok(x.with_values(values, x.dtype())?.into())
}

// =============================================================================
// Kernels
// =============================================================================

/// `bernoulli(p=None)`: draws 0/1 samples. Without `p` the input values are
/// the probabilities and must lie in `[0, 1]`.
pub fn bernoulli(x: &Tensor, args: &Args) -> Result<Value> {
    require_float("bernoulli", x)?;
    let fixed = args.opt_f64("bernoulli", 0, "p")?;
    if let Some(p) = fixed {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::invalid_argument(
                "bernoulli",
                "p",
                format!("expected 0 <= p <= 1, but got {p}"),
            ));
        }
    } else if x.data().iter().any(|v| !(0.0..=1.0).contains(v)) {
        return Err(Error::invalid_operation(
            "bernoulli: all elements of input should be between 0 and 1",
        ));
    }

    let draws = random::uniform(x.numel());
    let values = x
        .data()
        .iter()
        .zip(draws)
        .map(|(&v, u)| {
            let p = fixed.unwrap_or(v);
            if u < p {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    Ok(x.with_values(values, x.dtype())?.into())
}

/// `dropout(p=0.5, training=True, inplace=False)`: zeroes elements with
/// probability `p` and scales survivors by `1 / (1 - p)`.
pub fn dropout(x: &Tensor, args: &Args) -> Result<Value> {
    let p = probability("dropout", args, 0.5)?;
    let training = args.bool_or("dropout", 1, "training", true)?;
    require_float("dropout", x)?;
    if !training || p == 0.0 || x.is_empty() {
        return Ok(x.clone().into());
    }
    if p == 1.0 {
        return Ok(x.map(x.dtype(), |_| 0.0).into());
    }

    let scale = 1.0 / (1.0 - p);
    let keep = keep_mask(x.numel(), 1, p);
    let values = x
        .data()
        .iter()
        .zip(keep)
        .map(|(&v, keep)| if keep { v * scale } else { 0.0 })
        .collect();
    Ok(x.with_values(values, x.dtype())?.into())
}

/// `alpha_dropout(p=0.5, training=False, inplace=False)`: dropout that
/// keeps the mean and variance of self-normalizing activations.
pub fn alpha_dropout(x: &Tensor, args: &Args) -> Result<Value> {
    alpha_dropout_impl("alpha_dropout", x, args, 1)
}

/// `feature_alpha_dropout(p=0.5, training=False, inplace=False)`: alpha
/// dropout that drops whole channels. Needs at least two dimensions.
pub fn feature_alpha_dropout(x: &Tensor, args: &Args) -> Result<Value> {
    if x.ndim() < 2 {
        return Err(Error::invalid_operation(format!(
            "feature_alpha_dropout: expected an input with at least 2 dimensions, got {}",
            x.ndim()
        )));
    }
    let group = x.shape()[2..].iter().product();
    alpha_dropout_impl("feature_alpha_dropout", x, args, group)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shardwise_core::DType;

    fn ones(shape: &[usize]) -> Tensor {
        let n = shape.iter().product();
        Tensor::from_vec_dtype(vec![1.0; n], shape, DType::F64).unwrap()
    }

    fn values(v: Value) -> Vec<f64> {
        v.into_tensor().unwrap().to_vec()
    }

    #[test]
    fn test_bernoulli_fixed_probability() {
        let x = ones(&[64]);
        assert!(values(bernoulli(&x, &Args::new().arg(1.0)).unwrap())
            .iter()
            .all(|&v| v == 1.0));
        assert!(values(bernoulli(&x, &Args::new().kwarg("p", 0.0)).unwrap())
            .iter()
            .all(|&v| v == 0.0));
        assert!(bernoulli(&x, &Args::new().arg(1.5)).is_err());
    }

    #[test]
    fn test_bernoulli_input_probabilities() {
        let x = Tensor::from_vec_dtype(vec![0.0, 1.0, 0.0, 1.0], &[4], DType::F32).unwrap();
        let out = bernoulli(&x, &Args::new()).unwrap().into_tensor().unwrap();
        assert_eq!(out.dtype(), DType::F32);
        assert_eq!(out.to_vec(), vec![0.0, 1.0, 0.0, 1.0]);

        let bad = Tensor::from_vec(vec![0.5, 2.0], &[2]).unwrap();
        assert!(bernoulli(&bad, &Args::new()).is_err());
    }

    #[test]
    fn test_dropout_scaling() {
        let x = ones(&[256]);
        let out = values(dropout(&x, &Args::new().arg(0.5)).unwrap());
        assert!(out.iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(out.iter().any(|&v| v == 2.0));
    }

    #[test]
    fn test_dropout_edges() {
        let x = ones(&[8]);
        assert_eq!(values(dropout(&x, &Args::new().arg(1.0)).unwrap()), vec![0.0; 8]);
        assert_eq!(values(dropout(&x, &Args::new().arg(0.0)).unwrap()), vec![1.0; 8]);
        assert_eq!(
            values(dropout(&x, &Args::new().arg(0.9).kwarg("training", false)).unwrap()),
            vec![1.0; 8]
        );
        assert!(dropout(&x, &Args::new().arg(-0.1)).is_err());
        let ints = Tensor::from_vec_dtype(vec![1.0], &[1], DType::I64).unwrap();
        assert!(dropout(&ints, &Args::new()).is_err());
    }

    #[test]
    fn test_alpha_dropout_eval_is_identity() {
        let x = ones(&[4]);
        assert_eq!(values(alpha_dropout(&x, &Args::new()).unwrap()), vec![1.0; 4]);
    }

    #[test]
    fn test_alpha_dropout_training_values() {
        let p = 0.5;
        let a = 1.0 / ((ALPHA * ALPHA * p + 1.0) * (1.0 - p)).sqrt();
        let kept = a + ALPHA * a * p;
        let dropped = -ALPHA * a + ALPHA * a * p;
        let out = values(alpha_dropout(&ones(&[128]), &Args::new().arg(p).arg(true)).unwrap());
        for v in out {
            assert!((v - kept).abs() < 1e-12 || (v - dropped).abs() < 1e-12);
        }
    }

    #[test]
    fn test_feature_alpha_dropout_drops_whole_channels() {
        let x = ones(&[2, 8, 4]);
        let out = values(
            feature_alpha_dropout(&x, &Args::new().arg(0.5).kwarg("training", true)).unwrap(),
        );
        for channel in out.chunks(4) {
            assert!(channel.iter().all(|&v| v == channel[0]));
        }
        assert!(feature_alpha_dropout(&ones(&[4]), &Args::new()).is_err());
    }
}

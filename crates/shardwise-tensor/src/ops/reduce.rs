//! Reductions and Lane Helpers
//!
//! `all`/`any` reduce a tensor to a boolean. Without a `dim` the result is a
//! plain `bool` value rather than a tensor. The lane helpers walk a tensor
//! one 1-D slice at a time along a chosen dimension.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use shardwise_core::error::Result;
use shardwise_core::DType;

use crate::shape::{normalize_dim, split_at_dim, Shape};
use crate::tensor::Tensor;
use crate::value::{Args, Value};

// =============================================================================
// Lane Helpers
// =============================================================================

/// Calls `f` on every 1-D lane of `values` along `dim`, writing the lane
/// back after the call.
pub(crate) fn map_lanes(values: &mut [f64], shape: &[usize], dim: usize, mut f: impl FnMut(&mut [f64])) {
    let (outer, size, inner) = split_at_dim(shape, dim);
    let mut lane = vec![0.0; size];
    for o in 0..outer {
        for i in 0..inner {
            let base = o * size * inner + i;
            for k in 0..size {
                lane[k] = values[base + k * inner];
            }
            f(&mut lane);
            for k in 0..size {
                values[base + k * inner] = lane[k];
            }
        }
    }
}

/// Folds every lane along `dim` into one value. Returns the reduced values
/// and the shape with `dim` removed (or kept as 1).
fn reduce_lanes(x: &Tensor, dim: usize, keepdim: bool, f: impl Fn(&[f64]) -> f64) -> (Vec<f64>, Shape) {
    let (outer, size, inner) = split_at_dim(x.shape(), dim);
    let data = x.data();
    let mut lane = Vec::with_capacity(size);
    let mut out = Vec::with_capacity(outer * inner);
    for o in 0..outer {
        for i in 0..inner {
            lane.clear();
            let base = o * size * inner + i;
            lane.extend((0..size).map(|k| data[base + k * inner]));
            out.push(f(&lane));
        }
    }

    let mut shape = Shape::from_slice(x.shape());
    if !shape.is_empty() {
        if keepdim {
            shape[dim] = 1;
        } else {
            shape.remove(dim);
        }
    }
    (out, shape)
}

fn bool_reduction(op: &str, x: &Tensor, args: &Args, f: impl Fn(&[f64]) -> bool) -> Result<Value> {
    let Some(dim) = args.opt_i64(op, 0, "dim")? else {
        return Ok(Value::Bool(f(x.data())));
    };
    let keepdim = args.bool_or(op, 1, "keepdim", false)?;
    let dim = normalize_dim(dim, x.ndim())?;
    let (values, shape) = reduce_lanes(x, dim, keepdim, |lane| if f(lane) { 1.0 } else { 0.0 });
    Ok(Tensor::from_vec_dtype(values, &shape, DType::Bool)?
        .to_device(x.device())
        .into())
}

// =============================================================================
// Kernels
// =============================================================================

/// `all(dim=None, keepdim=False)`.
///
/// Each worker only sees its local shard, so for a sharded input this is a
/// local answer, not a global one.
pub fn all(x: &Tensor, args: &Args) -> Result<Value> {
    bool_reduction("all", x, args, |lane| lane.iter().all(|&v| v != 0.0))
}

/// `any(dim=None, keepdim=False)`.
pub fn any(x: &Tensor, args: &Args) -> Result<Value> {
    bool_reduction("any", x, args, |lane| lane.iter().any(|&v| v != 0.0))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> Tensor {
        Tensor::from_vec(vec![1.0, 0.0, 1.0, 1.0, 1.0, 1.0], &[2, 3]).unwrap()
    }

    #[test]
    fn test_full_reduction_is_not_a_tensor() {
        assert_eq!(all(&matrix(), &Args::new()).unwrap(), Value::Bool(false));
        assert_eq!(any(&matrix(), &Args::new()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_empty_tensor_reductions() {
        let empty = Tensor::from_vec(vec![], &[0]).unwrap();
        assert_eq!(all(&empty, &Args::new()).unwrap(), Value::Bool(true));
        assert_eq!(any(&empty, &Args::new()).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_reduction_along_dim() {
        let r = all(&matrix(), &Args::new().arg(1_i64)).unwrap().into_tensor().unwrap();
        assert_eq!(r.shape(), &[2]);
        assert_eq!(r.dtype(), DType::Bool);
        assert_eq!(r.to_bool_vec(), vec![false, true]);

        let r = any(&matrix(), &Args::new().kwarg("dim", 0_i64).kwarg("keepdim", true))
            .unwrap()
            .into_tensor()
            .unwrap();
        assert_eq!(r.shape(), &[1, 3]);
        assert_eq!(r.to_bool_vec(), vec![true, true, true]);
    }

    #[test]
    fn test_reduction_bad_dim() {
        assert!(all(&matrix(), &Args::new().arg(2_i64)).is_err());
    }

    #[test]
    fn test_map_lanes_inner_dim() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        map_lanes(&mut values, &[2, 3], 0, |lane| {
            let total: f64 = lane.iter().sum();
            for v in lane.iter_mut() {
                *v = total;
            }
        });
        assert_eq!(values, vec![5.0, 7.0, 9.0, 5.0, 7.0, 9.0]);
    }
}

//! Operations - Kernels of the Op Library
//!
//! Every kernel has the signature `fn(&Tensor, &Args) -> Result<Value>` and
//! follows the usual numeric semantics of its name. Kernels never modify
//! their input; even `inplace=True` style arguments produce a new tensor.
//!
//! # Modules
//! - `special`: scalar special functions (erfinv, digamma, i0, ...)
//! - `pointwise`: element-wise math, binary ops and predicates
//! - `reduce`: `all` / `any`
//! - `convert`: dtype and device conversions
//! - `activation`: neural-network activations and the softmax family
//! - `dropout`: random kernels
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

pub mod activation;
pub mod convert;
pub mod dropout;
pub mod pointwise;
pub mod reduce;
pub mod special;

use shardwise_core::error::Result;

use crate::tensor::Tensor;
use crate::value::{Args, Value};

// =============================================================================
// Shared Helpers
// =============================================================================

/// Applies a float-valued function; integer and bool inputs promote to the
/// default float type.
pub(crate) fn float_result(x: &Tensor, f: impl Fn(f64) -> f64) -> Tensor {
    x.map(x.dtype().to_float(), f)
}

/// Applies a function that keeps the input dtype.
pub(crate) fn same_dtype(x: &Tensor, f: impl Fn(f64) -> f64) -> Tensor {
    x.map(x.dtype(), f)
}

/// Optional scalar-or-tensor operand such as a `clamp` bound.
pub(crate) fn bounded_operand(
    args: &Args,
    op: &str,
    index: usize,
    name: &str,
) -> Result<Option<Tensor>> {
    match args.get(index, name) {
        None => Ok(None),
        Some(Value::Tensor(t)) => Ok(Some(t.clone())),
        Some(_) => args.require_tensor(op, index, name).map(Some),
    }
}

/// Resolves the implicit softmax dimension: 0 for 0-, 1- and 3-dimensional
/// inputs, 1 otherwise.
pub(crate) fn implicit_softmax_dim(ndim: usize) -> i64 {
    if matches!(ndim, 0 | 1 | 3) {
        0
    } else {
        1
    }
}

// =============================================================================
// Tests
// =============================================================================

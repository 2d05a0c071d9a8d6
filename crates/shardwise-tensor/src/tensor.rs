//! Tensor - Plain N-Dimensional Array Type
//!
//! The `Tensor` struct is the plain (non-distributed) value every kernel in
//! the op library consumes and produces. It is a contiguous row-major array
//! tagged with a runtime `DType` and a `Device`.
//!
//! # Key Features
//! - Payload held as `f64`, rounded to the dtype on every write
//! - Cheap clones through a reference-counted buffer
//! - Value semantics: operations return new tensors, inputs never change
//! - Broadcasting for binary element-wise helpers
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use std::sync::Arc;

use shardwise_core::error::{Error, Result};
use shardwise_core::{DType, Device};

use crate::shape::{broadcast_shape, broadcast_source_index, normalize_dim, numel, Shape};

// =============================================================================
// Tensor Struct
// =============================================================================

/// An N-dimensional array of numeric values.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Element buffer (row-major, reference-counted).
    data: Arc<Vec<f64>>,
    /// Shape of the tensor (dimensions).
    shape: Shape,
    /// Element type every value is rounded to.
    dtype: DType,
    /// Placement tag.
    device: Device,
    /// Whether the tensor participates in gradient tracking.
    requires_grad: bool,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a new `f32` tensor from a vector with the given shape.
    ///
    /// # Returns
    /// New tensor, or error if shape doesn't match data length.
    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Self> {
        Self::from_vec_dtype(data, shape, DType::default_float())
    }

    /// Creates a new tensor of the given dtype from a vector.
    ///
    /// Values are rounded to what `dtype` can represent.
    pub fn from_vec_dtype(mut data: Vec<f64>, shape: &[usize], dtype: DType) -> Result<Self> {
        if numel(shape) != data.len() {
            return Err(Error::shape_mismatch(&[data.len()], shape));
        }
        if dtype != DType::F64 {
            for value in &mut data {
                *value = dtype.quantize(*value);
            }
        }
        Ok(Self::from_parts(data, Shape::from_slice(shape), dtype, Device::Cpu))
    }

    /// Creates a boolean tensor.
    pub fn from_bools(data: &[bool], shape: &[usize]) -> Result<Self> {
        let data = data.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
        Self::from_vec_dtype(data, shape, DType::Bool)
    }

    /// Creates a scalar tensor (0-dimensional).
    #[must_use]
    pub fn scalar(value: f64) -> Self {
        let dtype = DType::default_float();
        Self::from_parts(vec![dtype.quantize(value)], Shape::new(), dtype, Device::Cpu)
    }

    /// Creates a double precision scalar used as an operand of a binary op.
    #[must_use]
    pub fn scalar_operand(value: f64) -> Self {
        Self::from_parts(vec![value], Shape::new(), DType::F64, Device::Cpu)
    }

    /// Assembles a tensor from an already-quantized buffer.
    pub(crate) fn from_parts(data: Vec<f64>, shape: Shape, dtype: DType, device: Device) -> Self {
        Self {
            data: Arc::new(data),
            shape,
            dtype,
            device,
            requires_grad: false,
        }
    }

    /// Returns a copy of this tensor with the gradient flag set.
    #[must_use]
    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the shape of the tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the tensor is empty (has zero elements).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if this tensor is a scalar (0-dimensional).
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Returns the size of a specific dimension (supports negative indexing).
    pub fn size(&self, dim: i64) -> Result<usize> {
        let idx = normalize_dim(dim, self.ndim())?;
        Ok(self.shape.get(idx).copied().unwrap_or(1))
    }

    /// Returns the element type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the device this tensor is placed on.
    #[must_use]
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns true if the tensor tracks gradients.
    #[must_use]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Returns true if both tensors share the same element buffer.
    #[must_use]
    pub fn shares_data(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // =========================================================================
    // Data Access
    // =========================================================================

    /// Returns the elements in row-major order.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Copies the elements into a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    /// Returns the elements as booleans (non-zero is true).
    #[must_use]
    pub fn to_bool_vec(&self) -> Vec<bool> {
        self.data.iter().map(|&v| v != 0.0).collect()
    }

    /// Returns the single element of a one-element tensor.
    pub fn item(&self) -> Result<f64> {
        if self.numel() != 1 {
            return Err(Error::invalid_operation(format!(
                "item() requires a tensor with one element, got {}",
                self.numel()
            )));
        }
        Ok(self.data[0])
    }

    // =========================================================================
    // Element-wise Helpers
    // =========================================================================

    /// Applies `f` to every element, producing a tensor of `dtype` on the
    /// same device.
    #[must_use]
    pub fn map(&self, dtype: DType, f: impl Fn(f64) -> f64) -> Self {
        let data = self.data.iter().map(|&x| dtype.quantize(f(x))).collect();
        Self::from_parts(data, self.shape.clone(), dtype, self.device)
    }

    /// Builds a tensor of `dtype` with this tensor's shape and device from
    /// already computed values.
    pub fn with_values(&self, values: Vec<f64>, dtype: DType) -> Result<Self> {
        if values.len() != self.numel() {
            return Err(Error::shape_mismatch(self.shape(), &[values.len()]));
        }
        let data = values.into_iter().map(|v| dtype.quantize(v)).collect();
        Ok(Self::from_parts(data, self.shape.clone(), dtype, self.device))
    }

    /// Combines two tensors element-wise with broadcasting.
    ///
    /// The result lives on `self`'s device. Devices must agree unless one
    /// side is a 0-dimensional tensor.
    pub fn zip_with(&self, other: &Self, dtype: DType, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        if self.device != other.device && !self.is_scalar() && !other.is_scalar() {
            return Err(Error::invalid_operation(format!(
                "Expected all tensors to be on the same device, found {} and {}",
                self.device, other.device
            )));
        }

        if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| dtype.quantize(f(a, b)))
                .collect();
            return Ok(Self::from_parts(data, self.shape.clone(), dtype, self.device));
        }

        let out_shape = broadcast_shape(&self.shape, &other.shape)?;
        let total = numel(&out_shape);
        let data = (0..total)
            .map(|i| {
                let a = self.data[broadcast_source_index(i, &out_shape, &self.shape)];
                let b = other.data[broadcast_source_index(i, &out_shape, &other.shape)];
                dtype.quantize(f(a, b))
            })
            .collect();
        Ok(Self::from_parts(data, out_shape, dtype, self.device))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    /// Converts the tensor to another dtype.
    #[must_use]
    pub fn cast(&self, dtype: DType) -> Self {
        if dtype == self.dtype {
            return self.clone();
        }
        let mut out = self.map(dtype, |x| x);
        out.requires_grad = self.requires_grad && dtype.is_float();
        out
    }

    /// Places the tensor on another device.
    #[must_use]
    pub fn to_device(&self, device: Device) -> Self {
        let mut out = self.clone();
        out.device = device;
        out
    }

    /// Returns a copy that owns a fresh element buffer.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            data: Arc::new(self.data.to_vec()),
            ..self.clone()
        }
    }

    /// Returns true if the tensors have equal shapes and all elements agree
    /// within `atol + rtol * |other|`. NaNs in matching positions compare
    /// equal.
    #[must_use]
    pub fn allclose(&self, other: &Self, rtol: f64, atol: f64) -> bool {
        self.shape == other.shape
            && self.data.iter().zip(other.data.iter()).all(|(&a, &b)| {
                (a.is_nan() && b.is_nan()) || a == b || (a - b).abs() <= atol + rtol * b.abs()
            })
    }
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor([")?;
        for (i, value) in self.data.iter().take(8).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        if self.numel() > 8 {
            write!(f, ", ...")?;
        }
        write!(f, "], shape={:?}, dtype={}", self.shape.as_slice(), self.dtype)?;
        if self.device.is_gpu() {
            write!(f, ", device={}", self.device)?;
        }
        write!(f, ")")
    }
}

// =============================================================================
// Tests
// =============================================================================

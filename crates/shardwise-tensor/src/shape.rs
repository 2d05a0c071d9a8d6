//! Shape Utilities - Tensor Dimension Management
//!
//! Provides the shape type and the index arithmetic the kernels need:
//! element counts, row-major strides, broadcasting and splitting a shape
//! around one dimension for per-dimension reductions.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use smallvec::SmallVec;

use shardwise_core::error::{Error, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// Shape type - dimensions of a tensor.
/// Uses `SmallVec` for stack allocation of small shapes (up to 6 dimensions).
pub type Shape = SmallVec<[usize; 6]>;

/// Strides type - step sizes for each dimension.
pub type Strides = SmallVec<[usize; 6]>;

// =============================================================================
// Shape Utilities
// =============================================================================

/// Computes the total number of elements from a shape.
#[must_use]
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Computes row-major (C-order) strides for a shape.
#[must_use]
pub fn contiguous_strides(shape: &[usize]) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(1, shape.len());
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1].max(1);
    }
    strides
}

/// Computes the broadcast shape of two shapes.
///
/// Follows `NumPy` rules: dimensions are compared right to left and must be
/// equal or one of them must be 1.
pub fn broadcast_shape(shape1: &[usize], shape2: &[usize]) -> Result<Shape> {
    let max_ndim = shape1.len().max(shape2.len());
    let mut result = Shape::with_capacity(max_ndim);

    for i in 0..max_ndim {
        let d1 = if i < shape1.len() {
            shape1[shape1.len() - 1 - i]
        } else {
            1
        };
        let d2 = if i < shape2.len() {
            shape2[shape2.len() - 1 - i]
        } else {
            1
        };

        if d1 == d2 || d2 == 1 {
            result.push(d1);
        } else if d1 == 1 {
            result.push(d2);
        } else {
            return Err(Error::BroadcastError {
                shape1: shape1.to_vec(),
                shape2: shape2.to_vec(),
            });
        }
    }

    result.reverse();
    Ok(result)
}

/// Maps a linear index in `target` to the linear index of the element of a
/// tensor with `shape` that broadcasts onto it.
#[must_use]
pub fn broadcast_source_index(linear: usize, target: &[usize], shape: &[usize]) -> usize {
    let offset = target.len() - shape.len();
    let strides = contiguous_strides(shape);
    let mut remaining = linear;
    let mut source = 0;

    for (axis, &dim) in target.iter().enumerate().rev() {
        let coord = remaining % dim.max(1);
        remaining /= dim.max(1);
        if axis >= offset {
            let src_axis = axis - offset;
            if shape[src_axis] != 1 {
                source += coord * strides[src_axis];
            }
        }
    }

    source
}

/// Normalizes a dimension index, resolving negative values.
///
/// A 0-dimensional tensor accepts `0` and `-1`, matching the convention of
/// treating scalars as one-element vectors for dimension arguments.
pub fn normalize_dim(dim: i64, ndim: usize) -> Result<usize> {
    let effective = ndim.max(1) as i64;
    let normalized = if dim < 0 { dim + effective } else { dim };

    if normalized < 0 || normalized >= effective {
        return Err(Error::InvalidDimension { index: dim, ndim });
    }

    Ok(normalized as usize)
}

/// Splits a shape around `dim` into `(outer, size, inner)` extents.
///
/// Element `(o, k, i)` of the split lives at `o * size * inner + k * inner + i`.
#[must_use]
pub fn split_at_dim(shape: &[usize], dim: usize) -> (usize, usize, usize) {
    if shape.is_empty() {
        return (1, 1, 1);
    }
    let outer = numel(&shape[..dim]);
    let size = shape[dim];
    let inner = numel(&shape[dim + 1..]);
    (outer, size, inner)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numel() {
        assert_eq!(numel(&[2, 3, 4]), 24);
        assert_eq!(numel(&[]), 1);
        assert_eq!(numel(&[3, 0]), 0);
    }

    #[test]
    fn test_contiguous_strides() {
        assert_eq!(contiguous_strides(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
        assert!(contiguous_strides(&[]).is_empty());
    }

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]).unwrap().as_slice(), &[2, 3]);
        assert_eq!(broadcast_shape(&[2, 1], &[1, 4]).unwrap().as_slice(), &[2, 4]);
        assert!(broadcast_shape(&[2, 3], &[4]).is_err());
    }

    #[test]
    fn test_broadcast_source_index() {
        // [2, 3] target, [3] source: rows repeat
        assert_eq!(broadcast_source_index(4, &[2, 3], &[3]), 1);
        // [2, 3] target, [2, 1] source: columns repeat
        assert_eq!(broadcast_source_index(4, &[2, 3], &[2, 1]), 1);
        // scalar source
        assert_eq!(broadcast_source_index(5, &[2, 3], &[]), 0);
    }

    #[test]
    fn test_normalize_dim() {
        assert_eq!(normalize_dim(-1, 3).unwrap(), 2);
        assert_eq!(normalize_dim(0, 0).unwrap(), 0);
        assert_eq!(normalize_dim(-1, 0).unwrap(), 0);
        assert!(normalize_dim(3, 3).is_err());
        assert!(normalize_dim(-4, 3).is_err());
    }

    #[test]
    fn test_split_at_dim() {
        assert_eq!(split_at_dim(&[2, 3, 4], 1), (2, 3, 4));
        assert_eq!(split_at_dim(&[5], 0), (1, 5, 1));
        assert_eq!(split_at_dim(&[], 0), (1, 1, 1));
    }
}

//! Distribution Spec - How a Tensor Is Laid Out Across a Group
//!
//! A `DistSpec` says whether every rank holds the whole tensor
//! (`Replicate`) or a slice of it along one or more dimensions (`Shard`).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;

use serde::{Deserialize, Serialize};
use shardwise_core::error::{Error, Result};

// =============================================================================
// DistSpec
// =============================================================================

/// Distribution descriptor of a distributed tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistSpec {
    /// Every rank holds the full tensor.
    Replicate,
    /// Each rank holds one partition along each of `dims`.
    Shard {
        /// Sharded dimensions.
        dims: Vec<usize>,
        /// Number of partitions per sharded dimension.
        num_partitions: Vec<usize>,
    },
}

impl DistSpec {
    /// Replicated layout.
    #[must_use]
    pub fn replicate() -> Self {
        Self::Replicate
    }

    /// Sharded layout. `dims` and `num_partitions` must have equal lengths,
    /// partitions must be non-zero and dims must not repeat.
    pub fn shard(dims: Vec<usize>, num_partitions: Vec<usize>) -> Result<Self> {
        if dims.is_empty() {
            return Err(invalid("a shard spec needs at least one dim"));
        }
        if dims.len() != num_partitions.len() {
            return Err(invalid(format!(
                "dims and num_partitions differ in length ({} vs {})",
                dims.len(),
                num_partitions.len()
            )));
        }
        if num_partitions.contains(&0) {
            return Err(invalid("num_partitions must be non-zero"));
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(invalid(format!("dim {dim} is sharded twice")));
            }
        }
        Ok(Self::Shard {
            dims,
            num_partitions,
        })
    }

    /// Returns true for the replicated layout.
    #[must_use]
    pub fn is_replicate(&self) -> bool {
        matches!(self, Self::Replicate)
    }

    /// Returns true for a sharded layout.
    #[must_use]
    pub fn is_shard(&self) -> bool {
        matches!(self, Self::Shard { .. })
    }

    /// Sharded dimensions; empty when replicated.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        match self {
            Self::Replicate => &[],
            Self::Shard { dims, .. } => dims,
        }
    }

    /// Partition counts per sharded dimension; empty when replicated.
    #[must_use]
    pub fn num_partitions(&self) -> &[usize] {
        match self {
            Self::Replicate => &[],
            Self::Shard { num_partitions, .. } => num_partitions,
        }
    }

    /// Total number of shards the tensor is split into.
    #[must_use]
    pub fn total_partitions(&self) -> usize {
        self.num_partitions().iter().product()
    }

    /// Checks that every sharded dim exists in a tensor of `ndim`
    /// dimensions.
    pub fn check_ndim(&self, ndim: usize) -> Result<()> {
        match self.dims().iter().find(|&&d| d >= ndim) {
            Some(dim) => Err(invalid(format!(
                "dim {dim} is out of range for a tensor with {ndim} dimensions"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for DistSpec {
    fn default() -> Self {
        Self::Replicate
    }
}

impl fmt::Display for DistSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replicate => write!(f, "Replicate"),
            Self::Shard {
                dims,
                num_partitions,
            } => write!(f, "Shard(dims={dims:?}, num_partitions={num_partitions:?})"),
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidDistSpec {
        message: message.into(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replicate() {
        let spec = DistSpec::replicate();
        assert!(spec.is_replicate());
        assert!(spec.dims().is_empty());
        assert_eq!(spec.total_partitions(), 1);
        assert_eq!(spec, DistSpec::default());
        assert_eq!(spec.to_string(), "Replicate");
    }

    #[test]
    fn test_shard_valid() {
        let spec = DistSpec::shard(vec![0, 2], vec![2, 4]).unwrap();
        assert!(spec.is_shard());
        assert_eq!(spec.dims(), &[0, 2]);
        assert_eq!(spec.num_partitions(), &[2, 4]);
        assert_eq!(spec.total_partitions(), 8);
        assert_eq!(spec.to_string(), "Shard(dims=[0, 2], num_partitions=[2, 4])");
        assert!(spec.check_ndim(3).is_ok());
        assert!(spec.check_ndim(2).is_err());
    }

    #[test]
    fn test_shard_invalid() {
        assert!(DistSpec::shard(vec![], vec![]).is_err());
        assert!(DistSpec::shard(vec![0], vec![2, 2]).is_err());
        assert!(DistSpec::shard(vec![0], vec![0]).is_err());
        let err = DistSpec::shard(vec![1, 1], vec![2, 2]).unwrap_err();
        assert!(matches!(err, Error::InvalidDistSpec { .. }));
    }

    #[test]
    fn test_serde_round_trip() {
        let spec = DistSpec::shard(vec![1], vec![4]).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let back: DistSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}

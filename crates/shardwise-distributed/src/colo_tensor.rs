//! Distributed Tensor - Payload Plus Placement
//!
//! `DistTensor` pairs the local payload held by this rank with a
//! `TensorSpec`: the process group it lives on and how it is distributed
//! over that group. `GeneralTensor` is what an intercepted op accepts and
//! `OpOutput` is what it returns.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use shardwise_core::error::{Error, Result};
use shardwise_core::{DType, Device};
use shardwise_tensor::shape::split_at_dim;
use shardwise_tensor::{Tensor, Value};

use crate::dist_spec::DistSpec;
use crate::process_group::ProcessGroup;

// =============================================================================
// TensorSpec
// =============================================================================

/// Placement of a distributed tensor: its group and its distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    process_group: ProcessGroup,
    dist_spec: DistSpec,
}

impl TensorSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(process_group: ProcessGroup, dist_spec: DistSpec) -> Self {
        Self {
            process_group,
            dist_spec,
        }
    }

    /// Replicated over `process_group`.
    #[must_use]
    pub fn replicated(process_group: ProcessGroup) -> Self {
        Self::new(process_group, DistSpec::Replicate)
    }

    /// Returns the process group.
    #[must_use]
    pub fn process_group(&self) -> &ProcessGroup {
        &self.process_group
    }

    /// Returns the distribution descriptor.
    #[must_use]
    pub fn dist_spec(&self) -> &DistSpec {
        &self.dist_spec
    }
}

// =============================================================================
// DistTensor
// =============================================================================

/// A tensor distributed over a process group.
#[derive(Debug, Clone, PartialEq)]
pub struct DistTensor {
    payload: Tensor,
    spec: TensorSpec,
}

impl DistTensor {
    /// Wraps an already-local payload.
    #[must_use]
    pub fn from_plain(payload: Tensor, spec: TensorSpec) -> Self {
        Self { payload, spec }
    }

    /// Distributes a full tensor: a replicated spec keeps it whole, a spec
    /// sharded along one dim keeps this rank's chunk.
    pub fn distribute(full: &Tensor, process_group: ProcessGroup, dist_spec: DistSpec) -> Result<Self> {
        dist_spec.check_ndim(full.ndim())?;
        let payload = match &dist_spec {
            DistSpec::Replicate => full.clone(),
            DistSpec::Shard { .. } => {
                let (dim, parts) = single_shard(&dist_spec, &process_group)?;
                local_chunk(full, dim, parts, process_group.rank())?
            }
        };
        Ok(Self::from_plain(payload, TensorSpec::new(process_group, dist_spec)))
    }

    /// Returns the local payload.
    #[must_use]
    pub fn payload(&self) -> &Tensor {
        &self.payload
    }

    /// Consumes the tensor, returning the local payload.
    #[must_use]
    pub fn into_payload(self) -> Tensor {
        self.payload
    }

    /// Returns the spec.
    #[must_use]
    pub fn spec(&self) -> &TensorSpec {
        &self.spec
    }

    /// Returns the process group.
    #[must_use]
    pub fn process_group(&self) -> &ProcessGroup {
        &self.spec.process_group
    }

    /// Returns the distribution descriptor.
    #[must_use]
    pub fn dist_spec(&self) -> &DistSpec {
        &self.spec.dist_spec
    }

    /// Shape of the local payload.
    #[must_use]
    pub fn local_shape(&self) -> &[usize] {
        self.payload.shape()
    }

    /// Element type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        self.payload.dtype()
    }

    /// Device of the local payload.
    #[must_use]
    pub fn device(&self) -> Device {
        self.payload.device()
    }

    /// Gathers the shards back into a replicated tensor.
    ///
    /// Only a spec sharded along one dim into as many partitions as the
    /// group's world size can be gathered. Every rank must call this.
    pub fn to_replicate(&self) -> Result<Self> {
        if self.dist_spec().is_replicate() {
            return Ok(self.clone());
        }
        self.dist_spec().check_ndim(self.payload.ndim())?;
        let pg = self.process_group();
        let (dim, parts) = single_shard(self.dist_spec(), pg)?;

        let gathered = pg.all_gather_tensor(&self.payload)?;
        let local = self.payload.shape();
        let (outer, size, inner) = split_at_dim(local, dim);
        let chunk = self.payload.numel();
        let data = gathered.data();

        let mut values = Vec::with_capacity(chunk * parts);
        for o in 0..outer {
            for w in 0..parts {
                let base = w * chunk + o * size * inner;
                values.extend_from_slice(&data[base..base + size * inner]);
            }
        }

        let mut shape = local.to_vec();
        shape[dim] *= parts;
        let full = Tensor::from_vec_dtype(values, &shape, self.dtype())?.to_device(self.device());
        Ok(Self::from_plain(full, TensorSpec::replicated(pg.clone())))
    }
}

/// Extracts the sharded dim and partition count, requiring exactly one
/// sharded dim split across the whole world.
fn single_shard(spec: &DistSpec, pg: &ProcessGroup) -> Result<(usize, usize)> {
    if pg.size() != pg.world_size() {
        return Err(Error::InvalidDistSpec {
            message: format!(
                "cannot shard over a subgroup of {} out of {} ranks",
                pg.size(),
                pg.world_size()
            ),
        });
    }
    match (spec.dims(), spec.num_partitions()) {
        ([dim], [parts]) if *parts == pg.world_size() => Ok((*dim, *parts)),
        ([_], [parts]) => Err(Error::InvalidDistSpec {
            message: format!(
                "{parts} partitions do not match a world size of {}",
                pg.world_size()
            ),
        }),
        _ => Err(Error::InvalidDistSpec {
            message: format!("{spec} shards more than one dim"),
        }),
    }
}

fn local_chunk(full: &Tensor, dim: usize, parts: usize, rank: usize) -> Result<Tensor> {
    let extent = full.shape()[dim];
    if extent % parts != 0 {
        return Err(Error::InvalidDistSpec {
            message: format!("dim {dim} of size {extent} does not split into {parts} partitions"),
        });
    }
    let (outer, _, inner) = split_at_dim(full.shape(), dim);
    let size = extent / parts;
    let data = full.data();

    let mut values = Vec::with_capacity(outer * size * inner);
    for o in 0..outer {
        let base = o * extent * inner + rank * size * inner;
        values.extend_from_slice(&data[base..base + size * inner]);
    }

    let mut shape = full.shape().to_vec();
    shape[dim] = size;
    Ok(Tensor::from_vec_dtype(values, &shape, full.dtype())?
        .to_device(full.device())
        .with_requires_grad(full.requires_grad()))
}

// =============================================================================
// GeneralTensor / OpOutput
// =============================================================================

/// Input of an intercepted op: a plain or a distributed tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralTensor {
    /// Plain tensor.
    Plain(Tensor),
    /// Distributed tensor.
    Distributed(DistTensor),
}

impl GeneralTensor {
    /// Returns true for a distributed tensor.
    #[must_use]
    pub fn is_distributed(&self) -> bool {
        matches!(self, Self::Distributed(_))
    }

    /// The plain tensor, or the local payload of a distributed one.
    #[must_use]
    pub fn payload(&self) -> &Tensor {
        match self {
            Self::Plain(t) => t,
            Self::Distributed(d) => d.payload(),
        }
    }

    /// Returns the distributed tensor if this is one.
    #[must_use]
    pub fn as_distributed(&self) -> Option<&DistTensor> {
        match self {
            Self::Distributed(d) => Some(d),
            Self::Plain(_) => None,
        }
    }
}

impl From<Tensor> for GeneralTensor {
    fn from(tensor: Tensor) -> Self {
        Self::Plain(tensor)
    }
}

impl From<DistTensor> for GeneralTensor {
    fn from(tensor: DistTensor) -> Self {
        Self::Distributed(tensor)
    }
}

/// Result of an intercepted op.
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutput {
    /// Whatever the op returned for a plain input.
    Plain(Value),
    /// The rewrapped result for a distributed input.
    Distributed(DistTensor),
}

impl OpOutput {
    /// Returns true for a distributed result.
    #[must_use]
    pub fn is_distributed(&self) -> bool {
        matches!(self, Self::Distributed(_))
    }

    /// Returns the plain value if the result is plain.
    #[must_use]
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            Self::Plain(v) => Some(v),
            Self::Distributed(_) => None,
        }
    }

    /// Returns the distributed tensor if the result is distributed.
    #[must_use]
    pub fn as_distributed(&self) -> Option<&DistTensor> {
        match self {
            Self::Distributed(d) => Some(d),
            Self::Plain(_) => None,
        }
    }

    /// Consumes the output, returning the plain value.
    #[must_use]
    pub fn into_plain(self) -> Option<Value> {
        match self {
            Self::Plain(v) => Some(v),
            Self::Distributed(_) => None,
        }
    }

    /// Consumes the output, returning the distributed tensor.
    #[must_use]
    pub fn into_distributed(self) -> Option<DistTensor> {
        match self {
            Self::Distributed(d) => Some(d),
            Self::Plain(_) => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

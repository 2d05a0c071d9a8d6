//! `ProcessGroup` - Process Group Abstraction
//!
//! A process group is a shared communication backend plus the ranks that
//! take part in it. Distributed tensors carry a handle to the group they
//! live on; handles are cheap to clone and compare equal when they share
//! the backend instance and the rank list.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use std::sync::Arc;

use shardwise_core::error::Result;
use shardwise_tensor::Tensor;

use crate::backend::{Backend, MockBackend};

// =============================================================================
// ProcessGroup
// =============================================================================

/// A group of processes that can communicate with each other.
#[derive(Clone)]
pub struct ProcessGroup {
    backend: Arc<dyn Backend>,
    ranks: Vec<usize>,
}

impl ProcessGroup {
    /// Creates a new process group with all ranks.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let world_size = backend.world_size();
        Self {
            backend,
            ranks: (0..world_size).collect(),
        }
    }

    /// Creates a process group with specific ranks.
    ///
    /// Collectives always span the backend's whole world, so a subgroup
    /// only answers membership queries (`ranks`, `size`, `contains`).
    /// Sharding and gathering over it fail with `Error::InvalidDistSpec`
    /// unless it covers every rank.
    pub fn with_ranks(backend: Arc<dyn Backend>, ranks: Vec<usize>) -> Self {
        Self { backend, ranks }
    }

    /// Creates a single-rank mock process group for testing.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(Arc::new(MockBackend::single()))
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Returns the rank of this process.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.backend.rank()
    }

    /// Returns the world size.
    #[must_use]
    pub fn world_size(&self) -> usize {
        self.backend.world_size()
    }

    /// Returns the number of processes in this group.
    #[must_use]
    pub fn size(&self) -> usize {
        self.ranks.len()
    }

    /// Returns the ranks in this group.
    #[must_use]
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Checks if `rank` is part of the group.
    #[must_use]
    pub fn contains(&self, rank: usize) -> bool {
        self.ranks.contains(&rank)
    }

    /// Synchronizes all processes in the group.
    pub fn barrier(&self) {
        self.backend.barrier();
    }

    /// Gathers one tensor per rank. The result has shape
    /// `[world_size, ...shape]`.
    pub fn all_gather_tensor(&self, send_tensor: &Tensor) -> Result<Tensor> {
        let send_data = send_tensor.data();
        let mut recv_data = vec![0.0; send_data.len() * self.world_size()];
        self.backend.all_gather(send_data, &mut recv_data);

        let mut new_shape = vec![self.world_size()];
        new_shape.extend_from_slice(send_tensor.shape());
        Ok(Tensor::from_vec_dtype(recv_data, &new_shape, send_tensor.dtype())?
            .to_device(send_tensor.device()))
    }
}

impl PartialEq for ProcessGroup {
    fn eq(&self, other: &Self) -> bool {
        let same_backend = Arc::as_ptr(&self.backend).cast::<()>() == Arc::as_ptr(&other.backend).cast::<()>();
        same_backend && self.ranks == other.ranks
    }
}

impl Eq for ProcessGroup {}

impl fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessGroup")
            .field("backend", &self.backend.name())
            .field("rank", &self.rank())
            .field("ranks", &self.ranks)
            .finish()
    }
}

// =============================================================================
// World
// =============================================================================

/// Global distributed world.
#[derive(Debug, Clone)]
pub struct World {
    default_group: ProcessGroup,
}

impl World {
    /// Initializes the distributed world.
    pub fn init(backend: Arc<dyn Backend>) -> Self {
        Self {
            default_group: ProcessGroup::new(backend),
        }
    }

    /// Creates a single-rank mock world for testing.
    #[must_use]
    pub fn mock() -> Self {
        Self {
            default_group: ProcessGroup::mock(),
        }
    }

    /// Returns the default process group.
    #[must_use]
    pub fn default_group(&self) -> &ProcessGroup {
        &self.default_group
    }

    /// Returns the rank of this process.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.default_group.rank()
    }

    /// Returns the world size.
    #[must_use]
    pub fn world_size(&self) -> usize {
        self.default_group.world_size()
    }

    /// Checks if this is the main process (rank 0).
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.rank() == 0
    }

    /// Synchronizes all processes.
    pub fn barrier(&self) {
        self.default_group.barrier();
    }

    /// Creates a new process group over a subset of ranks.
    #[must_use]
    pub fn new_group(&self, ranks: Vec<usize>) -> ProcessGroup {
        ProcessGroup::with_ranks(Arc::clone(&self.default_group.backend), ranks)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_process_group_mock() {
        let pg = ProcessGroup::mock();
        assert_eq!(pg.rank(), 0);
        assert_eq!(pg.world_size(), 1);
        assert_eq!(pg.size(), 1);
        assert_eq!(pg.backend().name(), "mock");
        assert!(pg.contains(0));
        assert!(!pg.contains(1));
    }

    #[test]
    fn test_group_identity() {
        let pg = ProcessGroup::mock();
        assert_eq!(pg, pg.clone());
        // Same ranks, different backend instance.
        assert_ne!(pg, ProcessGroup::mock());

        let world = World::mock();
        assert_eq!(world.new_group(vec![0]), *world.default_group());
        assert_ne!(world.new_group(vec![]), *world.default_group());
    }

    #[test]
    fn test_world_mock() {
        let world = World::mock();
        assert_eq!(world.rank(), 0);
        assert_eq!(world.world_size(), 1);
        assert!(world.is_main());
        world.barrier();
    }

    #[test]
    fn test_single_rank_collectives() {
        let pg = ProcessGroup::mock();
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let gathered = pg.all_gather_tensor(&t).unwrap();
        assert_eq!(gathered.shape(), &[1, 3]);
        assert_eq!(gathered.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_all_gather_tensor_two_ranks() {
        let handles: Vec<_> = MockBackend::create_world(2)
            .into_iter()
            .map(|backend| {
                thread::spawn(move || {
                    let pg = ProcessGroup::new(Arc::new(backend));
                    let local = Tensor::from_vec(vec![pg.rank() as f64; 2], &[2]).unwrap();
                    pg.all_gather_tensor(&local).unwrap()
                })
            })
            .collect();
        for handle in handles {
            let gathered = handle.join().unwrap();
            assert_eq!(gathered.shape(), &[2, 2]);
            assert_eq!(gathered.to_vec(), vec![0.0, 0.0, 1.0, 1.0]);
        }
    }
}

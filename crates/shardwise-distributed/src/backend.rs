//! Backend - Communication Backend Abstractions
//!
//! The `Backend` trait is the collective-communication surface a process
//! group talks to. `MockBackend` runs every rank of a world inside one
//! process: each rank is a handle on shared state, and a collective
//! completes once every rank of the world has entered it.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

// =============================================================================
// Reduce Operations
// =============================================================================

/// Reduction operation for collective communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Sum all values.
    Sum,
    /// Compute product of all values.
    Product,
    /// Find minimum value.
    Min,
    /// Find maximum value.
    Max,
    /// Compute average of all values.
    Average,
}

impl ReduceOp {
    /// Reduces one buffer per rank into a single buffer, element by element.
    #[must_use]
    pub fn reduce_slices(&self, slices: &[Vec<f64>]) -> Vec<f64> {
        let Some(first) = slices.first() else {
            return Vec::new();
        };

        let mut result = first.clone();
        for slice in &slices[1..] {
            for (acc, &val) in result.iter_mut().zip(slice) {
                *acc = match self {
                    ReduceOp::Sum | ReduceOp::Average => *acc + val,
                    ReduceOp::Product => *acc * val,
                    ReduceOp::Min => acc.min(val),
                    ReduceOp::Max => acc.max(val),
                };
            }
        }

        if *self == ReduceOp::Average {
            let count = slices.len() as f64;
            for val in &mut result {
                *val /= count;
            }
        }
        result
    }
}

// =============================================================================
// Backend Trait
// =============================================================================

/// Trait for distributed communication backends.
pub trait Backend: Send + Sync {
    /// Returns the name of the backend.
    fn name(&self) -> &str;

    /// Returns the rank of this process.
    fn rank(&self) -> usize;

    /// Returns the total world size.
    fn world_size(&self) -> usize;

    /// Reduces `data` across all ranks; every rank receives the result.
    fn all_reduce(&self, data: &mut [f64], op: ReduceOp);

    /// Overwrites `data` with the buffer of rank `src`.
    fn broadcast(&self, data: &mut [f64], src: usize);

    /// Concatenates every rank's `send_data` in rank order into
    /// `recv_data`.
    fn all_gather(&self, send_data: &[f64], recv_data: &mut [f64]);

    /// Synchronizes all processes.
    fn barrier(&self);
}

// =============================================================================
// Shared State for Mock Backend
// =============================================================================

#[derive(Debug)]
struct SharedState {
    /// One contribution slot per rank for the collective in flight.
    buffers: Vec<Vec<f64>>,
    /// Ranks that entered the collective in flight.
    arrived: usize,
    /// Completed collectives so far.
    generation: u64,
    /// Result of the last completed collective.
    result: Vec<f64>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SharedState>,
    completed: Condvar,
}

// =============================================================================
// Mock Backend
// =============================================================================

/// An in-process backend for tests.
///
/// Collectives block until every rank of the world has called them, so a
/// world larger than one needs one thread per rank.
#[derive(Debug)]
pub struct MockBackend {
    rank: usize,
    world_size: usize,
    shared: Arc<Shared>,
}

impl MockBackend {
    /// Creates one backend handle per rank of a new world.
    #[must_use]
    pub fn create_world(world_size: usize) -> Vec<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SharedState {
                buffers: vec![Vec::new(); world_size],
                arrived: 0,
                generation: 0,
                result: Vec::new(),
            }),
            completed: Condvar::new(),
        });

        (0..world_size)
            .map(|rank| MockBackend {
                rank,
                world_size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Creates a single mock backend (rank 0, world size 1).
    #[must_use]
    pub fn single() -> Self {
        let mut world = MockBackend::create_world(1);
        world.remove(0)
    }

    /// Contributes `contribution` to the collective in flight and waits for
    /// the last rank to combine all contributions.
    fn rendezvous(&self, contribution: Vec<f64>, combine: impl FnOnce(&[Vec<f64>]) -> Vec<f64>) -> Vec<f64> {
        let mut state = self.shared.state.lock();
        let generation = state.generation;
        state.buffers[self.rank] = contribution;
        state.arrived += 1;

        if state.arrived == self.world_size {
            let result = combine(state.buffers.as_slice());
            state.result = result;
            state.arrived = 0;
            state.generation += 1;
            self.shared.completed.notify_all();
        } else {
            while state.generation == generation {
                self.shared.completed.wait(&mut state);
            }
        }
        state.result.clone()
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn all_reduce(&self, data: &mut [f64], op: ReduceOp) {
        let reduced = self.rendezvous(data.to_vec(), |all| op.reduce_slices(all));
        for (dst, val) in data.iter_mut().zip(reduced) {
            *dst = val;
        }
    }

    fn broadcast(&self, data: &mut [f64], src: usize) {
        let source = self.rendezvous(data.to_vec(), |all| all.get(src).cloned().unwrap_or_default());
        for (dst, val) in data.iter_mut().zip(source) {
            *dst = val;
        }
    }

    fn all_gather(&self, send_data: &[f64], recv_data: &mut [f64]) {
        let gathered = self.rendezvous(send_data.to_vec(), |all| all.concat());
        for (dst, val) in recv_data.iter_mut().zip(gathered) {
            *dst = val;
        }
    }

    fn barrier(&self) {
        self.rendezvous(Vec::new(), |_| Vec::new());
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn run_world<R: Send + 'static>(
        world_size: usize,
        f: impl Fn(MockBackend) -> R + Send + Sync + 'static,
    ) -> Vec<R> {
        let f = Arc::new(f);
        let handles: Vec<_> = MockBackend::create_world(world_size)
            .into_iter()
            .map(|backend| {
                let f = Arc::clone(&f);
                thread::spawn(move || f(backend))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_reduce_slices() {
        let slices = vec![vec![1.0, 5.0], vec![3.0, 2.0]];
        assert_eq!(ReduceOp::Sum.reduce_slices(&slices), vec![4.0, 7.0]);
        assert_eq!(ReduceOp::Product.reduce_slices(&slices), vec![3.0, 10.0]);
        assert_eq!(ReduceOp::Min.reduce_slices(&slices), vec![1.0, 2.0]);
        assert_eq!(ReduceOp::Max.reduce_slices(&slices), vec![3.0, 5.0]);
        assert_eq!(ReduceOp::Average.reduce_slices(&slices), vec![2.0, 3.5]);
        assert!(ReduceOp::Sum.reduce_slices(&[]).is_empty());
    }

    #[test]
    fn test_mock_single() {
        let backend = MockBackend::single();
        assert_eq!(backend.name(), "mock");
        assert_eq!(backend.rank(), 0);
        assert_eq!(backend.world_size(), 1);

        let mut data = vec![1.0, 2.0];
        backend.all_reduce(&mut data, ReduceOp::Sum);
        assert_eq!(data, vec![1.0, 2.0]);

        let mut recv = vec![0.0; 2];
        backend.all_gather(&[3.0, 4.0], &mut recv);
        assert_eq!(recv, vec![3.0, 4.0]);
        backend.barrier();
    }

    #[test]
    fn test_all_reduce_across_threads() {
        let results = run_world(3, |backend| {
            let mut data = vec![backend.rank() as f64 + 1.0];
            backend.all_reduce(&mut data, ReduceOp::Sum);
            data
        });
        for data in results {
            assert_eq!(data, vec![6.0]);
        }
    }

    #[test]
    fn test_all_gather_rank_order() {
        let results = run_world(2, |backend| {
            let send = vec![backend.rank() as f64; 2];
            let mut recv = vec![0.0; 4];
            backend.all_gather(&send, &mut recv);
            recv
        });
        for recv in results {
            assert_eq!(recv, vec![0.0, 0.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn test_broadcast_and_repeated_collectives() {
        let results = run_world(2, |backend| {
            let mut data = vec![10.0 * (backend.rank() as f64 + 1.0)];
            backend.broadcast(&mut data, 1);
            backend.barrier();
            let mut again = vec![1.0];
            backend.all_reduce(&mut again, ReduceOp::Sum);
            (data[0], again[0])
        });
        for (broadcast, reduced) in results {
            assert_eq!(broadcast, 20.0);
            assert_eq!(reduced, 2.0);
        }
    }
}

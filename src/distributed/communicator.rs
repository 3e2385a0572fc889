//! Collective-communication abstraction for the distributed executor
//! (spec §4.F, §6: "standard MPI collectives - broadcast, all-gather,
//! all-reduce").
//!
//! No MPI binding exists in this crate's dependency stack, so `Communicator`
//! is the seam: [`LocalCommunicator`] is a real, in-process implementation
//! good for single-machine multi-rank testing, grounded on the
//! broadcast/queue pattern in knhk-byzantine's network layer. A
//! process-spanning MPI-backed `Communicator` is an external collaborator
//! that implements this same trait.

use crate::error::{Result, SparseError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// A collective-communication context spanning `size()` ranks.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn name(&self) -> &str;

    /// Gather each rank's `f64` contribution and return the elementwise sum
    /// to every rank (spec §4.F `compute_dot`/`compute_norm2`).
    fn all_reduce_sum(&self, value: f64) -> Result<f64>;

    /// Gather each rank's local vector into one concatenated vector,
    /// delivered to every rank in rank order.
    fn all_gather(&self, local: &[f64]) -> Result<Vec<f64>>;

    /// Gather each rank's local vector onto `root` only; other ranks
    /// receive `None`.
    fn gather_on_root(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>>;
}

struct Barrier {
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

struct BarrierState {
    generation: usize,
    arrived: usize,
    contributions: Vec<Vec<f64>>,
}

/// An in-process `Communicator` where every rank runs as a cooperating
/// thread/task sharing one [`Barrier`]. Grounded on
/// `knhk-byzantine::network::ByzantineNetwork`'s shared-queue rendezvous:
/// each rank deposits its contribution and blocks until all ranks have
/// deposited, then every rank reads the full set.
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
}

impl LocalCommunicator {
    /// Build `size` communicators that all share one rendezvous point —
    /// one per rank, handed out in rank order.
    pub fn group(size: usize) -> Vec<LocalCommunicator> {
        let barrier = Arc::new(Barrier {
            state: Mutex::new(BarrierState {
                generation: 0,
                arrived: 0,
                contributions: vec![Vec::new(); size],
            }),
            condvar: Condvar::new(),
        });
        (0..size)
            .map(|rank| LocalCommunicator {
                rank,
                size,
                barrier: barrier.clone(),
            })
            .collect()
    }

    fn rendezvous(&self, contribution: Vec<f64>) -> Vec<Vec<f64>> {
        let mut guard = self.barrier.state.lock();
        let my_generation = guard.generation;
        guard.contributions[self.rank] = contribution;
        guard.arrived += 1;
        if guard.arrived == self.size {
            guard.generation += 1;
            guard.arrived = 0;
            self.barrier.condvar.notify_all();
            guard.contributions.clone()
        } else {
            self.barrier
                .condvar
                .wait_while(&mut guard, |s| s.generation == my_generation);
            guard.contributions.clone()
        }
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn name(&self) -> &str {
        "local"
    }

    fn all_reduce_sum(&self, value: f64) -> Result<f64> {
        if self.size == 0 {
            return Err(SparseError::MpiError {
                communicator: self.name().to_string(),
                op: "all_reduce_sum".to_string(),
                reason: "communicator has no ranks".to_string(),
            });
        }
        let all = self.rendezvous(vec![value]);
        Ok(all.into_iter().flatten().sum())
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<f64>> {
        let all = self.rendezvous(local.to_vec());
        Ok(all.into_iter().flatten().collect())
    }

    fn gather_on_root(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        if root >= self.size {
            return Err(SparseError::OutOfBounds {
                index: root,
                limit: self.size,
                context: "gather_on_root".to_string(),
            });
        }
        let all = self.rendezvous(local.to_vec());
        if self.rank == root {
            Ok(Some(all.into_iter().flatten().collect()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn all_reduce_sum_across_ranks() {
        let comms = LocalCommunicator::group(4);
        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(i, c)| thread::spawn(move || c.all_reduce_sum(i as f64).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 6.0); // 0+1+2+3
        }
    }

    #[test]
    fn all_gather_concatenates_in_rank_order() {
        let comms = LocalCommunicator::group(3);
        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(i, c)| thread::spawn(move || c.all_gather(&[i as f64, i as f64 * 10.0]).unwrap()))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results {
            assert_eq!(r, &vec![0.0, 0.0, 1.0, 10.0, 2.0, 20.0]);
        }
    }

    #[test]
    fn gather_on_root_only_delivers_to_root() {
        let comms = LocalCommunicator::group(3);
        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(i, c)| thread::spawn(move || c.gather_on_root(&[i as f64], 1).unwrap()))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0], None);
        assert_eq!(results[1], Some(vec![0.0, 1.0, 2.0]));
        assert_eq!(results[2], None);
    }
}

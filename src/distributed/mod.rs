//! Distributed row-partitioned matrix/vector layer (spec §4.F).

mod communicator;
mod index_set;
mod matrix;

pub use communicator::{Communicator, LocalCommunicator};
pub use index_set::RowIndexSet;
pub use matrix::{DistributedDense, DistributedMatrix};

//! Row-partitioned distributed matrix and dense vector (spec §4.F): each
//! rank owns a [`RowIndexSet`] of global rows, stored locally as CSR with
//! global column indices. `apply` all-gathers the replicated right-hand
//! side so every rank's local CSR slice can see the full vector.

use crate::dim::Dim2;
use crate::distributed::communicator::Communicator;
use crate::distributed::index_set::RowIndexSet;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::data::MatrixData;
use crate::matrix::linop::LinOp;
use crate::types::{Scalar, SparseIndex};
use num_traits::{Float, NumCast, ToPrimitive, Zero};
use std::sync::Arc;

/// A matrix whose rows are partitioned across ranks. `local` stores this
/// rank's rows using the matrix's *global* column indices; `apply`
/// all-gathers the replicated input vector before multiplying.
pub struct DistributedMatrix<V, I> {
    global_dim: Dim2,
    row_set: RowIndexSet,
    local: Csr<V, I>,
    comm: Arc<dyn Communicator>,
}

impl<V: Scalar, I: SparseIndex> DistributedMatrix<V, I> {
    /// `local` must be a CSR over `row_set.len()` rows and `global_dim.cols`
    /// columns, using global column indices.
    pub fn new(
        global_dim: Dim2,
        row_set: RowIndexSet,
        local: Csr<V, I>,
        comm: Arc<dyn Communicator>,
    ) -> Result<Self> {
        if local.dim().rows != row_set.len() || local.dim().cols != global_dim.cols {
            return Err(SparseError::DimensionMismatch {
                operation: "DistributedMatrix::new".to_string(),
                expected: (row_set.len(), global_dim.cols),
                actual: (local.dim().rows, local.dim().cols),
            });
        }
        Ok(Self { global_dim, row_set, local, comm })
    }

    pub fn global_dim(&self) -> Dim2 {
        self.global_dim
    }

    pub fn row_set(&self) -> &RowIndexSet {
        &self.row_set
    }

    /// Flatten this rank's local block as `[nnz, (global_row, col,
    /// value)...]` so it can travel through the f64-only collective
    /// primitives: local row indices are translated to global rows via
    /// `row_set` before sending.
    fn encode_local_block(&self) -> Vec<f64> {
        let global_rows: Vec<usize> = self.row_set.iter().collect();
        let data = self.local.write();
        let mut encoded = Vec::with_capacity(1 + data.nnz() * 3);
        encoded.push(data.nnz() as f64);
        for (r, c, v) in data.iter() {
            encoded.push(global_rows[r.to_usize()] as f64);
            encoded.push(c.to_usize() as f64);
            encoded.push(v.to_f64().unwrap_or(0.0));
        }
        encoded
    }

    /// Decode the concatenation of every rank's `encode_local_block` output
    /// (as produced by `Communicator::all_gather`/`gather_on_root`, which
    /// preserve rank order) back into one matrix over `global_dim`.
    fn decode_blocks(flat: &[f64], global_dim: Dim2) -> MatrixData<V, I> {
        let mut data = MatrixData::new(global_dim);
        let mut i = 0;
        while i < flat.len() {
            let nnz = flat[i] as usize;
            i += 1;
            for _ in 0..nnz {
                let r = flat[i] as usize;
                let c = flat[i + 1] as usize;
                let v = V::from(flat[i + 2]).unwrap_or_else(V::zero);
                data.push(I::from_usize(r), I::from_usize(c), v);
                i += 3;
            }
        }
        data
    }

    /// Assemble the full matrix at every rank via an all-gather of local
    /// CSR blocks, preserving `global_dim.cols` as the stride of the
    /// result.
    pub fn gather_on_all(&self) -> Result<Csr<V, I>> {
        let encoded = self.encode_local_block();
        let flat = self.comm.all_gather(&encoded)?;
        Ok(Csr::read(&Self::decode_blocks(&flat, self.global_dim)))
    }

    /// Assemble the full matrix on `root` only; other ranks get `None`.
    pub fn gather_on_root(&self, root: usize) -> Result<Option<Csr<V, I>>> {
        let encoded = self.encode_local_block();
        let flat = self.comm.gather_on_root(&encoded, root)?;
        Ok(flat.map(|flat| Csr::read(&Self::decode_blocks(&flat, self.global_dim))))
    }

    /// `local_x` is this rank's contribution to a replicated global vector
    /// (spec §4.F: "apply with all-gather of replicated ... right-hand
    /// sides"); the full vector is assembled before the local SpMV runs.
    pub fn apply(&self, local_x: &[f64]) -> Result<Vec<f64>> {
        let global_x = self.comm.all_gather(local_x)?;
        if global_x.len() != self.global_dim.cols {
            return Err(SparseError::DimensionMismatch {
                operation: "DistributedMatrix::apply".to_string(),
                expected: (1, self.global_dim.cols),
                actual: (1, global_x.len()),
            });
        }
        let x: Vec<V> = global_x.iter().map(|&v| V::from(v).unwrap_or_else(V::zero)).collect();
        let mut y = vec![V::zero(); self.local.dim().rows];
        self.local.apply_dyn(&x, &mut y)?;
        Ok(y.into_iter().map(|v| v.to_f64().unwrap_or(0.0)).collect())
    }
}

// Csr::apply requires V: Scalar but LinOp::apply signature matches; add a
// thin dyn-agnostic wrapper since DistributedMatrix works in f64 at the
// collective boundary regardless of the local value type.
impl<V: Scalar, I: SparseIndex> Csr<V, I> {
    fn apply_dyn(&self, x: &[V], y: &mut [V]) -> Result<()> {
        use crate::matrix::linop::LinOp;
        self.apply(x, y)
    }
}

/// A dense vector partitioned the same way as [`DistributedMatrix`]'s rows.
pub struct DistributedDense<V> {
    row_set: RowIndexSet,
    local: Vec<V>,
    comm: Arc<dyn Communicator>,
}

impl<V: Scalar> DistributedDense<V> {
    pub fn new(row_set: RowIndexSet, local: Vec<V>, comm: Arc<dyn Communicator>) -> Result<Self> {
        if local.len() != row_set.len() {
            return Err(SparseError::DimensionMismatch {
                operation: "DistributedDense::new".to_string(),
                expected: (row_set.len(), 1),
                actual: (local.len(), 1),
            });
        }
        Ok(Self { row_set, local, comm })
    }

    pub fn local(&self) -> &[V] {
        &self.local
    }

    pub fn row_set(&self) -> &RowIndexSet {
        &self.row_set
    }

    /// Assemble the full global vector on every rank.
    pub fn gather_on_all(&self) -> Result<Vec<V>> {
        let local_f64: Vec<f64> = self.local.iter().map(|v| v.to_f64().unwrap_or(0.0)).collect();
        let gathered = self.comm.all_gather(&local_f64)?;
        Ok(gathered.into_iter().map(|v| V::from(v).unwrap_or_else(V::zero)).collect())
    }

    /// Assemble the full global vector on `root` only.
    pub fn gather_on_root(&self, root: usize) -> Result<Option<Vec<V>>> {
        let local_f64: Vec<f64> = self.local.iter().map(|v| v.to_f64().unwrap_or(0.0)).collect();
        let gathered = self.comm.gather_on_root(&local_f64, root)?;
        Ok(gathered.map(|g| g.into_iter().map(|v| V::from(v).unwrap_or_else(V::zero)).collect()))
    }

    /// Global dot product via local partial sums plus an all-reduce.
    pub fn compute_dot(&self, other: &DistributedDense<V>) -> Result<V> {
        if self.local.len() != other.local.len() {
            return Err(SparseError::DimensionMismatch {
                operation: "DistributedDense::compute_dot".to_string(),
                expected: (self.local.len(), 1),
                actual: (other.local.len(), 1),
            });
        }
        let local_dot: f64 = self
            .local
            .iter()
            .zip(other.local.iter())
            .map(|(a, b)| (*a * *b).to_f64().unwrap_or(0.0))
            .sum();
        let global = self.comm.all_reduce_sum(local_dot)?;
        Ok(V::from(global).unwrap_or_else(V::zero))
    }

    /// Global Euclidean norm via `compute_dot(self, self)`.
    pub fn compute_norm2(&self) -> Result<V> {
        let dot = self.compute_dot(self)?;
        Ok(dot.sqrt())
    }
}

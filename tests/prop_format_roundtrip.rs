// tests/prop_format_roundtrip.rs
// Property-based test: every storage format round-trips through Dense
// without losing or inventing a nonzero, and a permutation composed with
// its own inverse is the identity.

use proptest::prelude::*;
use sparkernel::dim::Dim2;
use sparkernel::matrix::convert::{csr_from_dense, dense_from_csr};
use sparkernel::matrix::{Csr, Dense, Ell, LinOp, Permutation, SellP};
use sparkernel::types::SparseIndex;

fn dense_strategy(max_rows: usize, max_cols: usize) -> impl Strategy<Value = Dense<f64>> {
    (1..=max_rows, 1..=max_cols).prop_flat_map(|(rows, cols)| {
        let n = rows * cols;
        (
            Just(rows),
            Just(cols),
            prop::collection::vec(-10.0f64..10.0, n),
            prop::collection::vec(prop::bool::ANY, n),
        )
            .prop_map(|(rows, cols, values, mask)| {
                let mut dense: Dense<f64> = Dense::zeros(Dim2::new(rows, cols));
                for r in 0..rows {
                    for c in 0..cols {
                        if mask[r * cols + c] {
                            dense.set(r, c, values[r * cols + c]);
                        }
                    }
                }
                dense
            })
    })
}

fn permutation_strategy(n: usize) -> impl Strategy<Value = Permutation<i32>> {
    prop::collection::vec(0u32..1_000_000, n).prop_map(move |keys| {
        let mut idx: Vec<usize> = (0..n).collect();
        idx.sort_by_key(|&i| keys[i]);
        let perm: Vec<i32> = idx.iter().map(|&i| i as i32).collect();
        Permutation::new(perm).expect("argsort always yields a valid permutation")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn dense_csr_dense_preserves_every_entry(dense in dense_strategy(6, 6)) {
        let csr: Csr<f64, i32> = csr_from_dense(&dense);
        let back = dense_from_csr(&csr);
        for r in 0..dense.dim().rows {
            for c in 0..dense.dim().cols {
                prop_assert_eq!(back.get(r, c), dense.get(r, c));
            }
        }
    }

    #[test]
    fn dense_ell_csr_dense_preserves_every_entry(dense in dense_strategy(6, 6)) {
        let csr: Csr<f64, i32> = csr_from_dense(&dense);
        let max_nnz = (0..csr.dim().rows).map(|r| csr.row_nnz(r)).max().unwrap_or(0);
        let ell = Ell::from_csr(&csr, max_nnz).unwrap();
        let back = dense_from_csr(&ell.to_csr());
        for r in 0..dense.dim().rows {
            for c in 0..dense.dim().cols {
                prop_assert_eq!(back.get(r, c), dense.get(r, c));
            }
        }
    }

    #[test]
    fn dense_sellp_csr_dense_preserves_every_entry(dense in dense_strategy(9, 6)) {
        let csr: Csr<f64, i32> = csr_from_dense(&dense);
        let sellp = SellP::from_csr(&csr, 3, 2).unwrap();
        let back = dense_from_csr(&sellp.to_csr());
        for r in 0..dense.dim().rows {
            for c in 0..dense.dim().cols {
                prop_assert_eq!(back.get(r, c), dense.get(r, c));
            }
        }
    }

    #[test]
    fn permutation_composed_with_its_inverse_is_identity(perm in (1usize..8).prop_flat_map(permutation_strategy)) {
        let inv = perm.inverse();
        for (i, &p) in perm.as_slice().iter().enumerate() {
            prop_assert_eq!(inv.as_slice()[p.to_usize()].to_usize(), i);
        }
    }
}

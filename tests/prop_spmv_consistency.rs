// tests/prop_spmv_consistency.rs
// Property-based test: every storage format derived from the same CSR
// matrix produces the same SpMV result, within floating-point tolerance.

use proptest::prelude::*;
use sparkernel::dim::Dim2;
use sparkernel::matrix::convert::csr_from_dense;
use sparkernel::matrix::{Coo, Csr, Dense, Ell, Hybrid, HybridStrategy, LinOp, SellP};

fn matrix_and_vector_strategy(max_rows: usize, max_cols: usize) -> impl Strategy<Value = (Csr<f64, i32>, Vec<f64>)> {
    (1..=max_rows, 1..=max_cols).prop_flat_map(|(rows, cols)| {
        let n = rows * cols;
        (
            Just(rows),
            Just(cols),
            prop::collection::vec(-5.0f64..5.0, n),
            prop::collection::vec(prop::bool::ANY, n),
            prop::collection::vec(-5.0f64..5.0, cols),
        )
            .prop_map(move |(rows, cols, values, mask, x)| {
                let mut dense: Dense<f64> = Dense::zeros(Dim2::new(rows, cols));
                for r in 0..rows {
                    for c in 0..cols {
                        if mask[r * cols + c] {
                            dense.set(r, c, values[r * cols + c]);
                        }
                    }
                }
                (csr_from_dense(&dense), x)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn every_format_matches_csr_spmv((csr, x) in matrix_and_vector_strategy(6, 6)) {
        let mut y_csr = vec![0.0; csr.dim().rows];
        csr.apply(&x, &mut y_csr).unwrap();

        let coo = Coo::read(&csr.write());
        let mut y_coo = vec![0.0; csr.dim().rows];
        coo.apply(&x, &mut y_coo).unwrap();
        prop_assert!((0..csr.dim().rows).all(|i| (y_csr[i] - y_coo[i]).abs() < 1e-8));

        let max_nnz = (0..csr.dim().rows).map(|r| csr.row_nnz(r)).max().unwrap_or(0).max(1);
        let ell = Ell::from_csr(&csr, max_nnz).unwrap();
        let mut y_ell = vec![0.0; csr.dim().rows];
        ell.apply(&x, &mut y_ell).unwrap();
        prop_assert!((0..csr.dim().rows).all(|i| (y_csr[i] - y_ell[i]).abs() < 1e-8));

        let sellp = SellP::from_csr(&csr, 2, 1).unwrap();
        let mut y_sellp = vec![0.0; csr.dim().rows];
        sellp.apply(&x, &mut y_sellp).unwrap();
        prop_assert!((0..csr.dim().rows).all(|i| (y_csr[i] - y_sellp[i]).abs() < 1e-8));

        let sellp_strided = SellP::from_csr(&csr, 2, 4).unwrap();
        let mut y_sellp_strided = vec![0.0; csr.dim().rows];
        sellp_strided.apply(&x, &mut y_sellp_strided).unwrap();
        prop_assert!((0..csr.dim().rows).all(|i| (y_csr[i] - y_sellp_strided[i]).abs() < 1e-8));

        for strategy in [
            HybridStrategy::MinimalStorage,
            HybridStrategy::ImbalanceBounded,
            HybridStrategy::Automatic,
            HybridStrategy::ColumnLimit(2),
        ] {
            let hybrid = Hybrid::from_csr(&csr, strategy).unwrap();
            let mut y_hybrid = vec![0.0; csr.dim().rows];
            hybrid.apply(&x, &mut y_hybrid).unwrap();
            prop_assert!((0..csr.dim().rows).all(|i| (y_csr[i] - y_hybrid[i]).abs() < 1e-8));
        }
    }
}

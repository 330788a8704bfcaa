//! Dense linear kernels, float path.
//!
//! Both kernels share one layout contract, declared in their signatures:
//! the weight matrix `w` is column-major `m x n`, batches are row-major with
//! one sample per row. The actual multiply goes through the strided GEMM
//! wrapper in `matmul`, so the optional `matrixmultiply` backend serves both
//! directions.
//!
//! Shape mismatches are programmer errors and panic via `assert!`; an empty
//! batch is a no-op.

use crate::matmul::gemm_f32;
use crate::matrix::{ColMajor, Mat, MatMut, RowMajor};

/// Forward transform: `y[k][j] = Σ_i x[k][i] * w[i][j]` for every sample `k`.
///
/// `w` is `m x n`, `x` is `batch_len x m`, `y` is `batch_len x n`. There is
/// no bias term.
pub fn trans(w: Mat<'_, f32, ColMajor>, x: Mat<'_, f32, RowMajor>, y: &mut MatMut<'_, f32, RowMajor>) {
    let (m, n) = (w.rows(), w.cols());
    let batch_len = x.rows();

    assert!(m > 0 && n > 0, "weight matrix must be non-empty");
    assert_eq!(
        x.cols(),
        m,
        "input width {} does not match weight rows {m}",
        x.cols()
    );
    assert_eq!(
        y.rows(),
        batch_len,
        "output batch {} does not match input batch {batch_len}",
        y.rows()
    );
    assert_eq!(
        y.cols(),
        n,
        "output width {} does not match weight cols {n}",
        y.cols()
    );

    if batch_len == 0 {
        return;
    }

    let (rsx, csx) = x.strides();
    let (rsw, csw) = w.strides();
    let (rsy, csy) = y.strides();
    gemm_f32(
        batch_len,
        n,
        m,
        1.0,
        x.as_slice(),
        rsx,
        csx,
        w.as_slice(),
        rsw,
        csw,
        0.0,
        y.as_mut_slice(),
        rsy,
        csy,
    );
}

/// Backprop transform: `dx[k][i] = Σ_j dy[k][j] * w[i][j]` for every sample.
///
/// Computes the upstream gradient from the downstream gradient and the same
/// weight matrix used by [`trans`]: `dx = dy · Wᵗ` per sample. `w` is
/// `m x n`, `dy` is `batch_len x n`, `dx` is `batch_len x m`.
pub fn loss(w: Mat<'_, f32, ColMajor>, dy: Mat<'_, f32, RowMajor>, dx: &mut MatMut<'_, f32, RowMajor>) {
    let (m, n) = (w.rows(), w.cols());
    let batch_len = dy.rows();

    assert!(m > 0 && n > 0, "weight matrix must be non-empty");
    assert_eq!(
        dy.cols(),
        n,
        "downstream gradient width {} does not match weight cols {n}",
        dy.cols()
    );
    assert_eq!(
        dx.rows(),
        batch_len,
        "upstream batch {} does not match downstream batch {batch_len}",
        dx.rows()
    );
    assert_eq!(
        dx.cols(),
        m,
        "upstream gradient width {} does not match weight rows {m}",
        dx.cols()
    );

    if batch_len == 0 {
        return;
    }

    // dy (batch x n) times the transposed weights (n x m). The transposed
    // view flips the column-major buffer into row-major n x m for free.
    let wt = w.transposed();
    let (rsd, csd) = dy.strides();
    let (rsw, csw) = wt.strides();
    let (rsx, csx) = dx.strides();
    gemm_f32(
        batch_len,
        m,
        n,
        1.0,
        dy.as_slice(),
        rsd,
        csd,
        wt.as_slice(),
        rsw,
        csw,
        0.0,
        dx.as_mut_slice(),
        rsx,
        csx,
    );
}

//! Weight-update kernels.
//!
//! Both kernels mutate the weight matrix in place from an input batch `x`
//! and a downstream gradient batch `dy`, using the same layout contract as
//! the linear kernels (column-major weights, row-major batches).
//!
//! Design notes:
//! - SGD is pure and stateless.
//! - Adam state (moment matrices + step counter) lives outside the weight
//!   matrix, is never persisted, and its lifetime mirrors the weight matrix
//!   it is attached to. The step counter starts at 1, advances once per
//!   call, and is also returned so driving code can report it.

use crate::matmul::gemm_f32;
use crate::matrix::{ColMajor, Mat, MatMut, RowMajor};

/// Adam hyperparameters.
///
/// `rate` is passed per call to support schedules, so it is not part of the
/// parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamParams {
    pub beta1: f32,
    pub beta2: f32,
    /// Added after the square root; keeps the update finite while the
    /// second-moment estimate is still zero early in training.
    pub epsilon: f32,
}

impl Default for AdamParams {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// Per-weight-matrix Adam state: first/second moment estimates and the step
/// counter.
#[derive(Debug, Clone)]
pub struct AdamState {
    mom: Vec<f32>,
    veloc: Vec<f32>,
    t: u32,
}

impl AdamState {
    /// Zeroed moments for an `m x n` weight matrix, step counter at 1.
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            mom: vec![0.0; m * n],
            veloc: vec![0.0; m * n],
            t: 1,
        }
    }

    /// The step counter consumed by the next [`train_adam`] call.
    #[inline]
    pub fn counter(&self) -> u32 {
        self.t
    }
}

/// SGD update: `w[i][j] -= rate * Σ_k dy[k][j] * x[k][i]`.
///
/// `x` is `batch_len x m`, `dy` is `batch_len x n`, `w` is `m x n`.
/// An empty batch is a no-op.
pub fn train_sgd(
    x: Mat<'_, f32, RowMajor>,
    dy: Mat<'_, f32, RowMajor>,
    rate: f32,
    w: &mut MatMut<'_, f32, ColMajor>,
) {
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
        dy.rows(),
        batch_len,
        "gradient batch {} does not match input batch {batch_len}",
        dy.rows()
    );
    assert_eq!(
        dy.cols(),
        n,
        "gradient width {} does not match weight cols {n}",
        dy.cols()
    );

    if batch_len == 0 {
        return;
    }

    // w viewed transposed is row-major n x m, which matches the natural
    // output orientation of dyᵗ (n x batch) times x (batch x m):
    // wᵗ -= rate * dyᵗ * x, accumulated via beta = 1.
    let (rsd, csd) = dy.strides();
    let (rsx, csx) = x.strides();
    gemm_f32(
        n,
        m,
        batch_len,
        -rate,
        dy.as_slice(),
        csd, // walk dy column-wise: element (j, k) sits at k * n + j
        rsd,
        x.as_slice(),
        rsx,
        csx,
        1.0,
        w.as_mut_slice(),
        m,
        1,
    );
}

/// Adam update; returns the advanced step counter.
///
/// Per weight cell and batch sample, with `g = dy[k][j] * x[k][i]`:
///
/// ```text
/// mom   = beta1 * mom   + (1 - beta1) * g
/// veloc = beta2 * veloc + (1 - beta2) * g²
/// w    -= rate * (mom / (1 - beta1ᵗ)) / (sqrt(veloc / (1 - beta2ᵗ)) + epsilon)
/// ```
///
/// The moments update once per batch sample; the counter `t` advances once
/// per call. Callers persist the counter between calls via `state`.
pub fn train_adam(
    x: Mat<'_, f32, RowMajor>,
    dy: Mat<'_, f32, RowMajor>,
    rate: f32,
    params: AdamParams,
    state: &mut AdamState,
    w: &mut MatMut<'_, f32, ColMajor>,
) -> u32 {
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
        dy.rows(),
        batch_len,
        "gradient batch {} does not match input batch {batch_len}",
        dy.rows()
    );
    assert_eq!(
        dy.cols(),
        n,
        "gradient width {} does not match weight cols {n}",
        dy.cols()
    );
    assert_eq!(
        state.mom.len(),
        m * n,
        "adam state len {} does not match weight len {}",
        state.mom.len(),
        m * n
    );

    let AdamParams {
        beta1,
        beta2,
        epsilon,
    } = params;
    let corr1 = 1.0 - beta1.powi(state.t as i32);
    let corr2 = 1.0 - beta2.powi(state.t as i32);

    let xs = x.as_slice();
    let dys = dy.as_slice();
    let ws = w.as_mut_slice();

    for j in 0..n {
        let col = j * m;
        let wr = &mut ws[col..col + m];
        let mr = &mut state.mom[col..col + m];
        let vr = &mut state.veloc[col..col + m];

        for k in 0..batch_len {
            let xr = &xs[k * m..(k + 1) * m];
            let dr = dys[k * n + j];

            for i in 0..m {
                let g = dr * xr[i];
                mr[i] = beta1 * mr[i] + (1.0 - beta1) * g;
                vr[i] = beta2 * vr[i] + (1.0 - beta2) * (g * g);

                let m_hat = mr[i] / corr1;
                let v_hat = vr[i] / corr2;
                wr[i] -= rate * m_hat / (v_hat.sqrt() + epsilon);
            }
        }
    }

    state.t += 1;
    state.t
}

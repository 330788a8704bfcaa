//! Dense kernels, Q1.6 fixed-point path.
//!
//! Mirrors the float kernels over 8-bit cells for resource-constrained
//! inference. Layout contracts are identical: column-major weights, row-major
//! batches. Every output cell is accumulated in a wide integer from
//! [`fixed::mult`] products.
//!
//! Scale tracking: the forward kernel shifts the accumulator right by one
//! bit before narrowing, the backprop kernel shifts left by one bit. The two
//! shifts are a matched pair calibrated for the Q1.6 single-hidden-layer
//! configuration; changing one without the other breaks the round-trip
//! scale. A forward pass followed by an identity-gradient backward pass has
//! no net scale drift.

use rand::Rng;

use crate::fixed::{self, mult};
use crate::matrix::{ColMajor, Mat, MatMut, RowMajor};

/// Forward transform: `y[k][j] = (Σ_i mult(w[i][j], x[k][i])) >> 1`.
///
/// `w` is `m x n`, `x` is `batch_len x m`, `y` is `batch_len x n`.
/// An empty batch is a no-op.
pub fn linear(w: Mat<'_, i8, ColMajor>, x: Mat<'_, i8, RowMajor>, y: &mut MatMut<'_, i8, RowMajor>) {
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

    let ws = w.as_slice();
    let xs = x.as_slice();
    let ys = y.as_mut_slice();

    for k in 0..batch_len {
        let xr = &xs[k * m..(k + 1) * m];
        let yr = &mut ys[k * n..(k + 1) * n];
        for (j, out) in yr.iter_mut().enumerate() {
            let wr = &ws[j * m..(j + 1) * m];
            let mut acc = 0_i32;
            for i in 0..m {
                acc += mult(wr[i], xr[i]) as i32;
            }
            // De-scale back into 8 bits while keeping the accumulation wide.
            *out = (acc >> 1) as i8;
        }
    }
}

/// Backprop transform: `dx[k][i] = (Σ_j mult(dy[k][j], w[i][j])) << 1`.
///
/// The left shift undoes the scale lost in the forward kernel's right shift.
/// `w` is `m x n`, `dy` is `batch_len x n`, `dx` is `batch_len x m`.
///
/// With the `parallel` feature the per-sample rows are processed on the
/// rayon pool; each row writes disjoint output cells and reads shared,
/// never-mutated inputs.
pub fn loss(w: Mat<'_, i8, ColMajor>, dy: Mat<'_, i8, RowMajor>, dx: &mut MatMut<'_, i8, RowMajor>) {
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

    let ws = w.as_slice();

    let row = |dyr: &[i8], dxr: &mut [i8]| {
        for (i, out) in dxr.iter_mut().enumerate() {
            let mut acc = 0_i32;
            for j in 0..n {
                acc += mult(dyr[j], ws[j * m + i]) as i32;
            }
            *out = (acc << 1) as i8;
        }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        dx.as_mut_slice()
            .par_chunks_mut(m)
            .zip(dy.as_slice().par_chunks(n))
            .for_each(|(dxr, dyr)| row(dyr, dxr));
    }

    #[cfg(not(feature = "parallel"))]
    dx.as_mut_slice()
        .chunks_mut(m)
        .zip(dy.as_slice().chunks(n))
        .for_each(|(dxr, dyr)| row(dyr, dxr));
}

/// SGD update: `w[i][j] -= mult(mult(dy[k][j], rate), x[k][i])` accumulated
/// over the batch.
///
/// `rate` is itself a Q1.6 value ([`fixed::ONE`] is a rate of 1.0). Weight
/// cells saturate rather than wrap.
pub fn train_sgd(
    x: Mat<'_, i8, RowMajor>,
    dy: Mat<'_, i8, RowMajor>,
    rate: i8,
    w: &mut MatMut<'_, i8, ColMajor>,
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

    let xs = x.as_slice();
    let dys = dy.as_slice();
    let ws = w.as_mut_slice();

    for j in 0..n {
        let wr = &mut ws[j * m..(j + 1) * m];
        for k in 0..batch_len {
            let xr = &xs[k * m..(k + 1) * m];
            let a = mult(dys[k * n + j], rate);
            for i in 0..m {
                wr[i] = wr[i].saturating_sub(mult(a, xr[i]));
            }
        }
    }
}

/// Index and value of the maximum element; ties resolve to the first index.
///
/// Panics if `x` is empty.
pub fn argmax(x: &[i8]) -> (usize, i8) {
    assert!(!x.is_empty(), "argmax of an empty vector");

    let mut max_pos = 0;
    let mut max = x[0];
    for (i, &v) in x.iter().enumerate() {
        if v > max {
            max = v;
            max_pos = i;
        }
    }
    (max_pos, max)
}

/// Softmax over Q1.6 cells written into `out` as Q1.6 probabilities.
///
/// The maximum is subtracted before exponentiating; the outputs are
/// normalized so they sum to approximately [`fixed::ONE`] (64). The
/// exponentials run in float internally, which is fine for an
/// inference-side reduction of at most 128-valued cells.
pub fn softmax(x: &[i8], out: &mut [i8]) {
    assert_eq!(
        x.len(),
        out.len(),
        "input len {} does not match output len {}",
        x.len(),
        out.len()
    );
    let (_, max) = argmax(x);

    let mut sum = 0.0_f32;
    let mut exps = vec![0.0_f32; x.len()];
    for (e, &v) in exps.iter_mut().zip(x) {
        *e = ((v as i16 - max as i16) as f32 / fixed::SCALE as f32).exp();
        sum += *e;
    }
    for (o, &e) in out.iter_mut().zip(&exps) {
        *o = fixed::from_f32(e / sum);
    }
}

/// Elementwise difference `v1 - v2` written into `deltas`, returning the
/// mean squared difference in float units.
///
/// `deltas` is overwritten. The differences saturate at the i8 range.
pub fn vec_delta(v1: &[i8], v2: &[i8], deltas: &mut [i8]) -> f64 {
    assert_eq!(
        v1.len(),
        v2.len(),
        "vector len {} does not match vector len {}",
        v1.len(),
        v2.len()
    );
    assert_eq!(
        v1.len(),
        deltas.len(),
        "vector len {} does not match deltas len {}",
        v1.len(),
        deltas.len()
    );
    if v1.is_empty() {
        return 0.0;
    }

    let mut error = 0.0_f64;
    for i in 0..v1.len() {
        deltas[i] = v1[i].saturating_sub(v2[i]);
        let d = fixed::to_f32(deltas[i]) as f64;
        error += d * d;
    }
    error / v1.len() as f64
}

/// Zero each element of `vec` with probability `p`, writing into `out`.
pub fn dropout<R: Rng + ?Sized>(vec: &[i8], p: f32, rng: &mut R, out: &mut [i8]) {
    assert_eq!(
        vec.len(),
        out.len(),
        "input len {} does not match output len {}",
        vec.len(),
        out.len()
    );
    debug_assert!((0.0..=1.0).contains(&p), "p must be in [0, 1], got {p}");

    for (o, &v) in out.iter_mut().zip(vec) {
        *o = if rng.gen::<f32>() < p { 0 } else { v };
    }
}

/// Zero every weight whose magnitude does not exceed `threshold`.
///
/// Pruning hides near-zero connections to shrink the effective network; a
/// threshold of 32 drops weights in [-0.5, 0.5].
pub fn prune(w: &mut [i8], threshold: i8) {
    for v in w.iter_mut() {
        if (*v as i16).abs() <= threshold as i16 {
            *v = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::{approx_eq, from_f32};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(values: &[f32]) -> Vec<i8> {
        values.iter().copied().map(from_f32).collect()
    }

    // Same 5 x 7 reference matrix as the float kernel tests, quantized.
    fn reference_weights() -> Vec<i8> {
        q(&[
            0.3, 0.4, 0.199, 0.4, 0.2, //
            0.1, -0.8, 0.5, -0.2, 0.5, //
            0.5, -0.1, -0.5, 0.2, -0.5, //
            0.1, -0.8, 0.5, -0.2, 0.5, //
            0.6, 0.3, 1.0, -0.8, 0.1, //
            0.1, -0.8, 0.5, -0.2, 0.5, //
            0.1, -0.8, 0.5, -0.2, 0.5, //
        ])
    }

    #[test]
    fn linear_matches_the_float_reference_at_half_scale() {
        let w = reference_weights();
        let x = q(&[0.4, 0.8, 0.1, 0.66, 0.2]);
        // The forward right shift halves the float reference values.
        let expected = q(&[
            0.7639 / 2.0,
            -0.582 / 2.0,
            0.102 / 2.0,
            -0.582 / 2.0,
            0.072 / 2.0,
            -0.582 / 2.0,
            -0.582 / 2.0,
        ]);

        let mut y = [0_i8; 7];
        linear(
            Mat::new(&w, 5, 7),
            Mat::new(&x, 1, 5),
            &mut MatMut::new(&mut y, 1, 7),
        );

        assert!(approx_eq(&expected, &y, 3), "y={y:?}");
    }

    #[test]
    fn loss_matches_the_float_reference_at_double_scale() {
        let w = q(&[
            -0.30556, -0.61112, -0.07639, -0.504174, -0.15278, //
            0.2328, 0.4656, 0.0582, 0.38412, 0.1164, //
            -0.0408, -0.0816, -0.0102, -0.06732, -0.0204, //
            0.2328, 0.4656, 0.0582, 0.38412, 0.1164, //
            -0.0288, -0.0576, -0.0072, -0.04752, -0.0144, //
            0.2328, 0.4656, 0.0582, 0.38412, 0.1164, //
            0.2328, 0.4656, 0.0582, 0.38412, 0.1164, //
        ]);
        let dy = q(&[0.7639, -0.582, 0.102, -0.582, 0.072, -0.582, -0.582]);
        // The backward left shift doubles the float reference values. The
        // second element (-1.56 * 2) saturates out of Q1.6 and is skipped.
        let expected_f32 = [
            -0.781610884 * 2.0,
            f32::NAN,
            -0.195402721 * 2.0,
            f32::NAN,
            -0.390805442 * 2.0,
        ];

        let mut dx = [0_i8; 5];
        loss(
            Mat::new(&w, 5, 7),
            Mat::new(&dy, 1, 7),
            &mut MatMut::new(&mut dx, 1, 5),
        );

        for (i, &e) in expected_f32.iter().enumerate() {
            if e.is_nan() {
                continue;
            }
            let expected = from_f32(e);
            assert!(
                (dx[i] as i16 - expected as i16).abs() < 5,
                "dx[{i}]={} expected {expected}",
                dx[i]
            );
        }
    }

    #[test]
    fn forward_backward_shifts_cancel() {
        // A 1 x 1 unit weight makes the transform the identity, so the
        // forward right shift and the backward left shift are the only scale
        // changes. Feeding the forward output back as the identity gradient
        // must recover the input exactly: no net scale drift.
        let w = [fixed::ONE];
        let x = [40_i8, -24, 16, 8];

        let mut y = [0_i8; 4];
        linear(
            Mat::new(&w, 1, 1),
            Mat::new(&x, 4, 1),
            &mut MatMut::new(&mut y, 4, 1),
        );
        assert_eq!(y, [20, -12, 8, 4]);

        let mut dx = [0_i8; 4];
        loss(
            Mat::new(&w, 1, 1),
            Mat::new(&y, 4, 1),
            &mut MatMut::new(&mut dx, 4, 1),
        );
        assert_eq!(dx, x);
    }

    #[test]
    fn train_sgd_matches_the_reference_vectors() {
        let x = q(&[0.4, 0.8, 0.1, 0.66, 0.2]);
        let dy = [97_i8, -74, 13, -74, 9, -74, -74];
        let mut w = [0_i8; 35];

        let expected = [
            -39_i8, -78, -10, -64, -19, //
            30, 59, 7, 49, 15, //
            -5, -10, -1, -9, -3, //
            30, 59, 7, 49, 15, //
            -4, -7, -1, -6, -2, //
            30, 59, 7, 49, 15, //
            30, 59, 7, 49, 15, //
        ];

        train_sgd(
            Mat::new(&x, 1, 5),
            Mat::new(&dy, 1, 7),
            fixed::ONE,
            &mut MatMut::new(&mut w, 5, 7),
        );

        assert!(approx_eq(&expected, &w, 3), "w={w:?}");
    }

    #[test]
    fn argmax_breaks_ties_towards_the_lower_index() {
        let y = q(&[0.7639, -0.582, 0.102, -0.582, 0.072, -0.582, -0.582]);
        let (pos, max) = argmax(&y);
        assert_eq!(pos, 0);
        assert_eq!(max, from_f32(0.7639));

        let y2 = q(&[-0.7639, -0.582, 0.102, -0.582, 0.072, 0.582, 0.582]);
        let (pos, max) = argmax(&y2);
        assert_eq!(pos, 5);
        assert_eq!(max, from_f32(0.582));
    }

    #[test]
    fn softmax_sums_to_one_in_q_units() {
        let x = q(&[0.7639, -0.582, 0.102, -0.582, 0.072, -0.582, -0.582]);
        let mut xs = [0_i8; 7];
        softmax(&x, &mut xs);

        let sum: i16 = xs.iter().map(|&v| v as i16).sum();
        // Quantizing each probability costs at most half an LSB.
        assert!(
            (sum - fixed::ONE as i16).abs() <= (x.len() / 2 + 1) as i16,
            "sum={sum}"
        );
    }

    #[test]
    fn vec_delta_reports_error_in_float_units() {
        let a = [fixed::ONE, 0];
        let b = [0_i8, 0];
        let mut deltas = [0_i8; 2];
        let error = vec_delta(&a, &b, &mut deltas);
        assert_eq!(deltas, [fixed::ONE, 0]);
        assert!((error - 0.5).abs() < 1e-9);
    }

    #[test]
    fn dropout_keeps_or_zeroes() {
        let y = q(&[0.7639, -0.582, 0.102, -0.582, 0.072, -0.582, -0.582]);
        let mut d = [0_i8; 7];
        let mut rng = StdRng::seed_from_u64(3);
        dropout(&y, 0.5, &mut rng, &mut d);

        for (orig, dropped) in y.iter().zip(&d) {
            assert!(*dropped == 0 || dropped == orig);
        }
    }

    #[test]
    fn prune_zeroes_small_magnitudes() {
        let mut w = [-64_i8, -33, -32, 0, 10, 32, 33, 64];
        prune(&mut w, 32);
        assert_eq!(w, [-64, -33, 0, 0, 0, 0, 33, 64]);
    }
}

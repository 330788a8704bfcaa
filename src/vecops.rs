//! Vector reductions and helpers shared by the float kernels.

use rand::Rng;

/// Elementwise difference `v1 - v2` written into `deltas`, returning the
/// mean squared difference.
///
/// `deltas` is overwritten, not accumulated. The squared error is summed in
/// f64 so long output vectors do not lose precision.
///
/// Panics if the lengths differ.
pub fn vec_delta(v1: &[f32], v2: &[f32], deltas: &mut [f32]) -> f64 {
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
        deltas[i] = v1[i] - v2[i];
        error += (deltas[i] as f64) * (deltas[i] as f64);
    }
    error / v1.len() as f64
}

/// Check two vectors for equality within a tolerance.
///
/// Equal means `|a[i] - b[i]| < epsilon` for every element.
///
/// Panics if the lengths differ.
pub fn approx_eq(a: &[f32], b: &[f32], epsilon: f32) -> bool {
    assert_eq!(
        a.len(),
        b.len(),
        "vector len {} does not match vector len {}",
        a.len(),
        b.len()
    );
    a.iter().zip(b).all(|(&x, &y)| (x - y).abs() < epsilon)
}

/// Index and value of the maximum element.
///
/// Ties resolve to the first index attaining the maximum.
///
/// Panics if `x` is empty.
pub fn argmax(x: &[f32]) -> (usize, f32) {
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

/// Softmax of `x` written into `out`.
///
/// The maximum is subtracted before exponentiating, so the result is
/// invariant under adding a constant to every input and never overflows for
/// finite inputs.
///
/// Panics if `x` is empty or the lengths differ.
pub fn softmax(x: &[f32], out: &mut [f32]) {
    assert_eq!(
        x.len(),
        out.len(),
        "input len {} does not match output len {}",
        x.len(),
        out.len()
    );
    let (_, max) = argmax(x);

    let mut sum = 0.0_f32;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = (v - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}

/// Zero each element of `vec` with probability `p`, writing into `out`.
///
/// Use [`dropout_in_place`] to overwrite the input instead.
///
/// Panics if the lengths differ.
pub fn dropout<R: Rng + ?Sized>(vec: &[f32], p: f32, rng: &mut R, out: &mut [f32]) {
    assert_eq!(
        vec.len(),
        out.len(),
        "input len {} does not match output len {}",
        vec.len(),
        out.len()
    );
    debug_assert!((0.0..=1.0).contains(&p), "p must be in [0, 1], got {p}");

    for (o, &v) in out.iter_mut().zip(vec) {
        *o = if rng.gen::<f32>() < p { 0.0 } else { v };
    }
}

/// In-place variant of [`dropout`].
pub fn dropout_in_place<R: Rng + ?Sized>(vec: &mut [f32], p: f32, rng: &mut R) {
    debug_assert!((0.0..=1.0).contains(&p), "p must be in [0, 1], got {p}");

    for v in vec.iter_mut() {
        if rng.gen::<f32>() < p {
            *v = 0.0;
        }
    }
}

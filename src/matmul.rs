//! Small GEMM wrapper used by the float kernels.
//!
//! Computes `C = alpha * A * B + beta * C` over arbitrarily strided views,
//! so the same primitive serves the forward transform, the backprop
//! transform, and the SGD outer-product accumulation.
//!
//! - default: a simple, safe triple-loop implementation
//! - optional: a faster backend via the `matrixmultiply` feature

#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f32(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    rsa: usize,
    csa: usize,
    b: &[f32],
    rsb: usize,
    csb: usize,
    beta: f32,
    c: &mut [f32],
    rsc: usize,
    csc: usize,
) {
    debug_assert!(m > 0 && n > 0 && k > 0);

    #[cfg(feature = "matrixmultiply")]
    {
        // matrixmultiply supports arbitrary strides.
        unsafe {
            matrixmultiply::sgemm(
                m,
                k,
                n,
                alpha,
                a.as_ptr(),
                rsa as isize,
                csa as isize,
                b.as_ptr(),
                rsb as isize,
                csb as isize,
                beta,
                c.as_mut_ptr(),
                rsc as isize,
                csc as isize,
            );
        }
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f32;
            for p in 0..k {
                acc = a[i * rsa + p * csa].mul_add(b[p * rsb + j * csb], acc);
            }

            let idx = i * rsc + j * csc;
            c[idx] = alpha * acc + beta * c[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_with_beta_one() {
        // A = [[1, 2]], B = [[3], [4]], both row-major.
        let a = [1.0_f32, 2.0];
        let b = [3.0_f32, 4.0];
        let mut c = [10.0_f32];

        gemm_f32(1, 1, 2, 1.0, &a, 2, 1, &b, 1, 1, 1.0, &mut c, 1, 1);
        assert!((c[0] - 21.0).abs() < 1e-6);
    }

    #[test]
    fn applies_alpha_with_beta_zero() {
        let a = [1.0_f32, 2.0, 3.0, 4.0];
        let b = [1.0_f32, 0.0, 0.0, 1.0];
        let mut c = [0.0_f32; 4];

        // C = -2 * A * I.
        gemm_f32(2, 2, 2, -2.0, &a, 2, 1, &b, 2, 1, 0.0, &mut c, 2, 1);
        assert_eq!(c, [-2.0, -4.0, -6.0, -8.0]);
    }
}

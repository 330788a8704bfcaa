//! Activation functions.
//!
//! A layer computes a pre-activation value `z = Wᵗx` and then applies an
//! activation function element-wise in place: `y = activation(z)`.
//!
//! We keep only the *post-activation* outputs `y` between the forward and
//! backward pass. Each variant therefore pairs its forward map with a
//! derivative expressed in terms of `y`, and the `derived` helpers fold that
//! derivative into the upstream delta: `delta[i] *= f'(y[i])`. This saves a
//! separate pre-activation buffer and must be kept in mind for ReLU, whose
//! gate tests the output rather than the input.
//!
//! Fixed-point variants run on Q1.6 cells with 1.0 represented as 64.

use crate::fixed;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// Element-wise activation function.
pub enum Activation {
    #[cfg_attr(feature = "serde", serde(rename = "sigmoid"))]
    Sigmoid,
    #[cfg_attr(feature = "serde", serde(rename = "relu"))]
    ReLU,
    #[cfg_attr(feature = "serde", serde(rename = "tanh"))]
    Tanh,
}

impl Activation {
    #[inline]
    pub(crate) fn forward(self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::ReLU => x.max(0.0),
            Activation::Tanh => x.tanh(),
        }
    }

    /// Derivative of the activation with respect to its input, expressed in
    /// terms of the cached post-activation output `y`.
    #[inline]
    pub(crate) fn grad_from_output(self, y: f32) -> f32 {
        match self {
            Activation::Sigmoid => y * (1.0 - y),
            Activation::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => 1.0 - y * y,
        }
    }

    /// Apply the activation in place over a vector.
    #[inline]
    pub fn apply(self, values: &mut [f32]) {
        for v in values {
            *v = self.forward(*v);
        }
    }

    /// Fold the derivative into an upstream delta vector:
    /// `delta[i] *= f'(output[i])`.
    ///
    /// `output` holds the already-activated values produced by [`apply`].
    ///
    /// Panics if the lengths differ.
    ///
    /// [`apply`]: Activation::apply
    #[inline]
    pub fn derived(self, output: &[f32], delta: &mut [f32]) {
        assert_eq!(
            output.len(),
            delta.len(),
            "output len {} does not match delta len {}",
            output.len(),
            delta.len()
        );
        for (d, &y) in delta.iter_mut().zip(output) {
            *d *= self.grad_from_output(y);
        }
    }

    #[inline]
    pub(crate) fn forward_q6(self, x: i8) -> i8 {
        match self {
            Activation::Sigmoid => fixed::from_f32(sigmoid(fixed::to_f32(x))),
            Activation::ReLU => {
                if x > 0 {
                    x
                } else {
                    0
                }
            }
            Activation::Tanh => fixed::from_f32(fixed::to_f32(x).tanh()),
        }
    }

    /// Q1.6 derivative in terms of the activated output `y`; 1.0 is 64.
    #[inline]
    pub(crate) fn grad_from_output_q6(self, y: i8) -> i8 {
        match self {
            Activation::Sigmoid => fixed::mult(y, fixed::ONE - y),
            Activation::ReLU => {
                if y > 0 {
                    fixed::ONE
                } else {
                    0
                }
            }
            Activation::Tanh => fixed::ONE - fixed::mult(y, y),
        }
    }

    /// Apply the activation in place over a Q1.6 vector.
    #[inline]
    pub fn apply_q6(self, values: &mut [i8]) {
        for v in values {
            *v = self.forward_q6(*v);
        }
    }

    /// Q1.6 counterpart of [`derived`]: `delta[i] = mult(f'(output[i]), delta[i])`.
    ///
    /// [`derived`]: Activation::derived
    #[inline]
    pub fn derived_q6(self, output: &[i8], delta: &mut [i8]) {
        assert_eq!(
            output.len(),
            delta.len(),
            "output len {} does not match delta len {}",
            output.len(),
            delta.len()
        );
        for (d, &y) in delta.iter_mut().zip(output) {
            *d = fixed::mult(self.grad_from_output_q6(y), *d);
        }
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_basic_values() {
        let mut v = [0.0_f32, 10.0, -10.0];
        Activation::Sigmoid.apply(&mut v);
        assert!((v[0] - 0.5).abs() < 1e-6);
        assert!(v[1] > 0.999);
        assert!(v[2] < 0.001);
    }

    #[test]
    fn relu_gates_on_the_output() {
        let mut v = [-2.0_f32, 3.0];
        Activation::ReLU.apply(&mut v);
        assert_eq!(v, [0.0, 3.0]);

        // Derivative is taken from the activated output.
        let mut delta = [1.0_f32, 1.0];
        Activation::ReLU.derived(&v, &mut delta);
        assert_eq!(delta, [0.0, 1.0]);
    }

    #[test]
    fn derived_folds_the_gradient_into_the_delta() {
        let y = Activation::Tanh.forward(0.3);
        let mut delta = [2.0_f32];
        Activation::Tanh.derived(&[y], &mut delta);
        assert!((delta[0] - 2.0 * (1.0 - y * y)).abs() < 1e-6);

        let y = Activation::Sigmoid.forward(0.0);
        let mut delta = [1.0_f32];
        Activation::Sigmoid.derived(&[y], &mut delta);
        assert!((delta[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn q6_sigmoid_tracks_the_float_curve() {
        for x in i8::MIN..i8::MAX {
            let y = Activation::Sigmoid.forward_q6(x);
            let expected = Activation::Sigmoid.forward(fixed::to_f32(x));
            assert!(
                (fixed::to_f32(y) - expected).abs() <= 1.0 / fixed::SCALE as f32,
                "x={x} y={y}"
            );
        }
    }

    #[test]
    fn q6_derivatives_use_the_activated_output() {
        // sigmoid(0) = 0.5 -> 32; 0.5 * (1 - 0.5) = 0.25 -> 16.
        assert_eq!(Activation::Sigmoid.grad_from_output_q6(32), 16);

        // ReLU gate passes the delta through unchanged where y > 0.
        let y = [40_i8, 0];
        let mut delta = [20_i8, 20];
        Activation::ReLU.derived_q6(&y, &mut delta);
        assert_eq!(delta, [20, 0]);

        // tanh: 1 - y^2 at y = 0 is exactly 1.0 (64).
        assert_eq!(Activation::Tanh.grad_from_output_q6(0), fixed::ONE);
    }
}

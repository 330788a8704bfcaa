//! The fixed two-layer network.
//!
//! `Perceptron` wires the kernels into the documented stage order:
//!
//! 1. [`predict`]: forward transform -> hidden activation -> forward
//!    transform -> output activation, into internal reused buffers,
//! 2. [`prediction_error`]: elementwise delta against the target, producing
//!    the scalar batch error and seeding the output delta buffer,
//! 3. [`train_sgd`] / [`train_adam`]: backprop through the output weights,
//!    fold in the activation derivatives, update both weight matrices.
//!
//! The stages consume each other's buffers, so they must run in that order;
//! the buffers are overwritten, never accumulated. Weight matrices come from
//! the persistent store and are released exactly once when the network
//! drops.
//!
//! `QPerceptron` is the same topology over Q1.6 cells for
//! resource-constrained inference (and fixed-point SGD training).
//!
//! [`predict`]: Perceptron::predict
//! [`prediction_error`]: Perceptron::prediction_error
//! [`train_sgd`]: Perceptron::train_sgd
//! [`train_adam`]: Perceptron::train_adam

use rand::Rng;

use crate::activation::Activation;
use crate::config::NetConfig;
use crate::error::Result;
use crate::init::NormalSampler;
use crate::matrix::{Mat, MatMut};
use crate::optim::{AdamParams, AdamState};
use crate::store::Weights;
use crate::{linear, optim, qkern, vecops};

/// Adam state for both layers of a [`Perceptron`].
#[derive(Debug, Clone)]
pub struct AdamOpt {
    pub params: AdamParams,
    pub hidden: AdamState,
    pub output: AdamState,
}

impl AdamOpt {
    pub fn new(cfg: &NetConfig, params: AdamParams) -> Self {
        Self {
            params,
            hidden: AdamState::new(cfg.input_len, cfg.hidden_len),
            output: AdamState::new(cfg.hidden_len, cfg.output_len),
        }
    }
}

/// Two dense layers over f32 cells.
pub struct Perceptron {
    input_len: usize,
    hidden_len: usize,
    output_len: usize,
    batch_len: usize,
    hidden_activation: Activation,
    output_activation: Activation,

    hidden_weights: Weights<f32>,
    output_weights: Weights<f32>,

    hidden_output: Vec<f32>,
    output: Vec<f32>,
    hidden_delta: Vec<f32>,
    output_delta: Vec<f32>,
}

impl Perceptron {
    /// Build the network, creating or loading both weight matrices per the
    /// config's weight paths.
    pub fn new<R: Rng>(cfg: &NetConfig, sampler: &mut NormalSampler<R>) -> Result<Self> {
        cfg.validate()?;

        let hidden_weights = Weights::create_or_load(
            cfg.hidden_weights.as_deref(),
            cfg.input_len,
            cfg.hidden_len,
            sampler,
        )?;
        let output_weights = Weights::create_or_load(
            cfg.output_weights.as_deref(),
            cfg.hidden_len,
            cfg.output_len,
            sampler,
        )?;

        Ok(Self {
            input_len: cfg.input_len,
            hidden_len: cfg.hidden_len,
            output_len: cfg.output_len,
            batch_len: cfg.batch_len,
            hidden_activation: cfg.hidden_activation,
            output_activation: cfg.output_activation,
            hidden_weights,
            output_weights,
            hidden_output: vec![0.0; cfg.hidden_len * cfg.batch_len],
            output: vec![0.0; cfg.output_len * cfg.batch_len],
            hidden_delta: vec![0.0; cfg.hidden_len * cfg.batch_len],
            output_delta: vec![0.0; cfg.output_len * cfg.batch_len],
        })
    }

    /// Run the forward pass and return the activated output batch.
    ///
    /// `input` is a row-major `batch_len x input_len` batch (panics on a
    /// length mismatch).
    pub fn predict(&mut self, input: &[f32]) -> &[f32] {
        linear::trans(
            self.hidden_weights.view(),
            Mat::new(input, self.batch_len, self.input_len),
            &mut MatMut::new(&mut self.hidden_output, self.batch_len, self.hidden_len),
        );
        self.hidden_activation.apply(&mut self.hidden_output);

        linear::trans(
            self.output_weights.view(),
            Mat::new(&self.hidden_output, self.batch_len, self.hidden_len),
            &mut MatMut::new(&mut self.output, self.batch_len, self.output_len),
        );
        self.output_activation.apply(&mut self.output);

        &self.output
    }

    /// Mean squared error of the last prediction against `target`, seeding
    /// the output delta buffer for the next training call.
    pub fn prediction_error(&mut self, target: &[f32]) -> f64 {
        vecops::vec_delta(&self.output, target, &mut self.output_delta)
    }

    /// One SGD step from the deltas left by [`prediction_error`].
    ///
    /// `input` must be the batch passed to the matching [`predict`] call.
    ///
    /// [`predict`]: Perceptron::predict
    /// [`prediction_error`]: Perceptron::prediction_error
    pub fn train_sgd(&mut self, input: &[f32], rate: f32) {
        self.backprop_deltas();

        optim::train_sgd(
            Mat::new(input, self.batch_len, self.input_len),
            Mat::new(&self.hidden_delta, self.batch_len, self.hidden_len),
            rate,
            &mut self.hidden_weights.view_mut(),
        );

        self.output_activation
            .derived(&self.output, &mut self.output_delta);
        optim::train_sgd(
            Mat::new(&self.hidden_output, self.batch_len, self.hidden_len),
            Mat::new(&self.output_delta, self.batch_len, self.output_len),
            rate,
            &mut self.output_weights.view_mut(),
        );
    }

    /// One Adam step from the deltas left by [`prediction_error`].
    ///
    /// Returns the advanced step counter of the output layer; `opt` carries
    /// both layers' moments and counters between calls.
    ///
    /// [`prediction_error`]: Perceptron::prediction_error
    pub fn train_adam(&mut self, input: &[f32], rate: f32, opt: &mut AdamOpt) -> u32 {
        self.backprop_deltas();

        optim::train_adam(
            Mat::new(input, self.batch_len, self.input_len),
            Mat::new(&self.hidden_delta, self.batch_len, self.hidden_len),
            rate,
            opt.params,
            &mut opt.hidden,
            &mut self.hidden_weights.view_mut(),
        );

        self.output_activation
            .derived(&self.output, &mut self.output_delta);
        optim::train_adam(
            Mat::new(&self.hidden_output, self.batch_len, self.hidden_len),
            Mat::new(&self.output_delta, self.batch_len, self.output_len),
            rate,
            opt.params,
            &mut opt.output,
            &mut self.output_weights.view_mut(),
        )
    }

    // Shared prefix of both training paths: backprop the raw output delta
    // through the output weights and gate it by the hidden activation.
    fn backprop_deltas(&mut self) {
        linear::loss(
            self.output_weights.view(),
            Mat::new(&self.output_delta, self.batch_len, self.output_len),
            &mut MatMut::new(&mut self.hidden_delta, self.batch_len, self.hidden_len),
        );
        self.hidden_activation
            .derived(&self.hidden_output, &mut self.hidden_delta);
    }

    #[inline]
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    #[inline]
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    #[inline]
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    #[inline]
    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    #[inline]
    pub fn hidden_weights(&self) -> &Weights<f32> {
        &self.hidden_weights
    }

    #[inline]
    pub fn output_weights(&self) -> &Weights<f32> {
        &self.output_weights
    }
}

/// Two dense layers over Q1.6 cells.
pub struct QPerceptron {
    input_len: usize,
    hidden_len: usize,
    output_len: usize,
    batch_len: usize,
    hidden_activation: Activation,
    output_activation: Activation,

    hidden_weights: Weights<i8>,
    output_weights: Weights<i8>,

    hidden_output: Vec<i8>,
    output: Vec<i8>,
    hidden_delta: Vec<i8>,
    output_delta: Vec<i8>,
}

impl QPerceptron {
    pub fn new<R: Rng>(cfg: &NetConfig, sampler: &mut NormalSampler<R>) -> Result<Self> {
        cfg.validate()?;

        let hidden_weights = Weights::create_or_load(
            cfg.hidden_weights.as_deref(),
            cfg.input_len,
            cfg.hidden_len,
            sampler,
        )?;
        let output_weights = Weights::create_or_load(
            cfg.output_weights.as_deref(),
            cfg.hidden_len,
            cfg.output_len,
            sampler,
        )?;

        Ok(Self {
            input_len: cfg.input_len,
            hidden_len: cfg.hidden_len,
            output_len: cfg.output_len,
            batch_len: cfg.batch_len,
            hidden_activation: cfg.hidden_activation,
            output_activation: cfg.output_activation,
            hidden_weights,
            output_weights,
            hidden_output: vec![0; cfg.hidden_len * cfg.batch_len],
            output: vec![0; cfg.output_len * cfg.batch_len],
            hidden_delta: vec![0; cfg.hidden_len * cfg.batch_len],
            output_delta: vec![0; cfg.output_len * cfg.batch_len],
        })
    }

    /// Run the fixed-point forward pass and return the activated output.
    pub fn predict(&mut self, input: &[i8]) -> &[i8] {
        qkern::linear(
            self.hidden_weights.view(),
            Mat::new(input, self.batch_len, self.input_len),
            &mut MatMut::new(&mut self.hidden_output, self.batch_len, self.hidden_len),
        );
        self.hidden_activation.apply_q6(&mut self.hidden_output);

        qkern::linear(
            self.output_weights.view(),
            Mat::new(&self.hidden_output, self.batch_len, self.hidden_len),
            &mut MatMut::new(&mut self.output, self.batch_len, self.output_len),
        );
        self.output_activation.apply_q6(&mut self.output);

        &self.output
    }

    /// Mean squared error (in float units) of the last prediction, seeding
    /// the output delta buffer.
    pub fn prediction_error(&mut self, target: &[i8]) -> f64 {
        qkern::vec_delta(&self.output, target, &mut self.output_delta)
    }

    /// One fixed-point SGD step; `rate` is a Q1.6 value.
    pub fn train_sgd(&mut self, input: &[i8], rate: i8) {
        qkern::loss(
            self.output_weights.view(),
            Mat::new(&self.output_delta, self.batch_len, self.output_len),
            &mut MatMut::new(&mut self.hidden_delta, self.batch_len, self.hidden_len),
        );
        self.hidden_activation
            .derived_q6(&self.hidden_output, &mut self.hidden_delta);
        qkern::train_sgd(
            Mat::new(input, self.batch_len, self.input_len),
            Mat::new(&self.hidden_delta, self.batch_len, self.hidden_len),
            rate,
            &mut self.hidden_weights.view_mut(),
        );

        self.output_activation
            .derived_q6(&self.output, &mut self.output_delta);
        qkern::train_sgd(
            Mat::new(&self.hidden_output, self.batch_len, self.hidden_len),
            Mat::new(&self.output_delta, self.batch_len, self.output_len),
            rate,
            &mut self.output_weights.view_mut(),
        );
    }

    #[inline]
    pub fn output(&self) -> &[i8] {
        &self.output
    }

    #[inline]
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    #[inline]
    pub fn output_len(&self) -> usize {
        self.output_len
    }
}

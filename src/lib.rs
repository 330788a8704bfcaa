//! Numeric core of a small two-layer perceptron.
//!
//! `mlp-kern` implements the dense kernels of a fixed two-layer network:
//! forward transforms, backpropagation, SGD and Adam weight updates, plus a
//! Q1.6 fixed-point rendition of the same operations for 8-bit inference on
//! constrained targets. Weight matrices can live in a memory-mapped file so
//! trained state survives across process runs.
//!
//! # Design goals
//!
//! - Predictable performance: the per-step hot path reuses caller-owned
//!   buffers and never allocates.
//! - Explicit contracts: shapes are supplied at every call site, and the
//!   memory layout a kernel expects is part of its signature via the
//!   [`matrix`] view types.
//! - Exact fixed-point semantics: the Q1.6 rounding and scale-tracking rules
//!   are normative, covered by reference-vector tests.
//!
//! # Panics vs `Result`
//!
//! This crate intentionally exposes two layers of API:
//!
//! - Low-level hot path (panics on misuse): the kernels in [`linear`],
//!   [`optim`], [`qkern`], [`vecops`]. Shape mismatches are treated as
//!   programmer error and panic via `assert!`.
//! - Boundary APIs (checked): [`Weights::create_or_load`],
//!   [`NetConfig::validate`], [`Perceptron::new`]. These return [`Result`];
//!   the store errors are documented as fatal — there is no recovery path,
//!   callers abort with the diagnostic.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`, or Q1.6 `i8` in the fixed-point path (scale 64).
//! - Weight matrices are column-major `m x n`: each output neuron's `m`
//!   weights are contiguous.
//! - Batches are row-major flat buffers, one sample per row.
//! - A persisted weight file is a headerless flat dump of native cells;
//!   shape and cell type are the caller's contract.
//!
//! # Quick start
//!
//! ```rust
//! use mlp_kern::{Activation, NetConfig, NormalSampler, Perceptron};
//!
//! # fn main() -> mlp_kern::Result<()> {
//! let cfg = NetConfig {
//!     input_len: 4,
//!     hidden_len: 8,
//!     output_len: 2,
//!     batch_len: 1,
//!     rate: 0.1,
//!     hidden_activation: Activation::ReLU,
//!     output_activation: Activation::Sigmoid,
//!     hidden_weights: None,
//!     output_weights: None,
//! };
//!
//! let mut sampler = NormalSampler::from_seed(0);
//! let mut net = Perceptron::new(&cfg, &mut sampler)?;
//!
//! let input = [0.4_f32, 0.8, 0.1, 0.66];
//! let target = [1.0_f32, 0.0];
//! for _ in 0..100 {
//!     net.predict(&input);
//!     net.prediction_error(&target);
//!     net.train_sgd(&input, cfg.rate);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Set a weight path in the config to persist a layer across runs:
//! the file is created and He-initialized on first use, and mapped back
//! unchanged on every later run.

pub mod activation;
pub mod config;
pub mod error;
pub mod fixed;
pub mod init;
pub mod linear;
pub(crate) mod matmul;
pub mod matrix;
pub mod net;
pub mod optim;
pub mod qkern;
pub mod store;
pub mod vecops;

pub use activation::Activation;
pub use config::NetConfig;
pub use error::{Error, Result};
pub use init::NormalSampler;
pub use matrix::{ColMajor, Layout, Mat, MatMut, RowMajor};
pub use net::{AdamOpt, Perceptron, QPerceptron};
pub use optim::{AdamParams, AdamState};
pub use store::{Cell, Weights};

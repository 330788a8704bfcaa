//! Persistent weight storage.
//!
//! A weight matrix lives either in a process-local heap buffer or in a
//! writable shared mapping of a plain binary file. The file format is a flat
//! dump of `in_size * out_size` native cells — 4-byte floats or 1-byte Q1.6
//! cells — with no header, shape, or version metadata: shape and cell type
//! are an implicit contract between writer and reader, matched to the
//! configured topology.
//!
//! Persistence relies on OS writeback of the shared mapping; nothing is
//! flushed explicitly on drop. A mapped file may be opened by multiple
//! cooperating processes, but no locking is provided: running more than one
//! writer against the same file at a time is a caller contract violation,
//! not a runtime-detected error.

use std::fs::OpenOptions;
use std::mem;
use std::path::Path;

use memmap2::{MmapMut, MmapOptions};
use rand::Rng;

use crate::error::{Error, Result};
use crate::fixed;
use crate::init::{he_std, NormalSampler};
use crate::matrix::{ColMajor, Mat, MatMut};

enum Backing<T> {
    Heap(Vec<T>),
    Mapped(MmapMut),
}

/// An `in_size x out_size` weight matrix with owned backing memory.
///
/// The owner releases the backing exactly once on drop (unmap if
/// file-backed, free otherwise); no other component may free or remap it.
pub struct Weights<T: Cell> {
    in_size: usize,
    out_size: usize,
    backing: Backing<T>,
}

impl<T: Cell> Weights<T> {
    /// Create or load an `in_size x out_size` weight matrix.
    ///
    /// Without a path the matrix is heap-allocated and He-initialized from
    /// `sampler`; it is lost at drop.
    ///
    /// With a path the file is opened or created:
    /// - a new (empty) file is grown to exactly
    ///   `in_size * out_size * size_of::<T>()` bytes, mapped writable and
    ///   shared, and He-initialized through the mapping;
    /// - an existing file at least that large is mapped as-is — the trained
    ///   weights are preserved, never re-initialized;
    /// - an existing file smaller than that is a fatal
    ///   [`Error::SizeMismatch`]: the file belongs to a different topology.
    ///
    /// Both dimensions must be non-zero (panics otherwise).
    pub fn create_or_load<R: Rng>(
        path: Option<&Path>,
        in_size: usize,
        out_size: usize,
        sampler: &mut NormalSampler<R>,
    ) -> Result<Self> {
        assert!(
            in_size > 0 && out_size > 0,
            "weight matrix dims must be > 0, got {in_size} x {out_size}"
        );

        let cells = in_size * out_size;
        let backing = match path {
            None => {
                let mut buffer = vec![T::zeroed(); cells];
                norm_init(&mut buffer, in_size, sampler);
                Backing::Heap(buffer)
            }
            Some(path) => {
                let expected = (cells * mem::size_of::<T>()) as u64;
                let io_err = |source| Error::Io {
                    path: path.to_path_buf(),
                    source,
                };

                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(path)
                    .map_err(io_err)?;
                let actual = file.metadata().map_err(io_err)?.len();

                if actual == 0 {
                    // The file did not exist before: size it and initialize
                    // fresh weights through the mapping.
                    file.set_len(expected).map_err(io_err)?;
                    let mut map = unsafe {
                        MmapOptions::new()
                            .len(expected as usize)
                            .map_mut(&file)
                            .map_err(io_err)?
                    };
                    norm_init(bytemuck::cast_slice_mut::<u8, T>(&mut map), in_size, sampler);
                    log::info!(
                        "created weight file '{}' ({in_size} x {out_size})",
                        path.display()
                    );
                    Backing::Mapped(map)
                } else if actual < expected {
                    return Err(Error::SizeMismatch {
                        path: path.to_path_buf(),
                        expected,
                        actual,
                    });
                } else {
                    // Existing weights: map the expected prefix, keep the
                    // contents untouched.
                    let map = unsafe {
                        MmapOptions::new()
                            .len(expected as usize)
                            .map_mut(&file)
                            .map_err(io_err)?
                    };
                    log::debug!(
                        "loaded weight file '{}' ({in_size} x {out_size})",
                        path.display()
                    );
                    Backing::Mapped(map)
                }
            }
        };

        Ok(Self {
            in_size,
            out_size,
            backing,
        })
    }

    #[inline]
    pub fn in_size(&self) -> usize {
        self.in_size
    }

    #[inline]
    pub fn out_size(&self) -> usize {
        self.out_size
    }

    /// Whether the backing memory is a shared file mapping.
    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.backing {
            Backing::Heap(buffer) => buffer,
            Backing::Mapped(map) => bytemuck::cast_slice(&map[..]),
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.backing {
            Backing::Heap(buffer) => buffer,
            Backing::Mapped(map) => bytemuck::cast_slice_mut(&mut map[..]),
        }
    }

    /// Column-major `in_size x out_size` view for the kernels.
    #[inline]
    pub fn view(&self) -> Mat<'_, T, ColMajor> {
        Mat::new(self.as_slice(), self.in_size, self.out_size)
    }

    /// Mutable column-major view for the update kernels.
    #[inline]
    pub fn view_mut(&mut self) -> MatMut<'_, T, ColMajor> {
        let (rows, cols) = (self.in_size, self.out_size);
        MatMut::new(self.as_mut_slice(), rows, cols)
    }
}

impl<T: Cell> std::fmt::Debug for Weights<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Weights")
            .field("in_size", &self.in_size)
            .field("out_size", &self.out_size)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

fn norm_init<T: Cell, R: Rng>(cells: &mut [T], in_size: usize, sampler: &mut NormalSampler<R>) {
    let sigma = he_std(in_size);
    for cell in cells {
        *cell = T::from_norm(sampler.sample(0.0, sigma));
    }
}

/// Numeric cell type of a weight matrix: `f32` or a Q1.6 `i8`.
pub trait Cell: bytemuck::Pod + PartialEq + std::fmt::Debug {
    /// Narrow a Gaussian initialization sample to this cell type.
    fn from_norm(x: f32) -> Self;
}

impl Cell for f32 {
    #[inline]
    fn from_norm(x: f32) -> Self {
        x
    }
}

impl Cell for i8 {
    #[inline]
    fn from_norm(x: f32) -> Self {
        fixed::from_f32(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_weights_are_he_initialized() {
        let mut sampler = NormalSampler::from_seed(0);
        let w: Weights<f32> = Weights::create_or_load(None, 200, 50, &mut sampler).unwrap();

        assert!(!w.is_mapped());
        assert_eq!(w.as_slice().len(), 200 * 50);

        // Rough moment check against sigma = sqrt(2 / 200) = 0.1.
        let n = w.as_slice().len() as f64;
        let mean: f64 = w.as_slice().iter().map(|&v| v as f64).sum::<f64>() / n;
        let var: f64 = w
            .as_slice()
            .iter()
            .map(|&v| (v as f64 - mean) * (v as f64 - mean))
            .sum::<f64>()
            / n;
        assert!(mean.abs() < 0.01, "mean={mean}");
        assert!((var.sqrt() - 0.1).abs() < 0.02, "std={}", var.sqrt());
    }

    #[test]
    fn deterministic_sampler_makes_deterministic_weights() {
        let mut a = NormalSampler::from_seed(5);
        let mut b = NormalSampler::from_seed(5);
        let wa: Weights<f32> = Weights::create_or_load(None, 10, 4, &mut a).unwrap();
        let wb: Weights<f32> = Weights::create_or_load(None, 10, 4, &mut b).unwrap();
        assert_eq!(wa.as_slice(), wb.as_slice());
    }

    #[test]
    fn q6_cells_quantize_the_init_samples() {
        let mut sampler = NormalSampler::from_seed(11);
        let w: Weights<i8> = Weights::create_or_load(None, 2, 8, &mut sampler).unwrap();

        // sigma = 1.0 here, so some cells must be non-zero after quantizing.
        assert!(w.as_slice().iter().any(|&v| v != 0));
    }

    #[test]
    fn views_expose_the_declared_shape() {
        let mut sampler = NormalSampler::from_seed(2);
        let mut w: Weights<f32> = Weights::create_or_load(None, 3, 4, &mut sampler).unwrap();

        assert_eq!((w.view().rows(), w.view().cols()), (3, 4));

        let view = w.view_mut();
        assert_eq!((view.rows(), view.cols()), (3, 4));
    }
}

//! Matrix views with a type-level memory layout.
//!
//! Every matrix in this crate is a flat, contiguous slice interpreted as
//! `rows x cols`; there is no embedded shape metadata. Which physical order
//! the cells are stored in is a fixed contract of each kernel, so the layout
//! is carried as a zero-sized type parameter: a kernel that expects a
//! column-major weight matrix says so in its signature, and handing it a
//! row-major view is a compile error rather than silently transposed math.
//!
//! Conventions used by the kernels:
//! - weight matrices are [`ColMajor`] `m x n` (each output neuron's `m`
//!   weights are contiguous),
//! - input/output/gradient batches are [`RowMajor`] `batch_len x width`
//!   (each sample is contiguous).
//!
//! [`Mat::transposed`] reinterprets a view as its transpose in the opposite
//! layout without copying; [`convert_layout`] copies between layouts.

use std::marker::PhantomData;

/// Physical cell order of a matrix view.
pub trait Layout {
    /// The opposite layout. Flipping twice is the identity.
    type Flip: Layout<Flip = Self>;

    const NAME: &'static str;

    /// Flat index of element `(r, c)` in a `rows x cols` matrix.
    fn index(rows: usize, cols: usize, r: usize, c: usize) -> usize;

    /// `(row_stride, col_stride)` for a `rows x cols` matrix.
    fn strides(rows: usize, cols: usize) -> (usize, usize);
}

/// Samples/rows are contiguous: element `(r, c)` lives at `r * cols + c`.
#[derive(Debug, Clone, Copy)]
pub struct RowMajor;

/// Columns are contiguous: element `(r, c)` lives at `c * rows + r`.
#[derive(Debug, Clone, Copy)]
pub struct ColMajor;

impl Layout for RowMajor {
    type Flip = ColMajor;

    const NAME: &'static str = "row-major";

    #[inline]
    fn index(_rows: usize, cols: usize, r: usize, c: usize) -> usize {
        r * cols + c
    }

    #[inline]
    fn strides(_rows: usize, cols: usize) -> (usize, usize) {
        (cols, 1)
    }
}

impl Layout for ColMajor {
    type Flip = RowMajor;

    const NAME: &'static str = "column-major";

    #[inline]
    fn index(rows: usize, _cols: usize, r: usize, c: usize) -> usize {
        c * rows + r
    }

    #[inline]
    fn strides(rows: usize, _cols: usize) -> (usize, usize) {
        (1, rows)
    }
}

/// Immutable `rows x cols` view over a flat slice.
#[derive(Debug)]
pub struct Mat<'a, T, L> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    layout: PhantomData<L>,
}

// Derived Copy/Clone would require `L: Copy`; the marker is phantom.
impl<T, L> Clone for Mat<'_, T, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, L> Copy for Mat<'_, T, L> {}

impl<'a, T, L: Layout> Mat<'a, T, L> {
    /// Interpret `data` as a `rows x cols` matrix.
    ///
    /// Panics if `data.len() != rows * cols`.
    #[inline]
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "{} matrix data len {} does not match {rows} x {cols}",
            L::NAME,
            data.len()
        );
        Self {
            data,
            rows,
            cols,
            layout: PhantomData,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn at(&self, r: usize, c: usize) -> &T {
        &self.data[L::index(self.rows, self.cols, r, c)]
    }

    /// `(row_stride, col_stride)` of this view.
    #[inline]
    pub fn strides(&self) -> (usize, usize) {
        L::strides(self.rows, self.cols)
    }

    /// Reinterpret the same buffer as the transposed matrix in the opposite
    /// layout. No cells move: a row-major `r x c` buffer read column-major is
    /// exactly the `c x r` transpose.
    #[inline]
    pub fn transposed(self) -> Mat<'a, T, L::Flip> {
        Mat {
            data: self.data,
            rows: self.cols,
            cols: self.rows,
            layout: PhantomData,
        }
    }
}

/// Mutable `rows x cols` view over a flat slice.
#[derive(Debug)]
pub struct MatMut<'a, T, L> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
    layout: PhantomData<L>,
}

impl<'a, T, L: Layout> MatMut<'a, T, L> {
    /// Interpret `data` as a mutable `rows x cols` matrix.
    ///
    /// Panics if `data.len() != rows * cols`.
    #[inline]
    pub fn new(data: &'a mut [T], rows: usize, cols: usize) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "{} matrix data len {} does not match {rows} x {cols}",
            L::NAME,
            data.len()
        );
        Self {
            data,
            rows,
            cols,
            layout: PhantomData,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data
    }

    #[inline]
    pub fn at_mut(&mut self, r: usize, c: usize) -> &mut T {
        &mut self.data[L::index(self.rows, self.cols, r, c)]
    }

    #[inline]
    pub fn strides(&self) -> (usize, usize) {
        L::strides(self.rows, self.cols)
    }

    /// Reborrow as an immutable view.
    #[inline]
    pub fn as_ref(&self) -> Mat<'_, T, L> {
        Mat {
            data: self.data,
            rows: self.rows,
            cols: self.cols,
            layout: PhantomData,
        }
    }
}

/// Copy `src` into `dst`, which holds the same `rows x cols` matrix in the
/// opposite physical layout.
///
/// Panics if the shapes differ.
pub fn convert_layout<T: Copy, L: Layout>(src: Mat<'_, T, L>, dst: &mut MatMut<'_, T, L::Flip>) {
    assert_eq!(
        (src.rows(), src.cols()),
        (dst.rows(), dst.cols()),
        "layout conversion requires identical shapes"
    );
    for r in 0..src.rows() {
        for c in 0..src.cols() {
            *dst.at_mut(r, c) = *src.at(r, c);
        }
    }
}

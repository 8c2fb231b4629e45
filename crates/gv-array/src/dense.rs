// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Device-resident dense containers and the non-owning views kernels consume.
//!
//! Containers own reference-counted buffers tagged with the context they were
//! allocated under. Views borrow a container's buffer for the duration of a
//! single operation and carry explicit shape/stride/offset metadata, which is
//! what lets a flat vector be reinterpreted as a transposed matrix without a
//! copy.

use crate::context::{self, ContextError, DEFAULT_CONTEXT_ID};
use crate::element::{Dtype, Element};
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Result alias used throughout the array crate.
pub type GvResult<T> = Result<T, ArrayError>;

/// Errors emitted by array containers and the Level-2 operations.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayError {
    /// A matrix constructor received a zero-sized axis.
    InvalidDimensions { rows: usize, cols: usize },
    /// A vector constructor received a zero length.
    InvalidLength { len: usize },
    /// Data provided to a constructor does not match the requested shape.
    DataLength { expected: usize, got: usize },
    /// An operation was asked to combine operands of incompatible shapes.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// A vector cannot be reinterpreted as a matrix of the requested shape.
    ReshapeMismatch {
        len: usize,
        rows: usize,
        cols: usize,
    },
    /// Operand buffers were allocated under different contexts.
    ContextMismatch { expected: u32, got: u32 },
    /// The requested context id names no registered context.
    UnknownContext { id: u32 },
    /// A context id was registered twice.
    DuplicateContext { id: u32 },
    /// A foreign type code falls outside the supported closed set.
    UnsupportedDtype { code: i32, object: &'static str },
    /// Scaled accumulation requires at least one vector operand.
    OperandNotVector,
    /// An output operand shares a buffer with an input operand.
    AliasedOperands { label: &'static str },
    /// The operand layout is not supported by the requested computation.
    UnsupportedLayout { label: &'static str },
    /// Generic parameter violation.
    InvalidValue { label: &'static str },
    /// Execution failed inside a compute backend.
    BackendFailure {
        backend: &'static str,
        message: String,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayError::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "invalid matrix dimensions ({rows} x {cols}); both axes must be non-zero"
                )
            }
            ArrayError::InvalidLength { len } => {
                write!(f, "invalid vector length {len}; must be non-zero")
            }
            ArrayError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            ArrayError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: left={left:?}, right={right:?} cannot be combined"
                )
            }
            ArrayError::ReshapeMismatch { len, rows, cols } => {
                write!(
                    f,
                    "vector of length {len} cannot be viewed as a {rows} x {cols} matrix"
                )
            }
            ArrayError::ContextMismatch { expected, got } => {
                write!(
                    f,
                    "context mismatch: operation bound to context {expected} but operand was allocated under context {got}"
                )
            }
            ArrayError::UnknownContext { id } => {
                write!(f, "no device context registered under id {id}")
            }
            ArrayError::DuplicateContext { id } => {
                write!(f, "a device context is already registered under id {id}")
            }
            ArrayError::UnsupportedDtype { code, object } => {
                write!(f, "unknown element type code {code} detected for {object} object")
            }
            ArrayError::OperandNotVector => {
                write!(f, "one of the operands must be a vector")
            }
            ArrayError::AliasedOperands { label } => {
                write!(f, "output must not share a buffer with an input ({label})")
            }
            ArrayError::UnsupportedLayout { label } => {
                write!(
                    f,
                    "requested operation requires a different array layout ({label})"
                )
            }
            ArrayError::InvalidValue { label } => {
                write!(f, "invalid value: {label}")
            }
            ArrayError::BackendFailure { backend, message } => {
                write!(f, "{backend} backend failure: {message}")
            }
        }
    }
}

impl Error for ArrayError {}

impl From<ContextError> for ArrayError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::UnknownContext { id } => ArrayError::UnknownContext { id },
            ContextError::DuplicateContext { id } => ArrayError::DuplicateContext { id },
        }
    }
}

/// Orientation tag for matrix storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    RowMajor,
    ColMajor,
}

impl Layout {
    /// Logical `(row, col)` strides for a `rows x cols` matrix stored in this
    /// orientation.
    pub const fn strides(self, rows: usize, cols: usize) -> (usize, usize) {
        match self {
            Layout::RowMajor => (cols, 1),
            Layout::ColMajor => (1, rows),
        }
    }
}

/// Reference-counted contiguous storage behind a container.
///
/// Mutation goes through `Arc::make_mut`, so cloned containers diverge on
/// first write instead of observing each other.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BufferStorage<T: Element> {
    cells: Vec<T>,
}

impl<T: Element> BufferStorage<T> {
    fn from_vec(cells: Vec<T>) -> Self {
        Self { cells }
    }

    fn zeroed(len: usize) -> Self {
        Self {
            cells: vec![T::ZERO; len],
        }
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.cells
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }
}

fn seedable_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// A device-resident vector.
#[derive(Clone, Debug)]
pub struct DeviceVector<T: Element> {
    data: Arc<BufferStorage<T>>,
    len: usize,
    context_id: u32,
}

impl<T: Element> PartialEq for DeviceVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.context_id == other.context_id
            && self.data.as_slice() == other.data.as_slice()
    }
}

impl<T: Element> DeviceVector<T> {
    fn from_storage(storage: BufferStorage<T>, len: usize, context_id: u32) -> GvResult<Self> {
        if len == 0 {
            return Err(ArrayError::InvalidLength { len });
        }
        context::context(context_id)?;
        Ok(Self {
            data: Arc::new(storage),
            len,
            context_id,
        })
    }

    /// Creates a zero-filled vector under the default context.
    pub fn zeros(len: usize) -> GvResult<Self> {
        Self::zeros_in(len, DEFAULT_CONTEXT_ID)
    }

    /// Creates a zero-filled vector under an explicit context.
    pub fn zeros_in(len: usize, context_id: u32) -> GvResult<Self> {
        Self::from_storage(BufferStorage::zeroed(len), len, context_id)
    }

    /// Wraps host data as a device vector under the default context.
    pub fn from_vec(data: Vec<T>) -> GvResult<Self> {
        Self::from_vec_in(data, DEFAULT_CONTEXT_ID)
    }

    pub fn from_vec_in(data: Vec<T>, context_id: u32) -> GvResult<Self> {
        let len = data.len();
        Self::from_storage(BufferStorage::from_vec(data), len, context_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dtype(&self) -> Dtype {
        T::DTYPE
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    pub fn data(&self) -> &[T] {
        self.data.as_slice()
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    pub(crate) fn storage(&self) -> &Arc<BufferStorage<T>> {
        &self.data
    }

    /// Borrows the whole vector as a unit-stride view.
    pub fn view(&self) -> VectorView<'_, T> {
        VectorView {
            data: self.data.as_slice(),
            len: self.len,
            offset: 0,
            stride: 1,
        }
    }

    pub fn view_mut(&mut self) -> VectorViewMut<'_, T> {
        let len = self.len;
        VectorViewMut {
            data: Arc::make_mut(&mut self.data).as_mut_slice(),
            len,
            offset: 0,
            stride: 1,
        }
    }

    /// Reinterprets the vector's storage as a `rows x cols` row-major matrix
    /// with zero offset and unit stride. No copy is made; the view borrows
    /// the vector's buffer.
    pub fn as_matrix_view(&self, rows: usize, cols: usize) -> GvResult<MatrixView<'_, T>> {
        if rows * cols != self.len {
            return Err(ArrayError::ReshapeMismatch {
                len: self.len,
                rows,
                cols,
            });
        }
        Ok(MatrixView {
            data: self.data.as_slice(),
            rows,
            cols,
            offset: 0,
            row_stride: cols,
            col_stride: 1,
        })
    }

    /// Mutable variant of [`DeviceVector::as_matrix_view`]; writes through
    /// the view land in the vector's storage.
    pub fn as_matrix_view_mut(&mut self, rows: usize, cols: usize) -> GvResult<MatrixViewMut<'_, T>> {
        if rows * cols != self.len {
            return Err(ArrayError::ReshapeMismatch {
                len: self.len,
                rows,
                cols,
            });
        }
        Ok(MatrixViewMut {
            data: Arc::make_mut(&mut self.data).as_mut_slice(),
            rows,
            cols,
            offset: 0,
            row_stride: cols,
            col_stride: 1,
        })
    }
}

impl<T: Element + SampleUniform> DeviceVector<T> {
    /// Samples a vector uniformly from `[min, max)`. A fixed `seed` makes the
    /// fill deterministic for tests and benchmarks.
    pub fn random_uniform(len: usize, min: T, max: T, seed: Option<u64>) -> GvResult<Self> {
        if len == 0 {
            return Err(ArrayError::InvalidLength { len });
        }
        if !(min < max) {
            return Err(ArrayError::InvalidValue {
                label: "random_uniform_bounds",
            });
        }
        let mut rng = seedable_rng(seed);
        let distribution = Uniform::new(min, max);
        let data = (0..len).map(|_| distribution.sample(&mut rng)).collect();
        Self::from_vec(data)
    }
}

/// A device-resident dense matrix.
#[derive(Clone, Debug)]
pub struct DeviceMatrix<T: Element> {
    data: Arc<BufferStorage<T>>,
    rows: usize,
    cols: usize,
    layout: Layout,
    context_id: u32,
}

impl<T: Element> PartialEq for DeviceMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.layout == other.layout
            && self.context_id == other.context_id
            && self.data.as_slice() == other.data.as_slice()
    }
}

impl<T: Element> DeviceMatrix<T> {
    fn from_storage(
        storage: BufferStorage<T>,
        rows: usize,
        cols: usize,
        layout: Layout,
        context_id: u32,
    ) -> GvResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ArrayError::InvalidDimensions { rows, cols });
        }
        let expected = rows * cols;
        if expected != storage.as_slice().len() {
            return Err(ArrayError::DataLength {
                expected,
                got: storage.as_slice().len(),
            });
        }
        context::context(context_id)?;
        Ok(Self {
            data: Arc::new(storage),
            rows,
            cols,
            layout,
            context_id,
        })
    }

    /// Creates a zero-filled row-major matrix under the default context.
    pub fn zeros(rows: usize, cols: usize) -> GvResult<Self> {
        Self::zeros_in(rows, cols, DEFAULT_CONTEXT_ID)
    }

    pub fn zeros_in(rows: usize, cols: usize, context_id: u32) -> GvResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ArrayError::InvalidDimensions { rows, cols });
        }
        Self::from_storage(
            BufferStorage::zeroed(rows * cols),
            rows,
            cols,
            Layout::RowMajor,
            context_id,
        )
    }

    /// Wraps row-major host data as a device matrix under the default
    /// context. The vector must hold exactly `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> GvResult<Self> {
        Self::from_vec_in(rows, cols, data, DEFAULT_CONTEXT_ID)
    }

    pub fn from_vec_in(rows: usize, cols: usize, data: Vec<T>, context_id: u32) -> GvResult<Self> {
        Self::from_storage(
            BufferStorage::from_vec(data),
            rows,
            cols,
            Layout::RowMajor,
            context_id,
        )
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
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
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> Dtype {
        T::DTYPE
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    pub fn data(&self) -> &[T] {
        self.data.as_slice()
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    pub(crate) fn storage(&self) -> &Arc<BufferStorage<T>> {
        &self.data
    }

    /// Returns a matrix whose buffer is reorganised to the requested layout.
    pub fn to_layout(&self, layout: Layout) -> Self {
        if layout == self.layout {
            return self.clone();
        }
        let source = self.data.as_slice();
        let mut cells = vec![T::ZERO; source.len()];
        match layout {
            // row-major -> column-major
            Layout::ColMajor => {
                for r in 0..self.rows {
                    for c in 0..self.cols {
                        cells[c * self.rows + r] = source[r * self.cols + c];
                    }
                }
            }
            // column-major -> row-major
            Layout::RowMajor => {
                for r in 0..self.rows {
                    for c in 0..self.cols {
                        cells[r * self.cols + c] = source[c * self.rows + r];
                    }
                }
            }
        }
        Self {
            data: Arc::new(BufferStorage::from_vec(cells)),
            rows: self.rows,
            cols: self.cols,
            layout,
            context_id: self.context_id,
        }
    }

    /// Borrows the matrix as a strided view matching its storage layout.
    pub fn view(&self) -> MatrixView<'_, T> {
        let (row_stride, col_stride) = self.layout.strides(self.rows, self.cols);
        MatrixView {
            data: self.data.as_slice(),
            rows: self.rows,
            cols: self.cols,
            offset: 0,
            row_stride,
            col_stride,
        }
    }

    pub fn view_mut(&mut self) -> MatrixViewMut<'_, T> {
        let (row_stride, col_stride) = self.layout.strides(self.rows, self.cols);
        let (rows, cols) = (self.rows, self.cols);
        MatrixViewMut {
            data: Arc::make_mut(&mut self.data).as_mut_slice(),
            rows,
            cols,
            offset: 0,
            row_stride,
            col_stride,
        }
    }
}

impl<T: Element + SampleUniform> DeviceMatrix<T> {
    /// Samples a row-major matrix uniformly from `[min, max)`.
    pub fn random_uniform(
        rows: usize,
        cols: usize,
        min: T,
        max: T,
        seed: Option<u64>,
    ) -> GvResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ArrayError::InvalidDimensions { rows, cols });
        }
        if !(min < max) {
            return Err(ArrayError::InvalidValue {
                label: "random_uniform_bounds",
            });
        }
        let mut rng = seedable_rng(seed);
        let distribution = Uniform::new(min, max);
        let data = (0..rows * cols)
            .map(|_| distribution.sample(&mut rng))
            .collect();
        Self::from_vec(rows, cols, data)
    }
}

/// Non-owning, possibly strided reference into a vector's buffer.
#[derive(Clone, Copy, Debug)]
pub struct VectorView<'a, T: Element> {
    data: &'a [T],
    len: usize,
    offset: usize,
    stride: usize,
}

impl<'a, T: Element> VectorView<'a, T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn get(&self, index: usize) -> T {
        debug_assert!(index < self.len);
        self.data[self.offset + index * self.stride]
    }

    /// Contiguous fast path; `None` when the view is strided.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.offset == 0 && self.stride == 1 {
            Some(&self.data[..self.len])
        } else {
            None
        }
    }
}

/// Mutable counterpart of [`VectorView`].
#[derive(Debug)]
pub struct VectorViewMut<'a, T: Element> {
    data: &'a mut [T],
    len: usize,
    offset: usize,
    stride: usize,
}

impl<'a, T: Element> VectorViewMut<'a, T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> T {
        debug_assert!(index < self.len);
        self.data[self.offset + index * self.stride]
    }

    #[inline]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        &mut self.data[self.offset + index * self.stride]
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if self.offset == 0 && self.stride == 1 {
            Some(&mut self.data[..self.len])
        } else {
            None
        }
    }
}

/// Non-owning, strided matrix view over a borrowed buffer.
///
/// Element `(r, c)` lives at `offset + r * row_stride + c * col_stride`.
#[derive(Clone, Copy, Debug)]
pub struct MatrixView<'a, T: Element> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    offset: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a, T: Element> MatrixView<'a, T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[self.offset + row * self.row_stride + col * self.col_stride]
    }

    /// True when the view densely covers a row-major buffer from offset zero.
    pub fn is_row_major_contiguous(&self) -> bool {
        self.offset == 0 && self.col_stride == 1 && self.row_stride == self.cols
    }

    /// Contiguous row-major fast path; `None` for any other orientation.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.is_row_major_contiguous() {
            Some(&self.data[..self.rows * self.cols])
        } else {
            None
        }
    }
}

/// Mutable counterpart of [`MatrixView`].
#[derive(Debug)]
pub struct MatrixViewMut<'a, T: Element> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
    offset: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a, T: Element> MatrixViewMut<'a, T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[self.offset + row * self.row_stride + col * self.col_stride]
    }

    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut T {
        debug_assert!(row < self.rows && col < self.cols);
        &mut self.data[self.offset + row * self.row_stride + col * self.col_stride]
    }

    pub fn is_row_major_contiguous(&self) -> bool {
        self.offset == 0 && self.col_stride == 1 && self.row_stride == self.cols
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if self.is_row_major_contiguous() {
            Some(&mut self.data[..self.rows * self.cols])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_constructors_validate() {
        assert_eq!(
            DeviceVector::<f32>::zeros(0).unwrap_err(),
            ArrayError::InvalidLength { len: 0 }
        );
        assert_eq!(
            DeviceVector::<f64>::zeros_in(4, 12_345).unwrap_err(),
            ArrayError::UnknownContext { id: 12_345 }
        );
        let v = DeviceVector::from_vec(vec![1.0f32, 2.0, 3.0]).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.dtype(), Dtype::F32);
        assert_eq!(v.context_id(), DEFAULT_CONTEXT_ID);
    }

    #[test]
    fn matrix_constructors_validate() {
        assert_eq!(
            DeviceMatrix::<i32>::zeros(0, 3).unwrap_err(),
            ArrayError::InvalidDimensions { rows: 0, cols: 3 }
        );
        assert_eq!(
            DeviceMatrix::from_vec(2, 3, vec![1.0f64; 5]).unwrap_err(),
            ArrayError::DataLength {
                expected: 6,
                got: 5
            }
        );
        let m = DeviceMatrix::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.layout(), Layout::RowMajor);
    }

    #[test]
    fn reshape_rule_shares_the_buffer() {
        let v = DeviceVector::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let view = v.as_matrix_view(3, 2).unwrap();
        assert_eq!(view.shape(), (3, 2));
        assert_eq!(view.get(0, 0), 1.0);
        assert_eq!(view.get(0, 1), 2.0);
        assert_eq!(view.get(2, 1), 6.0);
        assert!(view.is_row_major_contiguous());

        assert_eq!(
            v.as_matrix_view(2, 2).unwrap_err(),
            ArrayError::ReshapeMismatch {
                len: 6,
                rows: 2,
                cols: 2
            }
        );
    }

    #[test]
    fn writes_through_a_reshaped_view_land_in_the_vector() {
        let mut v = DeviceVector::from_vec(vec![0i32; 6]).unwrap();
        {
            let mut view = v.as_matrix_view_mut(2, 3).unwrap();
            *view.at_mut(1, 2) = 42;
        }
        assert_eq!(v.data(), &[0, 0, 0, 0, 0, 42]);
    }

    #[test]
    fn cloned_containers_diverge_on_write() {
        let mut a = DeviceMatrix::from_vec(2, 2, vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        let b = a.clone();
        a.data_mut()[0] = -1.0;
        assert_eq!(a.data()[0], -1.0);
        assert_eq!(b.data()[0], 1.0);
    }

    #[test]
    fn layout_conversion_round_trips() {
        let m = DeviceMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let col = m.to_layout(Layout::ColMajor);
        assert_eq!(col.data(), &[1, 4, 2, 5, 3, 6]);
        assert_eq!(col.view().get(0, 1), 2);
        assert_eq!(col.view().get(1, 2), 6);
        let back = col.to_layout(Layout::RowMajor);
        assert_eq!(back, m);
    }

    #[test]
    fn random_uniform_is_seed_deterministic() {
        let a = DeviceVector::<f32>::random_uniform(16, -1.0, 1.0, Some(7)).unwrap();
        let b = DeviceVector::<f32>::random_uniform(16, -1.0, 1.0, Some(7)).unwrap();
        assert_eq!(a, b);
        assert!(a.data().iter().all(|value| (-1.0..1.0).contains(value)));
    }
}

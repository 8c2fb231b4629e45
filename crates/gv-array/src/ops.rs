// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The BLAS Level-2 operations: matrix-vector product, vector-matrix product
//! and scaled transpose-broadcast accumulation.
//!
//! Every operation validates operand shapes, contexts and aliasing up front,
//! constructs fresh views over the operand buffers, then hands the views to a
//! compute backend. Nothing is written before validation succeeds.

use std::sync::Arc;

use crate::backend::cpu_dense;
#[cfg(feature = "wgpu")]
use crate::backend::wgpu_dense;
use crate::context;
use crate::dense::{ArrayError, DeviceMatrix, DeviceVector, GvResult};
#[cfg(feature = "wgpu")]
use crate::dense::Layout;
use crate::element::Element;
#[cfg(feature = "wgpu")]
use crate::element::Dtype;
use crate::observability::{emit_blas2_event, Blas2Event};
use std::fmt;

/// Explicit backend selection for the Level-2 operations. `Auto` defers to
/// the heuristics, the other variants force a specific kernel path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blas2Backend {
    /// Use heuristics to pick the best available backend.
    Auto,
    /// Force the blocked, rayon-parallel CPU kernels.
    CpuBlocked,
    /// Always fall back to the scalar reference kernels.
    CpuNaive,
    /// Force the compute path running through WGPU.
    #[cfg(feature = "wgpu")]
    GpuWgpu,
}

impl Blas2Backend {
    pub fn label(self) -> &'static str {
        match self {
            Blas2Backend::Auto => "auto",
            Blas2Backend::CpuBlocked => "cpu_blocked",
            Blas2Backend::CpuNaive => "cpu_naive",
            #[cfg(feature = "wgpu")]
            Blas2Backend::GpuWgpu => "wgpu",
        }
    }

    /// Reads the `GRIDVEC_BACKEND` override. Unset or unrecognized values
    /// resolve to `Auto`.
    pub fn from_env() -> Self {
        match std::env::var("GRIDVEC_BACKEND") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "cpu" | "cpu-blocked" => Blas2Backend::CpuBlocked,
                "cpu-naive" | "naive" => Blas2Backend::CpuNaive,
                #[cfg(feature = "wgpu")]
                "wgpu" | "gpu" => Blas2Backend::GpuWgpu,
                _ => Blas2Backend::Auto,
            },
            Err(_) => Blas2Backend::Auto,
        }
    }
}

impl fmt::Display for Blas2Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn ensure_same_context(expected: u32, got: u32) -> GvResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(ArrayError::ContextMismatch { expected, got })
    }
}

impl<T: Element> DeviceMatrix<T> {
    /// `y = A * x` into a freshly allocated vector.
    pub fn gemv(&self, x: &DeviceVector<T>) -> GvResult<DeviceVector<T>> {
        let mut y = DeviceVector::zeros_in(self.rows(), self.context_id())?;
        self.gemv_into(x, &mut y, Blas2Backend::Auto)?;
        Ok(y)
    }

    /// `y = A * x`, overwriting `y` in place.
    pub fn gemv_into(
        &self,
        x: &DeviceVector<T>,
        y: &mut DeviceVector<T>,
        backend: Blas2Backend,
    ) -> GvResult<()> {
        ensure_same_context(self.context_id(), x.context_id())?;
        ensure_same_context(self.context_id(), y.context_id())?;
        if x.len() != self.cols() {
            return Err(ArrayError::ShapeMismatch {
                left: self.shape(),
                right: (x.len(), 1),
            });
        }
        if y.len() != self.rows() {
            return Err(ArrayError::ShapeMismatch {
                left: (self.rows(), 1),
                right: (y.len(), 1),
            });
        }
        if Arc::ptr_eq(x.storage(), y.storage()) || Arc::ptr_eq(self.storage(), y.storage()) {
            return Err(ArrayError::AliasedOperands {
                label: "gemv output",
            });
        }

        let backend_label = run_gemv(self, x, y, backend)?;
        emit_blas2_event(&Blas2Event {
            op_name: "gemv",
            dtype: T::DTYPE,
            backend: backend_label,
            rows: self.rows(),
            cols: self.cols(),
        });
        Ok(())
    }

    /// `y = B^T * x` into a freshly allocated vector.
    pub fn gevm(&self, x: &DeviceVector<T>) -> GvResult<DeviceVector<T>> {
        let mut y = DeviceVector::zeros_in(self.cols(), self.context_id())?;
        self.gevm_into(x, &mut y, Blas2Backend::Auto)?;
        Ok(y)
    }

    /// `y = B^T * x`, overwriting `y` in place. The transpose is applied to
    /// the matrix operand; no data is moved.
    pub fn gevm_into(
        &self,
        x: &DeviceVector<T>,
        y: &mut DeviceVector<T>,
        backend: Blas2Backend,
    ) -> GvResult<()> {
        ensure_same_context(self.context_id(), x.context_id())?;
        ensure_same_context(self.context_id(), y.context_id())?;
        if x.len() != self.rows() {
            return Err(ArrayError::ShapeMismatch {
                left: self.shape(),
                right: (x.len(), 1),
            });
        }
        if y.len() != self.cols() {
            return Err(ArrayError::ShapeMismatch {
                left: (self.cols(), 1),
                right: (y.len(), 1),
            });
        }
        if Arc::ptr_eq(x.storage(), y.storage()) || Arc::ptr_eq(self.storage(), y.storage()) {
            return Err(ArrayError::AliasedOperands {
                label: "gevm output",
            });
        }

        let backend_label = run_gevm(self, x, y, backend)?;
        emit_blas2_event(&Blas2Event {
            op_name: "gevm",
            dtype: T::DTYPE,
            backend: backend_label,
            rows: self.rows(),
            cols: self.cols(),
        });
        Ok(())
    }

    /// `B += alpha * V^T` where the vector `v` is reinterpreted in place as a
    /// `cols x rows` row-major matrix sharing its buffer (the transposed
    /// dimensions of `B`). `context_id` must select the context both buffers
    /// were allocated under.
    pub fn axpy_transposed_from_vector(
        &mut self,
        alpha: T,
        v: &DeviceVector<T>,
        context_id: u32,
        backend: Blas2Backend,
    ) -> GvResult<()> {
        let ctx = context::context(context_id)?;
        ensure_same_context(ctx.id(), self.context_id())?;
        ensure_same_context(ctx.id(), v.context_id())?;

        let (rows, cols) = self.shape();
        let backend_label = run_axpy_vector_matrix(alpha, v, self, backend)?;
        emit_blas2_event(&Blas2Event {
            op_name: "axpy_t",
            dtype: T::DTYPE,
            backend: backend_label,
            rows,
            cols,
        });
        Ok(())
    }
}

impl<T: Element> DeviceVector<T> {
    /// Treats this vector's storage as an `m.cols x m.rows` row-major matrix
    /// and accumulates `alpha * M^T` into it in place. `context_id` must
    /// select the context both buffers were allocated under.
    pub fn axpy_transposed_from_matrix(
        &mut self,
        alpha: T,
        m: &DeviceMatrix<T>,
        context_id: u32,
        backend: Blas2Backend,
    ) -> GvResult<()> {
        let ctx = context::context(context_id)?;
        ensure_same_context(ctx.id(), self.context_id())?;
        ensure_same_context(ctx.id(), m.context_id())?;

        let (rows, cols) = m.shape();
        let backend_label = run_axpy_matrix_vector(alpha, m, self, backend)?;
        emit_blas2_event(&Blas2Event {
            op_name: "axpy_t",
            dtype: T::DTYPE,
            backend: backend_label,
            rows: cols,
            cols: rows,
        });
        Ok(())
    }
}

fn run_gemv<T: Element>(
    a: &DeviceMatrix<T>,
    x: &DeviceVector<T>,
    y: &mut DeviceVector<T>,
    backend: Blas2Backend,
) -> GvResult<&'static str> {
    let (rows, cols) = a.shape();
    match backend {
        Blas2Backend::Auto => {
            #[cfg(feature = "wgpu")]
            if T::DTYPE == Dtype::F32
                && a.layout() == Layout::RowMajor
                && wgpu_dense::is_available()
                && wgpu_dense::should_use(rows, cols)
                && gemv_wgpu(a, x, y).is_ok()
            {
                return Ok("wgpu");
            }
            if cpu_dense::should_use(rows, cols) {
                cpu_dense::gemv_into(&mut y.view_mut(), &a.view(), &x.view()).map_err(
                    |message| ArrayError::BackendFailure {
                        backend: "cpu_blocked",
                        message,
                    },
                )?;
                Ok("cpu_blocked")
            } else {
                cpu_dense::gemv_naive_into(&mut y.view_mut(), &a.view(), &x.view()).map_err(
                    |message| ArrayError::BackendFailure {
                        backend: "cpu_naive",
                        message,
                    },
                )?;
                Ok("cpu_naive")
            }
        }
        Blas2Backend::CpuBlocked => {
            cpu_dense::gemv_into(&mut y.view_mut(), &a.view(), &x.view()).map_err(|message| {
                ArrayError::BackendFailure {
                    backend: "cpu_blocked",
                    message,
                }
            })?;
            Ok("cpu_blocked")
        }
        Blas2Backend::CpuNaive => {
            cpu_dense::gemv_naive_into(&mut y.view_mut(), &a.view(), &x.view()).map_err(
                |message| ArrayError::BackendFailure {
                    backend: "cpu_naive",
                    message,
                },
            )?;
            Ok("cpu_naive")
        }
        #[cfg(feature = "wgpu")]
        Blas2Backend::GpuWgpu => {
            gemv_wgpu(a, x, y)?;
            Ok("wgpu")
        }
    }
}

fn run_gevm<T: Element>(
    b: &DeviceMatrix<T>,
    x: &DeviceVector<T>,
    y: &mut DeviceVector<T>,
    backend: Blas2Backend,
) -> GvResult<&'static str> {
    let (rows, cols) = b.shape();
    match backend {
        Blas2Backend::Auto => {
            #[cfg(feature = "wgpu")]
            if T::DTYPE == Dtype::F32
                && b.layout() == Layout::RowMajor
                && wgpu_dense::is_available()
                && wgpu_dense::should_use(rows, cols)
                && gevm_wgpu(b, x, y).is_ok()
            {
                return Ok("wgpu");
            }
            if cpu_dense::should_use(rows, cols) {
                cpu_dense::gevm_into(&mut y.view_mut(), &x.view(), &b.view()).map_err(
                    |message| ArrayError::BackendFailure {
                        backend: "cpu_blocked",
                        message,
                    },
                )?;
                Ok("cpu_blocked")
            } else {
                cpu_dense::gevm_naive_into(&mut y.view_mut(), &x.view(), &b.view()).map_err(
                    |message| ArrayError::BackendFailure {
                        backend: "cpu_naive",
                        message,
                    },
                )?;
                Ok("cpu_naive")
            }
        }
        Blas2Backend::CpuBlocked => {
            cpu_dense::gevm_into(&mut y.view_mut(), &x.view(), &b.view()).map_err(|message| {
                ArrayError::BackendFailure {
                    backend: "cpu_blocked",
                    message,
                }
            })?;
            Ok("cpu_blocked")
        }
        Blas2Backend::CpuNaive => {
            cpu_dense::gevm_naive_into(&mut y.view_mut(), &x.view(), &b.view()).map_err(
                |message| ArrayError::BackendFailure {
                    backend: "cpu_naive",
                    message,
                },
            )?;
            Ok("cpu_naive")
        }
        #[cfg(feature = "wgpu")]
        Blas2Backend::GpuWgpu => {
            gevm_wgpu(b, x, y)?;
            Ok("wgpu")
        }
    }
}

fn run_axpy_vector_matrix<T: Element>(
    alpha: T,
    v: &DeviceVector<T>,
    b: &mut DeviceMatrix<T>,
    backend: Blas2Backend,
) -> GvResult<&'static str> {
    let (rows, cols) = b.shape();
    match backend {
        Blas2Backend::Auto => {
            #[cfg(feature = "wgpu")]
            if T::DTYPE == Dtype::F32
                && b.layout() == Layout::RowMajor
                && v.len() == rows * cols
                && wgpu_dense::is_available()
                && wgpu_dense::should_use(rows, cols)
                && axpy_wgpu_vector_matrix(alpha, v, b).is_ok()
            {
                return Ok("wgpu");
            }
            let src = v.as_matrix_view(cols, rows)?;
            let mut dst = b.view_mut();
            if cpu_dense::should_use(rows, cols) {
                cpu_dense::axpy_transpose_into(&mut dst, &src, alpha).map_err(|message| {
                    ArrayError::BackendFailure {
                        backend: "cpu_blocked",
                        message,
                    }
                })?;
                Ok("cpu_blocked")
            } else {
                cpu_dense::axpy_transpose_naive_into(&mut dst, &src, alpha).map_err(|message| {
                    ArrayError::BackendFailure {
                        backend: "cpu_naive",
                        message,
                    }
                })?;
                Ok("cpu_naive")
            }
        }
        Blas2Backend::CpuBlocked => {
            let src = v.as_matrix_view(cols, rows)?;
            let mut dst = b.view_mut();
            cpu_dense::axpy_transpose_into(&mut dst, &src, alpha).map_err(|message| {
                ArrayError::BackendFailure {
                    backend: "cpu_blocked",
                    message,
                }
            })?;
            Ok("cpu_blocked")
        }
        Blas2Backend::CpuNaive => {
            let src = v.as_matrix_view(cols, rows)?;
            let mut dst = b.view_mut();
            cpu_dense::axpy_transpose_naive_into(&mut dst, &src, alpha).map_err(|message| {
                ArrayError::BackendFailure {
                    backend: "cpu_naive",
                    message,
                }
            })?;
            Ok("cpu_naive")
        }
        #[cfg(feature = "wgpu")]
        Blas2Backend::GpuWgpu => {
            axpy_wgpu_vector_matrix(alpha, v, b)?;
            Ok("wgpu")
        }
    }
}

fn run_axpy_matrix_vector<T: Element>(
    alpha: T,
    m: &DeviceMatrix<T>,
    v: &mut DeviceVector<T>,
    backend: Blas2Backend,
) -> GvResult<&'static str> {
    let (rows, cols) = m.shape();
    match backend {
        Blas2Backend::Auto => {
            #[cfg(feature = "wgpu")]
            if T::DTYPE == Dtype::F32
                && m.layout() == Layout::RowMajor
                && v.len() == rows * cols
                && wgpu_dense::is_available()
                && wgpu_dense::should_use(rows, cols)
                && axpy_wgpu_matrix_vector(alpha, m, v).is_ok()
            {
                return Ok("wgpu");
            }
            let src = m.view();
            let mut dst = v.as_matrix_view_mut(cols, rows)?;
            if cpu_dense::should_use(rows, cols) {
                cpu_dense::axpy_transpose_into(&mut dst, &src, alpha).map_err(|message| {
                    ArrayError::BackendFailure {
                        backend: "cpu_blocked",
                        message,
                    }
                })?;
                Ok("cpu_blocked")
            } else {
                cpu_dense::axpy_transpose_naive_into(&mut dst, &src, alpha).map_err(|message| {
                    ArrayError::BackendFailure {
                        backend: "cpu_naive",
                        message,
                    }
                })?;
                Ok("cpu_naive")
            }
        }
        Blas2Backend::CpuBlocked => {
            let src = m.view();
            let mut dst = v.as_matrix_view_mut(cols, rows)?;
            cpu_dense::axpy_transpose_into(&mut dst, &src, alpha).map_err(|message| {
                ArrayError::BackendFailure {
                    backend: "cpu_blocked",
                    message,
                }
            })?;
            Ok("cpu_blocked")
        }
        Blas2Backend::CpuNaive => {
            let src = m.view();
            let mut dst = v.as_matrix_view_mut(cols, rows)?;
            cpu_dense::axpy_transpose_naive_into(&mut dst, &src, alpha).map_err(|message| {
                ArrayError::BackendFailure {
                    backend: "cpu_naive",
                    message,
                }
            })?;
            Ok("cpu_naive")
        }
        #[cfg(feature = "wgpu")]
        Blas2Backend::GpuWgpu => {
            axpy_wgpu_matrix_vector(alpha, m, v)?;
            Ok("wgpu")
        }
    }
}

#[cfg(feature = "wgpu")]
fn require_f32<T: Element>(op: &str) -> GvResult<()> {
    if T::DTYPE == Dtype::F32 {
        Ok(())
    } else {
        Err(ArrayError::BackendFailure {
            backend: "wgpu",
            message: format!("{op} on the wgpu backend supports f32 only, got {}", T::DTYPE),
        })
    }
}

#[cfg(feature = "wgpu")]
fn gemv_wgpu<T: Element>(
    a: &DeviceMatrix<T>,
    x: &DeviceVector<T>,
    y: &mut DeviceVector<T>,
) -> GvResult<()> {
    require_f32::<T>("gemv")?;
    let a_view = a.view();
    let Some(lhs) = a_view.as_slice() else {
        return Err(ArrayError::UnsupportedLayout {
            label: "wgpu gemv expects a row-major matrix",
        });
    };
    let buffer = wgpu_dense::gemv(
        bytemuck::cast_slice(lhs),
        bytemuck::cast_slice(x.data()),
        a.rows(),
        a.cols(),
    )
    .map_err(|message| ArrayError::BackendFailure {
        backend: "wgpu",
        message,
    })?;
    y.data_mut().copy_from_slice(bytemuck::cast_slice(&buffer));
    Ok(())
}

#[cfg(feature = "wgpu")]
fn gevm_wgpu<T: Element>(
    b: &DeviceMatrix<T>,
    x: &DeviceVector<T>,
    y: &mut DeviceVector<T>,
) -> GvResult<()> {
    require_f32::<T>("gevm")?;
    let b_view = b.view();
    let Some(rhs) = b_view.as_slice() else {
        return Err(ArrayError::UnsupportedLayout {
            label: "wgpu gevm expects a row-major matrix",
        });
    };
    let buffer = wgpu_dense::gevm(
        bytemuck::cast_slice(rhs),
        bytemuck::cast_slice(x.data()),
        b.rows(),
        b.cols(),
    )
    .map_err(|message| ArrayError::BackendFailure {
        backend: "wgpu",
        message,
    })?;
    y.data_mut().copy_from_slice(bytemuck::cast_slice(&buffer));
    Ok(())
}

#[cfg(feature = "wgpu")]
fn axpy_wgpu_vector_matrix<T: Element>(
    alpha: T,
    v: &DeviceVector<T>,
    b: &mut DeviceMatrix<T>,
) -> GvResult<()> {
    require_f32::<T>("axpy")?;
    if b.layout() != Layout::RowMajor {
        return Err(ArrayError::UnsupportedLayout {
            label: "wgpu axpy expects a row-major destination",
        });
    }
    let (rows, cols) = b.shape();
    // validates the reshape before any buffer is touched
    v.as_matrix_view(cols, rows)?;
    let updated = wgpu_dense::axpy_transpose(
        bytemuck::cast_slice(b.data()),
        bytemuck::cast_slice(v.data()),
        rows,
        cols,
        alpha.to_f64() as f32,
    )
    .map_err(|message| ArrayError::BackendFailure {
        backend: "wgpu",
        message,
    })?;
    b.data_mut().copy_from_slice(bytemuck::cast_slice(&updated));
    Ok(())
}

#[cfg(feature = "wgpu")]
fn axpy_wgpu_matrix_vector<T: Element>(
    alpha: T,
    m: &DeviceMatrix<T>,
    v: &mut DeviceVector<T>,
) -> GvResult<()> {
    require_f32::<T>("axpy")?;
    let m_view = m.view();
    let Some(src) = m_view.as_slice() else {
        return Err(ArrayError::UnsupportedLayout {
            label: "wgpu axpy expects a row-major source",
        });
    };
    let (rows, cols) = m.shape();
    v.as_matrix_view(cols, rows)?;
    // destination is the vector viewed as cols x rows
    let updated = wgpu_dense::axpy_transpose(
        bytemuck::cast_slice(v.data()),
        bytemuck::cast_slice(src),
        cols,
        rows,
        alpha.to_f64() as f32,
    )
    .map_err(|message| ArrayError::BackendFailure {
        backend: "wgpu",
        message,
    })?;
    v.data_mut().copy_from_slice(bytemuck::cast_slice(&updated));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{register_context, ContextKind};
    use crate::dense::Layout;
    use approx::assert_relative_eq;

    fn sample_matrix<T: Element>() -> DeviceMatrix<T> {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
            .iter()
            .map(|&v| T::from_f64(v))
            .collect();
        DeviceMatrix::from_vec(2, 3, data).unwrap()
    }

    fn sample_input<T: Element>() -> DeviceVector<T> {
        let data = [7.0, 8.0, 9.0].iter().map(|&v| T::from_f64(v)).collect();
        DeviceVector::from_vec(data).unwrap()
    }

    fn gemv_matches_reference<T: Element>() {
        let a = sample_matrix::<T>();
        let x = sample_input::<T>();
        let y = a.gemv(&x).unwrap();
        assert_eq!(y.data(), &[T::from_f64(50.0), T::from_f64(122.0)]);
    }

    #[test]
    fn gemv_reference_all_dtypes() {
        gemv_matches_reference::<i32>();
        gemv_matches_reference::<f32>();
        gemv_matches_reference::<f64>();
    }

    fn gevm_matches_reference<T: Element>() {
        let b = sample_matrix::<T>();
        let x = DeviceVector::from_vec(vec![T::from_f64(10.0), T::from_f64(100.0)]).unwrap();
        let y = b.gevm(&x).unwrap();
        assert_eq!(
            y.data(),
            &[
                T::from_f64(410.0),
                T::from_f64(520.0),
                T::from_f64(630.0)
            ]
        );
    }

    #[test]
    fn gevm_reference_all_dtypes() {
        gevm_matches_reference::<i32>();
        gevm_matches_reference::<f32>();
        gevm_matches_reference::<f64>();
    }

    #[test]
    fn gemv_blocked_and_naive_backends_agree() {
        let a = DeviceMatrix::<f64>::random_uniform(65, 129, -1.0, 1.0, Some(3)).unwrap();
        let x = DeviceVector::<f64>::random_uniform(129, -1.0, 1.0, Some(4)).unwrap();
        let mut blocked = DeviceVector::<f64>::zeros(65).unwrap();
        let mut naive = DeviceVector::<f64>::zeros(65).unwrap();
        a.gemv_into(&x, &mut blocked, Blas2Backend::CpuBlocked).unwrap();
        a.gemv_into(&x, &mut naive, Blas2Backend::CpuNaive).unwrap();
        for (b, n) in blocked.data().iter().zip(naive.data()) {
            assert_relative_eq!(*b, *n, max_relative = 1e-12);
        }
    }

    fn axpy_zero_alpha_is_identity<T: Element>() {
        let mut b = sample_matrix::<T>();
        let before = b.clone();
        let v_data = (1..=6).map(|v| T::from_f64(v as f64 * 10.0)).collect();
        let v = DeviceVector::from_vec(v_data).unwrap();
        b.axpy_transposed_from_vector(T::ZERO, &v, 0, Blas2Backend::Auto)
            .unwrap();
        assert_eq!(b, before);
    }

    #[test]
    fn axpy_alpha_zero_all_dtypes() {
        axpy_zero_alpha_is_identity::<i32>();
        axpy_zero_alpha_is_identity::<f32>();
        axpy_zero_alpha_is_identity::<f64>();
    }

    #[test]
    fn axpy_vector_into_matrix_reference() {
        // B (2x3) += reshape(v, 3x2)^T with alpha = 1
        let mut b = DeviceMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let v = DeviceVector::from_vec(vec![10, 20, 30, 40, 50, 60]).unwrap();
        b.axpy_transposed_from_vector(1, &v, 0, Blas2Backend::Auto)
            .unwrap();
        assert_eq!(b.data(), &[11, 32, 53, 24, 45, 66]);
    }

    #[test]
    fn axpy_matrix_into_vector_reference() {
        // v viewed as 3x2 += A(2x3)^T with alpha = 1
        let a = DeviceMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut v = DeviceVector::from_vec(vec![10, 20, 30, 40, 50, 60]).unwrap();
        v.axpy_transposed_from_matrix(1, &a, 0, Blas2Backend::Auto)
            .unwrap();
        assert_eq!(v.data(), &[11, 24, 32, 45, 53, 66]);
    }

    #[test]
    fn axpy_scales_by_alpha() {
        let mut b = DeviceMatrix::from_vec(2, 2, vec![0.0f64; 4]).unwrap();
        let v = DeviceVector::from_vec(vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        b.axpy_transposed_from_vector(0.5, &v, 0, Blas2Backend::Auto)
            .unwrap();
        // reshape(v, 2x2) = [[1,2],[3,4]]; transpose = [[1,3],[2,4]]
        assert_eq!(b.data(), &[0.5, 1.5, 1.0, 2.0]);
    }

    #[test]
    fn axpy_rejects_bad_reshape() {
        let mut b = DeviceMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let before = b.clone();
        let v = DeviceVector::from_vec(vec![1, 2, 3, 4, 5]).unwrap();
        let err = b
            .axpy_transposed_from_vector(1, &v, 0, Blas2Backend::Auto)
            .unwrap_err();
        assert_eq!(
            err,
            ArrayError::ReshapeMismatch {
                len: 5,
                rows: 3,
                cols: 2
            }
        );
        assert_eq!(b, before);
    }

    #[test]
    fn gemv_rejects_shape_mismatch_without_mutation() {
        let a = sample_matrix::<f64>();
        let x = DeviceVector::from_vec(vec![1.0f64, 2.0]).unwrap();
        let mut y = DeviceVector::from_vec(vec![-1.0f64, -2.0]).unwrap();
        let err = a.gemv_into(&x, &mut y, Blas2Backend::Auto).unwrap_err();
        assert_eq!(
            err,
            ArrayError::ShapeMismatch {
                left: (2, 3),
                right: (2, 1)
            }
        );
        assert_eq!(y.data(), &[-1.0, -2.0]);
    }

    #[test]
    fn gemv_rejects_aliased_output() {
        // square so the aliased clone also passes the shape checks
        let a = DeviceMatrix::from_vec(3, 3, vec![1.0f32; 9]).unwrap();
        let x = sample_input::<f32>();
        let mut y = x.clone();
        let err = a.gemv_into(&x, &mut y, Blas2Backend::Auto).unwrap_err();
        assert_eq!(
            err,
            ArrayError::AliasedOperands {
                label: "gemv output"
            }
        );
    }

    #[test]
    fn operations_verify_contexts() {
        register_context(83, ContextKind::Cpu).unwrap();
        let a = sample_matrix::<f64>();
        let x = sample_input::<f64>();
        let mut y = DeviceVector::<f64>::zeros_in(2, 83).unwrap();
        let err = a.gemv_into(&x, &mut y, Blas2Backend::Auto).unwrap_err();
        assert_eq!(err, ArrayError::ContextMismatch { expected: 0, got: 83 });

        let mut b = sample_matrix::<f64>();
        let v = DeviceVector::from_vec(vec![0.0f64; 6]).unwrap();
        let err = b
            .axpy_transposed_from_vector(1.0, &v, 83, Blas2Backend::Auto)
            .unwrap_err();
        assert_eq!(err, ArrayError::ContextMismatch { expected: 83, got: 0 });

        let err = b
            .axpy_transposed_from_vector(1.0, &v, 5_000, Blas2Backend::Auto)
            .unwrap_err();
        assert_eq!(err, ArrayError::UnknownContext { id: 5_000 });
    }

    #[test]
    fn column_major_operands_take_the_strided_path() {
        let a = sample_matrix::<f64>().to_layout(Layout::ColMajor);
        let x = sample_input::<f64>();
        let y = a.gemv(&x).unwrap();
        assert_eq!(y.data(), &[50.0, 122.0]);
    }

    #[test]
    fn backend_env_override_parses() {
        std::env::set_var("GRIDVEC_BACKEND", "cpu-naive");
        assert_eq!(Blas2Backend::from_env(), Blas2Backend::CpuNaive);
        std::env::set_var("GRIDVEC_BACKEND", "definitely-not-a-backend");
        assert_eq!(Blas2Backend::from_env(), Blas2Backend::Auto);
        std::env::remove_var("GRIDVEC_BACKEND");
        assert_eq!(Blas2Backend::from_env(), Blas2Backend::Auto);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use rayon::prelude::*;

use crate::dense::{MatrixView, MatrixViewMut, VectorView, VectorViewMut};
use crate::element::Element;

// Work below this element volume is not worth fanning out to rayon.
const PAR_VOLUME: usize = 32 * 1024;

pub fn is_available() -> bool {
    true
}

pub fn should_use(rows: usize, cols: usize) -> bool {
    rows * cols >= 64 * 64
}

#[inline]
fn dot<T: Element>(lhs: &[T], rhs: &[T]) -> T {
    debug_assert_eq!(lhs.len(), rhs.len());
    let mut acc0 = T::ZERO;
    let mut acc1 = T::ZERO;
    let mut acc2 = T::ZERO;
    let mut acc3 = T::ZERO;
    let mut chunks = lhs.chunks_exact(4).zip(rhs.chunks_exact(4));
    for (a, b) in &mut chunks {
        acc0 += a[0] * b[0];
        acc1 += a[1] * b[1];
        acc2 += a[2] * b[2];
        acc3 += a[3] * b[3];
    }
    let tail = lhs.len() - lhs.len() % 4;
    let mut acc = acc0 + acc1 + acc2 + acc3;
    for (a, b) in lhs[tail..].iter().zip(&rhs[tail..]) {
        acc += *a * *b;
    }
    acc
}

pub fn gemv_into<T: Element>(
    y: &mut VectorViewMut<'_, T>,
    a: &MatrixView<'_, T>,
    x: &VectorView<'_, T>,
) -> Result<(), String> {
    let rows = a.rows();
    let cols = a.cols();
    if x.len() != cols {
        return Err(format!(
            "input vector length mismatch: expected {cols} elements, got {}",
            x.len()
        ));
    }
    if y.len() != rows {
        return Err(format!(
            "output vector length mismatch: expected {rows} elements, got {}",
            y.len()
        ));
    }

    if let (Some(lhs), Some(input)) = (a.as_slice(), x.as_slice()) {
        if let Some(out) = y.as_mut_slice() {
            if rows * cols >= PAR_VOLUME {
                out.par_iter_mut().enumerate().for_each(|(r, dst)| {
                    *dst = dot(&lhs[r * cols..(r + 1) * cols], input);
                });
            } else {
                for (r, dst) in out.iter_mut().enumerate() {
                    *dst = dot(&lhs[r * cols..(r + 1) * cols], input);
                }
            }
        } else {
            for r in 0..rows {
                *y.at_mut(r) = dot(&lhs[r * cols..(r + 1) * cols], input);
            }
        }
        return Ok(());
    }

    gemv_naive_into(y, a, x)
}

/// Scalar reference path; handles every stride combination.
pub fn gemv_naive_into<T: Element>(
    y: &mut VectorViewMut<'_, T>,
    a: &MatrixView<'_, T>,
    x: &VectorView<'_, T>,
) -> Result<(), String> {
    let rows = a.rows();
    let cols = a.cols();
    if x.len() != cols || y.len() != rows {
        return Err(format!(
            "gemv operand lengths ({}, {}) do not match a {rows} x {cols} matrix",
            x.len(),
            y.len()
        ));
    }
    for r in 0..rows {
        let mut acc = T::ZERO;
        for c in 0..cols {
            acc += a.get(r, c) * x.get(c);
        }
        *y.at_mut(r) = acc;
    }
    Ok(())
}

pub fn gevm_into<T: Element>(
    y: &mut VectorViewMut<'_, T>,
    x: &VectorView<'_, T>,
    b: &MatrixView<'_, T>,
) -> Result<(), String> {
    let rows = b.rows();
    let cols = b.cols();
    if x.len() != rows {
        return Err(format!(
            "input vector length mismatch: expected {rows} elements, got {}",
            x.len()
        ));
    }
    if y.len() != cols {
        return Err(format!(
            "output vector length mismatch: expected {cols} elements, got {}",
            y.len()
        ));
    }

    if let (Some(rhs), Some(input)) = (b.as_slice(), x.as_slice()) {
        if let Some(out) = y.as_mut_slice() {
            if rows * cols >= PAR_VOLUME {
                out.par_iter_mut().enumerate().for_each(|(c, dst)| {
                    let mut acc = T::ZERO;
                    for r in 0..rows {
                        acc += input[r] * rhs[r * cols + c];
                    }
                    *dst = acc;
                });
            } else {
                // row sweep keeps the matrix accesses contiguous
                out.fill(T::ZERO);
                for r in 0..rows {
                    let weight = input[r];
                    let row = &rhs[r * cols..(r + 1) * cols];
                    for (dst, value) in out.iter_mut().zip(row) {
                        *dst += weight * *value;
                    }
                }
            }
            return Ok(());
        }
    }

    gevm_naive_into(y, x, b)
}

pub fn gevm_naive_into<T: Element>(
    y: &mut VectorViewMut<'_, T>,
    x: &VectorView<'_, T>,
    b: &MatrixView<'_, T>,
) -> Result<(), String> {
    let rows = b.rows();
    let cols = b.cols();
    if x.len() != rows || y.len() != cols {
        return Err(format!(
            "gevm operand lengths ({}, {}) do not match a {rows} x {cols} matrix",
            x.len(),
            y.len()
        ));
    }
    for c in 0..cols {
        let mut acc = T::ZERO;
        for r in 0..rows {
            acc += x.get(r) * b.get(r, c);
        }
        *y.at_mut(c) = acc;
    }
    Ok(())
}

/// `dst += alpha * src^T`. `src` must be shaped as the transpose of `dst`.
pub fn axpy_transpose_into<T: Element>(
    dst: &mut MatrixViewMut<'_, T>,
    src: &MatrixView<'_, T>,
    alpha: T,
) -> Result<(), String> {
    let rows = dst.rows();
    let cols = dst.cols();
    if src.rows() != cols || src.cols() != rows {
        return Err(format!(
            "source shape {:?} is not the transpose of destination shape {:?}",
            src.shape(),
            dst.shape()
        ));
    }

    if let Some(src_data) = src.as_slice() {
        if let Some(out) = dst.as_mut_slice() {
            if rows * cols >= PAR_VOLUME {
                out.par_chunks_mut(cols).enumerate().for_each(|(r, row)| {
                    for (c, dst_cell) in row.iter_mut().enumerate() {
                        *dst_cell += alpha * src_data[c * rows + r];
                    }
                });
            } else {
                for r in 0..rows {
                    let row = &mut out[r * cols..(r + 1) * cols];
                    for (c, dst_cell) in row.iter_mut().enumerate() {
                        *dst_cell += alpha * src_data[c * rows + r];
                    }
                }
            }
            return Ok(());
        }
    }

    axpy_transpose_naive_into(dst, src, alpha)
}

pub fn axpy_transpose_naive_into<T: Element>(
    dst: &mut MatrixViewMut<'_, T>,
    src: &MatrixView<'_, T>,
    alpha: T,
) -> Result<(), String> {
    let rows = dst.rows();
    let cols = dst.cols();
    if src.rows() != cols || src.cols() != rows {
        return Err(format!(
            "source shape {:?} is not the transpose of destination shape {:?}",
            src.shape(),
            dst.shape()
        ));
    }
    for r in 0..rows {
        for c in 0..cols {
            *dst.at_mut(r, c) += alpha * src.get(c, r);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::{DeviceMatrix, DeviceVector, Layout};

    #[test]
    fn blocked_and_naive_gemv_agree() {
        let a = DeviceMatrix::<f64>::random_uniform(33, 47, -2.0, 2.0, Some(11)).unwrap();
        let x = DeviceVector::<f64>::random_uniform(47, -2.0, 2.0, Some(12)).unwrap();
        let mut fast = DeviceVector::<f64>::zeros(33).unwrap();
        let mut slow = DeviceVector::<f64>::zeros(33).unwrap();
        gemv_into(&mut fast.view_mut(), &a.view(), &x.view()).unwrap();
        gemv_naive_into(&mut slow.view_mut(), &a.view(), &x.view()).unwrap();
        for (f, s) in fast.data().iter().zip(slow.data()) {
            assert!((f - s).abs() < 1e-9, "fast={f} slow={s}");
        }
    }

    #[test]
    fn gemv_handles_column_major_operands() {
        let a = DeviceMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let col = a.to_layout(Layout::ColMajor);
        let x = DeviceVector::from_vec(vec![1, 1, 1]).unwrap();
        let mut y = DeviceVector::zeros(2).unwrap();
        gemv_into(&mut y.view_mut(), &col.view(), &x.view()).unwrap();
        assert_eq!(y.data(), &[6, 15]);
    }

    #[test]
    fn gevm_matches_column_sums() {
        let b = DeviceMatrix::from_vec(2, 3, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let x = DeviceVector::from_vec(vec![10.0f32, 100.0]).unwrap();
        let mut y = DeviceVector::zeros(3).unwrap();
        gevm_into(&mut y.view_mut(), &x.view(), &b.view()).unwrap();
        assert_eq!(y.data(), &[410.0, 520.0, 630.0]);

        let mut naive = DeviceVector::zeros(3).unwrap();
        gevm_naive_into(&mut naive.view_mut(), &x.view(), &b.view()).unwrap();
        assert_eq!(naive.data(), y.data());
    }

    #[test]
    fn axpy_transpose_accumulates() {
        let mut b = DeviceMatrix::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let v = DeviceVector::from_vec(vec![10, 20, 30, 40, 50, 60]).unwrap();
        let src = v.as_matrix_view(3, 2).unwrap();
        axpy_transpose_into(&mut b.view_mut(), &src, 1).unwrap();
        assert_eq!(b.data(), &[11, 32, 53, 24, 45, 66]);
    }

    #[test]
    fn kernel_length_validation() {
        let a = DeviceMatrix::from_vec(2, 3, vec![0.0f32; 6]).unwrap();
        let x = DeviceVector::from_vec(vec![0.0f32; 2]).unwrap();
        let mut y = DeviceVector::zeros(2).unwrap();
        let err = gemv_into(&mut y.view_mut(), &a.view(), &x.view()).unwrap_err();
        assert!(err.contains("expected 3 elements"));
    }
}

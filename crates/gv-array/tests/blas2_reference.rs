// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.

//! Reference checks for the Level-2 operations against scalar
//! recomputations on randomized operands.

use approx::assert_relative_eq;
use gv_array::{Blas2Backend, DeviceMatrix, DeviceVector};

fn reference_gemv(a: &[f64], x: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut out = vec![0.0; rows];
    for r in 0..rows {
        for c in 0..cols {
            out[r] += a[r * cols + c] * x[c];
        }
    }
    out
}

fn reference_gevm(b: &[f64], x: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut out = vec![0.0; cols];
    for r in 0..rows {
        for c in 0..cols {
            out[c] += x[r] * b[r * cols + c];
        }
    }
    out
}

#[test]
fn gemv_matches_reference_on_random_operands() {
    for (rows, cols, seed) in [(5, 7, 1u64), (64, 64, 2), (97, 131, 3)] {
        let a = DeviceMatrix::<f64>::random_uniform(rows, cols, -3.0, 3.0, Some(seed)).unwrap();
        let x = DeviceVector::<f64>::random_uniform(cols, -3.0, 3.0, Some(seed + 100)).unwrap();
        let y = a.gemv(&x).unwrap();
        let expected = reference_gemv(a.data(), x.data(), rows, cols);
        for (got, want) in y.data().iter().zip(&expected) {
            assert_relative_eq!(*got, *want, max_relative = 1e-10);
        }
    }
}

#[test]
fn gevm_matches_reference_on_random_operands() {
    for (rows, cols, seed) in [(7, 5, 10u64), (64, 64, 11), (131, 97, 12)] {
        let b = DeviceMatrix::<f64>::random_uniform(rows, cols, -3.0, 3.0, Some(seed)).unwrap();
        let x = DeviceVector::<f64>::random_uniform(rows, -3.0, 3.0, Some(seed + 100)).unwrap();
        let y = b.gevm(&x).unwrap();
        let expected = reference_gevm(b.data(), x.data(), rows, cols);
        for (got, want) in y.data().iter().zip(&expected) {
            assert_relative_eq!(*got, *want, max_relative = 1e-10);
        }
    }
}

#[test]
fn gemv_is_exact_for_integers() {
    let a = DeviceMatrix::<i32>::random_uniform(13, 17, -50, 50, Some(21)).unwrap();
    let x = DeviceVector::<i32>::random_uniform(17, -50, 50, Some(22)).unwrap();
    let y = a.gemv(&x).unwrap();
    for (r, got) in y.data().iter().enumerate() {
        let mut want = 0i32;
        for c in 0..17 {
            want += a.data()[r * 17 + c] * x.data()[c];
        }
        assert_eq!(*got, want);
    }
}

#[test]
fn axpy_round_trip_against_reference() {
    let rows = 6;
    let cols = 9;
    let mut b = DeviceMatrix::<f64>::random_uniform(rows, cols, -1.0, 1.0, Some(31)).unwrap();
    let before = b.clone();
    let v = DeviceVector::<f64>::random_uniform(rows * cols, -1.0, 1.0, Some(32)).unwrap();
    let alpha = 0.75;
    b.axpy_transposed_from_vector(alpha, &v, 0, Blas2Backend::Auto)
        .unwrap();

    // reshape(v) is cols x rows row-major; B(r, c) += alpha * reshape(v)(c, r)
    for r in 0..rows {
        for c in 0..cols {
            let want = before.data()[r * cols + c] + alpha * v.data()[c * rows + r];
            assert_relative_eq!(b.data()[r * cols + c], want, max_relative = 1e-12);
        }
    }
}

#[test]
fn axpy_orientations_are_consistent() {
    // Accumulating A^T into a vector viewed as the transposed shape must
    // equal the matrix-destination orientation run on transposed operands.
    let a = DeviceMatrix::from_vec(3, 4, (1..=12).map(|v| v as f64).collect()).unwrap();
    let mut v = DeviceVector::from_vec(vec![1.0f64; 12]).unwrap();
    v.axpy_transposed_from_matrix(2.0, &a, 0, Blas2Backend::Auto)
        .unwrap();

    // v viewed as 4x3: v(i, j) += 2 * A(j, i)
    for i in 0..4 {
        for j in 0..3 {
            let want = 1.0 + 2.0 * a.data()[j * 4 + i];
            assert_relative_eq!(v.data()[i * 3 + j], want);
        }
    }
}

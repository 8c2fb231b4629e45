// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gv_array::{Blas2Backend, DeviceMatrix, DeviceVector};

fn bench_gemv(c: &mut Criterion) {
    let a = DeviceMatrix::<f32>::random_uniform(512, 512, -1.0, 1.0, Some(42)).unwrap();
    let x = DeviceVector::<f32>::random_uniform(512, -1.0, 1.0, Some(43)).unwrap();
    let mut y = DeviceVector::<f32>::zeros(512).unwrap();

    c.bench_function("gemv_f32_512_blocked", |b| {
        b.iter(|| {
            a.gemv_into(black_box(&x), &mut y, Blas2Backend::CpuBlocked)
                .unwrap();
        })
    });

    c.bench_function("gemv_f32_512_naive", |b| {
        b.iter(|| {
            a.gemv_into(black_box(&x), &mut y, Blas2Backend::CpuNaive)
                .unwrap();
        })
    });
}

fn bench_axpy(c: &mut Criterion) {
    let v = DeviceVector::<f64>::random_uniform(512 * 256, -1.0, 1.0, Some(44)).unwrap();
    let mut b_mat = DeviceMatrix::<f64>::random_uniform(512, 256, -1.0, 1.0, Some(45)).unwrap();

    c.bench_function("axpy_t_f64_512x256", |bench| {
        bench.iter(|| {
            b_mat
                .axpy_transposed_from_vector(black_box(0.5), &v, 0, Blas2Backend::CpuBlocked)
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_gemv, bench_axpy);
criterion_main!(benches);

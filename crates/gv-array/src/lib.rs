// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Device-resident dense vectors and matrices with BLAS Level-2 kernels.
//!
//! Containers are allocated under integer-addressed device contexts and hand
//! out non-owning strided views for the duration of a single operation. The
//! compute itself runs on the blocked CPU backend, or on WGPU when the `wgpu`
//! feature is enabled and an adapter is present.

pub mod backend;
pub mod context;
pub mod dense;
pub mod element;
pub mod observability;
pub mod ops;

pub use context::{
    context, context_exists, register_context, ContextError, ContextKind, DeviceContext,
    DEFAULT_CONTEXT_ID,
};
pub use dense::{
    ArrayError, DeviceMatrix, DeviceVector, GvResult, Layout, MatrixView, MatrixViewMut,
    VectorView, VectorViewMut,
};
pub use element::{Dtype, Element};
pub use observability::{set_blas2_observer, Blas2Event, Blas2Observer};
pub use ops::Blas2Backend;

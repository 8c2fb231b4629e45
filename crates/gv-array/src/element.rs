// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Element types supported by device arrays and the stable type-code mapping
//! used by the foreign binding surface.

use bytemuck::Pod;
use core::fmt;
use core::ops::{Add, AddAssign, Mul, MulAssign, Sub};
use serde::{Deserialize, Serialize};

/// Runtime tag for the element type of a device array.
///
/// The integer codes are part of the foreign ABI and must never change:
/// host environments hard-code them when constructing and dispatching
/// arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    /// 32-bit signed integer, code 4.
    I32,
    /// 32-bit IEEE-754 float, code 6.
    F32,
    /// 64-bit IEEE-754 float, code 8.
    F64,
}

impl Dtype {
    /// The stable integer code used on the foreign surface.
    pub const fn code(self) -> i32 {
        match self {
            Dtype::I32 => 4,
            Dtype::F32 => 6,
            Dtype::F64 => 8,
        }
    }

    /// Resolves a foreign type code against the closed set of supported
    /// element types. Anything outside {4, 6, 8} is unknown.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            4 => Some(Dtype::I32),
            6 => Some(Dtype::F32),
            8 => Some(Dtype::F64),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Dtype::I32 => "i32",
            Dtype::F32 => "f32",
            Dtype::F64 => "f64",
        }
    }

    /// Size of one element in bytes.
    pub const fn size_of(self) -> usize {
        match self {
            Dtype::I32 => 4,
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scalar types that device arrays can hold.
///
/// The set is closed: exactly `i32`, `f32`, and `f64`. Kernels are generic
/// over this trait and instantiated per type by the runtime dispatch in the
/// binding layer. The `Pod` bound lets buffers cross the accelerator
/// boundary without copies.
pub trait Element:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Pod
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + MulAssign
    + 'static
{
    /// Runtime tag matching this type.
    const DTYPE: Dtype;

    const ZERO: Self;
    const ONE: Self;

    /// Converts a host scalar into this element type. Integer conversion
    /// truncates toward zero, matching host-numeric coercion.
    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;
}

impl Element for i32 {
    const DTYPE: Dtype = Dtype::I32;
    const ZERO: Self = 0;
    const ONE: Self = 1;

    fn from_f64(value: f64) -> Self {
        value as i32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f32 {
    const DTYPE: Dtype = Dtype::F32;
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f64 {
    const DTYPE: Dtype = Dtype::F64;
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Dtype::I32.code(), 4);
        assert_eq!(Dtype::F32.code(), 6);
        assert_eq!(Dtype::F64.code(), 8);
        assert_eq!(Dtype::I32.size_of(), std::mem::size_of::<i32>());
        assert_eq!(Dtype::F32.size_of(), std::mem::size_of::<f32>());
        assert_eq!(Dtype::F64.size_of(), std::mem::size_of::<f64>());
    }

    #[test]
    fn from_code_rejects_everything_else() {
        for code in [i32::MIN, -1, 0, 1, 2, 3, 5, 7, 9, 42, i32::MAX] {
            assert_eq!(Dtype::from_code(code), None, "code {code} must be unknown");
        }
        assert_eq!(Dtype::from_code(4), Some(Dtype::I32));
        assert_eq!(Dtype::from_code(6), Some(Dtype::F32));
        assert_eq!(Dtype::from_code(8), Some(Dtype::F64));
    }

    #[test]
    fn integer_alpha_truncates_toward_zero() {
        assert_eq!(<i32 as Element>::from_f64(2.9), 2);
        assert_eq!(<i32 as Element>::from_f64(-2.9), -2);
    }
}

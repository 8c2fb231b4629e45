// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Minimal C-ABI shims that surface gridvec device arrays and their BLAS
//! Level-2 operations to host statistical-computing environments. The host
//! owns every handle created here and addresses element types through the
//! stable integer codes {4: i32, 6: f32, 8: f64}; each operation resolves the
//! code at run time and instantiates its generic body at the matching type.
//! Anything outside the closed code set fails before any buffer is touched.

use gv_array::{
    register_context, ArrayError, Blas2Backend, ContextKind, DeviceMatrix, DeviceVector, Dtype,
    Element,
};
use std::cell::RefCell;
use std::ffi::{c_char, c_int, CString};
use std::ptr;
use std::slice;

type FfiResult<T> = Result<T, ()>;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: impl Into<String>) {
    let owned = message.into();
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(
            CString::new(owned.clone())
                .unwrap_or_else(|_| CString::new("<error message contained null byte>").unwrap()),
        );
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = None;
    });
}

fn ok<T>(value: T) -> FfiResult<T> {
    clear_last_error();
    Ok(value)
}

fn err<T>(message: impl Into<String>) -> FfiResult<T> {
    set_last_error(message);
    Err(())
}

/// Opaque, host-owned handle wrapping a typed device matrix or vector.
///
/// Created by the constructors below via `Box::into_raw` and released only
/// through [`gridvec_array_free`]; the operations borrow the referent for the
/// duration of one call and never take ownership.
pub struct GvArray {
    inner: ArrayInner,
}

enum ArrayInner {
    MatrixI32(DeviceMatrix<i32>),
    MatrixF32(DeviceMatrix<f32>),
    MatrixF64(DeviceMatrix<f64>),
    VectorI32(DeviceVector<i32>),
    VectorF32(DeviceVector<f32>),
    VectorF64(DeviceVector<f64>),
}

impl GvArray {
    fn dtype(&self) -> Dtype {
        match &self.inner {
            ArrayInner::MatrixI32(_) | ArrayInner::VectorI32(_) => Dtype::I32,
            ArrayInner::MatrixF32(_) | ArrayInner::VectorF32(_) => Dtype::F32,
            ArrayInner::MatrixF64(_) | ArrayInner::VectorF64(_) => Dtype::F64,
        }
    }

    fn is_vector(&self) -> bool {
        matches!(
            &self.inner,
            ArrayInner::VectorI32(_) | ArrayInner::VectorF32(_) | ArrayInner::VectorF64(_)
        )
    }

    fn context_id(&self) -> u32 {
        match &self.inner {
            ArrayInner::MatrixI32(m) => m.context_id(),
            ArrayInner::MatrixF32(m) => m.context_id(),
            ArrayInner::MatrixF64(m) => m.context_id(),
            ArrayInner::VectorI32(v) => v.context_id(),
            ArrayInner::VectorF32(v) => v.context_id(),
            ArrayInner::VectorF64(v) => v.context_id(),
        }
    }

    fn describe(&self) -> String {
        let kind = if self.is_vector() {
            "device vector"
        } else {
            "device matrix"
        };
        format!("{} {kind} handle", self.dtype().label())
    }
}

/// Type-checked unwrapping of opaque handles, one impl per supported
/// element type. A handle whose element type or kind does not match the
/// dispatched operation yields a descriptive error instead of a blind
/// reinterpretation.
trait TypedAccess: Element {
    fn as_matrix(array: &GvArray) -> FfiResult<&DeviceMatrix<Self>>;
    fn as_matrix_mut(array: &mut GvArray) -> FfiResult<&mut DeviceMatrix<Self>>;
    fn as_vector(array: &GvArray) -> FfiResult<&DeviceVector<Self>>;
    fn as_vector_mut(array: &mut GvArray) -> FfiResult<&mut DeviceVector<Self>>;
    fn data_of(array: &GvArray) -> FfiResult<&[Self]>;
    fn wrap_matrix(matrix: DeviceMatrix<Self>) -> ArrayInner;
    fn wrap_vector(vector: DeviceVector<Self>) -> ArrayInner;
}

impl TypedAccess for i32 {
    fn as_matrix(array: &GvArray) -> FfiResult<&DeviceMatrix<Self>> {
        match &array.inner {
            ArrayInner::MatrixI32(matrix) => ok(matrix),
            _ => err(format!(
                "expected i32 device matrix handle, found {}",
                array.describe()
            )),
        }
    }

    fn as_matrix_mut(array: &mut GvArray) -> FfiResult<&mut DeviceMatrix<Self>> {
        let description = array.describe();
        match &mut array.inner {
            ArrayInner::MatrixI32(matrix) => ok(matrix),
            _ => err(format!(
                "expected i32 device matrix handle, found {description}"
            )),
        }
    }

    fn as_vector(array: &GvArray) -> FfiResult<&DeviceVector<Self>> {
        match &array.inner {
            ArrayInner::VectorI32(vector) => ok(vector),
            _ => err(format!(
                "expected i32 device vector handle, found {}",
                array.describe()
            )),
        }
    }

    fn as_vector_mut(array: &mut GvArray) -> FfiResult<&mut DeviceVector<Self>> {
        let description = array.describe();
        match &mut array.inner {
            ArrayInner::VectorI32(vector) => ok(vector),
            _ => err(format!(
                "expected i32 device vector handle, found {description}"
            )),
        }
    }

    fn data_of(array: &GvArray) -> FfiResult<&[Self]> {
        match &array.inner {
            ArrayInner::MatrixI32(matrix) => ok(matrix.data()),
            ArrayInner::VectorI32(vector) => ok(vector.data()),
            _ => err(format!(
                "expected i32 device array handle, found {}",
                array.describe()
            )),
        }
    }

    fn wrap_matrix(matrix: DeviceMatrix<Self>) -> ArrayInner {
        ArrayInner::MatrixI32(matrix)
    }

    fn wrap_vector(vector: DeviceVector<Self>) -> ArrayInner {
        ArrayInner::VectorI32(vector)
    }
}

impl TypedAccess for f32 {
    fn as_matrix(array: &GvArray) -> FfiResult<&DeviceMatrix<Self>> {
        match &array.inner {
            ArrayInner::MatrixF32(matrix) => ok(matrix),
            _ => err(format!(
                "expected f32 device matrix handle, found {}",
                array.describe()
            )),
        }
    }

    fn as_matrix_mut(array: &mut GvArray) -> FfiResult<&mut DeviceMatrix<Self>> {
        let description = array.describe();
        match &mut array.inner {
            ArrayInner::MatrixF32(matrix) => ok(matrix),
            _ => err(format!(
                "expected f32 device matrix handle, found {description}"
            )),
        }
    }

    fn as_vector(array: &GvArray) -> FfiResult<&DeviceVector<Self>> {
        match &array.inner {
            ArrayInner::VectorF32(vector) => ok(vector),
            _ => err(format!(
                "expected f32 device vector handle, found {}",
                array.describe()
            )),
        }
    }

    fn as_vector_mut(array: &mut GvArray) -> FfiResult<&mut DeviceVector<Self>> {
        let description = array.describe();
        match &mut array.inner {
            ArrayInner::VectorF32(vector) => ok(vector),
            _ => err(format!(
                "expected f32 device vector handle, found {description}"
            )),
        }
    }

    fn data_of(array: &GvArray) -> FfiResult<&[Self]> {
        match &array.inner {
            ArrayInner::MatrixF32(matrix) => ok(matrix.data()),
            ArrayInner::VectorF32(vector) => ok(vector.data()),
            _ => err(format!(
                "expected f32 device array handle, found {}",
                array.describe()
            )),
        }
    }

    fn wrap_matrix(matrix: DeviceMatrix<Self>) -> ArrayInner {
        ArrayInner::MatrixF32(matrix)
    }

    fn wrap_vector(vector: DeviceVector<Self>) -> ArrayInner {
        ArrayInner::VectorF32(vector)
    }
}

impl TypedAccess for f64 {
    fn as_matrix(array: &GvArray) -> FfiResult<&DeviceMatrix<Self>> {
        match &array.inner {
            ArrayInner::MatrixF64(matrix) => ok(matrix),
            _ => err(format!(
                "expected f64 device matrix handle, found {}",
                array.describe()
            )),
        }
    }

    fn as_matrix_mut(array: &mut GvArray) -> FfiResult<&mut DeviceMatrix<Self>> {
        let description = array.describe();
        match &mut array.inner {
            ArrayInner::MatrixF64(matrix) => ok(matrix),
            _ => err(format!(
                "expected f64 device matrix handle, found {description}"
            )),
        }
    }

    fn as_vector(array: &GvArray) -> FfiResult<&DeviceVector<Self>> {
        match &array.inner {
            ArrayInner::VectorF64(vector) => ok(vector),
            _ => err(format!(
                "expected f64 device vector handle, found {}",
                array.describe()
            )),
        }
    }

    fn as_vector_mut(array: &mut GvArray) -> FfiResult<&mut DeviceVector<Self>> {
        let description = array.describe();
        match &mut array.inner {
            ArrayInner::VectorF64(vector) => ok(vector),
            _ => err(format!(
                "expected f64 device vector handle, found {description}"
            )),
        }
    }

    fn data_of(array: &GvArray) -> FfiResult<&[Self]> {
        match &array.inner {
            ArrayInner::MatrixF64(matrix) => ok(matrix.data()),
            ArrayInner::VectorF64(vector) => ok(vector.data()),
            _ => err(format!(
                "expected f64 device array handle, found {}",
                array.describe()
            )),
        }
    }

    fn wrap_matrix(matrix: DeviceMatrix<Self>) -> ArrayInner {
        ArrayInner::MatrixF64(matrix)
    }

    fn wrap_vector(vector: DeviceVector<Self>) -> ArrayInner {
        ArrayInner::VectorF64(vector)
    }
}

fn unsupported_dtype(code: c_int) -> ArrayError {
    ArrayError::UnsupportedDtype {
        code,
        object: "device matrix",
    }
}

fn array_from_result(result: Result<ArrayInner, ArrayError>) -> *mut GvArray {
    match result {
        Ok(inner) => {
            clear_last_error();
            Box::into_raw(Box::new(GvArray { inner }))
        }
        Err(error) => {
            set_last_error(error.to_string());
            ptr::null_mut()
        }
    }
}

fn require_non_null<T>(ptr: *const T, label: &str) -> FfiResult<*const T> {
    if ptr.is_null() {
        return err(format!("{label} pointer was null"));
    }
    ok(ptr)
}

fn require_non_null_mut<T>(ptr: *mut T, label: &str) -> FfiResult<*mut T> {
    if ptr.is_null() {
        return err(format!("{label} pointer was null"));
    }
    clear_last_error();
    Ok(ptr)
}

/// Write the gridvec semantic version into the provided buffer.
///
/// Returns the number of bytes required to represent the string (not
/// counting the trailing null terminator). If the provided buffer has enough
/// capacity (`capacity >= len + 1`), the string is copied and a null
/// terminator is appended.
#[no_mangle]
pub extern "C" fn gridvec_version(buffer: *mut c_char, capacity: usize) -> usize {
    let version = env!("CARGO_PKG_VERSION");
    let bytes = version.as_bytes();
    if capacity > 0 && !buffer.is_null() {
        let max_copy = capacity.saturating_sub(1);
        let to_copy = bytes.len().min(max_copy);
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, buffer, to_copy);
            *buffer.add(to_copy) = 0;
        }
    }
    bytes.len()
}

/// Returns the length of the last error message (in bytes, excluding the
/// trailing null terminator).
#[no_mangle]
pub extern "C" fn gridvec_last_error_length() -> usize {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|msg| msg.as_bytes().len())
            .unwrap_or(0)
    })
}

/// Copies the last error message into the provided buffer and returns the
/// number of bytes copied (excluding the null terminator). If no error is
/// present the function returns `0` and the buffer is left untouched.
#[no_mangle]
pub extern "C" fn gridvec_last_error_message(buffer: *mut c_char, capacity: usize) -> usize {
    if buffer.is_null() || capacity == 0 {
        return 0;
    }
    LAST_ERROR.with(|slot| {
        if let Some(message) = slot.borrow().as_ref() {
            let bytes = message.as_bytes();
            let max_copy = capacity.saturating_sub(1);
            let to_copy = bytes.len().min(max_copy);
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, buffer, to_copy);
                *buffer.add(to_copy) = 0;
            }
            to_copy
        } else {
            0
        }
    })
}

/// Clears the last error so subsequent calls observe an empty state.
#[no_mangle]
pub extern "C" fn gridvec_clear_last_error() {
    clear_last_error();
}

/// Registers a CPU compute context under a host-assigned id. Context 0 is
/// always present; additional ids must be unique.
#[no_mangle]
pub extern "C" fn gridvec_context_register_cpu(ctx_id: u32) -> bool {
    match register_context(ctx_id, ContextKind::Cpu) {
        Ok(_) => {
            clear_last_error();
            true
        }
        Err(error) => {
            set_last_error(error.to_string());
            false
        }
    }
}

/// Returns true when a context is registered under `ctx_id`.
#[no_mangle]
pub extern "C" fn gridvec_context_exists(ctx_id: u32) -> bool {
    gv_array::context_exists(ctx_id)
}

/// Constructs a zero-filled device matrix of the element type selected by
/// `dtype_code`. Returns `NULL` on failure.
#[no_mangle]
pub extern "C" fn gridvec_matrix_zeros(
    rows: usize,
    cols: usize,
    dtype_code: c_int,
    ctx_id: u32,
) -> *mut GvArray {
    let result = match Dtype::from_code(dtype_code) {
        Some(Dtype::I32) => {
            DeviceMatrix::<i32>::zeros_in(rows, cols, ctx_id).map(ArrayInner::MatrixI32)
        }
        Some(Dtype::F32) => {
            DeviceMatrix::<f32>::zeros_in(rows, cols, ctx_id).map(ArrayInner::MatrixF32)
        }
        Some(Dtype::F64) => {
            DeviceMatrix::<f64>::zeros_in(rows, cols, ctx_id).map(ArrayInner::MatrixF64)
        }
        None => Err(unsupported_dtype(dtype_code)),
    };
    array_from_result(result)
}

/// Constructs a zero-filled device vector of the element type selected by
/// `dtype_code`. Returns `NULL` on failure.
#[no_mangle]
pub extern "C" fn gridvec_vector_zeros(len: usize, dtype_code: c_int, ctx_id: u32) -> *mut GvArray {
    let result = match Dtype::from_code(dtype_code) {
        Some(Dtype::I32) => DeviceVector::<i32>::zeros_in(len, ctx_id).map(ArrayInner::VectorI32),
        Some(Dtype::F32) => DeviceVector::<f32>::zeros_in(len, ctx_id).map(ArrayInner::VectorF32),
        Some(Dtype::F64) => DeviceVector::<f64>::zeros_in(len, ctx_id).map(ArrayInner::VectorF64),
        None => Err(ArrayError::UnsupportedDtype {
            code: dtype_code,
            object: "device vector",
        }),
    };
    array_from_result(result)
}

unsafe fn matrix_from_dense<T: TypedAccess>(
    rows: usize,
    cols: usize,
    data: *const T,
    len: usize,
    ctx_id: u32,
    context_label: &str,
) -> *mut GvArray {
    if data.is_null() {
        set_last_error(format!("{context_label} received null data pointer"));
        return ptr::null_mut();
    }
    let required = rows.saturating_mul(cols);
    if required != len {
        set_last_error(format!(
            "{context_label} expected {required} elements but received {len}"
        ));
        return ptr::null_mut();
    }
    let values = slice::from_raw_parts(data, len).to_vec();
    array_from_result(DeviceMatrix::from_vec_in(rows, cols, values, ctx_id).map(T::wrap_matrix))
}

unsafe fn vector_from_dense<T: TypedAccess>(
    data: *const T,
    len: usize,
    ctx_id: u32,
    context_label: &str,
) -> *mut GvArray {
    if data.is_null() {
        set_last_error(format!("{context_label} received null data pointer"));
        return ptr::null_mut();
    }
    let values = slice::from_raw_parts(data, len).to_vec();
    array_from_result(DeviceVector::from_vec_in(values, ctx_id).map(T::wrap_vector))
}

/// Constructs an i32 device matrix from a dense row-major buffer. Returns
/// `NULL` on failure.
#[no_mangle]
pub unsafe extern "C" fn gridvec_matrix_from_dense_i32(
    rows: usize,
    cols: usize,
    data: *const i32,
    len: usize,
    ctx_id: u32,
) -> *mut GvArray {
    matrix_from_dense(rows, cols, data, len, ctx_id, "matrix_from_dense_i32")
}

/// Constructs an f32 device matrix from a dense row-major buffer. Returns
/// `NULL` on failure.
#[no_mangle]
pub unsafe extern "C" fn gridvec_matrix_from_dense_f32(
    rows: usize,
    cols: usize,
    data: *const f32,
    len: usize,
    ctx_id: u32,
) -> *mut GvArray {
    matrix_from_dense(rows, cols, data, len, ctx_id, "matrix_from_dense_f32")
}

/// Constructs an f64 device matrix from a dense row-major buffer. Returns
/// `NULL` on failure.
#[no_mangle]
pub unsafe extern "C" fn gridvec_matrix_from_dense_f64(
    rows: usize,
    cols: usize,
    data: *const f64,
    len: usize,
    ctx_id: u32,
) -> *mut GvArray {
    matrix_from_dense(rows, cols, data, len, ctx_id, "matrix_from_dense_f64")
}

/// Constructs an i32 device vector from a dense buffer. Returns `NULL` on
/// failure.
#[no_mangle]
pub unsafe extern "C" fn gridvec_vector_from_dense_i32(
    data: *const i32,
    len: usize,
    ctx_id: u32,
) -> *mut GvArray {
    vector_from_dense(data, len, ctx_id, "vector_from_dense_i32")
}

/// Constructs an f32 device vector from a dense buffer. Returns `NULL` on
/// failure.
#[no_mangle]
pub unsafe extern "C" fn gridvec_vector_from_dense_f32(
    data: *const f32,
    len: usize,
    ctx_id: u32,
) -> *mut GvArray {
    vector_from_dense(data, len, ctx_id, "vector_from_dense_f32")
}

/// Constructs an f64 device vector from a dense buffer. Returns `NULL` on
/// failure.
#[no_mangle]
pub unsafe extern "C" fn gridvec_vector_from_dense_f64(
    data: *const f64,
    len: usize,
    ctx_id: u32,
) -> *mut GvArray {
    vector_from_dense(data, len, ctx_id, "vector_from_dense_f64")
}

/// Releases a handle previously allocated by this library.
#[no_mangle]
pub extern "C" fn gridvec_array_free(handle: *mut GvArray) {
    if handle.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle));
    }
}

fn with_array<'a, T>(
    handle: *const GvArray,
    f: impl FnOnce(&'a GvArray) -> FfiResult<T>,
) -> FfiResult<T> {
    let handle = require_non_null(handle, "array handle")?;
    // SAFETY: pointer validated above; the host keeps the handle alive for
    // the duration of the call.
    let array = unsafe { &*handle };
    f(array)
}

/// Returns the element type code of the handle ({4, 6, 8}), or `0` on
/// failure.
#[no_mangle]
pub extern "C" fn gridvec_array_dtype(handle: *const GvArray) -> c_int {
    with_array(handle, |array| ok(array.dtype().code())).unwrap_or(0)
}

/// Returns true when the handle wraps a vector (as opposed to a matrix).
#[no_mangle]
pub extern "C" fn gridvec_array_is_vector(handle: *const GvArray) -> bool {
    with_array(handle, |array| ok(array.is_vector())).unwrap_or(false)
}

/// Returns the id of the context the handle's buffer was allocated under,
/// or `u32::MAX` on failure.
#[no_mangle]
pub extern "C" fn gridvec_array_context(handle: *const GvArray) -> u32 {
    with_array(handle, |array| ok(array.context_id())).unwrap_or(u32::MAX)
}

/// Retrieves a matrix handle's shape and writes it into the output pointers.
#[no_mangle]
pub extern "C" fn gridvec_matrix_shape(
    handle: *const GvArray,
    rows_out: *mut usize,
    cols_out: *mut usize,
) -> bool {
    let result = with_array(handle, |array| {
        let rows_ptr = require_non_null_mut(rows_out, "rows_out")?;
        let cols_ptr = require_non_null_mut(cols_out, "cols_out")?;
        let (rows, cols) = match &array.inner {
            ArrayInner::MatrixI32(m) => m.shape(),
            ArrayInner::MatrixF32(m) => m.shape(),
            ArrayInner::MatrixF64(m) => m.shape(),
            _ => {
                return err(format!(
                    "expected device matrix handle, found {}",
                    array.describe()
                ))
            }
        };
        unsafe {
            *rows_ptr = rows;
            *cols_ptr = cols;
        }
        ok(())
    });
    result.is_ok()
}

/// Returns the length of a vector handle, or `0` on failure.
#[no_mangle]
pub extern "C" fn gridvec_vector_length(handle: *const GvArray) -> usize {
    with_array(handle, |array| match &array.inner {
        ArrayInner::VectorI32(v) => ok(v.len()),
        ArrayInner::VectorF32(v) => ok(v.len()),
        ArrayInner::VectorF64(v) => ok(v.len()),
        _ => err(format!(
            "expected device vector handle, found {}",
            array.describe()
        )),
    })
    .unwrap_or(0)
}

unsafe fn copy_data_typed<T: TypedAccess>(
    handle: *const GvArray,
    out: *mut T,
    len: usize,
) -> FfiResult<()> {
    let handle = require_non_null(handle, "array handle")?;
    let out = require_non_null_mut(out, "output buffer")?;
    // SAFETY: pointers validated above.
    let array = &*handle;
    let data = T::data_of(array)?;
    if data.len() != len {
        return err(format!(
            "copy_data expected a buffer of {} elements but received {len}",
            data.len()
        ));
    }
    ptr::copy_nonoverlapping(data.as_ptr(), out, data.len());
    ok(())
}

/// Copies an i32 handle's elements into `out`, which must hold exactly the
/// handle's element count.
#[no_mangle]
pub unsafe extern "C" fn gridvec_array_copy_data_i32(
    handle: *const GvArray,
    out: *mut i32,
    len: usize,
) -> bool {
    copy_data_typed(handle, out, len).is_ok()
}

/// Copies an f32 handle's elements into `out`, which must hold exactly the
/// handle's element count.
#[no_mangle]
pub unsafe extern "C" fn gridvec_array_copy_data_f32(
    handle: *const GvArray,
    out: *mut f32,
    len: usize,
) -> bool {
    copy_data_typed(handle, out, len).is_ok()
}

/// Copies an f64 handle's elements into `out`, which must hold exactly the
/// handle's element count.
#[no_mangle]
pub unsafe extern "C" fn gridvec_array_copy_data_f64(
    handle: *const GvArray,
    out: *mut f64,
    len: usize,
) -> bool {
    copy_data_typed(handle, out, len).is_ok()
}

fn gemv_body<T: TypedAccess>(a: &GvArray, x: &GvArray, y: &mut GvArray) -> FfiResult<()> {
    let a = T::as_matrix(a)?;
    let x = T::as_vector(x)?;
    let y = T::as_vector_mut(y)?;
    match a.gemv_into(x, y, Blas2Backend::from_env()) {
        Ok(()) => ok(()),
        Err(error) => err(error.to_string()),
    }
}

fn gemv_dispatch(
    a: *const GvArray,
    x: *const GvArray,
    y: *mut GvArray,
    dtype_code: c_int,
) -> FfiResult<()> {
    let a = require_non_null(a, "matrix operand")?;
    let x = require_non_null(x, "input vector")?;
    let y = require_non_null_mut(y, "output vector")?;
    if a as usize == y as usize || x as usize == y as usize {
        return err("output handle must not alias an input handle");
    }
    // SAFETY: pointers validated non-null and distinct above.
    let (a, x, y) = unsafe { (&*a, &*x, &mut *y) };
    match dtype_code {
        4 => gemv_body::<i32>(a, x, y),
        6 => gemv_body::<f32>(a, x, y),
        8 => gemv_body::<f64>(a, x, y),
        code => err(unsupported_dtype(code).to_string()),
    }
}

/// Computes `C = A * B` where `A` is a matrix handle and `B`/`C` are vector
/// handles, all of the element type selected by `dtype_code`. `C` is
/// overwritten in place; nothing is written on failure.
#[no_mangle]
pub extern "C" fn gridvec_matrix_gemv(
    a: *const GvArray,
    b: *const GvArray,
    c: *mut GvArray,
    dtype_code: c_int,
) -> bool {
    gemv_dispatch(a, b, c, dtype_code).is_ok()
}

fn gevm_body<T: TypedAccess>(x: &GvArray, b: &GvArray, y: &mut GvArray) -> FfiResult<()> {
    let x = T::as_vector(x)?;
    let b = T::as_matrix(b)?;
    let y = T::as_vector_mut(y)?;
    match b.gevm_into(x, y, Blas2Backend::from_env()) {
        Ok(()) => ok(()),
        Err(error) => err(error.to_string()),
    }
}

fn gevm_dispatch(
    a: *const GvArray,
    b: *const GvArray,
    c: *mut GvArray,
    dtype_code: c_int,
) -> FfiResult<()> {
    let a = require_non_null(a, "input vector")?;
    let b = require_non_null(b, "matrix operand")?;
    let c = require_non_null_mut(c, "output vector")?;
    if a as usize == c as usize || b as usize == c as usize {
        return err("output handle must not alias an input handle");
    }
    // SAFETY: pointers validated non-null and distinct above.
    let (a, b, c) = unsafe { (&*a, &*b, &mut *c) };
    match dtype_code {
        4 => gevm_body::<i32>(a, b, c),
        6 => gevm_body::<f32>(a, b, c),
        8 => gevm_body::<f64>(a, b, c),
        code => err(unsupported_dtype(code).to_string()),
    }
}

/// Computes `C = B^T * A` where `A` is a vector handle, `B` is a matrix
/// handle and `C` is a vector handle; the transpose is applied to the matrix
/// operand before multiplication. `C` is overwritten in place.
#[no_mangle]
pub extern "C" fn gridvec_matrix_gevm(
    a: *const GvArray,
    b: *const GvArray,
    c: *mut GvArray,
    dtype_code: c_int,
) -> bool {
    gevm_dispatch(a, b, c, dtype_code).is_ok()
}

fn axpy_body<T: TypedAccess>(
    alpha: f64,
    a: &GvArray,
    a_is_vector: bool,
    b: &mut GvArray,
    b_is_vector: bool,
    ctx_id: u32,
) -> FfiResult<()> {
    let alpha = T::from_f64(alpha);
    let backend = Blas2Backend::from_env();
    if a_is_vector {
        let a = T::as_vector(a)?;
        let b = T::as_matrix_mut(b)?;
        match b.axpy_transposed_from_vector(alpha, a, ctx_id, backend) {
            Ok(()) => ok(()),
            Err(error) => err(error.to_string()),
        }
    } else if b_is_vector {
        let a = T::as_matrix(a)?;
        let b = T::as_vector_mut(b)?;
        match b.axpy_transposed_from_matrix(alpha, a, ctx_id, backend) {
            Ok(()) => ok(()),
            Err(error) => err(error.to_string()),
        }
    } else {
        err(ArrayError::OperandNotVector.to_string())
    }
}

fn axpy_dispatch(
    alpha: f64,
    a: *const GvArray,
    a_is_vector: bool,
    b: *mut GvArray,
    b_is_vector: bool,
    dtype_code: c_int,
    ctx_id: c_int,
) -> FfiResult<()> {
    let a = require_non_null(a, "source operand")?;
    let b = require_non_null_mut(b, "destination operand")?;
    if a as usize == b as usize {
        return err("destination handle must not alias the source handle");
    }
    let Ok(ctx_id) = u32::try_from(ctx_id) else {
        return err(format!("context id {ctx_id} is out of range"));
    };
    // SAFETY: pointers validated non-null and distinct above.
    let (a, b) = unsafe { (&*a, &mut *b) };
    match dtype_code {
        4 => axpy_body::<i32>(alpha, a, a_is_vector, b, b_is_vector, ctx_id),
        6 => axpy_body::<f32>(alpha, a, a_is_vector, b, b_is_vector, ctx_id),
        8 => axpy_body::<f64>(alpha, a, a_is_vector, b, b_is_vector, ctx_id),
        code => err(unsupported_dtype(code).to_string()),
    }
}

/// Computes `B += alpha * transpose(reshape(A))` where exactly one of `A`,
/// `B` is a vector handle and the other a matrix handle. The vector operand
/// is reinterpreted in place, without copying, as a row-major matrix with the
/// other operand's dimensions transposed. `ctx_id` must select the context
/// both buffers were allocated under. Fails before touching any buffer when
/// the type code is unknown or when neither operand is flagged as a vector.
#[no_mangle]
pub extern "C" fn gridvec_matvec_axpy(
    alpha: f64,
    a: *const GvArray,
    a_is_vector: bool,
    b: *mut GvArray,
    b_is_vector: bool,
    dtype_code: c_int,
    ctx_id: c_int,
) -> bool {
    axpy_dispatch(alpha, a, a_is_vector, b, b_is_vector, dtype_code, ctx_id).is_ok()
}

// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat C ABI over [`Session`].
//!
//! ```c
//! ShaderCrossSession *session = shcross_init();
//! char *glsl = shcross_compile(session, source, "quad.frag", "#define FOO 1\n", 1);
//! if (glsl) {
//!     upload(glsl);
//!     shcross_free_result(glsl);
//! }
//! shcross_shutdown(session);
//! ```
//!
//! Failures are reported as null results; diagnostics go to the installed `log` sink.
//! Every string returned by [`shcross_compile`] must be released exactly once with
//! [`shcross_free_result`].

use std::collections::BTreeSet;
use std::ffi::{c_char, c_int, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::{Mutex, PoisonError};

use crate::{Session, Stage};

/// Opaque session handle handed out by [`shcross_init`].
pub struct ShaderCrossSession {
    session: Session,
}

/// Results handed out and not yet released, by address.
static OUTSTANDING: Mutex<BTreeSet<usize>> = Mutex::new(BTreeSet::new());

fn outstanding() -> std::sync::MutexGuard<'static, BTreeSet<usize>> {
    OUTSTANDING.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a session. Returns null if the front end cannot be initialized.
#[no_mangle]
pub extern "C" fn shcross_init() -> *mut ShaderCrossSession {
    let session = catch_unwind(Session::new);
    match session {
        Ok(Ok(session)) => Box::into_raw(Box::new(ShaderCrossSession { session })),
        Ok(Err(err)) => {
            log::error!("{err}");
            ptr::null_mut()
        }
        Err(_) => {
            log::error!("panic while initializing the shader compiler");
            ptr::null_mut()
        }
    }
}

/// Compile one stage to portable GLSL.
///
/// `stage` is 0 for vertex, 1 for fragment and 2 for geometry. Null `name` and
/// `defines` are treated as empty. Returns null on any failure.
///
/// # Safety
///
/// `session` must be null or a live pointer from [`shcross_init`]. `source`, and `name`
/// and `defines` when non-null, must point to NUL-terminated strings that stay valid for
/// the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn shcross_compile(
    session: *const ShaderCrossSession,
    source: *const c_char,
    name: *const c_char,
    defines: *const c_char,
    stage: c_int,
) -> *mut c_char {
    if session.is_null() || source.is_null() {
        log::error!("shcross_compile called with a null session or source");
        return ptr::null_mut();
    }
    // SAFETY: non-null and live per the caller contract.
    let session = unsafe { &(*session).session };
    let Ok(stage) = Stage::try_from(stage) else {
        log::error!("unknown shader stage {stage}");
        return ptr::null_mut();
    };
    // SAFETY: NUL-terminated per the caller contract.
    let (source, name, defines) =
        unsafe { (str_arg(source), optional_str_arg(name), optional_str_arg(defines)) };
    let (Some(source), Some(name), Some(defines)) = (source, name, defines) else {
        log::error!("{stage} shader: arguments are not valid UTF-8");
        return ptr::null_mut();
    };

    let compiled = catch_unwind(AssertUnwindSafe(|| {
        session.compile_source(source, name, defines, stage)
    }));
    let text = match compiled {
        Ok(Some(text)) => text,
        Ok(None) => return ptr::null_mut(),
        Err(_) => {
            log::error!("{stage} shader: panic during compilation");
            return ptr::null_mut();
        }
    };
    match CString::new(text) {
        Ok(text) => {
            let raw = text.into_raw();
            outstanding().insert(raw as usize);
            raw
        }
        Err(_) => {
            log::error!("{stage} shader: output contains a NUL byte");
            ptr::null_mut()
        }
    }
}

/// Release a string returned by [`shcross_compile`]. Null is a no-op.
///
/// Pointers that were not returned by [`shcross_compile`], or were already released,
/// are logged and left alone.
///
/// # Safety
///
/// `result` must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn shcross_free_result(result: *mut c_char) {
    if result.is_null() {
        return;
    }
    if !outstanding().remove(&(result as usize)) {
        log::error!("shcross_free_result: {result:p} is not an outstanding result");
        return;
    }
    // SAFETY: the pointer came from `CString::into_raw` and was outstanding until now.
    drop(unsafe { CString::from_raw(result) });
}

/// Number of results handed out by [`shcross_compile`] and not yet released.
#[no_mangle]
pub extern "C" fn shcross_outstanding_results() -> usize {
    outstanding().len()
}

/// Destroy a session. Null is a no-op.
///
/// # Safety
///
/// `session` must be null or a pointer from [`shcross_init`] that has not been shut
/// down, and no other call may be using it.
#[no_mangle]
pub unsafe extern "C" fn shcross_shutdown(session: *mut ShaderCrossSession) {
    if session.is_null() {
        return;
    }
    // SAFETY: ownership returns to Rust exactly once per the caller contract.
    let session = unsafe { Box::from_raw(session) };
    if catch_unwind(AssertUnwindSafe(|| session.session.shutdown())).is_err() {
        log::error!("panic while shutting down the shader compiler");
    }
}

unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    // SAFETY: forwarded from the caller.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

unsafe fn optional_str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        Some("")
    } else {
        // SAFETY: forwarded from the caller.
        unsafe { str_arg(ptr) }
    }
}

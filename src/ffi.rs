//! C ABI exports
//!
//! Plain C-compatible entry points so the builder can be driven from a
//! foreign runtime (e.g. Ruby via Fiddle). Every signal crosses the boundary
//! as a `u64` lane mask.

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;
use std::slice;

use crate::builder::{BuilderConfig, CarryVectorBuilder};
use crate::netlist::Netlist;
use crate::term::{term_count, MAX_WIDTH};

// ============================================================================
// Context
// ============================================================================

/// Opaque context passed to all FFI functions
pub struct CarryExpandContext {
    pub builder: CarryVectorBuilder,
}

unsafe fn write_error(error_out: *mut *mut c_char, msg: String) {
    if !error_out.is_null() {
        *error_out = CString::new(msg).unwrap_or_default().into_raw();
    }
}

unsafe fn into_context(
    builder: Result<CarryVectorBuilder, crate::error::ConfigError>,
    error_out: *mut *mut c_char,
) -> *mut CarryExpandContext {
    match builder {
        Ok(builder) => Box::into_raw(Box::new(CarryExpandContext { builder })),
        Err(e) => {
            write_error(error_out, e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create a builder for operand width `width`.
/// Returns null on error, error message written to error_out if provided
#[no_mangle]
pub unsafe extern "C" fn carry_expand_create(
    width: c_uint,
    parallel: c_int,
    error_out: *mut *mut c_char,
) -> *mut CarryExpandContext {
    let config = BuilderConfig {
        width: width as usize,
        parallel: parallel != 0,
    };
    into_context(CarryVectorBuilder::new(config), error_out)
}

/// Create a builder from a JSON config (`{"width": N, "parallel": bool}`)
#[no_mangle]
pub unsafe extern "C" fn carry_expand_create_json(
    json: *const c_char,
    json_len: usize,
    error_out: *mut *mut c_char,
) -> *mut CarryExpandContext {
    if json.is_null() {
        write_error(error_out, "null config JSON".to_string());
        return ptr::null_mut();
    }
    let json_slice = slice::from_raw_parts(json as *const u8, json_len);
    let json_str = match std::str::from_utf8(json_slice) {
        Ok(s) => s,
        Err(e) => {
            write_error(error_out, format!("Invalid UTF-8 in JSON: {}", e));
            return ptr::null_mut();
        }
    };

    into_context(CarryVectorBuilder::from_json(json_str), error_out)
}

#[no_mangle]
pub unsafe extern "C" fn carry_expand_destroy(ctx: *mut CarryExpandContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

/// Free an error string returned by carry_expand_create*
#[no_mangle]
pub unsafe extern "C" fn carry_expand_free_error(error: *mut c_char) {
    if !error.is_null() {
        drop(CString::from_raw(error));
    }
}

/// Free a string returned by carry_expand functions
#[no_mangle]
pub unsafe extern "C" fn carry_expand_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Queries
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn carry_expand_width(ctx: *const CarryExpandContext) -> c_uint {
    if ctx.is_null() {
        return 0;
    }
    (*ctx).builder.width() as c_uint
}

/// Product terms in the width-`width` expansion, 0 past the supported maximum
#[no_mangle]
pub extern "C" fn carry_expand_term_count(width: c_uint) -> u64 {
    let width = width as usize;
    if width > MAX_WIDTH {
        0
    } else {
        term_count(width)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Compute carries over lane masks.
///
/// `a` and `b` hold `len` masks and `len` must equal the builder width.
/// `carry_out` receives `len + 1` masks, `generate_out` receives `len`.
/// Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn carry_expand_compute(
    ctx: *const CarryExpandContext,
    a: *const u64,
    b: *const u64,
    len: usize,
    cin: u64,
    carry_out: *mut u64,
    generate_out: *mut u64,
) -> c_int {
    if ctx.is_null()
        || a.is_null()
        || b.is_null()
        || carry_out.is_null()
        || generate_out.is_null()
    {
        return -1;
    }
    let ctx = &*ctx;
    let a = slice::from_raw_parts(a, len);
    let b = slice::from_raw_parts(b, len);

    match ctx.builder.build(a, b, cin) {
        Ok(v) => {
            ptr::copy_nonoverlapping(v.carry.as_ptr(), carry_out, v.carry.len());
            ptr::copy_nonoverlapping(v.generate.as_ptr(), generate_out, v.generate.len());
            0
        }
        Err(_) => -1,
    }
}

/// Export the builder's expansion as a gate-level netlist JSON.
/// Caller must free with carry_expand_free_string. Null on error.
#[no_mangle]
pub unsafe extern "C" fn carry_expand_netlist_json(ctx: *const CarryExpandContext) -> *mut c_char {
    if ctx.is_null() {
        return ptr::null_mut();
    }
    let json = Netlist::from_width((*ctx).builder.width())
        .map_err(|e| e.to_string())
        .and_then(|n| n.to_json().map_err(|e| e.to_string()));
    match json {
        Ok(s) => CString::new(s).map(CString::into_raw).unwrap_or(ptr::null_mut()),
        Err(_) => ptr::null_mut(),
    }
}

//! C interface, declared in `include/sharpen.h`.
//!
//! Results of [sharpen] are owned by the caller until handed back to [sharpen_release].
//! Every live result is tracked, so releasing a pointer twice (or one we never handed out)
//! is reported as an error instead of corrupting the heap.

use std::{
    cell::RefCell,
    collections::BTreeSet,
    ffi::{c_char, c_double, c_int, CString},
    panic::{self, AssertUnwindSafe},
    ptr,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::{debug, warn};

use crate::{
    error::{ErrorKind, SharpenError},
    image::{Image, PixelDepth},
    operations::sharpen::sharpen as sharpen_image,
    sharpen_err,
    utils::buffer::try_with_capacity,
};

pub const SHARPEN_OK: c_int = 0;
pub const SHARPEN_ERR_INVALID_ARGUMENT: c_int = 1;
pub const SHARPEN_ERR_ALLOCATION_FAILURE: c_int = 2;
pub const SHARPEN_ERR_PANIC: c_int = 3;

pub const SHARPEN_DEPTH_U8: u32 = PixelDepth::U8 as u32;
pub const SHARPEN_DEPTH_U16: u32 = PixelDepth::U16 as u32;
pub const SHARPEN_DEPTH_F32: u32 = PixelDepth::F32 as u32;

/// Raster descriptor shared with C.
///
/// `stride` is the distance in bytes between the starts of two consecutive rows.
/// Samples are interleaved and stored in native byte order.
#[repr(C)]
#[derive(Debug)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// One of the `SHARPEN_DEPTH_*` constants
    pub depth: u32,
    pub stride: usize,
    pub data: *mut u8,
}

/// Heap block behind every pointer returned by [sharpen].
/// `raw` must stay the first field: callers only ever see a pointer to it.
#[repr(C)]
struct ExportedImage {
    raw: RawImage,
    bytes: Vec<u8>,
}

static LIVE_IMAGES: Mutex<BTreeSet<usize>> = Mutex::new(BTreeSet::new());

thread_local! {
    static LAST_ERROR: RefCell<Option<(c_int, CString)>> = const { RefCell::new(None) };
}

fn live_images() -> MutexGuard<'static, BTreeSet<usize>> {
    // the set stays consistent even if a holder panicked
    LIVE_IMAGES.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error_code(kind: ErrorKind) -> c_int {
    match kind {
        ErrorKind::InvalidArgument => SHARPEN_ERR_INVALID_ARGUMENT,
        ErrorKind::AllocationFailure => SHARPEN_ERR_ALLOCATION_FAILURE,
    }
}

fn set_last_error(code: c_int, message: &str) {
    debug!("{message}");
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|last| *last.borrow_mut() = Some((code, message)));
}

fn clear_last_error() {
    LAST_ERROR.with(|last| *last.borrow_mut() = None);
}

/// Sharpens `image` with an unsharp mask of strength `amount` (percent) and blur sigma `radius`
/// (`0.0` picks a small kernel automatically).
///
/// Returns a new, tightly packed image that must be freed with [sharpen_release],
/// or null on failure; [sharpen_last_error] then tells why.
///
/// # Safety
///
/// - `image` must be null or point to a valid `RawImage`.
/// - Its `data` must be readable for `stride * (height - 1) + width * channels * bytes_per_sample` bytes.
/// - The buffer must not be written to during the call.
#[no_mangle]
pub unsafe extern "C" fn sharpen(
    image: *const RawImage,
    amount: c_int,
    radius: c_double,
) -> *mut RawImage {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: forwarded from this function's contract
        let input = unsafe { import(image) }?;
        let output = sharpen_image(&input, amount, radius)?;
        export(output)
    }));
    match result {
        Ok(Ok(raw)) => {
            clear_last_error();
            raw
        }
        Ok(Err(err)) => {
            set_last_error(error_code(err.kind()), &err.to_string());
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(SHARPEN_ERR_PANIC, "sharpen: internal error, operation aborted");
            ptr::null_mut()
        }
    }
}

/// Frees an image returned by [sharpen].
///
/// Returns `SHARPEN_OK`, or `SHARPEN_ERR_INVALID_ARGUMENT` without touching anything
/// if `image` is null, was not returned by [sharpen], or has already been released.
///
/// # Safety
///
/// After a successful release the pointer and its `data` must not be used again.
#[no_mangle]
pub unsafe extern "C" fn sharpen_release(image: *mut RawImage) -> c_int {
    if image.is_null() {
        set_last_error(
            SHARPEN_ERR_INVALID_ARGUMENT,
            "sharpen_release: image is null",
        );
        return SHARPEN_ERR_INVALID_ARGUMENT;
    }
    if !live_images().remove(&(image as usize)) {
        warn!("sharpen_release: {image:p} is not a live image, ignoring");
        set_last_error(
            SHARPEN_ERR_INVALID_ARGUMENT,
            &format!("sharpen_release: {image:p} was already released or never allocated"),
        );
        return SHARPEN_ERR_INVALID_ARGUMENT;
    }
    // SAFETY: the address was registered by `export`, which obtained it from `Box::into_raw`
    // on an `ExportedImage`, and removing it from the registry makes this the only release.
    drop(unsafe { Box::from_raw(image.cast::<ExportedImage>()) });
    clear_last_error();
    SHARPEN_OK
}

/// Code of the last failure on the calling thread, `SHARPEN_OK` if the last call succeeded.
#[no_mangle]
pub extern "C" fn sharpen_last_error() -> c_int {
    LAST_ERROR.with(|last| last.borrow().as_ref().map_or(SHARPEN_OK, |(code, _)| *code))
}

/// Message for the last failure on the calling thread, or null.
/// The string stays valid until the next call into this library on the same thread.
#[no_mangle]
pub extern "C" fn sharpen_last_error_message() -> *const c_char {
    LAST_ERROR.with(|last| {
        last.borrow()
            .as_ref()
            .map_or(ptr::null(), |(_, message)| message.as_ptr())
    })
}

/// Deep-copies a caller-owned descriptor into an [Image].
/// The destination is allocated before any of the caller's rows are read.
///
/// # Safety
///
/// Same requirements as [sharpen].
unsafe fn import(raw: *const RawImage) -> Result<Image, SharpenError> {
    // SAFETY: null was ruled out by `as_ref`, validity is the caller's contract
    let raw = unsafe { raw.as_ref() }
        .ok_or_else(|| sharpen_err!(ErrorKind::InvalidArgument, "image is null"))?;
    if raw.data.is_null() {
        return Err(sharpen_err!(ErrorKind::InvalidArgument, "image data is null"));
    }
    let depth = PixelDepth::from_repr(raw.depth).ok_or_else(|| {
        sharpen_err!(ErrorKind::InvalidArgument, "unknown pixel depth {}", raw.depth)
    })?;
    let stride = raw.stride;
    Image::required_len(raw.width, raw.height, raw.channels, depth, stride)?;
    let data = raw.data.cast_const();
    Image::from_rows(raw.width, raw.height, raw.channels, depth, |y, row| {
        // SAFETY: `required_len` accepted the layout, so row `y` starts `y * stride` bytes in
        // and its packed length fits within the readable span the caller guarantees
        let src = unsafe { std::slice::from_raw_parts(data.add(y * stride), row.len()) };
        row.copy_from_slice(src);
    })
}

/// Moves an [Image] into a tightly packed heap block the caller owns.
fn export(image: Image) -> Result<*mut RawImage, SharpenError> {
    let (channels, depth) = image.layout()?;
    let stride = image.packed_stride()?;
    let mut bytes: Vec<u8> = try_with_capacity(image.as_bytes().len())?;
    bytes.extend_from_slice(image.as_bytes());

    let mut exported = Box::new(ExportedImage {
        raw: RawImage {
            width: image.width(),
            height: image.height(),
            channels,
            depth: depth as u32,
            stride,
            data: ptr::null_mut(),
        },
        bytes,
    });
    // moving the Vec into the box did not move its heap buffer
    exported.raw.data = exported.bytes.as_mut_ptr();

    let raw = Box::into_raw(exported).cast::<RawImage>();
    live_images().insert(raw as usize);
    Ok(raw)
}

//! Unsharp mask filter.
//!
//! [sharpen] blurs an image with a Gaussian kernel and subtracts a share of the blurred copy
//! from a boosted original, which makes edges and fine detail stand out.
//! The same operation is exported to C by the [ffi] module, see `include/sharpen.h`.

#![deny(unsafe_code)]

// Opt-in, for the C library builds only
#[cfg(feature = "hardened_malloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod error;
#[allow(unsafe_code)]
pub mod ffi;
mod image;
mod operations;
mod options;
mod utils;

pub use crate::error::{ErrorKind, SharpenError};
pub use crate::image::{Image, PixelDepth};
pub use crate::operations::{
    blur::{gaussian_blur, GaussianKernel, AUTO_KERNEL_SIZE},
    sharpen::sharpen,
    weighted::add_weighted,
};
pub use crate::options::{SharpenOptions, MAX_AMOUNT, MAX_RADIUS};

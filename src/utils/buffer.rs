//! Allocation helpers that report exhaustion as [ErrorKind::AllocationFailure]
//! instead of aborting the process.

use crate::{
    error::{ErrorKind, SharpenError},
    sharpen_try,
};

pub fn try_with_capacity<T>(len: usize) -> Result<Vec<T>, SharpenError> {
    let mut buffer = Vec::new();
    sharpen_try!(ErrorKind::AllocationFailure, buffer.try_reserve_exact(len));
    Ok(buffer)
}

/// A vector of `len` zero-initialized elements.
pub fn try_zeroed<T: bytemuck::Zeroable + Clone>(len: usize) -> Result<Vec<T>, SharpenError> {
    let mut buffer = try_with_capacity(len)?;
    buffer.resize(len, T::zeroed());
    Ok(buffer)
}

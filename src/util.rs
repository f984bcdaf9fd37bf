use bytemuck::Zeroable;

use crate::{Error, Result};

// Allocate a zeroed boxed slice, reporting allocation failure instead of
// aborting. Plane buffers are sized from untrusted headers, so a refused
// allocation has to surface as a decode error.
pub fn try_zeroed_slice<T: Zeroable + Clone>(len: usize) -> Result<Box<[T]>> {
  let mut v: Vec<T> = Vec::new();
  v.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
  v.resize(len, T::zeroed());
  Ok(v.into_boxed_slice())
}

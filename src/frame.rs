use crate::util::try_zeroed_slice;
use crate::{Error, Result};

// One output plane. `width`/`height` are the visible size; the backing buffer
// covers the aligned decode rectangle, so `stride` and the row count may both
// exceed the visible size.
pub struct Plane {
  pub width: usize,
  pub height: usize,
  pub stride: usize,
  pub data: Box<[u16]>
}

impl Plane {
  fn new(width: usize, height: usize, stride: usize, rows: usize) -> Result<Self> {
    let len = stride.checked_mul(rows).ok_or(Error::OutOfMemory)?;
    Ok(Self {
      width: width,
      height: height,
      stride: stride,
      data: try_zeroed_slice(len)?
    })
  }

  // The wavelet stages work on signed 16-bit coefficients in the same storage
  // that postprocessing later rewrites as unsigned samples.
  pub fn coeffs_mut(&mut self) -> &mut [i16] {
    bytemuck::cast_slice_mut(&mut self.data)
  }
}

pub struct Frame {
  pub width: usize,
  pub height: usize,
  planes: [Plane; 3]
}

impl Frame {
  pub(crate) fn new(width: usize, height: usize, aligned_width: usize, aligned_height: usize) -> Result<Self> {
    let uv_width = (width + 1) / 2;
    let uv_height = (height + 1) / 2;

    Ok(Self {
      width: width,
      height: height,
      planes: [
        Plane::new(width, height, aligned_width, aligned_height)?,
        Plane::new(uv_width, uv_height, aligned_width / 2, aligned_height / 2)?,
        Plane::new(uv_width, uv_height, aligned_width / 2, aligned_height / 2)?
      ]
    })
  }

  pub fn plane(&self, idx: usize) -> &Plane {
    &self.planes[idx]
  }

  pub fn plane_mut(&mut self, idx: usize) -> &mut Plane {
    &mut self.planes[idx]
  }

  pub fn y(&self) -> &Plane {
    &self.planes[0]
  }

  pub fn y_mut(&mut self) -> &mut Plane {
    &mut self.planes[0]
  }

  pub fn u(&self) -> &Plane {
    &self.planes[1]
  }

  pub fn u_mut(&mut self) -> &mut Plane {
    &mut self.planes[1]
  }

  pub fn v(&self) -> &Plane {
    &self.planes[2]
  }

  pub fn v_mut(&mut self) -> &mut Plane {
    &mut self.planes[2]
  }
}

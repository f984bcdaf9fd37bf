use std::io::prelude::*;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::frame::Frame;

const Y4M_FILE_MAGIC: &str = "YUV4MPEG2 ";
const Y4M_FRAME_MAGIC: &str = "FRAME";

// Writes decoded frames as 16-bit 4:2:0 Y4M (sample bytes little-endian, as
// players expect for the C420p16 colourspace tag)
pub struct Y4MWriter<W> {
  inner: W,
  width: usize,
  height: usize
}

impl<W: Write> Y4MWriter<W> {
  pub fn new(mut inner: W, width: usize, height: usize) -> Self {
    inner.write_all(Y4M_FILE_MAGIC.as_bytes()).unwrap();
    write!(inner, "W{} H{} F25:1 C420p16\n", width, height).unwrap();

    Y4MWriter {
      inner: inner,
      width: width,
      height: height
    }
  }

  // TODO: Return io errors instead of panicking
  pub fn write_frame(&mut self, frame: &Frame) {
    assert!(frame.width == self.width);
    assert!(frame.height == self.height);

    self.inner.write_all(Y4M_FRAME_MAGIC.as_bytes()).unwrap();
    self.inner.write_u8(b'\n').unwrap();

    for idx in 0..3 {
      let plane = frame.plane(idx);
      for row in 0..plane.height {
        for x in 0..plane.width {
          self.inner.write_u16::<LittleEndian>(plane.data[row * plane.stride + x]).unwrap();
        }
      }
    }
  }
}

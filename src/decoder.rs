// Copyright (c) 2024-2025, The tinypixlet contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If the
// BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at https://opensource.org/license/bsd-2-clause

use std::cmp::max;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};

use crate::bitcode::{BitReader, ByteReader};
use crate::entropycode::{read_high_coeffs, read_low_coeffs};
use crate::frame::Frame;
use crate::recon::{lowpass_prediction, postprocess_chroma, postprocess_luma};
use crate::util::try_zeroed_slice;
use crate::wavelet::reconstruction;
use crate::{Error, Result};

pub const NB_LEVELS: usize = 4;

const BAND_MAGIC: u32 = 0xDEADBEEF;
const MAX_DIMENSION: usize = 8192;

const H: usize = 0;
const V: usize = 1;

// Geometry of one subband inside its plane. Index 0 is the lowpass band; the
// twelve highpass bands follow level by level, coarse to fine, each level a
// right / below / diagonal triplet.
#[derive(Clone, Copy, Default)]
struct SubBand {
  width: usize,
  height: usize,
  size: usize,
  x: usize,
  y: usize,
}

#[derive(Clone, Default)]
pub struct DecoderOptions {
  // Decode only the luma plane; chroma comes out neutral gray
  pub grayscale: bool,
  // Polled between subbands; setting it aborts the frame
  pub cancel: Option<Arc<AtomicBool>>,
}

// Decoder instance. Scratch buffers and the band table persist across frames
// and are rebuilt when the coded dimensions change; no decoded state carries
// over from one packet to the next.
pub struct PixletDecoder {
  options: DecoderOptions,

  // Aligned dimensions of plane 0, zero until the first frame
  w: usize,
  h: usize,
  depth: u32,

  scaling: [[[f32; NB_LEVELS]; 2]; 3],
  band: [[SubBand; NB_LEVELS * 3 + 1]; 3],

  col_scratch: Box<[i16]>,
  filter_scratch: Box<[i16]>,
  prediction: Box<[i16]>,
}

impl PixletDecoder {
  pub fn new() -> Self {
    Self::with_options(DecoderOptions::default())
  }

  pub fn with_options(options: DecoderOptions) -> Self {
    Self {
      options: options,
      w: 0,
      h: 0,
      depth: 0,
      scaling: [[[0.0; NB_LEVELS]; 2]; 3],
      band: [[SubBand::default(); NB_LEVELS * 3 + 1]; 3],
      col_scratch: Vec::new().into_boxed_slice(),
      filter_scratch: Vec::new().into_boxed_slice(),
      prediction: Vec::new().into_boxed_slice(),
    }
  }

  // Decode a single packet. Returns the frame and the number of packet bytes
  // consumed, which is the size the packet itself declares.
  pub fn decode(&mut self, packet: &[u8]) -> Result<(Frame, usize)> {
    let mut gb = ByteReader::new(packet);

    let pktsize = gb.get_be32()? as usize;
    if pktsize <= 44 || pktsize - 4 > gb.bytes_left() {
      return Err(Error::InvalidData("bad packet size"));
    }

    let version = gb.get_le32()?;
    if version != 1 {
      warn!("unsupported bitstream version {}", version);
      return Err(Error::Unsupported("bitstream version"));
    }
    gb.skip(4)?;
    if gb.get_be32()? != 1 {
      return Err(Error::InvalidData("bad header constant"));
    }
    gb.skip(4)?;

    let width = gb.get_be32()? as usize;
    let height = gb.get_be32()? as usize;
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
      return Err(Error::InvalidData("unreasonable image size"));
    }
    let w = width.next_multiple_of(1 << (NB_LEVELS + 1));
    let h = height.next_multiple_of(1 << (NB_LEVELS + 1));

    let levels = gb.get_be32()?;
    if levels as usize != NB_LEVELS {
      return Err(Error::InvalidData("wrong number of wavelet levels"));
    }
    let depth = gb.get_be32()?;
    if depth < 8 || depth > 15 {
      warn!("unsupported sample depth {}", depth);
      return Err(Error::InvalidData("sample depth out of range"));
    }
    self.depth = depth;

    self.ensure_buffers(w, h)?;
    gb.skip(8)?;

    debug!(
      "decoding {}x{} (aligned {}x{}), depth {}",
      width, height, w, h, depth
    );

    let mut frame = Frame::new(width, height, w, h)?;
    for plane in 0..3 {
      self.decode_plane(&mut gb, plane, &mut frame)?;
      if self.options.grayscale {
        break;
      }
    }

    {
      let p = frame.y_mut();
      let stride = p.stride;
      postprocess_luma(&mut p.data, w, h, stride, self.depth);
    }
    // In grayscale mode the chroma planes were never written, so this turns
    // their zeroed coefficients into neutral gray
    for plane in 1..3 {
      let p = frame.plane_mut(plane);
      let stride = p.stride;
      postprocess_chroma(&mut p.data, w >> 1, h >> 1, stride, self.depth);
    }

    Ok((frame, pktsize))
  }

  fn check_cancel(&self) -> Result<()> {
    if let Some(flag) = &self.options.cancel {
      if flag.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
      }
    }
    Ok(())
  }

  fn ensure_buffers(&mut self, w: usize, h: usize) -> Result<()> {
    if self.w == w && self.h == h {
      return Ok(());
    }
    self.w = 0;
    self.h = 0;

    self.col_scratch = try_zeroed_slice(h)?;
    self.filter_scratch = try_zeroed_slice(max(h, w) + 16)?;
    self.prediction = try_zeroed_slice(w >> NB_LEVELS)?;

    for plane in 0..3 {
      let shift = (plane > 0) as usize;
      let pw = w >> shift;
      let ph = h >> shift;

      self.band[plane][0] = SubBand {
        width: pw >> NB_LEVELS,
        height: ph >> NB_LEVELS,
        size: (pw >> NB_LEVELS) * (ph >> NB_LEVELS),
        x: 0,
        y: 0,
      };

      for i in 0..NB_LEVELS * 3 {
        let scale = NB_LEVELS - i / 3;
        let bw = pw >> scale;
        let bh = ph >> scale;

        self.band[plane][i + 1] = SubBand {
          width: bw,
          height: bh,
          size: bw * bh,
          x: if (i + 1) % 3 != 2 { bw } else { 0 },
          y: if (i + 1) % 3 != 1 { bh } else { 0 },
        };
      }
    }

    self.w = w;
    self.h = h;
    Ok(())
  }

  fn decode_plane(&mut self, gb: &mut ByteReader<'_>, plane: usize, frame: &mut Frame) -> Result<()> {
    let shift = (plane > 0) as usize;

    // Scale factors come finest level first, horizontal before vertical
    for i in (0..NB_LEVELS).rev() {
      self.scaling[plane][H][i] = (1_000_000.0f64 / gb.get_be32()? as i32 as f64) as f32;
      self.scaling[plane][V][i] = (1_000_000.0f64 / gb.get_be32()? as i32 as f64) as f32;
    }
    gb.skip(4)?;

    let dcw = self.band[plane][0].width;
    let dch = self.band[plane][0].height;

    let p = frame.plane_mut(plane);
    let stride = p.stride;
    let dst = p.coeffs_mut();

    dst[0] = gb.get_be16()? as i16;

    // The three lowpass passes share one bit reader, each byte-aligning on
    // exit; only the total byte count moves the packet cursor
    let mut bits = BitReader::new(gb.remaining());

    read_low_coeffs(&mut bits, &mut dst[1..], dcw - 1, dcw - 1, 0)?;
    read_low_coeffs(&mut bits, &mut dst[stride..], dch - 1, 1, stride)?;
    read_low_coeffs(
      &mut bits,
      &mut dst[stride + 1..],
      (dcw - 1) * (dch - 1),
      dcw - 1,
      stride,
    )?;

    gb.skip(bits.bits_consumed() >> 3)?;
    if gb.bytes_left() == 0 {
      return Err(Error::InvalidData("no bytes left after lowpass band"));
    }

    for i in 0..NB_LEVELS * 3 {
      self.check_cancel()?;

      let a = gb.get_be32()? as i32;
      let b = gb.get_be32()? as i32;
      let c = gb.get_be32()? as i32;
      let d = gb.get_be32()? as i32;

      let magic = gb.get_be32()?;
      if magic != BAND_MAGIC {
        error!(
          "wrong magic number 0x{:08X} for plane {}, band {}",
          magic, plane, i
        );
        return Err(Error::InvalidData("wrong subband magic"));
      }

      if a == i32::MIN {
        return Err(Error::InvalidData("highpass parameter overflow"));
      }
      let band = self.band[plane][i + 1];
      let base = band.y * stride + band.x;

      let mut bits = BitReader::new(gb.remaining());
      read_high_coeffs(
        &mut bits,
        &mut dst[base..],
        band.size,
        c,
        if b >= a.abs() { b } else { a },
        d,
        band.width,
        stride,
      )?;
      gb.skip(bits.bits_consumed() >> 3)?;
    }

    lowpass_prediction(dst, &mut self.prediction, dcw, dch, stride);

    reconstruction(
      dst,
      self.w >> shift,
      self.h >> shift,
      stride,
      NB_LEVELS,
      &self.scaling[plane][H],
      &self.scaling[plane][V],
      &mut self.col_scratch,
      &mut self.filter_scratch,
    );

    Ok(())
  }
}

impl Default for PixletDecoder {
  fn default() -> Self {
    Self::new()
  }
}

impl Clone for PixletDecoder {
  // A clone starts with empty scratch, so instances can decode frames of the
  // same stream in parallel without sharing anything
  fn clone(&self) -> Self {
    Self::with_options(self.options.clone())
  }
}

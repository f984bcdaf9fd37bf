// Copyright (c) 2024-2025, The tinypixlet contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If the
// BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at https://opensource.org/license/bsd-2-clause

use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::{Error, Result};

// Byte-level reader over one packet. All reads are bounds-checked: running off
// the end of the packet is a decode error, never a silent zero.
pub struct ByteReader<'a> {
  cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self {
      cursor: Cursor::new(data)
    }
  }

  pub fn get_be16(&mut self) -> Result<u16> {
    self.cursor.read_u16::<BigEndian>().map_err(|_| Error::InvalidData("packet truncated"))
  }

  pub fn get_be32(&mut self) -> Result<u32> {
    self.cursor.read_u32::<BigEndian>().map_err(|_| Error::InvalidData("packet truncated"))
  }

  pub fn get_le32(&mut self) -> Result<u32> {
    self.cursor.read_u32::<LittleEndian>().map_err(|_| Error::InvalidData("packet truncated"))
  }

  pub fn skip(&mut self, count: usize) -> Result<()> {
    if count > self.bytes_left() {
      return Err(Error::InvalidData("packet truncated"));
    }
    self.cursor.set_position(self.cursor.position() + count as u64);
    Ok(())
  }

  pub fn tell(&self) -> usize {
    self.cursor.position() as usize
  }

  pub fn bytes_left(&self) -> usize {
    self.cursor.get_ref().len() - self.tell()
  }

  // The unread tail of the packet. Borrows from the packet, not the reader, so
  // a bit reader over the tail can run while the byte cursor stays usable.
  pub fn remaining(&self) -> &'a [u8] {
    let data: &'a [u8] = *self.cursor.get_ref();
    &data[self.tell()..]
  }
}

// MSB-first bit reader. Consuming reads fail once the buffer is exhausted;
// show_bits() peeks through the end as if the buffer were zero-padded, which
// matches streams whose final code ends flush with the packet (the short-value
// paths peek one bit more than they consume).
pub struct BitReader<'a> {
  data: &'a [u8],
  byte_pos: usize,
  bit_pos: u8,
}

impl<'a> BitReader<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self {
      data: data,
      byte_pos: 0,
      bit_pos: 0,
    }
  }

  pub fn bits_consumed(&self) -> usize {
    self.byte_pos * 8 + self.bit_pos as usize
  }

  pub fn show_bits(&self, count: u32) -> u32 {
    assert!(count <= 32);

    let mut value = 0u32;
    let mut byte = self.byte_pos;
    let mut bit = self.bit_pos;
    for _ in 0..count {
      let b = if byte < self.data.len() {
        (self.data[byte] >> (7 - bit)) & 1
      } else {
        0
      };
      value = (value << 1) | b as u32;
      bit += 1;
      if bit == 8 {
        bit = 0;
        byte += 1;
      }
    }
    value
  }

  pub fn skip_bits(&mut self, count: u32) -> Result<()> {
    let total = self.bits_consumed() + count as usize;
    if total > self.data.len() * 8 {
      return Err(Error::InvalidData("bitstream overread"));
    }
    self.byte_pos = total / 8;
    self.bit_pos = (total % 8) as u8;
    Ok(())
  }

  pub fn get_bits(&mut self, count: u32) -> Result<u32> {
    let value = self.show_bits(count);
    self.skip_bits(count)?;
    Ok(value)
  }

  pub fn get_bit(&mut self) -> Result<bool> {
    Ok(self.get_bits(1)? != 0)
  }

  // Count set bits up to the next zero bit, consuming the zero bit as well.
  // Stops after `limit` bits without looking for a terminator; a return value
  // equal to `limit` means the escape encoding follows.
  pub fn get_unary(&mut self, limit: u32) -> Result<u32> {
    let mut count = 0;
    while count < limit && self.get_bit()? {
      count += 1;
    }
    Ok(count)
  }

  pub fn align(&mut self) {
    if self.bit_pos != 0 {
      self.bit_pos = 0;
      self.byte_pos += 1;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn read_bits_msb_first() {
    let data = [0b1011_0011, 0b0101_0101];
    let mut reader = BitReader::new(&data);

    assert_eq!(reader.get_bits(4).unwrap(), 0b1011);
    assert_eq!(reader.get_bits(4).unwrap(), 0b0011);
    assert_eq!(reader.get_bits(8).unwrap(), 0b0101_0101);
    assert_eq!(reader.bits_consumed(), 16);
  }

  #[test]
  fn show_does_not_advance_and_zero_pads() {
    let data = [0b1111_0000];
    let mut reader = BitReader::new(&data);

    assert_eq!(reader.show_bits(4), 0b1111);
    assert_eq!(reader.get_bits(4).unwrap(), 0b1111);
    // Peeking past the end reads zeros, consuming past the end fails
    assert_eq!(reader.show_bits(8), 0b0000_0000);
    assert!(reader.get_bits(8).is_err());
    assert_eq!(reader.get_bits(4).unwrap(), 0);
  }

  #[test]
  fn unary_counts_ones_and_hits_limit() {
    let data = [0b1110_1111, 0b1111_0000];
    let mut reader = BitReader::new(&data);

    assert_eq!(reader.get_unary(8).unwrap(), 3);
    assert_eq!(reader.bits_consumed(), 4);
    // Eight ones in a row: the limit is reached and no stop bit is consumed
    assert_eq!(reader.get_unary(8).unwrap(), 8);
    assert_eq!(reader.bits_consumed(), 12);
  }

  #[test]
  fn align_rounds_up_to_byte() {
    let data = [0xFF, 0x00];
    let mut reader = BitReader::new(&data);

    reader.get_bits(3).unwrap();
    reader.align();
    assert_eq!(reader.bits_consumed(), 8);
    reader.align();
    assert_eq!(reader.bits_consumed(), 8);
  }

  #[test]
  fn byte_reader_scalars() {
    let data = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB, 0x10, 0x20, 0x30, 0x40];
    let mut reader = ByteReader::new(&data);

    assert_eq!(reader.get_be32().unwrap(), 0x0102_0304);
    assert_eq!(reader.get_be16().unwrap(), 0xAABB);
    assert_eq!(reader.get_le32().unwrap(), 0x4030_2010);
    assert_eq!(reader.bytes_left(), 0);
    assert!(reader.get_be16().is_err());
  }

  #[test]
  fn byte_reader_skip_and_remaining() {
    let data = [1, 2, 3, 4, 5];
    let mut reader = ByteReader::new(&data);

    reader.skip(2).unwrap();
    assert_eq!(reader.tell(), 2);
    assert_eq!(reader.remaining(), &[3, 4, 5]);
    assert!(reader.skip(4).is_err());
  }
}

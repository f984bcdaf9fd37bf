use afl::*;

use tinypixlet::PixletDecoder;

fn main() {
  fuzz!(|data: &[u8]| {
    let mut decoder = PixletDecoder::new();

    // Any input must come back as a frame or an error, never a crash
    let _ = decoder.decode(data);
  })
}

pub mod bitcode;
pub mod decoder;
pub mod entropycode;
pub mod frame;
pub mod recon;
pub mod util;
pub mod wavelet;
pub mod y4m;

pub use decoder::{DecoderOptions, PixletDecoder, NB_LEVELS};
pub use frame::{Frame, Plane};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("invalid bitstream: {0}")]
  InvalidData(&'static str),
  #[error("unsupported stream: {0}")]
  Unsupported(&'static str),
  #[error("allocation failed")]
  OutOfMemory,
  #[error("decode cancelled")]
  Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

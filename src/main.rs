use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tinypixlet::y4m::Y4MWriter;
use tinypixlet::{DecoderOptions, PixletDecoder};

#[derive(Parser)]
#[command(about = "Decode Apple Pixlet packets to YUV4MPEG2")]
struct Args {
  /// File of concatenated Pixlet packets, each self-sized by its header
  input: PathBuf,

  /// Output .y4m file (YUV 4:2:0, 16 bits per component)
  output: PathBuf,

  /// Decode luma only; chroma comes out neutral gray
  #[arg(long)]
  gray: bool,
}

fn main() -> ExitCode {
  env_logger::init();
  let args = Args::parse();

  let data = match fs::read(&args.input) {
    Ok(data) => data,
    Err(e) => {
      eprintln!("cannot read {}: {}", args.input.display(), e);
      return ExitCode::FAILURE;
    }
  };

  let mut decoder = PixletDecoder::with_options(DecoderOptions {
    grayscale: args.gray,
    ..DecoderOptions::default()
  });

  let mut writer: Option<Y4MWriter<BufWriter<File>>> = None;
  let mut offset = 0;

  while offset < data.len() {
    let (frame, consumed) = match decoder.decode(&data[offset..]) {
      Ok(decoded) => decoded,
      Err(e) => {
        eprintln!("decode error at byte {}: {}", offset, e);
        return ExitCode::FAILURE;
      }
    };

    if writer.is_none() {
      let file = match File::create(&args.output) {
        Ok(file) => file,
        Err(e) => {
          eprintln!("cannot create {}: {}", args.output.display(), e);
          return ExitCode::FAILURE;
        }
      };
      writer = Some(Y4MWriter::new(BufWriter::new(file), frame.width, frame.height));
    }

    writer.as_mut().unwrap().write_frame(&frame);
    offset += consumed;
  }

  if writer.is_none() {
    eprintln!("no packets in {}", args.input.display());
    return ExitCode::FAILURE;
  }

  ExitCode::SUCCESS
}

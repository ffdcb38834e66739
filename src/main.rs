//! BIN2CHF, a converter from raw Channel F ROM images to .chf containers.

#![deny(missing_docs)]
#![deny(unused)]
#![deny(warnings)]
#![deny(unsafe_code)]

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use bin2chf::chf;
use bin2chf::chf::Chf;
use bin2chf::cli;
use bin2chf::cli::Options;
use bin2chf::hardware;
use bin2chf::hardware::HardwareType;
use bin2chf::map;

fn main() {
  let result = cli::parse()
    .map_err(Error::Config)
    .and_then(|opts| run(&opts));
  if let Err(error) = result {
    eprintln!("[ERROR] {}", error);
    process::exit(1);
  }
}

/// Runs the whole conversion pipeline.
///
/// Everything that can fail does so before the output file is created, so a
/// validation failure never leaves a partial container behind. The one
/// exception is an I/O failure mid-write, which leaves the output truncated.
fn run(opts: &Options) -> Result<(), Error> {
  let image = read_image(&opts.infile)?;
  let outfile = resolve_outfile(opts)?;
  let hardware = hardware::by_id(opts.hardware_type)
    .ok_or(Error::BadHardwareType(opts.hardware_type))?;

  let mut overrides = opts.overrides();
  if let Some(name) = &opts.preset {
    overrides.extend(cli::load_preset(name).map_err(Error::Preset)?);
  }

  let map = map::build(hardware, &overrides).map_err(Error::Map)?;
  if map.ignored_overrides {
    eprintln!("[WARNING] Hardware type doesn't support a manual memory map");
  }

  let packets = map::materialize(map.packets, &image);
  let chf =
    Chf::new(hardware.id, title_for(opts), packets).map_err(Error::Chf)?;

  print_summary(&outfile, hardware, &chf);

  let file = fs::File::create(&outfile)
    .map_err(|_| Error::UnwritableOutput(outfile.clone()))?;
  let mut w = io::BufWriter::new(file);
  chf
    .write_to(&mut w)
    .and_then(|()| w.flush())
    .map_err(|_| Error::WriteFailed(outfile))?;

  println!();
  println!("OK");
  Ok(())
}

fn read_image(path: &Path) -> Result<Vec<u8>, Error> {
  if path.extension().and_then(OsStr::to_str) != Some("bin") {
    return Err(Error::NotBin(path.to_path_buf()));
  }
  if !path.is_file() {
    return Err(Error::MissingInput(path.to_path_buf()));
  }
  fs::read(path).map_err(|_| Error::UnreadableInput(path.to_path_buf()))
}

/// Picks the output path and applies the overwrite policy, which may involve
/// asking the operator.
fn resolve_outfile(opts: &Options) -> Result<PathBuf, Error> {
  let outfile = match &opts.outfile {
    Some(path) => path.clone(),
    None => {
      let stem = opts
        .infile
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("out"));
      stem.with_extension("chf")
    }
  };

  if outfile.exists() {
    if opts.no || (!opts.yes && !confirm_overwrite(&outfile)) {
      return Err(Error::OutputExists(outfile));
    }
    eprintln!("[WARNING] Overwriting \"{}\"", outfile.display());
  }
  Ok(outfile)
}

fn confirm_overwrite(path: &Path) -> bool {
  print!("File {} already exists. Overwrite? [y/N] ", path.display());
  if io::stdout().flush().is_err() {
    return false;
  }
  let mut response = String::new();
  match io::stdin().read_line(&mut response) {
    Ok(_) => response.trim().eq_ignore_ascii_case("y"),
    Err(_) => false,
  }
}

fn title_for(opts: &Options) -> String {
  let title = match &opts.title {
    Some(title) => title.clone(),
    None => opts
      .infile
      .file_stem()
      .and_then(OsStr::to_str)
      .unwrap_or("")
      .to_string(),
  };
  if title.is_empty() {
    "out".to_string()
  } else {
    title
  }
}

fn print_summary(outfile: &Path, hardware: &HardwareType, chf: &Chf<'_>) {
  println!();
  println!("Generating \"{}\":", outfile.display());
  println!("  Title: {}", chf.title());
  println!("  Hardware Type: {} [{}]", hardware.name, hardware.id);
  println!("  Packets:");
  for packet in chf.packets() {
    println!(
      "    Type: {} [{}], Start: {:#x}, Size: {:#x} bytes",
      packet.chip_type,
      packet.chip_type.id(),
      packet.load_address,
      packet.image_size
    );
  }
}

/// Everything fatal the pipeline can run into, in the shape the operator
/// sees it.
#[derive(Debug)]
enum Error {
  /// The input file does not have a .bin extension.
  NotBin(PathBuf),
  /// The input file does not exist.
  MissingInput(PathBuf),
  /// The input file exists but could not be read.
  UnreadableInput(PathBuf),
  /// A --config argument file could not be read.
  Config(cli::ConfigError),
  /// The output file exists and the overwrite policy forbids replacing it.
  OutputExists(PathBuf),
  /// The output file could not be created.
  UnwritableOutput(PathBuf),
  /// Writing the container failed partway; the output is left truncated.
  WriteFailed(PathBuf),
  /// The requested hardware type id is not defined.
  BadHardwareType(u16),
  /// A preset could not be loaded.
  Preset(cli::PresetError),
  /// The memory map failed validation.
  Map(map::Error),
  /// The container descriptor could not be assembled.
  Chf(chf::Error),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::NotBin(path) => {
        write!(f, "file \"{}\" is not a .bin file", path.display())
      }
      Error::MissingInput(path) => {
        write!(f, "file \"{}\" does not exist", path.display())
      }
      Error::UnreadableInput(path) => {
        write!(f, "file \"{}\" could not be opened/read", path.display())
      }
      Error::Config(error) => error.fmt(f),
      Error::OutputExists(path) => {
        write!(f, "file \"{}\" already exists", path.display())
      }
      Error::UnwritableOutput(path) => {
        write!(f, "file \"{}\" could not be opened/written", path.display())
      }
      Error::WriteFailed(path) => {
        write!(f, "file \"{}\" could not be written", path.display())
      }
      Error::BadHardwareType(id) => {
        write!(f, "hardware type {} is not defined", id)
      }
      Error::Preset(error) => error.fmt(f),
      Error::Map(error) => error.fmt(f),
      Error::Chf(error) => error.fmt(f),
    }
  }
}

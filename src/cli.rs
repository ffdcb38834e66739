//! The command-line surface of the converter.
//!
//! This is thin glue around the core: it collects an input path, an output
//! policy, a hardware type, a title, and per-chip-type override ranges, and
//! hands them to the pipeline in `main`. Start and size values accept
//! decimal, `0x`/`0o`/`0b` prefixes, classic `$`-prefixed hex, and `_` digit
//! separators.
//!
//! A `--config` file supplies extra arguments: lines starting with `#` are
//! comments, everything else is split on whitespace and inserted before the
//! arguments from the command line proper.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use structopt::StructOpt;

use crate::chip::ChipType;
use crate::map::OverrideRange;

/// Convert Channel F .bin images into .chf cartridge containers.
#[derive(Debug, StructOpt)]
#[structopt(name = "bin2chf")]
pub struct Options {
  /// The .bin file to convert.
  #[structopt(parse(from_os_str))]
  pub infile: PathBuf,

  /// The output file name; defaults to the input stem with a .chf extension.
  #[structopt(short = "o", long = "outfile", parse(from_os_str))]
  pub outfile: Option<PathBuf>,

  /// A file of extra command-line arguments to apply.
  #[structopt(short = "c", long = "config", parse(from_os_str))]
  pub config: Option<PathBuf>,

  /// The cartridge hardware type.
  #[structopt(
    short = "w",
    long = "hardwaretype",
    default_value = "2",
    possible_values = &["0", "1", "2", "3", "4", "5"]
  )]
  pub hardware_type: u16,

  /// The game's title; defaults to the input file stem.
  #[structopt(short = "t", long = "title")]
  pub title: Option<String>,

  /// A named preset memory map to apply.
  #[structopt(short = "p", long = "preset")]
  pub preset: Option<String>,

  /// Overwrite output files without asking.
  #[structopt(short = "y", long = "yes", conflicts_with = "no")]
  pub yes: bool,

  /// Never overwrite; exit immediately if the output file already exists.
  #[structopt(short = "n", long = "no")]
  pub no: bool,

  /// Designates a range of memory as ROM.
  #[structopt(
    long = "rom",
    number_of_values = 2,
    value_names = &["START", "SIZE"],
    parse(try_from_str = parse_int)
  )]
  pub rom: Vec<u32>,

  /// Designates a range of memory as RAM.
  #[structopt(
    long = "ram",
    number_of_values = 2,
    value_names = &["START", "SIZE"],
    parse(try_from_str = parse_int)
  )]
  pub ram: Vec<u32>,

  /// Designates a range of memory as LED-mapped I/O.
  #[structopt(
    long = "led",
    number_of_values = 2,
    value_names = &["START", "SIZE"],
    parse(try_from_str = parse_int)
  )]
  pub led: Vec<u32>,

  /// Designates a range of memory as NVRAM.
  #[structopt(
    long = "nvram",
    number_of_values = 2,
    value_names = &["START", "SIZE"],
    parse(try_from_str = parse_int)
  )]
  pub nvram: Vec<u32>,
}

impl Options {
  /// Collects the override ranges supplied on the command line, grouped by
  /// chip type in id order.
  pub fn overrides(&self) -> Vec<OverrideRange> {
    let mut ranges = Vec::new();
    for &chip in &ChipType::ALL {
      let values = match chip {
        ChipType::Rom => &self.rom,
        ChipType::Ram => &self.ram,
        ChipType::Led => &self.led,
        ChipType::Nvram => &self.nvram,
      };
      for pair in values.chunks(2) {
        if let [start, size] = *pair {
          ranges.push(OverrideRange { chip, start, size });
        }
      }
    }
    ranges
  }
}

/// Parses the process arguments, expanding a `--config` argument file if one
/// is named.
pub fn parse() -> Result<Options, ConfigError> {
  let opts = Options::from_args();
  let config = match &opts.config {
    Some(path) => path.clone(),
    None => return Ok(opts),
  };
  let extra = read_config(&config).map_err(|_| ConfigError { path: config })?;
  let args = env::args_os()
    .take(1)
    .chain(extra.into_iter().map(OsString::from))
    .chain(env::args_os().skip(1));
  Ok(Options::from_iter(args))
}

/// An error produced while reading a `--config` argument file.
#[derive(Debug)]
pub struct ConfigError {
  /// The file that could not be read.
  pub path: PathBuf,
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "config file \"{}\" could not be read", self.path.display())
  }
}

fn read_config(path: &Path) -> io::Result<Vec<String>> {
  Ok(split_config(&fs::read_to_string(path)?))
}

fn split_config(text: &str) -> Vec<String> {
  let mut arguments = Vec::new();
  for line in text.lines() {
    if line.trim_start().starts_with('#') {
      continue;
    }
    arguments.extend(line.split_whitespace().map(String::from));
  }
  arguments
}

/// Loads a named preset memory map.
///
/// Preset files have no defined format yet; until one exists, every name
/// fails with [`PresetError::Unimplemented`]. This is the seam where a real
/// preset store would plug in.
///
/// [`PresetError::Unimplemented`]: enum.PresetError.html#variant.Unimplemented
pub fn load_preset(name: &str) -> Result<Vec<OverrideRange>, PresetError> {
  Err(PresetError::Unimplemented(name.to_string()))
}

/// An error produced while loading a preset memory map.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PresetError {
  /// Indicates that presets cannot be loaded at all yet.
  Unimplemented(String),
}

impl fmt::Display for PresetError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      PresetError::Unimplemented(name) => write!(
        f,
        "preset \"{}\" is not implemented; supply --rom/--ram/--led/--nvram ranges instead",
        name
      ),
    }
  }
}

/// Parses an integer literal in any of the accepted radix notations.
///
/// Accepts decimal, `0x`/`0o`/`0b` C-style prefixes, `$` classic-style hex,
/// and `_` separators between digits.
pub fn parse_int(s: &str) -> Result<u32, String> {
  let s = s.trim();
  let (digits, radix) = if let Some(rest) =
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
  {
    (rest, 16)
  } else if let Some(rest) = s.strip_prefix('$') {
    (rest, 16)
  } else if let Some(rest) =
    s.strip_prefix("0o").or_else(|| s.strip_prefix("0O"))
  {
    (rest, 8)
  } else if let Some(rest) =
    s.strip_prefix("0b").or_else(|| s.strip_prefix("0B"))
  {
    (rest, 2)
  } else {
    (s, 10)
  };

  let digits = digits.replace('_', "");
  u32::from_str_radix(&digits, radix)
    .map_err(|_| format!("invalid integer literal: {}", s))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn integer_literals() {
    assert_eq!(parse_int("123"), Ok(123));
    assert_eq!(parse_int("0x800"), Ok(0x800));
    assert_eq!(parse_int("0XFF"), Ok(0xff));
    assert_eq!(parse_int("$f800"), Ok(0xf800));
    assert_eq!(parse_int("0b101"), Ok(5));
    assert_eq!(parse_int("0o17"), Ok(15));
    assert_eq!(parse_int("1_000"), Ok(1000));
    assert_eq!(parse_int("$f_f"), Ok(0xff));

    assert!(parse_int("").is_err());
    assert!(parse_int("0x").is_err());
    assert!(parse_int("twelve").is_err());
    assert!(parse_int("-1").is_err());
  }

  #[test]
  fn override_ranges_group_by_chip() {
    let opts = Options::from_iter(vec![
      "bin2chf", "game.bin", "--ram", "0x2800", "0x800", "--rom", "0x800",
      "0x2000", "--rom", "0x3000", "0xc800",
    ]);
    assert_eq!(
      opts.overrides(),
      vec![
        OverrideRange {
          chip: ChipType::Rom,
          start: 0x800,
          size: 0x2000
        },
        OverrideRange {
          chip: ChipType::Rom,
          start: 0x3000,
          size: 0xc800
        },
        OverrideRange {
          chip: ChipType::Ram,
          start: 0x2800,
          size: 0x800
        },
      ]
    );
  }

  #[test]
  fn no_overrides_by_default() {
    let opts = Options::from_iter(vec!["bin2chf", "game.bin"]);
    assert!(opts.overrides().is_empty());
    assert_eq!(opts.hardware_type, 2);
    assert!(!opts.yes);
    assert!(!opts.no);
  }

  #[test]
  fn hardware_type_must_be_known() {
    assert!(
      Options::from_iter_safe(vec!["bin2chf", "game.bin", "-w", "7"]).is_err()
    );
    let opts = Options::from_iter(vec!["bin2chf", "game.bin", "-w", "5"]);
    assert_eq!(opts.hardware_type, 5);
  }

  #[test]
  fn overwrite_flags_conflict() {
    assert!(
      Options::from_iter_safe(vec!["bin2chf", "game.bin", "-y", "-n"])
        .is_err()
    );
  }

  #[test]
  fn ranges_come_in_pairs() {
    assert!(Options::from_iter_safe(vec![
      "bin2chf", "game.bin", "--rom", "0x800"
    ])
    .is_err());
  }

  #[test]
  fn config_splitting() {
    let text =
      "# memory map for the chess cart\n--rom 0x800 0x2000\n\n  # indented comment\n-w 5 -t chess\n";
    assert_eq!(
      split_config(text),
      vec!["--rom", "0x800", "0x2000", "-w", "5", "-t", "chess"]
    );
  }

  #[test]
  fn presets_are_not_implemented() {
    assert_eq!(
      load_preset("chess"),
      Err(PresetError::Unimplemented("chess".to_string()))
    );
  }
}

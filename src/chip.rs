//! Chip types for cartridge memory regions.
//!
//! Every packet in a `.chf` container is backed by one of a small, closed set
//! of memory technologies. The chip type determines whether the region
//! carries initial image data: plain RAM is backed by hardware state alone,
//! so no bytes from the input image belong to it, while ROM, the LED-mapped
//! register file, and NVRAM all carry bytes out of the image.

use std::fmt;

/// The memory technology backing a packet.
///
/// The discriminants are the on-disk chip type ids of the `.chf` format.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ChipType {
  /// Read-only memory, carrying image data.
  Rom = 0,
  /// Volatile RAM; an address reservation only, with no image data.
  Ram = 1,
  /// LED-mapped I/O, carrying image data.
  Led = 2,
  /// Non-volatile RAM, carrying image data.
  Nvram = 3,
}

impl ChipType {
  /// Every chip type, in id order.
  pub const ALL: [ChipType; 4] =
    [ChipType::Rom, ChipType::Ram, ChipType::Led, ChipType::Nvram];

  /// Returns the on-disk id of this chip type.
  pub const fn id(self) -> u16 {
    self as u16
  }

  /// Returns the chip type with the given on-disk id, if there is one.
  pub fn from_id(id: u16) -> Option<ChipType> {
    match id {
      0 => Some(ChipType::Rom),
      1 => Some(ChipType::Ram),
      2 => Some(ChipType::Led),
      3 => Some(ChipType::Nvram),
      _ => None,
    }
  }

  /// Returns the lowercase name of this chip type.
  ///
  /// This doubles as the name of the command-line flag that designates a
  /// memory range as this chip type.
  pub const fn name(self) -> &'static str {
    match self {
      ChipType::Rom => "rom",
      ChipType::Ram => "ram",
      ChipType::Led => "led",
      ChipType::Nvram => "nvram",
    }
  }

  /// Returns true if regions of this chip type carry bytes from the input
  /// image.
  pub const fn has_data(self) -> bool {
    match self {
      ChipType::Ram => false,
      _ => true,
    }
  }
}

impl fmt::Display for ChipType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ChipType::Rom => write!(f, "ROM"),
      ChipType::Ram => write!(f, "RAM"),
      ChipType::Led => write!(f, "LED"),
      ChipType::Nvram => write!(f, "NVRAM"),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn ids_round_trip() {
    for &chip in &ChipType::ALL {
      assert_eq!(ChipType::from_id(chip.id()), Some(chip));
    }
    assert_eq!(ChipType::from_id(4), None);
    assert_eq!(ChipType::from_id(0xffff), None);
  }

  #[test]
  fn only_ram_is_dataless() {
    for &chip in &ChipType::ALL {
      assert_eq!(chip.has_data(), chip != ChipType::Ram);
    }
  }

  #[test]
  fn names() {
    assert_eq!(ChipType::Rom.name(), "rom");
    assert_eq!(ChipType::Nvram.name(), "nvram");
    assert_eq!(ChipType::Led.to_string(), "LED");
  }
}

//! Memory map construction and image materialization.
//!
//! A memory map is an ordered set of non-overlapping *packets*, each tagging
//! a contiguous range of the cartridge address space with a chip type. Maps
//! come from two places: a hardware profile's fixed defaults, or (for the
//! flashcart profile only) user-supplied override ranges, which must be
//! validated for bounds and overlap before use.
//!
//! Once a map is built, [`materialize`] binds it to the actual input image:
//! each data-bearing packet receives a borrowed slice of the image, clipped
//! to whatever bytes actually exist. The image buffer is owned by the caller
//! and outlives every packet derived from it for the duration of one
//! conversion run.
//!
//! [`materialize`]: fn.materialize.html

use std::fmt;

use crate::chip::ChipType;
use crate::hardware::HardwareType;

/// The lowest addressable load address. The first byte of the input image is
/// anchored here; the 2K below it belong to the console's BIOS.
pub const BASE_ADDRESS: u16 = 0x800;

/// One past the highest addressable load address.
pub const ADDRESS_LIMIT: u32 = 0x10000;

/// One contiguous memory region of the target cartridge.
///
/// A packet's address range must satisfy `0x800 <= load_address <= 0xffff`,
/// `image_size >= 1`, and `load_address + image_size <= 0x10000`. [`build`]
/// enforces this for user-supplied ranges; the static profile tables satisfy
/// it by construction.
///
/// `data` is attached by [`materialize`] and only for chip types that carry
/// image data. After materialization, `image_size` equals the data length
/// for data-bearing packets, which may be less than the declared region size
/// when the input image runs short.
///
/// [`build`]: fn.build.html
/// [`materialize`]: fn.materialize.html
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Packet<'img> {
  /// The chip type backing this region.
  pub chip_type: ChipType,
  /// The bank this region belongs to. Always zero for single-bank
  /// cartridges, which are the only kind this tool converts.
  pub bank_number: u16,
  /// The address at which this region's first byte appears.
  pub load_address: u16,
  /// The size of this region in bytes.
  pub image_size: u16,
  /// This region's slice of the input image, if any.
  pub data: Option<&'img [u8]>,
}

impl Packet<'static> {
  /// Creates a dataless address-range reservation, as found in the static
  /// hardware profile tables.
  pub const fn reserve(
    chip_type: ChipType,
    load_address: u16,
    image_size: u16,
  ) -> Self {
    Packet {
      chip_type,
      bank_number: 0,
      load_address,
      image_size,
      data: None,
    }
  }
}

/// A user-supplied `(chip type, start, size)` range, as written on the
/// command line.
///
/// Start and size are kept at full `u32` width so that out-of-range input
/// survives long enough to be rejected with a useful message.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OverrideRange {
  /// The chip type to designate the range as.
  pub chip: ChipType,
  /// The first address of the range.
  pub start: u32,
  /// The size of the range in bytes.
  pub size: u32,
}

impl fmt::Display for OverrideRange {
  /// Renders the flag text that produced this range, e.g.
  /// `--rom 0x800 0x2000`.
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "--{} {:#x} {:#x}", self.chip.name(), self.start, self.size)
  }
}

/// A validated memory map, as produced by [`build`].
///
/// [`build`]: fn.build.html
#[derive(Debug)]
pub struct MemoryMap {
  /// The map's packets, in ascending load-address order.
  pub packets: Vec<Packet<'static>>,
  /// True if user overrides were supplied but discarded because the hardware
  /// profile's memory map is fixed. Non-fatal; the caller should warn.
  pub ignored_overrides: bool,
}

/// An error produced while validating a memory map.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// Indicates that a range's load address lies outside the addressable
  /// window.
  AddressOutOfRange(OverrideRange),
  /// Indicates that a range's size is zero or runs past the end of the
  /// address space.
  SizeOutOfRange(OverrideRange),
  /// Indicates that two ranges intersect.
  Overlap {
    /// The lower of the two offending ranges.
    first: OverrideRange,
    /// The higher of the two offending ranges.
    second: OverrideRange,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::AddressOutOfRange(range) => write!(
        f,
        "load address {:#x} in \"{}\" is invalid; must be between {:#x} and 0xffff",
        range.start, range, BASE_ADDRESS
      ),
      Error::SizeOutOfRange(range) => write!(
        f,
        "size {:#x} in \"{}\" is invalid; must be between 0x1 and {:#x}",
        range.size,
        range,
        ADDRESS_LIMIT - range.start
      ),
      Error::Overlap { first, second } => {
        write!(f, "packet \"{}\" overlaps packet \"{}\"", second, first)
      }
    }
  }
}

/// Builds the memory map for `hardware`, applying `overrides` when the
/// profile allows a manual map.
///
/// With no overrides this is a copy of the profile's default map. Overrides
/// supplied for a profile with a fixed map are discarded, which is reported
/// through [`MemoryMap::ignored_overrides`] rather than as an error. An
/// override map is validated: every range must lie within the addressable
/// window, and no two ranges may intersect.
///
/// The returned packets are sorted ascending by load address regardless of
/// input order.
///
/// [`MemoryMap::ignored_overrides`]: struct.MemoryMap.html#structfield.ignored_overrides
pub fn build(
  hardware: &HardwareType,
  overrides: &[OverrideRange],
) -> Result<MemoryMap, Error> {
  if overrides.is_empty() {
    return Ok(MemoryMap {
      packets: hardware.packets.to_vec(),
      ignored_overrides: false,
    });
  }
  if !hardware.manual_memory_map {
    return Ok(MemoryMap {
      packets: hardware.packets.to_vec(),
      ignored_overrides: true,
    });
  }

  for range in overrides {
    if range.start < BASE_ADDRESS as u32 || range.start >= ADDRESS_LIMIT {
      return Err(Error::AddressOutOfRange(*range));
    }
    if range.size < 1 || range.size > ADDRESS_LIMIT - range.start {
      return Err(Error::SizeOutOfRange(*range));
    }
  }

  let mut packets = overrides
    .iter()
    .map(|range| {
      Packet::reserve(range.chip, range.start as u16, range.size as u16)
    })
    .collect::<Vec<_>>();
  packets.sort_by_key(|packet| packet.load_address);

  // Once sorted by start address, any intersection anywhere implies an
  // intersection between some adjacent pair, so one pass suffices.
  for pair in packets.windows(2) {
    let end = pair[0].load_address as u32 + pair[0].image_size as u32;
    if (pair[1].load_address as u32) < end {
      return Err(Error::Overlap {
        first: range_of(&pair[0]),
        second: range_of(&pair[1]),
      });
    }
  }

  Ok(MemoryMap {
    packets,
    ignored_overrides: false,
  })
}

fn range_of(packet: &Packet<'_>) -> OverrideRange {
  OverrideRange {
    chip: packet.chip_type,
    start: packet.load_address as u32,
    size: packet.image_size as u32,
  }
}

/// Binds a memory map to the bytes of the input image.
///
/// Byte 0 of the image corresponds to address [`BASE_ADDRESS`]. Each
/// data-bearing packet takes the slice of the image its address range covers;
/// a packet whose range begins past the end of the image is dropped, and one
/// whose declared size overruns the image is clipped, with `image_size`
/// rewritten to the actual slice length. Dataless packets pass through
/// untouched. A short image is legitimate input, so this never fails.
///
/// Packet order is preserved.
///
/// [`BASE_ADDRESS`]: constant.BASE_ADDRESS.html
pub fn materialize<'img>(
  packets: Vec<Packet<'static>>,
  image: &'img [u8],
) -> Vec<Packet<'img>> {
  let mut materialized: Vec<Packet<'img>> = Vec::with_capacity(packets.len());
  for packet in packets {
    if !packet.chip_type.has_data() {
      materialized.push(packet);
      continue;
    }

    let offset = (packet.load_address - BASE_ADDRESS) as usize;
    if offset >= image.len() {
      continue;
    }

    let len = (packet.image_size as usize).min(image.len() - offset);
    materialized.push(Packet {
      chip_type: packet.chip_type,
      bank_number: packet.bank_number,
      load_address: packet.load_address,
      image_size: len as u16,
      data: Some(&image[offset..offset + len]),
    });
  }
  materialized
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::hardware;

  fn rom(start: u32, size: u32) -> OverrideRange {
    OverrideRange {
      chip: ChipType::Rom,
      start,
      size,
    }
  }

  fn ram(start: u32, size: u32) -> OverrideRange {
    OverrideRange {
      chip: ChipType::Ram,
      start,
      size,
    }
  }

  fn flashcart() -> &'static HardwareType {
    hardware::by_id(5).unwrap()
  }

  fn image(len: usize) -> Vec<u8> {
    (0..len).map(|n| n as u8).collect()
  }

  #[test]
  fn defaults_pass_through_unmodified() {
    for hardware in &hardware::HARDWARE_TYPES {
      let map = build(hardware, &[]).unwrap();
      assert!(!map.ignored_overrides);
      assert_eq!(map.packets, hardware.packets);
    }
  }

  #[test]
  fn overrides_ignored_for_fixed_profiles() {
    let hardware = hardware::by_id(2).unwrap();
    let map = build(hardware, &[rom(0x800, 0x1000)]).unwrap();
    assert!(map.ignored_overrides);
    assert_eq!(map.packets, hardware.packets);
  }

  #[test]
  fn overrides_sorted_by_address() {
    let overrides =
      [rom(0x3000, 0x1000), ram(0x2800, 0x800), rom(0x800, 0x2000)];
    let map = build(flashcart(), &overrides).unwrap();
    assert!(!map.ignored_overrides);
    let starts = map
      .packets
      .iter()
      .map(|packet| packet.load_address)
      .collect::<Vec<_>>();
    assert_eq!(starts, [0x800, 0x2800, 0x3000]);
  }

  #[test]
  fn address_below_window() {
    let err = build(flashcart(), &[rom(0x7ff, 0x100)]).unwrap_err();
    assert_eq!(err, Error::AddressOutOfRange(rom(0x7ff, 0x100)));
  }

  #[test]
  fn address_above_window() {
    let err = build(flashcart(), &[rom(0x10000, 0x100)]).unwrap_err();
    assert_eq!(err, Error::AddressOutOfRange(rom(0x10000, 0x100)));
  }

  #[test]
  fn zero_size() {
    let err = build(flashcart(), &[rom(0x800, 0)]).unwrap_err();
    assert_eq!(err, Error::SizeOutOfRange(rom(0x800, 0)));
  }

  #[test]
  fn size_past_address_space() {
    // 0xff00 + 0x200 = 0x10100, which wraps past the end of the address
    // space.
    let err = build(flashcart(), &[rom(0xff00, 0x200)]).unwrap_err();
    assert_eq!(err, Error::SizeOutOfRange(rom(0xff00, 0x200)));
  }

  #[test]
  fn size_filling_remaining_space_is_legal() {
    let map = build(flashcart(), &[rom(0xff00, 0x100)]).unwrap();
    assert_eq!(map.packets.len(), 1);
    assert_eq!(map.packets[0].image_size, 0x100);
  }

  #[test]
  fn overlapping_ranges() {
    // 0x1800 < 0x800 + 0x2000.
    let err =
      build(flashcart(), &[rom(0x800, 0x2000), ram(0x1800, 0x800)])
        .unwrap_err();
    assert_eq!(
      err,
      Error::Overlap {
        first: rom(0x800, 0x2000),
        second: ram(0x1800, 0x800),
      }
    );
  }

  #[test]
  fn duplicate_ranges() {
    let err =
      build(flashcart(), &[rom(0x800, 0x800), rom(0x800, 0x800)]).unwrap_err();
    assert_eq!(
      err,
      Error::Overlap {
        first: rom(0x800, 0x800),
        second: rom(0x800, 0x800),
      }
    );
  }

  #[test]
  fn overlap_between_middle_neighbors() {
    // The overlapping pair here is the 2nd and 3rd in sorted order; every
    // adjacent pair must be checked, not every other one.
    let overrides =
      [rom(0x800, 0x800), rom(0x1000, 0x800), ram(0x1400, 0x400)];
    let err = build(flashcart(), &overrides).unwrap_err();
    assert_eq!(
      err,
      Error::Overlap {
        first: rom(0x1000, 0x800),
        second: ram(0x1400, 0x400),
      }
    );
  }

  #[test]
  fn abutting_ranges_are_legal() {
    let map =
      build(flashcart(), &[rom(0x800, 0x2000), ram(0x2800, 0x800)]).unwrap();
    assert_eq!(map.packets.len(), 2);
  }

  #[test]
  fn materialize_full_image() {
    let image = image(0xf800);
    let map = build(hardware::by_id(2).unwrap(), &[]).unwrap();
    let packets = materialize(map.packets, &image);

    assert_eq!(packets.len(), 3);

    assert_eq!(packets[0].chip_type, ChipType::Rom);
    assert_eq!(packets[0].image_size, 0x2000);
    assert_eq!(packets[0].data, Some(&image[..0x2000]));

    assert_eq!(packets[1].chip_type, ChipType::Ram);
    assert_eq!(packets[1].image_size, 0x800);
    assert_eq!(packets[1].data, None);

    assert_eq!(packets[2].chip_type, ChipType::Rom);
    assert_eq!(packets[2].image_size, 0xc800);
    assert_eq!(packets[2].data, Some(&image[0x2800..0xf000]));
  }

  #[test]
  fn materialize_clips_short_image() {
    let image = image(0x1000);
    let map = build(flashcart(), &[rom(0x800, 0x2000)]).unwrap();
    let packets = materialize(map.packets, &image);

    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].image_size, 0x1000);
    assert_eq!(packets[0].data, Some(&image[..]));
  }

  #[test]
  fn materialize_drops_packets_past_the_image() {
    // The second ROM starts at image offset 0x2800, past the end of a
    // 0x2000-byte image, so it is dropped; the RAM reservation survives.
    let image = image(0x2000);
    let map = build(hardware::by_id(2).unwrap(), &[]).unwrap();
    let packets = materialize(map.packets, &image);

    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].chip_type, ChipType::Rom);
    assert_eq!(packets[0].image_size, 0x2000);
    assert_eq!(packets[1].chip_type, ChipType::Ram);
  }

  #[test]
  fn materialize_empty_image_keeps_only_dataless_packets() {
    let map = build(hardware::by_id(2).unwrap(), &[]).unwrap();
    let packets = materialize(map.packets, &[]);

    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].chip_type, ChipType::Ram);
  }
}

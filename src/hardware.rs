//! Cartridge hardware profiles.
//!
//! A hardware profile names a real or hypothetical Channel F cartridge
//! revision and fixes its default memory map. Most profiles are rigid: the
//! cartridge was manufactured with a fixed chip layout, so a user-supplied
//! memory map makes no sense for them and is ignored. The flashcart profile
//! is the one exception; its layout is entirely reprogrammable, so it honors
//! manual override ranges.
//!
//! The profile table is a compile-time constant. Profile ids double as the
//! hardware type field of the serialized container.

use crate::chip::ChipType;
use crate::map::Packet;

/// A named cartridge hardware preset.
#[derive(Debug)]
pub struct HardwareType {
  /// The on-disk id of this hardware type.
  pub id: u16,
  /// The human-readable name of this hardware type.
  pub name: &'static str,
  /// The default memory map, in ascending load-address order. Addresses and
  /// sizes only; no packet here ever carries data.
  pub packets: &'static [Packet<'static>],
  /// Whether this profile honors user-supplied override ranges.
  pub manual_memory_map: bool,
}

/// Every known hardware profile, in id order.
pub static HARDWARE_TYPES: [HardwareType; 6] = [
  HardwareType {
    id: 0,
    name: "Videocart",
    packets: &[Packet::reserve(ChipType::Rom, 0x800, 0xf800)],
    manual_memory_map: false,
  },
  HardwareType {
    id: 1,
    name: "Videocart 10/18 (with 2102 SRAM)",
    packets: &[Packet::reserve(ChipType::Rom, 0x800, 0xf800)],
    manual_memory_map: false,
  },
  HardwareType {
    id: 2,
    name: "ROM + RAM (with 3853 SMI)",
    packets: &[
      Packet::reserve(ChipType::Rom, 0x800, 0x2000),
      Packet::reserve(ChipType::Ram, 0x2800, 0x800),
      Packet::reserve(ChipType::Rom, 0x3000, 0xc800),
    ],
    manual_memory_map: false,
  },
  HardwareType {
    id: 3,
    name: "SABA Videoplay 20",
    packets: &[
      Packet::reserve(ChipType::Rom, 0x800, 0x2000),
      Packet::reserve(ChipType::Ram, 0x2800, 0x800),
      Packet::reserve(ChipType::Rom, 0x3000, 0x800),
      Packet::reserve(ChipType::Led, 0x3800, 0x800),
      Packet::reserve(ChipType::Rom, 0x4000, 0xb800),
    ],
    manual_memory_map: false,
  },
  // Multi-cart images span several banks; single-bank conversion has no
  // default layout for them.
  HardwareType {
    id: 4,
    name: "Multi-Cart",
    packets: &[],
    manual_memory_map: false,
  },
  HardwareType {
    id: 5,
    name: "Flashcart",
    packets: &[
      Packet::reserve(ChipType::Rom, 0x800, 0x2000),
      Packet::reserve(ChipType::Ram, 0x2800, 0x800),
      Packet::reserve(ChipType::Rom, 0x3000, 0xc800),
    ],
    manual_memory_map: true,
  },
];

/// Looks up a hardware profile by id.
pub fn by_id(id: u16) -> Option<&'static HardwareType> {
  HARDWARE_TYPES.iter().find(|hardware| hardware.id == id)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn lookup_by_id() {
    for id in 0..6 {
      let hardware = by_id(id).unwrap();
      assert_eq!(hardware.id, id);
    }
    assert!(by_id(6).is_none());
    assert!(by_id(0xffff).is_none());
  }

  #[test]
  fn only_the_flashcart_is_manual() {
    for hardware in &HARDWARE_TYPES {
      assert_eq!(hardware.manual_memory_map, hardware.id == 5);
    }
  }

  #[test]
  fn default_maps_are_sorted_and_disjoint() {
    for hardware in &HARDWARE_TYPES {
      for pair in hardware.packets.windows(2) {
        let end = pair[0].load_address as u32 + pair[0].image_size as u32;
        assert!(
          (pair[1].load_address as u32) >= end,
          "profile {} has overlapping defaults",
          hardware.id
        );
      }
      for packet in hardware.packets {
        let end = packet.load_address as u32 + packet.image_size as u32;
        assert!(packet.load_address >= 0x800);
        assert!(packet.image_size >= 1);
        assert!(end <= 0x10000);
      }
    }
  }

  #[test]
  fn rom_ram_smi_layout() {
    let hardware = by_id(2).unwrap();
    let expected = [
      (ChipType::Rom, 0x800, 0x2000),
      (ChipType::Ram, 0x2800, 0x800),
      (ChipType::Rom, 0x3000, 0xc800),
    ];
    assert_eq!(hardware.packets.len(), expected.len());
    for (packet, &(chip, start, size)) in
      hardware.packets.iter().zip(expected.iter())
    {
      assert_eq!(packet.chip_type, chip);
      assert_eq!(packet.load_address, start);
      assert_eq!(packet.image_size, size);
      assert_eq!(packet.bank_number, 0);
      assert!(packet.data.is_none());
    }
  }
}

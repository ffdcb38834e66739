//! The `.chf` container format and its serializer.
//!
//! A container is a fixed-layout file header followed by one record per
//! packet. All multi-byte integers are little-endian, and both the header
//! and every packet record are zero-padded to a multiple of 16 bytes, so a
//! loader can walk the records without re-parsing variable offsets.
//!
//! ```text
//! header:
//!   magic             16 bytes   "CHANNEL F       "
//!   header length      4 bytes   33 + title length, rounded up to 16
//!   version minor      1 byte
//!   version major      1 byte
//!   hardware type      2 bytes
//!   reserved           8 bytes   zero
//!   title length       1 byte    encoded length minus one
//!   title         1..=256 bytes  UTF-8
//!   padding        0..=15 bytes  zero
//!
//! packet record (one per packet, in map order):
//!   magic              4 bytes   "CHIP"
//!   record length      4 bytes   16 + data length, rounded up to 16
//!   chip type          2 bytes
//!   bank number        2 bytes
//!   load address       2 bytes
//!   data length        2 bytes   the possibly-clipped image size
//!   data        0..=63488 bytes  only for data-bearing chip types
//!   padding        0..=15 bytes  zero
//! ```
//!
//! Dataless records are exactly 16 bytes: their data length field still
//! reports the size of the reservation, but no data or padding follows and
//! the record length field says so.
//!
//! There is no deserializer; this tool only ever writes containers.

use std::fmt;
use std::io;

use crate::map::Packet;

/// The file header magic.
pub const MAGIC: &[u8; 16] = b"CHANNEL F       ";

/// The packet record magic.
pub const PACKET_MAGIC: &[u8; 4] = b"CHIP";

/// The container format version written by this crate, as `(major, minor)`.
pub const FORMAT_VERSION: (u8, u8) = (1, 0);

/// A complete container, ready to serialize.
///
/// Assembled once per conversion run and never mutated afterwards.
#[derive(Debug)]
pub struct Chf<'img> {
  hardware_type: u16,
  version: (u8, u8),
  title: String,
  extra: Option<String>,
  packets: Vec<Packet<'img>>,
}

/// An error produced while assembling a container.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// Indicates that a title's UTF-8 encoding does not fit the one-byte
  /// length-minus-one field: it is empty, or longer than 256 bytes.
  BadTitleLength(usize),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::BadTitleLength(len) => write!(
        f,
        "title must encode to between 1 and 256 bytes of UTF-8, not {}",
        len
      ),
    }
  }
}

impl<'img> Chf<'img> {
  /// Assembles a container from a materialized memory map.
  ///
  /// The title is rejected, not truncated, if its UTF-8 encoding is empty or
  /// exceeds 256 bytes; multi-byte characters count by their encoded length.
  pub fn new(
    hardware_type: u16,
    title: String,
    packets: Vec<Packet<'img>>,
  ) -> Result<Self, Error> {
    if title.is_empty() || title.len() > 256 {
      return Err(Error::BadTitleLength(title.len()));
    }
    Ok(Chf {
      hardware_type,
      version: FORMAT_VERSION,
      title,
      extra: None,
      packets,
    })
  }

  /// Returns the hardware type id this container declares.
  pub fn hardware_type(&self) -> u16 {
    self.hardware_type
  }

  /// Returns the format version this container declares, as
  /// `(major, minor)`.
  pub fn version(&self) -> (u8, u8) {
    self.version
  }

  /// Returns the game title.
  pub fn title(&self) -> &str {
    &self.title
  }

  /// Returns the extra string, a field the format reserves but does not yet
  /// define a use for.
  pub fn extra(&self) -> Option<&str> {
    self.extra.as_deref()
  }

  /// Returns the container's packets, in map order.
  pub fn packets(&self) -> &[Packet<'img>] {
    &self.packets
  }

  /// Serializes this container to `w`.
  ///
  /// The layout computation itself cannot fail; any error is a write error
  /// from `w`, and the bytes written before it are not unwound. Callers that
  /// need atomicity must write to a temporary location and rename.
  pub fn write_to(&self, mut w: impl io::Write) -> io::Result<()> {
    let header_len = align16(33 + self.title.len());
    w.write_all(MAGIC)?;
    w.write_all(&(header_len as u32).to_le_bytes())?;
    w.write_all(&[self.version.1, self.version.0])?;
    w.write_all(&self.hardware_type.to_le_bytes())?;
    w.write_all(&[0; 8])?;
    w.write_all(&[(self.title.len() - 1) as u8])?;
    w.write_all(self.title.as_bytes())?;
    write_padding(&mut w, header_len - 33 - self.title.len())?;

    for packet in &self.packets {
      let data = packet.data.unwrap_or(&[]);
      let record_len = align16(16 + data.len());
      w.write_all(PACKET_MAGIC)?;
      w.write_all(&(record_len as u32).to_le_bytes())?;
      w.write_all(&packet.chip_type.id().to_le_bytes())?;
      w.write_all(&packet.bank_number.to_le_bytes())?;
      w.write_all(&packet.load_address.to_le_bytes())?;
      w.write_all(&packet.image_size.to_le_bytes())?;
      w.write_all(data)?;
      write_padding(&mut w, record_len - 16 - data.len())?;
    }

    Ok(())
  }
}

/// Rounds `n` up to the next multiple of 16.
fn align16(n: usize) -> usize {
  (n + 15) & !15
}

fn write_padding(w: &mut impl io::Write, len: usize) -> io::Result<()> {
  const ZEROES: [u8; 16] = [0; 16];
  w.write_all(&ZEROES[..len])
}

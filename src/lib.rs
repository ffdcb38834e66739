//! BIN2CHF, a converter from raw Channel F ROM images to .chf containers.
//!
//! A raw `.bin` image is just a flat blob; the `.chf` container describes how
//! that blob maps onto the memory-mapped hardware of a Channel F cartridge.
//! Conversion runs in three stages:
//!
//! 1. [`map::build`] turns a hardware profile (and, for the flashcart
//!    profile, user-supplied override ranges) into a validated set of
//!    non-overlapping memory packets.
//! 2. [`map::materialize`] binds those packets to the bytes of the input
//!    image, clipping or dropping packets the image is too short to fill.
//! 3. [`chf::Chf::write_to`] serializes the finished container into the
//!    padded, versioned on-disk format.
//!
//! [`map::build`]: map/fn.build.html
//! [`map::materialize`]: map/fn.materialize.html
//! [`chf::Chf::write_to`]: chf/struct.Chf.html#method.write_to

#![deny(missing_docs)]
#![deny(unused)]
#![deny(warnings)]
#![deny(unsafe_code)]

pub mod chf;
pub mod chip;
pub mod cli;
pub mod hardware;
pub mod map;

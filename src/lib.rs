//! This is a Rust library for decoding the structure of raw media images
//! (floppy disk dumps, tape images, raw block devices) for forensic
//! examination.  It does not know any particular filesystem; it provides the
//! engine that format-specific parsers are built on.
//!
//! Features:
//!
//! * Claim byte ranges of an image as typed regions, with overlapping claims
//!   rejected.
//! * Enumerate what remains unclaimed, so heuristic parsers can search the
//!   leftover space for recognizable structures.
//! * Declare binary records as ordered, typed fields (little-, big-, PDP- and
//!   word-swapped integers, fixed-width text, nested structs, arrays).
//! * Decode text through configurable character tables (`TypeCase`), with
//!   per-byte validity, so filename candidates can be checked cheaply.
//! * Render an annotated dump of an entire image: claimed regions interleaved
//!   with hexdumped or collapsed filler, tagged with the physical sector or
//!   block each line starts in.
//! * A sample `octdump` program for examining images from the command line.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use octetview::datastruct::{text_rstrip, Layout, LE16, OCTET};
//! use octetview::{OctetView, TypeCase, ViewOptions};
//!
//! let mut image = vec![0u8; 64];
//! image[0x20..0x2c].copy_from_slice(b"\x01HELLO   \x05\x00\x00");
//!
//! let dirent = Layout::new("DirEnt")
//!     .field("status", OCTET)
//!     .field("name", text_rstrip(8))
//!     .field("size", LE16);
//!
//! let mut view = OctetView::new(&image, Arc::new(TypeCase::ascii()), ViewOptions::default()).unwrap();
//! let entry = view.claim_structure(0x20, &dirent).unwrap();
//! assert_eq!(entry.text("name").unwrap().short(), "HELLO");
//! assert_eq!(entry.uint("size").unwrap(), 5);
//!
//! for line in view.render() {
//!     println!("{}", line);
//! }
//! ```
//!
//! # Design
//!
//! The library is built in layers:
//!
//! 1. `TypeCase` maps byte values to display glyphs and validity flags.
//! 2. `bintree::IntervalTree` holds non-overlapping leaves over an address
//!    space and computes the gaps between them.
//! 3. `datastruct` reads typed fields and structs into `Region`s, which are
//!    the leaves a view holds.
//! 4. `OctetView` ties one artifact, one type case and one tree together
//!    into a decoding session.
//!
//! Images are never written.  A parser that decides an image is not in its
//! format simply drops its view.

pub mod bintree;
pub mod datastruct;
mod error;
pub mod typecase;
mod util;
pub mod view;

pub use crate::error::OctetError;
pub use crate::typecase::{Census, Flags, Parity, Slug, TypeCase};
pub use crate::util::{hexdump, hexdump_lines, printable_ascii};
pub use crate::view::{
    Artifact, Chs, Disk, Geometry, Image, OctetView, Record, RecordKey, ViewOptions,
};

//! Declarative description of binary records.
//!
//! A record type is a `Layout`: an ordered list of named, typed fields (plus
//! anonymous padding).  Reading a layout at an offset produces a `Region`
//! whose fields are laid out back to back from that offset, so the record's
//! extent is known without any offset arithmetic by the caller:
//!
//! ```
//! use std::sync::Arc;
//! use octetview::datastruct::{array, read, text_rstrip, Layout, LE16, OCTET};
//! use octetview::TypeCase;
//!
//! let dirent = Layout::new("DirEnt")
//!     .field("user", OCTET)
//!     .field("name", text_rstrip(8))
//!     .pad(3)
//!     .field("blocks", array(2, LE16));
//!
//! let bytes = b"\x00README  \xff\xff\xff\x10\x00\x11\x00";
//! let typecase = Arc::new(TypeCase::ascii());
//! let entry = read(bytes, &typecase, 0, &dirent.into_type(), None).unwrap();
//! assert_eq!(entry.text("name").unwrap().short(), "README");
//! assert_eq!(entry["blocks"].elements()[1].as_uint(), Some(0x11));
//! ```
//!
//! When the shape of a record depends on values inside it, use a
//! `StructBuilder` and declare fields one at a time.

mod builder;
mod field;
mod numeric;
mod region;

pub use self::builder::{read, StructBuilder};
pub use self::field::{
    array, octets, text, text_rstrip, uint, Decl, FieldType, Layout, BE16, BE24, BE32, BE64, LE16,
    LE24, LE32, LE64, OCTET, PDP32, SWAP32, UINT8,
};
pub use self::numeric::{read_uint, Endian};
pub use self::region::{Kind, Region, Text};

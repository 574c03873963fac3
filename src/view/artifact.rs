use std::fmt;
use std::io;

use crate::error::OctetError;

/// The structural address of a physical record on the underlying medium.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    /// A disk sector.
    Chs {
        cylinder: u32,
        head: u32,
        sector: u32,
    },
    /// A fixed-size block, numbered from zero.
    Block(usize),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordKey::Chs {
                cylinder,
                head,
                sector,
            } => write!(f, "({},{},{})", cylinder, head, sector),
            RecordKey::Block(block) => write!(f, "#{}", block),
        }
    }
}

/// A physical record: a keyed byte interval `[lo, hi)` of an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: RecordKey,
    pub lo: usize,
    pub hi: usize,
}

impl Record {
    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        self.lo <= offset && offset < self.hi
    }
}

/// Fail with `OutOfRange` unless `[lo, hi)` lies within `[0, len)`.
pub fn check_range(lo: usize, hi: usize, len: usize) -> io::Result<()> {
    if lo > hi || hi > len {
        Err(OctetError::OutOfRange { lo, hi, len }.into())
    } else {
        Ok(())
    }
}

/// An immutable, randomly addressable byte sequence: one disk or tape image,
/// or an extent of one.
pub trait Artifact {
    /// Total length in bytes.
    fn len(&self) -> usize;

    /// The bytes `[lo, hi)`.  Fails with `OutOfRange` past the end.
    fn bytes(&self, lo: usize, hi: usize) -> io::Result<&[u8]>;

    /// Physical records in ascending offset order.  Media without natural
    /// record boundaries return none and are treated as one flat byte space.
    fn records(&self) -> Vec<Record> {
        Vec::new()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn byte(&self, offset: usize) -> io::Result<u8> {
        let hi = offset.checked_add(1).ok_or(OctetError::OutOfRange {
            lo: offset,
            hi: offset,
            len: self.len(),
        })?;
        Ok(self.bytes(offset, hi)?[0])
    }
}

impl Artifact for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn bytes(&self, lo: usize, hi: usize) -> io::Result<&[u8]> {
        check_range(lo, hi, <[u8]>::len(self))?;
        Ok(&self[lo..hi])
    }
}

impl Artifact for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn bytes(&self, lo: usize, hi: usize) -> io::Result<&[u8]> {
        Artifact::bytes(self.as_slice(), lo, hi)
    }
}

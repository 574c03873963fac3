use std::io;
use std::path::Path;

use crate::error::OctetError;
use crate::view::artifact::{Artifact, Record, RecordKey};
use crate::view::image::Image;

/// Cylinder/head/sector layout of a disk image.  Sectors are stored in the
/// image in physical order: cylinder by cylinder, head by head, slot by
/// slot.  The interleave table, if any, gives the logical sector number
/// recorded in each physical slot of a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chs {
    pub cylinders: u32,
    pub heads: u32,
    pub sectors: u32,
    pub sector_size: usize,
    /// Number of the first sector in a track (commonly 0 or 1).
    pub first_sector: u32,
    interleave: Option<Vec<u32>>,
    /// Bytes preceding the first sector (e.g. an image file header).
    pub offset: usize,
}

impl Chs {
    pub fn new(cylinders: u32, heads: u32, sectors: u32, sector_size: usize) -> Chs {
        Chs {
            cylinders,
            heads,
            sectors,
            sector_size,
            first_sector: 0,
            interleave: None,
            offset: 0,
        }
    }

    pub fn first_sector(mut self, first_sector: u32) -> Chs {
        self.first_sector = first_sector;
        self
    }

    /// Panics unless the table has one entry per sector slot.
    pub fn interleave(mut self, table: &[u32]) -> Chs {
        assert_eq!(
            table.len(),
            self.sectors as usize,
            "interleave table must cover every sector of a track"
        );
        self.interleave = Some(table.to_vec());
        self
    }

    pub fn offset(mut self, offset: usize) -> Chs {
        self.offset = offset;
        self
    }

    pub fn interleave_table(&self) -> Option<&[u32]> {
        self.interleave.as_deref()
    }

    /// Logical sector number recorded in physical slot `slot`.  Slots past
    /// the end of the interleave table (`sectors` raised after it was set)
    /// are numbered sequentially.
    fn sector_in_slot(&self, slot: u32) -> u32 {
        self.interleave
            .as_ref()
            .and_then(|table| table.get(slot as usize).copied())
            .unwrap_or_else(|| self.first_sector.wrapping_add(slot))
    }

    fn track_offset(&self, cylinder: u32, head: u32) -> usize {
        self.offset
            + ((cylinder as usize * self.heads as usize + head as usize)
                * self.sectors as usize
                * self.sector_size)
    }

    /// Byte offset of a logical sector.
    pub fn sector_offset(&self, cylinder: u32, head: u32, sector: u32) -> Option<usize> {
        if cylinder >= self.cylinders || head >= self.heads {
            return None;
        }
        let slot = (0..self.sectors).find(|slot| self.sector_in_slot(*slot) == sector)?;
        Some(self.track_offset(cylinder, head) + slot as usize * self.sector_size)
    }

    pub fn size(&self) -> usize {
        self.track_offset(self.cylinders, 0)
    }
}

/// How an artifact is divided into physical records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Geometry {
    Chs(Chs),
    /// Fixed-size blocks from offset zero; a short trailing block is kept.
    Blocks(usize),
}

impl Geometry {
    /// Given an image size, return the first geometry of exactly that size.
    pub fn find_by_size<'a>(size: usize, geometries: &'a [Geometry]) -> Option<&'a Geometry> {
        geometries.iter().find(|g| g.size() == Some(size))
    }

    /// The image size this geometry describes, if fixed.
    pub fn size(&self) -> Option<usize> {
        match self {
            Geometry::Chs(chs) => Some(chs.size()),
            Geometry::Blocks(_) => None,
        }
    }

    /// Fail unless an artifact of `len` bytes holds every record.
    pub fn check(&self, len: usize) -> io::Result<()> {
        match self {
            Geometry::Chs(chs) if chs.size() > len => Err(OctetError::Geometry.into()),
            Geometry::Blocks(0) => Err(OctetError::Geometry.into()),
            _ => Ok(()),
        }
    }

    /// Enumerate the physical records of an artifact of `len` bytes, in
    /// ascending offset order.
    pub fn records(&self, len: usize) -> Vec<Record> {
        match self {
            Geometry::Chs(chs) => {
                let mut records = Vec::with_capacity(
                    chs.cylinders as usize * chs.heads as usize * chs.sectors as usize,
                );
                for cylinder in 0..chs.cylinders {
                    for head in 0..chs.heads {
                        let track = chs.track_offset(cylinder, head);
                        for slot in 0..chs.sectors {
                            let lo = track + slot as usize * chs.sector_size;
                            let hi = lo + chs.sector_size;
                            if hi > len {
                                return records;
                            }
                            records.push(Record {
                                key: RecordKey::Chs {
                                    cylinder,
                                    head,
                                    sector: chs.sector_in_slot(slot),
                                },
                                lo,
                                hi,
                            });
                        }
                    }
                }
                records
            }
            Geometry::Blocks(0) => Vec::new(),
            Geometry::Blocks(block_size) => (0..len)
                .step_by(*block_size)
                .enumerate()
                .map(|(block, lo)| Record {
                    key: RecordKey::Block(block),
                    lo,
                    hi: (lo + block_size).min(len),
                })
                .collect(),
        }
    }
}

/// An artifact divided into physical records by a geometry.
pub struct Disk<A> {
    artifact: A,
    geometry: Geometry,
}

impl<A: Artifact> Disk<A> {
    pub fn new(artifact: A, geometry: Geometry) -> io::Result<Disk<A>> {
        geometry.check(artifact.len())?;
        Ok(Disk { artifact, geometry })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn into_inner(self) -> A {
        self.artifact
    }
}

impl Disk<Image> {
    /// Open an image file, checking it against a geometry.
    pub fn open<P: AsRef<Path>>(path: P, geometry: Geometry) -> io::Result<Disk<Image>> {
        Disk::new(Image::open(path)?, geometry)
    }
}

impl<A: Artifact> Artifact for Disk<A> {
    fn len(&self) -> usize {
        self.artifact.len()
    }

    fn bytes(&self, lo: usize, hi: usize) -> io::Result<&[u8]> {
        self.artifact.bytes(lo, hi)
    }

    fn records(&self) -> Vec<Record> {
        self.geometry.records(self.artifact.len())
    }
}

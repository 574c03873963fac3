//! Per-artifact decoding sessions.
//!
//! An `OctetView` wraps one artifact, one `TypeCase` and one interval tree.
//! Format-specific code claims typed regions as it discovers them, asks which
//! byte ranges are still unclaimed, and finally renders the whole artifact as
//! an annotated dump: every claimed region in its own rendering, the space
//! between them as filler, and each line tagged with the physical record
//! (e.g. disk sector) it starts in.

mod artifact;
mod geometry;
mod image;

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::debug;

use crate::bintree::{filler, Gap, Gaps, IntervalTree, Item, Items, Leaf};
use crate::datastruct::{self, FieldType, Layout, Region, StructBuilder};
use crate::typecase::TypeCase;

pub use self::artifact::{check_range, Artifact, Record, RecordKey};
pub use self::geometry::{Chs, Disk, Geometry};
pub use self::image::Image;

/// Rendering options for a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOptions {
    /// Bytes shown per hexdump line.
    pub width: usize,
    /// Prefix lines with the key of the record they start in.
    pub show_keys: bool,
}

impl Default for ViewOptions {
    fn default() -> ViewOptions {
        ViewOptions {
            width: 16,
            show_keys: true,
        }
    }
}

pub struct OctetView<'a> {
    bytes: &'a [u8],
    records: Vec<Record>,
    key_width: usize,
    tree: IntervalTree<Region>,
    typecase: Arc<TypeCase>,
    options: ViewOptions,
}

impl<'a> OctetView<'a> {
    pub fn new<A: Artifact + ?Sized>(
        artifact: &'a A,
        typecase: Arc<TypeCase>,
        options: ViewOptions,
    ) -> io::Result<OctetView<'a>> {
        let bytes = artifact.bytes(0, artifact.len())?;
        let mut records = artifact.records();
        records.sort_by_key(|record| record.lo);
        let key_width = records
            .iter()
            .map(|record| record.key.to_string().len())
            .max()
            .unwrap_or(0);
        debug!(
            len = bytes.len(),
            records = records.len(),
            typecase = typecase.name(),
            "opened view"
        );
        Ok(OctetView {
            bytes,
            records,
            key_width,
            tree: IntervalTree::new(bytes.len()),
            typecase,
            options,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The artifact's contents.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn typecase(&self) -> &Arc<TypeCase> {
        &self.typecase
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    /// Physical records of the artifact in offset order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The record containing `offset`, if any.
    pub fn record_at(&self, offset: usize) -> Option<&Record> {
        let index = self.records.partition_point(|record| record.hi <= offset);
        self.records
            .get(index)
            .filter(|record| record.contains(offset))
    }

    /// Claim a region.  Fails without effect if it overlaps a region already
    /// claimed or extends past the end of the artifact.
    pub fn insert(&mut self, region: Region) -> io::Result<&Region> {
        self.tree.insert(region)
    }

    /// Read a single value at `lo` without claiming it.
    pub fn read(&self, lo: usize, field_type: &FieldType) -> io::Result<Region> {
        datastruct::read(self.bytes, &self.typecase, lo, field_type, None)
    }

    /// Read a single value at `lo` and claim it.
    pub fn claim(&mut self, lo: usize, field_type: &FieldType) -> io::Result<&Region> {
        let region = self.read(lo, field_type)?;
        self.insert(region)
    }

    /// Start a struct at `lo` whose fields are declared incrementally.  The
    /// builder does not borrow the view, so the finished region can be
    /// inserted directly.
    pub fn begin(&self, lo: usize, type_name: &str) -> StructBuilder<'a> {
        StructBuilder::new(self.bytes, self.typecase.clone(), lo, type_name)
    }

    /// Read a struct of a fixed layout at `lo` without claiming it.
    pub fn structure(&self, lo: usize, layout: &Layout) -> io::Result<Region> {
        let mut builder = self.begin(lo, layout.name());
        builder.fields(layout)?;
        Ok(builder.done())
    }

    /// Read a struct of a fixed layout at `lo` and claim it.
    pub fn claim_structure(&mut self, lo: usize, layout: &Layout) -> io::Result<&Region> {
        let region = self.structure(lo, layout)?;
        self.insert(region)
    }

    /// Claim `[lo, hi)` without decoding it.
    pub fn opaque(&mut self, lo: usize, hi: usize, label: &str) -> io::Result<&Region> {
        self.insert(Region::opaque(lo, hi, label))
    }

    /// Iterate claimed regions intersecting `[lo, hi)`.
    pub fn find(&self, lo: usize, hi: usize) -> impl Iterator<Item = &Region> + '_ {
        self.tree.find(lo, hi)
    }

    /// Iterate unclaimed intervals.
    pub fn gaps(&self) -> Gaps<'_, Region> {
        self.tree.gaps()
    }

    pub fn is_unclaimed(&self, lo: usize, hi: usize) -> bool {
        self.tree.is_unclaimed(lo, hi)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Region> + '_ {
        self.tree.leaves()
    }

    /// Number of bytes claimed.
    pub fn coverage(&self) -> usize {
        self.tree.coverage()
    }

    pub fn tree(&self) -> &IntervalTree<Region> {
        &self.tree
    }

    /// Render the whole artifact, one line at a time.
    pub fn render(&self) -> ViewRender<'_, 'a> {
        ViewRender {
            view: self,
            items: self.tree.items(),
            pending: VecDeque::new(),
        }
    }

    fn prefix(&self, key: Option<RecordKey>, lines: Vec<String>) -> Vec<String> {
        if !self.options.show_keys || self.key_width == 0 {
            return lines;
        }
        let key = key.map(|key| key.to_string()).unwrap_or_default();
        lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                let tag = if index == 0 { key.as_str() } else { "" };
                format!("{:<width$} {}", tag, line, width = self.key_width)
            })
            .collect()
    }

    /// Filler for a gap, split so that no chunk straddles a record boundary.
    fn fill(&self, gap: Gap) -> Vec<String> {
        let text = |bytes: &[u8]| self.typecase.decode(bytes);
        let width = self.options.width.max(1);
        let mut lines = vec![];
        let mut cursor = gap.lo;
        while cursor < gap.hi {
            let (hi, key) = match self.record_at(cursor) {
                Some(record) => (record.hi.min(gap.hi), Some(record.key)),
                None => {
                    let next = self.records.partition_point(|record| record.lo <= cursor);
                    let hi = self
                        .records
                        .get(next)
                        .map_or(gap.hi, |record| record.lo.min(gap.hi));
                    (hi, None)
                }
            };
            let chunk = filler(Gap::new(cursor, hi), self.bytes, width, &text);
            lines.extend(self.prefix(key, chunk));
            cursor = hi;
        }
        lines
    }
}

impl<'a> fmt::Debug for OctetView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OctetView")
            .field("len", &self.bytes.len())
            .field("records", &self.records.len())
            .field("typecase", &self.typecase.name())
            .field("tree", &self.tree)
            .finish()
    }
}

impl<'a> fmt::Display for OctetView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.render() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Lazily renders a view: claimed regions interleaved with filler, tagged
/// with record keys.
pub struct ViewRender<'v, 'a> {
    view: &'v OctetView<'a>,
    items: Items<'v, Region>,
    pending: VecDeque<String>,
}

impl<'v, 'a> Iterator for ViewRender<'v, 'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            let view = self.view;
            match self.items.next()? {
                Item::Leaf(region) => {
                    let key = view.record_at(region.lo()).map(|record| record.key);
                    let lines = region.render(view.options.width.max(1));
                    self.pending.extend(view.prefix(key, lines));
                }
                Item::Gap(gap) => self.pending.extend(view.fill(gap)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastruct::{text_rstrip, BE16, LE16, OCTET, UINT8};
    use crate::error::OctetError;

    fn ascii() -> Arc<TypeCase> {
        Arc::new(TypeCase::ascii())
    }

    #[test]
    fn test_claim_and_gaps() {
        let bytes: Vec<u8> = vec![0x34, 0x12, 0x12, 0x34, 0, 0, 0, 0];
        let mut view = OctetView::new(&bytes, ascii(), ViewOptions::default()).unwrap();
        assert_eq!(view.claim(0, &LE16).unwrap().as_uint(), Some(0x1234));
        assert_eq!(view.claim(2, &BE16).unwrap().as_uint(), Some(0x1234));
        let gaps: Vec<(usize, usize)> = view.gaps().map(Into::into).collect();
        assert_eq!(gaps, vec![(4, 8)]);
        assert_eq!(view.coverage(), 4);

        let error = view.claim(1, &LE16).unwrap_err();
        assert!(OctetError::is_overlap(&error));
        assert_eq!(view.leaves().count(), 2);

        assert!(view.is_unclaimed(4, 8));
        assert!(OctetError::is_out_of_range(&view.claim(7, &LE16).unwrap_err()));
        assert_eq!(view.find(0, 3).count(), 2);
    }

    #[test]
    fn test_begin_variant_record() {
        let bytes = b"\x03abc\xff";
        let mut view = OctetView::new(&bytes[..], ascii(), ViewOptions::default()).unwrap();
        let mut builder = view.begin(0, "Pascal");
        builder.field("length", &UINT8).unwrap();
        let length = builder.uint("length").unwrap() as usize;
        builder.field("chars", &text_rstrip(length)).unwrap();
        let region = view.insert(builder.done()).unwrap();
        assert_eq!(region.text("chars").unwrap().short(), "abc");
        assert_eq!(region.hi(), 4);
        assert_eq!(view.gaps().next(), Some(Gap::new(4, 5)));
    }

    #[test]
    fn test_structure() {
        let layout = Layout::new("Header").field("magic", BE16).field("kind", OCTET);
        let bytes = vec![0xca, 0xfe, 0x01, 0x00];
        let mut view = OctetView::new(&bytes, ascii(), ViewOptions::default()).unwrap();
        let region = view.structure(0, &layout).unwrap();
        assert_eq!(region.uint("magic").unwrap(), 0xcafe);
        assert!(view.is_unclaimed(0, 4));
        view.claim_structure(0, &layout).unwrap();
        assert!(!view.is_unclaimed(0, 1));
        view.opaque(3, 4, "trailer").unwrap();
        assert_eq!(view.coverage(), 4);
    }

    #[test]
    fn test_render_flat() {
        let mut bytes = vec![0u8; 32];
        bytes[16..20].copy_from_slice(b"DATA");
        let mut view = OctetView::new(&bytes, ascii(), ViewOptions::default()).unwrap();
        view.claim(0, &LE16).unwrap();
        let lines: Vec<String> = view.render().collect();
        assert_eq!(lines[0], "00000000: 0x0000 (0)");
        assert!(lines[1].starts_with("00000002: 00 00"));
        assert!(lines[1].ends_with('|'));
        assert!(lines[2].starts_with("00000012: 54 41 00"));
        assert_eq!(view.to_string().lines().count(), lines.len());
    }

    #[test]
    fn test_render_splits_gaps_at_records() {
        let disk = Disk::new(vec![0xe5u8; 32], Geometry::Blocks(8)).unwrap();
        let mut view = OctetView::new(&disk, ascii(), ViewOptions::default()).unwrap();
        assert_eq!(view.record_at(9).map(|r| r.key), Some(RecordKey::Block(1)));
        assert_eq!(view.record_at(32), None);

        view.opaque(12, 20, "payload").unwrap();
        let lines: Vec<String> = view.render().collect();
        assert_eq!(
            lines,
            vec![
                "#0 00000000: [8 × 0xe5] [0x00000000, 0x00000008)",
                "#1 00000008: [4 × 0xe5] [0x00000008, 0x0000000c)",
                "#1 0000000c: <payload> (8 bytes)",
                "#2 00000014: [4 × 0xe5] [0x00000014, 0x00000018)",
                "#3 00000018: [8 × 0xe5] [0x00000018, 0x00000020)",
            ]
        );

        let options = ViewOptions {
            show_keys: false,
            ..ViewOptions::default()
        };
        let view = OctetView::new(&disk, ascii(), options).unwrap();
        assert_eq!(
            view.render().collect::<Vec<_>>(),
            vec![
                "00000000: [8 × 0xe5] [0x00000000, 0x00000008)",
                "00000008: [8 × 0xe5] [0x00000008, 0x00000010)",
                "00000010: [8 × 0xe5] [0x00000010, 0x00000018)",
                "00000018: [8 × 0xe5] [0x00000018, 0x00000020)",
            ]
        );
    }

    #[test]
    fn test_render_pads_keys() {
        let geometry = Geometry::Chs(Chs::new(1, 1, 2, 4).offset(2));
        let disk = Disk::new(vec![0u8; 10], geometry).unwrap();
        let view = OctetView::new(&disk, ascii(), ViewOptions::default()).unwrap();
        let lines: Vec<String> = view.render().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("        00000000: [2 × 0x00]"));
        assert!(lines[1].starts_with("(0,0,0) 00000002: [4 × 0x00]"));
        assert!(lines[2].starts_with("(0,0,1) 00000006: [4 × 0x00]"));
    }
}

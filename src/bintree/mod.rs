//! An ordered set of non-overlapping regions ("leaves") over a contiguous
//! address space `[0, size)`.
//!
//! Leaves are kept in a `BTreeMap` keyed by their starting offset.  Because
//! leaves never overlap, both their starting and ending offsets are sorted in
//! the same order, so an overlap test only ever has to look at the nearest
//! leaf starting below the end of the candidate interval.  Inserts and point
//! lookups are O(log n); `gaps()` and `items()` walk the map lazily.

mod render;

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::io;
use std::iter::Peekable;

use tracing::{debug, trace};

use crate::error::OctetError;

pub use self::render::{filler, Render};

/// A region of an address space that can be claimed in an `IntervalTree`.
pub trait Leaf {
    /// First offset covered by this leaf.
    fn lo(&self) -> usize;
    /// One past the last offset covered by this leaf.
    fn hi(&self) -> usize;
    /// Render this leaf as printable lines.  `width` is the number of bytes
    /// shown per line of any hexdump.
    fn render(&self, width: usize) -> Vec<String>;

    fn len(&self) -> usize {
        self.hi() - self.lo()
    }
}

/// A maximal uncovered interval `[lo, hi)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Gap {
    pub lo: usize,
    pub hi: usize,
}

impl Gap {
    #[inline]
    pub fn new(lo: usize, hi: usize) -> Gap {
        Gap { lo, hi }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hi - self.lo
    }
}

impl From<Gap> for (usize, usize) {
    fn from(gap: Gap) -> (usize, usize) {
        (gap.lo, gap.hi)
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[0x{:08x}, 0x{:08x})", self.lo, self.hi)
    }
}

/// Either a claimed leaf or the gap between leaves, in address order.
#[derive(Debug)]
pub enum Item<'a, L> {
    Leaf(&'a L),
    Gap(Gap),
}

pub struct IntervalTree<L> {
    size: usize,
    leaves: BTreeMap<usize, L>,
}

impl<L: Leaf> IntervalTree<L> {
    /// Create an empty tree over `[0, size)`.
    pub fn new(size: usize) -> IntervalTree<L> {
        IntervalTree {
            size,
            leaves: BTreeMap::new(),
        }
    }

    /// The size of the address space.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Return the leaf, if any, that intersects `[lo, hi)` and starts last.
    fn conflict(&self, lo: usize, hi: usize) -> Option<&L> {
        self.leaves
            .range(..hi)
            .next_back()
            .map(|(_, leaf)| leaf)
            .filter(|leaf| leaf.hi() > lo)
    }

    /// Claim a leaf.  Fails without modifying the tree if the leaf is empty,
    /// extends past the end of the address space, or intersects any leaf
    /// already present.
    pub fn insert(&mut self, leaf: L) -> io::Result<&L> {
        let (lo, hi) = (leaf.lo(), leaf.hi());
        if lo >= hi {
            return Err(OctetError::EmptyInterval { lo, hi }.into());
        }
        if hi > self.size {
            return Err(OctetError::OutOfRange {
                lo,
                hi,
                len: self.size,
            }
            .into());
        }
        if let Some(other) = self.conflict(lo, hi) {
            debug!(
                lo,
                hi,
                other_lo = other.lo(),
                other_hi = other.hi(),
                "rejected overlapping leaf"
            );
            return Err(OctetError::Overlap {
                lo,
                hi,
                other_lo: other.lo(),
                other_hi: other.hi(),
            }
            .into());
        }
        debug!(lo, hi, "inserted leaf");
        Ok(self.leaves.entry(lo).or_insert(leaf))
    }

    /// Return true if no leaf intersects `[lo, hi)`.
    pub fn is_unclaimed(&self, lo: usize, hi: usize) -> bool {
        lo < hi && self.conflict(lo, hi).is_none()
    }

    /// Iterate all leaves intersecting `[lo, hi)` in ascending order.
    pub fn find(&self, lo: usize, hi: usize) -> impl Iterator<Item = &L> + '_ {
        let hi = hi.max(lo);
        let head = self
            .leaves
            .range(..lo)
            .next_back()
            .map(|(_, leaf)| leaf)
            .filter(move |leaf| leaf.hi() > lo && lo < hi);
        let tail = self.leaves.range(lo..hi).map(|(_, leaf)| leaf);
        head.into_iter().chain(tail)
    }

    /// Return the leaf covering `offset`, if any.
    pub fn at(&self, offset: usize) -> Option<&L> {
        self.find(offset, offset.saturating_add(1)).next()
    }

    /// Iterate all leaves in ascending order.
    pub fn leaves(&self) -> impl Iterator<Item = &L> + '_ {
        self.leaves.values()
    }

    /// Iterate the maximal uncovered intervals of `[0, size)`.
    pub fn gaps(&self) -> Gaps<'_, L> {
        Gaps {
            items: self.items(),
        }
    }

    /// Iterate leaves and gaps in address order.  Together they partition
    /// `[0, size)`.
    pub fn items(&self) -> Items<'_, L> {
        Items {
            leaves: self.leaves.values().peekable(),
            cursor: 0,
            size: self.size,
        }
    }

    /// Total number of bytes covered by leaves.
    pub fn coverage(&self) -> usize {
        self.leaves.values().map(|leaf| leaf.len()).sum()
    }

    /// Render every leaf, interleaved with filler for uncovered regions.
    /// `bytes` supplies the contents of the address space for the filler, and
    /// `text` produces the side column of filler hexdumps.
    pub fn render<'a, F>(&'a self, bytes: &'a [u8], width: usize, text: F) -> Render<'a, L, F>
    where
        F: Fn(&[u8]) -> String,
    {
        Render::new(self.items(), bytes, width, text)
    }
}

impl<L: Leaf> fmt::Debug for IntervalTree<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntervalTree {{ size: {}, leaves: {}, coverage: {} }}",
            self.size,
            self.leaves.len(),
            self.coverage()
        )
    }
}

pub struct Items<'a, L> {
    leaves: Peekable<btree_map::Values<'a, usize, L>>,
    cursor: usize,
    size: usize,
}

impl<'a, L: Leaf> Iterator for Items<'a, L> {
    type Item = Item<'a, L>;

    fn next(&mut self) -> Option<Item<'a, L>> {
        match self.leaves.peek().map(|leaf| leaf.lo()) {
            Some(lo) if lo > self.cursor => {
                let gap = Gap::new(self.cursor, lo);
                self.cursor = lo;
                Some(Item::Gap(gap))
            }
            Some(_) => {
                let leaf = self.leaves.next()?;
                self.cursor = leaf.hi();
                Some(Item::Leaf(leaf))
            }
            None if self.cursor < self.size => {
                let gap = Gap::new(self.cursor, self.size);
                self.cursor = self.size;
                Some(Item::Gap(gap))
            }
            None => None,
        }
    }
}

pub struct Gaps<'a, L> {
    items: Items<'a, L>,
}

impl<'a, L: Leaf> Iterator for Gaps<'a, L> {
    type Item = Gap;

    fn next(&mut self) -> Option<Gap> {
        loop {
            match self.items.next()? {
                Item::Gap(gap) => {
                    trace!(lo = gap.lo, hi = gap.hi, "gap");
                    return Some(gap);
                }
                Item::Leaf(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Span(usize, usize);

    impl Leaf for Span {
        fn lo(&self) -> usize {
            self.0
        }
        fn hi(&self) -> usize {
            self.1
        }
        fn render(&self, _width: usize) -> Vec<String> {
            vec![format!("span {:x}-{:x}", self.0, self.1)]
        }
    }

    fn spans(tree: &IntervalTree<Span>) -> Vec<Span> {
        tree.leaves().cloned().collect()
    }

    #[test]
    fn test_overlap_rejected_atomically() {
        let mut tree = IntervalTree::new(100);
        tree.insert(Span(10, 20)).unwrap();
        let error = tree.insert(Span(15, 25)).unwrap_err();
        assert_eq!(
            OctetError::from_io_error(&error),
            Some(OctetError::Overlap {
                lo: 15,
                hi: 25,
                other_lo: 10,
                other_hi: 20
            })
        );
        assert_eq!(spans(&tree), vec![Span(10, 20)]);
    }

    #[test]
    fn test_overlap_cases() {
        let mut tree = IntervalTree::new(100);
        tree.insert(Span(10, 20)).unwrap();
        tree.insert(Span(30, 40)).unwrap();
        for (lo, hi) in &[(5, 11), (19, 21), (12, 18), (0, 100), (25, 31), (10, 20)] {
            assert!(OctetError::is_overlap(
                &tree.insert(Span(*lo, *hi)).unwrap_err()
            ));
        }
        // Touching neighbors are not overlaps.
        tree.insert(Span(20, 30)).unwrap();
        tree.insert(Span(0, 10)).unwrap();
        tree.insert(Span(40, 100)).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.gaps().count(), 0);
        assert_eq!(tree.coverage(), 100);
    }

    #[test]
    fn test_bounds() {
        let mut tree = IntervalTree::new(16);
        assert!(OctetError::is_out_of_range(
            &tree.insert(Span(8, 17)).unwrap_err()
        ));
        assert_eq!(
            OctetError::from_io_error(&tree.insert(Span(4, 4)).unwrap_err()),
            Some(OctetError::EmptyInterval { lo: 4, hi: 4 })
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_gaps() {
        let mut tree = IntervalTree::new(100);
        let gaps: Vec<(usize, usize)> = tree.gaps().map(Into::into).collect();
        assert_eq!(gaps, vec![(0, 100)]);

        tree.insert(Span(30, 50)).unwrap();
        let gaps: Vec<(usize, usize)> = tree.gaps().map(Into::into).collect();
        assert_eq!(gaps, vec![(0, 30), (50, 100)]);

        tree.insert(Span(0, 10)).unwrap();
        tree.insert(Span(90, 100)).unwrap();
        let gaps: Vec<(usize, usize)> = tree.gaps().map(Into::into).collect();
        assert_eq!(gaps, vec![(10, 30), (50, 90)]);
    }

    #[test]
    fn test_find() {
        let mut tree = IntervalTree::new(100);
        tree.insert(Span(10, 20)).unwrap();
        tree.insert(Span(30, 40)).unwrap();
        tree.insert(Span(50, 60)).unwrap();

        let found: Vec<Span> = tree.find(15, 35).cloned().collect();
        assert_eq!(found, vec![Span(10, 20), Span(30, 40)]);
        let found: Vec<Span> = tree.find(20, 30).cloned().collect();
        assert!(found.is_empty());
        let found: Vec<Span> = tree.find(0, 100).cloned().collect();
        assert_eq!(found.len(), 3);
        assert_eq!(tree.find(35, 35).count(), 0);
        assert_eq!(tree.find(40, 10).count(), 0);

        // Restartable
        assert_eq!(tree.find(15, 35).count(), tree.find(15, 35).count());

        assert_eq!(tree.at(39), Some(&Span(30, 40)));
        assert_eq!(tree.at(40), None);
        assert_eq!(tree.at(usize::max_value()), None);
        assert!(tree.is_unclaimed(20, 30));
        assert!(!tree.is_unclaimed(20, 31));
    }

    #[test]
    fn test_items_partition() {
        let mut tree = IntervalTree::new(64);
        tree.insert(Span(8, 16)).unwrap();
        tree.insert(Span(16, 24)).unwrap();
        tree.insert(Span(40, 48)).unwrap();
        let mut cursor = 0;
        for item in tree.items() {
            let (lo, hi) = match item {
                Item::Leaf(leaf) => (leaf.lo(), leaf.hi()),
                Item::Gap(gap) => (gap.lo, gap.hi),
            };
            assert_eq!(lo, cursor);
            cursor = hi;
        }
        assert_eq!(cursor, 64);
    }
}

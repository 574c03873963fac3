use std::collections::VecDeque;

use crate::bintree::{Gap, Item, Items, Leaf};
use crate::util;

/// Produce the filler lines for an uncovered region.  A run of a single
/// repeated byte value collapses into one line; anything else is hexdumped
/// `width` bytes per line.
pub fn filler(gap: Gap, bytes: &[u8], width: usize, text: &dyn Fn(&[u8]) -> String) -> Vec<String> {
    let contents = bytes.get(gap.lo..gap.hi).unwrap_or(&[]);
    match contents.split_first() {
        Some((first, rest)) if rest.iter().all(|b| b == first) => vec![format!(
            "{:08x}: [{} × 0x{:02x}] {}",
            gap.lo,
            contents.len(),
            first,
            gap
        )],
        Some(_) => util::hexdump_lines(gap.lo, width, contents, text),
        None => vec![format!("{:08x}: [unreadable] {}", gap.lo, gap)],
    }
}

/// Lazily renders every leaf of a tree interleaved with filler lines.
pub struct Render<'a, L, F> {
    items: Items<'a, L>,
    bytes: &'a [u8],
    width: usize,
    text: F,
    pending: VecDeque<String>,
}

impl<'a, L, F> Render<'a, L, F> {
    pub(crate) fn new(items: Items<'a, L>, bytes: &'a [u8], width: usize, text: F) -> Self {
        Render {
            items,
            bytes,
            width,
            text,
            pending: VecDeque::new(),
        }
    }
}

impl<'a, L, F> Iterator for Render<'a, L, F>
where
    L: Leaf,
    F: Fn(&[u8]) -> String,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            match self.items.next()? {
                Item::Leaf(leaf) => self.pending.extend(leaf.render(self.width)),
                Item::Gap(gap) => {
                    self.pending
                        .extend(filler(gap, self.bytes, self.width, &self.text))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bintree::IntervalTree;

    struct Marker(usize, usize);

    impl Leaf for Marker {
        fn lo(&self) -> usize {
            self.0
        }
        fn hi(&self) -> usize {
            self.1
        }
        fn render(&self, _width: usize) -> Vec<String> {
            vec![format!("marker {}", self.0)]
        }
    }

    #[test]
    fn test_filler_collapses_runs() {
        let bytes = [0xe5u8; 64];
        let lines = filler(Gap::new(0, 64), &bytes, 16, &util::printable_ascii);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("64 × 0xe5"));
    }

    #[test]
    fn test_filler_hexdump() {
        let bytes: Vec<u8> = (0..40).collect();
        let lines = filler(Gap::new(8, 40), &bytes, 16, &util::printable_ascii);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000008: 08 09"));
    }

    #[test]
    fn test_render_interleaves() {
        let mut bytes = vec![0u8; 48];
        bytes[40] = 0x41;
        let mut tree = IntervalTree::new(48);
        tree.insert(Marker(16, 32)).unwrap();
        let lines: Vec<String> = tree.render(&bytes, 16, util::printable_ascii).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("16 × 0x00"));
        assert_eq!(lines[1], "marker 16");
        assert!(lines[2].starts_with("00000020: 00"));
        assert!(lines[2].ends_with("|........A.......|"));
    }
}

use crate::typecase::{Flags, TypeCase};

/// Which parity a parity-coded byte stream carries in its high bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    /// The total number of set bits is even.
    Even,
    /// The total number of set bits is odd.
    Odd,
}

impl Parity {
    #[inline]
    fn remainder(self) -> u32 {
        match self {
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }
}

/// Control characters that are kept as whitespace instead of being
/// regarded as invalid.
const WHITESPACE_CONTROLS: &[char] = &['\t', '\n', '\x0b', '\x0c', '\r'];

fn ascii_codec(value: u8) -> Option<char> {
    if value < 0x80 {
        Some(value as char)
    } else {
        None
    }
}

fn latin1_codec(value: u8) -> Option<char> {
    Some(value as char)
}

/// Format characters (general category Cf) that can appear through an 8-bit
/// codec.  These have no glyph of their own.
fn is_format(c: char) -> bool {
    matches!(
        c,
        '\u{ad}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{feff}'
    )
}

pub(crate) fn well_known(name: &str, codec: fn(u8) -> Option<char>) -> TypeCase {
    let mut typecase = TypeCase::new(name, 8);
    for value in 0..=255u8 {
        let c = match codec(value) {
            Some(c) => c,
            None => continue,
        };
        if c.is_control() {
            if WHITESPACE_CONTROLS.contains(&c) {
                let long = c.to_string();
                typecase.set_slug(value, " ", Some(&long), Flags::NONE);
            }
        } else if !is_format(c) {
            let glyph = c.to_string();
            typecase.set_slug(value, &glyph, None, Flags::NONE);
        }
    }
    typecase
}

pub(crate) fn ascii() -> TypeCase {
    well_known("ascii", ascii_codec)
}

pub(crate) fn latin1() -> TypeCase {
    well_known("latin1", latin1_codec)
}

/// Derive an 8-bit type case in which the high bit of each byte carries the
/// given parity over the low seven bits.  Bytes with the wrong parity are
/// invalid; bytes with the right parity decode through `base` as their low
/// seven bits would.
pub(crate) fn parity(base: &TypeCase, parity: Parity) -> TypeCase {
    let name = format!("{}-{}", base.name(), parity.suffix());
    let mut typecase = TypeCase::new(&name, 8);
    for value in 0..=255u8 {
        if value.count_ones() % 2 != parity.remainder() {
            continue;
        }
        let slug = base.slug(value & 0x7f);
        typecase.set_slug(value, slug.short(), Some(slug.long()), slug.flags());
    }
    typecase
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        let typecase = ascii();
        assert_eq!(typecase.decode(b"Hello, world!"), "Hello, world!");
        assert!(typecase.slug(0x00).is_invalid());
        assert!(typecase.slug(0x7f).is_invalid());
        assert!(typecase.slug(0x80).is_invalid());
        assert!(!typecase.slug(b' ').is_invalid());
        assert_eq!(typecase.slug(b'\n').short(), " ");
        assert_eq!(typecase.slug(b'\n').long(), "\n");
        assert_eq!(typecase.is_valid(b"A\r\nB"), (true, "A\r\nB".to_string()));
    }

    #[test]
    fn test_latin1() {
        let typecase = latin1();
        assert_eq!(typecase.decode(&[0xe9, 0x74, 0xe9]), "\u{e9}t\u{e9}");
        assert!(typecase.slug(0x85).is_invalid()); // C1 control
        assert!(typecase.slug(0xad).is_invalid()); // soft hyphen
        assert!(!typecase.slug(0xa0).is_invalid()); // no-break space
        assert!(!typecase.slug(0xa7).is_invalid()); // section sign
    }

    fn check_parity(parity_kind: Parity) {
        let base = ascii();
        let derived = parity(&base, parity_kind);
        for v in 0..0x80u8 {
            let base_slug = base.slug(v);
            if base_slug.is_invalid() {
                continue;
            }
            let matches: Vec<u8> = (0..=255u8)
                .filter(|w| w & 0x7f == v)
                .filter(|w| w.count_ones() % 2 == parity_kind.remainder())
                .collect();
            assert_eq!(matches.len(), 1);
            assert_eq!(derived.slug(matches[0]), base_slug);
            // The other candidate has the wrong parity.
            let other = matches[0] ^ 0x80;
            assert!(derived.slug(other).is_invalid());
        }
    }

    #[test]
    fn test_even_parity() {
        check_parity(Parity::Even);
        let typecase = parity(&ascii(), Parity::Even);
        assert_eq!(typecase.name(), "ascii-even");
        // 'A' = 0x41 has two bits set, 'C' = 0x43 has three.
        assert_eq!(typecase.decode(&[0x41, 0xc3]), "AC");
    }

    #[test]
    fn test_odd_parity() {
        check_parity(Parity::Odd);
        let typecase = parity(&ascii(), Parity::Odd);
        assert_eq!(typecase.decode(&[0xc1, 0x43]), "AC");
        assert_eq!(typecase.is_valid(&[0x41]).0, false);
    }
}

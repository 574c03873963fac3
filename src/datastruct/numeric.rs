use std::fmt;

/// Byte order of an unsigned integer field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
    /// Two little-endian words, most significant word first.  Bytes `[1,0,3,2]`
    /// relative to big-endian.  Four bytes only.
    Pdp,
    /// Two big-endian words, least significant word first.  Bytes `[2,3,0,1]`
    /// relative to big-endian.  Four bytes only.
    WordSwapped,
}

/// Widths that may be read as integers.
pub const UINT_WIDTHS: &[usize] = &[1, 2, 3, 4, 8];

impl Endian {
    /// Return true if this byte order only exists for 4-byte integers.
    pub fn is_deranged(self) -> bool {
        matches!(self, Endian::Pdp | Endian::WordSwapped)
    }

    fn prefix(self) -> &'static str {
        match self {
            Endian::Little => "le",
            Endian::Big => "be",
            Endian::Pdp => "pdp",
            Endian::WordSwapped => "swap",
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Panic unless `width` bytes can be read as an integer in `endian` order.
pub fn check_uint(width: usize, endian: Endian) {
    assert!(
        UINT_WIDTHS.contains(&width),
        "unsupported integer width: {}",
        width
    );
    assert!(
        !endian.is_deranged() || width == 4,
        "{} byte order requires a 4-byte field, not {}",
        endian,
        width
    );
}

/// Read `bytes` as an unsigned integer.  The width is the slice length.
pub fn read_uint(bytes: &[u8], endian: Endian) -> u64 {
    check_uint(bytes.len(), endian);
    match endian {
        Endian::Big => fold_be(bytes.iter().cloned()),
        Endian::Little => fold_be(bytes.iter().rev().cloned()),
        Endian::Pdp => fold_be([1, 0, 3, 2].iter().map(|i| bytes[*i])),
        Endian::WordSwapped => fold_be([2, 3, 0, 1].iter().map(|i| bytes[*i])),
    }
}

/// Accumulate bytes most significant first.
#[inline]
fn fold_be<I: Iterator<Item = u8>>(bytes: I) -> u64 {
    bytes.fold(0u64, |acc, b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_byte() {
        assert_eq!(read_uint(&[0x34, 0x12], Endian::Little), 0x1234);
        assert_eq!(read_uint(&[0x12, 0x34], Endian::Big), 0x1234);
    }

    #[test]
    fn test_widths() {
        assert_eq!(read_uint(&[0xff], Endian::Little), 0xff);
        assert_eq!(read_uint(&[0x56, 0x34, 0x12], Endian::Little), 0x123456);
        assert_eq!(read_uint(&[0x12, 0x34, 0x56], Endian::Big), 0x123456);
        assert_eq!(
            read_uint(&[0x78, 0x56, 0x34, 0x12], Endian::Little),
            0x12345678
        );
        assert_eq!(
            read_uint(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08], Endian::Big),
            0x0102030405060708
        );
        // No sign extension.
        assert_eq!(
            read_uint(&[0xff; 8], Endian::Little),
            0xffff_ffff_ffff_ffff
        );
        assert_eq!(read_uint(&[0x80, 0x00], Endian::Big), 0x8000);
    }

    #[test]
    fn test_deranged() {
        // 0x12345678 on a PDP-11: high word first, each word little-endian.
        assert_eq!(read_uint(&[0x34, 0x12, 0x78, 0x56], Endian::Pdp), 0x12345678);
        assert_eq!(
            read_uint(&[0x56, 0x78, 0x12, 0x34], Endian::WordSwapped),
            0x12345678
        );
    }

    #[test]
    #[should_panic]
    fn test_deranged_width() {
        read_uint(&[0x12, 0x34], Endian::Pdp);
    }

    #[test]
    #[should_panic]
    fn test_unsupported_width() {
        read_uint(&[0; 5], Endian::Big);
    }
}

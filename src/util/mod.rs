use std::fmt;

/// Write a hexdump of the provided byte slice.  Offsets are printed relative
/// to `base`, and the side column is produced by `text`.
pub fn hexdump(
    f: &mut dyn fmt::Write,
    prefix: &str,
    base: usize,
    columns: usize,
    buffer: &[u8],
    text: &dyn Fn(&[u8]) -> String,
) -> fmt::Result {
    let columns = columns.max(1);
    let mut offset: usize = 0;
    if buffer.is_empty() {
        // For a zero-length buffer, at least print an offset instead of
        // nothing.
        write!(f, "{}{:08x}: ", prefix, base)?;
    }
    while offset < buffer.len() {
        write!(f, "{}{:08x}: ", prefix, base + offset)?;

        // Determine row byte range
        let next_offset = offset + columns;
        let (row_size, padding) = if next_offset <= buffer.len() {
            (columns, 0)
        } else {
            (buffer.len() - offset, next_offset - buffer.len())
        };
        let row = &buffer[offset..offset + row_size];

        // Print hex representation
        for b in row {
            write!(f, "{:02x} ", b)?;
        }
        for _ in 0..padding {
            write!(f, "   ")?;
        }

        // Print text representation
        write!(f, "|{}|", text(row))?;

        offset += columns;
        if offset < buffer.len() {
            writeln!(f)?;
        }
    }
    Ok(())
}

/// Return a hexdump as a list of lines.
pub fn hexdump_lines(
    base: usize,
    columns: usize,
    buffer: &[u8],
    text: &dyn Fn(&[u8]) -> String,
) -> Vec<String> {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = hexdump(&mut out, "", base, columns, buffer, text);
    out.lines().map(str::to_string).collect()
}

/// Render bytes as printable ASCII, substituting '.' for everything else.
pub fn printable_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| match *b {
            c @ 0x20..=0x7E => c as char,
            _ => '.',
        })
        .collect()
}

/// Render bytes as space separated hex pairs.
pub fn hex_pairs(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexdump_lines() {
        let bytes: Vec<u8> = (0x41..0x41 + 20).collect();
        let lines = hexdump_lines(0x100, 16, &bytes, &printable_ascii);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000100: 41 42 43"));
        assert!(lines[0].ends_with("|ABCDEFGHIJKLMNOP|"));
        assert!(lines[1].starts_with("00000110: 51 52 53 54 "));
        assert!(lines[1].ends_with("|QRST|"));
    }

    #[test]
    fn test_hexdump_empty() {
        let lines = hexdump_lines(0x20, 16, &[], &printable_ascii);
        assert_eq!(lines, vec!["00000020: ".to_string()]);
    }

    #[test]
    fn test_printable_ascii() {
        assert_eq!(printable_ascii(&[0x41, 0x00, 0x7f, 0x7e]), "A..~");
        assert_eq!(hex_pairs(&[0x01, 0xab]), "01 ab");
    }
}

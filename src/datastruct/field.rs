use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::datastruct::numeric::{check_uint, Endian, UINT_WIDTHS};
use crate::error::OctetError;

/// The type of one field: how many bytes it occupies and how they are
/// interpreted.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    /// Raw bytes.
    Octets(usize),
    /// A fixed-width unsigned integer.
    Uint { width: usize, endian: Endian },
    /// Fixed-width text decoded through the view's type case, optionally
    /// with trailing spaces stripped.
    Text { width: usize, rstrip: bool },
    /// A nested record.
    Struct(Arc<Layout>),
    /// A fixed number of repetitions of one field type.
    Array { count: usize, element: Box<FieldType> },
}

pub const OCTET: FieldType = FieldType::Octets(1);
pub const LE16: FieldType = FieldType::Uint {
    width: 2,
    endian: Endian::Little,
};
pub const LE24: FieldType = FieldType::Uint {
    width: 3,
    endian: Endian::Little,
};
pub const LE32: FieldType = FieldType::Uint {
    width: 4,
    endian: Endian::Little,
};
pub const LE64: FieldType = FieldType::Uint {
    width: 8,
    endian: Endian::Little,
};
pub const BE16: FieldType = FieldType::Uint {
    width: 2,
    endian: Endian::Big,
};
pub const BE24: FieldType = FieldType::Uint {
    width: 3,
    endian: Endian::Big,
};
pub const BE32: FieldType = FieldType::Uint {
    width: 4,
    endian: Endian::Big,
};
pub const BE64: FieldType = FieldType::Uint {
    width: 8,
    endian: Endian::Big,
};
pub const PDP32: FieldType = FieldType::Uint {
    width: 4,
    endian: Endian::Pdp,
};
pub const SWAP32: FieldType = FieldType::Uint {
    width: 4,
    endian: Endian::WordSwapped,
};

/// A single byte read as an integer.
pub const UINT8: FieldType = FieldType::Uint {
    width: 1,
    endian: Endian::Little,
};

/// Raw bytes.
pub fn octets(width: usize) -> FieldType {
    FieldType::Octets(width)
}

/// An unsigned integer.  Panics on widths that cannot be read.
pub fn uint(width: usize, endian: Endian) -> FieldType {
    check_uint(width, endian);
    FieldType::Uint { width, endian }
}

/// Fixed-width text.
pub fn text(width: usize) -> FieldType {
    FieldType::Text {
        width,
        rstrip: false,
    }
}

/// Fixed-width text with trailing spaces removed.
pub fn text_rstrip(width: usize) -> FieldType {
    FieldType::Text {
        width,
        rstrip: true,
    }
}

/// `count` repetitions of `element`.
pub fn array(count: usize, element: FieldType) -> FieldType {
    FieldType::Array {
        count,
        element: Box::new(element),
    }
}

impl FieldType {
    /// The number of bytes occupied by a field of this type, or `None` if
    /// that does not fit in a `usize`.
    pub fn checked_width(&self) -> Option<usize> {
        match self {
            FieldType::Octets(width) => Some(*width),
            FieldType::Uint { width, .. } => Some(*width),
            FieldType::Text { width, .. } => Some(*width),
            FieldType::Struct(layout) => layout.checked_width(),
            FieldType::Array { count, element } => count.checked_mul(element.checked_width()?),
        }
    }

    /// The number of bytes occupied by a field of this type.  Saturates at
    /// `usize::MAX`.
    pub fn width(&self) -> usize {
        self.checked_width().unwrap_or(usize::max_value())
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldType::Octets(1) => f.write_str("octet"),
            FieldType::Octets(width) => write!(f, "octets{}", width),
            FieldType::Uint { width: 1, .. } => f.write_str("u8"),
            FieldType::Uint { width, endian } => write!(f, "{}{}", endian, width * 8),
            FieldType::Text {
                width,
                rstrip: false,
            } => write!(f, "text{}", width),
            FieldType::Text {
                width,
                rstrip: true,
            } => write!(f, "rtext{}", width),
            FieldType::Struct(layout) => f.write_str(layout.name()),
            FieldType::Array { count, element } => write!(f, "{}[{}]", element, count),
        }
    }
}

/// Parse the compact type names used on the command line: `octet`, `u8`,
/// `le16`..`le64`, `be16`..`be64`, `pdp32`, `swap32`, `octetsN`, `textN`,
/// `rtextN`, and any of these followed by `[N]` for an array.
impl FromStr for FieldType {
    type Err = OctetError;

    fn from_str(s: &str) -> Result<FieldType, OctetError> {
        let bad = || OctetError::BadFieldType(s.to_string());
        let s = s.trim();

        if let Some(open) = s.rfind('[') {
            let count = s[open..]
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|count| count.parse::<usize>().ok())
                .ok_or_else(bad)?;
            let element = s[..open].parse::<FieldType>().map_err(|_| bad())?;
            let parsed = array(count, element);
            return match parsed.checked_width() {
                Some(_) => Ok(parsed),
                None => Err(bad()),
            };
        }

        let split = s
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(s.len());
        let (word, digits) = s.split_at(split);
        let number = if digits.is_empty() {
            None
        } else {
            Some(digits.parse::<usize>().map_err(|_| bad())?)
        };

        let endian = match word {
            "le" => Some(Endian::Little),
            "be" => Some(Endian::Big),
            "pdp" => Some(Endian::Pdp),
            "swap" => Some(Endian::WordSwapped),
            _ => None,
        };

        match (word, number, endian) {
            ("octet", None, _) => Ok(OCTET),
            ("u", Some(8), _) => Ok(UINT8),
            ("octets", Some(n), _) if n > 0 => Ok(octets(n)),
            ("text", Some(n), _) if n > 0 => Ok(text(n)),
            ("rtext", Some(n), _) if n > 0 => Ok(text_rstrip(n)),
            (_, Some(bits), Some(endian)) if bits % 8 == 0 => {
                let width = bits / 8;
                let readable = UINT_WIDTHS.contains(&width)
                    && (!endian.is_deranged() || width == 4)
                    && width > 1;
                if readable {
                    Ok(FieldType::Uint { width, endian })
                } else {
                    Err(bad())
                }
            }
            _ => Err(bad()),
        }
    }
}

/// One declaration within a `Layout`.  Anonymous declarations are padding:
/// their bytes are part of the record but not addressable by name.
#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub name: Option<String>,
    pub field_type: FieldType,
}

/// An ordered list of field declarations describing one record type.
/// Declaration order is layout order.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    name: String,
    decls: Vec<Decl>,
}

impl Layout {
    pub fn new(name: &str) -> Layout {
        Layout {
            name: name.to_string(),
            decls: vec![],
        }
    }

    /// Declare a named field after all previous declarations.
    pub fn field(mut self, name: &str, field_type: FieldType) -> Layout {
        assert!(
            !self.decls.iter().any(|d| d.name.as_deref() == Some(name)),
            "duplicate field {} in {}",
            name,
            self.name
        );
        if let FieldType::Uint { width, endian } = field_type {
            check_uint(width, endian);
        }
        self.decls.push(Decl {
            name: Some(name.to_string()),
            field_type,
        });
        self
    }

    /// Declare `width` bytes of anonymous padding.
    pub fn pad(mut self, width: usize) -> Layout {
        self.decls.push(Decl {
            name: None,
            field_type: FieldType::Octets(width),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decls(&self) -> &[Decl] {
        &self.decls
    }

    /// Total width of all declarations, or `None` if that does not fit in
    /// a `usize`.
    pub fn checked_width(&self) -> Option<usize> {
        self.decls.iter().try_fold(0usize, |total, d| {
            total.checked_add(d.field_type.checked_width()?)
        })
    }

    /// Total width of all declarations.  Saturates at `usize::MAX`.
    pub fn width(&self) -> usize {
        self.checked_width().unwrap_or(usize::max_value())
    }

    /// Wrap this layout as a field type so it can be nested or repeated.
    pub fn into_type(self) -> FieldType {
        FieldType::Struct(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirent() -> Layout {
        Layout::new("DirEnt")
            .field("status", OCTET)
            .field("name", text_rstrip(8))
            .field("ext", text(3))
            .pad(4)
            .field("blocks", array(16, OCTET))
    }

    #[test]
    fn test_layout_width() {
        let layout = dirent();
        assert_eq!(layout.width(), 32);
        assert_eq!(layout.decls().len(), 5);
        assert_eq!(layout.decls()[3].name, None);
        let nested = array(4, layout.into_type());
        assert_eq!(nested.width(), 128);
        assert_eq!(nested.to_string(), "DirEnt[4]");
    }

    #[test]
    #[should_panic]
    fn test_duplicate_field() {
        Layout::new("Dup").field("a", OCTET).field("a", LE16);
    }

    #[test]
    #[should_panic]
    fn test_undeterminable_width() {
        Layout::new("Bad").field("a", FieldType::Uint {
            width: 2,
            endian: Endian::Pdp,
        });
    }

    #[test]
    fn test_parse() {
        assert_eq!("le16".parse::<FieldType>().unwrap(), LE16);
        assert_eq!("be32".parse::<FieldType>().unwrap(), BE32);
        assert_eq!("pdp32".parse::<FieldType>().unwrap(), PDP32);
        assert_eq!("swap32".parse::<FieldType>().unwrap(), SWAP32);
        assert_eq!("u8".parse::<FieldType>().unwrap(), UINT8);
        assert_eq!("octet".parse::<FieldType>().unwrap(), OCTET);
        assert_eq!("octets12".parse::<FieldType>().unwrap(), octets(12));
        assert_eq!("text8".parse::<FieldType>().unwrap(), text(8));
        assert_eq!("rtext8".parse::<FieldType>().unwrap(), text_rstrip(8));
        assert_eq!(
            "le16[4]".parse::<FieldType>().unwrap(),
            array(4, LE16)
        );
        for bad in &[
            "le12",
            "pdp16",
            "text",
            "text0",
            "le16[",
            "xyz",
            "be40",
            "octets4294967296[4294967296]",
            "octets4294967296[4294967296][4294967296]",
        ] {
            assert_eq!(
                bad.parse::<FieldType>(),
                Err(OctetError::BadFieldType(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_width_overflow() {
        let huge = array(usize::max_value(), LE16);
        assert_eq!(huge.checked_width(), None);
        assert_eq!(huge.width(), usize::max_value());
        let layout = Layout::new("Huge").field("a", OCTET).field("b", huge);
        assert_eq!(layout.checked_width(), None);
        assert_eq!(layout.width(), usize::max_value());
        assert_eq!(array(3, LE16).checked_width(), Some(6));
    }

    #[test]
    fn test_display_parse_agree() {
        for field_type in &[OCTET, UINT8, LE24, BE64, PDP32, text(5), text_rstrip(2), octets(3)] {
            assert_eq!(
                field_type.to_string().parse::<FieldType>().unwrap(),
                *field_type
            );
        }
    }
}

use std::fmt;
use std::io;
use std::ops::Index;
use std::sync::Arc;

use crate::bintree::Leaf;
use crate::datastruct::numeric::Endian;
use crate::error::OctetError;
use crate::typecase::TypeCase;
use crate::util;

/// Fixed-width text.  The short rendering is decoded when the field is
/// read; the long rendering is decoded on demand.
#[derive(Clone)]
pub struct Text {
    raw: Vec<u8>,
    short: String,
    rstrip: bool,
    typecase: Arc<TypeCase>,
}

impl Text {
    pub fn new(raw: &[u8], typecase: Arc<TypeCase>, rstrip: bool) -> Text {
        let mut short = typecase.decode(raw);
        if rstrip {
            short.truncate(short.trim_end_matches(' ').len());
        }
        Text {
            raw: raw.to_vec(),
            short,
            rstrip,
            typecase,
        }
    }

    /// The working string: one short glyph per byte.
    pub fn short(&self) -> &str {
        &self.short
    }

    /// The full-fidelity rendering using long glyphs.
    pub fn long(&self) -> String {
        let mut long = self.typecase.decode_long(&self.raw);
        if self.rstrip {
            long.truncate(long.trim_end_matches(' ').len());
        }
        long
    }

    /// The undecoded bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Return true if no byte of this text is invalid in its type case.
    pub fn is_valid(&self) -> bool {
        self.typecase.is_valid(&self.raw).0
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Text) -> bool {
        self.raw == other.raw && self.short == other.short && self.rstrip == other.rstrip
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.short)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.short)
    }
}

/// The closed set of things a region can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    /// Raw bytes.  Anonymous padding within a struct is an unnamed
    /// `Octets` region.
    Octets(Vec<u8>),
    Uint {
        value: u64,
        width: usize,
        endian: Endian,
    },
    Text(Text),
    /// A record.  Its fields are contiguous and in declaration order.
    Struct {
        type_name: String,
        fields: Vec<Region>,
    },
    Array(Vec<Region>),
    /// A claimed region whose contents are not decoded.
    Opaque(String),
}

/// A typed, decoded interval `[lo, hi)` of an artifact.  Regions are the
/// leaves claimed in an `OctetView`, and also the fields of structs and the
/// elements of arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    lo: usize,
    hi: usize,
    name: Option<String>,
    kind: Kind,
}

impl Region {
    pub fn new(lo: usize, hi: usize, name: Option<&str>, kind: Kind) -> Region {
        Region {
            lo,
            hi,
            name: name.map(str::to_string),
            kind,
        }
    }

    /// A region whose contents are claimed but not decoded.
    pub fn opaque(lo: usize, hi: usize, label: &str) -> Region {
        Region::new(lo, hi, None, Kind::Opaque(label.to_string()))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_string);
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The struct type name, for struct regions.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            Kind::Struct { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Iterate the named fields of a struct, skipping padding.
    pub fn fields(&self) -> impl Iterator<Item = &Region> + '_ {
        let fields: &[Region] = match &self.kind {
            Kind::Struct { fields, .. } => fields,
            _ => &[],
        };
        fields.iter().filter(|f| f.name.is_some())
    }

    /// Every member of a struct, including padding, in layout order.
    pub fn members(&self) -> &[Region] {
        match &self.kind {
            Kind::Struct { fields, .. } => fields,
            _ => &[],
        }
    }

    /// The elements of an array.
    pub fn elements(&self) -> &[Region] {
        match &self.kind {
            Kind::Array(elements) => elements,
            _ => &[],
        }
    }

    /// Look up a named field of a struct.
    pub fn field(&self, name: &str) -> Option<&Region> {
        self.fields().find(|f| f.name() == Some(name))
    }

    /// Look up a named field, failing with `UnknownField`.
    pub fn get(&self, name: &str) -> io::Result<&Region> {
        self.field(name)
            .ok_or_else(|| OctetError::UnknownField(name.to_string()).into())
    }

    /// The integer value of a named field.
    pub fn uint(&self, name: &str) -> io::Result<u64> {
        self.get(name)?
            .as_uint()
            .ok_or_else(|| OctetError::FieldType(name.to_string()).into())
    }

    /// The text of a named field.
    pub fn text(&self, name: &str) -> io::Result<&Text> {
        self.get(name)?
            .as_text()
            .ok_or_else(|| OctetError::FieldType(name.to_string()).into())
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.kind {
            Kind::Uint { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match &self.kind {
            Kind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_octets(&self) -> Option<&[u8]> {
        match &self.kind {
            Kind::Octets(bytes) => Some(bytes),
            _ => None,
        }
    }

    fn summary(&self, width: usize) -> String {
        match &self.kind {
            Kind::Octets(bytes) if bytes.len() <= width => util::hex_pairs(bytes),
            Kind::Octets(bytes) => format!("{} bytes", bytes.len()),
            Kind::Uint { value, width, .. } => {
                format!("0x{:0digits$x} ({})", value, value, digits = width * 2)
            }
            Kind::Text(text) => {
                let long = text.long();
                if long == text.short() {
                    format!("\"{}\"", text.short())
                } else {
                    format!("\"{}\" {:?}", text.short(), long)
                }
            }
            Kind::Struct { type_name, .. } => {
                format!("{} [0x{:x}, 0x{:x})", type_name, self.lo, self.hi)
            }
            Kind::Array(elements) => format!("[{}]", elements.len()),
            Kind::Opaque(label) => format!("<{}> ({} bytes)", label, self.hi - self.lo),
        }
    }

    fn render_into(&self, depth: usize, label: Option<&str>, width: usize, out: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        let line = match label {
            Some(label) => format!(
                "{:08x}: {}.{} = {}",
                self.lo,
                indent,
                label,
                self.summary(width)
            ),
            None => format!("{:08x}: {}{}", self.lo, indent, self.summary(width)),
        };
        out.push(line);
        match &self.kind {
            Kind::Octets(bytes) if bytes.len() > width => {
                out.extend(util::hexdump_lines(
                    self.lo,
                    width,
                    bytes,
                    &util::printable_ascii,
                ));
            }
            Kind::Struct { fields, .. } => {
                for field in fields {
                    let label = field.name().unwrap_or("(pad)");
                    field.render_into(depth + 1, Some(label), width, out);
                }
            }
            Kind::Array(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    let label = format!("[{}]", index);
                    element.render_into(depth + 1, Some(&label), width, out);
                }
            }
            _ => {}
        }
    }
}

impl Leaf for Region {
    #[inline]
    fn lo(&self) -> usize {
        self.lo
    }

    #[inline]
    fn hi(&self) -> usize {
        self.hi
    }

    fn render(&self, width: usize) -> Vec<String> {
        let mut lines = vec![];
        self.render_into(0, self.name(), width.max(1), &mut lines);
        lines
    }
}

/// Panics if the struct has no field by this name, in the manner of slice
/// indexing.  Use `field()` or `get()` for a fallible lookup.
impl<'a> Index<&'a str> for Region {
    type Output = Region;

    fn index(&self, name: &'a str) -> &Region {
        match self.field(name) {
            Some(field) => field,
            None => panic!("no field {} in {:?}", name, self.type_name()),
        }
    }
}

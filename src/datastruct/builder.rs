use std::io;
use std::sync::Arc;

use crate::bintree::Leaf;
use crate::datastruct::field::{FieldType, Layout};
use crate::datastruct::numeric::read_uint;
use crate::datastruct::region::{Kind, Region, Text};
use crate::error::OctetError;
use crate::typecase::TypeCase;

/// Return the bytes `[lo, lo + width)`, failing with `OutOfRange` rather than
/// truncating.
fn span(bytes: &[u8], lo: usize, width: usize) -> io::Result<&[u8]> {
    let out_of_range = || OctetError::OutOfRange {
        lo,
        hi: lo.saturating_add(width),
        len: bytes.len(),
    };
    let hi = lo.checked_add(width).ok_or_else(out_of_range)?;
    bytes
        .get(lo..hi)
        .ok_or_else(|| out_of_range().into())
}

/// Read one field of type `field_type` at `lo`.
pub fn read(
    bytes: &[u8],
    typecase: &Arc<TypeCase>,
    lo: usize,
    field_type: &FieldType,
    name: Option<&str>,
) -> io::Result<Region> {
    let width = field_type.checked_width().ok_or(OctetError::OutOfRange {
        lo,
        hi: usize::max_value(),
        len: bytes.len(),
    })?;
    let raw = span(bytes, lo, width)?;
    let hi = lo + width;
    let kind = match field_type {
        FieldType::Octets(_) => Kind::Octets(raw.to_vec()),
        FieldType::Uint { width, endian } => Kind::Uint {
            value: read_uint(raw, *endian),
            width: *width,
            endian: *endian,
        },
        FieldType::Text { rstrip, .. } => Kind::Text(Text::new(raw, typecase.clone(), *rstrip)),
        FieldType::Struct(layout) => {
            let mut builder = StructBuilder::new(bytes, typecase.clone(), lo, layout.name());
            builder.fields(layout)?;
            let mut region = builder.done();
            region.set_name(name);
            return Ok(region);
        }
        FieldType::Array { count, element } => {
            let element_width = element.width();
            let elements = (0..*count)
                .map(|index| read(bytes, typecase, lo + index * element_width, element, None))
                .collect::<io::Result<Vec<_>>>()?;
            Kind::Array(elements)
        }
    };
    Ok(Region::new(lo, hi, name, kind))
}

/// The open state of a struct under construction.  Fields are read from the
/// artifact as they are declared, each starting where the previous one
/// ended, so later declarations can depend on values read earlier in the
/// same record.  `done()` closes the struct and yields an immutable
/// `Region`; nothing can be added after that.
pub struct StructBuilder<'a> {
    bytes: &'a [u8],
    typecase: Arc<TypeCase>,
    type_name: String,
    lo: usize,
    cursor: usize,
    fields: Vec<Region>,
}

impl<'a> StructBuilder<'a> {
    pub fn new(bytes: &'a [u8], typecase: Arc<TypeCase>, lo: usize, type_name: &str) -> Self {
        StructBuilder {
            bytes,
            typecase,
            type_name: type_name.to_string(),
            lo,
            cursor: lo,
            fields: vec![],
        }
    }

    fn push(&mut self, name: Option<&str>, field_type: &FieldType) -> io::Result<&mut Self> {
        if let Some(name) = name {
            assert!(
                self.get(name).is_none(),
                "duplicate field {} in {}",
                name,
                self.type_name
            );
        }
        let region = read(self.bytes, &self.typecase, self.cursor, field_type, name)?;
        self.cursor = region.hi();
        self.fields.push(region);
        Ok(self)
    }

    /// Declare a named field following all previous ones.
    pub fn field(&mut self, name: &str, field_type: &FieldType) -> io::Result<&mut Self> {
        self.push(Some(name), field_type)
    }

    /// Declare `width` bytes of anonymous padding.
    pub fn pad(&mut self, width: usize) -> io::Result<&mut Self> {
        self.push(None, &FieldType::Octets(width))
    }

    /// Declare every field of a layout, in order.
    pub fn fields(&mut self, layout: &Layout) -> io::Result<&mut Self> {
        for decl in layout.decls() {
            self.push(decl.name.as_deref(), &decl.field_type)?;
        }
        Ok(self)
    }

    /// A field declared so far.
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.fields.iter().find(|f| f.name() == Some(name))
    }

    /// The integer value of a field declared so far.
    pub fn uint(&self, name: &str) -> io::Result<u64> {
        self.get(name)
            .ok_or_else(|| OctetError::UnknownField(name.to_string()))?
            .as_uint()
            .ok_or_else(|| OctetError::FieldType(name.to_string()).into())
    }

    /// The offset at which the next field will be placed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Close the struct.
    pub fn done(self) -> Region {
        Region::new(
            self.lo,
            self.cursor,
            None,
            Kind::Struct {
                type_name: self.type_name,
                fields: self.fields,
            },
        )
    }
}

//! Table-driven decoding of historic character sets.
//!
//! A `TypeCase` maps every value of a `bits`-wide code unit to a `Slug`: a
//! short glyph (one column, used in hexdump side columns), a long glyph (the
//! full-fidelity rendering, which may be empty or several characters long),
//! and a set of `Flags`.  Every slot starts out as the invalid placeholder,
//! so a type case can be built up incrementally from only the code points a
//! given system actually defined.
//!
//! Flag contract:
//!
//! * `INVALID` bytes have no interpretation.  Any such byte makes
//!   `is_valid()` return false.
//! * `IGNORE` bytes are valid, but are not counted as visible characters by
//!   `census()`.  (Padding, NUL fill, and similar.)
//! * `EOF` is a sentinel only.  Decoding never stops at it; callers that
//!   extract text must check for it themselves, either with `census()` or by
//!   walking `slugs()`.

mod builtin;

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

pub use self::builtin::Parity;

/// Per-slug flag set.  Flags are a bitmask and are not mutually exclusive.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0x00);
    pub const INVALID: Flags = Flags(0x01);
    pub const IGNORE: Flags = Flags(0x02);
    pub const EOF: Flags = Flags(0x04);

    #[inline]
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Flags;
    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = vec![];
        if self.contains(Flags::INVALID) {
            names.push("INVALID");
        }
        if self.contains(Flags::IGNORE) {
            names.push("IGNORE");
        }
        if self.contains(Flags::EOF) {
            names.push("EOF");
        }
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// One entry of a type case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slug {
    short: String,
    long: String,
    flags: Flags,
}

impl Slug {
    pub fn new(short: &str, long: Option<&str>, flags: Flags) -> Slug {
        Slug {
            short: short.to_string(),
            long: long.unwrap_or(short).to_string(),
            flags,
        }
    }

    /// The placeholder every slot holds until it is explicitly set.
    pub fn invalid() -> Slug {
        Slug::new(" ", Some(""), Flags::INVALID)
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.flags.contains(Flags::INVALID)
    }

    #[inline]
    pub fn is_ignored(&self) -> bool {
        self.flags.contains(Flags::IGNORE)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.flags.contains(Flags::EOF)
    }
}

/// Byte counts produced by `TypeCase::census()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Census {
    /// Valid bytes that are not ignored.
    pub visible: usize,
    /// Valid bytes carrying the IGNORE flag.
    pub ignored: usize,
    /// Bytes with no interpretation.
    pub invalid: usize,
    /// Index of the first byte carrying the EOF flag, if any.
    pub eof: Option<usize>,
}

/// A byte-value-to-glyph table modeling one historic character encoding.
#[derive(Clone)]
pub struct TypeCase {
    name: String,
    bits: u32,
    slugs: Vec<Slug>,
    placeholder: Slug,
}

impl TypeCase {
    /// Create a type case for `bits`-wide code units with every slot set to
    /// the invalid placeholder.
    pub fn new(name: &str, bits: u32) -> TypeCase {
        assert!(bits >= 1 && bits <= 8, "type case width must be 1..=8 bits");
        TypeCase {
            name: name.to_string(),
            bits,
            slugs: vec![Slug::invalid(); 1 << bits],
            placeholder: Slug::invalid(),
        }
    }

    /// Look up one of the built-in type cases by name.
    pub fn by_name(name: &str) -> Option<TypeCase> {
        match name {
            "ascii" => Some(builtin::ascii()),
            "latin1" => Some(builtin::latin1()),
            "ascii-even" => Some(builtin::parity(&builtin::ascii(), Parity::Even)),
            "ascii-odd" => Some(builtin::parity(&builtin::ascii(), Parity::Odd)),
            _ => None,
        }
    }

    /// The names accepted by `by_name()`.
    pub fn builtin_names() -> &'static [&'static str] {
        &["ascii", "latin1", "ascii-even", "ascii-odd"]
    }

    pub fn ascii() -> TypeCase {
        builtin::ascii()
    }

    pub fn latin1() -> TypeCase {
        builtin::latin1()
    }

    /// Build a type case by running every byte through an 8-bit codec and
    /// classifying the resulting character.
    pub fn well_known(name: &str, codec: fn(u8) -> Option<char>) -> TypeCase {
        builtin::well_known(name, codec)
    }

    /// Derive an 8-bit type case for a parity-coded stream of this type
    /// case's 7-bit values.
    pub fn with_parity(&self, parity: Parity) -> TypeCase {
        builtin::parity(self, parity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of slots (`2^bits`).
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    /// Overwrite one slot.  `long` defaults to `short`.
    pub fn set_slug(&mut self, value: u8, short: &str, long: Option<&str>, flags: Flags) {
        assert!(
            (value as usize) < self.slugs.len(),
            "value 0x{:02x} exceeds a {}-bit type case",
            value,
            self.bits
        );
        self.slugs[value as usize] = Slug::new(short, long, flags);
    }

    /// Return a copy of this type case with the given slots overwritten.
    /// The receiver is left untouched.
    pub fn with_overrides<'a, I>(&self, name: &str, overrides: I) -> TypeCase
    where
        I: IntoIterator<Item = (u8, &'a str, Option<&'a str>, Flags)>,
    {
        let mut derived = self.clone();
        derived.name = name.to_string();
        for (value, short, long, flags) in overrides {
            derived.set_slug(value, short, long, flags);
        }
        derived
    }

    /// The slug for one byte.  Values outside the table decode as the
    /// invalid placeholder.
    #[inline]
    pub fn slug(&self, value: u8) -> &Slug {
        self.slugs
            .get(value as usize)
            .unwrap_or(&self.placeholder)
    }

    /// Iterate the slugs for a byte sequence.
    pub fn slugs<'a>(&'a self, bytes: &'a [u8]) -> impl Iterator<Item = &'a Slug> + 'a {
        bytes.iter().map(move |b| self.slug(*b))
    }

    /// Concatenate the short glyphs of each byte, regardless of flags.
    pub fn decode(&self, bytes: &[u8]) -> String {
        self.slugs(bytes).map(Slug::short).collect()
    }

    /// Concatenate the long glyphs of each byte, regardless of flags.
    pub fn decode_long(&self, bytes: &[u8]) -> String {
        self.slugs(bytes).map(Slug::long).collect()
    }

    /// Return whether every byte is valid, along with the long rendering.
    pub fn is_valid(&self, bytes: &[u8]) -> (bool, String) {
        let mut valid = true;
        let mut text = String::with_capacity(bytes.len());
        for slug in self.slugs(bytes) {
            valid &= !slug.is_invalid();
            text.push_str(slug.long());
        }
        (valid, text)
    }

    /// Count visible, ignored and invalid bytes, and locate the first EOF.
    pub fn census(&self, bytes: &[u8]) -> Census {
        let mut census = Census::default();
        for (index, slug) in self.slugs(bytes).enumerate() {
            if slug.is_invalid() {
                census.invalid += 1;
            } else if slug.is_ignored() {
                census.ignored += 1;
            } else {
                census.visible += 1;
            }
            if slug.is_eof() && census.eof.is_none() {
                census.eof = Some(index);
            }
        }
        census
    }
}

impl fmt::Debug for TypeCase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let valid = self.slugs.iter().filter(|s| !s.is_invalid()).count();
        write!(
            f,
            "TypeCase {{ name: {:?}, bits: {}, valid: {}/{} }}",
            self.name,
            self.bits,
            valid,
            self.slugs.len()
        )
    }
}

use std::error;
use std::fmt;
use std::io;

/// Errors that can be returned from decoding operations.  These are
/// generally converted into `io::Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OctetError {
    /// A claimed interval intersects an interval that was already claimed.
    Overlap {
        lo: usize,
        hi: usize,
        other_lo: usize,
        other_hi: usize,
    },
    /// A read extends past the end of the artifact.
    OutOfRange { lo: usize, hi: usize, len: usize },
    /// An interval with no bytes in it (`lo >= hi`).
    EmptyInterval { lo: usize, hi: usize },
    /// No field with this name exists.
    UnknownField(String),
    /// The named field exists but is of a different kind.
    FieldType(String),
    /// A field type description could not be parsed.
    BadFieldType(String),
    /// The artifact does not fit the requested geometry.
    Geometry,
    /// No type case is known by this name.
    UnknownTypeCase(String),
}

impl error::Error for OctetError {}

impl fmt::Display for OctetError {
    /// Provide human-readable descriptions of the errors
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::OctetError::*;
        match self {
            Overlap {
                lo,
                hi,
                other_lo,
                other_hi,
            } => write!(
                f,
                "region [0x{:x}, 0x{:x}) overlaps [0x{:x}, 0x{:x})",
                lo, hi, other_lo, other_hi
            ),
            OutOfRange { lo, hi, len } => write!(
                f,
                "range [0x{:x}, 0x{:x}) is out of bounds (length 0x{:x})",
                lo, hi, len
            ),
            EmptyInterval { lo, hi } => write!(f, "empty interval [0x{:x}, 0x{:x})", lo, hi),
            UnknownField(name) => write!(f, "no such field: {}", name),
            FieldType(name) => write!(f, "field has the wrong type: {}", name),
            BadFieldType(text) => write!(f, "unrecognized field type: {}", text),
            Geometry => f.write_str("artifact size does not match the geometry"),
            UnknownTypeCase(name) => write!(f, "unknown type case: {}", name),
        }
    }
}

impl From<OctetError> for io::Error {
    fn from(error: OctetError) -> io::Error {
        use self::OctetError::*;
        use std::io::ErrorKind::*;
        let kind = match error {
            Overlap { .. } => AlreadyExists,
            OutOfRange { .. } => UnexpectedEof,
            EmptyInterval { .. } => InvalidInput,
            UnknownField(_) => io::ErrorKind::NotFound,
            FieldType(_) => InvalidInput,
            BadFieldType(_) => InvalidInput,
            Geometry => InvalidData,
            UnknownTypeCase(_) => InvalidInput,
        };
        io::Error::new(kind, error)
    }
}

impl OctetError {
    /// If the provided `io::Error` contains an `OctetError`, return the
    /// underlying `OctetError`.  If not, return None.
    pub fn from_io_error(error: &io::Error) -> Option<OctetError> {
        error
            .get_ref()
            .and_then(|e| e.downcast_ref::<OctetError>())
            .cloned()
    }

    /// This is sometimes useful instead of .into() when the compiler doesn't
    /// have enough information to perform type inference.
    pub fn to_io_error(&self) -> io::Error {
        self.clone().into()
    }

    /// Return true if the provided `io::Error` is an overlap rejection.
    pub fn is_overlap(error: &io::Error) -> bool {
        matches!(
            OctetError::from_io_error(error),
            Some(OctetError::Overlap { .. })
        )
    }

    /// Return true if the provided `io::Error` is an out-of-range read.
    pub fn is_out_of_range(error: &io::Error) -> bool {
        matches!(
            OctetError::from_io_error(error),
            Some(OctetError::OutOfRange { .. })
        )
    }
}

impl PartialEq<io::Error> for OctetError {
    fn eq(&self, other: &io::Error) -> bool {
        match OctetError::from_io_error(other) {
            Some(ref e) => e == self,
            None => false,
        }
    }
}

impl PartialEq<OctetError> for io::Error {
    fn eq(&self, other: &OctetError) -> bool {
        match OctetError::from_io_error(self) {
            Some(ref e) => e == other,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_round_trip() {
        let error = OctetError::Overlap {
            lo: 15,
            hi: 25,
            other_lo: 10,
            other_hi: 20,
        };
        let io_error: io::Error = error.clone().into();
        assert_eq!(io_error.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(OctetError::from_io_error(&io_error), Some(error.clone()));
        assert!(io_error == error);
        assert!(OctetError::is_overlap(&io_error));
        assert!(!OctetError::is_out_of_range(&io_error));
    }

    #[test]
    fn test_foreign_io_error() {
        let io_error = io::Error::new(io::ErrorKind::Other, "elsewhere");
        assert_eq!(OctetError::from_io_error(&io_error), None);
    }
}

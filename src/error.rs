use std::{error, fmt};

use bstr::ByteSlice;

pub type FieldResult<T> = std::result::Result<T, ParseFieldError>;
pub type Result<T> = std::result::Result<T, Error>;

/// How strictly a file loader treats malformed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserTolerance {
    IgnoreAll,
    Safe,
    Pedantic,
}

impl Default for ParserTolerance {
    fn default() -> Self {
        Self::Safe
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFieldError {
    /// A bytestring couldn't be parsed as UTF-8.
    Utf8Error,
    /// A field couldn't be parsed into the correct type
    ParseFromStringError,
    /// Attempted to parse an orientation that wasn't + or -.
    OrientationError,
    /// A required field was incorrectly formatted. Includes the field
    /// name.
    InvalidField(&'static str),
    MissingFields,
}

macro_rules! impl_many_from {
    ($to:ty, ($from:ty, $out:expr)) => (
        impl From<$from> for $to {
            fn from(_: $from) -> Self {
                $out
            }
        }
    );
    ($to:ty, ($from:ty, $out:expr), $(($f:ty, $o:expr)),* $(,)?) => (
        impl_many_from!($to, ($from, $out));
        impl_many_from!($to, $(($f, $o)),*);
    );
}

impl_many_from!(
    ParseFieldError,
    (std::str::Utf8Error, ParseFieldError::Utf8Error),
    (bstr::Utf8Error, ParseFieldError::Utf8Error),
    (
        std::num::ParseIntError,
        ParseFieldError::ParseFromStringError
    ),
    (
        std::num::ParseFloatError,
        ParseFieldError::ParseFromStringError
    )
);

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseFieldError as PFE;
        match self {
            PFE::Utf8Error => {
                write!(f, "Failed to parse a bytestring as a UTF-8 string")
            }
            PFE::ParseFromStringError => {
                write!(f, "Failed to parse a field from a string")
            }
            PFE::OrientationError => {
                write!(f, "Failed to parse an orientation character")
            }
            PFE::InvalidField(field) => {
                write!(f, "Failed to parse field `{}`", field)
            }
            PFE::MissingFields => write!(f, "Line is missing required fields"),
        }
    }
}

impl error::Error for ParseFieldError {}

/// Errors that abort loading or scaffolding.
#[derive(Debug)]
pub enum Error {
    /// An alignment refers to a contig that is not in the contig set,
    /// which means the alignments and contigs don't belong together.
    UnknownContig { read: String, contig: String },
    /// A contig id outside the registry was passed in.
    ContigOutOfRange(usize),
    /// A line couldn't be parsed. Includes the problem line and a
    /// variant describing the error.
    InvalidLine(ParseFieldError, String),
    /// A field couldn't be parsed
    InvalidField(ParseFieldError),
    /// Wrapper for an IO error.
    IOError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error as E;
        match self {
            E::UnknownContig { read, contig } => write!(
                f,
                "Read {} is aligned to contig {}, which is not in the contig set",
                read, contig
            ),
            E::ContigOutOfRange(id) => {
                write!(f, "Contig index {} is out of range", id)
            }
            E::InvalidLine(field_err, line) => {
                write!(f, "Failed to parse line {}, error: {}", line, field_err)
            }
            E::InvalidField(field_err) => {
                write!(f, "Failed to parse field: {}", field_err)
            }
            E::IOError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl From<std::io::Error> for Error {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl From<ParseFieldError> for Error {
    #[inline]
    fn from(err: ParseFieldError) -> Self {
        Self::InvalidField(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IOError(err) => Some(err),
            Error::InvalidLine(err, _) | Error::InvalidField(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    #[inline]
    pub(crate) fn invalid_line(error: ParseFieldError, line: &[u8]) -> Self {
        let mut dest = String::new();
        line.to_str_lossy_into(&mut dest);
        Self::InvalidLine(error, dest)
    }

    /// Whether a loader may skip the offending line and keep going.
    #[inline]
    pub fn can_safely_continue(&self, tol: &ParserTolerance) -> bool {
        use ParserTolerance as Tol;
        match tol {
            Tol::IgnoreAll => !matches!(
                self,
                Error::IOError(_) | Error::UnknownContig { .. }
            ),
            Tol::Safe => matches!(self, Error::InvalidLine(..)),
            Tol::Pedantic => false,
        }
    }
}

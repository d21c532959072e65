#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::error::ParseFieldError;

/// Strand of an alignment, or the side from which a graph vertex is
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Orientation {
    Forward,
    Backward,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Forward
    }
}

impl Orientation {
    /// `+` or `-`, as found in PAF and GFA columns.
    #[inline]
    pub fn from_bytes_plus_minus<T: AsRef<[u8]>>(bs: T) -> Option<Self> {
        match bs.as_ref() {
            b"+" => Some(Orientation::Forward),
            b"-" => Some(Orientation::Backward),
            _ => None,
        }
    }

    #[inline]
    pub fn parse_error(opt: Option<Self>) -> Result<Self, ParseFieldError> {
        opt.ok_or(ParseFieldError::OrientationError)
    }

    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Backward,
            Orientation::Backward => Orientation::Forward,
        }
    }

    #[inline]
    pub fn is_forward(self) -> bool {
        self == Orientation::Forward
    }

    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Orientation::Backward
    }

    /// Direction of the matching `ScaffoldVector`.
    #[inline]
    pub fn sign(self) -> i8 {
        if self.is_forward() {
            1
        } else {
            -1
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_forward() { "+" } else { "-" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_symbols() {
        use Orientation::*;
        assert_eq!(Orientation::from_bytes_plus_minus(b"+"), Some(Forward));
        assert_eq!(Orientation::from_bytes_plus_minus("-"), Some(Backward));
        assert_eq!(Orientation::from_bytes_plus_minus(b">"), None);
        assert_eq!(
            Orientation::parse_error(None),
            Err(ParseFieldError::OrientationError)
        );
        assert_eq!(Forward.flip(), Backward);
        assert!(Backward.is_reverse());
        assert_eq!(Backward.sign(), -1);
        assert_eq!(format!("{}{}", Forward, Backward), "+-");
    }
}

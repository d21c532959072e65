use nom::{
    character::complete::{digit1, one_of},
    combinator::{map_opt, map_res},
    multi::many1,
    sequence::pair,
    IResult,
};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::fmt;

/// Operations allowed in the overlap column of a GFA link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum CIGAROp {
    M,
    I,
    D,
    N,
    S,
    H,
    P,
    E,
    X,
}

const OP_CHARS: &str = "MIDNSHP=X";

impl CIGAROp {
    fn from_char(c: char) -> Option<Self> {
        use CIGAROp::*;
        let op = match c {
            'M' => M,
            'I' => I,
            'D' => D,
            'N' => N,
            'S' => S,
            'H' => H,
            'P' => P,
            '=' => E,
            'X' => X,
            _ => return None,
        };
        Some(op)
    }

    fn as_char(self) -> char {
        OP_CHARS.as_bytes()[self as usize] as char
    }

    /// Whether the op advances along the second segment of the link.
    #[inline]
    pub fn consumes_query(self) -> bool {
        use CIGAROp::*;
        matches!(self, M | E | X | I | S)
    }

    /// Whether the op advances along the first segment of the link.
    #[inline]
    pub fn consumes_reference(self) -> bool {
        use CIGAROp::*;
        matches!(self, M | E | X | D | N)
    }
}

/// Run-length encoded overlap between two assembly graph segments.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct CIGAR(pub Vec<(u32, CIGAROp)>);

fn run_length(input: &[u8]) -> IResult<&[u8], u32> {
    map_res(digit1, |digits: &[u8]| {
        // digit1 only matches ASCII digits
        String::from_utf8_lossy(digits).parse::<u32>()
    })(input)
}

fn operation(input: &[u8]) -> IResult<&[u8], CIGAROp> {
    map_opt(one_of(OP_CHARS), CIGAROp::from_char)(input)
}

impl CIGAR {
    pub(crate) fn parser_bytestring(input: &[u8]) -> IResult<&[u8], Self> {
        let (rest, ops) = many1(pair(run_length, operation))(input)?;
        Ok((rest, CIGAR(ops)))
    }

    /// Parse an overlap, requiring the whole input to be consumed.
    pub fn from_bytestring(input: &[u8]) -> Option<Self> {
        match Self::parser_bytestring(input) {
            Ok((rest, cigar)) if rest.is_empty() => Some(cigar),
            _ => None,
        }
    }

    fn consumed<F: Fn(CIGAROp) -> bool>(&self, pred: F) -> usize {
        self.0
            .iter()
            .filter(|(_, op)| pred(*op))
            .map(|&(len, _)| len as usize)
            .sum()
    }

    pub fn reference_len(&self) -> usize {
        self.consumed(CIGAROp::consumes_reference)
    }

    pub fn query_len(&self) -> usize {
        self.consumed(CIGAROp::consumes_query)
    }

    /// Number of bases shared by the two linked segments.
    pub fn overlap(&self) -> usize {
        self.reference_len().max(self.query_len())
    }
}

impl fmt::Display for CIGAR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|(len, op)| write!(f, "{}{}", len, op.as_char()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ops_round_trip_through_text() {
        let text = "20M12D3M4N9S10H5P11=9X";
        let cigar = CIGAR::from_bytestring(text.as_bytes()).unwrap();
        assert_eq!(cigar.0.len(), 9);
        assert_eq!(cigar.to_string(), text);
    }

    #[test]
    fn partial_input() {
        use CIGAROp::*;

        let (rest, cigar) = CIGAR::parser_bytestring(b"20M12D93  X").unwrap();
        assert_eq!(rest, b"93  X");
        assert_eq!(cigar, CIGAR(vec![(20, M), (12, D)]));
        assert_eq!(CIGAR::from_bytestring(b"20M12D93  X"), None);

        assert!(CIGAR::parser_bytestring(b"M20").is_err());
        assert!(CIGAR::parser_bytestring(b"20").is_err());
        assert!(CIGAR::parser_bytestring(b"").is_err());
    }

    #[test]
    fn overlap_lengths() {
        assert_eq!(CIGAR::from_bytestring(b"55M").unwrap().overlap(), 55);

        let cigar = CIGAR::from_bytestring(b"10M2I3D").unwrap();
        assert_eq!(cigar.reference_len(), 13);
        assert_eq!(cigar.query_len(), 12);
        assert_eq!(cigar.overlap(), 13);

        assert_eq!(CIGAR::from_bytestring(b"0M").unwrap().overlap(), 0);
    }
}

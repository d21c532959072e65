#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::fmt;

/// The position and orientation of one contig relative to the
/// coordinate frame of another.
///
/// With a positive direction the target's leftmost base sits at
/// `magnitude` in the reference frame; with a negative direction the
/// target is reverse complemented and its rightmost base sits at
/// `magnitude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ScaffoldVector {
    magnitude: i64,
    direction: i8,
}

impl Default for ScaffoldVector {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl ScaffoldVector {
    /// Any non-negative `direction` is treated as forward.
    #[inline]
    pub fn new(magnitude: i64, direction: i8) -> Self {
        let direction = if direction < 0 { -1 } else { 1 };
        ScaffoldVector {
            magnitude,
            direction,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        ScaffoldVector {
            magnitude: 0,
            direction: 1,
        }
    }

    #[inline]
    pub fn magnitude(&self) -> i64 {
        self.magnitude
    }

    #[inline]
    pub fn direction(&self) -> i8 {
        self.direction
    }

    #[inline]
    pub fn is_forward(&self) -> bool {
        self.direction > 0
    }

    #[inline]
    pub fn set_magnitude(&mut self, magnitude: i64) {
        self.magnitude = magnitude;
    }

    /// The inverse transform, i.e. the position of the reference
    /// contig as seen from the target.
    #[inline]
    pub fn reverse(&self) -> Self {
        if self.direction > 0 {
            ScaffoldVector::new(-self.magnitude, 1)
        } else {
            ScaffoldVector::new(self.magnitude, -1)
        }
    }

    /// Chain `inner` (A to B) with `outer` (B to C) into A to C.
    #[inline]
    pub fn compose(inner: Self, outer: Self) -> Self {
        ScaffoldVector {
            magnitude: inner.magnitude
                + i64::from(inner.direction) * outer.magnitude,
            direction: inner.direction * outer.direction,
        }
    }

    /// Leftmost coordinate, in the reference frame, of a contig of
    /// length `len` placed by this vector.
    #[inline]
    pub fn left_most(&self, len: usize) -> i64 {
        if self.direction > 0 {
            self.magnitude
        } else {
            self.magnitude - len as i64
        }
    }

    #[inline]
    pub fn right_most(&self, len: usize) -> i64 {
        if self.direction > 0 {
            self.magnitude + len as i64
        } else {
            self.magnitude
        }
    }

    /// Signed number of bases between a reference contig of length
    /// `ref_len` and a target contig of length `target_len` placed by
    /// this vector. Negative values are overlaps.
    pub fn distance(&self, ref_len: usize, target_len: usize) -> i64 {
        let (t_start, t_end) = (0, ref_len as i64);
        let (f_start, f_end) =
            (self.left_most(target_len), self.right_most(target_len));
        std::cmp::max(f_start - t_end, t_start - f_end)
    }
}

impl fmt::Display for ScaffoldVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = if self.direction > 0 { '+' } else { '-' };
        write!(f, "{}{}", self.magnitude, sym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vector() -> impl Strategy<Value = ScaffoldVector> {
        (-1_000_000i64..1_000_000, prop::bool::ANY)
            .prop_map(|(m, d)| ScaffoldVector::new(m, if d { 1 } else { -1 }))
    }

    proptest! {
        #[test]
        fn reverse_cancels(v in vector()) {
            let id = ScaffoldVector::identity();
            prop_assert_eq!(ScaffoldVector::compose(v.reverse(), v), id);
            prop_assert_eq!(ScaffoldVector::compose(v, v.reverse()), id);
            prop_assert_eq!(v.reverse().reverse(), v);
        }

        #[test]
        fn composition_is_associative(a in vector(), b in vector(), c in vector()) {
            use ScaffoldVector as SV;
            prop_assert_eq!(
                SV::compose(SV::compose(a, b), c),
                SV::compose(a, SV::compose(b, c))
            );
        }

        #[test]
        fn identity_is_neutral(v in vector()) {
            let id = ScaffoldVector::identity();
            prop_assert_eq!(ScaffoldVector::compose(id, v), v);
            prop_assert_eq!(ScaffoldVector::compose(v, id), v);
        }
    }

    #[test]
    fn composition_is_not_commutative() {
        let a = ScaffoldVector::new(100, -1);
        let b = ScaffoldVector::new(30, 1);
        let ab = ScaffoldVector::compose(a, b);
        let ba = ScaffoldVector::compose(b, a);
        assert_eq!(ab, ScaffoldVector::new(70, -1));
        assert_eq!(ba, ScaffoldVector::new(130, -1));
        assert_ne!(ab, ba);
    }

    #[test]
    fn distance_between_neighbours() {
        // 10 bases after a 5000 base reference
        let v = ScaffoldVector::new(5010, 1);
        assert_eq!(v.distance(5000, 50), 10);
        // reverse complemented, left end at 4990: 10 base overlap
        let v = ScaffoldVector::new(5190, -1);
        assert_eq!(v.distance(5000, 200), -10);
        // entirely to the left
        let v = ScaffoldVector::new(-60, 1);
        assert_eq!(v.distance(4000, 50), 10);
    }

    #[test]
    fn extremities() {
        let v = ScaffoldVector::new(300, -1);
        assert_eq!(v.left_most(100), 200);
        assert_eq!(v.right_most(100), 300);
        let v = ScaffoldVector::new(300, 1);
        assert_eq!(v.left_most(100), 300);
        assert_eq!(v.right_most(100), 400);
        assert_eq!(format!("{}", v), "300+");
    }
}

use bitvec::prelude::*;
use std::array;

use crate::geometry::AxisMask;

/// Location of a node within a hypertree, encoded as the sequence of child
/// positions taken from the root. Stored as a Morton (z-order) code with `N`
/// bits per level, the root being the empty code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Location<const N: usize> {
    bits: BitVec<usize, Lsb0>,
}

impl<const N: usize> Location<N> {
    /// Deepest level whose integer coordinates fit into a `u64`.
    pub const MAX_COORDINATE_LEVEL: usize = u64::BITS as usize;

    /// Location of the root node.
    pub fn root() -> Self {
        Self {
            bits: BitVec::new(),
        }
    }

    /// Number of refinements between the root and this location.
    pub fn level(&self) -> usize {
        self.bits.len() / N
    }

    /// Child position taken when descending from `level` to `level + 1`.
    pub fn split(&self, level: usize) -> AxisMask<N> {
        debug_assert!(level < self.level());
        AxisMask::pack(array::from_fn(|axis| self.bits[N * level + axis]))
    }

    /// Iterates the child positions from the root downwards.
    pub fn splits(&self) -> impl Iterator<Item = AxisMask<N>> + '_ {
        (0..self.level()).map(|level| self.split(level))
    }

    /// Descends into the given child.
    pub fn push(&mut self, split: AxisMask<N>) {
        for axis in 0..N {
            self.bits.push(split.is_set(axis));
        }
    }

    /// Ascends to the parent location, returning the child position that was left.
    pub fn pop(&mut self) -> Option<AxisMask<N>> {
        if self.level() == 0 {
            return None;
        }

        let split = self.split(self.level() - 1);
        self.bits.truncate(self.bits.len() - N);
        Some(split)
    }

    /// Integer coordinates of the location on its own level, i.e. in `[0, 2^level)` along
    /// each axis.
    ///
    /// # Panics
    /// If the location lies deeper than [`Location::MAX_COORDINATE_LEVEL`].
    pub fn coordinates(&self) -> [u64; N] {
        assert!(
            self.level() <= Self::MAX_COORDINATE_LEVEL,
            "location on level {} does not fit into integer coordinates",
            self.level()
        );

        let mut result = [0u64; N];

        for split in self.splits() {
            for axis in 0..N {
                result[axis] = (result[axis] << 1) | split.is_set(axis) as u64;
            }
        }

        result
    }

    /// Builds a location from integer coordinates on the given level.
    ///
    /// # Panics
    /// If `level` exceeds [`Location::MAX_COORDINATE_LEVEL`].
    pub fn from_coordinates(level: usize, coordinates: [u64; N]) -> Self {
        assert!(
            level <= Self::MAX_COORDINATE_LEVEL,
            "level {level} does not fit into integer coordinates"
        );
        debug_assert!(coordinates
            .iter()
            .all(|&c| level == Self::MAX_COORDINATE_LEVEL || c < (1u64 << level)));

        let mut result = Self::root();
        result.bits.reserve(N * level);

        for l in 0..level {
            let shift = level - 1 - l;
            result.push(AxisMask::pack(array::from_fn(|axis| {
                (coordinates[axis] >> shift) & 1 == 1
            })));
        }

        result
    }

    /// Location of the cell on the same level displaced by `offset` cells. Returns `None`
    /// if the displaced cell lies outside of the root.
    ///
    /// The offset is added directly to the bits of each axis, so locations of any depth
    /// are supported.
    pub fn shifted(&self, offset: [isize; N]) -> Option<Self> {
        let mut result = self.clone();

        for axis in 0..N {
            let mut carry = offset[axis] as i128;

            // Finest level holds the least significant bit.
            for level in (0..self.level()).rev() {
                if carry == 0 {
                    break;
                }

                let index = N * level + axis;
                let sum = result.bits[index] as i128 + carry;
                result.bits.set(index, sum.rem_euclid(2) == 1);
                carry = sum.div_euclid(2);
            }

            if carry != 0 {
                return None;
            }
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates() {
        let mut location = Location::<1>::root();
        assert_eq!(location.level(), 0);
        assert_eq!(location.shifted([1]), None);

        location.push(AxisMask::pack([true]));
        location.push(AxisMask::pack([false]));
        location.push(AxisMask::pack([false]));
        assert_eq!(location.level(), 3);
        assert_eq!(location.coordinates(), [4]);
        assert_eq!(Location::from_coordinates(3, [4]), location);

        let left = location.shifted([-1]).unwrap();
        assert_eq!(left.coordinates(), [3]);
        assert_eq!(
            left.splits().map(|s| s.to_linear()).collect::<Vec<_>>(),
            vec![0, 1, 1]
        );

        assert_eq!(location.pop(), Some(AxisMask::pack([false])));
        assert_eq!(location.coordinates(), [2]);
    }

    #[test]
    fn shifted_out_of_domain() {
        let location = Location::<2>::from_coordinates(2, [3, 0]);
        assert_eq!(location.split(0), AxisMask::pack([true, false]));
        assert_eq!(location.split(1), AxisMask::pack([true, false]));
        assert_eq!(location.shifted([1, 0]), None);
        assert_eq!(location.shifted([0, -1]), None);
        assert_eq!(
            location.shifted([-1, 1]).map(|l| l.coordinates()),
            Some([2, 1])
        );
    }

    #[test]
    fn shifted_beyond_integer_coordinates() {
        let depth = 3 * Location::<2>::MAX_COORDINATE_LEVEL / 2;

        // Last cell along x, first cell along y.
        let mut location = Location::<2>::root();
        for _ in 0..depth {
            location.push(AxisMask::pack([true, false]));
        }

        assert_eq!(location.shifted([1, 0]), None);
        assert_eq!(location.shifted([0, -1]), None);
        assert_eq!(location.shifted([0, 0]), Some(location.clone()));

        // Only the finest bits change, one borrow on x and one carry on y.
        let left = location.shifted([-1, 1]).unwrap();
        assert_eq!(left.level(), depth);
        assert_eq!(left.split(0), AxisMask::pack([true, false]));
        assert_eq!(left.split(depth - 2), AxisMask::pack([true, false]));
        assert_eq!(left.split(depth - 1), AxisMask::pack([false, true]));

        assert_eq!(left.shifted([1, -1]), Some(location));

        // A carry running through every level.
        let mut inner = Location::<1>::root();
        inner.push(AxisMask::pack([false]));
        for _ in 1..depth {
            inner.push(AxisMask::pack([true]));
        }

        let next = inner.shifted([1]).unwrap();
        assert_eq!(next.split(0), AxisMask::pack([true]));
        assert!(next.splits().skip(1).all(|split| split == AxisMask::pack([false])));
        assert_eq!(next.shifted([-1]), Some(inner));
    }

    #[test]
    #[should_panic]
    fn coordinates_too_deep() {
        let mut location = Location::<1>::root();
        for _ in 0..=Location::<1>::MAX_COORDINATE_LEVEL {
            location.push(AxisMask::pack([false]));
        }
        location.coordinates();
    }
}

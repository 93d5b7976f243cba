/// A set of axes, stored as a bitmask. Used to identify the position of a
/// child within its parent (bit `i` set means the child lies on the positive
/// side of axis `i`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct AxisMask<const N: usize>(usize);

impl<const N: usize> AxisMask<N> {
    /// Number of distinct masks (and therefore children of a node) in `N` dimensions.
    pub const COUNT: usize = 2usize.pow(N as u32);

    pub const fn enumerate() -> AxisMaskIter<N> {
        AxisMaskIter { cursor: 0 }
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_linear(linear: usize) -> Self {
        debug_assert!(linear < Self::COUNT);
        Self(linear)
    }

    pub fn to_linear(self) -> usize {
        self.0
    }

    pub fn pack(bits: [bool; N]) -> Self {
        let mut result = Self::empty();

        for (i, bit) in bits.into_iter().enumerate() {
            result.set_to(i, bit);
        }

        result
    }

    pub fn set_to(&mut self, axis: usize, value: bool) {
        self.0 &= !(1 << axis);
        self.0 |= (value as usize) << axis;
    }

    pub fn is_set(self, axis: usize) -> bool {
        (self.0 & (1 << axis)) != 0
    }
}

pub struct AxisMaskIter<const N: usize> {
    cursor: usize,
}

impl<const N: usize> Iterator for AxisMaskIter<N> {
    type Item = AxisMask<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= AxisMask::<N>::COUNT {
            return None;
        }

        let result = self.cursor;
        self.cursor += 1;
        Some(AxisMask::from_linear(result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = AxisMask::<N>::COUNT - self.cursor;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> ExactSizeIterator for AxisMaskIter<N> {}

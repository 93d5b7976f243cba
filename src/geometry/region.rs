use super::AxisMask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left = 0,
    Middle = 1,
    Right = 2,
}

impl Side {
    pub fn reverse(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Middle => Self::Middle,
        }
    }

    fn from_value(value: usize) -> Self {
        match value {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            _ => unreachable!(),
        }
    }
}

/// One of the `3^N` regions surrounding (and including) a cell. Every region
/// other than `Region::CENTRAL` identifies a neighboring direction across a face,
/// an edge or a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region<const N: usize> {
    sides: [Side; N],
}

impl<const N: usize> Region<N> {
    /// Number of different regions in a given number of dimensions.
    pub const COUNT: usize = 3usize.pow(N as u32);

    pub const CENTRAL: Self = Self::new([Side::Middle; N]);

    pub const fn new(sides: [Side; N]) -> Self {
        Self { sides }
    }

    pub fn reverse(&self) -> Self {
        Self::new(self.sides.map(Side::reverse))
    }

    /// Iterates all child positions of a cell which touch this region.
    pub fn adjacent_splits(self) -> impl Iterator<Item = AxisMask<N>> {
        AxisMask::<N>::enumerate().filter(move |split| {
            (0..N).all(|axis| match self.sides[axis] {
                Side::Left => !split.is_set(axis),
                Side::Middle => true,
                Side::Right => split.is_set(axis),
            })
        })
    }

    /// Offset of the neighbor in this region, in units of cells on the same level.
    pub fn offset_dir(&self) -> [isize; N] {
        self.sides.map(|side| match side {
            Side::Left => -1,
            Side::Right => 1,
            Side::Middle => 0,
        })
    }

    pub fn from_linear(mut linear: usize) -> Self {
        debug_assert!(linear < Self::COUNT);

        let mut sides = [Side::Middle; N];
        for side in sides.iter_mut() {
            *side = Side::from_value(linear % 3);
            linear /= 3;
        }

        Self::new(sides)
    }
}

pub struct RegionIter<const N: usize> {
    cursor: usize,
}

impl<const N: usize> Iterator for RegionIter<N> {
    type Item = Region<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= Region::<N>::COUNT {
            return None;
        }

        let result = Region::from_linear(self.cursor);
        self.cursor += 1;
        Some(result)
    }
}

/// Iterates all `3^N` regions (including the central one).
pub fn regions<const N: usize>() -> RegionIter<N> {
    RegionIter { cursor: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_enumeration() {
        assert_eq!(regions::<2>().count(), 9);
        assert_eq!(
            regions::<3>().filter(|r| *r != Region::CENTRAL).count(),
            26
        );

        let corner = Region::new([Side::Right, Side::Left]);
        assert_eq!(corner.offset_dir(), [1, -1]);
        assert_eq!(corner.reverse(), Region::new([Side::Left, Side::Right]));

        let splits = corner.adjacent_splits().collect::<Vec<_>>();
        assert_eq!(splits, vec![AxisMask::pack([true, false])]);

        let face = Region::new([Side::Left, Side::Middle]);
        assert_eq!(face.offset_dir(), [-1, 0]);
        assert_eq!(
            face.adjacent_splits().collect::<Vec<_>>(),
            vec![AxisMask::pack([false, false]), AxisMask::pack([false, true])]
        );
    }
}

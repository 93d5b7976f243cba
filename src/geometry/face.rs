/// A face of a rectangular prism in `N` dimensional space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Face<const N: usize> {
    pub axis: usize,
    pub side: bool,
}

impl<const N: usize> Face<N> {
    /// Face on negative side of axis.
    pub fn negative(axis: usize) -> Self {
        assert!(axis < N);
        Self { axis, side: false }
    }

    /// Face on positive side of axis.
    pub fn positive(axis: usize) -> Self {
        assert!(axis < N);
        Self { axis, side: true }
    }

    /// Offset of the cell across this face, in units of cells on the same level.
    pub fn offset(self) -> [isize; N] {
        let mut result = [0; N];
        result[self.axis] = if self.side { 1 } else { -1 };
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        assert_eq!(Face::<2>::negative(1).offset(), [0, -1]);
        assert_eq!(Face::<3>::positive(0).offset(), [1, 0, 0]);
    }

    #[test]
    #[should_panic]
    fn axis_out_of_range() {
        Face::<2>::positive(2);
    }
}

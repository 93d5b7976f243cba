use std::array::from_fn;

use crate::geometry::AxisMask;

/// Represents a rectangular physical domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle<const N: usize> {
    /// Size of the rectangle along each axis.
    pub size: [f64; N],
    /// Origin of the rectangle (located at the bottom-left corner).
    pub origin: [f64; N],
}

impl<const N: usize> Rectangle<N> {
    /// Unit rectangle.
    pub const UNIT: Self = Rectangle {
        size: [1.0; N],
        origin: [0.0; N],
    };

    /// Computes the center of the rectangle.
    pub fn center(&self) -> [f64; N] {
        from_fn(|i| self.origin[i] + self.size[i] / 2.0)
    }

    /// Returns the subdivision of the rectangle identified by `mask`.
    pub fn split(&self, mask: AxisMask<N>) -> Self {
        let size = from_fn(|i| self.size[i] / 2.0);
        let origin = from_fn(|i| {
            if mask.is_set(i) {
                self.origin[i] + size[i]
            } else {
                self.origin[i]
            }
        });

        Self { size, origin }
    }

    /// Checks whether the rectangle contains the given point.
    pub fn contains(&self, point: [f64; N]) -> bool {
        (0..N).all(|i| point[i] >= self.origin[i] && point[i] <= self.origin[i] + self.size[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split() {
        let rect = Rectangle {
            size: [2.0, 4.0],
            origin: [1.0, 0.0],
        };

        let child = rect.split(AxisMask::pack([true, false]));
        assert_eq!(child.size, [1.0, 2.0]);
        assert_eq!(child.origin, [2.0, 0.0]);
        assert_eq!(child.center(), [2.5, 1.0]);
        assert!(rect.contains([2.5, 1.0]));
        assert!(!child.contains([1.5, 1.0]));
    }
}

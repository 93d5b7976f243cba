//! Geometric primitives used to navigate hypertrees (child positions, faces,
//! neighboring regions and axis aligned rectangles).

mod axis;
mod face;
mod rectangle;
mod region;

pub use axis::{AxisMask, AxisMaskIter};
pub use face::Face;
pub use rectangle::Rectangle;
pub use region::{regions, Region, RegionIter, Side};

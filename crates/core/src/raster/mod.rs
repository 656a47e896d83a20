//! Grid data structures and spatial metadata

mod descriptor;
mod geotransform;
mod grid;

pub use descriptor::SpatialDescriptor;
pub use geotransform::GeoTransform;
pub use grid::{CategoryCode, Grid, CLASS_CODE_LIMIT, NODATA};

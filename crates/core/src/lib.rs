//! # Anthrome Core
//!
//! Core types and I/O for the anthrome land-use stability toolkit.
//!
//! This crate provides:
//! - `Grid`: immutable categorical grid with a `NODATA` sentinel
//! - `GeoTransform`, `CRS` and `SpatialDescriptor`: spatial metadata carried to outputs
//! - `RasterStore`: named grid storage backed by GeoTIFF files or memory

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use io::{GeoTiffStore, MemoryStore, RasterStore};
pub use raster::{CategoryCode, GeoTransform, Grid, SpatialDescriptor, CLASS_CODE_LIMIT, NODATA};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::io::RasterStore;
    pub use crate::raster::{CategoryCode, GeoTransform, Grid, SpatialDescriptor, NODATA};
}

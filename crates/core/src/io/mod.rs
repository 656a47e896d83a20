//! Reading and writing grids

mod native;
mod store;

pub use native::{
    read_geotiff, read_geotiff_from_buffer, read_geotiff_header, write_geotiff,
    write_geotiff_to_buffer, GeoTiffOptions, PixelDepth,
};
pub use store::{GeoTiffStore, MemoryStore, RasterStore};

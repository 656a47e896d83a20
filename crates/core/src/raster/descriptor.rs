//! Opaque spatial metadata forwarded to raster stores

use serde::{Deserialize, Serialize};

use crate::crs::CRS;
use crate::raster::GeoTransform;

/// Extent, resolution and coordinate reference of a stored grid.
///
/// The algebra never inspects a descriptor. The pipeline takes one from the
/// reference layer and hands it unchanged to every `save`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialDescriptor {
    pub transform: GeoTransform,
    pub crs: Option<CRS>,
}

impl SpatialDescriptor {
    pub fn new(transform: GeoTransform, crs: Option<CRS>) -> Self {
        Self { transform, crs }
    }
}

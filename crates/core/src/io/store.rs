//! Named grid storage used by the pipeline

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::io::native::{
    read_geotiff, read_geotiff_header, write_geotiff, GeoTiffOptions, PixelDepth,
};
use crate::raster::{Grid, SpatialDescriptor};

/// Source and sink of named grids.
///
/// `load` takes `&self` so several years can be read concurrently; every
/// failure to produce a grid is reported as [`Error::LayerNotFound`].
pub trait RasterStore {
    /// Load the grid stored under `key`
    fn load(&self, key: &str) -> Result<Grid>;

    /// Spatial metadata of the grid stored under `key`
    fn describe(&self, key: &str) -> Result<SpatialDescriptor>;

    /// Check that `grid` could be saved under `key` without writing it.
    ///
    /// Callers saving several grids check all of them first so a rejected
    /// grid leaves nothing behind.
    fn ensure_writable(&self, _key: &str, _grid: &Grid) -> Result<()> {
        Ok(())
    }

    /// Persist `grid` under `key` with the given spatial metadata
    fn save(&mut self, key: &str, grid: &Grid, descriptor: &SpatialDescriptor) -> Result<()>;
}

/// GeoTIFF files below a root directory; keys are relative paths.
#[derive(Debug, Clone)]
pub struct GeoTiffStore {
    root: PathBuf,
    pixel_depth: PixelDepth,
}

impl GeoTiffStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pixel_depth: PixelDepth::default(),
        }
    }

    /// Sample depth used for every written grid
    pub fn with_pixel_depth(mut self, pixel_depth: PixelDepth) -> Self {
        self.pixel_depth = pixel_depth;
        self
    }

    /// Absolute path backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn not_found(key: &str, err: Error) -> Error {
    Error::LayerNotFound {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

impl RasterStore for GeoTiffStore {
    fn load(&self, key: &str) -> Result<Grid> {
        read_geotiff(self.path_for(key))
            .map(|(grid, _)| grid)
            .map_err(|e| not_found(key, e))
    }

    fn describe(&self, key: &str) -> Result<SpatialDescriptor> {
        read_geotiff_header(self.path_for(key)).map_err(|e| not_found(key, e))
    }

    fn ensure_writable(&self, _key: &str, grid: &Grid) -> Result<()> {
        self.pixel_depth.ensure_fits(grid)
    }

    fn save(&mut self, key: &str, grid: &Grid, descriptor: &SpatialDescriptor) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let options = GeoTiffOptions {
            pixel_depth: self.pixel_depth,
        };
        write_geotiff(grid, descriptor, &path, Some(options))
    }
}

/// In-memory store, ordered by key
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    layers: BTreeMap<String, (Grid, SpatialDescriptor)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a grid with default spatial metadata
    pub fn insert(&mut self, key: impl Into<String>, grid: Grid) {
        self.layers
            .insert(key.into(), (grid, SpatialDescriptor::default()));
    }

    /// Insert a grid with explicit spatial metadata
    pub fn insert_with(&mut self, key: impl Into<String>, grid: Grid, descriptor: SpatialDescriptor) {
        self.layers.insert(key.into(), (grid, descriptor));
    }

    pub fn get(&self, key: &str) -> Option<&Grid> {
        self.layers.get(key).map(|(grid, _)| grid)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.layers.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn entry(&self, key: &str) -> Result<&(Grid, SpatialDescriptor)> {
        self.layers.get(key).ok_or_else(|| Error::LayerNotFound {
            key: key.to_string(),
            reason: "no such layer".to_string(),
        })
    }
}

impl RasterStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Grid> {
        self.entry(key).map(|(grid, _)| grid.clone())
    }

    fn describe(&self, key: &str) -> Result<SpatialDescriptor> {
        self.entry(key).map(|(_, descriptor)| descriptor.clone())
    }

    fn save(&mut self, key: &str, grid: &Grid, descriptor: &SpatialDescriptor) -> Result<()> {
        self.insert_with(key, grid.clone(), descriptor.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CRS;
    use crate::raster::{GeoTransform, NODATA};

    #[test]
    fn test_memory_store_missing_layer() {
        let store = MemoryStore::new();
        let err = store.load("CDL_2016_Forest.tif").unwrap_err();
        assert!(matches!(err, Error::LayerNotFound { ref key, .. } if key == "CDL_2016_Forest.tif"));
    }

    #[test]
    fn test_memory_store_save_load() {
        let mut store = MemoryStore::new();
        let grid = Grid::from_vec(vec![50, NODATA], 1, 2).unwrap();
        let desc = SpatialDescriptor::new(GeoTransform::default(), Some(CRS::utm_11n()));
        store.save("results/anthrome.tif", &grid, &desc).unwrap();

        assert_eq!(store.load("results/anthrome.tif").unwrap(), grid);
        assert_eq!(store.describe("results/anthrome.tif").unwrap(), desc);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["results/anthrome.tif"]);
    }

    #[test]
    fn test_geotiff_store_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = GeoTiffStore::new(dir.path());
        let grid = Grid::from_vec(vec![150, 251, NODATA, 50], 2, 2).unwrap();
        let desc = SpatialDescriptor::new(GeoTransform::new(0.0, 90.0, 30.0, -30.0), None);

        store.save("results/nested/anthrome.tif", &grid, &desc).unwrap();
        assert!(store.path_for("results/nested/anthrome.tif").exists());
        assert_eq!(store.load("results/nested/anthrome.tif").unwrap(), grid);
    }

    #[test]
    fn test_geotiff_store_checks_depth_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let narrow = GeoTiffStore::new(dir.path()).with_pixel_depth(PixelDepth::U8);
        let wide = GeoTiffStore::new(dir.path());
        let grid = Grid::from_vec(vec![271, 41], 1, 2).unwrap();

        assert!(matches!(
            narrow.ensure_writable("results/anthromeUnstable.tif", &grid),
            Err(Error::UnsupportedDataType(_))
        ));
        assert!(wide.ensure_writable("results/anthromeUnstable.tif", &grid).is_ok());
        assert!(MemoryStore::new().ensure_writable("any", &grid).is_ok());
    }

    #[test]
    fn test_geotiff_store_describe_reads_tags() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = GeoTiffStore::new(dir.path());
        let desc = SpatialDescriptor::new(
            GeoTransform::new(300_000.0, 5_100_000.0, 30.0, -30.0),
            Some(CRS::utm_11n()),
        );
        store.save("snap.tif", &Grid::filled(3, 3, 50), &desc).unwrap();

        assert_eq!(store.describe("snap.tif").unwrap(), desc);
        assert!(matches!(
            store.describe("absent.tif"),
            Err(Error::LayerNotFound { .. })
        ));
    }

    #[test]
    fn test_geotiff_store_missing_file_is_layer_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = GeoTiffStore::new(dir.path());
        assert!(matches!(
            store.load("absent.tif"),
            Err(Error::LayerNotFound { .. })
        ));
    }
}

//! Annual land-cover composite
//!
//! One year's classification is built from ten thematic presence layers:
//! agriculture sources are merged into code 50, water-like sources into
//! code 51, then the layers are mosaicked by a fixed precedence.

use std::fmt;

use anthrome_core::{CategoryCode, Error, Grid, RasterStore, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algebra::{combine, reclassify};
use crate::pipeline::LayerNaming;
use crate::temporal::Year;

/// Unified agriculture class
pub const AGRICULTURE: CategoryCode = 50;
/// Unified water, wetland, barren and wilderness class
pub const WATER_OTHER: CategoryCode = 51;

/// Thematic source layers available for each year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThematicLayer {
    AgNoIrrigated,
    Irrigated,
    Orchard,
    Forest,
    Water,
    Wetland,
    Barren,
    Wilderness,
    Urban,
    Range,
}

impl ThematicLayer {
    pub const ALL: [ThematicLayer; 10] = [
        Self::AgNoIrrigated,
        Self::Irrigated,
        Self::Orchard,
        Self::Forest,
        Self::Water,
        Self::Wetland,
        Self::Barren,
        Self::Wilderness,
        Self::Urban,
        Self::Range,
    ];

    /// Masks merged into [`AGRICULTURE`]
    pub const AGRICULTURE_SOURCES: [ThematicLayer; 3] =
        [Self::AgNoIrrigated, Self::Irrigated, Self::Orchard];

    /// Masks merged into [`WATER_OTHER`]
    pub const WATER_OTHER_SOURCES: [ThematicLayer; 4] =
        [Self::Water, Self::Wetland, Self::Barren, Self::Wilderness];

    /// Name used in store keys
    pub fn name(self) -> &'static str {
        match self {
            Self::AgNoIrrigated => "AgNoIrrigated",
            Self::Irrigated => "Irrigated",
            Self::Orchard => "Orchard",
            Self::Forest => "Forest",
            Self::Water => "Water",
            Self::Wetland => "Wetland",
            Self::Barren => "Barren",
            Self::Wilderness => "Wilderness",
            Self::Urban => "Urban",
            Self::Range => "Range",
        }
    }
}

impl fmt::Display for ThematicLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source grids for one year, indexed like [`ThematicLayer::ALL`]
#[derive(Debug, Clone)]
pub struct AnnualLayers {
    year: Year,
    grids: [Grid; 10],
}

impl AnnualLayers {
    /// Build from grids given in [`ThematicLayer::ALL`] order
    pub fn new(year: Year, grids: [Grid; 10]) -> Self {
        Self { year, grids }
    }

    /// Load every thematic layer of `year` from `store`.
    ///
    /// # Errors
    /// `MissingLayer` naming the year and the first layer that failed.
    pub fn load<S>(store: &S, naming: &LayerNaming, year: Year) -> Result<Self>
    where
        S: RasterStore + ?Sized,
    {
        let mut grids = Vec::with_capacity(ThematicLayer::ALL.len());
        for layer in ThematicLayer::ALL {
            let key = naming.key_for(year, layer);
            debug!(year, layer = layer.name(), key = %key, "loading layer");
            let grid = store.load(&key).map_err(|source| Error::MissingLayer {
                year,
                layer: layer.name(),
                source: Box::new(source),
            })?;
            grids.push(grid);
        }
        let grids: [Grid; 10] = grids
            .try_into()
            .map_err(|_| Error::Other("thematic layer count changed".into()))?;
        Ok(Self { year, grids })
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn get(&self, layer: ThematicLayer) -> &Grid {
        &self.grids[layer as usize]
    }

    fn select<const K: usize>(&self, layers: [ThematicLayer; K]) -> [&Grid; K] {
        layers.map(|layer| self.get(layer))
    }
}

/// Merged masks behind one year's composite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualMasks {
    /// Union of agriculture sources as [`AGRICULTURE`]
    pub agriculture: Grid,
    /// Union of water-like sources as [`WATER_OTHER`]
    pub water_other: Grid,
}

/// Result of classifying one year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualComposite {
    pub year: Year,
    /// Final classification for the year
    pub composite: Grid,
    /// Only kept when intermediates are requested
    pub masks: Option<AnnualMasks>,
}

impl AnnualComposite {
    /// Release the merged masks, keeping only the composite
    pub fn without_masks(self) -> Self {
        Self { masks: None, ..self }
    }
}

/// Build the composite classification for one year.
///
/// Precedence is agriculture, forest, water/other, urban, range.
pub fn classify_year(layers: &AnnualLayers) -> Result<AnnualComposite> {
    let year = layers.year();

    debug!(year, "processing agriculture layer");
    let agriculture = reclassify(&layers.select(ThematicLayer::AGRICULTURE_SOURCES), AGRICULTURE)?;

    debug!(year, "processing water and other layer");
    let water_other = reclassify(&layers.select(ThematicLayer::WATER_OTHER_SOURCES), WATER_OTHER)?;

    debug!(year, "stitching year");
    let composite = combine(&[
        &agriculture,
        layers.get(ThematicLayer::Forest),
        &water_other,
        layers.get(ThematicLayer::Urban),
        layers.get(ThematicLayer::Range),
    ])?;

    Ok(AnnualComposite {
        year,
        composite,
        masks: Some(AnnualMasks {
            agriculture,
            water_other,
        }),
    })
}

/// Loads a year's layers from a store and classifies them
pub struct AnnualClassifier<'a, S: ?Sized> {
    store: &'a S,
    naming: &'a LayerNaming,
    keep_masks: bool,
}

impl<'a, S: RasterStore + ?Sized> AnnualClassifier<'a, S> {
    pub fn new(store: &'a S, naming: &'a LayerNaming) -> Self {
        Self {
            store,
            naming,
            keep_masks: false,
        }
    }

    /// Keep the merged agriculture and water/other masks in each result
    pub fn with_masks(mut self, keep: bool) -> Self {
        self.keep_masks = keep;
        self
    }

    pub fn classify(&self, year: Year) -> Result<AnnualComposite> {
        let layers = AnnualLayers::load(self.store, self.naming, year)?;
        let composite = classify_year(&layers)?;
        Ok(if self.keep_masks {
            composite
        } else {
            composite.without_masks()
        })
    }
}

//! # Anthrome Algorithms
//!
//! Temporal raster algebra for land-use stability classification.
//!
//! ## Modules
//!
//! - **algebra**: priority mosaic and mask-union reclassification
//! - **annual**: one year's composite from thematic layers
//! - **temporal**: year series, majority/variety aggregation, tie backfill
//! - **stability**: stable / dynamic / unstable classification
//! - **pipeline**: configuration, cancellation and the end-to-end run

pub mod algebra;
pub mod annual;
mod maybe_rayon;
pub mod pipeline;
pub mod stability;
pub mod temporal;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::algebra::{combine, reclassify};
    pub use crate::annual::{
        classify_year, AnnualClassifier, AnnualComposite, AnnualLayers, AnnualMasks,
        ThematicLayer, AGRICULTURE, WATER_OTHER,
    };
    pub use crate::pipeline::{
        CancellationToken, LayerNaming, OutputNaming, PipelineConfig, PipelineOutput,
        StabilityPipeline,
    };
    pub use crate::stability::{
        classify_stability, stability_cutoff, StabilityClass, StabilityGrids,
    };
    pub use crate::temporal::{aggregate, backfill, CellStatistics, RasterSeries, Year};
    pub use anthrome_core::prelude::*;
}

//! End-to-end stability pipeline
//!
//! Stages run strictly in order, with a cancellation check before each:
//!
//! 1. annual classification, one composite per year (years in parallel)
//! 2. temporal aggregation into majority and variety
//! 3. majority backfill from the latest year
//! 4. stability classification
//! 5. final mosaic of the three stability grids
//!
//! Nothing is written until every stage has succeeded.

mod cancel;
mod config;

pub use cancel::CancellationToken;
pub use config::{LayerNaming, OutputNaming, PipelineConfig};

use anthrome_core::{Grid, RasterStore, Result, SpatialDescriptor};
use tracing::{debug, info};

use crate::annual::{AnnualClassifier, AnnualComposite};
use crate::maybe_rayon::*;
use crate::stability::{classify_stability, StabilityGrids};
use crate::temporal::{aggregate, backfill, RasterSeries};

/// Stage names reported in errors and logs
pub mod stage {
    pub const SPATIAL_REFERENCE: &str = "spatial reference";
    pub const ANNUAL: &str = "annual classification";
    pub const AGGREGATE: &str = "temporal aggregation";
    pub const BACKFILL: &str = "majority backfill";
    pub const STABILITY: &str = "stability classification";
    pub const MOSAIC: &str = "final mosaic";
    pub const SAVE: &str = "save outputs";
}

/// Every grid produced by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Per-year composites, most recent first
    pub annual: Vec<AnnualComposite>,
    /// Majority before backfill
    pub raw_majority: Grid,
    /// Majority after backfill
    pub majority: Grid,
    pub variety: Grid,
    pub stability: StabilityGrids,
    /// Stable, dynamic and unstable grids merged into one
    pub composite: Grid,
}

/// Configured stability pipeline
#[derive(Debug, Clone)]
pub struct StabilityPipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl StabilityPipeline {
    /// Validate `config` and build a pipeline
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run every stage against `store` without writing anything.
    pub fn compute<S>(&self, store: &S) -> Result<PipelineOutput>
    where
        S: RasterStore + Sync + ?Sized,
    {
        let years = &self.config.years;

        self.begin(stage::ANNUAL)?;
        info!(years = years.len(), "creating annual composites");
        let classifier = AnnualClassifier::new(store, &self.config.layers)
            .with_masks(self.config.save_intermediate_layers);
        let annual: Vec<AnnualComposite> = years
            .par_iter()
            .map(|&year| {
                info!(year, "classifying year");
                classifier.classify(year)
            })
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.in_stage(stage::ANNUAL))?;

        self.begin(stage::AGGREGATE)?;
        let series = RasterSeries::new(annual.iter().map(|a| (a.year, &a.composite)))
            .map_err(|e| e.in_stage(stage::AGGREGATE))?;
        info!("calculating majorities and varieties");
        let stats = aggregate(&series).map_err(|e| e.in_stage(stage::AGGREGATE))?;

        self.begin(stage::BACKFILL)?;
        let (latest_year, latest) = series.most_recent();
        debug!(latest_year, "filling majority ties");
        let majority =
            backfill(&stats.majority, latest).map_err(|e| e.in_stage(stage::BACKFILL))?;

        self.begin(stage::STABILITY)?;
        info!("generating stable, dynamic, and unstable grids");
        let stability = classify_stability(&majority, &stats.variety, series.len())
            .map_err(|e| e.in_stage(stage::STABILITY))?;
        debug!(cutoff = stability.cutoff, "dynamic/unstable cutoff");

        self.begin(stage::MOSAIC)?;
        let composite = stability
            .composite()
            .map_err(|e| e.in_stage(stage::MOSAIC))?;

        Ok(PipelineOutput {
            raw_majority: stats.majority,
            majority,
            variety: stats.variety,
            stability,
            composite,
            annual,
        })
    }

    /// Compute every stage, then save results with the spatial metadata of
    /// the configured reference layer.
    pub fn run<S>(&self, store: &mut S) -> Result<PipelineOutput>
    where
        S: RasterStore + Sync,
    {
        let descriptor = self.reference_descriptor(&*store)?;
        self.run_with_descriptor(store, &descriptor)
    }

    /// Like [`run`](Self::run) with an explicit spatial descriptor
    pub fn run_with_descriptor<S>(
        &self,
        store: &mut S,
        descriptor: &SpatialDescriptor,
    ) -> Result<PipelineOutput>
    where
        S: RasterStore + Sync,
    {
        let output = self.compute(&*store)?;
        self.begin(stage::SAVE)?;
        self.save(store, &output, descriptor)
            .map_err(|e| e.in_stage(stage::SAVE))?;
        info!("done");
        Ok(output)
    }

    /// Spatial metadata of the reference layer
    pub fn reference_descriptor<S>(&self, store: &S) -> Result<SpatialDescriptor>
    where
        S: RasterStore + ?Sized,
    {
        let latest = self.config.years[0];
        let key = self.config.layers.reference_key(latest);
        store
            .describe(&key)
            .map_err(|e| e.in_stage(stage::SPATIAL_REFERENCE))
    }

    /// Write the result grids and, if configured, the intermediates.
    ///
    /// Every grid is checked with [`RasterStore::ensure_writable`] before
    /// anything is written.
    pub fn save<S>(
        &self,
        store: &mut S,
        output: &PipelineOutput,
        descriptor: &SpatialDescriptor,
    ) -> Result<()>
    where
        S: RasterStore + ?Sized,
    {
        let names = &self.config.outputs;
        let mut outputs: Vec<(String, &Grid)> = Vec::new();

        if self.config.save_intermediate_layers {
            for year in &output.annual {
                let y = year.year;
                if let Some(masks) = &year.masks {
                    let agriculture = names.working(&format!("agriculture_{}.tif", y));
                    let water_other = names.working(&format!("waterOther_{}.tif", y));
                    outputs.push((agriculture, &masks.agriculture));
                    outputs.push((water_other, &masks.water_other));
                }
                outputs.push((names.working(&format!("anthrome{}.tif", y)), &year.composite));
            }
            outputs.push((names.working("anthromeMajorityRasterTemp.tif"), &output.raw_majority));
            outputs.push((names.working("anthromeMajorityRaster.tif"), &output.majority));
            outputs.push((names.working("anthromeVarietyRaster.tif"), &output.variety));
        }

        outputs.push((names.result("anthromeStable.tif"), &output.stability.stable));
        outputs.push((names.result("anthromeDynamic.tif"), &output.stability.dynamic));
        outputs.push((names.result("anthromeUnstable.tif"), &output.stability.unstable));
        outputs.push((names.result("anthrome.tif"), &output.composite));

        // Reject before the first write so a failed save leaves no outputs.
        for (key, grid) in &outputs {
            store.ensure_writable(key, grid)?;
        }
        for (key, grid) in outputs {
            debug!(key = %key, "saving");
            store.save(&key, grid, descriptor)?;
        }
        Ok(())
    }

    fn begin(&self, stage: &'static str) -> Result<()> {
        self.cancel.check(stage)?;
        debug!(stage, "starting stage");
        Ok(())
    }
}

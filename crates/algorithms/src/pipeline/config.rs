//! Pipeline configuration

use anthrome_core::io::PixelDepth;
use anthrome_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::annual::ThematicLayer;
use crate::temporal::Year;

/// Maps (year, thematic layer) to a store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerNaming {
    /// Key template with `{year}` and `{layer}` placeholders
    pub template: String,
    /// Fixed key of an irrigation layer shared by every year; when unset the
    /// template is used with layer `Irrigated`
    pub irrigated: Option<String>,
}

impl Default for LayerNaming {
    fn default() -> Self {
        Self {
            template: "CDL_{year}_{layer}.tif".to_string(),
            irrigated: None,
        }
    }
}

impl LayerNaming {
    pub fn key_for(&self, year: Year, layer: ThematicLayer) -> String {
        if layer == ThematicLayer::Irrigated {
            if let Some(key) = &self.irrigated {
                return key.clone();
            }
        }
        self.template
            .replace("{year}", &year.to_string())
            .replace("{layer}", layer.name())
    }

    /// Layer whose spatial metadata is forwarded to every output: the shared
    /// irrigation layer if configured, else the latest dryland agriculture layer.
    pub fn reference_key(&self, latest_year: Year) -> String {
        match &self.irrigated {
            Some(key) => key.clone(),
            None => self.key_for(latest_year, ThematicLayer::AgNoIrrigated),
        }
    }
}

/// Store key prefixes for written grids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNaming {
    /// Prefix for intermediate grids
    pub working_prefix: String,
    /// Prefix for the stability results
    pub result_prefix: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            working_prefix: "working".to_string(),
            result_prefix: "results".to_string(),
        }
    }
}

impl OutputNaming {
    pub fn working(&self, name: &str) -> String {
        join_key(&self.working_prefix, name)
    }

    pub fn result(&self, name: &str) -> String {
        join_key(&self.result_prefix, name)
    }
}

fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Everything a run needs besides the store itself.
///
/// ```json
/// {
///   "years": [2016, 2015, 2014],
///   "layers": { "template": "CDL_{year}_{layer}.tif",
///               "irrigated": "CDL_2016_Irrigated_AlgorithmicIrrigated.tif" },
///   "save_intermediate_layers": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Years to classify, most recent first
    pub years: Vec<Year>,
    pub layers: LayerNaming,
    pub outputs: OutputNaming,
    /// Also write per-year and aggregate intermediates
    pub save_intermediate_layers: bool,
    /// Worker threads; `None` uses every core
    pub threads: Option<usize>,
    /// Sample depth for written GeoTIFFs
    pub pixel_depth: PixelDepth,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            years: (2007..=2016).rev().collect(),
            layers: LayerNaming::default(),
            outputs: OutputNaming::default(),
            save_intermediate_layers: false,
            threads: None,
            pixel_depth: PixelDepth::U16,
        }
    }
}

impl PipelineConfig {
    pub fn with_years(mut self, years: impl Into<Vec<Year>>) -> Self {
        self.years = years.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            return Err(Error::InvalidParameter {
                name: "years",
                value: "[]".into(),
                reason: "at least one year is required".into(),
            });
        }
        if self.years.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err(Error::InvalidParameter {
                name: "years",
                value: format!("{:?}", self.years),
                reason: "years must be strictly descending".into(),
            });
        }
        for placeholder in ["{year}", "{layer}"] {
            if !self.layers.template.contains(placeholder) {
                return Err(Error::InvalidParameter {
                    name: "layers.template",
                    value: self.layers.template.clone(),
                    reason: format!("missing {} placeholder", placeholder),
                });
            }
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidParameter {
                name: "threads",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn latest_year(&self) -> Option<Year> {
        self.years.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.years.len(), 10);
        assert_eq!(config.latest_year(), Some(2016));
        // unstable codes reach 299, past what 8 bits can hold
        assert_eq!(config.pixel_depth, PixelDepth::U16);
    }

    #[test]
    fn test_key_templates() {
        let naming = LayerNaming::default();
        assert_eq!(naming.key_for(2015, ThematicLayer::Orchard), "CDL_2015_Orchard.tif");
        assert_eq!(naming.key_for(2015, ThematicLayer::Irrigated), "CDL_2015_Irrigated.tif");
        assert_eq!(naming.reference_key(2016), "CDL_2016_AgNoIrrigated.tif");

        let shared = LayerNaming {
            irrigated: Some("master_irrigated.tif".into()),
            ..LayerNaming::default()
        };
        assert_eq!(shared.key_for(2009, ThematicLayer::Irrigated), "master_irrigated.tif");
        assert_eq!(shared.reference_key(2016), "master_irrigated.tif");
    }

    #[test]
    fn test_output_keys() {
        let outputs = OutputNaming {
            working_prefix: "tmp/".into(),
            result_prefix: String::new(),
        };
        assert_eq!(outputs.working("anthrome2016.tif"), "tmp/anthrome2016.tif");
        assert_eq!(outputs.result("anthrome.tif"), "anthrome.tif");
    }

    #[test]
    fn test_validation() {
        let unordered = PipelineConfig::default().with_years(vec![2014, 2016]);
        assert!(unordered.validate().is_err());

        let empty = PipelineConfig::default().with_years(Vec::new());
        assert!(empty.validate().is_err());

        let mut no_layer = PipelineConfig::default();
        no_layer.layers.template = "CDL_{year}.tif".into();
        assert!(matches!(
            no_layer.validate(),
            Err(Error::InvalidParameter { name: "layers.template", .. })
        ));

        let zero_threads = PipelineConfig {
            threads: Some(0),
            ..PipelineConfig::default()
        };
        assert!(zero_threads.validate().is_err());
    }

    #[test]
    fn test_json_uses_defaults_for_missing_fields() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "years": [2016, 2015], "layers": { "irrigated": "irr.tif" }, "pixel_depth": "u8" }"#,
        )
        .unwrap();
        assert_eq!(config.years, vec![2016, 2015]);
        assert_eq!(config.layers.template, "CDL_{year}_{layer}.tif");
        assert_eq!(config.layers.irrigated.as_deref(), Some("irr.tif"));
        assert_eq!(config.pixel_depth, PixelDepth::U8);
        assert!(!config.save_intermediate_layers);
    }
}

//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System identified by EPSG code or WKT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// EPSG code if known
    epsg: Option<u32>,
    /// WKT representation
    wkt: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS 84 / UTM zone 11N (EPSG:32611)
    pub fn utm_11n() -> Self {
        Self::from_epsg(32611)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Whether the CRS is geographic (lat/lon) rather than projected.
    ///
    /// Only EPSG codes in the 4000 range are recognised as geographic.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(4000..=4999))
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::utm_11n();
        assert_eq!(crs.epsg(), Some(32611));
        assert_eq!(crs.identifier(), "EPSG:32611");
        assert!(!crs.is_geographic());
        assert!(CRS::from_epsg(4326).is_geographic());
    }

    #[test]
    fn test_crs_wkt_identifier_truncates() {
        let crs = CRS::from_wkt("x".repeat(80));
        assert_eq!(crs.identifier().len(), "WKT:".len() + 50);
    }
}

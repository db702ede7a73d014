use crate::error::{CubeError, CubeResult};
use std::fmt;

pub const LANDSAT_8_SR: &str = "ls8_usgs_sr_scene";
pub const PIXEL_QA: &str = "pixel_qa";

/// Surface reflectance fill value of the Landsat Level-2 products.
pub const SR_NODATA: i16 = -9999;

#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub aliases: Vec<String>,
    pub units: String,
    pub nodata: i16,
}

impl Measurement {
    pub fn new(name: &str, aliases: &[&str], units: &str, nodata: i16) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            units: units.to_string(),
            nodata,
        }
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// Measurements a product carries besides its `pixel_qa` band.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductDefinition {
    pub name: String,
    pub description: String,
    pub measurements: Vec<Measurement>,
    pub nodata: i16,
}

impl ProductDefinition {
    /// Landsat 8 Collection 1 Level-2 surface reflectance.
    pub fn landsat_8_sr() -> Self {
        let bands = [
            ("coastal_aerosol", "band_1", "sr_band1"),
            ("blue", "band_2", "sr_band2"),
            ("green", "band_3", "sr_band3"),
            ("red", "band_4", "sr_band4"),
            ("nir", "band_5", "sr_band5"),
            ("swir1", "band_6", "sr_band6"),
            ("swir2", "band_7", "sr_band7"),
        ];
        Self {
            name: LANDSAT_8_SR.to_string(),
            description: "Landsat 8 USGS Collection 1 Level-2 surface reflectance".to_string(),
            measurements: bands
                .iter()
                .map(|&(name, short, long)| Measurement::new(name, &[short, long], "1", SR_NODATA))
                .collect(),
            nodata: SR_NODATA,
        }
    }

    pub fn measurement(&self, name: &str) -> CubeResult<&Measurement> {
        self.measurements
            .iter()
            .find(|m| m.answers_to(name))
            .ok_or_else(|| CubeError::UnknownBand(name.to_string()))
    }

    /// Canonical names of `requested`, or of every measurement when `None`.
    pub fn resolve(&self, requested: Option<&[String]>) -> CubeResult<Vec<String>> {
        match requested {
            None => Ok(self.measurements.iter().map(|m| m.name.clone()).collect()),
            Some(names) => names
                .iter()
                .map(|name| self.measurement(name).map(|m| m.name.clone()))
                .collect(),
        }
    }

    /// `(alias, name)` pairs for every measurement alias.
    pub fn aliases(&self) -> Vec<(String, String)> {
        self.measurements
            .iter()
            .flat_map(|m| m.aliases.iter().map(|a| (a.clone(), m.name.clone())))
            .collect()
    }
}

impl fmt::Display for ProductDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} measurements + {PIXEL_QA})", self.name, self.measurements.len())
    }
}

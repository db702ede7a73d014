use crate::error::{CubeError, CubeResult};
use crate::geo::GeoBox;
use crate::quality::{make_mask, QualityBand, QualityMask, QualityPredicate};
use chrono::{DateTime, Utc};
use ndarray::{Array4, ArrayView3, Axis};
use std::collections::HashMap;
use std::fmt::Display;

mod composite;
mod mask;

pub use composite::{Composite, CompositeBands, TimeSelector};

/// Multi-band, multi-temporal raster indexed `(band, time, y, x)`.
///
/// Immutable once built; operations return new cubes.
#[derive(Clone, Debug)]
pub struct RasterCube {
    bands: Vec<String>,
    aliases: HashMap<String, String>,
    times: Vec<DateTime<Utc>>,
    geobox: GeoBox,
    nodata: i16,
    data: Array4<i16>,
}

impl RasterCube {
    pub fn new(
        bands: Vec<String>,
        times: Vec<DateTime<Utc>>,
        geobox: GeoBox,
        nodata: i16,
        data: Array4<i16>,
    ) -> CubeResult<Self> {
        let expected = [bands.len(), times.len(), geobox.height, geobox.width];
        let found = data.shape();
        if found != &expected[..] {
            return Err(CubeError::ShapeMismatch {
                expected: expected.to_vec(),
                found: found.to_vec(),
            });
        }
        Ok(Self {
            bands,
            aliases: HashMap::new(),
            times,
            geobox,
            nodata,
            data,
        })
    }

    /// Alternative names accepted wherever a band is looked up.
    pub fn with_aliases<I: IntoIterator<Item = (String, String)>>(mut self, aliases: I) -> Self {
        self.aliases.extend(aliases);
        self
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn geobox(&self) -> &GeoBox {
        &self.geobox
    }

    pub fn nodata(&self) -> i16 {
        self.nodata
    }

    /// `(bands, time, y, x)`
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }

    pub fn time_len(&self) -> usize {
        self.times.len()
    }

    pub fn band_index(&self, name: &str) -> CubeResult<usize> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.bands
            .iter()
            .position(|band| band == canonical)
            .ok_or_else(|| CubeError::UnknownBand(name.to_string()))
    }

    /// One band as a `(time, y, x)` view.
    pub fn band(&self, name: &str) -> CubeResult<ArrayView3<i16>> {
        let index = self.band_index(name)?;
        Ok(self.data.index_axis(Axis(0), index))
    }

    pub fn get(&self, band: &str, time: usize, y: usize, x: usize) -> CubeResult<Option<i16>> {
        let index = self.band_index(band)?;
        Ok(self.data.get((index, time, y, x)).copied())
    }

    fn with_data(&self, data: Array4<i16>) -> RasterCube {
        RasterCube {
            bands: self.bands.clone(),
            aliases: self.aliases.clone(),
            times: self.times.clone(),
            geobox: self.geobox.clone(),
            nodata: self.nodata,
            data,
        }
    }

    fn time_index(&self, index: usize) -> CubeResult<usize> {
        if index < self.times.len() {
            Ok(index)
        } else {
            Err(CubeError::IndexOutOfRange {
                index,
                len: self.times.len(),
            })
        }
    }
}

impl Display for RasterCube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (bands, times, height, width) = self.shape();
        write!(
            f,
            "RasterCube({bands} bands x {times} times x {height}x{width}, {})",
            self.geobox.crs
        )?;
        for band in self.bands.iter() {
            write!(f, "\n  {band}")?;
        }
        Ok(())
    }
}

/// A loaded cube together with its aligned quality band.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub cube: RasterCube,
    pub quality: QualityBand,
}

impl Dataset {
    pub fn new(cube: RasterCube, quality: QualityBand) -> CubeResult<Self> {
        let (_, times, height, width) = cube.shape();
        let expected = (times, height, width);
        if quality.shape() != expected {
            let (t, y, x) = quality.shape();
            return Err(CubeError::ShapeMismatch {
                expected: vec![times, height, width],
                found: vec![t, y, x],
            });
        }
        Ok(Self { cube, quality })
    }

    pub fn mask(&self, predicate: &QualityPredicate) -> CubeResult<QualityMask> {
        make_mask(&self.quality, predicate)
    }

    /// The cube with every pixel failing `predicate` set to no-data.
    pub fn masked(&self, predicate: &QualityPredicate) -> CubeResult<RasterCube> {
        self.cube.masked(&self.mask(predicate)?)
    }
}

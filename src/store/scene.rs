use crate::error::{CubeError, CubeResult};
use crate::geo::{ProjectionError, Region};
use crate::product::ProductDefinition;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use ndarray::Array2;
use std::collections::HashMap;
use std::fmt::Display;

/// One acquisition on a regular geographic (EPSG:4326) grid.
#[derive(Clone, Debug)]
pub struct Scene {
    pub id: String,
    pub product: String,
    pub time: DateTime<Utc>,
    /// Top-left corner, `(lon, lat)` degrees.
    pub origin: (f64, f64),
    /// `(lat, lon)` degrees per pixel, latitude step negative.
    pub pixel_size: (f64, f64),
    measurements: HashMap<String, Array2<i16>>,
    pixel_qa: Array2<u16>,
}

impl Scene {
    pub fn new(
        id: &str,
        product: &str,
        time: DateTime<Utc>,
        origin: (f64, f64),
        pixel_size: (f64, f64),
        pixel_qa: Array2<u16>,
    ) -> CubeResult<Self> {
        let (dlat, dlon) = pixel_size;
        if !dlat.is_normal() || !dlon.is_normal() || dlat > 0.0 || dlon < 0.0 {
            return Err(ProjectionError::InvalidScale(pixel_size).into());
        }
        Ok(Self {
            id: id.to_string(),
            product: product.to_string(),
            time,
            origin,
            pixel_size,
            measurements: HashMap::new(),
            pixel_qa,
        })
    }

    /// Scene with every measurement of `product`, generated per pixel.
    ///
    /// `reflectance` is called with `(measurement, row, col)`, `quality`
    /// with `(row, col)`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_fn<F, Q>(
        id: &str,
        product: &ProductDefinition,
        time: DateTime<Utc>,
        origin: (f64, f64),
        pixel_size: (f64, f64),
        shape: (usize, usize),
        mut reflectance: F,
        mut quality: Q,
    ) -> CubeResult<Self>
    where
        F: FnMut(&str, usize, usize) -> i16,
        Q: FnMut(usize, usize) -> u16,
    {
        let pixel_qa = Array2::from_shape_fn(shape, |(row, col)| quality(row, col));
        let mut scene = Self::new(id, &product.name, time, origin, pixel_size, pixel_qa)?;
        for measurement in product.measurements.iter() {
            let name = measurement.name.as_str();
            let data = Array2::from_shape_fn(shape, |(row, col)| reflectance(name, row, col));
            scene = scene.with_measurement(name, data)?;
        }
        Ok(scene)
    }

    pub fn with_measurement(mut self, name: &str, data: Array2<i16>) -> CubeResult<Self> {
        if data.dim() != self.pixel_qa.dim() {
            let (h, w) = self.pixel_qa.dim();
            let (dh, dw) = data.dim();
            return Err(CubeError::ShapeMismatch {
                expected: vec![h, w],
                found: vec![dh, dw],
            });
        }
        self.measurements.insert(name.to_string(), data);
        Ok(self)
    }

    pub fn measurement(&self, name: &str) -> Option<&Array2<i16>> {
        self.measurements.get(name)
    }

    pub fn pixel_qa(&self) -> &Array2<u16> {
        &self.pixel_qa
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.pixel_qa.dim()
    }

    /// Extent in degrees, `x` longitude and `y` latitude.
    pub fn footprint(&self) -> Region<f64> {
        let (rows, cols) = self.shape();
        let (dlat, dlon) = self.pixel_size;
        let (west, north) = self.origin;
        let east = west + cols as f64 * dlon;
        let south = north + rows as f64 * dlat;
        Region::new(west, south, east, north)
    }

    /// Pixel `(row, col)` containing `(lon, lat)`.
    pub fn index(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let (rows, cols) = self.shape();
        let (dlat, dlon) = self.pixel_size;
        let col = ((lon - self.origin.0) / dlon).floor();
        let row = ((lat - self.origin.1) / dlat).floor();
        if col < 0.0 || row < 0.0 || col >= cols as f64 || row >= rows as f64 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Local calendar day at the scene centre, by longitude offset from UTC.
    pub fn solar_day(&self) -> NaiveDate {
        let footprint = self.footprint();
        let lon = (footprint.x.min + footprint.x.max) / 2.0;
        let offset = Duration::seconds((lon / 15.0 * 3600.0) as i64);
        (self.time + offset).date_naive()
    }
}

impl Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (rows, cols) = self.shape();
        write!(
            f,
            "Scene({}, {}, {}, {cols}x{rows})",
            self.id, self.product, self.time
        )
    }
}

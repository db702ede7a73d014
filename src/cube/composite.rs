use super::RasterCube;
use crate::error::CubeResult;
use chrono::{DateTime, Utc};
use ndarray::{s, stack, Array3, Axis};
use std::fmt;

/// Band names shown as display red, green and blue, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeBands(pub [String; 3]);

impl CompositeBands {
    pub fn new(red: &str, green: &str, blue: &str) -> Self {
        Self([red.to_string(), green.to_string(), blue.to_string()])
    }

    pub fn true_color() -> Self {
        Self::new("red", "green", "blue")
    }

    /// Short-wave infrared, near infrared and green. Vegetation shows green,
    /// bare ground and urban areas in magenta tones.
    pub fn false_color() -> Self {
        Self::new("swir1", "nir", "green")
    }

    pub fn names(&self) -> &[String; 3] {
        &self.0
    }
}

impl fmt::Display for CompositeBands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0[0], self.0[1], self.0[2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSelector {
    Index(usize),
    All,
}

/// A three channel `(y, x, channel)` image for one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub time: DateTime<Utc>,
    pub nodata: i16,
    pub pixels: Array3<i16>,
}

impl Composite {
    /// `(height, width)`
    pub fn dimensions(&self) -> (usize, usize) {
        let (height, width, _) = self.pixels.dim();
        (height, width)
    }

    /// Whether any channel of pixel `(y, x)` is no-data.
    pub fn is_nodata(&self, y: usize, x: usize) -> bool {
        self.pixels
            .slice(s![y, x, ..])
            .iter()
            .any(|v| *v == self.nodata)
    }
}

impl RasterCube {
    /// Stack three bands into display images, one per selected time step.
    ///
    /// Band names are never substituted: a name the cube does not carry
    /// (after alias resolution) is an error.
    pub fn composite(
        &self,
        bands: &CompositeBands,
        selector: TimeSelector,
    ) -> CubeResult<Vec<Composite>> {
        let mut indices = [0usize; 3];
        for (slot, name) in indices.iter_mut().zip(bands.names()) {
            *slot = self.band_index(name)?;
        }

        let times: Vec<usize> = match selector {
            TimeSelector::Index(index) => vec![self.time_index(index)?],
            TimeSelector::All => (0..self.time_len()).collect(),
        };

        times
            .into_iter()
            .map(|t| -> CubeResult<Composite> {
                let channels = indices.map(|b| self.data.slice(s![b, t, .., ..]));
                Ok(Composite {
                    time: self.times[t],
                    nodata: self.nodata,
                    pixels: stack(Axis(2), &channels)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CubeError;
    use crate::geo::{Crs, GeoBox};
    use crate::product::ProductDefinition;
    use chrono::TimeZone;
    use ndarray::Array4;

    fn landsat_cube(times: usize, size: usize) -> RasterCube {
        let product = ProductDefinition::landsat_8_sr();
        let bands: Vec<String> = product.measurements.iter().map(|m| m.name.clone()).collect();
        let crs = Crs::from_epsg(32630).unwrap();
        let geobox = GeoBox::new(crs, (0.0, 0.0), (-30.0, 30.0), size, size).unwrap();
        let data = Array4::from_shape_fn((bands.len(), times, size, size), |(b, t, _, _)| {
            (b * 10 + t) as i16
        });
        let first = Utc.with_ymd_and_hms(2019, 1, 1, 10, 0, 0).unwrap();
        let times = (0..times)
            .map(|t| first + chrono::Duration::days(16 * t as i64))
            .collect();
        RasterCube::new(bands, times, geobox, -9999, data)
            .unwrap()
            .with_aliases(product.aliases())
    }

    #[test]
    fn true_color_single_time() {
        let cube = landsat_cube(5, 100);
        let composites = cube
            .composite(&CompositeBands::true_color(), TimeSelector::Index(0))
            .unwrap();
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].pixels.dim(), (100, 100, 3));
        // red, green, blue are measurements 3, 2, 1
        assert_eq!(composites[0].pixels[[0, 0, 0]], 30);
        assert_eq!(composites[0].pixels[[0, 0, 1]], 20);
        assert_eq!(composites[0].pixels[[0, 0, 2]], 10);
    }

    #[test]
    fn false_color_all_times() {
        let cube = landsat_cube(3, 4);
        let composites = cube
            .composite(&CompositeBands::false_color(), TimeSelector::All)
            .unwrap();
        assert_eq!(composites.len(), 3);
        for (t, composite) in composites.iter().enumerate() {
            assert_eq!(composite.time, cube.times()[t]);
            assert_eq!(composite.pixels[[1, 2, 0]], (50 + t) as i16);
            assert_eq!(composite.pixels[[1, 2, 1]], (40 + t) as i16);
            assert_eq!(composite.pixels[[1, 2, 2]], (20 + t) as i16);
        }
    }

    #[test]
    fn aliases_resolve_to_measurements() {
        let cube = landsat_cube(1, 2);
        let by_alias = cube
            .composite(&CompositeBands::new("band_4", "band_3", "band_2"), TimeSelector::All)
            .unwrap();
        let by_name = cube
            .composite(&CompositeBands::true_color(), TimeSelector::All)
            .unwrap();
        assert_eq!(by_alias, by_name);
    }

    #[test]
    fn unknown_band_is_an_error() {
        let cube = landsat_cube(5, 10);
        let bands = CompositeBands::new("ultraviolet", "green", "blue");
        assert!(matches!(
            cube.composite(&bands, TimeSelector::Index(0)),
            Err(CubeError::UnknownBand(name)) if name == "ultraviolet"
        ));
    }

    #[test]
    fn time_index_out_of_range() {
        let cube = landsat_cube(5, 10);
        assert!(matches!(
            cube.composite(&CompositeBands::true_color(), TimeSelector::Index(10)),
            Err(CubeError::IndexOutOfRange { index: 10, len: 5 })
        ));
    }

    #[test]
    fn nodata_pixels_are_reported() {
        let mut cube = landsat_cube(1, 2);
        cube.data[[3, 0, 1, 1]] = -9999;
        let composites = cube
            .composite(&CompositeBands::true_color(), TimeSelector::Index(0))
            .unwrap();
        assert!(composites[0].is_nodata(1, 1));
        assert!(!composites[0].is_nodata(0, 0));
    }
}

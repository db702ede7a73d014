use super::{BoundingRegion, Crs, Interval, ProjectionError, Region};
use crate::error::CubeResult;
use std::fmt;

/// Samples taken along each edge of a query region when measuring its
/// projected extent. Edges of a lat/lon box are curved in UTM.
const EDGE_SAMPLES: usize = 16;

/// Output pixel grid: a CRS, a top-left origin, a resolution and a size.
///
/// Resolution follows the data cube `(y, x)` convention, with `y` negative
/// for north-up grids.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoBox {
    pub crs: Crs,
    pub origin: (f64, f64),
    pub resolution: (f64, f64),
    pub width: usize,
    pub height: usize,
}

impl GeoBox {
    pub fn new(
        crs: Crs,
        origin: (f64, f64),
        resolution: (f64, f64),
        width: usize,
        height: usize,
    ) -> Result<Self, ProjectionError> {
        let (res_y, res_x) = resolution;
        if !res_x.is_normal() || !res_y.is_normal() || res_x < 0.0 || res_y > 0.0 {
            return Err(ProjectionError::InvalidScale(resolution));
        }
        Ok(Self {
            crs,
            origin,
            resolution,
            width,
            height,
        })
    }

    /// Smallest grid in `crs`, aligned to multiples of `resolution`, covering
    /// the geographic `region`.
    pub fn from_region(
        region: &BoundingRegion,
        crs: Crs,
        resolution: (f64, f64),
    ) -> CubeResult<Self> {
        let (res_y, res_x) = resolution;
        if !res_x.is_normal() || !res_y.is_normal() || res_x < 0.0 || res_y > 0.0 {
            return Err(ProjectionError::InvalidScale(resolution).into());
        }

        let wgs84 = Crs::wgs84()?;
        let degrees = region.as_region();
        let mut x = Interval::new(f64::INFINITY, f64::NEG_INFINITY);
        let mut y = Interval::new(f64::INFINITY, f64::NEG_INFINITY);
        for i in 0..=EDGE_SAMPLES {
            let t = i as f64 / EDGE_SAMPLES as f64;
            let lon = degrees.x.min + t * degrees.x.range();
            let lat = degrees.y.min + t * degrees.y.range();
            for (lon, lat) in [
                (lon, degrees.y.min),
                (lon, degrees.y.max),
                (degrees.x.min, lat),
                (degrees.x.max, lat),
            ] {
                let (px, py) = wgs84.transform_to(&crs, lon, lat)?;
                x.expand(px);
                y.expand(py);
            }
        }

        let step_x = res_x;
        let step_y = -res_y;
        let left = (x.min / step_x).floor() * step_x;
        let right = (x.max / step_x).ceil() * step_x;
        let bottom = (y.min / step_y).floor() * step_y;
        let top = (y.max / step_y).ceil() * step_y;
        let width = (((right - left) / step_x).round() as usize).max(1);
        let height = (((top - bottom) / step_y).round() as usize).max(1);

        Ok(Self::new(crs, (left, top), resolution, width, height)?)
    }

    /// `(height, width)`, the order of the spatial array axes.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Coordinates of the centre of pixel `(row, col)` in the grid CRS.
    pub fn pixel_centre(&self, row: usize, col: usize) -> (f64, f64) {
        let (res_y, res_x) = self.resolution;
        (
            self.origin.0 + (col as f64 + 0.5) * res_x,
            self.origin.1 + (row as f64 + 0.5) * res_y,
        )
    }

    pub fn extent(&self) -> Region<f64> {
        let (res_y, res_x) = self.resolution;
        let right = self.origin.0 + self.width as f64 * res_x;
        let bottom = self.origin.1 + self.height as f64 * res_y;
        Region::new(self.origin.0, bottom, right, self.origin.1)
    }
}

impl fmt::Display for GeoBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoBox({}x{}, {}, origin {:?}, resolution {:?})",
            self.width, self.height, self.crs, self.origin, self.resolution
        )
    }
}

use proj4rs::errors::Error as Proj4Error;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use std::fmt;

pub const WGS84_EPSG: u16 = 4326;

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";
const UPS_NORTH_PROJ: &str =
    "+proj=stere +lat_0=90 +lon_0=0 +k=0.994 +x_0=2000000 +y_0=2000000 +datum=WGS84 +units=m +no_defs";
const UPS_SOUTH_PROJ: &str =
    "+proj=stere +lat_0=-90 +lon_0=0 +k=0.994 +x_0=2000000 +y_0=2000000 +datum=WGS84 +units=m +no_defs";

#[derive(Debug)]
pub enum ProjectionError {
    Proj4Error(Proj4Error),
    UnsupportedEpsg(u16),
    NonFinite((f64, f64)),
    InvalidScale((f64, f64)),
}

impl From<Proj4Error> for ProjectionError {
    fn from(e: Proj4Error) -> Self {
        ProjectionError::Proj4Error(e)
    }
}

/// Coordinate reference system identified by EPSG code.
///
/// Only the codes this crate produces are known: WGS84 geographic, the
/// WGS84 UTM zones and the two polar UPS zones.
#[derive(Clone, Debug)]
pub struct Crs {
    pub epsg: u16,
    proj: Proj,
}

impl Crs {
    pub fn wgs84() -> Result<Self, ProjectionError> {
        Self::from_epsg(WGS84_EPSG)
    }

    pub fn from_epsg(epsg: u16) -> Result<Self, ProjectionError> {
        let definition = Self::proj_string(epsg).ok_or(ProjectionError::UnsupportedEpsg(epsg))?;
        let proj = Proj::from_proj_string(&definition)?;
        Ok(Self { epsg, proj })
    }

    pub fn proj_string(epsg: u16) -> Option<String> {
        match epsg {
            WGS84_EPSG => Some(WGS84_PROJ.to_string()),
            32601..=32660 => Some(format!(
                "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
                epsg - 32600
            )),
            32701..=32760 => Some(format!(
                "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
                epsg - 32700
            )),
            32661 => Some(UPS_NORTH_PROJ.to_string()),
            32761 => Some(UPS_SOUTH_PROJ.to_string()),
            _ => None,
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.epsg == WGS84_EPSG
    }

    /// Transform a point from `self` into `to`. Geographic coordinates are in degrees.
    pub fn transform_to(&self, to: &Crs, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if self.epsg == to.epsg {
            return Ok((x, y));
        }
        let mut point = if self.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(&self.proj, &to.proj, &mut point)?;
        let (u, v) = if to.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if !u.is_finite() || !v.is_finite() {
            return Err(ProjectionError::NonFinite((x, y)));
        }
        Ok((u, v))
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.epsg == other.epsg
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

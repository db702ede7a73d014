use crate::error::{CubeError, CubeResult};

const UTM_NORTH_BASE: u16 = 32600;
const UTM_SOUTH_BASE: u16 = 32700;
pub const UPS_NORTH_EPSG: u16 = 32661;
pub const UPS_SOUTH_EPSG: u16 = 32761;

/// Latitude band covered by UTM, outside of which UPS applies.
const UTM_LAT_MIN: f64 = -80.0;
const UTM_LAT_MAX: f64 = 84.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utm { zone: u8, north: bool },
    UpsNorth,
    UpsSouth,
}

impl Zone {
    pub fn epsg(&self) -> u16 {
        match self {
            Zone::Utm { zone, north: true } => UTM_NORTH_BASE + *zone as u16,
            Zone::Utm { zone, north: false } => UTM_SOUTH_BASE + *zone as u16,
            Zone::UpsNorth => UPS_NORTH_EPSG,
            Zone::UpsSouth => UPS_SOUTH_EPSG,
        }
    }
}

/// Zone containing `(lat, lon)` in degrees.
pub fn zone(lat: f64, lon: f64) -> CubeResult<Zone> {
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        return Err(CubeError::InvalidCoordinate((lat, lon)));
    }
    if lat > UTM_LAT_MAX {
        return Ok(Zone::UpsNorth);
    }
    if lat < UTM_LAT_MIN {
        return Ok(Zone::UpsSouth);
    }

    // lon = 180 wraps into the last zone rather than a 61st
    let mut zone = (((lon + 180.0) / 6.0).floor() as u8 + 1).min(60);

    // Norway
    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        zone = 32;
    }

    // Svalbard
    if (72.0..=UTM_LAT_MAX).contains(&lat) {
        zone = match lon {
            l if (0.0..9.0).contains(&l) => 31,
            l if (9.0..21.0).contains(&l) => 33,
            l if (21.0..33.0).contains(&l) => 35,
            l if (33.0..42.0).contains(&l) => 37,
            _ => zone,
        };
    }

    Ok(Zone::Utm {
        zone,
        north: lat >= 0.0,
    })
}

/// EPSG code of the WGS84 UTM (or UPS) zone containing `(lat, lon)`.
pub fn utm_epsg(lat: f64, lon: f64) -> CubeResult<u16> {
    Ok(zone(lat, lon)?.epsg())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_zones() {
        assert_eq!(utm_epsg(5.6, -0.2).unwrap(), 32630);
        assert_eq!(utm_epsg(-33.9, 18.4).unwrap(), 32734);
        assert_eq!(utm_epsg(40.7, -74.0).unwrap(), 32618);
        assert_eq!(utm_epsg(0.0, -180.0).unwrap(), 32601);
        assert_eq!(utm_epsg(0.0, 180.0).unwrap(), 32660);
    }

    #[test]
    fn equator_belongs_to_the_north() {
        assert_eq!(utm_epsg(0.0, 3.0).unwrap(), 32631);
        assert_eq!(utm_epsg(-0.0001, 3.0).unwrap(), 32731);
    }

    #[test]
    fn norway_and_svalbard_exceptions() {
        assert_eq!(utm_epsg(60.0, 5.0).unwrap(), 32632);
        assert_eq!(utm_epsg(60.0, 2.0).unwrap(), 32631);
        assert_eq!(utm_epsg(78.0, 15.0).unwrap(), 32633);
        assert_eq!(utm_epsg(78.0, 30.0).unwrap(), 32635);
        assert_eq!(utm_epsg(78.0, 40.0).unwrap(), 32637);
    }

    #[test]
    fn polar_regions_use_ups() {
        assert_eq!(utm_epsg(85.0, 10.0).unwrap(), UPS_NORTH_EPSG);
        assert_eq!(utm_epsg(-85.0, 10.0).unwrap(), UPS_SOUTH_EPSG);
    }

    #[test]
    fn pure_function() {
        let first = utm_epsg(12.34, 56.78).unwrap();
        let second = utm_epsg(12.34, 56.78).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_coordinates() {
        assert!(matches!(
            utm_epsg(f64::NAN, 0.0),
            Err(CubeError::InvalidCoordinate(_))
        ));
        assert!(utm_epsg(91.0, 0.0).is_err());
        assert!(utm_epsg(0.0, 181.0).is_err());
    }
}

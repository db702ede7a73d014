use crate::error::{CubeError, CubeResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::ops::Sub;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Copy + Sub<Output = T>> Interval<T> {
    pub fn range(&self) -> T {
        self.max - self.min
    }
}

impl<T: Copy + PartialOrd> Interval<T> {
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn intersects(&self, other: &Interval<T>) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    pub fn expand(&mut self, value: T) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// Axis aligned extent in some CRS, `x` east and `y` north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region<T> {
    pub x: Interval<T>,
    pub y: Interval<T>,
}

impl<T> Region<T> {
    pub fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            x: Interval::new(min_x, max_x),
            y: Interval::new(min_y, max_y),
        }
    }
}

impl<T: Copy> Region<T> {
    pub fn as_tuple(&self) -> (T, T, T, T) {
        (self.x.min, self.y.min, self.x.max, self.y.max)
    }
}

impl<T: Copy + PartialOrd> Region<T> {
    pub fn intersects(&self, other: &Region<T>) -> bool {
        self.x.intersects(&other.x) && self.y.intersects(&other.y)
    }
}

/// Query rectangle in geographic degrees.
///
/// Latitude is kept in the order it was supplied. Data cubes conventionally
/// list latitude north first (decreasing), so `lat_min > lat_max` is accepted.
/// Use [`BoundingRegion::south`] and [`BoundingRegion::north`] when a
/// normalized order is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingRegion {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> CubeResult<Self> {
        for (lat, lon) in [(lat_min, lon_min), (lat_max, lon_max)] {
            if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
                return Err(CubeError::InvalidCoordinate((lat, lon)));
            }
        }
        if lon_min >= lon_max {
            return Err(CubeError::InvalidCoordinate((lat_min, lon_min)));
        }
        if lat_min == lat_max {
            return Err(CubeError::InvalidCoordinate((lat_min, lon_min)));
        }
        Ok(Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        })
    }

    pub fn south(&self) -> f64 {
        self.lat_min.min(self.lat_max)
    }

    pub fn north(&self) -> f64 {
        self.lat_min.max(self.lat_max)
    }

    /// Representative point as `(lat, lon)`.
    pub fn centre(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// Normalized extent in degrees, `x` longitude and `y` latitude.
    pub fn as_region(&self) -> Region<f64> {
        Region::new(self.lon_min, self.south(), self.lon_max, self.north())
    }
}

impl fmt::Display for BoundingRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lon [{}, {}] lat [{}, {}]",
            self.lon_min, self.lon_max, self.lat_min, self.lat_max
        )
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CubeResult<Self> {
        if start > end {
            return Err(CubeError::InvalidDateRange(format!("{start} > {end}")));
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYY-MM-DD` dates.
    pub fn parse(start: &str, end: &str) -> CubeResult<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| CubeError::InvalidDateRange(format!("{s}: {e}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        let day = time.date_naive();
        day >= self.start && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

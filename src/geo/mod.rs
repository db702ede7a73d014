// Geographic primitives
//   Query regions and dates, CRS handling backed by proj4rs,
//   UTM zone resolution and the output pixel grid.

mod geobox;
mod projection;
mod region;
mod utm;

pub use geobox::GeoBox;
pub use projection::{Crs, ProjectionError, WGS84_EPSG};
pub use region::{BoundingRegion, DateRange, Interval, Region};
pub use utm::{utm_epsg, zone, Zone, UPS_NORTH_EPSG, UPS_SOUTH_EPSG};

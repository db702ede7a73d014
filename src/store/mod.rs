// Data cube access
//   DataCube is the seam to an indexed raster store. Queries run inside a
//   Session, which holds the store connection and releases it on drop.
//   MemoryStore is a store over scenes held in memory.

use crate::cube::Dataset;
use crate::error::{CubeError, CubeResult};
use crate::geo::{utm_epsg, BoundingRegion, Crs, DateRange, ProjectionError};
use std::fmt::Display;
use std::time::Instant;
use tracing::*;

mod memory;
mod scene;

pub use memory::MemoryStore;
pub use scene::Scene;

/// Native Landsat pixel size in metres, `(y, x)`.
pub const DEFAULT_RESOLUTION: (f64, f64) = (-30.0, 30.0);

pub trait DataCube {
    /// Load every scene of `query.product` intersecting the query region and
    /// time onto the query grid.
    fn load(&self, query: &Query) -> CubeResult<Dataset>;

    fn connect(&self) -> CubeResult<()> {
        Ok(())
    }

    fn disconnect(&self) {}

    fn open_session(&self, app: &str) -> CubeResult<Session<'_, Self>>
    where
        Self: Sized,
    {
        Session::open(self, app)
    }
}

/// Scoped connection to a [`DataCube`]. Dropping it disconnects.
pub struct Session<'a, D: DataCube + ?Sized> {
    store: &'a D,
    app: String,
    opened: Instant,
}

impl<'a, D: DataCube + ?Sized> Session<'a, D> {
    pub fn open(store: &'a D, app: &str) -> CubeResult<Self> {
        store.connect()?;
        info!("Opened data cube session for {app}");
        Ok(Self {
            store,
            app: app.to_string(),
            opened: Instant::now(),
        })
    }

    pub fn load(&self, query: &Query) -> CubeResult<Dataset> {
        info!("Loading {query}");
        let t0 = Instant::now();
        let dataset = self.store.load(query)?;
        debug!(
            "Loaded {:?} in {:.3}ms",
            dataset.cube.shape(),
            t0.elapsed().as_micros() as f64 / 1000.0
        );
        Ok(dataset)
    }
}

impl<'a, D: DataCube + ?Sized> Drop for Session<'a, D> {
    fn drop(&mut self) {
        self.store.disconnect();
        info!(
            "Released data cube session for {} after {:.3}s",
            self.app,
            self.opened.elapsed().as_secs_f64()
        );
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub product: String,
    pub region: BoundingRegion,
    pub time: Option<DateRange>,
    pub output_crs: u16,
    pub resolution: (f64, f64),
    pub measurements: Option<Vec<String>>,
}

impl Query {
    pub fn builder(product: &str) -> QueryBuilder<RegionRequired> {
        QueryBuilder {
            product: product.to_string(),
            region: RegionRequired,
            time: None,
            output_crs: None,
            resolution: DEFAULT_RESOLUTION,
            measurements: None,
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} over {}", self.product, self.region)?;
        if let Some(time) = &self.time {
            write!(f, " from {time}")?;
        }
        write!(f, " in EPSG:{} at {:?}", self.output_crs, self.resolution)
    }
}

pub struct RegionRequired;

#[derive(Debug)]
pub struct QueryBuilder<R> {
    product: String,
    region: R,
    time: Option<DateRange>,
    output_crs: Option<u16>,
    resolution: (f64, f64),
    measurements: Option<Vec<String>>,
}

impl QueryBuilder<RegionRequired> {
    pub fn with_region(self, region: BoundingRegion) -> QueryBuilder<BoundingRegion> {
        let Self {
            product,
            region: _,
            time,
            output_crs,
            resolution,
            measurements,
        } = self;
        QueryBuilder {
            product,
            region,
            time,
            output_crs,
            resolution,
            measurements,
        }
    }
}

impl<R> QueryBuilder<R> {
    pub fn with_time(mut self, time: DateRange) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_output_crs(mut self, epsg: u16) -> Self {
        self.output_crs = Some(epsg);
        self
    }

    /// Pixel size in output CRS units, `(y, x)` with `y` negative.
    pub fn with_resolution(mut self, resolution: (f64, f64)) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_measurements(mut self, measurements: &[&str]) -> Self {
        self.measurements = Some(measurements.iter().map(|m| m.to_string()).collect());
        self
    }
}

impl QueryBuilder<BoundingRegion> {
    /// Without an explicit output CRS the UTM zone of the region centre is used.
    pub fn build(self) -> CubeResult<Query> {
        let output_crs = match self.output_crs {
            Some(epsg) => epsg,
            None => {
                let (lat, lon) = self.region.centre();
                utm_epsg(lat, lon)?
            }
        };
        if Crs::proj_string(output_crs).is_none() {
            return Err(ProjectionError::UnsupportedEpsg(output_crs).into());
        }
        if self.measurements.as_ref().is_some_and(|m| m.is_empty()) {
            return Err(CubeError::UnknownBand("empty measurement list".to_string()));
        }
        Ok(Query {
            product: self.product,
            region: self.region,
            time: self.time,
            output_crs,
            resolution: self.resolution,
            measurements: self.measurements,
        })
    }
}

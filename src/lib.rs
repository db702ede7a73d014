//! Landsat 8 Level-2 data cube workflow.
//!
//! Query a [`DataCube`] for a region and date range, mask pixels by their
//! `pixel_qa` category, then composite three bands into display images.

pub mod cube;
mod error;
pub mod geo;
pub mod product;
pub mod quality;
#[cfg(feature = "image")]
pub mod render;
pub mod store;

pub use cube::{Composite, CompositeBands, Dataset, RasterCube, TimeSelector};
pub use error::{CubeError, CubeResult};
pub use geo::{utm_epsg, BoundingRegion, Crs, DateRange, GeoBox};
pub use product::ProductDefinition;
pub use quality::{make_mask, QualityBand, QualityMask, QualityPredicate};
pub use store::{DataCube, MemoryStore, Query, Scene, Session};

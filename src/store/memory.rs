use super::{DataCube, Query, Scene};
use crate::cube::{Dataset, RasterCube};
use crate::error::{CubeError, CubeResult};
use crate::geo::{Crs, GeoBox};
use crate::product::ProductDefinition;
use crate::quality::{Flag, NoData, QualityBand};
use chrono::NaiveDate;
use ndarray::{Array2, Array3, Array4};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use tracing::*;

/// Data cube over scenes held in memory.
///
/// Scenes are sampled onto the query grid by nearest neighbour. Scenes of the
/// same product acquired on the same solar day are fused into one time step,
/// earlier acquisitions taking precedence where both have data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: HashMap<String, ProductDefinition>,
    scenes: Vec<Scene>,
    sessions: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&mut self, product: ProductDefinition) {
        debug!("Added product {product}");
        self.products.insert(product.name.clone(), product);
    }

    /// Index a scene. Its product must be known and every measurement of the
    /// product must be present.
    pub fn index(&mut self, scene: Scene) -> CubeResult<()> {
        let product = self
            .products
            .get(&scene.product)
            .ok_or_else(|| CubeError::UnknownProduct(scene.product.clone()))?;
        if let Some(missing) = product
            .measurements
            .iter()
            .find(|m| scene.measurement(&m.name).is_none())
        {
            return Err(CubeError::UnknownBand(format!(
                "{} missing from scene {}",
                missing.name, scene.id
            )));
        }
        debug!("Indexed {scene}");
        self.scenes.push(scene);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.get()
    }

    fn find(&self, query: &Query) -> Vec<&Scene> {
        let extent = query.region.as_region();
        let mut scenes: Vec<&Scene> = self
            .scenes
            .iter()
            .filter(|scene| scene.product == query.product)
            .filter(|scene| query.time.map_or(true, |time| time.contains(&scene.time)))
            .filter(|scene| scene.footprint().intersects(&extent))
            .collect();
        scenes.sort_by_key(|scene| scene.time);
        scenes
    }
}

impl DataCube for MemoryStore {
    fn load(&self, query: &Query) -> CubeResult<Dataset> {
        let product = self
            .products
            .get(&query.product)
            .ok_or_else(|| CubeError::UnknownProduct(query.product.clone()))?;
        let bands = product.resolve(query.measurements.as_deref())?;

        let scenes = self.find(query);
        if scenes.is_empty() {
            return Err(CubeError::NoDataFound(query.to_string()));
        }

        let crs = Crs::from_epsg(query.output_crs)?;
        let geobox = GeoBox::from_region(&query.region, crs, query.resolution)?;
        debug!("Output grid {geobox}");

        let mut days: BTreeMap<NaiveDate, Vec<&Scene>> = BTreeMap::new();
        for scene in scenes {
            days.entry(scene.solar_day()).or_default().push(scene);
        }

        let coordinates = pixel_lon_lat(&geobox)?;
        let (height, width) = geobox.shape();
        let fill: u16 = NoData::Fill.into();
        let mut data = Array4::from_elem((bands.len(), days.len(), height, width), product.nodata);
        let mut quality = Array3::from_elem((days.len(), height, width), fill);
        let mut times = Vec::with_capacity(days.len());

        for (t, (day, group)) in days.iter().enumerate() {
            debug!("{day}: fusing {} scene(s)", group.len());
            times.push(group[0].time);
            for scene in group {
                let layers = bands
                    .iter()
                    .map(|band| {
                        scene
                            .measurement(band)
                            .ok_or_else(|| CubeError::UnknownBand(band.clone()))
                    })
                    .collect::<CubeResult<Vec<_>>>()?;
                for ((y, x), point) in coordinates.indexed_iter() {
                    let Some((lon, lat)) = point else {
                        continue;
                    };
                    if Flag::NoData.extract(quality[[t, y, x]]) != fill {
                        continue;
                    }
                    let Some((row, col)) = scene.index(*lon, *lat) else {
                        continue;
                    };
                    let qa = scene.pixel_qa()[[row, col]];
                    if Flag::NoData.extract(qa) == fill {
                        continue;
                    }
                    quality[[t, y, x]] = qa;
                    for (b, layer) in layers.iter().enumerate() {
                        data[[b, t, y, x]] = layer[[row, col]];
                    }
                }
            }
        }

        let cube = RasterCube::new(bands, times, geobox, product.nodata, data)?
            .with_aliases(product.aliases());
        Dataset::new(cube, QualityBand::new(quality))
    }

    fn connect(&self) -> CubeResult<()> {
        self.sessions.set(self.sessions.get() + 1);
        Ok(())
    }

    fn disconnect(&self) {
        self.sessions.set(self.sessions.get().saturating_sub(1));
    }
}

/// Geographic coordinates of every pixel centre of `geobox`.
///
/// Pixels that fail to project are left out rather than failing the load.
fn pixel_lon_lat(geobox: &GeoBox) -> CubeResult<Array2<Option<(f64, f64)>>> {
    let wgs84 = Crs::wgs84()?;
    Ok(Array2::from_shape_fn(geobox.shape(), |(row, col)| {
        let (x, y) = geobox.pixel_centre(row, col);
        match geobox.crs.transform_to(&wgs84, x, y) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("pixel transform: {e:?}");
                None
            }
        }
    }))
}

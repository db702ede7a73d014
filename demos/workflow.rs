#![cfg(feature = "image")]
// This example requires the ['image'] feature

use chrono::{Duration, TimeZone, Utc};
use landcube::geo::utm_epsg;
use landcube::product::LANDSAT_8_SR;
use landcube::quality::{Clear, Cloud, CloudConfidence, CloudShadow, Flag, NoData, Water};
use landcube::render::renderer;
use landcube::{
    BoundingRegion, CompositeBands, CubeError, CubeResult, DateRange, MemoryStore, ProductDefinition,
    DataCube, QualityPredicate, Query, Scene, TimeSelector,
};
use std::time::Instant;

const LON: (f64, f64) = (-0.30, -0.20);
const LAT: (f64, f64) = (5.60, 5.50);
const TIME: (&str, &str) = ("2019-01-01", "2019-03-31");
const OUTPUT_DIR: &str = "data";

// Synthetic archive: one scene per 16 day revisit over the region
const SCENES: usize = 5;
const SCENE_PIXELS: usize = 400;
const SCENE_PIXEL_DEG: f64 = 0.0003;

fn main() -> CubeResult<()> {
    println!("Example: landcube Landsat 8 workflow");

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let t0 = Instant::now();
    let store = synthetic_store()?;
    println!(
        "Indexed {} scenes in {:.3}ms",
        store.len(),
        t0.elapsed().as_micros() as f64 / 1000.0
    );

    let region = BoundingRegion::new(LON.0, LON.1, LAT.0, LAT.1)?;
    let (lat, lon) = region.centre();
    let epsg = utm_epsg(lat, lon)?;
    println!("Region {region} resolves to EPSG:{epsg}");

    let query = Query::builder(LANDSAT_8_SR)
        .with_region(region)
        .with_time(DateRange::parse(TIME.0, TIME.1)?)
        .with_output_crs(epsg)
        .build()?;

    let session = store.open_session("landsat8_sr_demo")?;
    let dataset = session.load(&query)?;
    println!("{}", dataset.cube);

    let mask = dataset.mask(&QualityPredicate::new().with(NoData::Data).with(Cloud::NoCloud))?;
    for (time, fraction) in dataset.cube.times().iter().zip(mask.clear_fraction()) {
        println!("  {time}: {:.1}% cloud free", fraction * 100.0);
    }
    let masked = dataset.cube.masked(&mask)?;

    std::fs::create_dir_all(OUTPUT_DIR)?;

    let first = dataset
        .cube
        .composite(&CompositeBands::true_color(), TimeSelector::Index(0))?;
    first[0]
        .renderer()
        .with_contrast(true)
        .save(format!("{OUTPUT_DIR}/true_color.png"))?;

    let first_masked = masked.composite(&CompositeBands::true_color(), TimeSelector::Index(0))?;
    first_masked[0]
        .renderer()
        .with_contrast(true)
        .save(format!("{OUTPUT_DIR}/true_color_masked.png"))?;

    let series = masked.composite(&CompositeBands::false_color(), TimeSelector::All)?;
    renderer(&series)
        .with_contrast(true)
        .with_columns(3)
        .save(format!("{OUTPUT_DIR}/false_color_series.png"))?;

    Ok(())
}

fn synthetic_store() -> CubeResult<MemoryStore> {
    let product = ProductDefinition::landsat_8_sr();
    let mut store = MemoryStore::new();
    store.add_product(product.clone());

    let first = Utc
        .with_ymd_and_hms(2019, 1, 4, 10, 14, 0)
        .single()
        .ok_or_else(|| CubeError::InvalidDateRange("first acquisition".to_string()))?;
    let origin = (LON.0 - 0.01, LAT.0 + 0.01);
    for i in 0..SCENES {
        let time = first + Duration::days(16 * i as i64);
        let cloud = cloud_centre(i);
        let scene = Scene::from_fn(
            &format!("LC08_L1TP_193056_{}", time.format("%Y%m%d")),
            &product,
            time,
            origin,
            (-SCENE_PIXEL_DEG, SCENE_PIXEL_DEG),
            (SCENE_PIXELS, SCENE_PIXELS),
            |band, row, col| reflectance(band, row, col, cloud),
            |row, col| pixel_qa(row, col, cloud),
        )?;
        store.index(scene)?;
    }
    Ok(store)
}

fn cloud_centre(i: usize) -> (f64, f64) {
    let t = i as f64 / SCENES as f64;
    (
        SCENE_PIXELS as f64 * (0.2 + 0.6 * t),
        SCENE_PIXELS as f64 * (0.8 - 0.5 * t),
    )
}

fn cloud_cover(row: usize, col: usize, cloud: (f64, f64)) -> (bool, bool) {
    let radius = SCENE_PIXELS as f64 / 6.0;
    let d = |dr: f64, dc: f64| {
        let (y, x) = (row as f64 - cloud.0 - dr, col as f64 - cloud.1 - dc);
        (y * y + x * x).sqrt()
    };
    let cloudy = d(0.0, 0.0) < radius;
    let shadow = !cloudy && d(25.0, 25.0) < radius;
    (cloudy, shadow)
}

fn is_water(row: usize, col: usize) -> bool {
    // coastline running east-west with a gentle bend
    let coast = SCENE_PIXELS as f64 * 0.7 + 20.0 * (col as f64 / 40.0).sin();
    row as f64 > coast
}

fn reflectance(band: &str, row: usize, col: usize, cloud: (f64, f64)) -> i16 {
    let (cloudy, shadow) = cloud_cover(row, col, cloud);
    if cloudy {
        return 7500;
    }
    let texture = ((row * 7 + col * 13) % 200) as i16;
    let base: i16 = match (is_water(row, col), band) {
        (true, "nir" | "swir1" | "swir2") => 80,
        (true, "blue" | "coastal_aerosol") => 700,
        (true, _) => 400,
        (false, "nir") => 3200,
        (false, "swir1") => 1800,
        (false, "swir2") => 1000,
        (false, "green") => 900,
        (false, "red") => 600,
        (false, _) => 500,
    };
    let value = base + texture;
    if shadow {
        value / 3
    } else {
        value
    }
}

fn pixel_qa(row: usize, col: usize, cloud: (f64, f64)) -> u16 {
    let (cloudy, shadow) = cloud_cover(row, col, cloud);
    let mut qa = if cloudy {
        Flag::Cloud.encode(Cloud::Cloud.into())
            | Flag::CloudConfidence.encode(CloudConfidence::High.into())
    } else {
        Flag::CloudConfidence.encode(CloudConfidence::Low.into())
    };
    if shadow {
        qa |= Flag::CloudShadow.encode(CloudShadow::CloudShadow.into());
    }
    if !cloudy && !shadow {
        qa |= if is_water(row, col) {
            Flag::Water.encode(Water::Water.into())
        } else {
            Flag::Clear.encode(Clear::ClearLand.into())
        };
    }
    qa
}

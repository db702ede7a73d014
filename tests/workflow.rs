use chrono::{Duration, TimeZone, Utc};
use landcube::product::LANDSAT_8_SR;
use landcube::quality::{Cloud, CloudConfidence, Flag, NoData};
use landcube::{
    BoundingRegion, CompositeBands, CubeError, DataCube, DateRange, MemoryStore, ProductDefinition,
    QualityPredicate, Query, Scene, Session, TimeSelector,
};

const CLEAR: u16 = 322;
const CLOUD: u16 = 480;
const PIXEL_DEG: f64 = 0.0005;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Scenes every 16 days; the left half of scene `i` is cloudy when `i` is odd.
fn archive(scenes: usize) -> MemoryStore {
    let product = ProductDefinition::landsat_8_sr();
    let mut store = MemoryStore::new();
    store.add_product(product.clone());
    let first = Utc.with_ymd_and_hms(2019, 1, 4, 10, 14, 0).unwrap();
    for i in 0..scenes {
        let time = first + Duration::days(16 * i as i64);
        let scene = Scene::from_fn(
            &format!("LC08_{i}"),
            &product,
            time,
            (-0.31, 5.61),
            (-PIXEL_DEG, PIXEL_DEG),
            (240, 240),
            |band, _, col| {
                let offset = product.measurement(band).map_or(0, |m| {
                    product.measurements.iter().position(|p| p == m).unwrap_or(0)
                });
                (1000 + 100 * offset + col) as i16
            },
            |_, col| if i % 2 == 1 && col < 120 { CLOUD } else { CLEAR },
        )
        .unwrap();
        store.index(scene).unwrap();
    }
    store
}

fn query() -> Query {
    Query::builder(LANDSAT_8_SR)
        .with_region(BoundingRegion::new(-0.30, -0.20, 5.60, 5.50).unwrap())
        .with_time(DateRange::parse("2019-01-01", "2019-12-31").unwrap())
        .build()
        .unwrap()
}

#[test]
fn notebook_workflow_end_to_end() {
    init_logging();
    let store = archive(5);
    let session = store.open_session("workflow").unwrap();
    assert_eq!(store.open_sessions(), 1);
    let query = query();
    assert_eq!(query.output_crs, 32630);

    let dataset = session.load(&query).unwrap();
    let (bands, times, height, width) = dataset.cube.shape();
    assert_eq!((bands, times), (7, 5));

    let mask = dataset
        .mask(&QualityPredicate::new().with(Cloud::NoCloud))
        .unwrap();
    let fractions = mask.clear_fraction();
    assert_eq!(fractions[0], 1.0);
    assert!(fractions[1] > 0.3 && fractions[1] < 0.7, "{fractions:?}");

    let masked = dataset.cube.masked(&mask).unwrap();
    assert_eq!(masked.shape(), dataset.cube.shape());

    let composites = masked
        .composite(&CompositeBands::true_color(), TimeSelector::Index(1))
        .unwrap();
    assert_eq!(composites[0].pixels.dim(), (height, width, 3));
    assert!(composites[0].is_nodata(height / 2, 0));
    assert!(!composites[0].is_nodata(height / 2, width - 1));

    let image = composites[0].renderer().with_contrast(true).render().unwrap();
    assert_eq!(image.dimensions(), (width as u32, height as u32));
    assert_eq!(image.get_pixel(0, (height / 2) as u32)[3], 0);
    assert_eq!(image.get_pixel((width - 1) as u32, (height / 2) as u32)[3], 255);

    drop(session);
    assert_eq!(store.open_sessions(), 0);
}

#[test]
fn full_cloud_scene_masks_everything() {
    let product = ProductDefinition::landsat_8_sr();
    let mut store = MemoryStore::new();
    store.add_product(product.clone());
    let time = Utc.with_ymd_and_hms(2019, 2, 1, 10, 0, 0).unwrap();
    let scene = Scene::from_fn(
        "overcast",
        &product,
        time,
        (-0.31, 5.61),
        (-PIXEL_DEG, PIXEL_DEG),
        (240, 240),
        |_, _, _| 7500,
        |_, _| CLOUD,
    )
    .unwrap();
    store.index(scene).unwrap();

    let session = Session::open(&store, "overcast").unwrap();
    let dataset = session.load(&query()).unwrap();
    let mask = dataset
        .mask(&QualityPredicate::new().with(Cloud::NoCloud))
        .unwrap();
    assert_eq!(mask.count(), 0);

    let masked = dataset.cube.masked(&mask).unwrap();
    let nodata = masked.nodata();
    for band in masked.bands() {
        assert!(masked.band(band).unwrap().iter().all(|v| *v == nodata));
    }

    // an empty visible region still composites and renders
    let composites = masked
        .composite(&CompositeBands::false_color(), TimeSelector::All)
        .unwrap();
    let image = composites[0].renderer().with_contrast(true).render().unwrap();
    assert!(image.pixels().all(|p| p[3] == 0));
}

#[test]
fn composable_predicates_narrow_the_mask() {
    let store = archive(2);
    let session = Session::open(&store, "predicates").unwrap();
    let dataset = session.load(&query()).unwrap();

    let no_cloud = dataset
        .mask(&QualityPredicate::new().with(Cloud::NoCloud))
        .unwrap();
    let strict = dataset
        .mask(
            &QualityPredicate::new()
                .with(Cloud::NoCloud)
                .with(NoData::Data)
                .with(CloudConfidence::NoConfidence),
        )
        .unwrap();
    // clear pixels carry low cloud confidence, so the strict mask is empty
    assert!(no_cloud.count() > 0);
    assert_eq!(strict.count(), 0);

    let parsed: QualityPredicate = "cloud=no_cloud,nodata=data".parse().unwrap();
    assert_eq!(dataset.mask(&parsed).unwrap(), no_cloud);
}

#[test]
fn query_errors_surface_to_the_caller() {
    let store = archive(1);
    let session = Session::open(&store, "errors").unwrap();

    let mut outside = query();
    outside.time = Some(DateRange::parse("2015-01-01", "2015-12-31").unwrap());
    assert!(matches!(session.load(&outside), Err(CubeError::NoDataFound(_))));

    let dataset = session.load(&query()).unwrap();
    let ultraviolet = CompositeBands::new("ultraviolet", "green", "blue");
    assert!(matches!(
        dataset.cube.composite(&ultraviolet, TimeSelector::All),
        Err(CubeError::UnknownBand(_))
    ));
    assert!(matches!(
        dataset
            .cube
            .composite(&CompositeBands::true_color(), TimeSelector::Index(10)),
        Err(CubeError::IndexOutOfRange { index: 10, len: 1 })
    ));
}

#[test]
fn fill_pixels_stay_fill_after_loading() {
    let store = archive(1);
    // the query grid is wider than the scene footprint
    let wide = Query::builder(LANDSAT_8_SR)
        .with_region(BoundingRegion::new(-0.35, -0.15, 5.65, 5.45).unwrap())
        .with_resolution((-120.0, 120.0))
        .build()
        .unwrap();
    let session = Session::open(&store, "fill").unwrap();
    let dataset = session.load(&wide).unwrap();
    let fill: u16 = NoData::Fill.into();
    let corner = dataset.quality.get(0, 0, 0).unwrap();
    assert_eq!(Flag::NoData.extract(corner), fill);
    assert_eq!(
        dataset.cube.get("red", 0, 0, 0).unwrap(),
        Some(dataset.cube.nodata())
    );

    // fill carries no cloud bit, so cloud free coverage must also require data
    let no_cloud = QualityPredicate::new().with(Cloud::NoCloud);
    let cloud_free = QualityPredicate::new().with(NoData::Data).with(Cloud::NoCloud);
    assert_eq!(dataset.mask(&no_cloud).unwrap().get(0, 0, 0), Some(true));
    let coverage = dataset.mask(&cloud_free).unwrap();
    assert_eq!(coverage.get(0, 0, 0), Some(false));
    assert!(coverage.clear_fraction()[0] < 1.0);
}

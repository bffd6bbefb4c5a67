use criterion::{criterion_group, criterion_main, Criterion};
use gdal::{raster::Buffer, DriverManager};
use geo::Rect;
use ndarray::Array2;
use rusterstats::{zonal_stats, ArraySource, Feature, GdalRaster, ZonalStatsOptions};

const SIZE: (usize, usize) = (1024, 1024);
const TRANSFORM: [f64; 6] = [0., 1., 0., SIZE.0 as f64, 0., -1.];

fn array() -> Array2<f64> {
    Array2::from_shape_fn(SIZE, |(row, col)| ((row * 31 + col * 17) % 255) as f64)
}

fn write_raster(path: &str) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f64, _>(path, SIZE.1, SIZE.0, 1)
        .unwrap();
    dataset.set_geo_transform(&TRANSFORM).unwrap();
    let mut band = dataset.rasterband(1).unwrap();
    band.set_no_data_value(Some(0.)).unwrap();
    let mut buffer = Buffer::new((SIZE.1, SIZE.0), array().into_raw_vec_and_offset().0);
    band.write((0, 0), (SIZE.1, SIZE.0), &mut buffer).unwrap();
}

/// 16 x 16 grid of zones, slightly inset from the cell grid.
fn zones() -> Vec<Feature> {
    let step = SIZE.0 as f64 / 16.;
    (0..16)
        .flat_map(|row| (0..16).map(move |col| (row as f64 * step, col as f64 * step)))
        .map(|(y, x)| {
            let zone = Rect::new((x + 0.3, y + 0.3), (x + step - 0.3, y + step - 0.3));
            Feature::new(zone.to_polygon())
        })
        .collect()
}

fn bench_extents(c: &mut Criterion) {
    let path = "/vsimem/benchmarks.tif";
    write_raster(path);
    let raster = GdalRaster::open(path).unwrap();
    let options = ZonalStatsOptions::default().stats(["count", "mean", "std", "majority"]);

    c.bench_function("local_extent", |b| {
        b.iter(|| zonal_stats(zones(), &raster, options.clone()))
    });
    c.bench_function("global_extent", |b| {
        b.iter(|| zonal_stats(zones(), &raster, options.clone().global_extent(true)))
    });
    c.bench_function("global_extent_parallel", |b| {
        b.iter(|| {
            zonal_stats(
                zones(),
                &raster,
                options.clone().global_extent(true).parallel(true),
            )
        })
    });
}

fn bench_in_memory(c: &mut Criterion) {
    let raster = ArraySource::new(array())
        .with_transform(TRANSFORM)
        .with_nodata(0.);
    let options = ZonalStatsOptions::default().stats(["ALL"]);
    c.bench_function("in_memory", |b| {
        b.iter(|| zonal_stats(zones(), &raster, options.clone()))
    });
}

criterion_group!(benches, bench_extents, bench_in_memory);
criterion_main!(benches);

//! Criterion benchmarks for the per-frame map work.
//!
//! Benchmarks:
//!   - overlay rebuild from a dataset of a few hundred items
//!   - rasterizing base map and overlays for a 120x40 map pane
//!
//! Run with: cargo bench --bench hot_paths

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fire_risk_map::data::generate_fallback_outline;
use fire_risk_map::map::{MapRenderer, Overlays, ViewState, Viewport};
use fire_risk_map::model::{ActiveFire, Dataset, LatLng, RiskArea};

/// Sample data plus a grid of synthetic areas and fires around the Bay Area
fn busy_dataset() -> Dataset {
    let mut data = Dataset::sample();
    for i in 0..200u64 {
        let lat = 36.0 + (i / 20) as f64 * 0.3;
        let lng = -124.0 + (i % 20) as f64 * 0.3;
        data.risk_areas.push(RiskArea {
            id: 1000 + i,
            name: format!("Area {i}"),
            center: LatLng::new(lat, lng),
            radius: 10_000.0 + (i % 7) as f64 * 5_000.0,
            risk_score: (i % 10) as f64 / 10.0,
            risk_factors: vec!["Dry vegetation".into()],
        });
        data.active_fires.push(ActiveFire {
            id: 5000 + i,
            name: format!("Fire {i}"),
            location: LatLng::new(lat + 0.1, lng + 0.1),
            intensity: (i % 5) as f64 / 5.0,
            started: "2025-05-24".into(),
        });
    }
    data
}

fn bench_overlay_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlays");
    let data = busy_dataset();
    let view = ViewState::default();

    group.bench_function("build_400_items", |b| {
        b.iter(|| black_box(Overlays::build(black_box(&data), black_box(&view))));
    });

    group.finish();
}

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("renderer");
    let data = busy_dataset();
    let overlays = Overlays::build(&data, &ViewState::default());
    let mut renderer = MapRenderer::new();
    generate_fallback_outline(&mut renderer);
    let viewport = Viewport::centered(LatLng::new(37.5, -121.5), 7.0, 240, 160);

    group.bench_function("render_120x40", |b| {
        b.iter(|| black_box(renderer.render(120, 40, black_box(&viewport), black_box(&overlays))));
    });

    group.finish();
}

criterion_group!(benches, bench_overlay_build, bench_rasterize);
criterion_main!(benches);

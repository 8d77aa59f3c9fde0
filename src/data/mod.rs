use crate::map::{LineString, Lod, MapRenderer};
use crate::model::{Dataset, LatLng};
use crate::risk::risk_level;
use anyhow::{Context, Result};
use geojson::{feature, Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Load all available Natural Earth GeoJSON data into the map renderer.
/// Missing files are skipped; unreadable ones are logged and skipped.
pub fn load_all_geojson(renderer: &mut MapRenderer, data_dir: &Path) -> Result<()> {
    let coastline_files = [
        ("ne_110m_coastline.json", Lod::Low),
        ("ne_50m_coastline.json", Lod::Medium),
        ("ne_10m_coastline.json", Lod::High),
    ];
    for (filename, lod) in coastline_files {
        load_if_present(data_dir, filename, |line| renderer.add_coastline(line, lod));
    }

    let border_files = [
        ("ne_50m_borders.json", Lod::Medium),
        ("ne_10m_borders.json", Lod::High),
    ];
    for (filename, lod) in border_files {
        load_if_present(data_dir, filename, |line| renderer.add_border(line, lod));
    }

    load_if_present(data_dir, "ne_10m_states.json", |line| renderer.add_state(line));

    Ok(())
}

fn load_if_present<F>(data_dir: &Path, filename: &str, add_line: F)
where
    F: FnMut(LineString),
{
    let path = data_dir.join(filename);
    if !path.exists() {
        return;
    }
    match read_geojson(&path) {
        Ok(geojson) => {
            let count = process_geojson_lines(&geojson, add_line);
            info!(file = filename, lines = count, "loaded base map layer");
        }
        Err(e) => warn!("Failed to load {filename}: {e:#}"),
    }
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content.parse::<GeoJson>()?)
}

/// Extract every line feature, returning how many were added
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F) -> usize
where
    F: FnMut(LineString),
{
    let mut count = 0;
    let mut counted = |line: LineString| {
        count += 1;
        add_line(line);
    };
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut counted);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut counted);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut counted),
    }
    count
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

/// Coarse outline of the contiguous US for when no data files are present
pub fn generate_fallback_outline(renderer: &mut MapRenderer) {
    renderer.add_coastline(
        vec![
            (-124.7, 48.4), (-124.1, 46.3), (-124.0, 43.0), (-124.4, 40.4),
            (-123.0, 38.0), (-122.5, 37.2), (-121.9, 36.6), (-120.6, 34.6),
            (-118.5, 34.0), (-117.1, 32.5),
        ],
        Lod::Low,
    );
    renderer.add_coastline(
        vec![
            (-97.2, 25.9), (-97.4, 27.8), (-94.0, 29.6), (-89.6, 29.2),
            (-88.0, 30.7), (-84.3, 30.0), (-82.6, 27.5), (-81.0, 25.1),
            (-80.1, 26.7), (-81.4, 30.7), (-79.0, 33.5), (-75.5, 35.2),
            (-76.0, 37.0), (-74.0, 40.5), (-70.6, 41.6), (-70.0, 43.7),
            (-67.0, 44.8),
        ],
        Lod::Low,
    );
    // Land borders with Canada and Mexico
    renderer.add_border(
        vec![
            (-123.1, 49.0), (-95.2, 49.0), (-89.6, 48.0), (-84.4, 46.5),
            (-82.4, 43.0), (-79.0, 43.3), (-74.7, 45.0), (-71.5, 45.0),
            (-69.2, 47.4), (-67.8, 47.1), (-67.0, 44.8),
        ],
        Lod::Medium,
    );
    renderer.add_border(
        vec![
            (-117.1, 32.5), (-114.7, 32.7), (-111.1, 31.3), (-108.2, 31.3),
            (-106.5, 31.8), (-104.5, 29.6), (-101.4, 29.8), (-99.5, 27.5),
            (-97.2, 25.9),
        ],
        Lod::Medium,
    );
    renderer.add_state(vec![(-120.0, 42.0), (-120.0, 39.0), (-114.6, 35.0), (-114.7, 32.7)]);
    renderer.add_state(vec![(-124.2, 42.0), (-111.0, 42.0)]);
}

fn lat_lng_point(at: LatLng) -> Option<Geometry> {
    Some(Geometry::new(Value::Point(vec![at.lng, at.lat])))
}

fn point_feature(id: u64, geometry: Option<Geometry>, properties: serde_json::Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry,
        id: Some(feature::Id::Number(id.into())),
        properties,
        foreign_members: None,
    }
}

/// Snapshot as a GeoJSON feature collection, one point feature per item
pub fn dataset_to_geojson(data: &Dataset) -> GeoJson {
    let areas = data.risk_areas.iter().map(|area| {
        point_feature(
            area.id,
            lat_lng_point(area.center),
            json!({
                "layer": "riskArea",
                "name": area.name,
                "radius": area.radius,
                "risk_score": area.risk_score,
                "risk_level": risk_level(area.risk_score),
                "risk_factors": area.risk_factors,
            }),
        )
    });
    let fires = data.active_fires.iter().map(|fire| {
        point_feature(
            fire.id,
            lat_lng_point(fire.location),
            json!({
                "layer": "activeFire",
                "name": fire.name,
                "intensity": fire.intensity,
                "started": fire.started,
            }),
        )
    });
    let resources = data.resources.iter().map(|res| {
        point_feature(
            res.id,
            lat_lng_point(res.location),
            json!({
                "layer": "resource",
                "name": res.name,
                "type": res.kind,
                "personnel": res.personnel,
            }),
        )
    });

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: areas.chain(fires).chain(resources).collect(),
        foreign_members: None,
    })
}

/// Write the snapshot to `path` as pretty-printed GeoJSON
pub fn export_geojson(data: &Dataset, path: &Path) -> Result<usize> {
    let geojson = dataset_to_geojson(data);
    let count = match &geojson {
        GeoJson::FeatureCollection(fc) => fc.features.len(),
        _ => 0,
    };
    let json = serde_json::to_string_pretty(&geojson)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), features = count, "exported GeoJSON");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_round_trips_through_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.geojson");
        let count = export_geojson(&Dataset::sample(), &path).unwrap();
        assert_eq!(count, 7);

        let parsed: GeoJson = fs::read_to_string(&path).unwrap().parse().unwrap();
        let GeoJson::FeatureCollection(fc) = parsed else {
            panic!("expected a feature collection");
        };
        let first = &fc.features[0];
        assert_eq!(first.property("name").and_then(|v| v.as_str()), Some("Northern Forest Region"));
        assert_eq!(first.property("layer").and_then(|v| v.as_str()), Some("riskArea"));
        assert_eq!(first.property("risk_level").and_then(|v| v.as_str()), Some("High"));
        match first.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) => assert_eq!(coords, &vec![-122.4194, 37.7749]),
            other => panic!("unexpected geometry {other:?}"),
        }
        let last = &fc.features[6];
        assert_eq!(last.property("type").and_then(|v| v.as_str()), Some("Helicopter Unit"));
    }

    #[test]
    fn test_load_lines_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let coast = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[-124,40],[-123,38]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"MultiPolygon","coordinates":[[[[-120,35],[-119,35],[-119,36],[-120,35]]]]}}
        ]}"#;
        fs::write(dir.path().join("ne_110m_coastline.json"), coast).unwrap();
        fs::write(dir.path().join("ne_10m_states.json"), "not geojson").unwrap();

        let mut renderer = MapRenderer::new();
        load_all_geojson(&mut renderer, dir.path()).unwrap();
        assert_eq!(renderer.coastlines_low.len(), 2);
        assert!(renderer.states.is_empty());
    }

    #[test]
    fn test_fallback_outline_has_data() {
        let mut renderer = MapRenderer::new();
        assert!(!renderer.has_data());
        generate_fallback_outline(&mut renderer);
        assert!(renderer.has_data());
        assert!(!renderer.borders_medium.is_empty());
    }
}

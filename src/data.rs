use crate::config::{AppConfig, GeometryFormat};
use crate::counts::CountTable;
use crate::types::Feature;
use anyhow::{anyhow, Context, Result};
use geo::winding_order::{Winding, WindingOrder};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{FeatureCollection, GeoJson};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

pub fn load_counts(config: &AppConfig) -> Result<CountTable> {
    let raw = fs::read_to_string(&config.input.counts)
        .with_context(|| format!("Failed to read count file: {:?}", config.input.counts))?;
    let table = CountTable::parse(&raw);
    println!("Loaded counts for {} keys", table.len());
    Ok(table)
}

pub fn load_features(config: &AppConfig) -> Result<Vec<Feature>> {
    println!("Loading geometry from {:?}...", config.input.geometry);

    let features = match config.input.format {
        GeometryFormat::GeoJson => {
            load_geojson(&config.input.geometry, &config.input.key_attribute)?
        }
        GeometryFormat::EsriJson => {
            load_esri_json(&config.input.geometry, &config.input.key_attribute)?
        }
    };

    println!("Loaded {} polygon features", features.len());
    Ok(features)
}

fn load_geojson(path: &Path, key_attribute: &str) -> Result<Vec<Feature>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    // Parse the GeoJSON. warning: this loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    collection_to_features(collection, key_attribute)
}

fn collection_to_features(
    collection: FeatureCollection,
    key_attribute: &str,
) -> Result<Vec<Feature>> {
    let mut features = Vec::new();

    for feature in collection.features {
        let attributes = feature.properties.unwrap_or_default();

        // 1. Key attribute, string or number; skip features without one.
        let id = match attributes.get(key_attribute) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };

        // 2. geojson crate Value -> geo types -> MultiPolygon
        let geometry = match feature.geometry {
            Some(geom) => {
                let valid_geo: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // Skip points/lines
                }
            }
            None => continue,
        };

        features.push(Feature {
            id,
            geometry,
            attributes,
        });
    }

    Ok(features)
}

// Esri JSON feature class, the non-geojson wire variant:
// {"features":[{"attributes":{...},"geometry":{"rings":[[[x,y],...]]}}]}
#[derive(Debug, Deserialize)]
struct EsriFeatureClass {
    #[serde(default)]
    features: Vec<EsriFeature>,
}

#[derive(Debug, Deserialize)]
struct EsriFeature {
    #[serde(default)]
    attributes: Map<String, Value>,
    geometry: Option<EsriGeometry>,
}

#[derive(Debug, Deserialize)]
struct EsriGeometry {
    #[serde(default)]
    rings: Vec<Vec<[f64; 2]>>,
}

fn load_esri_json(path: &Path, key_attribute: &str) -> Result<Vec<Feature>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open Esri JSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    let feature_class: EsriFeatureClass =
        serde_json::from_reader(reader).context("Failed to parse Esri JSON")?;

    Ok(esri_class_to_features(feature_class, key_attribute))
}

fn esri_class_to_features(feature_class: EsriFeatureClass, key_attribute: &str) -> Vec<Feature> {
    let mut features = Vec::new();

    for feature in feature_class.features {
        let id = match feature.attributes.get(key_attribute) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };

        let geometry = match feature.geometry {
            Some(geom) if !geom.rings.is_empty() => rings_to_multi_polygon(&geom.rings),
            _ => continue, // Skip non-polygon shapes
        };

        features.push(Feature {
            id,
            geometry,
            attributes: feature.attributes,
        });
    }

    features
}

/// Esri rings wind clockwise for exteriors and counter-clockwise for
/// holes; a hole belongs to the most recent exterior. A leading hole
/// ring with no exterior to attach to is promoted to an exterior.
fn rings_to_multi_polygon(rings: &[Vec<[f64; 2]>]) -> MultiPolygon<f64> {
    let mut parts: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let mut line: LineString<f64> = ring
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        line.close();

        let is_exterior = line.winding_order() == Some(WindingOrder::Clockwise);
        match parts.last_mut() {
            Some(last) if !is_exterior => last.1.push(line),
            _ => parts.push((line, Vec::new())),
        }
    }

    MultiPolygon::new(
        parts
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn parse_collection(raw: &str) -> FeatureCollection {
        match raw.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc,
            _ => panic!("expected a feature collection"),
        }
    }

    #[test]
    fn geojson_collection_converts_polygon_features() {
        let collection = parse_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": { "name": "Alpha", "region": "west" },
                        "geometry": {
                            "type": "Polygon",
                            "coordinates": [[[0,0],[1000,0],[1000,1000],[0,1000],[0,0]]]
                        }
                    }
                ]
            }"#,
        );

        let features = collection_to_features(collection, "name").unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, "Alpha");
        assert_eq!(features[0].geometry.unsigned_area(), 1_000_000.0);
        assert_eq!(
            features[0].attributes.get("region"),
            Some(&Value::String("west".to_string()))
        );
    }

    #[test]
    fn geojson_skips_non_polygon_and_keyless_features() {
        let collection = parse_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": { "name": "Beta" },
                        "geometry": { "type": "Point", "coordinates": [1, 2] }
                    },
                    {
                        "type": "Feature",
                        "properties": { "region": "keyless" },
                        "geometry": {
                            "type": "Polygon",
                            "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]
                        }
                    },
                    {
                        "type": "Feature",
                        "properties": { "name": 7 },
                        "geometry": {
                            "type": "MultiPolygon",
                            "coordinates": [[[[0,0],[10,0],[10,10],[0,10],[0,0]]]]
                        }
                    }
                ]
            }"#,
        );

        let features = collection_to_features(collection, "name").unwrap();
        // Point and keyless features are dropped; the numeric key survives
        // in its decimal form.
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, "7");
    }

    #[test]
    fn esri_rings_split_into_exteriors_and_holes() {
        // Clockwise 10x10 exterior with a counter-clockwise 4x4 hole.
        let rings = vec![
            vec![[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0], [0.0, 0.0]],
            vec![[2.0, 2.0], [6.0, 2.0], [6.0, 6.0], [2.0, 6.0], [2.0, 2.0]],
        ];

        let geometry = rings_to_multi_polygon(&rings);
        assert_eq!(geometry.0.len(), 1);
        assert_eq!(geometry.0[0].interiors().len(), 1);
        assert_eq!(geometry.unsigned_area(), 100.0 - 16.0);
    }

    #[test]
    fn esri_multiple_exteriors_become_multipolygon() {
        let rings = vec![
            vec![[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0], [0.0, 0.0]],
            vec![[20.0, 0.0], [20.0, 5.0], [25.0, 5.0], [25.0, 0.0], [20.0, 0.0]],
        ];

        let geometry = rings_to_multi_polygon(&rings);
        assert_eq!(geometry.0.len(), 2);
        assert_eq!(geometry.unsigned_area(), 100.0 + 25.0);
    }

    #[test]
    fn esri_class_converts_and_filters_features() {
        let feature_class: EsriFeatureClass = serde_json::from_str(
            r#"{
                "features": [
                    {
                        "attributes": { "NAME": 42, "pop": 1000 },
                        "geometry": {
                            "rings": [[[0,0],[0,10],[10,10],[10,0],[0,0]]]
                        }
                    },
                    { "attributes": { "NAME": "nogeom" } },
                    {
                        "attributes": { "pop": 5 },
                        "geometry": {
                            "rings": [[[0,0],[0,1],[1,1],[1,0],[0,0]]]
                        }
                    },
                    {
                        "attributes": { "NAME": "emptyrings" },
                        "geometry": { "rings": [] }
                    }
                ]
            }"#,
        )
        .unwrap();

        let features = esri_class_to_features(feature_class, "NAME");
        // Only the feature with both a key attribute and rings survives.
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, "42");
        assert_eq!(features[0].geometry.unsigned_area(), 100.0);
        assert_eq!(
            features[0].attributes.get("pop"),
            Some(&serde_json::json!(1000))
        );
    }
}

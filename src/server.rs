use crate::config::AppConfig;
use crate::counts::CountTable;
use crate::processing::{class_of, compute_densities, ClassId};
use crate::report::{build_legend, LegendEntry};
use crate::style::{style_for_class, StyleDescriptor};
use crate::types::{DensityRecord, DensityStats, Feature};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use geo::algorithm::contains::Contains;
use geo::bounding_rect::BoundingRect;
use geo::{Point, Rect};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

// Wrapper for RTree indexing
struct FeatureIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub features: Vec<Feature>,
    pub counts: CountTable,
    pub records: HashMap<String, DensityRecord>,
    pub stats: DensityStats,
    pub number_of_classes: u32,
    pub tree: RTree<FeatureIndex>,
}

#[derive(Deserialize)]
pub struct QueryParams {
    /// Coordinates in the geometry's projected CRS.
    x: f64,
    y: f64,
}

#[derive(Serialize)]
pub struct QueryResponse {
    key: String,
    count: Option<String>,
    area_km2: f64,
    density: f64,
    class_id: ClassId,
    style: StyleDescriptor,
    attributes: Map<String, Value>,
}

#[derive(Serialize)]
pub struct CountRow {
    key: String,
    count: String,
}

#[derive(Serialize)]
pub struct LegendResponse {
    number_of_classes: u32,
    stats: DensityStats,
    legend: Vec<LegendEntry>,
}

fn build_index(features: &[Feature]) -> RTree<FeatureIndex> {
    let tree_items: Vec<FeatureIndex> = features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let rect = feature.geometry.bounding_rect().unwrap_or(Rect::new(
                geo::Coord { x: 0.0, y: 0.0 },
                geo::Coord { x: 0.0, y: 0.0 },
            ));
            FeatureIndex {
                index: i,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            }
        })
        .collect();

    RTree::bulk_load(tree_items)
}

pub async fn start_server(
    config: AppConfig,
    features: Vec<Feature>,
    counts: CountTable,
) -> Result<()> {
    let number_of_classes = config.classification.number_of_classes;
    let (records, stats) = compute_densities(
        &features,
        &counts,
        &config.input.key_attribute,
        number_of_classes,
    );

    // Build Spatial Index
    println!("Building spatial index for API...");
    let tree = build_index(&features);
    println!("Spatial index built.");

    let state = Arc::new(AppState {
        features,
        counts,
        records,
        stats,
        number_of_classes,
        tree,
    });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    println!("Starting server on http://{}", addr);

    let static_dir = config
        .server
        .static_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let app = Router::new()
        .route("/api/query", get(query_handler))
        .route("/api/counts", get(counts_handler))
        .route("/api/legend", get(legend_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<QueryResponse>> {
    let point = Point::new(params.x, params.y);
    let envelope = AABB::from_point([params.x, params.y]);

    // Query RTree
    let candidates = state.tree.locate_in_envelope_intersecting(&envelope);

    for candidate in candidates {
        if let Some(feature) = state.features.get(candidate.index) {
            if !feature.geometry.contains(&point) {
                continue;
            }
            // Record missing for a loaded feature means the density pass
            // never saw it; report no hit rather than invent one.
            if let Some(record) = state.records.get(&feature.id) {
                let class_id = class_of(record.density, &state.stats, state.number_of_classes);
                return Json(Some(QueryResponse {
                    key: feature.id.clone(),
                    count: state.counts.get(&feature.id).map(str::to_string),
                    area_km2: record.area_km2,
                    density: record.density,
                    class_id,
                    style: style_for_class(class_id),
                    attributes: feature.attributes.clone(),
                }));
            }
        }
    }

    Json(None)
}

async fn counts_handler(State(state): State<Arc<AppState>>) -> Json<Vec<CountRow>> {
    let rows = state
        .counts
        .iter_ordered()
        .map(|(key, count)| CountRow {
            key: key.to_string(),
            count: count.to_string(),
        })
        .collect();
    Json(rows)
}

async fn legend_handler(State(state): State<Arc<AppState>>) -> Json<LegendResponse> {
    Json(LegendResponse {
        number_of_classes: state.number_of_classes,
        stats: state.stats,
        legend: build_legend(&state.stats, state.number_of_classes),
    })
}

use crate::counts::CountTable;
use crate::types::{DensityRecord, DensityStats, Feature};
use geo::Area;
use std::collections::HashMap;

/// Geometry coordinates are metres in the projected CRS; planar square
/// metres convert to square kilometres.
const SQ_M_TO_SQ_KM: f64 = 1e-6;

pub type ClassId = u32;

/// Join features against the count table and derive per-feature density
/// plus the global range stats used for classification.
///
/// The pass is sequential and order-sensitive: a density equal to the
/// running minimum replaces it, while the maximum only moves in the else
/// branch on strictly greater values.
pub fn compute_densities(
    features: &[Feature],
    counts: &CountTable,
    key_attribute: &str,
    number_of_classes: u32,
) -> (HashMap<String, DensityRecord>, DensityStats) {
    let mut records: HashMap<String, DensityRecord> = HashMap::with_capacity(features.len());
    let mut minimum_density = f64::MAX;
    let mut maximum_density = 0.0_f64;

    for feature in features {
        let name = feature
            .attribute_key(key_attribute)
            .unwrap_or_else(|| feature.id.clone());

        // TODO reproject with proj4rs (Robinson, ESRI:54030) before
        // measuring; this is planar area in the source CRS.
        let area = feature.geometry.unsigned_area() * SQ_M_TO_SQ_KM;

        let record = match counts.get(&name) {
            Some(count) => DensityRecord {
                area_km2: area,
                // Zero area divides through to +Inf (or NaN for an
                // unparseable count); both propagate untouched.
                density: parse_count(count) / area,
            },
            None => DensityRecord::ZERO,
        };

        if record.density <= minimum_density {
            minimum_density = record.density;
        } else if record.density > maximum_density {
            maximum_density = record.density;
        }

        records.insert(name, record);
    }

    let range = maximum_density - minimum_density;
    let stats = DensityStats {
        minimum_density,
        maximum_density,
        range,
        class_interval: range / number_of_classes as f64,
    };

    (records, stats)
}

fn parse_count(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Equal-interval classification against the computed stats.
///
/// Every break `min + i * interval` the density reaches bumps the class
/// to `i + 1`; a density below all breaks stays in class 0. With the
/// default 7 classes that makes 8 reachable bins, 0 through 7. NaN
/// compares false against every break and lands in class 0; +Inf lands
/// in the top class.
pub fn class_of(density: f64, stats: &DensityStats, number_of_classes: u32) -> ClassId {
    let mut class_id = 0;
    for i in 0..number_of_classes {
        let class_break = stats.minimum_density + i as f64 * stats.class_interval;
        if density >= class_break {
            class_id = i + 1;
        }
    }
    class_id
}

use geo::MultiPolygon;
use serde::Serialize;
use serde_json::{Map, Value};

/// A named polygon feature from the geometry source.
///
/// Features are read-only inputs: the engine never creates or mutates
/// them, it only joins them against the count table by key.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
    /// Open attribute bag carried through from the source file.
    pub attributes: Map<String, Value>,
}

impl Feature {
    /// Attribute rendered as a join key: strings as-is, numbers via their
    /// decimal form. Other value types have no key form.
    pub fn attribute_key(&self, name: &str) -> Option<String> {
        match self.attributes.get(name) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Per-feature derived values. A feature with no matching count row gets
/// a real zero record, not an absent one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityRecord {
    pub area_km2: f64,
    pub density: f64,
}

impl DensityRecord {
    pub const ZERO: DensityRecord = DensityRecord {
        area_km2: 0.0,
        density: 0.0,
    };
}

/// Global density range computed once per pass and never mutated after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityStats {
    pub minimum_density: f64,
    pub maximum_density: f64,
    pub range: f64,
    pub class_interval: f64,
}

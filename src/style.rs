use crate::processing::ClassId;
use serde::Serialize;

/// Sequential light-yellow to dark-red ramp (ColorBrewer YlOrRd, 9
/// classes), indexed directly by class id.
pub const COLOR_RAMP: [&str; 9] = [
    "rgba(255,255,204,0.8)",
    "rgba(255,237,160,0.8)",
    "rgba(254,217,118,0.8)",
    "rgba(254,178,76,0.8)",
    "rgba(253,141,60,0.8)",
    "rgba(252,78,42,0.8)",
    "rgba(227,26,28,0.8)",
    "rgba(189,0,38,0.8)",
    "rgba(128,0,38,0.8)",
];

/// Fill for class ids past the end of the ramp; visibly not part of the
/// sequential scheme so overflow stands out.
pub const UNCLASSIFIED_FILL: &str = "rgba(0,0,255,0.5)";

const STROKE_COLOR: &str = "#888";
const STROKE_WIDTH: f64 = 1.0;

/// Renderable style for one feature. Immutable, cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub fill_color: &'static str,
    pub stroke_color: &'static str,
    pub stroke_width: f64,
}

/// Pure lookup, safe to call per feature per draw.
pub fn style_for_class(class_id: ClassId) -> StyleDescriptor {
    let fill = COLOR_RAMP
        .get(class_id as usize)
        .copied()
        .unwrap_or(UNCLASSIFIED_FILL);

    StyleDescriptor {
        fill_color: fill,
        stroke_color: STROKE_COLOR,
        stroke_width: STROKE_WIDTH,
    }
}

use crate::config::AppConfig;
use crate::counts::CountTable;
use crate::processing::{class_of, ClassId};
use crate::style::{style_for_class, StyleDescriptor};
use crate::types::{DensityRecord, DensityStats, Feature};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;

/// One classified feature as written to the report and returned by the
/// query API.
#[derive(Debug, Serialize)]
pub struct FeatureClassRow {
    pub key: String,
    pub count: Option<String>,
    pub area_km2: f64,
    pub density: f64,
    pub class_id: ClassId,
    pub style: StyleDescriptor,
}

#[derive(Debug, Serialize)]
pub struct LegendEntry {
    pub class_id: ClassId,
    /// Lower break of the bin; class 0 has no lower bound.
    pub lower_break: Option<f64>,
    pub fill_color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClassificationReport {
    pub number_of_classes: u32,
    pub stats: DensityStats,
    pub legend: Vec<LegendEntry>,
    pub features: Vec<FeatureClassRow>,
}

pub fn build_legend(stats: &DensityStats, number_of_classes: u32) -> Vec<LegendEntry> {
    (0..=number_of_classes)
        .map(|class_id| LegendEntry {
            class_id,
            lower_break: (class_id > 0).then(|| {
                stats.minimum_density + (class_id - 1) as f64 * stats.class_interval
            }),
            fill_color: style_for_class(class_id).fill_color,
        })
        .collect()
}

pub fn build_report(
    features: &[Feature],
    counts: &CountTable,
    records: &HashMap<String, DensityRecord>,
    stats: &DensityStats,
    number_of_classes: u32,
) -> Result<ClassificationReport> {
    let mut rows = Vec::with_capacity(features.len());

    for feature in features {
        // Every feature was seen by the density pass; a missing record is
        // a contract violation, not a zero.
        let record = records
            .get(&feature.id)
            .ok_or_else(|| anyhow!("No density record for feature '{}'", feature.id))?;

        let class_id = class_of(record.density, stats, number_of_classes);
        rows.push(FeatureClassRow {
            key: feature.id.clone(),
            count: counts.get(&feature.id).map(str::to_string),
            area_km2: record.area_km2,
            density: record.density,
            class_id,
            style: style_for_class(class_id),
        });
    }

    Ok(ClassificationReport {
        number_of_classes,
        stats: *stats,
        legend: build_legend(stats, number_of_classes),
        features: rows,
    })
}

pub fn write_report(config: &AppConfig, report: &ClassificationReport) -> Result<()> {
    let file = File::create(&config.output.report)
        .with_context(|| format!("Failed to create report file: {:?}", config.output.report))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .context("Failed to serialize classification report")?;
    println!(
        "Wrote classification report for {} features to {:?}",
        report.features.len(),
        config.output.report
    );
    Ok(())
}

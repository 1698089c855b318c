//! Regional rollups
//!
//! Groups records by region and reports funding statistics plus per-area
//! counts taken from the `is_<area>` classification columns.

use grantlens_core::{Error, GrantRecord, Result};
use grantlens_taxonomy::{ClassificationTable, TaxonomyModel};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Region label for records without one
pub const UNKNOWN_REGION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub record_count: usize,
    pub total_funding: f64,
    pub mean_funding: f64,
    pub median_funding: f64,
    /// True `is_<area>` counts keyed by area name, in taxonomy order
    pub area_counts: IndexMap<String, usize>,
    /// Percent of all funding, rounded to 2 decimals
    pub funding_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSummary {
    pub regions: Vec<RegionSummary>,
    pub total_funding: f64,
}

impl GeoSummary {
    pub fn region(&self, name: &str) -> Option<&RegionSummary> {
        self.regions.iter().find(|r| r.region == name)
    }
}

#[derive(Debug, Clone)]
pub struct GeoAggregator {
    taxonomy: Arc<TaxonomyModel>,
}

impl GeoAggregator {
    pub fn new(taxonomy: Arc<TaxonomyModel>) -> Self {
        Self { taxonomy }
    }

    /// One row per distinct region, sorted by region code
    pub fn aggregate_by_region(
        &self,
        records: &[GrantRecord],
        table: &ClassificationTable,
    ) -> Result<GeoSummary> {
        if records.len() != table.len() {
            return Err(Error::DimensionMismatch {
                index: 0,
                expected: records.len(),
                actual: table.len(),
            });
        }

        // Areas whose column is absent from the table are skipped
        let area_columns: Vec<(String, usize)> = self
            .taxonomy
            .area_names()
            .filter_map(|area| {
                table
                    .column_index(&format!("is_{}", area))
                    .map(|index| (area.to_string(), index))
            })
            .collect();

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            let region = record.region.as_deref().unwrap_or(UNKNOWN_REGION);
            groups.entry(region).or_default().push(i);
        }

        let total_funding: f64 = records.iter().map(GrantRecord::amount_or_zero).sum();

        let regions: Vec<RegionSummary> = groups
            .into_iter()
            .map(|(region, members)| {
                let mut amounts: Vec<f64> =
                    members.iter().map(|&i| records[i].amount_or_zero()).collect();
                let region_total: f64 = amounts.iter().sum();

                let area_counts = area_columns
                    .iter()
                    .map(|(area, column)| {
                        let count = members
                            .iter()
                            .filter(|&&i| table.rows()[i].get(*column))
                            .count();
                        (area.clone(), count)
                    })
                    .collect();

                RegionSummary {
                    region: region.to_string(),
                    record_count: members.len(),
                    total_funding: region_total,
                    mean_funding: region_total / members.len() as f64,
                    median_funding: median(&mut amounts),
                    area_counts,
                    funding_share: share(region_total, total_funding),
                }
            })
            .collect();

        tracing::debug!(regions = regions.len(), total_funding, "regional aggregation finished");
        Ok(GeoSummary {
            regions,
            total_funding,
        })
    }
}

pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn share(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (part / total * 10000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use grantlens_taxonomy::{KeywordClassifier, TaxonomyConfig};
    use serde_json::json;

    fn taxonomy() -> Arc<TaxonomyModel> {
        let config = TaxonomyConfig::from_value(json!({
            "Research_Areas": {
                "Genetics": {"keywords": ["gene"], "subtypes": {}},
                "Cancer": {"keywords": ["tumor"], "subtypes": {}}
            },
            "Award_Size": {},
            "Technology_Platform": {},
            "Study_Design": {}
        }))
        .unwrap();
        Arc::new(TaxonomyModel::new(config).unwrap())
    }

    fn records() -> Vec<GrantRecord> {
        vec![
            GrantRecord::new("gene study", "").with_amount(100.0).with_region("MA"),
            GrantRecord::new("tumor study", "").with_amount(300.0).with_region("MA"),
            GrantRecord::new("gene and tumor", "").with_amount(600.0).with_region("CA"),
            GrantRecord::new("other", ""),
        ]
    }

    #[test]
    fn test_aggregate_by_region() {
        let taxonomy = taxonomy();
        let records = records();
        let table = KeywordClassifier::new(taxonomy.clone()).classify(&records);
        let summary = GeoAggregator::new(taxonomy)
            .aggregate_by_region(&records, &table)
            .unwrap();

        let names: Vec<&str> = summary.regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, vec!["CA", "MA", "Unknown"]);

        let ma = summary.region("MA").unwrap();
        assert_eq!(ma.record_count, 2);
        assert_eq!(ma.total_funding, 400.0);
        assert_eq!(ma.mean_funding, 200.0);
        assert_eq!(ma.median_funding, 200.0);
        assert_eq!(ma.area_counts["Genetics"], 1);
        assert_eq!(ma.area_counts["Cancer"], 1);
        assert_eq!(ma.funding_share, 40.0);

        let unknown = summary.region(UNKNOWN_REGION).unwrap();
        assert_eq!(unknown.total_funding, 0.0);
        assert_eq!(unknown.area_counts["Genetics"], 0);
    }

    #[test]
    fn test_funding_conserved() {
        let taxonomy = taxonomy();
        let records = records();
        let table = KeywordClassifier::new(taxonomy.clone()).classify(&records);
        let summary = GeoAggregator::new(taxonomy)
            .aggregate_by_region(&records, &table)
            .unwrap();

        let regional: f64 = summary.regions.iter().map(|r| r.total_funding).sum();
        assert_eq!(regional, summary.total_funding);
        let shares: f64 = summary.regions.iter().map(|r| r.funding_share).sum();
        assert!((shares - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_zero_total_funding() {
        let taxonomy = taxonomy();
        let records = vec![GrantRecord::new("gene", "").with_region("TX")];
        let table = KeywordClassifier::new(taxonomy.clone()).classify(&records);
        let summary = GeoAggregator::new(taxonomy)
            .aggregate_by_region(&records, &table)
            .unwrap();
        assert_eq!(summary.regions[0].funding_share, 0.0);
    }

    #[test]
    fn test_row_count_mismatch() {
        let taxonomy = taxonomy();
        let records = records();
        let table = KeywordClassifier::new(taxonomy.clone()).classify(&records[..2]);
        let err = GeoAggregator::new(taxonomy)
            .aggregate_by_region(&records, &table)
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 2, .. }));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&mut []), 0.0);
    }

    #[test]
    fn test_empty_records() {
        let taxonomy = taxonomy();
        let table = KeywordClassifier::new(taxonomy.clone()).classify(&[]);
        let summary = GeoAggregator::new(taxonomy)
            .aggregate_by_region(&[], &table)
            .unwrap();
        assert!(summary.regions.is_empty());
        assert_eq!(summary.total_funding, 0.0);
    }
}

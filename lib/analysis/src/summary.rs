//! Category and portfolio summaries written alongside the comparison.

use crate::geo::median;
use grantlens_core::{GrantRecord, SimilarityMatrix};
use grantlens_taxonomy::{display_name, ClassificationTable, TaxonomyModel};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Organization label for records without one
pub const UNKNOWN_ORGANIZATION: &str = "Unknown Organization";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub column: String,
    pub category: String,
    pub count: usize,
    /// Percent of records, rounded to 2 decimals
    pub percentage: f64,
}

/// Columns set for at least one record, in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub rows: Vec<CategoryRow>,
}

impl CategorySummary {
    pub fn from_table(table: &ClassificationTable) -> Self {
        let records = table.len();
        let rows = table
            .column_counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(column, count)| CategoryRow {
                category: display_name(&column),
                percentage: round2(count as f64 / records as f64 * 100.0),
                column,
                count,
            })
            .collect();
        Self { rows }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationCount {
    pub name: String,
    pub grants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_grants: usize,
    pub total_funding: f64,
    /// Mean over all records; missing amounts count as 0 as in the regional rollup
    pub average_award: f64,
    pub median_award: f64,
    pub average_duration_years: Option<f64>,
    pub unique_organizations: usize,
    pub unique_activity_codes: usize,
    pub mean_embedding_similarity: f32,
    /// Bucket name to record count; configured buckets first, in declaration order
    pub award_size_distribution: IndexMap<String, usize>,
    pub top_organizations: Vec<OrganizationCount>,
}

impl OverallSummary {
    pub fn build(
        records: &[GrantRecord],
        taxonomy: &TaxonomyModel,
        embedding_sim: &SimilarityMatrix,
        top_n: usize,
    ) -> Self {
        let mut amounts: Vec<f64> = records.iter().map(GrantRecord::amount_or_zero).collect();
        let total_funding: f64 = amounts.iter().sum();
        let average_award = if amounts.is_empty() {
            0.0
        } else {
            total_funding / amounts.len() as f64
        };
        let median_award = median(&mut amounts);

        let durations: Vec<f64> = records.iter().filter_map(GrantRecord::duration_years).collect();
        let average_duration_years = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        };

        let mut award_size_distribution: IndexMap<String, usize> = taxonomy
            .config()
            .award_size
            .keys()
            .map(|name| (name.clone(), 0))
            .collect();
        for record in records {
            *award_size_distribution
                .entry(taxonomy.bucket_for(record.award_amount).to_string())
                .or_insert(0) += 1;
        }

        let mut org_counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            let name = record.org_name.as_deref().unwrap_or(UNKNOWN_ORGANIZATION);
            *org_counts.entry(name).or_insert(0) += 1;
        }
        let unique_organizations = records
            .iter()
            .filter_map(|r| r.org_name.as_deref())
            .collect::<BTreeSet<_>>()
            .len();
        let mut top_organizations: Vec<OrganizationCount> = org_counts
            .into_iter()
            .map(|(name, grants)| OrganizationCount {
                name: name.to_string(),
                grants,
            })
            .collect();
        top_organizations.sort_by(|a, b| b.grants.cmp(&a.grants).then_with(|| a.name.cmp(&b.name)));
        top_organizations.truncate(top_n);

        Self {
            total_grants: records.len(),
            total_funding,
            average_award,
            median_award,
            average_duration_years,
            unique_organizations,
            unique_activity_codes: records
                .iter()
                .filter_map(|r| r.activity_code.as_deref())
                .collect::<BTreeSet<_>>()
                .len(),
            mean_embedding_similarity: embedding_sim.mean(),
            award_size_distribution,
            top_organizations,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

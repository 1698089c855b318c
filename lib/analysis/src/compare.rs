//! Method comparison
//!
//! Contrasts the keyword classification with the embedding similarity matrix.
//! Threshold counts run over every matrix entry, so the diagonal and both
//! symmetric halves are included.

use crate::config::AnalysisConfig;
use grantlens_core::{Error, Result, SimilarityMatrix};
use grantlens_taxonomy::ClassificationTable;
use serde::{Deserialize, Serialize};

/// Default cut-off for "high similarity" embedding pairs
pub const DEFAULT_HIGH_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Entry counts of the embedding matrix per similarity band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityBands {
    /// `> high`
    pub high: usize,
    /// `(medium, high]`
    pub medium: usize,
    /// `(low, medium]`
    pub low: usize,
    /// `<= low`
    pub below: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub record_count: usize,
    pub total_categories: usize,
    pub average_categories_per_record: f64,
    pub total_positive_classifications: usize,
    pub high_similarity_threshold: f32,
    pub high_similarity_pairs: usize,
    pub mean_embedding_similarity: f32,
    pub max_embedding_similarity: f32,
    pub mean_keyword_similarity: f32,
    pub similarity_bands: SimilarityBands,
}

/// One row of the side-by-side method table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRow {
    pub method: String,
    pub categories_detected: usize,
    pub average_score: f64,
    pub total_classifications: usize,
    pub processing_type: String,
    pub interpretability: String,
}

impl ComparisonSummary {
    /// Keyword row first, embedding row second
    pub fn method_rows(&self) -> Vec<MethodRow> {
        vec![
            MethodRow {
                method: "Keyword Matching".to_string(),
                categories_detected: self.total_categories,
                average_score: self.average_categories_per_record,
                total_classifications: self.total_positive_classifications,
                processing_type: "Rule-based".to_string(),
                interpretability: "High".to_string(),
            },
            MethodRow {
                method: "Embedding-Based".to_string(),
                categories_detected: self.high_similarity_pairs,
                average_score: self.mean_embedding_similarity as f64 * 100.0,
                total_classifications: self.high_similarity_pairs,
                processing_type: "ML-based".to_string(),
                interpretability: "Medium".to_string(),
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodComparator {
    high: f32,
    medium: f32,
    low: f32,
}

impl Default for MethodComparator {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_SIMILARITY_THRESHOLD)
    }
}

impl MethodComparator {
    pub fn new(threshold: f32) -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            high: threshold,
            medium: defaults.medium_similarity_threshold.min(threshold),
            low: defaults.low_similarity_threshold.min(threshold),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            high: config.high_similarity_threshold,
            medium: config.medium_similarity_threshold,
            low: config.low_similarity_threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.high
    }

    pub fn compare(
        &self,
        table: &ClassificationTable,
        keyword_sim: &SimilarityMatrix,
        embedding_sim: &SimilarityMatrix,
    ) -> Result<ComparisonSummary> {
        check_matrix(keyword_sim, table.len())?;
        check_matrix(embedding_sim, table.len())?;

        let total_positive = table.total_positive();
        let average = if table.is_empty() {
            0.0
        } else {
            total_positive as f64 / table.len() as f64
        };

        let summary = ComparisonSummary {
            record_count: table.len(),
            total_categories: table.columns().len(),
            average_categories_per_record: average,
            total_positive_classifications: total_positive,
            high_similarity_threshold: self.high,
            high_similarity_pairs: embedding_sim.count_above(self.high),
            mean_embedding_similarity: embedding_sim.mean(),
            max_embedding_similarity: embedding_sim.max(),
            mean_keyword_similarity: keyword_sim.mean(),
            similarity_bands: self.bands(embedding_sim),
        };

        tracing::info!(
            records = summary.record_count,
            high_pairs = summary.high_similarity_pairs,
            mean_embedding = summary.mean_embedding_similarity,
            "method comparison complete"
        );
        Ok(summary)
    }

    fn bands(&self, matrix: &SimilarityMatrix) -> SimilarityBands {
        let mut bands = SimilarityBands::default();
        for &v in matrix.as_slice() {
            if v > self.high {
                bands.high += 1;
            } else if v > self.medium {
                bands.medium += 1;
            } else if v > self.low {
                bands.low += 1;
            } else {
                bands.below += 1;
            }
        }
        bands
    }
}

fn check_matrix(matrix: &SimilarityMatrix, records: usize) -> Result<()> {
    if !matrix.is_square() || matrix.rows() != records {
        return Err(Error::DimensionMismatch {
            index: 0,
            expected: records,
            actual: if matrix.rows() != records {
                matrix.rows()
            } else {
                matrix.cols()
            },
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grantlens_taxonomy::ClassificationRow;

    fn table() -> ClassificationTable {
        ClassificationTable::new(
            vec!["is_A".into(), "is_B".into(), "uses_C".into()],
            vec![
                ClassificationRow::new(vec![true, true, false]),
                ClassificationRow::new(vec![false, false, false]),
            ],
        )
    }

    fn matrix(data: Vec<f32>) -> SimilarityMatrix {
        SimilarityMatrix::from_raw(2, 2, data).unwrap()
    }

    #[test]
    fn test_compare_counts() {
        let keyword = matrix(vec![1.0, 0.0, 0.0, 0.0]);
        let embedding = matrix(vec![1.0, 0.5, 0.5, 1.0]);
        let summary = MethodComparator::new(0.8)
            .compare(&table(), &keyword, &embedding)
            .unwrap();

        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.total_categories, 3);
        assert_eq!(summary.total_positive_classifications, 2);
        assert!((summary.average_categories_per_record - 1.0).abs() < 1e-9);
        // Both diagonal entries exceed 0.8
        assert_eq!(summary.high_similarity_pairs, 2);
        assert!((summary.mean_embedding_similarity - 0.75).abs() < 1e-6);
        assert_eq!(summary.max_embedding_similarity, 1.0);
        assert!((summary.mean_keyword_similarity - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict() {
        let embedding = matrix(vec![1.0, 0.8, 0.8, 1.0]);
        let summary = MethodComparator::new(0.8)
            .compare(&table(), &matrix(vec![0.0; 4]), &embedding)
            .unwrap();
        assert_eq!(summary.high_similarity_pairs, 2);
        assert_eq!(summary.similarity_bands.medium, 2);
    }

    #[test]
    fn test_bands_from_config() {
        let comparator = MethodComparator::from_config(&AnalysisConfig::default());
        let embedding = matrix(vec![0.9, 0.7, 0.5, 0.1]);
        let summary = comparator
            .compare(&table(), &matrix(vec![0.0; 4]), &embedding)
            .unwrap();
        assert_eq!(
            summary.similarity_bands,
            SimilarityBands {
                high: 1,
                medium: 1,
                low: 1,
                below: 1
            }
        );
    }

    #[test]
    fn test_size_mismatch() {
        let wrong = SimilarityMatrix::from_raw(3, 3, vec![0.0; 9]).unwrap();
        let err = MethodComparator::default()
            .compare(&table(), &wrong, &matrix(vec![0.0; 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_input_gives_zeros() {
        let empty_table = ClassificationTable::new(vec!["is_A".into()], Vec::new());
        let summary = MethodComparator::default()
            .compare(&empty_table, &SimilarityMatrix::empty(), &SimilarityMatrix::empty())
            .unwrap();
        assert_eq!(summary.record_count, 0);
        assert_eq!(summary.average_categories_per_record, 0.0);
        assert_eq!(summary.high_similarity_pairs, 0);
        assert_eq!(summary.mean_embedding_similarity, 0.0);
        assert_eq!(summary.max_embedding_similarity, 0.0);
    }

    #[test]
    fn test_method_rows() {
        let embedding = matrix(vec![1.0, 0.5, 0.5, 1.0]);
        let summary = MethodComparator::default()
            .compare(&table(), &matrix(vec![0.0; 4]), &embedding)
            .unwrap();
        let rows = summary.method_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].method, "Keyword Matching");
        assert_eq!(rows[0].categories_detected, 3);
        assert_eq!(rows[0].total_classifications, 2);
        assert_eq!(rows[1].categories_detected, 2);
        assert!((rows[1].average_score - 75.0).abs() < 1e-4);
    }
}

//! Keyword classifier
//!
//! Every (record, column) cell is a pure substring test, so records are
//! classified in parallel and collected back in input order.

use crate::model::TaxonomyModel;
use grantlens_core::{GrantRecord, Vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// True when any keyword occurs in the text. Both sides must already be lower case.
#[inline]
pub fn matches_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| text.contains(kw.as_str()))
}

/// Boolean flags for one record, aligned with the table's columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationRow {
    values: Vec<bool>,
}

impl ClassificationRow {
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    #[inline]
    pub fn get(&self, column: usize) -> bool {
        self.values[column]
    }

    /// Number of columns set for this record
    pub fn true_count(&self) -> usize {
        self.values.iter().filter(|&&v| v).count()
    }
}

/// Named boolean columns, one row per record in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationTable {
    columns: Vec<String>,
    rows: Vec<ClassificationRow>,
}

impl ClassificationTable {
    pub fn new(columns: Vec<String>, rows: Vec<ClassificationRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ClassificationRow] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of a named column for one record
    pub fn value(&self, row: usize, column: &str) -> Option<bool> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r.get(index))
    }

    /// True count per column, in column order
    pub fn column_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let count = self.rows.iter().filter(|r| r.get(i)).count();
                (name.clone(), count)
            })
            .collect()
    }

    /// Columns set for at least one record
    pub fn non_empty_columns(&self) -> Vec<String> {
        self.column_counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name)
            .collect()
    }

    /// Sum of all set flags
    pub fn total_positive(&self) -> usize {
        self.rows.iter().map(ClassificationRow::true_count).sum()
    }

    /// Rows as 0/1 vectors for the similarity engine
    pub fn to_vectors(&self) -> Vec<Vector> {
        self.rows.iter().map(|r| Vector::from_flags(r.values())).collect()
    }
}

/// Classifies records against every compiled taxonomy column
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    taxonomy: Arc<TaxonomyModel>,
}

impl KeywordClassifier {
    pub fn new(taxonomy: Arc<TaxonomyModel>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &TaxonomyModel {
        &self.taxonomy
    }

    /// One row per record, in input order. Columns follow the taxonomy's column order.
    pub fn classify(&self, records: &[GrantRecord]) -> ClassificationTable {
        let rows: Vec<ClassificationRow> = records
            .par_iter()
            .map(|record| self.classify_record(record))
            .collect();

        tracing::debug!(
            records = rows.len(),
            columns = self.taxonomy.columns().len(),
            "keyword classification finished"
        );

        ClassificationTable::new(self.taxonomy.category_columns(), rows)
    }

    pub fn classify_record(&self, record: &GrantRecord) -> ClassificationRow {
        let abstract_text = record.abstract_str().to_lowercase();
        let title_and_abstract = format!("{} {}", record.title_text().to_lowercase(), abstract_text);

        ClassificationRow::new(
            self.taxonomy
                .columns()
                .iter()
                .map(|column| column.matches(&title_and_abstract, &abstract_text))
                .collect(),
        )
    }
}

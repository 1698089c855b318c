// Report export: one timestamped directory per run, every file written atomically
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Local};
use grantlens_analysis::{CategorySummary, ComparisonSummary, GeoSummary, MethodRow, OverallSummary};
use grantlens_core::{GrantRecord, SimilarityMatrix};
use grantlens_taxonomy::{ClassificationTable, TaxonomyStructure};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const GRANTS_FILE: &str = "grants.json";
pub const CLASSIFICATION_FILE: &str = "classification.json";
pub const REGION_SUMMARY_FILE: &str = "region_summary.json";
pub const METHOD_COMPARISON_FILE: &str = "method_comparison.json";
pub const CATEGORY_SUMMARY_FILE: &str = "category_summary.json";
pub const OVERALL_SUMMARY_FILE: &str = "overall_summary.json";
pub const TAXONOMY_STRUCTURE_FILE: &str = "taxonomy_structure.json";
pub const KEYWORD_SIMILARITY_FILE: &str = "keyword_similarity.bin";
pub const EMBEDDING_SIMILARITY_FILE: &str = "embedding_similarity.bin";

/// Everything one run produces, borrowed from the pipeline outcome
#[derive(Debug, Clone, Copy)]
pub struct ReportBundle<'a> {
    pub records: &'a [GrantRecord],
    pub classification: &'a ClassificationTable,
    pub keyword_similarity: &'a SimilarityMatrix,
    pub embedding_similarity: &'a SimilarityMatrix,
    pub comparison: &'a ComparisonSummary,
    pub regions: &'a GeoSummary,
    pub categories: &'a CategorySummary,
    pub overall: &'a OverallSummary,
    pub structure: &'a TaxonomyStructure,
}

#[derive(Serialize)]
struct MethodComparisonReport<'a> {
    summary: &'a ComparisonSummary,
    methods: Vec<MethodRow>,
}

pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Create `<base>/grantlens_<YYYYmmdd_HHMMSS>`
    pub fn create<P: AsRef<Path>>(base: P) -> Result<Self> {
        Self::create_at(base, Local::now())
    }

    pub fn create_at<P: AsRef<Path>>(base: P, now: DateTime<Local>) -> Result<Self> {
        let dir = base
            .as_ref()
            .join(format!("grantlens_{}", now.format("%Y%m%d_%H%M%S")));
        Self::open(dir)
    }

    /// Write into an exact directory, creating it when missing
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let data = serde_json::to_vec_pretty(value)
            .with_context(|| format!("failed to serialize {}", name))?;
        self.write_bytes(name, &data)
    }

    /// Similarity matrix as bincode
    pub fn write_matrix(&self, name: &str, matrix: &SimilarityMatrix) -> Result<PathBuf> {
        let data = bincode::serialize(matrix).map_err(|e| anyhow!("Serialization error: {}", e))?;
        self.write_bytes(name, &data)
    }

    fn write_bytes(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        AtomicFile::new(&path, AllowOverwrite)
            .write(|f| f.write_all(data))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "report file written");
        Ok(path)
    }

    /// Write every report file; returns the paths in write order
    pub fn write_report(&self, report: &ReportBundle<'_>) -> Result<Vec<PathBuf>> {
        let grants = grants_with_categories(report.records, report.classification)?;
        let comparison = MethodComparisonReport {
            summary: report.comparison,
            methods: report.comparison.method_rows(),
        };

        let paths = vec![
            self.write_json(GRANTS_FILE, &grants)?,
            self.write_json(CLASSIFICATION_FILE, report.classification)?,
            self.write_json(REGION_SUMMARY_FILE, report.regions)?,
            self.write_json(METHOD_COMPARISON_FILE, &comparison)?,
            self.write_json(CATEGORY_SUMMARY_FILE, report.categories)?,
            self.write_json(OVERALL_SUMMARY_FILE, report.overall)?,
            self.write_json(TAXONOMY_STRUCTURE_FILE, report.structure)?,
            self.write_matrix(KEYWORD_SIMILARITY_FILE, report.keyword_similarity)?,
            self.write_matrix(EMBEDDING_SIMILARITY_FILE, report.embedding_similarity)?,
        ];

        tracing::info!(dir = %self.dir.display(), files = paths.len(), "report written");
        Ok(paths)
    }
}

/// Load a matrix written by [`ReportWriter::write_matrix`]
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<SimilarityMatrix> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    bincode::deserialize(&data).map_err(|e| anyhow!("Deserialization error: {}", e))
}

/// Records as JSON objects, each extended with the non-empty category columns as 0/1
fn grants_with_categories(
    records: &[GrantRecord],
    table: &ClassificationTable,
) -> Result<Vec<Value>> {
    if records.len() != table.len() {
        return Err(anyhow!(
            "classification has {} rows for {} records",
            table.len(),
            records.len()
        ));
    }

    let columns: Vec<(usize, &String)> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| table.rows().iter().any(|r| r.get(*i)))
        .collect();

    records
        .iter()
        .zip(table.rows())
        .map(|(record, row)| -> Result<Value> {
            let mut object = match serde_json::to_value(record)? {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            for (index, name) in &columns {
                object.insert((*name).clone(), Value::from(u8::from(row.get(*index))));
            }
            Ok(Value::Object(object))
        })
        .collect()
}

//! End-to-end analysis run: classification, both similarity matrices,
//! method comparison, regional rollups and portfolio summaries.

use grantlens_analysis::{
    AnalysisConfig, CategorySummary, ComparisonSummary, EmbeddingIndexer, EmbeddingModel,
    GeoAggregator, GeoSummary, MethodComparator, OverallSummary,
};
use grantlens_core::{GrantRecord, Result, SimilarityEngine, SimilarityMatrix};
use grantlens_storage::ReportBundle;
use grantlens_taxonomy::{ClassificationTable, KeywordClassifier, TaxonomyModel, TaxonomyStructure};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub records: Vec<GrantRecord>,
    pub classification: ClassificationTable,
    pub keyword_similarity: SimilarityMatrix,
    pub embedding_similarity: SimilarityMatrix,
    pub comparison: ComparisonSummary,
    pub regions: GeoSummary,
    pub categories: CategorySummary,
    pub overall: OverallSummary,
    pub structure: TaxonomyStructure,
}

impl AnalysisOutcome {
    pub fn report(&self) -> ReportBundle<'_> {
        ReportBundle {
            records: &self.records,
            classification: &self.classification,
            keyword_similarity: &self.keyword_similarity,
            embedding_similarity: &self.embedding_similarity,
            comparison: &self.comparison,
            regions: &self.regions,
            categories: &self.categories,
            overall: &self.overall,
            structure: &self.structure,
        }
    }
}

pub struct Pipeline {
    taxonomy: Arc<TaxonomyModel>,
    classifier: KeywordClassifier,
    indexer: EmbeddingIndexer,
    engine: SimilarityEngine,
    comparator: MethodComparator,
    geo: GeoAggregator,
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(
        taxonomy: Arc<TaxonomyModel>,
        model: Arc<dyn EmbeddingModel>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            classifier: KeywordClassifier::new(taxonomy.clone()),
            indexer: EmbeddingIndexer::new(model, config.indexer_config()),
            engine: SimilarityEngine::new(),
            comparator: MethodComparator::from_config(&config),
            geo: GeoAggregator::new(taxonomy.clone()),
            taxonomy,
            config,
        }
    }

    pub fn taxonomy(&self) -> &Arc<TaxonomyModel> {
        &self.taxonomy
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, records: Vec<GrantRecord>) -> Result<AnalysisOutcome> {
        let started = Instant::now();
        info!(records = records.len(), "starting analysis");

        let classification = self.classifier.classify(&records);
        info!(
            columns = classification.columns().len(),
            positives = classification.total_positive(),
            "keyword classification done"
        );

        let keyword_similarity = self.engine.pairwise(&classification.to_vectors())?;

        let abstracts: Vec<&str> = records.iter().map(GrantRecord::abstract_str).collect();
        let embeddings = self.indexer.embed_all(&abstracts)?;
        let embedding_similarity = self.engine.pairwise(&embeddings)?;
        info!(dim = self.indexer.dim(), "embedding similarity done");

        let comparison =
            self.comparator
                .compare(&classification, &keyword_similarity, &embedding_similarity)?;
        let regions = self.geo.aggregate_by_region(&records, &classification)?;
        let categories = CategorySummary::from_table(&classification);
        let overall = OverallSummary::build(
            &records,
            &self.taxonomy,
            &embedding_similarity,
            self.config.top_organizations,
        );

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "analysis complete");
        Ok(AnalysisOutcome {
            records,
            classification,
            keyword_similarity,
            embedding_similarity,
            comparison,
            regions,
            categories,
            overall,
            structure: self.taxonomy.structure(),
        })
    }
}

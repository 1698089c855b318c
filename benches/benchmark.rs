// Performance benchmarks for the similarity engine, classifier and indexer
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grantlens_analysis::{EmbeddingIndexer, HashingEmbedder};
use grantlens_core::{GrantRecord, SimilarityEngine, Vector};
use grantlens_taxonomy::{KeywordClassifier, TaxonomyConfig, TaxonomyModel};
use rand::prelude::*;
use std::sync::Arc;

const WORDS: &[&str] = &[
    "gene", "tumor", "cohort", "sequencing", "mouse", "clinical", "trial", "protein", "imaging",
    "crispr", "neuron", "immune", "therapy", "model", "cell", "risk", "outcome", "signaling",
];

fn generate_random_vector(dim: usize) -> Vector {
    let mut rng = rand::rng();
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Vector::new(data)
}

fn generate_abstract(words: usize) -> String {
    let mut rng = rand::rng();
    (0..words)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn taxonomy() -> Arc<TaxonomyModel> {
    let config = TaxonomyConfig::from_value(serde_json::json!({
        "Research_Areas": {
            "Genetics": {"keywords": ["gene", "genomic"], "subtypes": {"Gene_Therapy": ["crispr"]}},
            "Cancer": {"keywords": ["tumor", "oncology"], "subtypes": {"Immunotherapy": ["immune"]}},
            "Neuroscience": {"keywords": ["neuron", "brain"], "subtypes": {}}
        },
        "Award_Size": {"Small": {"max_amount": 250000}},
        "Technology_Platform": {
            "Sequencing": {"keywords": ["sequencing"]},
            "Imaging": {"keywords": ["imaging", "microscopy"]}
        },
        "Study_Design": {
            "Study_Type": {"Clinical": ["clinical trial"], "Animal": ["mouse"]}
        }
    }))
    .unwrap();
    Arc::new(TaxonomyModel::new(config).unwrap())
}

fn benchmark_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise");
    let engine = SimilarityEngine::new();

    for size in [100, 500, 1000].iter() {
        let vectors: Vec<Vector> = (0..*size).map(|_| generate_random_vector(256)).collect();
        group.bench_with_input(BenchmarkId::new("cosine_256", size), size, |b, _| {
            b.iter(|| black_box(engine.pairwise(&vectors).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let classifier = KeywordClassifier::new(taxonomy());

    for size in [1000, 10000].iter() {
        let records: Vec<GrantRecord> = (0..*size)
            .map(|i| GrantRecord::new(format!("Project {}", i), generate_abstract(120)))
            .collect();
        group.bench_with_input(BenchmarkId::new("keyword", size), size, |b, _| {
            b.iter(|| black_box(classifier.classify(&records)));
        });
    }

    group.finish();
}

fn benchmark_embed(c: &mut Criterion) {
    let mut group = c.benchmark_group("embed");
    let indexer = EmbeddingIndexer::with_model(Arc::new(HashingEmbedder::default()));
    let texts: Vec<String> = (0..1000).map(|_| generate_abstract(200)).collect();

    group.bench_function("hashing_1000", |b| {
        b.iter(|| black_box(indexer.embed_all(&texts).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_pairwise, benchmark_classify, benchmark_embed);
criterion_main!(benches);

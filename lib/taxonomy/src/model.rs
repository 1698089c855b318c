//! Compiled taxonomy
//!
//! [`TaxonomyModel`] validates a [`TaxonomyConfig`] once and compiles every
//! category column with its lower-cased keyword list and text scope, so that
//! classification never walks the nested configuration again.

use crate::classifier::matches_any;
use crate::schema::{BucketDefinition, TaxonomyConfig, AWARD_SIZE};
use grantlens_core::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Bucket reported for a missing or non-numeric amount
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// Bucket reported when no configured bucket matches
pub const FALLBACK_BUCKET: &str = "Large";

/// Which part of a record a column's keywords are tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextScope {
    /// Title and abstract joined by a space
    TitleAndAbstract,
    AbstractOnly,
}

/// One boolean classification dimension derived from the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryColumn {
    Area { area: String },
    Subtype { area: String, subtype: String },
    Platform { platform: String },
    StudyDesign { design: String, subtype: String },
}

impl CategoryColumn {
    pub fn name(&self) -> String {
        match self {
            CategoryColumn::Area { area } => format!("is_{}", area),
            CategoryColumn::Subtype { area, subtype } => format!("is_{}_{}", area, subtype),
            CategoryColumn::Platform { platform } => format!("uses_{}", platform),
            CategoryColumn::StudyDesign { design, subtype } => {
                format!("study_design_{}_{}", design, subtype)
            }
        }
    }

    pub fn scope(&self) -> TextScope {
        match self {
            CategoryColumn::Area { .. } | CategoryColumn::Subtype { .. } => {
                TextScope::TitleAndAbstract
            }
            CategoryColumn::Platform { .. } | CategoryColumn::StudyDesign { .. } => {
                TextScope::AbstractOnly
            }
        }
    }
}

/// A column ready for matching
#[derive(Debug, Clone)]
pub struct CompiledColumn {
    pub column: CategoryColumn,
    pub name: String,
    pub scope: TextScope,
    keywords: Vec<String>,
}

impl CompiledColumn {
    fn new(column: CategoryColumn, keywords: Vec<String>) -> Self {
        Self {
            name: column.name(),
            scope: column.scope(),
            column,
            keywords,
        }
    }

    /// Lower-cased, deduplicated keywords in first-seen order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Test already lower-cased texts
    #[inline]
    pub fn matches(&self, title_and_abstract: &str, abstract_text: &str) -> bool {
        let text = match self.scope {
            TextScope::TitleAndAbstract => title_and_abstract,
            TextScope::AbstractOnly => abstract_text,
        };
        matches_any(text, &self.keywords)
    }
}

/// Reporting view of the configured hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyStructure {
    pub research_areas: IndexMap<String, AreaStructure>,
    pub technology_platforms: Vec<String>,
    pub study_designs: IndexMap<String, Vec<String>>,
    pub award_sizes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStructure {
    pub keyword_count: usize,
    pub subtypes: Vec<String>,
}

/// Validated taxonomy with compiled category columns
#[derive(Debug, Clone)]
pub struct TaxonomyModel {
    config: TaxonomyConfig,
    columns: Vec<CompiledColumn>,
}

impl TaxonomyModel {
    /// Validate the configuration and compile its columns
    pub fn new(config: TaxonomyConfig) -> Result<Self> {
        config.validate()?;
        warn_on_bucket_overlap(&config.award_size);

        let mut columns = Vec::new();
        for (area, details) in &config.research_areas {
            let union = details
                .keywords
                .iter()
                .chain(details.subtypes.values().flatten());
            columns.push(CompiledColumn::new(
                CategoryColumn::Area { area: area.clone() },
                normalize_keywords(union),
            ));
            for (subtype, keywords) in &details.subtypes {
                columns.push(CompiledColumn::new(
                    CategoryColumn::Subtype {
                        area: area.clone(),
                        subtype: subtype.clone(),
                    },
                    normalize_keywords(keywords),
                ));
            }
        }

        for (platform, details) in &config.technology_platform {
            columns.push(CompiledColumn::new(
                CategoryColumn::Platform {
                    platform: platform.clone(),
                },
                normalize_keywords(&details.keywords),
            ));
        }

        for (design, subtypes) in &config.study_design {
            for (subtype, keywords) in subtypes {
                columns.push(CompiledColumn::new(
                    CategoryColumn::StudyDesign {
                        design: design.clone(),
                        subtype: subtype.clone(),
                    },
                    normalize_keywords(keywords),
                ));
            }
        }

        tracing::debug!(
            areas = config.research_areas.len(),
            columns = columns.len(),
            "taxonomy compiled"
        );

        Ok(Self { config, columns })
    }

    pub fn config(&self) -> &TaxonomyConfig {
        &self.config
    }

    pub fn columns(&self) -> &[CompiledColumn] {
        &self.columns
    }

    /// Column names: areas with their subtypes, then platforms, then study designs
    pub fn category_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn area_names(&self) -> impl Iterator<Item = &str> {
        self.config.research_areas.keys().map(String::as_str)
    }

    /// Award-size bucket for an amount, using declaration order
    pub fn bucket_for(&self, amount: Option<f64>) -> &str {
        bucket_for(amount, &self.config.award_size)
    }

    /// Own and subtype keywords of an area, lower-cased and deduplicated
    pub fn keywords_for(&self, area: &str) -> Result<BTreeSet<String>> {
        let details = self
            .config
            .research_areas
            .get(area)
            .ok_or_else(|| Error::UnknownCategory(area.to_string()))?;
        Ok(details
            .keywords
            .iter()
            .chain(details.subtypes.values().flatten())
            .map(|k| k.to_lowercase())
            .collect())
    }

    /// Test free text against one area, optionally including its subtype keywords
    pub fn matches_area(&self, text: &str, area: &str, include_subtypes: bool) -> Result<bool> {
        let details = self
            .config
            .research_areas
            .get(area)
            .ok_or_else(|| Error::UnknownCategory(area.to_string()))?;
        let text = text.to_lowercase();
        let keywords = if include_subtypes {
            normalize_keywords(details.keywords.iter().chain(details.subtypes.values().flatten()))
        } else {
            normalize_keywords(&details.keywords)
        };
        Ok(matches_any(&text, &keywords))
    }

    /// Every area whose keyword union occurs in the text
    pub fn matching_areas(&self, text: &str) -> Vec<&str> {
        let text = text.to_lowercase();
        self.columns
            .iter()
            .filter_map(|c| match &c.column {
                CategoryColumn::Area { area } if matches_any(&text, c.keywords()) => {
                    Some(area.as_str())
                }
                _ => None,
            })
            .collect()
    }

    pub fn structure(&self) -> TaxonomyStructure {
        TaxonomyStructure {
            research_areas: self
                .config
                .research_areas
                .iter()
                .map(|(area, details)| {
                    (
                        area.clone(),
                        AreaStructure {
                            keyword_count: details.keywords.len(),
                            subtypes: details.subtypes.keys().cloned().collect(),
                        },
                    )
                })
                .collect(),
            technology_platforms: self.config.technology_platform.keys().cloned().collect(),
            study_designs: self
                .config
                .study_design
                .iter()
                .map(|(design, subtypes)| (design.clone(), subtypes.keys().cloned().collect()))
                .collect(),
            award_sizes: self.config.award_size.keys().cloned().collect(),
        }
    }
}

/// First bucket in declaration order that contains the amount.
///
/// Missing or NaN amounts map to [`UNKNOWN_BUCKET`] before any bucket is tried;
/// amounts no bucket accepts map to [`FALLBACK_BUCKET`].
pub fn bucket_for(amount: Option<f64>, buckets: &IndexMap<String, BucketDefinition>) -> &str {
    let amount = match amount {
        Some(a) if !a.is_nan() => a,
        _ => return UNKNOWN_BUCKET,
    };
    buckets
        .iter()
        .find(|(_, bounds)| bounds.contains(amount))
        .map(|(name, _)| name.as_str())
        .unwrap_or(FALLBACK_BUCKET)
}

/// Human-readable label for a column or category name
pub fn display_name(name: &str) -> String {
    let stripped = ["study_design_", "uses_", "is_"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
        .replace('_', " ");

    let mut out = String::with_capacity(stripped.len());
    let mut prev_alpha = false;
    for c in stripped.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

fn normalize_keywords<'a>(keywords: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    keywords
        .into_iter()
        .map(|k| k.to_lowercase())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

// A min-only bucket declared after a max bucket whose ceiling exceeds its floor
// can never claim the overlapping amounts. Order still decides; this only reports it.
fn warn_on_bucket_overlap(buckets: &IndexMap<String, BucketDefinition>) {
    for (i, (later, later_bounds)) in buckets.iter().enumerate() {
        let (Some(min), None) = (later_bounds.min_amount, later_bounds.max_amount) else {
            continue;
        };
        for (earlier, earlier_bounds) in buckets.iter().take(i) {
            if let Some(max) = earlier_bounds.max_amount {
                if min < max {
                    tracing::warn!(
                        section = AWARD_SIZE,
                        "bucket '{}' (min {}) overlaps earlier bucket '{}' (max {}); first match wins",
                        later,
                        min,
                        earlier,
                        max
                    );
                }
            }
        }
    }
}

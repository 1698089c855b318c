//! Taxonomy configuration
//!
//! The four required sections are modelled as explicit typed structs. Maps are
//! insertion-ordered so column order and bucket precedence follow the order in
//! which the configuration declares them. The untyped `Value` stage keeps that
//! order too (`serde_json/preserve_order`).

use grantlens_core::{Error, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const RESEARCH_AREAS: &str = "Research_Areas";
pub const AWARD_SIZE: &str = "Award_Size";
pub const TECHNOLOGY_PLATFORM: &str = "Technology_Platform";
pub const STUDY_DESIGN: &str = "Study_Design";

/// Canonical section name paired with its accepted alias
const SECTIONS: [(&str, &str); 4] = [
    (RESEARCH_AREAS, "ResearchAreas"),
    (AWARD_SIZE, "AwardSize"),
    (TECHNOLOGY_PLATFORM, "TechnologyPlatform"),
    (STUDY_DESIGN, "StudyDesign"),
];

/// Keyword lists keyed by subtype name
pub type SubtypeMap = IndexMap<String, Vec<String>>;

/// The complete category configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyConfig {
    #[serde(rename = "Research_Areas", alias = "ResearchAreas")]
    pub research_areas: IndexMap<String, AreaDefinition>,

    #[serde(rename = "Award_Size", alias = "AwardSize")]
    pub award_size: IndexMap<String, BucketDefinition>,

    #[serde(rename = "Technology_Platform", alias = "TechnologyPlatform")]
    pub technology_platform: IndexMap<String, PlatformDefinition>,

    /// Design type -> subtype -> keywords
    #[serde(rename = "Study_Design", alias = "StudyDesign")]
    pub study_design: IndexMap<String, SubtypeMap>,
}

/// A research area: its own keywords plus keyword lists per subtype
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AreaDefinition {
    pub keywords: Vec<String>,
    pub subtypes: SubtypeMap,
}

impl AreaDefinition {
    pub fn new<S: Into<String>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            subtypes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_subtype<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = S>,
    ) -> Self {
        self.subtypes
            .insert(name.into(), keywords.into_iter().map(Into::into).collect());
        self
    }
}

/// A named numeric range. `min_amount` is exclusive, `max_amount` inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BucketDefinition {
    #[serde(default, alias = "min", skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, alias = "max", skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
}

impl BucketDefinition {
    pub fn new(min_amount: Option<f64>, max_amount: Option<f64>) -> Self {
        Self { min_amount, max_amount }
    }

    /// A max bound decides on its own; a min bound is only consulted when no max is set
    #[inline]
    pub fn contains(&self, amount: f64) -> bool {
        match (self.min_amount, self.max_amount) {
            (_, Some(max)) => amount <= max,
            (Some(min), None) => amount > min,
            (None, None) => false,
        }
    }
}

/// A technology platform. Subtypes are informational and produce no columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlatformDefinition {
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub subtypes: SubtypeMap,
}

impl TaxonomyConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config("<document>", e.to_string()))?;
        Self::from_value(value)
    }

    /// Read, parse and validate a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Validate the shape of an untyped document, then convert it section by section
    /// so that errors name the section that failed.
    pub fn from_value(value: Value) -> Result<Self> {
        let root = match value {
            Value::Object(map) => map,
            _ => return Err(Error::config("<document>", "expected a JSON object")),
        };

        for (name, alias) in SECTIONS {
            if section(&root, name, alias).is_none() {
                return Err(Error::config(name, "missing required section"));
            }
        }

        let areas = section(&root, RESEARCH_AREAS, "ResearchAreas")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::config(RESEARCH_AREAS, "expected an object"))?;
        for (area, details) in areas {
            check_area_shape(area, details)?;
        }

        let config = Self {
            research_areas: parse_section(&root, SECTIONS[0])?,
            award_size: parse_section(&root, SECTIONS[1])?,
            technology_platform: parse_section(&root, SECTIONS[2])?,
            study_design: parse_section(&root, SECTIONS[3])?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the type system cannot express
    pub fn validate(&self) -> Result<()> {
        for (area, details) in &self.research_areas {
            let context = format!("{}.{}", RESEARCH_AREAS, area);
            check_name(&context, area)?;
            check_keywords(&context, "keywords", &details.keywords)?;
            for (subtype, keywords) in &details.subtypes {
                check_name(&context, subtype)?;
                check_keywords(&context, subtype, keywords)?;
            }
        }

        for (bucket, bounds) in &self.award_size {
            let context = format!("{}.{}", AWARD_SIZE, bucket);
            check_name(&context, bucket)?;
            for bound in [bounds.min_amount, bounds.max_amount].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(Error::config(context, "bounds must be finite numbers"));
                }
            }
        }

        for (platform, details) in &self.technology_platform {
            let context = format!("{}.{}", TECHNOLOGY_PLATFORM, platform);
            check_name(&context, platform)?;
            check_keywords(&context, "keywords", &details.keywords)?;
        }

        for (design, subtypes) in &self.study_design {
            let context = format!("{}.{}", STUDY_DESIGN, design);
            check_name(&context, design)?;
            for (subtype, keywords) in subtypes {
                check_name(&context, subtype)?;
                check_keywords(&context, subtype, keywords)?;
            }
        }

        Ok(())
    }
}

fn section<'a>(root: &'a Map<String, Value>, name: &str, alias: &str) -> Option<&'a Value> {
    root.get(name).or_else(|| root.get(alias))
}

fn parse_section<T: DeserializeOwned>(
    root: &Map<String, Value>,
    (name, alias): (&str, &str),
) -> Result<T> {
    let value = section(root, name, alias)
        .cloned()
        .ok_or_else(|| Error::config(name, "missing required section"))?;
    serde_json::from_value(value).map_err(|e| Error::config(name, e.to_string()))
}

fn check_area_shape(area: &str, details: &Value) -> Result<()> {
    let context = format!("{}.{}", RESEARCH_AREAS, area);
    let details = details
        .as_object()
        .ok_or_else(|| Error::config(&context, "invalid structure, expected an object"))?;

    match details.get("keywords") {
        None => return Err(Error::config(&context, "missing 'keywords'")),
        Some(v) if !v.is_array() => {
            return Err(Error::config(&context, "'keywords' must be a list"))
        }
        _ => {}
    }
    match details.get("subtypes") {
        None => Err(Error::config(&context, "missing 'subtypes'")),
        Some(v) if !v.is_object() => Err(Error::config(&context, "'subtypes' must be a mapping")),
        _ => Ok(()),
    }
}

fn check_name(context: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::config(context, "names cannot be empty"));
    }
    Ok(())
}

// An empty keyword is a substring of every text and would match all records
fn check_keywords(context: &str, list: &str, keywords: &[String]) -> Result<()> {
    if keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(Error::config(context, format!("'{}' contains an empty keyword", list)));
    }
    Ok(())
}

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a grant record as delivered by the data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Integer(u64),
    String(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Integer(i) => write!(f, "{}", i),
            RecordId::String(s) => write!(f, "{}", s),
        }
    }
}

/// One research grant. Built once by the record processor and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub id: Option<RecordId>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub award_amount: Option<f64>,
    /// Organization state code used for regional rollups
    pub region: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub org_name: Option<String>,
    pub org_city: Option<String>,
    pub org_type: Option<String>,
    pub fiscal_year: Option<i32>,
    pub activity_code: Option<String>,
    pub direct_cost: Option<f64>,
    pub indirect_cost: Option<f64>,
    pub program_officers: Option<String>,
    pub project_terms: Option<String>,
}

impl GrantRecord {
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            abstract_text: Some(abstract_text.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.award_amount = Some(amount);
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[inline]
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    #[inline]
    pub fn abstract_str(&self) -> &str {
        self.abstract_text.as_deref().unwrap_or("")
    }

    /// Award amount with missing values read as zero
    #[inline]
    pub fn amount_or_zero(&self) -> f64 {
        self.award_amount.filter(|a| a.is_finite()).unwrap_or(0.0)
    }

    /// Project length in years, when both dates are known
    pub fn duration_years(&self) -> Option<f64> {
        let (start, end) = (self.start_date?, self.end_date?);
        Some((end - start).num_days() as f64 / 365.0)
    }

    /// Build a record from a raw RePORTER project object.
    ///
    /// Missing fields stay `None`; the organization block may arrive as
    /// either `organization` or `org_details`.
    pub fn from_raw(project: &Value) -> Self {
        let org = project
            .get("organization")
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .or_else(|| project.get("org_details"));
        let org_field = |key: &str| org.and_then(|o| o.get(key)).and_then(text_value);

        let id = ["appl_id", "application_id", "project_id"]
            .iter()
            .find_map(|key| project.get(*key).and_then(record_id_value));

        Self {
            id,
            title: project.get("project_title").and_then(text_value),
            abstract_text: project.get("abstract_text").and_then(text_value),
            award_amount: project.get("award_amount").and_then(number_value),
            region: org_field("org_state"),
            start_date: project.get("project_start_date").and_then(date_value),
            end_date: project.get("project_end_date").and_then(date_value),
            org_name: org_field("org_name"),
            org_city: org_field("org_city"),
            org_type: org_field("org_type"),
            fiscal_year: project
                .get("fiscal_year")
                .and_then(Value::as_i64)
                .and_then(|y| i32::try_from(y).ok()),
            activity_code: project.get("activity_code").and_then(text_value),
            direct_cost: project.get("direct_cost_amt").and_then(number_value),
            indirect_cost: project.get("indirect_cost_amt").and_then(number_value),
            program_officers: joined(project.get("program_officers"), |po| {
                po.get("full_name").and_then(text_value)
            }),
            project_terms: joined(project.get("project_terms"), text_value),
        }
    }
}

fn text_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_value(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn record_id_value(v: &Value) -> Option<RecordId> {
    match v {
        Value::Number(n) => n.as_u64().map(RecordId::Integer),
        Value::String(s) if !s.is_empty() => Some(RecordId::String(s.clone())),
        _ => None,
    }
}

fn date_value(v: &Value) -> Option<NaiveDate> {
    let s = v.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn joined(v: Option<&Value>, item: impl Fn(&Value) -> Option<String>) -> Option<String> {
    let parts: Vec<String> = v?.as_array()?.iter().filter_map(item).collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

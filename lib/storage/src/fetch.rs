//! NIH RePORTER fetch client
//!
//! Pages through `projects/search` with a fixed limit, pausing between
//! requests. A failed request ends pagination; whatever was already collected
//! is returned.

use anyhow::{Context, Result};
use chrono::Datelike;
use grantlens_core::{Error, GrantRecord};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.reporter.nih.gov/v2/projects/search";
pub const PAGE_LIMIT: usize = 500;
pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const REQUEST_DELAY: Duration = Duration::from_secs(1);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const INCLUDE_FIELDS: &[&str] = &[
    "ActivityCode",
    "ApplicationId",
    "ProjectTitle",
    "AbstractText",
    "ProjectStartDate",
    "ProjectEndDate",
    "AwardAmount",
    "Organization",
    "FiscalYear",
    "ProgramOfficers",
    "DirectCostAmt",
    "IndirectCostAmt",
    "ProjectTerms",
];

/// Search filters sent with every page request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub fiscal_years: Vec<i32>,
    pub include_active_projects: bool,
    /// Matched against project title and abstract
    pub search_text: Option<String>,
    pub org_names: Vec<String>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            fiscal_years: vec![chrono::Local::now().year() - 1],
            include_active_projects: true,
            search_text: None,
            org_names: Vec::new(),
        }
    }
}

impl SearchCriteria {
    pub fn with_fiscal_years(mut self, years: Vec<i32>) -> Self {
        if !years.is_empty() {
            self.fiscal_years = years;
        }
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search_text = (!text.trim().is_empty()).then_some(text);
        self
    }

    pub fn with_org_names(mut self, names: Vec<String>) -> Self {
        self.org_names = names;
        self
    }

    /// Request body for the page starting at `offset`
    pub fn to_body(&self, offset: usize) -> Value {
        let mut criteria = json!({
            "fiscal_years": self.fiscal_years,
            "include_active_projects": self.include_active_projects,
            "exclude_inherited_projects": false,
        });
        if let Some(text) = &self.search_text {
            criteria["advanced_text_search"] = json!({
                "operator": "and",
                "search_field": "projecttitle,abstracttext",
                "search_text": text,
            });
        }
        if !self.org_names.is_empty() {
            criteria["org_names"] = json!(self.org_names);
        }

        json!({
            "criteria": criteria,
            "include_fields": INCLUDE_FIELDS,
            "offset": offset,
            "limit": PAGE_LIMIT,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchMeta {
    total: Option<usize>,
}

/// One page of search results
#[derive(Debug, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    meta: SearchMeta,
    #[serde(default)]
    pub results: Vec<Value>,
}

impl SearchPage {
    pub fn new(total: Option<usize>, results: Vec<Value>) -> Self {
        Self {
            meta: SearchMeta { total },
            results,
        }
    }

    pub fn total(&self) -> Option<usize> {
        self.meta.total
    }
}

/// Anything that can answer a search request body with a page
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, body: &Value) -> grantlens_core::Result<SearchPage>;
}

/// Collect raw projects page by page.
///
/// Stops after `max_requests` pages, once `meta.total` projects are in hand,
/// on an empty page, or on the first failed request.
pub async fn paginate<S: PageSource>(
    source: &S,
    criteria: &SearchCriteria,
    max_requests: usize,
    delay: Duration,
) -> Vec<Value> {
    let mut projects: Vec<Value> = Vec::new();
    let mut total: Option<usize> = None;

    for request in 0..max_requests {
        let body = criteria.to_body(projects.len());
        let page = match source.fetch_page(&body).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(request, collected = projects.len(), "stopping fetch: {}", e);
                break;
            }
        };

        if total.is_none() {
            total = Some(page.total().unwrap_or(0));
            tracing::info!(total = total.unwrap_or(0), "projects matching search");
        }

        let received = page.results.len();
        projects.extend(page.results);
        tracing::debug!(request, received, collected = projects.len(), "page fetched");

        if received == 0 || projects.len() >= total.unwrap_or(0) {
            break;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    projects
}

/// HTTP client for the RePORTER search endpoint
#[derive(Debug, Clone)]
pub struct ReporterClient {
    http: reqwest::Client,
    endpoint: String,
    delay: Duration,
}

impl ReporterClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            delay: REQUEST_DELAY,
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Raw project objects, as many as the page budget allows
    pub async fn fetch_projects(&self, criteria: &SearchCriteria, max_requests: usize) -> Vec<Value> {
        tracing::info!(endpoint = %self.endpoint, max_requests, "fetching projects");
        paginate(self, criteria, max_requests, self.delay).await
    }

    /// Projects mapped to grant records
    pub async fn fetch_records(
        &self,
        criteria: &SearchCriteria,
        max_requests: usize,
    ) -> Vec<GrantRecord> {
        self.fetch_projects(criteria, max_requests)
            .await
            .iter()
            .map(GrantRecord::from_raw)
            .collect()
    }
}

impl PageSource for ReporterClient {
    async fn fetch_page(&self, body: &Value) -> grantlens_core::Result<SearchPage> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Fetch(e.to_string()))?;
        response
            .json::<SearchPage>()
            .await
            .map_err(|e| Error::Fetch(format!("invalid search response: {}", e)))
    }
}

/// Read raw projects from a JSON file: either an array or a search response
/// with a `results` array.
pub fn load_raw_projects(path: &std::path::Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("input file {} is not valid JSON", path.display()))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("input file {} has no results array", path.display()),
        },
        _ => anyhow::bail!("input file {} must hold a JSON array", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves a fixed total from a queue of canned pages and records offsets
    struct CannedSource {
        total: usize,
        pages: Mutex<Vec<grantlens_core::Result<Vec<Value>>>>,
        offsets: Mutex<Vec<u64>>,
    }

    impl CannedSource {
        fn new(total: usize, pages: Vec<grantlens_core::Result<Vec<Value>>>) -> Self {
            Self {
                total,
                pages: Mutex::new(pages.into_iter().rev().collect()),
                offsets: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageSource for CannedSource {
        async fn fetch_page(&self, body: &Value) -> grantlens_core::Result<SearchPage> {
            self.offsets.lock().unwrap().push(body["offset"].as_u64().unwrap());
            let next = self.pages.lock().unwrap().pop().unwrap_or_else(|| Ok(Vec::new()));
            next.map(|results| SearchPage::new(Some(self.total), results))
        }
    }

    fn projects(range: std::ops::Range<u64>) -> Vec<Value> {
        range.map(|i| json!({"appl_id": i})).collect()
    }

    #[test]
    fn test_criteria_body() {
        let criteria = SearchCriteria::default()
            .with_fiscal_years(vec![2022, 2023])
            .with_search_text("gene therapy")
            .with_org_names(vec!["STATE UNIVERSITY".into()]);
        let body = criteria.to_body(1000);

        assert_eq!(body["offset"], 1000);
        assert_eq!(body["limit"], 500);
        assert_eq!(body["criteria"]["fiscal_years"], json!([2022, 2023]));
        assert_eq!(body["criteria"]["include_active_projects"], true);
        assert_eq!(body["criteria"]["advanced_text_search"]["search_text"], "gene therapy");
        assert_eq!(body["criteria"]["org_names"], json!(["STATE UNIVERSITY"]));
    }

    #[test]
    fn test_criteria_defaults() {
        let criteria = SearchCriteria::default().with_fiscal_years(Vec::new()).with_search_text("  ");
        assert_eq!(criteria.fiscal_years, vec![chrono::Local::now().year() - 1]);
        assert!(criteria.search_text.is_none());
        let body = criteria.to_body(0);
        assert!(body["criteria"].get("advanced_text_search").is_none());
        assert!(body["criteria"].get("org_names").is_none());
    }

    #[tokio::test]
    async fn test_paginate_until_total() {
        let source = CannedSource::new(5, vec![Ok(projects(0..2)), Ok(projects(2..4)), Ok(projects(4..5))]);
        let collected = paginate(&source, &SearchCriteria::default(), 10, Duration::ZERO).await;
        assert_eq!(collected.len(), 5);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_paginate_respects_max_requests() {
        let source = CannedSource::new(100, vec![Ok(projects(0..2)), Ok(projects(2..4)), Ok(projects(4..6))]);
        let collected = paginate(&source, &SearchCriteria::default(), 2, Duration::ZERO).await;
        assert_eq!(collected.len(), 4);
    }

    #[tokio::test]
    async fn test_paginate_keeps_partial_results_on_failure() {
        let source = CannedSource::new(
            10,
            vec![Ok(projects(0..3)), Err(Error::Fetch("503 Service Unavailable".into()))],
        );
        let collected = paginate(&source, &SearchCriteria::default(), 10, Duration::ZERO).await;
        assert_eq!(collected.len(), 3);
        assert_eq!(collected[2]["appl_id"], 2);
    }

    #[tokio::test]
    async fn test_paginate_stops_on_empty_page() {
        let source = CannedSource::new(50, vec![Ok(projects(0..1))]);
        let collected = paginate(&source, &SearchCriteria::default(), 10, Duration::ZERO).await;
        assert_eq!(collected.len(), 1);
        assert_eq!(source.offsets.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_search_page_parses_response() {
        let page: SearchPage = serde_json::from_value(json!({
            "meta": {"total": 2, "offset": 0},
            "results": [{"appl_id": 1}, {"appl_id": 2}]
        }))
        .unwrap();
        assert_eq!(page.total(), Some(2));
        assert_eq!(page.results.len(), 2);
    }

    #[test]
    fn test_load_raw_projects() {
        let dir = tempfile::tempdir().unwrap();
        let array = dir.path().join("array.json");
        std::fs::write(&array, r#"[{"appl_id": 1}]"#).unwrap();
        assert_eq!(load_raw_projects(&array).unwrap().len(), 1);

        let response = dir.path().join("response.json");
        std::fs::write(&response, r#"{"meta": {"total": 2}, "results": [{}, {}]}"#).unwrap();
        assert_eq!(load_raw_projects(&response).unwrap().len(), 2);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"meta": {}}"#).unwrap();
        assert!(load_raw_projects(&bad).is_err());
    }
}

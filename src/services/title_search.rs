use serde::{Deserialize, Serialize};

use crate::{
    models::{Title, TitleType},
    services::providers::MetadataProvider,
};

/// Maximum number of autocomplete suggestions
pub const SUGGESTION_LIMIT: usize = 6;

/// Upstream page size used to derive the page count
const RESULTS_PER_PAGE: u32 = 10;

/// Autocomplete lookup
///
/// Never fails: an empty query or an upstream error yields no suggestions.
pub async fn autocomplete(provider: &dyn MetadataProvider, query: &str) -> Vec<Title> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    match provider.search_titles(query, 1).await {
        Ok(page) => page.titles.into_iter().take(SUGGESTION_LIMIT).collect(),
        Err(e) => {
            tracing::debug!(error = %e, query = %query, "Autocomplete search failed");
            Vec::new()
        }
    }
}

/// Raw query string of the results page
#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "type")]
    pub title_type: Option<String>,
    pub ymin: Option<String>,
    pub ymax: Option<String>,
}

/// Client-side filters applied to one upstream results page
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ResultFilters {
    #[serde(rename = "type")]
    pub title_type: Option<TitleType>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
}

impl ResultFilters {
    /// Titles whose year does not parse pass the year bounds
    pub fn matches(&self, title: &Title) -> bool {
        if let Some(wanted) = self.title_type {
            if title.title_type != wanted {
                return false;
            }
        }

        if let Some(year) = title.start_year() {
            if self.year_min.is_some_and(|min| year < min) {
                return false;
            }
            if self.year_max.is_some_and(|max| year > max) {
                return false;
            }
        }

        true
    }
}

/// Results page model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultsPage {
    pub query: String,
    pub items: Vec<Title>,
    pub page: u32,
    pub pages: u32,
    pub total: u32,
    pub filters: ResultFilters,
}

impl ResultsQuery {
    pub fn query(&self) -> String {
        self.q.as_deref().unwrap_or_default().trim().to_string()
    }

    /// 1-based page; missing or invalid values fall back to 1
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    pub fn filters(&self) -> ResultFilters {
        let year = |value: &Option<String>| value.as_deref().and_then(|y| y.trim().parse::<i32>().ok());

        ResultFilters {
            title_type: self
                .title_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(TitleType::parse),
            year_min: year(&self.ymin),
            year_max: year(&self.ymax),
        }
    }
}

fn page_count(total: u32) -> u32 {
    total.div_ceil(RESULTS_PER_PAGE).max(1)
}

/// Full search results with paging and filters
pub async fn search_results(provider: &dyn MetadataProvider, params: &ResultsQuery) -> ResultsPage {
    let query = params.query();
    let filters = params.filters();

    if query.is_empty() {
        return ResultsPage {
            query,
            items: Vec::new(),
            page: 1,
            pages: 1,
            total: 0,
            filters,
        };
    }

    let page = params.page();
    let upstream = match provider.search_titles(&query, page).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::debug!(error = %e, query = %query, page, "Results search failed");
            Default::default()
        }
    };

    let items: Vec<Title> = upstream
        .titles
        .into_iter()
        .filter(|t| filters.matches(t))
        .collect();

    ResultsPage {
        query,
        items,
        page,
        pages: page_count(upstream.total),
        total: upstream.total,
        filters,
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod watchlist;

pub use watchlist::WatchlistEntry;

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    Movie,
    Series,
    Episode,
    #[serde(other)]
    Other,
}

impl TitleType {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "movie" => TitleType::Movie,
            "series" => TitleType::Series,
            "episode" => TitleType::Episode,
            _ => TitleType::Other,
        }
    }
}

/// A movie or TV title as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    /// Opaque catalog identifier (IMDb id)
    pub id: String,
    pub title: String,
    /// Release year, or a range such as "2012–2014"; empty when unknown
    #[serde(default)]
    pub year: String,
    #[serde(rename = "type")]
    pub title_type: TitleType,
    #[serde(default)]
    pub poster: Option<String>,
}

impl Title {
    /// First year of the release range, if it parses
    pub fn start_year(&self) -> Option<i32> {
        self.year
            .split(['–', '-'])
            .next()
            .and_then(|y| y.trim().parse().ok())
    }

    pub fn has_poster(&self) -> bool {
        self.poster.is_some()
    }
}

/// Page of search results from the metadata provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub titles: Vec<Title>,
    pub total: u32,
}

/// Reduced title record used to refresh watchlist cards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinimalTitle {
    pub ok: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub title_type: Option<TitleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl MinimalTitle {
    /// Lookup failure marker
    pub fn missing(id: &str) -> Self {
        Self {
            ok: false,
            id: id.to_string(),
            title: None,
            year: None,
            poster: None,
            title_type: None,
            genre: None,
        }
    }

    /// Builds the minimal view from a full OMDb title record
    pub fn from_record(id: &str, record: &Value) -> Self {
        Self {
            ok: true,
            id: id.to_string(),
            title: text_field(record, "Title"),
            year: text_field(record, "Year"),
            poster: normalize_poster(text_field(record, "Poster")),
            title_type: text_field(record, "Type").map(|t| TitleType::parse(&t)),
            genre: text_field(record, "Genre"),
        }
    }
}

/// Featured title shown on the home page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spotlight {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(rename = "type")]
    pub title_type: TitleType,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
}

impl Spotlight {
    pub fn from_record(record: &Value) -> Option<Self> {
        Some(Self {
            id: text_field(record, "imdbID")?,
            title: text_field(record, "Title").unwrap_or_default(),
            year: text_field(record, "Year").unwrap_or_default(),
            title_type: text_field(record, "Type")
                .map(|t| TitleType::parse(&t))
                .unwrap_or(TitleType::Other),
            poster: normalize_poster(text_field(record, "Poster")),
            genre: text_field(record, "Genre"),
            plot: text_field(record, "Plot"),
        })
    }
}

/// `{results: [...]}` envelope shared by the search and discover endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultsEnvelope {
    #[serde(default)]
    pub results: Vec<Title>,
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// One hit from OMDb's `s=` search
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchItem {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "Type", default)]
    pub item_type: Option<String>,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
}

/// OMDb search response body
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbSearchItem>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
}

impl OmdbSearchItem {
    /// Items without an imdbID cannot be linked and are dropped
    pub fn into_title(self) -> Option<Title> {
        Some(Title {
            id: self.imdb_id.filter(|id| !id.is_empty())?,
            title: self.title.unwrap_or_default(),
            year: self.year.unwrap_or_default(),
            title_type: self
                .item_type
                .map(|t| TitleType::parse(&t))
                .unwrap_or(TitleType::Other),
            poster: normalize_poster(self.poster),
        })
    }
}

impl From<OmdbSearchResponse> for SearchPage {
    fn from(response: OmdbSearchResponse) -> Self {
        let total = response
            .total_results
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);

        SearchPage {
            titles: response
                .search
                .into_iter()
                .filter_map(OmdbSearchItem::into_title)
                .collect(),
            total,
        }
    }
}

/// OMDb reports a missing poster as "N/A"
pub fn normalize_poster(poster: Option<String>) -> Option<String> {
    poster.filter(|p| !p.is_empty() && p != "N/A")
}

fn text_field(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

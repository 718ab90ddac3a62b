use serde::{Deserialize, Serialize, Serializer};

const DEFAULT_MAX_RESULTS: i32 = 5;

/// How thoroughly the backend searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, lower-relevance search.
    #[default]
    Basic,
    /// Slower search with better relevance.
    Advanced,
}

/// Whether the backend synthesizes an answer next to the results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IncludeAnswer {
    /// No synthesized answer.
    #[default]
    No,
    /// A short answer.
    Basic,
    /// A detailed answer.
    Advanced,
}

impl Serialize for IncludeAnswer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IncludeAnswer::No => serializer.serialize_bool(false),
            IncludeAnswer::Basic => serializer.serialize_str("basic"),
            IncludeAnswer::Advanced => serializer.serialize_str("advanced"),
        }
    }
}

/// Options of one search call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchOptions {
    /// Search depth.
    pub search_depth: SearchDepth,
    /// Maximum number of results; zero or negative means the default of 5.
    pub max_results: i32,
    /// Whether to ask for a synthesized answer.
    pub include_answer: IncludeAnswer,
    /// Whether to include the cleaned page content of each result.
    pub include_raw_content: bool,
    /// Whether to include image results.
    pub include_images: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_depth: SearchDepth::Basic,
            max_results: DEFAULT_MAX_RESULTS,
            include_answer: IncludeAnswer::No,
            include_raw_content: false,
            include_images: false,
        }
    }
}

/// One ranked search hit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// The most relevant snippet of the page.
    #[serde(default)]
    pub content: String,
}

/// The outcome of a search call, results in rank order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct SearchResponse {
    /// The synthesized answer, if one was requested and produced.
    #[serde(default)]
    pub answer: Option<String>,
    /// Ranked results.
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRequest<'a> {
    query: &'a str,
    search_depth: SearchDepth,
    max_results: i32,
    include_answer: IncludeAnswer,
    include_raw_content: bool,
    include_images: bool,
}

pub fn create_request<'a>(
    query: &'a str,
    options: &SearchOptions,
) -> SearchRequest<'a> {
    let max_results = if options.max_results <= 0 {
        DEFAULT_MAX_RESULTS
    } else {
        options.max_results
    };
    SearchRequest {
        query,
        search_depth: options.search_depth,
        max_results,
        include_answer: options.include_answer,
        include_raw_content: options.include_raw_content,
        include_images: options.include_images,
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorDetail {
    pub error: String,
}

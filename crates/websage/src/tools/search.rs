use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use websage_core::tool::{Error as ToolError, Tool, ToolResult};
use websage_search::{
    IncludeAnswer, SearchDepth, SearchOptions, SearchProvider, SearchResult,
};

/// Parameters of [`SearchWebTool`].
#[derive(Deserialize, JsonSchema)]
pub struct SearchWebParameters {
    #[schemars(description = "The search query to look up")]
    query: String,
}

/// A tool for looking up current information on the web.
pub struct SearchWebTool<P> {
    provider: P,
    parameter_schema: Value,
}

impl<P: SearchProvider> SearchWebTool<P> {
    /// Creates a new search tool backed by `provider`.
    #[inline]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            parameter_schema: schema_for!(SearchWebParameters).to_value(),
        }
    }
}

impl<P: SearchProvider> Tool for SearchWebTool<P> {
    type Input = SearchWebParameters;

    fn name(&self) -> &str {
        "searchWeb"
    }

    fn description(&self) -> &str {
        "Search the web for current information to answer user queries. \
         Use this when you need up-to-date or factual information."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: SearchWebParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let options = SearchOptions {
            search_depth: SearchDepth::Advanced,
            max_results: 5,
            include_answer: IncludeAnswer::Basic,
            include_raw_content: false,
            include_images: false,
        };
        let search_fut = self.provider.search(&input.query, &options);
        async move {
            match search_fut.await {
                Ok(resp) => Ok(format_results(&resp.results)),
                Err(err) => {
                    Err(ToolError::execution(format!("search error: {err}")))
                }
            }
        }
    }
}

/// Renders results in rank order, the way the model is told to cite them.
pub fn format_results(results: &[SearchResult]) -> String {
    let mut formatted = String::new();
    for (i, result) in results.iter().enumerate() {
        formatted.push_str(&format!(
            "[{}] {}\nURL: {}\nContent: {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }
    formatted
}

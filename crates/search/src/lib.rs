//! Web search clients.
//!
//! [`SearchProvider`] is the seam the rest of the workspace talks to;
//! [`TavilyProvider`] implements it against the Tavily search API.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use reqwest::{Client, StatusCode, header};

pub use config::{TavilyConfig, TavilyConfigBuilder};
pub use proto::{
    IncludeAnswer, SearchDepth, SearchOptions, SearchResponse, SearchResult,
};

/// The kind of a search error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The API key was rejected.
    Unauthorized,
    /// The plan or rate limit was exhausted.
    QuotaExceeded,
    /// Any other failure, including network and payload errors.
    Other,
}

/// Error type for search providers.
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind.
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

/// A web search backend.
pub trait SearchProvider: Send + Sync + 'static {
    /// Runs one search.
    ///
    /// The returned future does not borrow `self`, `query` or `options`.
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<SearchResponse, Error>>
    + Send
    + use<Self>;
}

/// Search provider backed by the Tavily API.
#[derive(Clone, Debug)]
pub struct TavilyProvider {
    client: Client,
    config: Arc<TavilyConfig>,
}

impl TavilyProvider {
    /// Creates a new `TavilyProvider` with the given configuration.
    #[inline]
    pub fn new(config: TavilyConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl SearchProvider for TavilyProvider {
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<SearchResponse, Error>>
    + Send
    + use<> {
        let tavily_req = proto::create_request(query, options);
        debug!("searching for {query:?}");
        let resp_fut = self
            .client
            .post(self.config.search_url())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .json(&tavily_req)
            .send();

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(error_from_status(status, &body));
            }

            let search_resp =
                resp.json::<SearchResponse>().await.map_err(|err| {
                    Error::new(
                        format!("invalid response: {err}"),
                        ErrorKind::Other,
                    )
                })?;
            trace!("got {} search results", search_resp.results.len());
            Ok(search_resp)
        }
    }
}

fn error_from_status(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<proto::ErrorBody>(body)
        .map(|body| body.detail.error)
        .unwrap_or_else(|_| body.trim().to_owned());
    let kind = match status.as_u16() {
        401 | 403 => ErrorKind::Unauthorized,
        429 | 432 | 433 => ErrorKind::QuotaExceeded,
        _ => ErrorKind::Other,
    };
    warn!("search request failed with {status}: {detail}");
    Error::new(format!("HTTP {status}: {detail}"), kind)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer) -> TavilyProvider {
        let config = TavilyConfigBuilder::with_api_key("tvly-test")
            .with_base_url(server.uri())
            .build();
        TavilyProvider::new(config)
    }

    #[tokio::test]
    async fn test_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header_eq("authorization", "Bearer tvly-test"))
            .and(body_json(json!({
                "query": "tokio 1.49",
                "search_depth": "advanced",
                "max_results": 5,
                "include_answer": "basic",
                "include_raw_content": false,
                "include_images": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "tokio 1.49",
                "answer": "Tokio 1.49 is out.",
                "results": [
                    {
                        "title": "Tokio releases",
                        "url": "https://github.com/tokio-rs/tokio/releases",
                        "content": "tokio-1.49.0",
                        "score": 0.91
                    },
                    {
                        "title": "Tokio blog",
                        "url": "https://tokio.rs/blog",
                        "content": "Announcements",
                        "score": 0.52
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = SearchOptions {
            search_depth: SearchDepth::Advanced,
            max_results: 5,
            include_answer: IncludeAnswer::Basic,
            ..Default::default()
        };
        let resp = provider_for(&server)
            .search("tokio 1.49", &options)
            .await
            .unwrap();
        assert_eq!(resp.answer.as_deref(), Some("Tokio 1.49 is out."));
        let titles: Vec<_> =
            resp.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Tokio releases", "Tokio blog"]);
    }

    #[tokio::test]
    async fn test_request_outlives_arguments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "query": "rust",
                "search_depth": "basic",
                "max_results": 5,
                "include_answer": false,
                "include_raw_content": false,
                "include_images": false
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "results": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let search_fut = {
            let provider = provider_for(&server);
            let query = String::from("rust");
            let options = SearchOptions::default();
            provider.search(&query, &options)
        };
        let resp = search_fut.await.unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.answer, None);
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Unauthorized),
            (429, ErrorKind::QuotaExceeded),
            (432, ErrorKind::QuotaExceeded),
            (500, ErrorKind::Other),
        ];
        for (status, kind) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_json(
                    json!({ "detail": { "error": "nope" } }),
                ))
                .mount(&server)
                .await;

            let err = provider_for(&server)
                .search("q", &SearchOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), kind, "status {status}");
            assert!(err.message().contains("nope"));
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .search("q", &SearchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}

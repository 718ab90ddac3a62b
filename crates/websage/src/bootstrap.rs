//! Startup: reading credentials and wiring providers, tools and flows.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use websage_core::Generator;
use websage_core::flow::FlowRegistry;
use websage_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use websage_search::{TavilyConfigBuilder, TavilyProvider};

use crate::flows;
use crate::session::{Session, SessionBuilder};
use crate::tools::SearchWebTool;

/// Name of the variable holding the Gemini API key.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Name of the variable holding the Tavily API key.
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";

const GEMINI_MODEL: &str = "GEMINI_MODEL";
const GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
const TAVILY_BASE_URL: &str = "TAVILY_BASE_URL";

/// A startup configuration error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    MissingVar(&'static str),
}

impl ConfigError {
    /// Returns a hint on how to fix the error.
    pub fn tip(&self) -> String {
        match self {
            ConfigError::MissingVar(name) => {
                format!("Make sure to set your {name} in the .env file")
            }
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "{name} is not set"),
        }
    }
}

impl StdError for ConfigError {}

/// What the program was asked to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Register the flows and wait to be stopped.
    Serve,
    /// Chat in the terminal.
    Interactive,
}

impl RunMode {
    /// Picks the mode from the command line arguments, program name
    /// excluded.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match args.into_iter().next() {
            Some(arg) if arg.as_ref() == "serve" => RunMode::Serve,
            _ => RunMode::Interactive,
        }
    }
}

/// Keys and endpoint overrides read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    gemini_api_key: String,
    tavily_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    tavily_base_url: Option<String>,
}

impl Credentials {
    /// Reads the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads variables through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let gemini_api_key = var(GEMINI_API_KEY)
            .ok_or(ConfigError::MissingVar(GEMINI_API_KEY))?;
        Ok(Self {
            gemini_api_key,
            tavily_api_key: var(TAVILY_API_KEY),
            gemini_model: var(GEMINI_MODEL),
            gemini_base_url: var(GEMINI_BASE_URL),
            tavily_base_url: var(TAVILY_BASE_URL),
        })
    }

    /// Whether a search key is available.
    #[inline]
    pub fn has_search(&self) -> bool {
        self.tavily_api_key.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &"<redacted>")
            .field("has_search", &self.has_search())
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("tavily_base_url", &self.tavily_base_url)
            .finish()
    }
}

/// Everything needed to run in the selected mode.
pub enum Launch {
    /// The registered flows, for serve mode.
    Serve(FlowRegistry),
    /// A chat session, for interactive mode.
    Interactive(Session),
}

/// Builds the components for `mode`.
///
/// The model provider is always built first. Serve mode works without a
/// search key; interactive mode requires one.
pub fn launch(
    credentials: Credentials,
    mode: RunMode,
) -> Result<Launch, ConfigError> {
    let Credentials {
        gemini_api_key,
        tavily_api_key,
        gemini_model,
        gemini_base_url,
        tavily_base_url,
    } = credentials;

    let mut config = GeminiConfigBuilder::with_api_key(gemini_api_key);
    if let Some(model) = gemini_model {
        config = config.with_model(model);
    }
    if let Some(base_url) = gemini_base_url {
        config = config.with_base_url(base_url);
    }
    let model_provider = GeminiProvider::new(config.build());
    debug!("model provider ready: {:?}", model_provider.config());

    let has_search = tavily_api_key.is_some();
    let mut generator = Generator::new(model_provider);
    match tavily_api_key {
        Some(api_key) => {
            let mut config = TavilyConfigBuilder::with_api_key(api_key);
            if let Some(base_url) = tavily_base_url {
                config = config.with_base_url(base_url);
            }
            let search = TavilyProvider::new(config.build());
            generator = generator.with_tool(SearchWebTool::new(search));
        }
        None => warn!("{TAVILY_API_KEY} is not set, web search is disabled"),
    }

    let mut registry = FlowRegistry::default();
    flows::register_all(&mut registry, &generator);

    match mode {
        RunMode::Serve => Ok(Launch::Serve(registry)),
        RunMode::Interactive => {
            if !has_search {
                return Err(ConfigError::MissingVar(TAVILY_API_KEY));
            }
            Ok(Launch::Interactive(
                SessionBuilder::with_generator(generator).build(),
            ))
        }
    }
}

/// Describes what serve mode is running. Flows are only reachable from
/// inside this process.
pub fn serve_banner(registry: &FlowRegistry) -> String {
    format!(
        "Flows registered in-process (no external endpoint): {}. \
         Press Ctrl+C to stop.",
        registry.names().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(
        vars: &'a [(&'a str, &'a str)],
    ) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |name: &str| vars.get(name).map(|v| (*v).to_owned())
    }

    #[test]
    fn test_run_mode() {
        assert_eq!(RunMode::from_args(["serve"]), RunMode::Serve);
        assert_eq!(RunMode::from_args(["serve", "x"]), RunMode::Serve);
        assert_eq!(RunMode::from_args(["chat"]), RunMode::Interactive);
        assert_eq!(RunMode::from_args(["x", "serve"]), RunMode::Interactive);
        assert_eq!(
            RunMode::from_args(Vec::<String>::new()),
            RunMode::Interactive
        );
    }

    #[test]
    fn test_missing_gemini_key() {
        let err = Credentials::from_lookup(lookup(&[("TAVILY_API_KEY", "t")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(GEMINI_API_KEY));
        assert_eq!(err.to_string(), "GEMINI_API_KEY is not set");
        assert!(err.tip().contains(".env"));

        let err = Credentials::from_lookup(lookup(&[("GEMINI_API_KEY", " ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(GEMINI_API_KEY));
    }

    #[test]
    fn test_credentials() {
        let credentials = Credentials::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-secret"),
            ("TAVILY_API_KEY", ""),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
        ]))
        .unwrap();
        assert!(!credentials.has_search());
        assert_eq!(
            credentials.gemini_model.as_deref(),
            Some("gemini-2.5-flash")
        );
        assert!(!format!("{credentials:?}").contains("g-secret"));
    }

    #[test]
    fn test_interactive_requires_search() {
        let credentials =
            Credentials::from_lookup(lookup(&[("GEMINI_API_KEY", "g")]))
                .unwrap();
        let err = launch(credentials.clone(), RunMode::Interactive)
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::MissingVar(TAVILY_API_KEY));

        // Serve mode still registers the flows, without the search tool.
        let Ok(Launch::Serve(registry)) = launch(credentials, RunMode::Serve)
        else {
            panic!("expected serve mode to start");
        };
        assert_eq!(registry.names(), [flows::ASK_QUESTION]);
        let flow = registry.get(flows::ASK_QUESTION).unwrap();
        assert!(flow.tool_names().is_empty());
        assert_eq!(
            serve_banner(&registry),
            "Flows registered in-process (no external endpoint): \
             askQuestion. Press Ctrl+C to stop."
        );
    }

    #[test]
    fn test_search_key_registers_tool() {
        let credentials = Credentials::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g"),
            ("TAVILY_API_KEY", "t"),
        ]))
        .unwrap();

        let Ok(Launch::Interactive(session)) =
            launch(credentials.clone(), RunMode::Interactive)
        else {
            panic!("expected interactive mode to start");
        };
        assert_eq!(session.tool_names(), ["searchWeb"]);
        assert!(session.history().is_empty());

        let Ok(Launch::Serve(registry)) = launch(credentials, RunMode::Serve)
        else {
            panic!("expected serve mode to start");
        };
        let flow = registry.get(flows::ASK_QUESTION).unwrap();
        assert_eq!(flow.tool_names(), ["searchWeb"]);
    }
}

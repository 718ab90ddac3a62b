use websage_core::conversation::Item;
use websage_core::{Agent, AgentBuilder, GenerationError, Generator};
use websage_model::ModelProvider;

/// The system prompt of interactive sessions.
pub const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    generator: Generator,
    system_prompt: String,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self::with_generator(Generator::new(provider))
    }

    /// Creates a session builder answering through `generator`, which may
    /// be shared with flows.
    pub fn with_generator(generator: Generator) -> Self {
        Self {
            generator,
            system_prompt: SYSTEM_PROMPT.trim_end().to_owned(),
        }
    }

    /// Replaces the default system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        debug!(
            "building a session with tools: {:?}",
            self.generator.tool_names()
        );
        let agent = AgentBuilder::with_generator(self.generator)
            .with_system_prompt(self.system_prompt)
            .build();
        Session { agent }
    }
}

/// A chat session: one agent and the history of what was asked so far.
///
/// Basically a wrapper around [`Agent`].
pub struct Session {
    agent: Agent,
}

impl Session {
    /// Sends a question and waits for the answer.
    #[inline]
    pub async fn send(
        &mut self,
        question: &str,
    ) -> Result<String, GenerationError> {
        self.agent.send(question).await
    }

    /// Forgets the conversation so far.
    #[inline]
    pub fn clear_history(&mut self) {
        self.agent.clear_history();
    }

    /// Returns the conversation so far, oldest first.
    #[inline]
    pub fn history(&self) -> &[Item] {
        self.agent.history()
    }

    /// Returns the names of the tools the model may call.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.agent.tool_names()
    }
}

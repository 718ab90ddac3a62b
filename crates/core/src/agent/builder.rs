use websage_model::ModelProvider;

use super::Agent;
use crate::generate::Generator;
use crate::tool::Tool;

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) generator: Generator,
    pub(crate) system_prompt: String,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_generator(Generator::new(provider))
    }

    /// Creates a new builder that answers through an existing generator,
    /// sharing its model client and tools.
    #[inline]
    pub fn with_generator(generator: Generator) -> Self {
        Self {
            generator,
            system_prompt: String::new(),
        }
    }

    /// Sets the system prompt sent with every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.generator = self.generator.with_tool(tool);
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}

use websage_model::{ModelMessage, ModelProvider, ModelRequest};

use crate::error::GenerationError;
use crate::model_client::ModelClient;
use crate::tool::{Manager as ToolManager, Tool};

/// How many tool round-trips one generation may take by default.
pub const DEFAULT_MAX_TURNS: usize = 5;

/// Produces one answer from a model, running the tools the model asks for
/// along the way.
///
/// A generator holds no conversation state. Cloning is cheap, clones share
/// the model client and the tools, so one generator can serve an agent and
/// any number of flows.
#[derive(Clone)]
pub struct Generator {
    model_client: ModelClient,
    tools: ToolManager,
    max_turns: usize,
}

impl Generator {
    /// Creates a generator with no tools.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: ToolManager::default(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Registers a tool the model may call.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Sets how many tool round-trips one generation may take.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Returns the names of the registered tools.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    /// Generates the answer to `history`, which must end with the input to
    /// answer.
    ///
    /// Intermediate tool turns live only for the duration of this call; the
    /// returned text is the model's final answer.
    pub async fn generate(
        &self,
        system_prompt: &str,
        history: &[ModelMessage],
    ) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !system_prompt.is_empty() {
            messages.push(ModelMessage::System(system_prompt.to_owned()));
        }
        messages.extend_from_slice(history);
        let tools = self.tools.definitions();

        let mut turns = 0;
        loop {
            let req = ModelRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let turn = self
                .model_client
                .complete(req)
                .await
                .map_err(GenerationError::Model)?;
            debug!(
                "model finished with {:?}, {} tool calls",
                turn.finish_reason,
                turn.tool_calls.len()
            );

            if turn.tool_calls.is_empty() {
                return Ok(turn.text);
            }
            if turns == self.max_turns {
                warn!("giving up after {turns} tool round-trips");
                return Err(GenerationError::TooManyTurns(self.max_turns));
            }
            turns += 1;

            let (replay, tool_calls) = turn.into_replay();
            messages.extend(replay);
            for call in tool_calls {
                let result = self.tools.call(call).await;
                messages.push(ModelMessage::Tool(result));
            }
        }
    }
}

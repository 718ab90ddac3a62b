mod builder;

use crate::conversation::{Conversation, Item, Role};
use crate::error::GenerationError;
use crate::generate::Generator;
pub use builder::AgentBuilder;

/// A conversational agent: a system prompt, a generator and the history of
/// one chat session.
///
/// The history only holds what the user asked and what the model finally
/// answered. It is never truncated, and only changes through `&mut self`.
pub struct Agent {
    generator: Generator,
    system_prompt: String,
    conversation: Conversation,
}

impl Agent {
    /// Sends a user query and waits for the model's answer.
    ///
    /// The query is recorded before the model is asked. When generation
    /// fails it stays in the history, and nothing else is recorded.
    pub async fn send<S: Into<String>>(
        &mut self,
        query: S,
    ) -> Result<String, GenerationError> {
        self.conversation.push(Role::User, query.into());
        debug!(
            "sending a query, {} items in history",
            self.conversation.items.len()
        );

        let messages = self.conversation.to_messages();
        let answer = self
            .generator
            .generate(&self.system_prompt, &messages)
            .await?;

        self.conversation.push(Role::Model, answer.clone());
        Ok(answer)
    }

    /// Forgets the conversation so far. Configuration is kept.
    #[inline]
    pub fn clear_history(&mut self) {
        trace!("clearing {} history items", self.conversation.items.len());
        self.conversation.clear();
    }

    /// Returns the conversation so far, oldest first.
    #[inline]
    pub fn history(&self) -> &[Item] {
        self.conversation.items()
    }

    /// Returns the system prompt.
    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns the names of the tools the model may call.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.generator.tool_names()
    }
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            generator,
            system_prompt,
        } = builder;

        Self {
            generator,
            system_prompt,
            conversation: Default::default(),
        }
    }
}

//! Flows exposed in serve mode.

use websage_core::Generator;
use websage_core::flow::{Flow, FlowRegistry};

/// Name of the flow answering one web-backed question.
pub const ASK_QUESTION: &str = "askQuestion";

const ASK_QUESTION_PROMPT: &str = include_str!("./flow_prompt.md");

/// Builds the `askQuestion` flow on top of `generator`.
pub fn ask_question(generator: Generator) -> Flow {
    Flow::new(ASK_QUESTION, generator)
        .with_system_prompt(ASK_QUESTION_PROMPT.trim_end())
        .with_prompt_template("User Query: {{query}}")
        .with_input_chars(1..=2000)
}

/// Registers every flow of this application.
pub fn register_all(registry: &mut FlowRegistry, generator: &Generator) {
    registry.register(ask_question(generator.clone()));
}

#[cfg(test)]
mod tests {
    use websage_core::flow::FlowError;
    use websage_model::ModelMessage;
    use websage_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[tokio::test]
    async fn test_ask_question() {
        let mut provider = TestModelProvider::default();
        provider.add_user_input_step();
        provider.add_assistant_response_step(PresetResponse::with_text(
            "Paris [1]\n\nSources\n- https://example.com",
        ));

        let mut registry = FlowRegistry::default();
        register_all(&mut registry, &Generator::new(provider.clone()));
        assert_eq!(registry.names(), [ASK_QUESTION]);

        let answer = registry
            .run(ASK_QUESTION, "Capital of France?")
            .await
            .unwrap();
        assert!(answer.starts_with("Paris"));

        let requests = provider.requests();
        assert_eq!(
            requests[0].messages[1],
            ModelMessage::User("User Query: Capital of France?".to_owned())
        );

        let err = registry.run(ASK_QUESTION, "").await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(_)));
        assert_eq!(provider.request_count(), 1);
    }
}

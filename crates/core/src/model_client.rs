//! Turn-level access to a model provider.
//!
//! The generator never looks at individual stream events. It needs the
//! finished turn: the answer text, the requested tool calls and the
//! provider message to replay in the next request. [`ModelClient`] drains
//! a response into a [`ModelTurn`] and hides the provider type.

use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use tracing::Instrument;
use websage_model::{
    ModelFinishReason, ModelMessage, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, OpaqueMessage,
    ToolCallRequest,
};

type TurnResult = Result<ModelTurn, Box<dyn ModelProviderError>>;
type TurnFuture = Pin<Box<dyn Future<Output = TurnResult> + Send>>;
type TurnHandler = Arc<dyn Fn(ModelRequest) -> TurnFuture + Send + Sync>;

/// A provider with its type erased, so `Generator` needs no type
/// parameter.
#[derive(Clone)]
pub(crate) struct ModelClient {
    handler: TurnHandler,
}

impl ModelClient {
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let provider_name = provider.name();
        let handler: TurnHandler = Arc::new(move |req: ModelRequest| {
            let resp_fut = provider.send_request(&req);
            let span = debug_span!("model request", provider = provider_name);
            let turn_fut = async move {
                trace!(
                    "{} messages, {} tools",
                    req.messages.len(),
                    req.tools.len()
                );
                let resp = resp_fut.await.map_err(|err| {
                    warn!("request failed: {err}");
                    Box::new(err) as Box<dyn ModelProviderError>
                })?;
                collect_turn(resp).await.map_err(|err| {
                    warn!("response stream failed: {err}");
                    Box::new(err) as Box<dyn ModelProviderError>
                })
            };
            Box::pin(turn_fut.instrument(span)) as TurnFuture
        });
        Self { handler }
    }

    /// Sends `req` and waits until the model finishes its turn.
    #[inline]
    pub async fn complete(&self, req: ModelRequest) -> TurnResult {
        (self.handler)(req).await
    }
}

/// Everything the model produced in one turn.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModelTurn {
    pub text: String,
    pub opaque_msg: Option<OpaqueMessage>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelTurn {
    /// Splits the turn into the message that replays it and the calls to
    /// run. The provider's own message is preferred over the plain text,
    /// and a turn with neither replays nothing.
    pub fn into_replay(
        self,
    ) -> (Option<ModelMessage>, Vec<ToolCallRequest>) {
        let replay = match self.opaque_msg {
            Some(opaque_msg) => Some(ModelMessage::Opaque(opaque_msg)),
            None if !self.text.is_empty() => {
                Some(ModelMessage::Assistant(self.text))
            }
            None => None,
        };
        (replay, self.tool_calls)
    }
}

async fn collect_turn<R: ModelResponse>(
    resp: R,
) -> Result<ModelTurn, R::Error> {
    let mut turn = ModelTurn::default();
    let mut resp = pin!(resp);
    while let Some(event) =
        poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
    {
        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                turn.text.push_str(&delta)
            }
            ModelResponseEvent::ToolCall(call) => {
                trace!("model asked for `{}` ({})", call.name, call.id);
                turn.tool_calls.push(call);
            }
            ModelResponseEvent::Completed(reason) => {
                turn.finish_reason = Some(reason)
            }
        }
    }
    turn.opaque_msg = resp.make_opaque_message();
    Ok(turn)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use websage_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;

    fn user_request(text: &str) -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User(text.to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_complete() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_user_input_step();
        model_provider.add_assistant_response_step(
            PresetResponse::with_events([
                PresetEvent::MessageDelta("Let me ".to_owned()),
                PresetEvent::MessageDelta("check.".to_owned()),
                PresetEvent::tool_call(
                    "searchWeb:0",
                    "searchWeb",
                    json!({ "query": "rust" }),
                ),
            ]),
        );

        let model_client = ModelClient::new(model_provider);
        for _ in 0..2 {
            let turn = model_client.complete(user_request("Hi")).await.unwrap();
            assert_eq!(turn.text, "Let me check.");
            assert_eq!(turn.tool_calls.len(), 1);
            assert_eq!(turn.tool_calls[0].arguments["query"], "rust");
            assert!(turn.opaque_msg.is_some());

            let (replay, calls) = turn.into_replay();
            assert!(matches!(replay, Some(ModelMessage::Opaque(_))));
            assert_eq!(calls[0].id, "searchWeb:0");
        }
    }

    #[test]
    fn test_replay_without_opaque_message() {
        let turn = ModelTurn {
            text: "Searching.".to_owned(),
            ..Default::default()
        };
        let (replay, calls) = turn.into_replay();
        assert_eq!(replay, Some(ModelMessage::Assistant("Searching.".into())));
        assert!(calls.is_empty());

        let (replay, _) = ModelTurn::default().into_replay();
        assert_eq!(replay, None);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_client = ModelClient::new(TestModelProvider::default());
        let turn_or_err = model_client.complete(user_request("Hi")).await;
        assert!(turn_or_err.is_err());
    }
}

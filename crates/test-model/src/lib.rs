//! A local fake model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use websage_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    OpaqueMessage,
};

pub use preset::*;

/// The name this provider reports and tags its opaque messages with.
pub const PROVIDER_NAME: &str = "test";

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub fn message(&self) -> &str {
        self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    step_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        let delay = this.delay;
        let pending = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(pending.as_mut().poll(cx));
        this.sleep = None;

        let event_idx = this.event_idx;
        this.event_idx += 1;
        if let Some(preset) = this.events.get(event_idx) {
            let event = match preset {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            };
            return Poll::Ready(Ok(Some(event)));
        }
        if event_idx == this.events.len() {
            let has_tool_call = this
                .events
                .iter()
                .any(|event| matches!(event, PresetEvent::ToolCall(_)));
            let reason = if has_tool_call {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            };
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                reason,
            ))));
        }
        // In case this method is called after completion.
        Poll::Ready(Ok(None))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        let id = format!("msg:{}", self.step_idx);
        Some(OpaqueMessage::new(PROVIDER_NAME, id.clone(), id))
    }
}

#[derive(Clone, Debug)]
enum ConversationStep {
    Input,
    AssistantResponse(PresetResponse),
}

/// A local fake model for testing purpose.
///
/// Before sending requests, set up the conversation script: the sequence
/// of inputs (user messages and tool results) and assistant responses the
/// model expects. A request selects its step by counting the non-system
/// messages it carries, so a request with one user message is answered by
/// the second step. If the selected step isn't an assistant response, the
/// request fails.
///
/// Clones share the recorded requests, which lets a test keep a clone
/// around after handing the provider to an agent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    attempts: Arc<Mutex<HashMap<usize, u64>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(preset));
    }

    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::Input);
    }

    /// Adds the step holding the result of a tool the model asked for.
    ///
    /// One step is needed per tool call of the previous response.
    #[inline]
    pub fn add_tool_result_step(&mut self) {
        self.conversation_script.push(ConversationStep::Input);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Returns how many requests were received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn select_step(&self, req: &ModelRequest) -> Result<(usize, &PresetResponse), Error> {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| !matches!(msg, ModelMessage::System(_)))
            .count();
        match self.conversation_script.get(step_idx) {
            Some(ConversationStep::AssistantResponse(preset)) => {
                Ok((step_idx, preset))
            }
            Some(ConversationStep::Input) => Err(Error {
                message: "not an assistant response step",
                kind: ErrorKind::Other,
            }),
            None => Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            }),
        }
    }

    fn should_fail(&self, step_idx: usize, preset: &PresetResponse) -> bool {
        let Some(failures) = preset.failures else {
            return false;
        };
        let Ok(mut attempts) = self.attempts.lock() else {
            return true;
        };
        let attempt = attempts.entry(step_idx).or_default();
        *attempt += 1;
        failures == 0 || *attempt <= failures
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let result = self.select_step(req).and_then(|(step_idx, preset)| {
            if self.should_fail(step_idx, preset) {
                return Err(Error {
                    message: "injected failure",
                    kind: ErrorKind::Other,
                });
            }
            Ok(TestModelResponse {
                events: preset.events.clone(),
                event_idx: 0,
                step_idx,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            })
        });
        ready(result)
    }
}

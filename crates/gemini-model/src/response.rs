use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use websage_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};

use crate::io::Sse;
use crate::proto::{Content, GenerateContentChunk, Part};
use crate::{Error, PROVIDER_NAME};

// Used when the server omits `responseId`.
static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

/// Finish reasons meaning the candidate was cut off by a content filter.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

struct PartialState {
    sse: Sse,
    id: Option<String>,
    // Every part of the model turn, kept verbatim so thought signatures
    // survive the round trip.
    parts: Vec<Part>,
    tool_call_count: usize,
    pending_events: VecDeque<ModelResponseEvent>,
    stream_ended: bool,
}

impl PartialState {
    fn absorb_part(&mut self, part: Part) {
        if part.thought == Some(true) {
            self.parts.push(part);
            return;
        }

        if let Some(call) = &part.function_call {
            let id = call.id.clone().unwrap_or_else(|| {
                format!("{}:{}", call.name, self.tool_call_count)
            });
            self.tool_call_count += 1;
            self.pending_events
                .push_back(ModelResponseEvent::ToolCall(ToolCallRequest {
                    id,
                    name: call.name.clone(),
                    arguments: call.args.clone(),
                }));
            self.parts.push(part);
            return;
        }

        let Some(text) = &part.text else {
            self.parts.push(part);
            return;
        };
        if text.is_empty() && part.thought_signature.is_none() {
            return;
        }
        if !text.is_empty() {
            self.pending_events
                .push_back(ModelResponseEvent::MessageDelta(text.clone()));
        }
        match self.parts.last_mut() {
            Some(last) if last.is_plain_text() && part.is_plain_text() => {
                if let (Some(acc), Some(text)) = (&mut last.text, part.text) {
                    acc.push_str(&text);
                }
            }
            _ => self.parts.push(part),
        }
    }

    fn apply_chunk(&mut self, chunk: GenerateContentChunk) -> Result<(), Error> {
        if let Some(reason) =
            chunk.prompt_feedback.and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::new(
                format!("prompt blocked: {reason}"),
                ErrorKind::Moderated,
            ));
        }
        if let Some(id) = chunk.response_id {
            self.id.get_or_insert(id);
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            return Ok(());
        };
        if let Some(content) = candidate.content {
            for part in content.parts {
                self.absorb_part(part);
            }
        }

        let Some(finish_reason) = candidate.finish_reason else {
            return Ok(());
        };
        if BLOCKING_FINISH_REASONS.contains(&finish_reason.as_str()) {
            return Err(Error::new(
                format!("response blocked: {finish_reason}"),
                ErrorKind::Moderated,
            ));
        }
        // Gemini reports `STOP` even when the turn ends with function calls.
        let reason = if self.tool_call_count > 0 {
            ModelFinishReason::ToolCalls
        } else if finish_reason == "MAX_TOKENS" {
            ModelFinishReason::MaxTokens
        } else {
            ModelFinishReason::Stop
        };
        self.pending_events
            .push_back(ModelResponseEvent::Completed(reason));
        Ok(())
    }

    #[inline]
    fn finish(self) -> (String, Content) {
        let id = self.id.unwrap_or_else(|| {
            format!("local:{}", NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed))
        });
        let content = Content {
            role: Some("model".to_owned()),
            parts: self.parts,
        };
        (id, content)
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        full_msg: Option<(String, Content)>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            parts: vec![],
            tool_call_count: 0,
            pending_events: Default::default(),
            stream_ended: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(partial_state))),
            full_msg: None,
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, partial_state)) => {
                    *this.next_event_fut = None;
                    *this.full_msg = Some(partial_state.finish());
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        *this.next_event_fut = Some(Box::pin(next_event(partial_state)));
        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg.as_ref().map(|(id, content)| {
            OpaqueMessage::new(PROVIDER_NAME, id, content.clone())
        })
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    loop {
        if let Some(event) = partial_state.pending_events.pop_front() {
            return Ok((Some(event), partial_state));
        }
        if partial_state.stream_ended {
            return Ok((None, partial_state));
        }

        let data = match partial_state.sse.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                partial_state.stream_ended = true;
                continue;
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {data}");

        let chunk = serde_json::from_str::<GenerateContentChunk>(&data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        partial_state.apply_chunk(chunk)?;
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;

    use serde_json::json;

    use super::*;
    use crate::io::Chunks;

    async fn collect(
        chunks: Chunks,
    ) -> (Vec<ModelResponseEvent>, Result<(), Error>, GeminiResponse) {
        let mut resp = GeminiResponse::from_sse(Sse::new(chunks));
        let mut events = vec![];
        let result = loop {
            match poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        (events, result, resp)
    }

    #[tokio::test]
    async fn test_text_and_tool_call() {
        let chunks = Chunks::canned([include_bytes!(
            "../fixtures/test_response.txt"
        )
        .as_slice()]);
        let (events, result, resp) = collect(chunks).await;
        result.unwrap();

        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Let me ".to_owned()),
                ModelResponseEvent::MessageDelta("search for that.".to_owned()),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "searchWeb:0".to_owned(),
                    name: "searchWeb".to_owned(),
                    arguments: json!({ "query": "latest tokio release" }),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );

        let opaque = resp.make_opaque_message().unwrap();
        assert_eq!(opaque.id(), "resp-0001");
        let content: &Content = opaque.to_raw().unwrap();
        assert_eq!(content.role.as_deref(), Some("model"));
        assert_eq!(content.parts.len(), 2);
        assert_eq!(
            content.parts[0].text.as_deref(),
            Some("Let me search for that.")
        );
        assert_eq!(
            content.parts[1].thought_signature.as_deref(),
            Some("c2ln")
        );
    }

    #[tokio::test]
    async fn test_max_tokens() {
        let chunks = Chunks::canned([
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Partial\"}]},\"finishReason\":\"MAX_TOKENS\"}]}\r\n\r\n".as_slice(),
        ]);
        let (events, result, _) = collect(chunks).await;
        result.unwrap();
        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::MaxTokens))
        );
    }

    #[tokio::test]
    async fn test_blocked() {
        let chunks = Chunks::canned([
            b"data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\r\n\r\n".as_slice(),
        ]);
        let (events, result, _) = collect(chunks).await;
        assert!(events.is_empty());
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Moderated);

        let chunks = Chunks::canned([
            b"data: {\"candidates\":[{\"finishReason\":\"SAFETY\"}]}\n\n".as_slice(),
        ]);
        let (_, result, _) = collect(chunks).await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Moderated);
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let chunks = Chunks::canned([b"data: {not json\n\n".as_slice()]);
        let (_, result, resp) = collect(chunks).await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Other);
        assert!(resp.make_opaque_message().is_none());
    }
}

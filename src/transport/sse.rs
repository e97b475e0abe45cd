//! SSE parsing for streamed Chat Completions replies.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use eventsource_stream::{EventStream, EventStreamError, Eventsource};
use futures_util::Stream;
use serde::Deserialize;
use serde_json::Value;

use super::errors::{TransportError, api_error_message};

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Fragment(String),
    Skip,
    Done,
}

/// Appends a blank line once the body ends so a final event without a
/// trailing separator is still dispatched.
struct TerminatedBody<S> {
    inner: S,
    terminated: bool,
}

impl<S> TerminatedBody<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            terminated: false,
        }
    }
}

impl<S, E> Stream for TerminatedBody<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(Some(Ok(Bytes::from_static(b"\n\n"))))
            }
            other => other,
        }
    }
}

/// Turns an SSE byte stream into the text fragments of one reply.
pub struct ChatCompletionsSse<S> {
    inner: EventStream<TerminatedBody<S>>,
    finished: bool,
}

impl<S, E> ChatCompletionsSse<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: TerminatedBody::new(stream).eventsource(),
            finished: false,
        }
    }
}

impl<S, E> Stream for ChatCompletionsSse<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<String, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.finished {
                return Poll::Ready(None);
            }

            let outcome = match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => parse_event_data(&event.data),
                Poll::Ready(Some(Err(EventStreamError::Transport(err)))) => {
                    Err(TransportError::Interrupted(err.to_string()))
                }
                Poll::Ready(Some(Err(err))) => {
                    Err(TransportError::Malformed(format!("invalid SSE framing: {err}")))
                }
                // Servers are not required to send [DONE]; end of body ends the reply.
                Poll::Ready(None) => Ok(SseEvent::Done),
                Poll::Pending => return Poll::Pending,
            };

            match outcome {
                Ok(SseEvent::Fragment(text)) => return Poll::Ready(Some(Ok(text))),
                Ok(SseEvent::Skip) => continue,
                Ok(SseEvent::Done) => {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Err(err) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
            }
        }
    }
}

/// Interprets the `data` payload of one event.
fn parse_event_data(data: &str) -> Result<SseEvent, TransportError> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(SseEvent::Skip);
    }
    if trimmed == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let value = serde_json::from_str::<Value>(trimmed)
        .map_err(|err| TransportError::Malformed(format!("invalid SSE JSON: {err}")))?;
    if value.get("error").is_some_and(|error| !error.is_null()) {
        let message = api_error_message(trimmed).unwrap_or_else(|| "unknown error".to_string());
        return Err(TransportError::Remote(message));
    }

    let chunk: ChatCompletionChunk = serde_json::from_value(value)
        .map_err(|err| TransportError::Malformed(format!("unexpected chunk shape: {err}")))?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    if content.is_empty() {
        Ok(SseEvent::Skip)
    } else {
        Ok(SseEvent::Fragment(content))
    }
}

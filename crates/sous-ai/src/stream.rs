//! Streaming event types and utilities

use crate::error::{Error, Result};
use crate::types::{Completion, StopReason, Usage};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while a completion streams in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    /// The provider accepted the request
    Start { model: String },
    /// Text content delta
    TextDelta { delta: String },
    /// Completion finished successfully
    Done {
        text: String,
        stop_reason: StopReason,
        usage: Usage,
    },
    /// The endpoint answered with a non-success status
    HttpError { status: u16, body: String },
    /// Error occurred
    Error { message: String },
}

/// A stream of message events
pub type MessageEventStream = Pin<Box<dyn Stream<Item = MessageEvent> + Send>>;

/// Drain a stream into a single [`Completion`].
///
/// Deltas are accumulated; a `Done` event's text wins when present. An `Error`
/// or `HttpError` event aborts, and a stream that produced no text is an
/// [`Error::EmptyResponse`].
pub async fn collect_text(mut stream: MessageEventStream) -> Result<Completion> {
    let mut accumulated = String::new();
    let mut completion = Completion::default();

    while let Some(event) = stream.next().await {
        match event {
            MessageEvent::Start { .. } => {}
            MessageEvent::TextDelta { delta } => accumulated.push_str(&delta),
            MessageEvent::Done {
                text,
                stop_reason,
                usage,
            } => {
                completion.text = if text.is_empty() { accumulated } else { text };
                completion.stop_reason = Some(stop_reason);
                completion.usage = usage;
                return finish(completion);
            }
            MessageEvent::HttpError { status, body } => {
                return Err(Error::from_status(status, body));
            }
            MessageEvent::Error { message } => return Err(Error::Sse(message)),
        }
    }

    completion.text = accumulated;
    finish(completion)
}

fn finish(completion: Completion) -> Result<Completion> {
    if completion.text.trim().is_empty() {
        return Err(Error::EmptyResponse);
    }
    Ok(completion)
}

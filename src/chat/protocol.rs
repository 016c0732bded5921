//! Reply body decoding.
//!
//! The assistant endpoint answers either with a server-sent event stream of
//! typed JSON parts, or with a bare text body where every byte is reply text.
//! Both are reduced to the same [`ReplyEvent`] sequence.

use super::TransportError;
use serde::Deserialize;

/// One step of an incoming assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// The endpoint acknowledged the request and began replying.
    Started,
    /// Text to append to the assistant message.
    Delta(String),
    /// The reply is complete.
    Finished,
    /// The exchange failed; carries a human-readable reason for logs.
    Failed(String),
}

impl ReplyEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplyEvent::Finished | ReplyEvent::Failed(_))
    }
}

// ============================================================================
// SSE
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum WirePart {
    Start,
    TextStart,
    TextDelta {
        delta: String,
    },
    Finish,
    Error {
        #[serde(rename = "errorText", default)]
        error_text: String,
    },
    #[serde(other)]
    Other,
}

const DONE_SENTINEL: &str = "[DONE]";

/// Incremental `text/event-stream` parser.
///
/// Bytes are buffered until a full line is available, so events split across
/// network chunks (including mid-codepoint splits) decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ReplyEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                self.process_line(&line, &mut events);
            } else {
                self.line.push(byte);
            }
        }
        events
    }

    /// Flush a trailing line and any undispatched event at end of body.
    pub fn finish(&mut self) -> Vec<ReplyEvent> {
        let mut events = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.process_line(&line, &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, raw: &[u8], events: &mut Vec<ReplyEvent>) {
        let line = String::from_utf8_lossy(raw);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            self.dispatch(events);
        } else if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data.push(value.to_string());
        }
        // Comments (":") and event/id/retry fields carry nothing we use.
    }

    fn dispatch(&mut self, events: &mut Vec<ReplyEvent>) {
        if self.data.is_empty() {
            return;
        }
        let payload = self.data.join("\n");
        self.data.clear();

        if payload.trim() == DONE_SENTINEL {
            events.push(ReplyEvent::Finished);
            return;
        }

        match serde_json::from_str::<WirePart>(&payload) {
            Ok(WirePart::Start | WirePart::TextStart) => events.push(ReplyEvent::Started),
            Ok(WirePart::TextDelta { delta }) => {
                if !delta.is_empty() {
                    events.push(ReplyEvent::Delta(delta));
                }
            }
            Ok(WirePart::Finish) => events.push(ReplyEvent::Finished),
            Ok(WirePart::Error { error_text }) => {
                let err = TransportError::Remote(error_text);
                events.push(ReplyEvent::Failed(err.to_string()));
            }
            Ok(WirePart::Other) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable stream event");
            }
        }
    }
}

// ============================================================================
// Plain text
// ============================================================================

/// Treats every body chunk as reply text, holding back an incomplete UTF-8
/// sequence until the next chunk completes it.
#[derive(Debug, Default)]
pub struct PlainTextDecoder {
    pending: Vec<u8>,
}

impl PlainTextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ReplyEvent> {
        self.pending.extend_from_slice(chunk);
        let text = match std::str::from_utf8(&self.pending) {
            Ok(s) => {
                let text = s.to_string();
                self.pending.clear();
                text
            }
            // Incomplete trailing sequence: emit the valid prefix, keep the rest.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                text
            }
            Err(_) => String::from_utf8_lossy(&std::mem::take(&mut self.pending)).into_owned(),
        };
        delta_events(text)
    }

    pub fn finish(&mut self) -> Vec<ReplyEvent> {
        let rest = std::mem::take(&mut self.pending);
        delta_events(String::from_utf8_lossy(&rest).into_owned())
    }
}

fn delta_events(text: String) -> Vec<ReplyEvent> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![ReplyEvent::Delta(text)]
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Picks the decoder matching the response content type.
#[derive(Debug)]
pub enum ReplyDecoder {
    Sse(SseDecoder),
    PlainText(PlainTextDecoder),
}

impl ReplyDecoder {
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let is_sse = content_type
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/event-stream"))
            .unwrap_or(false);
        if is_sse {
            ReplyDecoder::Sse(SseDecoder::new())
        } else {
            ReplyDecoder::PlainText(PlainTextDecoder::new())
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ReplyEvent> {
        match self {
            ReplyDecoder::Sse(d) => d.feed(chunk),
            ReplyDecoder::PlainText(d) => d.feed(chunk),
        }
    }

    pub fn finish(&mut self) -> Vec<ReplyEvent> {
        match self {
            ReplyDecoder::Sse(d) => d.finish(),
            ReplyDecoder::PlainText(d) => d.finish(),
        }
    }
}

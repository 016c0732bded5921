use super::protocol::{ReplyDecoder, ReplyEvent};
use super::Message;
use futures::stream::{self, Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("Failed to encode chat request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Assistant reported an error: {0}")]
    Remote(String),

    #[error("Reply stream interrupted: {0}")]
    Interrupted(String),
}

/// Body of one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Session identifier, stable for the life of the session.
    pub id: String,
    /// The text the user just sent.
    pub text: String,
    /// Transcript up to and including the new user message.
    pub messages: Vec<Message>,
}

/// A finite, single-consumer sequence of reply events. Ends after the first
/// terminal event.
pub type ReplyStream = Pin<Box<dyn Stream<Item = ReplyEvent> + Send>>;

/// Something that can carry one chat exchange.
pub trait ChatBackend: Send + Sync + 'static {
    /// Dispatch `request` and return its reply stream.
    ///
    /// Errors here mean no reply stream exists at all (connection refused,
    /// non-success status); failures after the stream opens arrive as
    /// [`ReplyEvent::Failed`].
    fn open(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ReplyStream, TransportError>> + Send;
}

/// Open `request` on `backend`, folding a failure to open into a reply
/// stream of one `Failed` event so callers see a single shape.
pub async fn open_replies<B: ChatBackend>(backend: &B, request: ChatRequest) -> ReplyStream {
    match backend.open(request).await {
        Ok(replies) => replies,
        Err(e) => Box::pin(stream::iter([ReplyEvent::Failed(e.to_string())])),
    }
}

// ============================================================================
// Body decoding
// ============================================================================

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: ReplyDecoder,
    pending: VecDeque<ReplyEvent>,
    finished: bool,
}

/// Turn a chunked body into a [`ReplyStream`].
///
/// A read error mid-body becomes `Failed`. A body that ends without a
/// terminal event completes the reply.
pub fn decode_reply<S, B, E>(body: S, decoder: ReplyDecoder) -> ReplyStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder,
        pending: VecDeque::new(),
        finished: false,
    };

    let events = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                if event.is_terminal() {
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((event, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    let decoded = st.decoder.feed(chunk.as_ref());
                    st.pending.extend(decoded);
                }
                Some(Err(e)) => {
                    let err = TransportError::Interrupted(e.to_string());
                    st.pending.push_back(ReplyEvent::Failed(err.to_string()));
                }
                None => {
                    let tail = st.decoder.finish();
                    st.pending.extend(tail);
                    st.pending.push_back(ReplyEvent::Finished);
                }
            }
        }
    });

    Box::pin(events)
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Posts chat turns to the assistant endpoint and streams the reply body.
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_token: Option<SecretString>,
}

impl HttpChatTransport {
    /// `client` should carry a connect timeout only; a reply may legitimately
    /// take as long as the assistant needs.
    pub fn new(client: reqwest::Client, endpoint: Url, api_token: Option<SecretString>) -> Self {
        Self {
            client,
            endpoint,
            api_token,
        }
    }
}

impl ChatBackend for HttpChatTransport {
    async fn open(&self, request: ChatRequest) -> Result<ReplyStream, TransportError> {
        let body = serde_json::to_vec(&request)?;

        let mut builder = self
            .client
            .post(self.endpoint.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .body(body);

        if let Some(token) = &self.api_token {
            builder = builder.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        tracing::debug!(
            status = status.as_u16(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "Chat reply opened"
        );

        let decoder = ReplyDecoder::for_content_type(content_type.as_deref());
        Ok(decode_reply(response.bytes_stream(), decoder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn collect(stream: ReplyStream) -> Vec<ReplyEvent> {
        stream.collect().await
    }

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<&'static [u8], String>> {
        stream::iter(
            parts
                .iter()
                .copied()
                .map(|p| Ok(p.as_bytes()))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_eof_completes_plain_reply() {
        let events = collect(decode_reply(
            chunks(&["Hel", "lo"]),
            ReplyDecoder::for_content_type(Some("text/plain")),
        ))
        .await;
        assert_eq!(
            events,
            vec![
                ReplyEvent::Delta("Hel".into()),
                ReplyEvent::Delta("lo".into()),
                ReplyEvent::Finished,
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_after_terminal_event() {
        let body = chunks(&[
            "data: {\"type\":\"text-delta\",\"delta\":\"a\"}\n\n",
            "data: {\"type\":\"finish\"}\n\ndata: {\"type\":\"text-delta\",\"delta\":\"late\"}\n\n",
            "data: [DONE]\n\n",
        ]);
        let events = collect(decode_reply(
            body,
            ReplyDecoder::for_content_type(Some("text/event-stream")),
        ))
        .await;
        assert_eq!(events, vec![ReplyEvent::Delta("a".into()), ReplyEvent::Finished]);
    }

    #[tokio::test]
    async fn test_read_error_fails_reply() {
        let body = stream::iter(vec![
            Ok::<&'static [u8], String>(&b"partial"[..]),
            Err("connection reset".to_string()),
            Ok(&b"never seen"[..]),
        ]);
        let events = collect(decode_reply(body, ReplyDecoder::for_content_type(None))).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ReplyEvent::Delta("partial".into()));
        match &events[1] {
            ReplyEvent::Failed(reason) => assert!(reason.contains("connection reset")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ChatRequest {
            id: "session-1".into(),
            text: "Hi".into(),
            messages: vec![Message::user("msg-1", "Hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "session-1",
                "text": "Hi",
                "messages": [
                    {"id": "msg-1", "role": "user", "parts": [{"type": "text", "text": "Hi"}]}
                ]
            })
        );
    }
}

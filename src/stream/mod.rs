use serde::{Deserialize, Serialize};

#[cfg(feature = "ssr")]
pub mod relay;

/// Prefix of every event-data line in the backend's chat stream.
pub const DATA_PREFIX: &str = "data: ";
/// Logical end of a chat stream, distinct from transport end-of-data.
pub const DONE_SENTINEL: &str = "[DONE]";
/// Relay marker for a stream torn down through the cancel endpoint.
pub const CANCELLED_SENTINEL: &str = "[CANCELLED]";

/// Structured delta payload. The backend emits either `content` or `text`
/// depending on which generation path produced the fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One incremental piece of a streamed answer, resolved by trial-parse:
/// JSON deltas stay structured, anything else is carried as raw text so a
/// non-JSON payload is never dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Structured(ChatDelta),
    Text(String),
}

impl Fragment {
    pub fn body(&self) -> &str {
        match self {
            Fragment::Structured(delta) => delta
                .content
                .as_deref()
                .or(delta.text.as_deref())
                .unwrap_or(""),
            Fragment::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Fragment(Fragment),
    Done,
}

/// Incremental decoder for the backend's `data: `-framed chat stream.
///
/// Bytes are accumulated in a single buffer that survives across `feed`
/// calls, and only complete lines are decoded. A multi-byte character (or a
/// `data: ` prefix) split across two network chunks therefore stays buffered
/// until its line is complete instead of being decoded piecewise.
///
/// After the `[DONE]` sentinel the parser latches closed and ignores every
/// further byte, including bytes that arrived in the same chunk.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    closed: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consume one chunk of bytes, appending any completed events to `out`.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<StreamEvent>) {
        if self.closed {
            return;
        }
        self.buf.extend_from_slice(chunk);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.emit_line(&line[..line.len() - 1], out);
            if self.closed {
                self.buf.clear();
                return;
            }
        }
    }

    /// Flush a trailing line that was never newline-terminated. Called when
    /// the transport signals end-of-data.
    pub fn finish(&mut self, out: &mut Vec<StreamEvent>) {
        if self.closed {
            return;
        }
        let rest = std::mem::take(&mut self.buf);
        if !rest.is_empty() {
            self.emit_line(&rest, out);
        }
    }

    fn emit_line(&mut self, raw: &[u8], out: &mut Vec<StreamEvent>) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        if payload == DONE_SENTINEL {
            self.closed = true;
            out.push(StreamEvent::Done);
            return;
        }
        match serde_json::from_str::<ChatDelta>(payload) {
            Ok(delta) => out.push(StreamEvent::Fragment(Fragment::Structured(delta))),
            Err(_) => out.push(StreamEvent::Fragment(Fragment::Text(payload.to_string()))),
        }
    }
}

/// Envelope relayed to the browser over this app's own SSE endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayMessage {
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RelayMessage {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            message_type: "content".to_string(),
            content: Some(text.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message_type: "error".to_string(),
            content: Some(message.into()),
        }
    }

    pub fn session_expired() -> Self {
        Self {
            message_type: "session_expired".to_string(),
            content: None,
        }
    }
}

/// Identifier handed to the client after a chat request is stashed, used to
/// attach the EventSource to the matching relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamTicket {
    pub stream_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut SseParser, chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        for chunk in chunks {
            parser.feed(chunk, &mut out);
        }
        parser.finish(&mut out);
        out
    }

    fn bodies(events: &[StreamEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|ev| match ev {
                StreamEvent::Fragment(f) => Some(f.body().to_string()),
                StreamEvent::Done => None,
            })
            .collect()
    }

    #[test]
    fn structured_deltas_parse_in_order() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[b"data: {\"content\":\"hel\"}\ndata: {\"text\":\"lo\"}\n"],
        );
        assert_eq!(bodies(&events), vec!["hel", "lo"]);
    }

    #[test]
    fn sentinel_short_circuits() {
        let mut parser = SseParser::new();
        let mut out = Vec::new();
        parser.feed(
            b"data: {\"content\":\"a\"}\ndata: {\"content\":\"b\"}\ndata: [DONE]\ndata: {\"content\":\"c\"}\n",
            &mut out,
        );
        assert_eq!(bodies(&out), vec!["a", "b"]);
        assert_eq!(out.last(), Some(&StreamEvent::Done));
        assert!(parser.is_closed());

        // Bytes arriving after the sentinel are dropped, even in later chunks.
        parser.feed(b"data: {\"content\":\"d\"}\n", &mut out);
        parser.finish(&mut out);
        assert_eq!(bodies(&out), vec!["a", "b"]);
    }

    #[test]
    fn plain_text_payload_falls_back() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"data: plain text, not json\n"]);
        assert_eq!(
            events,
            vec![StreamEvent::Fragment(Fragment::Text(
                "plain text, not json".to_string()
            ))]
        );
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let payload = "data: {\"content\":\"caf\u{e9}\"}\n";
        let bytes = payload.as_bytes();
        // Split inside the two-byte encoding of 'é'.
        let split = bytes.len() - 4;
        assert!(std::str::from_utf8(&bytes[..split]).is_err());

        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(bodies(&events), vec!["caf\u{e9}"]);
    }

    #[test]
    fn prefix_split_across_chunks() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"da", b"ta: {\"content\":\"x\"}\n"]);
        assert_eq!(bodies(&events), vec!["x"]);
    }

    #[test]
    fn blank_and_foreign_lines_are_ignored() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[b"\n  \nevent: message_start\ndata: {\"content\":\"ok\"}\n\n"],
        );
        assert_eq!(bodies(&events), vec!["ok"]);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"data: {\"content\":\"ok\"}\r\n"]);
        assert_eq!(bodies(&events), vec!["ok"]);
    }

    #[test]
    fn unterminated_trailing_line_is_flushed_on_finish() {
        let mut parser = SseParser::new();
        let mut out = Vec::new();
        parser.feed(b"data: {\"content\":\"tail\"}", &mut out);
        assert!(out.is_empty());
        parser.finish(&mut out);
        assert_eq!(bodies(&out), vec!["tail"]);
    }

    #[test]
    fn structured_delta_without_known_fields_is_empty_body() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"data: {\"citations\":[]}\n"]);
        match &events[0] {
            StreamEvent::Fragment(f) => assert_eq!(f.body(), ""),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

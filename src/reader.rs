use std::collections::VecDeque;

use futures::StreamExt as _;
use tracing::debug;

use crate::errors::{ReadError, SourceError};
use crate::event::StreamEvent;
use crate::source::{ByteStream, SourceHandle};

/// Reassembles physical transport chunks into complete logical records.
///
/// Two framings are accepted, because both appear on the wire depending on the
/// server path: SSE frames whose `data:` lines carry the payload (blank line
/// terminates a frame), and bare newline-delimited JSON records. SSE comment
/// and non-data field lines are skipped.
#[derive(Default)]
pub(crate) struct RecordDecoder {
    buf: Vec<u8>,
    data_lines: Vec<String>,
}

impl RecordDecoder {
    /// Feeds one chunk and returns every record completed by it.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut records = Vec::new();
        while let Some(line) = self.take_line() {
            if let Some(record) = self.accept_line(&line) {
                records.push(record);
            }
        }
        records
    }

    /// Flushes whatever remains once the stream ends.
    ///
    /// Covers a final record that was never newline-terminated and an SSE
    /// frame whose closing blank line was cut off with the connection.
    pub fn finish(&mut self) -> Option<String> {
        let tail = String::from_utf8_lossy(&self.buf).trim_end_matches('\r').to_string();
        self.buf.clear();
        let mut last = self.accept_line(&tail);
        if !self.data_lines.is_empty() {
            last = Some(self.data_lines.join("\n"));
            self.data_lines.clear();
        }
        last
    }

    fn take_line(&mut self) -> Option<String> {
        let newline = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=newline).collect();
        let text = String::from_utf8_lossy(&line[..newline]);
        Some(text.trim_end_matches('\r').to_string())
    }

    fn accept_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            let record = self.data_lines.join("\n");
            self.data_lines.clear();
            return Some(record);
        }
        if let Some(rest) = line.strip_prefix("data:") {
            self.data_lines.push(rest.trim_start().to_string());
            return None;
        }
        if line.starts_with(':')
            || line.starts_with("event:")
            || line.starts_with("id:")
            || line.starts_with("retry:")
        {
            return None;
        }
        // Bare NDJSON record, complete on its own line.
        Some(line.to_string())
    }
}

/// Parses one complete record into a typed event, enforcing the wire
/// invariant that a `result` payload appears exactly on `complete` events.
pub(crate) fn parse_record(record: &str) -> Result<StreamEvent, ReadError> {
    let event: StreamEvent = serde_json::from_str(record)
        .map_err(|e| ReadError::malformed(format!("invalid event JSON: {e}")))?;
    event
        .check_result_coupling()
        .map_err(ReadError::malformed)?;
    Ok(event)
}

/// Pull-based typed view of one verification stream.
///
/// Yields `Ok(StreamEvent)` per parsed record and `Err(ReadError::Malformed)`
/// for records that were dropped; iteration continues after malformed records
/// and ends after a fatal source error. Once a terminal (`complete`/`error`)
/// event is yielded the reader drops the underlying stream itself and yields
/// `None` from then on.
pub struct EventReader {
    stream: Option<ByteStream>,
    decoder: RecordDecoder,
    pending: VecDeque<Result<StreamEvent, ReadError>>,
    consecutive_malformed: u32,
    done: bool,
}

impl EventReader {
    /// Consecutive malformed records tolerated before the stream is treated
    /// as irrecoverably corrupt. Any valid record resets the count.
    pub const MAX_CONSECUTIVE_MALFORMED: u32 = 16;

    /// Wraps an opened source stream.
    pub fn new(handle: SourceHandle) -> Self {
        Self {
            stream: Some(handle.stream),
            decoder: RecordDecoder::default(),
            pending: VecDeque::new(),
            consecutive_malformed: 0,
            done: false,
        }
    }

    /// Waits for and returns the next event or per-record error.
    ///
    /// Returns `None` once the stream is exhausted, after a fatal error has
    /// been yielded, or after a terminal event has been yielded.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, ReadError>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.done {
                return None;
            }

            let next = match self.stream.as_mut() {
                Some(stream) => stream.next().await,
                None => None,
            };
            match next {
                Some(Ok(chunk)) => {
                    let records = self.decoder.push_chunk(&chunk);
                    for record in records {
                        self.enqueue_record(&record);
                        if self.done {
                            break;
                        }
                    }
                }
                Some(Err(err)) => {
                    self.close();
                    return Some(Err(ReadError::Source(err)));
                }
                None => {
                    let tail = self.decoder.finish();
                    self.stream = None;
                    match tail {
                        Some(record) => {
                            self.enqueue_record(&record);
                            self.done = true;
                        }
                        None => {
                            self.done = true;
                        }
                    }
                }
            }
        }
    }

    fn enqueue_record(&mut self, record: &str) {
        match parse_record(record) {
            Ok(event) => {
                self.consecutive_malformed = 0;
                let terminal = event.is_terminal();
                self.pending.push_back(Ok(event));
                if terminal {
                    // Remaining bytes and records are discarded unread.
                    self.close();
                }
            }
            Err(err) => {
                self.consecutive_malformed += 1;
                debug!(
                    consecutive = self.consecutive_malformed,
                    "discarding unparseable record"
                );
                if self.consecutive_malformed >= Self::MAX_CONSECUTIVE_MALFORMED {
                    self.pending.push_back(Err(ReadError::Source(SourceError::protocol(
                        "too many consecutive malformed records",
                    ))));
                    self.close();
                } else {
                    self.pending.push_back(Err(err));
                }
            }
        }
    }

    fn close(&mut self) {
        self.stream = None;
        self.done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AgentId, EventType};
    use futures::stream;

    fn reader_from_chunks(chunks: Vec<Result<bytes::Bytes, SourceError>>) -> EventReader {
        EventReader::new(SourceHandle {
            stream: Box::pin(stream::iter(chunks)),
        })
    }

    fn sse(json: &str) -> bytes::Bytes {
        bytes::Bytes::from(format!("data: {json}\n\n"))
    }

    async fn collect(reader: &mut EventReader) -> Vec<Result<StreamEvent, ReadError>> {
        let mut items = Vec::new();
        while let Some(item) = reader.next_event().await {
            items.push(item);
        }
        items
    }

    #[test]
    fn decoder_reassembles_record_split_across_chunks() {
        let mut decoder = RecordDecoder::default();
        assert!(decoder.push_chunk(b"data: {\"type\":\"st").is_empty());
        let records = decoder.push_chunk(b"art\",\"agent\":\"parser\"}\n\n");
        assert_eq!(records, vec![r#"{"type":"start","agent":"parser"}"#]);
    }

    #[test]
    fn decoder_emits_multiple_records_from_one_chunk() {
        let mut decoder = RecordDecoder::default();
        let records =
            decoder.push_chunk(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n\ndata: {\"c\":3}\n\n");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], r#"{"b":2}"#);
    }

    #[test]
    fn decoder_handles_crlf_and_skips_comments_and_fields() {
        let mut decoder = RecordDecoder::default();
        let records = decoder
            .push_chunk(b": keepalive\r\nevent: message\r\nid: 7\r\ndata: {\"x\":1}\r\n\r\n");
        assert_eq!(records, vec![r#"{"x":1}"#]);
    }

    #[test]
    fn decoder_accepts_bare_ndjson_lines() {
        let mut decoder = RecordDecoder::default();
        let records = decoder.push_chunk(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(records, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn decoder_finish_flushes_unterminated_trailing_record() {
        let mut decoder = RecordDecoder::default();
        assert!(decoder.push_chunk(b"{\"a\":1}").is_empty());
        assert_eq!(decoder.finish(), Some(r#"{"a":1}"#.to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn decoder_finish_flushes_frame_missing_final_blank_line() {
        let mut decoder = RecordDecoder::default();
        assert!(decoder.push_chunk(b"data: {\"a\":1}\n").is_empty());
        assert_eq!(decoder.finish(), Some(r#"{"a":1}"#.to_string()));
    }

    #[tokio::test]
    async fn reader_yields_events_and_ends_on_exhaustion() {
        let mut reader = reader_from_chunks(vec![
            Ok(sse(r#"{"type":"start","agent":"parser"}"#)),
            Ok(sse(r#"{"type":"reasoning","agent":"parser","step":"strategy"}"#)),
        ]);
        let items = collect(&mut reader).await;
        assert_eq!(items.len(), 2);
        let first = items[0].as_ref().expect("event");
        assert_eq!(first.event_type, EventType::Start);
        assert_eq!(first.agent, Some(AgentId::Parser));
    }

    #[tokio::test]
    async fn reader_stops_after_terminal_event_and_drops_the_rest() {
        let mut reader = reader_from_chunks(vec![
            Ok(sse(r#"{"type":"error","message":"upstream exploded"}"#)),
            Ok(sse(r#"{"type":"start","agent":"search"}"#)),
        ]);
        let items = collect(&mut reader).await;
        assert_eq!(items.len(), 1);
        let event = items[0].as_ref().expect("event");
        assert_eq!(event.event_type, EventType::Error);
    }

    #[tokio::test]
    async fn malformed_records_are_reported_but_not_fatal() {
        let mut reader = reader_from_chunks(vec![
            Ok(sse(r#"{"type":"start","agent":"parser"}"#)),
            Ok(sse("this is not json")),
            Ok(sse(r#"{"type":"reasoning","agent":"search"}"#)),
        ]);
        let items = collect(&mut reader).await;
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ReadError::Malformed { .. })));
        assert!(items[2].is_ok());
    }

    #[tokio::test]
    async fn result_payload_on_reasoning_event_is_malformed() {
        let record = serde_json::json!({
            "type": "reasoning",
            "agent": "verdict",
            "result": {
                "verdict_id": "v", "conclusion": "true", "confidence_score": 1.0,
                "summary": "s", "evidence_list": [], "reasoning_chain": []
            }
        })
        .to_string();
        let mut reader = reader_from_chunks(vec![Ok(sse(&record))]);
        let items = collect(&mut reader).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ReadError::Malformed { .. })));
    }

    #[tokio::test]
    async fn consecutive_malformed_records_hit_the_cap() {
        let mut chunks = Vec::new();
        for _ in 0..EventReader::MAX_CONSECUTIVE_MALFORMED {
            chunks.push(Ok(sse("garbage")));
        }
        chunks.push(Ok(sse(r#"{"type":"start","agent":"parser"}"#)));
        let mut reader = reader_from_chunks(chunks);
        let items = collect(&mut reader).await;
        // 15 malformed, then the cap converts the 16th into a fatal error and
        // the valid record behind it is never read.
        assert_eq!(items.len(), EventReader::MAX_CONSECUTIVE_MALFORMED as usize);
        for item in &items[..items.len() - 1] {
            assert!(matches!(item, Err(ReadError::Malformed { .. })));
        }
        assert!(matches!(
            items.last(),
            Some(Err(ReadError::Source(SourceError::Protocol { .. })))
        ));
    }

    #[tokio::test]
    async fn interleaved_valid_records_reset_the_malformed_count() {
        let mut chunks = Vec::new();
        for _ in 0..EventReader::MAX_CONSECUTIVE_MALFORMED - 1 {
            chunks.push(Ok(sse("garbage")));
        }
        chunks.push(Ok(sse(r#"{"type":"reasoning","agent":"search"}"#)));
        chunks.push(Ok(sse("garbage")));
        chunks.push(Ok(sse(r#"{"type":"reasoning","agent":"search"}"#)));
        let mut reader = reader_from_chunks(chunks);
        let items = collect(&mut reader).await;
        let valid = items.iter().filter(|item| item.is_ok()).count();
        assert_eq!(valid, 2);
        assert!(!items.iter().any(|item| matches!(
            item,
            Err(ReadError::Source(_))
        )));
    }

    #[tokio::test]
    async fn source_error_is_fatal_and_ends_iteration() {
        let mut reader = reader_from_chunks(vec![
            Ok(sse(r#"{"type":"start","agent":"parser"}"#)),
            Err(SourceError::transport("connection reset")),
            Ok(sse(r#"{"type":"reasoning","agent":"parser"}"#)),
        ]);
        let items = collect(&mut reader).await;
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[1],
            Err(ReadError::Source(SourceError::Transport { .. }))
        ));
    }

    #[tokio::test]
    async fn terminal_complete_event_parses_with_result() {
        let record = serde_json::json!({
            "type": "complete",
            "result": {
                "verdict_id": "v-1", "conclusion": "false", "confidence_score": 0.92,
                "summary": "refuted", "evidence_list": [], "reasoning_chain": []
            }
        })
        .to_string();
        let mut reader = reader_from_chunks(vec![Ok(sse(&record))]);
        let items = collect(&mut reader).await;
        assert_eq!(items.len(), 1);
        let event = items[0].as_ref().expect("event");
        assert!(event.is_terminal());
        assert!(event.result.is_some());
    }
}

use std::io::{self, BufRead};

use super::artifact::render_artifact;
use super::event::{decode_line, Delta, StreamEvent};
use super::sink::OutputSink;

/// Accumulated state of one completion stream.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamState {
    pub rendered_text: String,
    pub in_artifact: bool,
    pub artifact_raw: String,
    pub artifact_block_index: Option<u64>,
    pub new_message_id: Option<String>,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state. Returns true when `rendered_text` changed.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        let opens_artifact = event.opens_artifact();
        match event {
            StreamEvent::MessageStart { message_id } => {
                if self.new_message_id.is_none() {
                    self.new_message_id = message_id;
                }
                false
            }
            StreamEvent::ContentBlockStart { index, .. } => {
                if opens_artifact {
                    self.in_artifact = true;
                    self.artifact_block_index = index;
                    self.artifact_raw.clear();
                }
                false
            }
            StreamEvent::ContentBlockDelta { delta, .. } => match delta {
                Delta::Text(text) => {
                    self.rendered_text.push_str(&text);
                    true
                }
                Delta::InputJson(json) if self.in_artifact => {
                    self.artifact_raw.push_str(&json);
                    false
                }
                // input for some other tool call, dropped
                Delta::InputJson(_) | Delta::Other => false,
            },
            StreamEvent::ContentBlockStop { index } => {
                if !self.in_artifact || index != self.artifact_block_index {
                    return false;
                }
                let fragment = render_artifact(&self.artifact_raw);
                self.rendered_text.push_str(&fragment);
                self.in_artifact = false;
                self.artifact_raw.clear();
                self.artifact_block_index = None;
                true
            }
        }
    }

    /// Decode and fold one raw line.
    pub fn apply_line(&mut self, line: &str) -> bool {
        match decode_line(line) {
            Some(event) => self.apply(event),
            None => false,
        }
    }
}

/// Split a response body into lines, dropping any that are not UTF-8.
///
/// A trailing `\r` is stripped like `BufRead::lines` does. Read errors
/// are passed through.
pub fn body_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').filter_map(|line| match line {
        Ok(mut bytes) => {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            match String::from_utf8(bytes) {
                Ok(line) => Some(Ok(line)),
                Err(e) => {
                    tracing::trace!("ignoring non-UTF-8 stream line: {}", e);
                    None
                }
            }
        }
        Err(e) => Some(Err(e)),
    })
}

/// Run `lines` through the state machine, rendering on every change.
///
/// Lines that change nothing still tick the sink so a throttled redraw
/// can catch up. Stops at the first transport error; the sink is not
/// finalized here.
pub fn drive<I>(lines: I, state: &mut StreamState, sink: &mut dyn OutputSink) -> anyhow::Result<()>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    for line in lines {
        let line = line?;
        if state.apply_line(&line) {
            sink.render(&state.rendered_text)?;
        } else {
            sink.tick(&state.rendered_text)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::artifact::ARTIFACT_PARSE_ERROR;
    use crate::stream::sink::RawSink;

    fn text(index: u64, text: &str) -> StreamEvent {
        StreamEvent::ContentBlockDelta {
            index: Some(index),
            delta: Delta::Text(text.to_string()),
        }
    }

    fn json(index: u64, json: &str) -> StreamEvent {
        StreamEvent::ContentBlockDelta {
            index: Some(index),
            delta: Delta::InputJson(json.to_string()),
        }
    }

    fn start_tool(index: u64, name: &str) -> StreamEvent {
        StreamEvent::ContentBlockStart {
            index: Some(index),
            block_type: "tool_use".to_string(),
            tool_name: Some(name.to_string()),
        }
    }

    fn stop(index: u64) -> StreamEvent {
        StreamEvent::ContentBlockStop { index: Some(index) }
    }

    #[test]
    fn test_end_to_end_text() {
        let mut state = StreamState::new();
        state.apply(StreamEvent::MessageStart {
            message_id: Some("m1".to_string()),
        });
        assert!(state.apply(text(0, "Hello ")));
        assert!(state.apply(text(0, "world")));
        assert!(!state.apply(stop(0)));

        assert_eq!(state.rendered_text, "Hello world");
        assert_eq!(state.new_message_id.as_deref(), Some("m1"));
        assert!(!state.in_artifact);
    }

    #[test]
    fn test_first_message_id_wins() {
        let mut state = StreamState::new();
        state.apply(StreamEvent::MessageStart { message_id: None });
        state.apply(StreamEvent::MessageStart {
            message_id: Some("first".to_string()),
        });
        state.apply(StreamEvent::MessageStart {
            message_id: Some("second".to_string()),
        });
        assert_eq!(state.new_message_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_ignored_lines_leave_state_unchanged() {
        let mut state = StreamState::new();
        state.apply(start_tool(1, "artifacts"));
        state.apply(json(1, "{\"title\""));
        let before = state.clone();

        for line in [
            "",
            "event: completion",
            "data: {broken",
            r#"data: {"type": "ping"}"#,
            r#"data: {"type": "message_stop"}"#,
        ] {
            assert!(!state.apply_line(line));
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_artifact_fragments() {
        let mut state = StreamState::new();
        state.apply(text(0, "Here you go:"));
        assert!(!state.apply(start_tool(1, "artifacts")));
        assert!(state.in_artifact);
        assert_eq!(state.artifact_block_index, Some(1));

        assert!(!state.apply(json(1, "{\"tit")));
        assert!(!state.apply(json(1, "le\":\"X\",\"content\":\"Y\"}")));
        assert!(state.apply(stop(1)));

        assert!(state.rendered_text.starts_with("Here you go:"));
        assert!(state.rendered_text.ends_with("### X\n\n```\nY\n```\n\n"));
        assert!(!state.in_artifact);
        assert!(state.artifact_raw.is_empty());
        assert_eq!(state.artifact_block_index, None);
    }

    #[test]
    fn test_stop_for_other_index_keeps_artifact_open() {
        let mut state = StreamState::new();
        state.apply(start_tool(2, "artifacts"));
        state.apply(json(2, "{\"title\": \"A\""));

        assert!(!state.apply(stop(0)));
        assert!(!state.apply(StreamEvent::ContentBlockStop { index: None }));
        assert!(state.in_artifact);
        assert_eq!(state.artifact_raw, "{\"title\": \"A\"");
        assert_eq!(state.artifact_block_index, Some(2));

        state.apply(json(2, "}"));
        assert!(state.apply(stop(2)));
        assert!(state.rendered_text.contains("### A"));
    }

    #[test]
    fn test_malformed_artifact_resets() {
        let mut state = StreamState::new();
        state.apply(start_tool(1, "artifacts"));
        state.apply(json(1, "{\"title\": "));
        assert!(state.apply(stop(1)));

        assert_eq!(state.rendered_text, ARTIFACT_PARSE_ERROR);
        assert!(!state.in_artifact);
        assert!(state.artifact_raw.is_empty());
        assert_eq!(state.artifact_block_index, None);
    }

    #[test]
    fn test_other_tool_input_is_dropped() {
        let mut state = StreamState::new();
        state.apply(start_tool(1, "repl"));
        assert!(!state.in_artifact);
        assert!(!state.apply(json(1, "{\"code\": \"print(1)\"}")));
        assert!(!state.apply(stop(1)));

        assert!(state.rendered_text.is_empty());
        assert!(state.artifact_raw.is_empty());
    }

    #[test]
    fn test_text_inside_artifact_block_still_renders() {
        let mut state = StreamState::new();
        state.apply(start_tool(1, "artifacts"));
        assert!(state.apply(text(1, "note")));
        assert_eq!(state.rendered_text, "note");
        assert!(state.in_artifact);
    }

    #[test]
    fn test_drive_renders_concatenation() -> anyhow::Result<()> {
        let lines = [
            r#"data: {"type": "message_start", "message": {"uuid": "m1"}}"#,
            "",
            r#"data: {"type": "content_block_start", "index": 0, "content_block": {"type": "text"}}"#,
            r#"data: {"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "a"}}"#,
            ": keepalive",
            r#"data: {"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "b"}}"#,
            r#"data: {"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "c"}}"#,
            r#"data: {"type": "content_block_stop", "index": 0}"#,
        ];

        let mut state = StreamState::new();
        let mut sink = RawSink::new(Vec::new(), None);
        drive(
            lines.iter().map(|line| Ok(line.to_string())),
            &mut state,
            &mut sink,
        )?;

        assert_eq!(state.rendered_text, "abc");
        assert_eq!(state.new_message_id.as_deref(), Some("m1"));
        assert_eq!(String::from_utf8(sink.into_inner())?, "abc");
        Ok(())
    }

    #[derive(Default)]
    struct Recorder {
        renders: Vec<String>,
        ticks: usize,
    }

    impl OutputSink for Recorder {
        fn render(&mut self, buffer: &str) -> anyhow::Result<()> {
            self.renders.push(buffer.to_string());
            Ok(())
        }

        fn tick(&mut self, _buffer: &str) -> anyhow::Result<()> {
            self.ticks += 1;
            Ok(())
        }

        fn finalize(&mut self, _buffer: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_drive_ticks_on_unchanged_lines() -> anyhow::Result<()> {
        let lines = [
            r#"data: {"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Intro"}}"#,
            r#"data: {"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "name": "artifacts"}}"#,
            r#"data: {"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"title\""}}"#,
            r#"data: {"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": ": \"T\"}"}}"#,
            ": keepalive",
        ];

        let mut state = StreamState::new();
        let mut sink = Recorder::default();
        drive(lines.iter().map(|line| Ok(line.to_string())), &mut state, &mut sink)?;

        assert_eq!(sink.renders, vec!["Intro".to_string()]);
        assert_eq!(sink.ticks, 4);
        Ok(())
    }

    #[test]
    fn test_body_lines_skips_invalid_utf8() -> anyhow::Result<()> {
        let body: &[u8] = b"data: one\r\n: noise \xff\xfe\ndata: two\n\ndata: three";
        let lines = body_lines(body).collect::<io::Result<Vec<_>>>()?;
        assert_eq!(lines, vec!["data: one", "data: two", "", "data: three"]);
        Ok(())
    }

    #[test]
    fn test_drive_stops_on_transport_error() {
        let lines: Vec<io::Result<String>> = vec![
            Ok(r#"data: {"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "partial"}}"#.to_string()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(r#"data: {"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "never"}}"#.to_string()),
        ];

        let mut state = StreamState::new();
        let mut sink = RawSink::new(Vec::new(), None);
        assert!(drive(lines, &mut state, &mut sink).is_err());
        assert_eq!(state.rendered_text, "partial");
    }
}

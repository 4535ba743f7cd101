//! Newline-delimited JSON framing over an arbitrary byte stream.
//!
//! Bytes are appended as they arrive. Extraction scans the buffer line by
//! line and returns the first line that parses as a JSON object; that line
//! and everything before it are dropped, everything after it stays. The
//! trailing segment is tried too, so a response missing its final newline
//! is still delivered.

use serde_json::Value;

/// Accumulates target output and yields complete JSON messages.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete JSON object, if the buffer holds one.
    pub fn next_message(&mut self) -> Option<Value> {
        let mut start = 0;
        while start < self.buffer.len() {
            let end = self.buffer[start..]
                .iter()
                .position(|byte| *byte == b'\n')
                .map_or(self.buffer.len(), |offset| start + offset);

            if let Some(message) = parse_object(&self.buffer[start..end]) {
                let consumed = (end + 1).min(self.buffer.len());
                self.buffer.drain(..consumed);
                return Some(message);
            }
            start = end + 1;
        }
        None
    }

    /// Bytes buffered but not yet consumed.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn parse_object(line: &[u8]) -> Option<Value> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    serde_json::from_slice::<Value>(line)
        .ok()
        .filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_split_across_chunks() {
        let mut framer = LineFramer::new();
        framer.extend(br#"{"jsonrpc":"2.0","id":1,"res"#);
        assert_eq!(framer.next_message(), None);
        framer.extend(b"ult\":{}}\n");
        assert_eq!(
            framer.next_message(),
            Some(json!({"jsonrpc": "2.0", "id": 1, "result": {}}))
        );
        assert_eq!(framer.next_message(), None);
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn later_lines_are_retained() {
        let mut framer = LineFramer::new();
        framer.extend(b"{\"id\":1,\"result\":1}\n{\"id\":2,\"result\":2}\n{\"id\":3");
        assert_eq!(framer.next_message().map(|m| m["id"].clone()), Some(json!(1)));
        assert_eq!(framer.next_message().map(|m| m["id"].clone()), Some(json!(2)));
        assert_eq!(framer.next_message(), None);
        framer.extend(b",\"result\":3}\n");
        assert_eq!(framer.next_message().map(|m| m["id"].clone()), Some(json!(3)));
    }

    #[test]
    fn noise_before_a_message_is_discarded() {
        let mut framer = LineFramer::new();
        framer.extend(b"starting agent...\n\n{\"id\":9,\"result\":null}\n");
        assert_eq!(framer.next_message().map(|m| m["id"].clone()), Some(json!(9)));
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn unterminated_complete_object_is_delivered() {
        let mut framer = LineFramer::new();
        framer.extend(b"{\"id\":4,\"result\":{}}");
        assert!(framer.next_message().is_some());
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn scalars_are_not_messages() {
        let mut framer = LineFramer::new();
        framer.extend(b"42\n\"hello\"\n");
        assert_eq!(framer.next_message(), None);
    }

    #[test]
    fn multibyte_split_is_reassembled() {
        let line = "{\"id\":1,\"result\":\"héllo\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).expect("multibyte lead") + 1;
        let mut framer = LineFramer::new();
        framer.extend(&line[..split]);
        assert_eq!(framer.next_message(), None);
        framer.extend(&line[split..]);
        assert_eq!(
            framer.next_message().map(|m| m["result"].clone()),
            Some(json!("héllo"))
        );
    }
}

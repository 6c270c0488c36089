//! Line-oriented decoding of upstream SSE byte streams.

/// Accumulates raw bytes and yields complete `data:` payloads.
///
/// Bytes are only decoded once a full line is buffered, so multi-byte UTF-8
/// characters split across network reads survive intact.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return the `data:` payloads of every completed line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(data) = data_payload(line.trim()) {
                payloads.push(data.to_string());
            }
        }
        payloads
    }

    /// Payload of a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);
        data_payload(line.trim()).map(String::from)
    }
}

/// Extract the payload of a `data:` line. Comments, `event:` lines and blanks yield `None`.
fn data_payload(line: &str) -> Option<&str> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    line.strip_prefix("data:").map(str::trim_start)
}

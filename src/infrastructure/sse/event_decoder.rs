/// Incremental decoder for a `text/event-stream` body.
///
/// Network reads may split an event anywhere, including inside a multi-byte
/// UTF-8 sequence, so bytes are buffered until a blank line closes the event.
/// Only `data:` fields are surfaced; comments (keep-alives) and other fields
/// are skipped. Multiple `data:` lines in one event are joined with `\n`.
#[derive(Debug, Default)]
pub struct SseEventDecoder {
    buffer: Vec<u8>,
}

impl SseEventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the data payloads of every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((end, delimiter_len)) = find_event_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + delimiter_len).take(end).collect();
            if let Some(data) = parse_event(&String::from_utf8_lossy(&raw)) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flushes a trailing event left without its closing blank line.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        parse_event(&String::from_utf8_lossy(&raw))
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_event(raw: &str) -> Option<String> {
    let data_lines: Vec<&str> = raw
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

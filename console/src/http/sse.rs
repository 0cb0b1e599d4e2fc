//! Server-Sent Events framing for the log stream endpoint

use tracing::debug;

/// Splits a byte stream into SSE `data` payloads.
///
/// Lines may arrive split across chunks. A blank line dispatches the
/// accumulated `data:` lines joined with `\n`; `:` comment lines and other
/// fields are skipped. An event carrying a data line that is not UTF-8 is
/// dropped whole when it dispatches.
#[derive(Debug, Default)]
pub struct SseDataParser {
    line_buffer: Vec<u8>,
    data_lines: Vec<String>,
    malformed: bool,
}

impl SseDataParser {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut payloads = Vec::new();
        for byte in chunk {
            if *byte == b'\n' {
                let line = std::mem::take(&mut self.line_buffer);
                self.process_line(&line, &mut payloads);
            } else {
                self.line_buffer.push(*byte);
            }
        }
        payloads
    }

    /// Flush whatever is buffered once the body ends
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.line_buffer.is_empty() {
            let line = std::mem::take(&mut self.line_buffer);
            self.process_line(&line, &mut payloads);
        }
        self.flush_event(&mut payloads);
        payloads
    }

    fn process_line(&mut self, line: &[u8], payloads: &mut Vec<String>) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.is_empty() {
            self.flush_event(payloads);
            return;
        }

        if line.starts_with(b":") {
            return;
        }

        // A field name with no colon has an empty value
        if line == b"data" {
            self.data_lines.push(String::new());
            return;
        }

        if let Some(mut data) = line.strip_prefix(b"data:") {
            if data.starts_with(b" ") {
                data = &data[1..];
            }
            match std::str::from_utf8(data) {
                Ok(data) => self.data_lines.push(data.to_owned()),
                Err(error) => {
                    debug!("Dropping SSE event with invalid UTF-8: {}", error);
                    self.malformed = true;
                }
            }
        }
    }

    fn flush_event(&mut self, payloads: &mut Vec<String>) {
        if !self.malformed && !self.data_lines.is_empty() {
            payloads.push(self.data_lines.join("\n"));
        }
        self.data_lines.clear();
        self.malformed = false;
    }
}

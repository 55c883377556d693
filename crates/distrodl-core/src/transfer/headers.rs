//! Incremental parsing of response header lines delivered by libcurl.
//!
//! Curl hands over every header block, including those of redirects it
//! follows; only the last block describes the body that gets written.

/// Status and length of the most recent response header block.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResponseHead {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
    /// Set once a final (non-1xx, non-3xx) header block has been fully received.
    pub complete: bool,
}

impl ResponseHead {
    pub fn feed_line(&mut self, raw: &[u8]) {
        let line = match std::str::from_utf8(raw) {
            Ok(s) => s.trim(),
            Err(_) => return,
        };
        if line.is_empty() {
            if let Some(code) = self.status {
                if !(100..200).contains(&code) && !(300..400).contains(&code) {
                    self.complete = true;
                }
            }
            return;
        }
        if line.starts_with("HTTP/") {
            self.status = parse_status_line(line);
            self.content_length = None;
            self.complete = false;
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                self.content_length = value.trim().parse::<u64>().ok();
            }
        }
    }
}

fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse::<u32>().ok()
}

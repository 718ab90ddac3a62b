use bytes::BytesMut;

use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads the `data` payloads of server-sent events from a chunk stream.
///
/// Gemini terminates events with `\r\n\r\n`, other servers with `\n\n`;
/// line endings are normalized to `\n` as bytes arrive. Bytes are only
/// decoded once a whole event is buffered, so a character may be split
/// across chunks.
pub struct Sse {
    buf: BytesMut,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: BytesMut::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::Chunks)?
            else {
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
            if self.buf.contains(&b'\r') {
                self.normalize_line_endings();
            }
        }
    }

    /// Replaces every buffered `\r\n` with `\n`. A trailing `\r` is kept
    /// until its line feed arrives.
    fn normalize_line_endings(&mut self) {
        let mut normalized = BytesMut::with_capacity(self.buf.len());
        let mut rest = &self.buf[..];
        while let Some(idx) = rest.windows(2).position(|w| w == b"\r\n") {
            normalized.extend_from_slice(&rest[..idx]);
            rest = &rest[idx + 1..];
        }
        normalized.extend_from_slice(rest);
        self.buf = normalized;
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            let Some(eol_idx) =
                self.buf.windows(2).position(|w| w == b"\n\n")
            else {
                return Ok(None);
            };
            let block = self.buf.split_to(eol_idx + 2);
            let Ok(block) = str::from_utf8(&block[..eol_idx]) else {
                return Err(Error::InvalidPayload);
            };

            // Multi-line `data` fields are joined with line feeds, comment
            // lines are skipped. Other field names are not supported.
            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.starts_with(':') {
                    continue;
                }
                let Some(value) = line.strip_prefix("data:") else {
                    return Err(Error::InvalidPayload);
                };
                let value = value.strip_prefix(' ').unwrap_or(value);
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            // A block made only of comments carries no event.
            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}

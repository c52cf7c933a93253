// NETCONF message framing (RFC 6242).
//
// `base:1.0` sessions delimit messages with `]]>]]>`; `base:1.1` sessions
// use chunked framing (`\n#<len>\n<data>` ... `\n##\n`). The hello
// exchange is always end-of-message framed.

use crate::error::Error;

/// End-of-message delimiter for `base:1.0` framing.
pub const EOM: &str = "]]>]]>";

/// Chunk headers longer than this many digits are treated as corrupt.
const MAX_CHUNK_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    EndOfMessage,
    Chunked,
}

impl Framing {
    /// Wrap a complete XML message for the wire.
    pub fn encode(self, message: &str) -> String {
        match self {
            Self::EndOfMessage => format!("{message}\n{EOM}"),
            Self::Chunked => format!("\n#{}\n{message}\n##\n", message.len()),
        }
    }
}

/// Incremental decoder: feed it channel data, pull out whole messages.
#[derive(Debug)]
pub struct Decoder {
    framing: Framing,
    buf: Vec<u8>,
    partial: Vec<u8>,
}

impl Decoder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buf: Vec::new(),
            partial: Vec::new(),
        }
    }

    /// Switch framing after the hello exchange.
    pub fn set_framing(&mut self, framing: Framing) {
        self.framing = framing;
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Next complete message, or `None` if more data is needed.
    pub fn next_message(&mut self) -> Result<Option<String>, Error> {
        match self.framing {
            Framing::EndOfMessage => self.next_eom(),
            Framing::Chunked => self.next_chunked(),
        }
    }

    fn next_eom(&mut self) -> Result<Option<String>, Error> {
        let delimiter = EOM.as_bytes();
        let Some(pos) = self
            .buf
            .windows(delimiter.len())
            .position(|w| w == delimiter)
        else {
            return Ok(None);
        };

        let message: Vec<u8> = self.buf.drain(..pos + delimiter.len()).take(pos).collect();
        String::from_utf8(message)
            .map(Some)
            .map_err(|e| Error::Framing(format!("message is not UTF-8: {e}")))
    }

    /// Drop whitespace a server left between messages, e.g. the newline
    /// after the hello's `]]>]]>`. A `\n` that may open the next chunk
    /// header is kept.
    fn skip_interframe_whitespace(&mut self) {
        let Some(first) = self.buf.iter().position(|b| !b.is_ascii_whitespace()) else {
            let keep = usize::from(self.buf.last() == Some(&b'\n'));
            self.buf.drain(..self.buf.len() - keep);
            return;
        };
        let opens_header = first > 0 && self.buf[first] == b'#' && self.buf[first - 1] == b'\n';
        let drop = if opens_header { first - 1 } else { first };
        self.buf.drain(..drop);
    }

    fn next_chunked(&mut self) -> Result<Option<String>, Error> {
        loop {
            if self.partial.is_empty() {
                self.skip_interframe_whitespace();
            }
            // Smallest complete header is "\n#1\n" or the end marker "\n##\n".
            if self.buf.len() < 4 {
                return Ok(None);
            }
            if !self.buf.starts_with(b"\n#") {
                return Err(Error::Framing("expected chunk header".into()));
            }

            if self.buf.starts_with(b"\n##\n") {
                self.buf.drain(..4);
                let message = std::mem::take(&mut self.partial);
                return String::from_utf8(message)
                    .map(Some)
                    .map_err(|e| Error::Framing(format!("message is not UTF-8: {e}")));
            }

            let Some(digits_len) = self.buf[2..].iter().position(|b| *b == b'\n') else {
                if self.buf.len() > 2 + MAX_CHUNK_DIGITS {
                    return Err(Error::Framing("chunk header too long".into()));
                }
                return Ok(None);
            };

            let size = std::str::from_utf8(&self.buf[2..2 + digits_len])
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Framing("invalid chunk size".into()))?;

            let start = 2 + digits_len + 1;
            if self.buf.len() < start + size {
                return Ok(None);
            }

            self.partial.extend_from_slice(&self.buf[start..start + size]);
            self.buf.drain(..start + size);
        }
    }
}

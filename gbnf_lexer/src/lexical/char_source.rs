//! UTF-8 character source with one code point of lookahead

use std::io::{self, BufReader, Bytes, Read};

/// Failure to produce the next code point
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 sequence at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("read failed at byte {offset}: {message}")]
    Io { offset: usize, message: String },
}

type Decoded = Result<Option<char>, DecodeError>;

/// Decodes code points from any byte reader.
///
/// `Ok(None)` is end of input. A decode failure is sticky: once reported,
/// every later `peek` and `next` reports it again.
pub struct CharSource<R: Read> {
    bytes: Bytes<BufReader<R>>,
    lookahead: Option<Decoded>,
    failure: Option<DecodeError>,
    offset: usize,
}

impl<R: Read> CharSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: BufReader::new(reader).bytes(),
            lookahead: None,
            failure: None,
            offset: 0,
        }
    }

    /// Look at the next code point without consuming it
    pub fn peek(&mut self) -> Decoded {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if self.lookahead.is_none() {
            let decoded = self.decode();
            self.lookahead = Some(decoded);
        }
        match &self.lookahead {
            Some(decoded) => decoded.clone(),
            None => Ok(None),
        }
    }

    /// Consume the next code point
    pub fn next_char(&mut self) -> Decoded {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        match self.lookahead.take() {
            Some(decoded) => decoded,
            None => self.decode(),
        }
    }

    /// Bytes pulled from the underlying reader so far
    pub fn bytes_read(&self) -> usize {
        self.offset
    }

    fn decode(&mut self) -> Decoded {
        let result = self.decode_code_point();
        if let Err(error) = &result {
            self.failure = Some(error.clone());
        }
        result
    }

    fn decode_code_point(&mut self) -> Decoded {
        let start = self.offset;
        let Some(lead) = self.read_byte()? else {
            return Ok(None);
        };

        let width = match lead {
            0x00..=0x7F => return Ok(Some(char::from(lead))),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(DecodeError::InvalidUtf8 { offset: start }),
        };

        let mut buffer = [lead, 0, 0, 0];
        for slot in buffer.iter_mut().take(width).skip(1) {
            match self.read_byte()? {
                Some(byte) if byte & 0xC0 == 0x80 => *slot = byte,
                _ => return Err(DecodeError::InvalidUtf8 { offset: start }),
            }
        }

        // from_utf8 rejects overlong forms and surrogates
        std::str::from_utf8(&buffer[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or(DecodeError::InvalidUtf8 { offset: start })
    }

    fn read_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        loop {
            match self.bytes.next() {
                None => return Ok(None),
                Some(Ok(byte)) => {
                    self.offset += 1;
                    return Ok(Some(byte));
                }
                Some(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Some(Err(e)) => {
                    return Err(DecodeError::Io {
                        offset: self.offset,
                        message: e.to_string(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_peek_is_idempotent() {
        let mut source = CharSource::new("ab".as_bytes());

        assert_eq!(source.peek(), Ok(Some('a')));
        assert_eq!(source.peek(), Ok(Some('a')));
        assert_eq!(source.next_char(), Ok(Some('a')));
        assert_eq!(source.next_char(), Ok(Some('b')));
        assert_eq!(source.peek(), Ok(None));
        assert_eq!(source.next_char(), Ok(None));
        assert_eq!(source.next_char(), Ok(None));
    }

    #[test]
    fn test_decodes_multibyte_code_points() {
        let mut source = CharSource::new("é→𝄞".as_bytes());

        assert_eq!(source.next_char(), Ok(Some('é')));
        assert_eq!(source.next_char(), Ok(Some('→')));
        assert_eq!(source.next_char(), Ok(Some('𝄞')));
        assert_eq!(source.bytes_read(), 9);
    }

    #[test]
    fn test_invalid_byte_is_sticky() {
        let mut source = CharSource::new(&[b'a', 0xFF, b'b'][..]);

        assert_eq!(source.next_char(), Ok(Some('a')));
        assert_matches!(source.peek(), Err(DecodeError::InvalidUtf8 { offset: 1 }));
        assert_matches!(source.next_char(), Err(DecodeError::InvalidUtf8 { .. }));
        assert_matches!(source.next_char(), Err(DecodeError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_truncated_sequence_is_rejected() {
        let mut source = CharSource::new(&[0xE2, 0x86][..]);
        assert_matches!(source.next_char(), Err(DecodeError::InvalidUtf8 { offset: 0 }));
    }

    #[test]
    fn test_overlong_encoding_is_rejected() {
        let mut source = CharSource::new(&[0xE0, 0x80, 0xAF][..]);
        assert_matches!(source.next_char(), Err(DecodeError::InvalidUtf8 { .. }));
    }
}

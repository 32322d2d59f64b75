//! Byte source adapter.
//!
//! The lexer consumes its input one byte at a time and occasionally needs to
//! push the last byte back (the DFA decides most token boundaries only after
//! reading one byte too far). `ByteReader` wraps any [`Read`] with exactly
//! that interface, plus a line counter for diagnostics.

use std::io::{self, Read};

/// Single-byte pull reader with a one-byte pushback slot.
pub struct ByteReader<R> {
    inner: R,
    pushback: Option<u8>,
    line: u32,
}

impl<R: Read> ByteReader<R> {
    /// Creates a reader over the given byte source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pushback: None,
            line: 1,
        }
    }

    /// Returns the next byte, or `None` at end of input.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            if b == b'\n' {
                self.line += 1;
            }
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    if buf[0] == b'\n' {
                        self.line += 1;
                    }
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Pushes one byte back; the next `next_byte` call returns it again.
    ///
    /// The slot holds a single byte; pushing twice without reading in
    /// between would lose input, so the caller never does that.
    pub fn unread(&mut self, byte: u8) {
        debug_assert!(self.pushback.is_none(), "pushback slot already occupied");
        if byte == b'\n' {
            self.line -= 1;
        }
        self.pushback = Some(byte);
    }

    /// The 1-based line number of the most recently read byte.
    pub fn line(&self) -> u32 {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_read() {
        let mut r = ByteReader::new("ab".as_bytes());
        assert_eq!(r.next_byte().unwrap(), Some(b'a'));
        assert_eq!(r.next_byte().unwrap(), Some(b'b'));
        assert_eq!(r.next_byte().unwrap(), None);
        assert_eq!(r.next_byte().unwrap(), None);
    }

    #[test]
    fn test_pushback() {
        let mut r = ByteReader::new("xy".as_bytes());
        assert_eq!(r.next_byte().unwrap(), Some(b'x'));
        r.unread(b'x');
        assert_eq!(r.next_byte().unwrap(), Some(b'x'));
        assert_eq!(r.next_byte().unwrap(), Some(b'y'));
    }

    #[test]
    fn test_line_tracking() {
        let mut r = ByteReader::new("a\nb\n".as_bytes());
        assert_eq!(r.line(), 1);
        r.next_byte().unwrap();
        assert_eq!(r.line(), 1);
        r.next_byte().unwrap();
        assert_eq!(r.line(), 2);
        let b = r.next_byte().unwrap().unwrap();
        r.unread(b);
        assert_eq!(r.line(), 2);
        r.next_byte().unwrap();
        assert_eq!(r.line(), 2);
    }
}

//! Source decoding for FlexScript.
//!
//! Scripts arrive as `&str`, so decoding only has to split the input into
//! characters while keeping track of where we are for error reporting.

use core::fmt;
use core::str::Chars;

pub const START_LINE: usize = 1;
pub const START_COLUMN: usize = 1;

/// A human-readable position within a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        // Prefer human-readable locations.
        Self {
            line: START_LINE,
            column: START_COLUMN,
        }
    }
}

impl Location {
    #[inline]
    pub fn next_line(&mut self) {
        self.line += 1;
        self.column = START_COLUMN;
    }

    #[inline]
    pub fn next_column(&mut self) {
        self.column += 1;
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A decoder turns a script's source into a stream of characters, tracking
/// the location of the next character to be produced.
pub trait Decoder: Iterator<Item = char> {
    /// Peeks ahead one character without consuming it. If the stream has
    /// ended, returns `None`.
    fn peek(&self) -> Option<char>;

    /// Peeks ahead two characters, returning the second one.
    fn peek_second(&self) -> Option<char>;

    /// Returns the location of the next character in the stream.
    fn location(&self) -> Location;

    /// Returns whether or not we have hit the end of the stream.
    fn eof(&self) -> bool {
        self.peek().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Utf8Decoder<'a> {
    chars: Chars<'a>,
    location: Location,
}

impl<'a> From<&'a str> for Utf8Decoder<'a> {
    fn from(s: &'a str) -> Self {
        Self {
            chars: s.chars(),
            location: Location::default(),
        }
    }
}

impl<'a> Iterator for Utf8Decoder<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let ch = self.chars.next()?;
        // Exclusively count newline characters as newlines.
        if ch == '\n' {
            self.location.next_line();
        } else if ch != '\r' {
            self.location.next_column();
        }
        Some(ch)
    }
}

impl<'a> Decoder for Utf8Decoder<'a> {
    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    #[inline]
    fn peek_second(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        let _ = chars.next();
        chars.next()
    }

    #[inline]
    fn location(&self) -> Location {
        self.location
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut decoder = Utf8Decoder::from("ab\ncé\r\nd");
        assert_eq!(decoder.location(), Location { line: 1, column: 1 });
        assert_eq!(decoder.next(), Some('a'));
        assert_eq!(decoder.next(), Some('b'));
        assert_eq!(decoder.location(), Location { line: 1, column: 3 });
        assert_eq!(decoder.next(), Some('\n'));
        assert_eq!(decoder.location(), Location { line: 2, column: 1 });
        assert_eq!(decoder.next(), Some('c'));
        assert_eq!(decoder.peek(), Some('é'));
        assert_eq!(decoder.peek_second(), Some('\r'));
        assert_eq!(decoder.next(), Some('é'));
        assert_eq!(decoder.next(), Some('\r'));
        assert_eq!(decoder.location(), Location { line: 2, column: 3 });
        assert_eq!(decoder.next(), Some('\n'));
        assert_eq!(decoder.next(), Some('d'));
        assert!(decoder.eof());
        assert_eq!(decoder.next(), None);
    }
}

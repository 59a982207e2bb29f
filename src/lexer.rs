//! Small tokenizer over HEAD text
//!
//! A [`Cursor`] is an immutable `(text, position)` pair. Every scanning step
//! returns a new cursor instead of mutating shared state, so a failed match
//! leaves the caller's position untouched.

/// Immutable scanning position within a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `text`
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset into the original text
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Text not yet consumed
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Next character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(self, bytes: usize) -> Self {
        Self {
            text: self.text,
            pos: self.pos + bytes,
        }
    }

    /// Skip any amount of whitespace, including none
    pub fn skip_whitespace(self) -> Self {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len())
    }

    /// Consume `literal` exactly at the current position
    pub fn literal(self, literal: &str) -> Option<Self> {
        self.rest()
            .starts_with(literal)
            .then(|| self.advance(literal.len()))
    }

    /// Consume one or more word characters (alphanumerics and `_`)
    pub fn identifier(self) -> Option<(&'a str, Self)> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_word_char(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        (len > 0).then(|| (&rest[..len], self.advance(len)))
    }

    /// Consume one or more ASCII digits
    pub fn digits(self) -> Option<(&'a str, Self)> {
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        (len > 0).then(|| (&rest[..len], self.advance(len)))
    }

    /// Consume exactly `n` characters, which may include line breaks
    pub fn chars(self, n: usize) -> Option<(&'a str, Self)> {
        let rest = self.rest();
        if n == 0 {
            return Some(("", self));
        }
        let mut indices = rest.char_indices().skip(n - 1);
        let (last, c) = indices.next()?;
        let len = last + c.len_utf8();
        Some((&rest[..len], self.advance(len)))
    }

    /// Consume everything up to the next whitespace character
    pub fn token(self) -> Option<(&'a str, Self)> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| c.is_whitespace())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        (len > 0).then(|| (&rest[..len], self.advance(len)))
    }

    /// Move to the next occurrence of `needle`, leaving the cursor on it
    pub fn find(self, needle: &str) -> Option<Self> {
        self.rest().find(needle).map(|i| self.advance(i))
    }

    /// Step over a single character
    pub fn bump(self) -> Option<Self> {
        self.peek().map(|c| self.advance(c.len_utf8()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_whitespace() {
        let c = Cursor::new("  type = ");
        assert!(c.literal("type").is_none());
        let c = c.skip_whitespace().literal("type").unwrap();
        let c = c.skip_whitespace().literal("=").unwrap();
        assert_eq!(c.skip_whitespace().offset(), 9);
        assert!(c.skip_whitespace().is_at_end());
    }

    #[test]
    fn test_identifier_stops_at_dash() {
        let (word, c) = Cursor::new("integer-attribute").identifier().unwrap();
        assert_eq!(word, "integer");
        assert_eq!(c.rest(), "-attribute");
        assert!(Cursor::new("-x").identifier().is_none());
    }

    #[test]
    fn test_chars_counts_characters_not_bytes() {
        let (s, c) = Cursor::new("é\nb~rest").chars(3).unwrap();
        assert_eq!(s, "é\nb");
        assert_eq!(c.peek(), Some('~'));
        assert!(Cursor::new("ab").chars(3).is_none());
        assert_eq!(Cursor::new("ab").chars(0).unwrap().0, "");
    }

    #[test]
    fn test_find_does_not_move_on_miss() {
        let c = Cursor::new("abc type");
        assert_eq!(c.find("type").unwrap().offset(), 4);
        assert!(c.find("name").is_none());
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn test_token_and_digits() {
        let (tok, c) = Cursor::new("-12 7").token().unwrap();
        assert_eq!(tok, "-12");
        let (d, _) = c.skip_whitespace().digits().unwrap();
        assert_eq!(d, "7");
        assert!(Cursor::new("x1").digits().is_none());
    }
}

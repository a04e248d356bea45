//! Hand-rolled tokenizer for the ER DSL.
//!
//! Tokens are produced one at a time by [`Lexer::next_token`]; the stream is
//! never materialized. The lexer looks at most two bytes past its cursor.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    Ident,
    /// A cardinality value (`3`, `N`) or a full pair (`0:N`).
    CardLiteral,
    End,
    /// An unrecognized character; carries the diagnostic message.
    Error(&'static str),
    // Keywords
    Entity,
    Attr,
    Pk,
    Fk,
    Assoc,
    Between,
    Card,
    Gerarchy,
    Type,
    Subset,
    Partial,
    Total,
    Exclusive,
    Overlapped,
    Parent,
    Child,
}

impl TokenKind {
    /// Human-readable name used in "expected ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Ident => "identifier",
            TokenKind::CardLiteral => "cardinality value",
            TokenKind::End => "end of input",
            TokenKind::Error(_) => "invalid character",
            TokenKind::Entity => "'entity'",
            TokenKind::Attr => "'attr'",
            TokenKind::Pk => "'pk'",
            TokenKind::Fk => "'fk'",
            TokenKind::Assoc => "'assoc'",
            TokenKind::Between => "'between'",
            TokenKind::Card => "'card'",
            TokenKind::Gerarchy => "'gerarchy'",
            TokenKind::Type => "'type'",
            TokenKind::Subset => "'subset'",
            TokenKind::Partial => "'partial'",
            TokenKind::Total => "'total'",
            TokenKind::Exclusive => "'exclusive'",
            TokenKind::Overlapped => "'overlapped'",
            TokenKind::Parent => "'parent'",
            TokenKind::Child => "'child'",
        }
    }
}

/// Map a complete word to its keyword kind. Exact match only: a prefix of a
/// keyword is a plain identifier.
fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "entity" => TokenKind::Entity,
        "attr" | "attribute" => TokenKind::Attr,
        "pk" | "primary-key" => TokenKind::Pk,
        "fk" | "foreign-key" => TokenKind::Fk,
        "assoc" | "association" => TokenKind::Assoc,
        "between" => TokenKind::Between,
        "card" => TokenKind::Card,
        "gerarchy" => TokenKind::Gerarchy,
        "type" => TokenKind::Type,
        "subset" => TokenKind::Subset,
        "partial" => TokenKind::Partial,
        "total" => TokenKind::Total,
        "exclusive" => TokenKind::Exclusive,
        "overlapped" => TokenKind::Overlapped,
        "parent" => TokenKind::Parent,
        "child" => TokenKind::Child,
        _ => return None,
    };
    Some(kind)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The matched source text. For error tokens, the offending character.
    pub text: &'src str,
    /// Byte offset of the first character.
    pub offset: usize,
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'-'
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

pub struct Lexer<'src> {
    src: &'src str,
    start: usize,
    cur: usize,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Lexer {
            src,
            start: 0,
            cur: 0,
            done: false,
        }
    }

    pub fn source(&self) -> &'src str {
        self.src
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.src.as_bytes().get(pos).copied()
    }

    fn peek(&self) -> Option<u8> {
        self.byte_at(self.cur)
    }

    fn make(&self, kind: TokenKind) -> Token<'src> {
        Token {
            kind,
            text: &self.src[self.start..self.cur],
            offset: self.start,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.cur += 1,
                Some(b';') => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.cur += 1;
                    }
                }
                _ => return,
            }
        }
    }

    /// Whether a cardinality value starts at `pos`: a digit, or a bare
    /// `n`/`N` not followed by another identifier character.
    fn card_value_starts_at(&self, pos: usize) -> bool {
        match self.byte_at(pos) {
            Some(c) if c.is_ascii_digit() => true,
            Some(b'n' | b'N') => !self.byte_at(pos + 1).is_some_and(is_ident_char),
            _ => false,
        }
    }

    /// Consume one cardinality value starting at the cursor.
    fn card_value(&mut self) {
        match self.peek() {
            Some(b'n' | b'N') => self.cur += 1,
            _ => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.cur += 1;
                }
            }
        }
    }

    fn cardinality(&mut self) -> Token<'src> {
        self.card_value();
        if self.peek() == Some(b':') && self.card_value_starts_at(self.cur + 1) {
            self.cur += 1;
            self.card_value();
        }
        self.make(TokenKind::CardLiteral)
    }

    fn ident(&mut self) -> Token<'src> {
        while self.peek().is_some_and(is_ident_char) {
            self.cur += 1;
        }
        let word = &self.src[self.start..self.cur];
        self.make(keyword(word).unwrap_or(TokenKind::Ident))
    }

    fn error(&mut self, message: &'static str) -> Token<'src> {
        while !self.src.is_char_boundary(self.cur) {
            self.cur += 1;
        }
        self.make(TokenKind::Error(message))
    }

    /// Scan the next token. Once the input is exhausted every call returns
    /// an `End` token.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_trivia();
        self.start = self.cur;
        let Some(c) = self.peek() else {
            return self.make(TokenKind::End);
        };
        match c {
            b'(' => {
                self.cur += 1;
                self.make(TokenKind::LParen)
            }
            b')' => {
                self.cur += 1;
                self.make(TokenKind::RParen)
            }
            _ if self.card_value_starts_at(self.cur) => self.cardinality(),
            _ if is_ident_start(c) => self.ident(),
            _ => {
                self.cur += 1;
                self.error("unexpected character")
            }
        }
    }
}

/// Yields every token up to and including `End`, then stops.
impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::End {
            self.done = true;
        }
        Some(token)
    }
}

/// Convert a byte offset into a 1-based `(line, column)` pair.
pub fn line_col(src: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(src.len());
    let before = &src.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = match before.iter().rposition(|&b| b == b'\n') {
        Some(nl) => offset - nl,
        None => offset + 1,
    };
    (line as u32, column as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).map(|t| t.kind).collect()
    }

    fn texts(src: &str) -> Vec<&str> {
        Lexer::new(src).map(|t| t.text).collect()
    }

    #[test]
    fn parens_keywords_and_idents() {
        assert_eq!(
            kinds("(entity Person (attr Name))"),
            vec![
                TokenKind::LParen,
                TokenKind::Entity,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Attr,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn every_reserved_word_is_recognized() {
        let src = "entity attr attribute pk primary-key fk foreign-key assoc association \
                   between card gerarchy type subset partial total exclusive overlapped \
                   parent child";
        let got = kinds(src);
        assert!(!got.contains(&TokenKind::Ident), "{:?}", got);
        assert_eq!(got.len(), 21);
        assert_eq!(got[4], TokenKind::Pk);
        assert_eq!(got[6], TokenKind::Fk);
        assert_eq!(got[8], TokenKind::Assoc);
    }

    #[test]
    fn keyword_prefixes_and_extensions_are_identifiers() {
        for word in ["ent", "entities", "at", "attrs", "p", "pa", "par", "parents", "totally", "t"] {
            let mut lexer = Lexer::new(word);
            let tok = lexer.next_token();
            assert_eq!(tok.kind, TokenKind::Ident, "{}", word);
            assert_eq!(tok.text, word);
        }
    }

    #[test]
    fn identifiers_allow_dash_underscore_and_digits() {
        assert_eq!(texts("first-name _id x2"), vec!["first-name", "_id", "x2", ""]);
        assert_eq!(
            kinds("first-name _id x2"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Ident, TokenKind::End]
        );
    }

    #[test]
    fn cardinality_literals() {
        assert_eq!(texts("1:1 0:N 12:n 7 N"), vec!["1:1", "0:N", "12:n", "7", "N", ""]);
        assert!(kinds("1:1 0:N 12:n 7 N")[..5]
            .iter()
            .all(|k| *k == TokenKind::CardLiteral));
    }

    #[test]
    fn bare_n_followed_by_ident_char_is_identifier() {
        assert_eq!(kinds("Name"), vec![TokenKind::Ident, TokenKind::End]);
        assert_eq!(kinds("n1"), vec![TokenKind::Ident, TokenKind::End]);
        assert_eq!(kinds("n)"), vec![TokenKind::CardLiteral, TokenKind::RParen, TokenKind::End]);
    }

    #[test]
    fn dangling_colon_is_a_lexical_error() {
        let toks: Vec<_> = Lexer::new("1: x").collect();
        assert_eq!(toks[0].text, "1");
        assert_eq!(toks[1].kind, TokenKind::Error("unexpected character"));
        assert_eq!(toks[1].text, ":");
        assert_eq!(toks[2].kind, TokenKind::Ident);
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let src = "; leading comment\n(entity\tA) ; trailing\n\r\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::LParen,
                TokenKind::Entity,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn error_token_has_position_and_scanning_resumes() {
        let toks: Vec<_> = Lexer::new("(# entity)").collect();
        assert_eq!(toks[1].kind, TokenKind::Error("unexpected character"));
        assert_eq!(toks[1].offset, 1);
        assert_eq!(toks[2].kind, TokenKind::Entity);
        assert_eq!(toks[2].offset, 3);
    }

    #[test]
    fn non_ascii_character_is_one_error_token() {
        let toks: Vec<_> = Lexer::new("é A").collect();
        assert_eq!(toks[0].kind, TokenKind::Error("unexpected character"));
        assert_eq!(toks[0].text, "é");
        assert_eq!(toks[1].text, "A");
        assert_eq!(toks[1].offset, 3);
    }

    #[test]
    fn next_token_after_end_keeps_returning_end() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.next_token().kind, TokenKind::End);
        assert_eq!(lexer.next_token().kind, TokenKind::End);
    }

    #[test]
    fn iterator_stops_after_end() {
        let mut lexer = Lexer::new("A");
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Ident));
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::End));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn line_col_is_one_based() {
        let src = "(entity A)\n  (entity B)";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 8), (1, 9));
        assert_eq!(line_col(src, 13), (2, 3));
        assert_eq!(line_col(src, 10_000), (2, 13));
    }
}

//! Recursive-descent parser for the ER DSL.
//!
//! The parser pulls tokens from the lexer on demand and drives a
//! [`GraphBuilder`] as declarations open and close. Errors unwind to the
//! top-level loop, which records them, rolls the builder back to the state
//! before the failed declaration and resynchronizes on paren depth.

use crate::error::{CompileError, Diagnostic, ErrorKind, Near};
use crate::graph::{Graph, Node, NodeKind};
use crate::lexer::{line_col, Lexer, Token, TokenKind};
use crate::scope::{GraphBuilder, ScopeError};

mod constructs;

/// Why a declaration stopped parsing.
#[derive(Debug)]
pub(crate) enum Fault {
    /// A user error, recovered from at the next top-level declaration.
    User(Diagnostic),
    /// A broken invariant; aborts the whole parse.
    Internal(String),
}

pub(crate) type PResult<T> = Result<T, Fault>;

/// Deepest paren nesting a declaration may reach. Each level recurses
/// through the grammar, so this bounds stack use.
pub(crate) const MAX_DEPTH: i32 = 256;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    cur: Token<'src>,
    prev: Token<'src>,
    /// Paren nesting of the tokens consumed so far.
    depth: i32,
    builder: GraphBuilder,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> Self {
        let placeholder = Token {
            kind: TokenKind::End,
            text: "",
            offset: 0,
        };
        let mut parser = Parser {
            lexer: Lexer::new(src),
            cur: placeholder,
            prev: placeholder,
            depth: 0,
            builder: GraphBuilder::new(),
            diagnostics: Vec::new(),
        };
        parser.advance();
        parser
    }

    /// Parse the whole input. Every independent error is collected; the
    /// graph is returned only if there were none.
    pub fn parse(mut self) -> Result<Graph, CompileError> {
        while !self.check(TokenKind::End) {
            let checkpoint = self.builder.checkpoint();
            match self.field(NodeKind::Start) {
                Ok(()) => {}
                Err(Fault::User(diagnostic)) => {
                    self.report(diagnostic);
                    self.builder
                        .rollback(checkpoint)
                        .map_err(|e| CompileError::Internal(e.to_string()))?;
                    self.synchronize();
                }
                Err(Fault::Internal(message)) => return Err(CompileError::Internal(message)),
            }
        }

        if !self.diagnostics.is_empty() {
            return Err(CompileError::Rejected(self.diagnostics));
        }
        self.builder
            .finish()
            .map_err(|e| CompileError::Internal(e.to_string()))
    }

    // -- Token helpers -----------------------------------------

    /// Move to the next token. Lexical errors are reported and skipped here,
    /// so they never abort the declaration being parsed.
    fn advance(&mut self) {
        self.prev = self.cur;
        loop {
            let token = self.lexer.next_token();
            tracing::trace!(kind = ?token.kind, text = token.text, offset = token.offset, "token");
            if let TokenKind::Error(message) = token.kind {
                let message = format!("{} '{}'", message, token.text);
                let diagnostic = self.diagnostic(token, ErrorKind::Lexical, message);
                self.report(diagnostic);
                continue;
            }
            self.cur = token;
            break;
        }
        match self.prev.kind {
            TokenKind::LParen => self.depth += 1,
            TokenKind::RParen => self.depth -= 1,
            _ => {}
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    /// Consume a token of `kind` and return it.
    fn expect(&mut self, kind: TokenKind, message: &str) -> PResult<Token<'src>> {
        if self.check(kind) {
            self.advance();
            return Ok(self.prev);
        }
        Err(self.error_at(self.cur, ErrorKind::Syntax, message))
    }

    /// [`expect`](Self::expect) with the stock "expected <token>" message.
    fn expect_kind(&mut self, kind: TokenKind) -> PResult<Token<'src>> {
        self.expect(kind, &format!("expected {}", kind.describe()))
    }

    /// Skip tokens until the paren depth returns to zero. A stray `)` at
    /// depth zero is consumed on its own.
    fn synchronize(&mut self) {
        while !self.check(TokenKind::End) {
            self.advance();
            if self.depth <= 0 {
                break;
            }
        }
        self.depth = 0;
        tracing::debug!(offset = self.cur.offset, "resynchronized");
    }

    // -- Diagnostics -------------------------------------------

    fn diagnostic(&self, token: Token<'_>, kind: ErrorKind, message: impl Into<String>) -> Diagnostic {
        let near = match token.kind {
            TokenKind::End => Near::EndOfFile,
            TokenKind::Error(_) => Near::Nothing,
            _ => Near::Token(token.text.to_owned()),
        };
        let position = line_col(self.lexer.source(), token.offset);
        Diagnostic::new(kind, token.offset, position, near, message)
    }

    fn error_at(&self, token: Token<'_>, kind: ErrorKind, message: impl Into<String>) -> Fault {
        Fault::User(self.diagnostic(token, kind, message))
    }

    /// Attach a position to a builder error.
    fn scope_fault(&self, error: ScopeError, token: Token<'_>) -> Fault {
        let kind = match &error {
            ScopeError::Duplicate { .. } => ErrorKind::DuplicateDefinition,
            ScopeError::Unresolved { .. } | ScopeError::MissingAttr { .. } => {
                ErrorKind::UnresolvedReference
            }
            ScopeError::Invariant(_) => return Fault::Internal(error.to_string()),
        };
        self.error_at(token, kind, error.to_string())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    /// Apply `f` to the node under construction.
    fn with_current<R>(&mut self, f: impl FnOnce(&mut Node) -> R) -> PResult<R> {
        match self.builder.current_mut() {
            Ok(node) => Ok(f(node)),
            Err(e) => Err(Fault::Internal(e.to_string())),
        }
    }
}

/// Compile `src` into an ER graph.
pub fn parse(src: &str) -> Result<Graph, CompileError> {
    Parser::new(src).parse()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics(src: &str) -> Vec<Diagnostic> {
        match parse(src) {
            Err(CompileError::Rejected(d)) => d,
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_yields_start_node_only() {
        let g = parse("  ; nothing here\n").unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.root().unwrap().kind, NodeKind::Start);
        assert!(g.root().unwrap().links.is_empty());
    }

    #[test]
    fn lexical_error_is_reported_but_declaration_continues() {
        let d = diagnostics("(entity A # (attr x))\n(entity B)");
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].kind, ErrorKind::Lexical);
        assert_eq!(d[0].near, Near::Nothing);
        assert_eq!(d[0].to_string(), "1:11: parse error: unexpected character '#'");
    }

    #[test]
    fn only_first_error_of_a_declaration_is_reported() {
        let d = diagnostics("(entity A (attr x) (attr x) (pk nope))");
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].kind, ErrorKind::DuplicateDefinition);
    }

    #[test]
    fn every_failed_declaration_is_reported() {
        let src = "(entity A (attr x) (attr x))\n(entity B)\n(assoc R (entity Z card 1:1))";
        let d = diagnostics(src);
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].line, 1);
        assert_eq!(d[1].line, 3);
        assert_eq!(d[1].kind, ErrorKind::UnresolvedReference);
    }

    #[test]
    fn stray_close_paren_is_recovered() {
        let d = diagnostics(") (entity A) (entity A)");
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].kind, ErrorKind::Syntax);
        assert_eq!(d[0].near, Near::Token(")".into()));
        // The first A parsed fine, so the second one is a genuine duplicate.
        assert_eq!(d[1].kind, ErrorKind::DuplicateDefinition);
    }

    #[test]
    fn unterminated_declaration_reports_end_of_file() {
        let d = diagnostics("(entity A (attr x)");
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].near, Near::EndOfFile);
        assert_eq!(d[0].message, "expected ')'");
    }

    #[test]
    fn failed_declaration_name_can_be_reused() {
        let src = "(entity A (attr x) (bogus)) (entity A (attr x))";
        let d = diagnostics(src);
        assert_eq!(d.len(), 1, "{:?}", d);
        assert_eq!(d[0].kind, ErrorKind::Syntax);
        assert_eq!(d[0].near, Near::Token("bogus".into()));
    }

    #[test]
    fn recovery_skips_nested_parens() {
        let src = "(fk F (attr a Nope) (between (x (y))))\n(entity E)";
        let d = diagnostics(src);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].near, Near::Token("Nope".into()));
    }

    fn nested_attrs(levels: usize) -> String {
        let mut src = String::from("(entity E ");
        src.push_str(&"(attr a ".repeat(levels));
        src.push_str(&")".repeat(levels + 1));
        src.push_str("\n(entity After)");
        src
    }

    #[test]
    fn nesting_within_limit_compiles() {
        let g = parse(&nested_attrs(100)).unwrap();
        assert_eq!(g.len(), 103);
    }

    #[test]
    fn excessive_nesting_is_rejected_without_overflow() {
        let d = diagnostics(&nested_attrs(100_000));
        assert_eq!(d.len(), 1, "{:?}", &d[..d.len().min(3)]);
        assert_eq!(d[0].kind, ErrorKind::Syntax);
        assert_eq!(d[0].message, "declaration nested too deeply");
        assert_eq!(d[0].near, Near::Token("(".into()));
    }

    #[test]
    fn delimiter_messages_name_the_token() {
        let d = diagnostics("(entity A) (assoc R (entity A card 1:1 x))");
        assert_eq!(d[0].message, "expected ')'");
        let d = diagnostics("(entity A) (assoc R (entity A 1:1))");
        assert_eq!(d[0].message, "expected 'card'");
    }

    #[test]
    fn parser_instances_are_independent() {
        let first = parse("(entity A)").unwrap();
        let second = parse("(entity A)").unwrap();
        assert_eq!(first, second);
    }
}

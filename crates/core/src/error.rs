use serde::Serialize;
use std::fmt;

/// Class of a user-facing compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// An unrecognized character. Reported, then scanning continues.
    Lexical,
    /// A name already bound in the innermost scope, or a second primary key.
    DuplicateDefinition,
    /// A name/kind pair not found by lexical or structural resolution.
    UnresolvedReference,
    /// A missing or unexpected delimiter or keyword.
    Syntax,
}

/// What the diagnostic points at, rendered between `parse error` and the
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Near {
    Token(String),
    EndOfFile,
    Nothing,
}

impl fmt::Display for Near {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Near::Token(text) => write!(f, " at '{}'", text),
            Near::EndOfFile => f.write_str(" on end of file"),
            Near::Nothing => Ok(()),
        }
    }
}

/// A compile diagnostic with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{line}:{column}: parse error{near}: {message}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    /// Byte offset of the offending token.
    pub offset: usize,
    pub line: u32,
    pub column: u32,
    pub near: Near,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: ErrorKind,
        offset: usize,
        (line, column): (u32, u32),
        near: Near,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            offset,
            line,
            column,
            near,
            message: message.into(),
        }
    }

    /// Serialize to a flat JSON object; `near` is `null` when the diagnostic
    /// has no token text attached.
    pub fn to_json_value(&self) -> serde_json::Value {
        let near = match &self.near {
            Near::Token(text) => serde_json::Value::String(text.clone()),
            Near::EndOfFile => serde_json::Value::String("end of file".to_owned()),
            Near::Nothing => serde_json::Value::Null,
        };
        serde_json::json!({
            "column":  self.column,
            "kind":    self.kind,
            "line":    self.line,
            "message": self.message,
            "near":    near,
            "offset":  self.offset,
        })
    }
}

/// Overall failure of one compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// One or more user errors; diagnostics are in the order they were found.
    #[error("compilation failed with {} error(s)", .0.len())]
    Rejected(Vec<Diagnostic>),
    /// A broken internal invariant. Indicates a compiler bug, never a user
    /// error, and is never recovered from.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl CompileError {
    /// The user diagnostics carried by this error, empty for internal errors.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Rejected(diagnostics) => diagnostics,
            CompileError::Internal(_) => &[],
        }
    }
}

use crate::util::Position;
use std::fmt::{Display, Formatter};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The five ways a regex pattern string can fail to compile (spec §4.2.3).
pub enum RegexErrorKind {
    UnexpectedCharacter,
    UnterminatedPattern,
    UnsupportedSpecialCharacter,
    UnsupportedEscapeCharacter,
    InvalidRepeatCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raised synchronously by `Regex::compile`. Fatal: the owning token pattern is
/// rejected and the embedder must fix the pattern before the grammar can build.
pub struct RegexError {
    pub kind: RegexErrorKind,
    pub pattern: String,
    pub offset: usize,
    pub detail: String,
}

impl RegexError {
    pub fn new(kind: RegexErrorKind, pattern: &str, offset: usize, detail: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            offset,
            detail: detail.into(),
        }
    }
}

impl Display for RegexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            RegexErrorKind::UnexpectedCharacter => "unexpected character",
            RegexErrorKind::UnterminatedPattern => "unterminated pattern",
            RegexErrorKind::UnsupportedSpecialCharacter => "unsupported special character",
            RegexErrorKind::UnsupportedEscapeCharacter => "unsupported escape character",
            RegexErrorKind::InvalidRepeatCount => "invalid repeat count",
        };
        write!(
            f,
            "{} in /{}/ at offset {}: {}",
            kind, self.pattern, self.offset, self.detail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fatal, synchronous errors raised while building a grammar: duplicate or
/// invalid token/production patterns, and everything `Parser::prepare` rejects.
pub enum GrammarErrorKind {
    DuplicateTokenId,
    DuplicateProductionId,
    DuplicateProductionName,
    LeftRecursive,
    EmptyProduction,
    InherentAmbiguity,
    UnknownTarget,
    NoAlternatives,
    DuplicateAlternative,
    NotPrepared,
    InvalidOccurs,
    EmptyPattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub production: Option<String>,
    pub message: String,
}

impl GrammarError {
    pub fn new(kind: GrammarErrorKind, production: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            production: production.map(str::to_string),
            message: message.into(),
        }
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.production {
            Some(name) => write!(f, "parser-creation: {} ({}): {}", name, self.kind_str(), self.message),
            None => write!(f, "parser-creation: {}: {}", self.kind_str(), self.message),
        }
    }
}

impl GrammarError {
    fn kind_str(&self) -> &'static str {
        match self.kind {
            GrammarErrorKind::DuplicateTokenId => "duplicate-token-id",
            GrammarErrorKind::DuplicateProductionId => "duplicate-production-id",
            GrammarErrorKind::DuplicateProductionName => "duplicate-production-name",
            GrammarErrorKind::LeftRecursive => "left-recursive",
            GrammarErrorKind::EmptyProduction => "empty-production",
            GrammarErrorKind::InherentAmbiguity => "inherent-ambiguity",
            GrammarErrorKind::UnknownTarget => "unknown-target",
            GrammarErrorKind::NoAlternatives => "no-alternatives",
            GrammarErrorKind::DuplicateAlternative => "duplicate-alternative",
            GrammarErrorKind::NotPrepared => "not-prepared",
            GrammarErrorKind::InvalidOccurs => "invalid-occurs",
            GrammarErrorKind::EmptyPattern => "empty-pattern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parse-time error kinds (spec §7). All but the fatal three accumulate in the
/// parser's log; a fatal kind is always the log's last entry.
pub enum ParseExceptionKind {
    UnexpectedCharacter,
    UnexpectedEof,
    UnexpectedToken,
    InvalidToken,
    IoFailure,
    Analysis,
}

impl ParseExceptionKind {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ParseExceptionKind::UnexpectedEof
                | ParseExceptionKind::IoFailure
                | ParseExceptionKind::Analysis
        )
    }

    fn label(&self) -> &'static str {
        match self {
            ParseExceptionKind::UnexpectedCharacter => "unexpected-character",
            ParseExceptionKind::UnexpectedEof => "unexpected-eof",
            ParseExceptionKind::UnexpectedToken => "unexpected-token",
            ParseExceptionKind::InvalidToken => "invalid-token",
            ParseExceptionKind::IoFailure => "io-failure",
            ParseExceptionKind::Analysis => "analysis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single parse-time error: a `(kind, message, position)` triple, as logged by
/// the tokenizer or the parser.
pub struct ParseException {
    pub kind: ParseExceptionKind,
    pub message: String,
    pub position: Position,
}

impl ParseException {
    pub fn new(kind: ParseExceptionKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }
}

impl Display for ParseException {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} at line {}, col {}",
            self.kind.label(),
            self.message,
            self.position.line,
            self.position.column
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Thrown by `Parser::parse` when its error log is non-empty once parsing ends.
/// The tree root is still produced and handed back alongside this, per spec §7.
pub struct ParserLogException {
    errors: Vec<ParseException>,
}

impl ParserLogException {
    pub fn new(errors: Vec<ParseException>) -> Self {
        Self { errors }
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseException> {
        self.errors.iter()
    }
}

impl Index<usize> for ParserLogException {
    type Output = ParseException;
    fn index(&self, index: usize) -> &ParseException {
        &self.errors[index]
    }
}

impl Display for ParserLogException {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for e in &self.errors {
            writeln!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserLogException {}
impl std::error::Error for RegexError {}
impl std::error::Error for GrammarError {}

use std::fmt::{Display, Formatter};

/// Identifier for a token pattern, user-assigned and unique within a
/// tokenizer (spec §3). `-1` is reserved for end-of-input.
pub type TokenId = i32;

/// Reserved id the tokenizer uses for the end-of-input token it synthesizes.
pub const EOF_ID: TokenId = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPatternKind {
    Literal,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable record describing one lexical rule (spec §3). `ignore` patterns
/// are consumed but never emitted; `error` patterns always raise
/// `invalid-token` carrying `error_message` once matched.
pub struct TokenPattern {
    pub id: TokenId,
    pub name: String,
    pub kind: TokenPatternKind,
    pub pattern: String,
    pub ignore: bool,
    pub error: bool,
    pub error_message: Option<String>,
}

impl TokenPattern {
    pub fn literal(id: TokenId, name: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: TokenPatternKind::Literal,
            pattern: literal.into(),
            ignore: false,
            error: false,
            error_message: None,
        }
    }

    pub fn regex(id: TokenId, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: TokenPatternKind::Regex,
            pattern: pattern.into(),
            ignore: false,
            error: false,
            error_message: None,
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn erroring(mut self, message: impl Into<String>) -> Self {
        self.error = true;
        self.error_message = Some(message.into());
        self
    }
}

impl Display for TokenPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenPatternKind::Literal => write!(f, "{:?}", self.pattern),
            TokenPatternKind::Regex => write!(f, "/{}/", self.pattern.replace('/', "\\/")),
        }
    }
}

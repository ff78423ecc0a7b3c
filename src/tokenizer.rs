//! Lazy tokenizer (spec §4.5 / C5): turns a [`CharSource`] into a stream of
//! [`Token`]s by repeatedly asking the [`TokenPatternRegistry`] for the
//! longest match at the current position, skipping `ignore` patterns and
//! raising on `error` patterns.

use crate::buffer::{CharSource, LookAheadBuffer};
use crate::config::TokenizerConfig;
use crate::error::{ParseException, ParseExceptionKind};
use crate::registry::{AddPatternError, TokenPatternRegistry};
use crate::token_pattern::{TokenId, TokenPattern, EOF_ID};
use crate::util::{Log, Logging, Position};
use once_cell::unsync::OnceCell;

pub type TokenIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One lexeme: the pattern that produced it, the exact source text it covers,
/// and its start/end positions. `prev`/`next` are populated only when the
/// owning [`Tokenizer`] was built with `use_token_list(true)` (spec §4.5.4).
pub struct Token {
    pub pattern_id: TokenId,
    pub name: String,
    pub image: String,
    pub start: Position,
    pub end: Position,
    prev: Option<TokenIndex>,
    next: Option<TokenIndex>,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        self.pattern_id == EOF_ID
    }

    pub fn prev(&self) -> Option<TokenIndex> {
        self.prev
    }

    pub fn next(&self) -> Option<TokenIndex> {
        self.next
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})@{}", self.name, self.image, self.start)
    }
}

/// Drives a [`TokenPatternRegistry`] over a [`LookAheadBuffer`], producing one
/// [`Token`] per call to [`next`](Self::next). Not an `Iterator` because
/// advancing requires fallible I/O; callers loop on `next` until it yields an
/// EOF token or an error.
pub struct Tokenizer<S: CharSource> {
    registry: TokenPatternRegistry,
    buffer: LookAheadBuffer<S>,
    use_token_list: bool,
    tokens: Vec<Token>,
    last: Option<TokenIndex>,
    debugger: OnceCell<Log<&'static str>>,
}

impl<S: CharSource> Logging for Tokenizer<S> {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.debugger
    }
}

impl<S: CharSource> Tokenizer<S> {
    pub fn new(source: S, ignore_case: bool) -> Self {
        Self::with_registry(source, TokenPatternRegistry::new(ignore_case))
    }

    pub fn with_config(source: S, config: TokenizerConfig) -> Self {
        let mut tokenizer = Self::with_registry(source, TokenPatternRegistry::new(config.ignore_case));
        tokenizer.use_token_list(config.use_token_list);
        tokenizer
    }

    /// Build a tokenizer over an already-assembled registry, as
    /// [`crate::parser::Parser::parse`] does — the registry was validated once
    /// at `prepare()` time and is simply reused per parse.
    pub fn with_registry(source: S, registry: TokenPatternRegistry) -> Self {
        Self {
            registry,
            buffer: LookAheadBuffer::new(source),
            use_token_list: false,
            tokens: Vec::new(),
            last: None,
            debugger: OnceCell::new(),
        }
    }

    pub fn add_pattern(&mut self, pattern: TokenPattern) -> Result<(), AddPatternError> {
        self.registry.add(pattern)
    }

    /// Skip one raw code unit without attempting to tokenize it. Used by the
    /// parser's error recovery after an `unexpected-character` — retrying
    /// `next()` at the same position would just fail again.
    pub fn skip_one_unit(&mut self) {
        self.buffer.read(1);
    }

    pub fn use_token_list(&mut self, enabled: bool) {
        self.use_token_list = enabled;
    }

    pub fn registry(&self) -> &TokenPatternRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Human-readable dump of the registered token patterns, forwarding to
    /// the registry. Debug/introspection tool only.
    pub fn build_grammar(&self) -> String {
        self.registry.build_grammar()
    }

    /// Produce the next token, skipping any `ignore` patterns along the way.
    /// Returns a synthetic EOF token (pattern id [`EOF_ID`]) exactly once at
    /// the end of input; calling `next` again after that keeps returning it.
    pub fn next(&mut self) -> Result<Token, ParseException> {
        loop {
            let start_abs = self.buffer.position();
            let start_pos = self.buffer.position_of(start_abs);

            if self.at_end()? {
                return Ok(self.finish(Token {
                    pattern_id: EOF_ID,
                    name: "EOF".to_string(),
                    image: String::new(),
                    start: start_pos,
                    end: start_pos,
                    prev: None,
                    next: None,
                }));
            }

            let (outcome, hit_end) = self
                .registry
                .best_match(&mut self.buffer, 0)
                .map_err(|e| ParseException::new(ParseExceptionKind::IoFailure, e.message, start_pos))?;

            let outcome = match outcome {
                Some(outcome) => outcome,
                None if hit_end => {
                    return Err(ParseException::new(
                        ParseExceptionKind::UnexpectedEof,
                        "input ended mid-token with no pattern fully matched",
                        start_pos,
                    ))
                }
                None => {
                    return Err(ParseException::new(
                        ParseExceptionKind::UnexpectedCharacter,
                        format!(
                            "no token pattern matches {:?}",
                            self.buffer.peek_char(0).ok().flatten().unwrap_or('\u{FFFD}')
                        ),
                        start_pos,
                    ))
                }
            };

            let pattern = self.registry.get(outcome.pattern_index).clone();
            let image = self.buffer.substring(start_abs, outcome.length);
            self.buffer.read(outcome.length);
            let end_pos = self.buffer.position_of(self.buffer.position());

            if pattern.error {
                self.log_at(Log::Default(()), || format!("error pattern {} matched at {}", pattern.name, start_pos));
                return Err(ParseException::new(
                    ParseExceptionKind::InvalidToken,
                    pattern
                        .error_message
                        .clone()
                        .unwrap_or_else(|| format!("matched error pattern {}", pattern.name)),
                    start_pos,
                ));
            }

            // `finish` links the token into the doubly-linked list (when
            // enabled) regardless of whether it's emitted — ignored tokens
            // still belong in that list (spec §4.5.2 step 7), just not in
            // the returned stream.
            let token = self.finish(Token {
                pattern_id: pattern.id,
                name: pattern.name.clone(),
                image,
                start: start_pos,
                end: end_pos,
                prev: None,
                next: None,
            });

            if pattern.ignore {
                self.log_at(Log::Verbose(()), || format!("ignoring {}", token));
                continue;
            }

            self.log_at(Log::Result(()), || format!("emitting {}", token));
            return Ok(token);
        }
    }

    fn at_end(&mut self) -> Result<bool, ParseException> {
        self.buffer.at_end(0).map_err(|e| {
            ParseException::new(ParseExceptionKind::IoFailure, e.message, Position::START)
        })
    }

    fn finish(&mut self, mut token: Token) -> Token {
        if self.use_token_list {
            let index = self.tokens.len();
            token.prev = self.last;
            self.tokens.push(token.clone());
            if let Some(prev) = self.last {
                self.tokens[prev].next = Some(index);
            }
            self.last = Some(index);
        }
        token
    }
}

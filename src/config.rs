//! Small, explicit configuration structs for the tokenizer and parser
//! (ambient engineering concern, not a `spec.md` component). Plain data,
//! validated at the point of use — [`ParserConfig::max_lookahead`] is floored
//! to `1` by [`lookahead::analyze`](crate::lookahead::analyze) rather than by
//! a separate validation pass, matching how the rest of the crate validates
//! patterns at registration time instead of up front.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    pub ignore_case: bool,
    pub use_token_list: bool,
}

impl TokenizerConfig {
    pub fn new() -> Self {
        Self {
            ignore_case: false,
            use_token_list: false,
        }
    }

    pub fn ignore_case(mut self, enabled: bool) -> Self {
        self.ignore_case = enabled;
        self
    }

    pub fn use_token_list(mut self, enabled: bool) -> Self {
        self.use_token_list = enabled;
        self
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// `max_lookahead` bounds the `k` escalation in `lookahead::analyze` (spec
/// §4.7); the default of `3` matches `MAX_K`. A value of `0` is treated as
/// `1` rather than rejected outright.
pub struct ParserConfig {
    pub max_lookahead: u8,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self { max_lookahead: 3 }
    }

    pub fn max_lookahead(mut self, k: u8) -> Self {
        self.max_lookahead = k.max(1);
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

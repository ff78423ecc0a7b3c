//! Token pattern registry (spec §4.4 / C4): owns every [`TokenPattern`], picks
//! a matcher for it at registration time, and answers "what matches at this
//! position" using the longest-match/first-registered tie-break rule.

use crate::dfa::DfaMatcher;
use crate::error::{GrammarError, GrammarErrorKind, RegexError};
use crate::regex_engine::{LeadingSet, MatchInput, Regex};
use crate::token_pattern::{TokenId, TokenPattern, TokenPatternKind};
use crate::util::{Log, Logging};
use once_cell::unsync::OnceCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub pattern_index: usize,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct TokenPatternRegistry {
    patterns: Vec<TokenPattern>,
    by_id: HashMap<TokenId, usize>,
    dfa: DfaMatcher<usize>,
    regexes: Vec<(usize, Regex, LeadingSet)>,
    ignore_case: bool,
    debugger: OnceCell<Log<&'static str>>,
}

impl Logging for TokenPatternRegistry {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.debugger
    }
}

impl TokenPatternRegistry {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            patterns: Vec::new(),
            by_id: HashMap::new(),
            dfa: DfaMatcher::new(ignore_case),
            regexes: Vec::new(),
            ignore_case,
            debugger: OnceCell::new(),
        }
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn get(&self, index: usize) -> &TokenPattern {
        &self.patterns[index]
    }

    pub fn index_of_id(&self, id: TokenId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Register a pattern. Fails with `regex-compile` if a `Regex` pattern
    /// source doesn't compile, or `parser-creation` on a duplicate id or a
    /// pattern that matches the empty string.
    pub fn add(&mut self, pattern: TokenPattern) -> Result<(), AddPatternError> {
        if self.by_id.contains_key(&pattern.id) {
            return Err(AddPatternError::Grammar(GrammarError::new(
                GrammarErrorKind::DuplicateTokenId,
                None,
                format!("token id {} is already registered", pattern.id),
            )));
        }
        let index = self.patterns.len();
        match pattern.kind {
            TokenPatternKind::Literal => {
                if pattern.pattern.is_empty() {
                    return Err(AddPatternError::Grammar(GrammarError::new(
                        GrammarErrorKind::EmptyPattern,
                        Some(&pattern.name),
                        "a literal token pattern must not be empty",
                    )));
                }
                if let Err(existing) = self.dfa.insert(&pattern.pattern, index) {
                    return Err(AddPatternError::Grammar(GrammarError::new(
                        GrammarErrorKind::DuplicateTokenId,
                        Some(&pattern.name),
                        format!(
                            "literal {:?} duplicates pattern {:?}",
                            pattern.pattern, self.patterns[existing].name
                        ),
                    )));
                }
            }
            TokenPatternKind::Regex => {
                let regex = Regex::compile(&pattern.pattern, self.ignore_case)?;
                if regex.matches_empty() {
                    return Err(AddPatternError::Grammar(GrammarError::new(
                        GrammarErrorKind::EmptyPattern,
                        Some(&pattern.name),
                        "a regex token pattern must not match the empty string",
                    )));
                }
                let leading = regex.leading_set();
                self.regexes.push((index, regex, leading));
            }
        }
        self.by_id.insert(pattern.id, index);
        self.patterns.push(pattern);
        Ok(())
    }

    /// Find the winning pattern at `start`: longest match wins, ties broken by
    /// registration order (spec §4.4/§4.5.2). Returns the outcome, whether any
    /// candidate ran off the end of the input (a hint for `unexpected-eof`),
    /// alongside the usual I/O error channel.
    pub fn best_match<I: MatchInput>(
        &self,
        input: &mut I,
        start: usize,
    ) -> Result<(Option<MatchOutcome>, bool), I::Error> {
        let mut best: Option<MatchOutcome> = None;
        let mut hit_end = false;

        let (dfa_hit, dfa_end) = self.dfa.longest_match(input, start)?;
        hit_end |= dfa_end;
        if let Some((index, len)) = dfa_hit {
            best = Some(MatchOutcome {
                pattern_index: index,
                length: len,
            });
        }

        let lead_char = input.at(start)?;
        for (index, regex, leading) in &self.regexes {
            if let Some(c) = lead_char {
                if !leading.contains(c) {
                    continue;
                }
            } else {
                continue;
            }
            let mut matcher = crate::regex_engine::Matcher::new(regex);
            if let Some(len) = matcher.try_match(input, start, 0)? {
                let candidate = MatchOutcome {
                    pattern_index: *index,
                    length: len,
                };
                best = Some(match best {
                    Some(current)
                        if current.length > candidate.length
                            || (current.length == candidate.length && current.pattern_index < candidate.pattern_index) =>
                    {
                        current
                    }
                    _ => candidate,
                });
            }
            if matcher.hit_end_of_input() {
                hit_end = true;
            }
        }

        match &best {
            Some(outcome) => self.log_at(Log::Success(()), || {
                format!(
                    "matched {} ({} units) at offset {}",
                    self.patterns[outcome.pattern_index].name, outcome.length, start
                )
            }),
            None => self.log_at(Log::Default(()), || format!("no pattern matched at offset {}", start)),
        }

        Ok((best, hit_end))
    }

    pub fn build_grammar(&self) -> String {
        let mut out = String::new();
        for p in &self.patterns {
            let flags = match (p.ignore, p.error) {
                (true, _) => " (ignore)",
                (_, true) => " (error)",
                _ => "",
            };
            out.push_str(&format!("{:>6}: {} = {}{}\n", p.id, p.name, p, flags));
        }
        out
    }
}

impl std::fmt::Display for TokenPatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.build_grammar())
    }
}

#[derive(Debug)]
pub enum AddPatternError {
    Grammar(GrammarError),
    Regex(RegexError),
}

impl From<RegexError> for AddPatternError {
    fn from(value: RegexError) -> Self {
        AddPatternError::Regex(value)
    }
}

impl std::fmt::Display for AddPatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddPatternError::Grammar(e) => write!(f, "{}", e),
            AddPatternError::Regex(e) => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for AddPatternError {}

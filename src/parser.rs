//! LL(k) recursive-descent parser (spec §4.8 / C8): ties the token registry,
//! production grammar, and look-ahead facts together. `prepare()` validates
//! and freezes the grammar; `parse()` drives a tokenizer through it,
//! producing a [`ParseTree`] and an accumulating [`ParserLogException`] for
//! anything that went wrong along the way.

use crate::buffer::CharSource;
use crate::config::ParserConfig;
use crate::error::{GrammarError, GrammarErrorKind, ParseException, ParseExceptionKind, ParserLogException};
use crate::lookahead::{self, GrammarFacts};
use crate::production::{AltElement, Occurs, ProductionAlternative, ProductionId, ProductionRegistry, RefKind};
use crate::registry::{AddPatternError, TokenPatternRegistry};
use crate::token_pattern::{TokenId, TokenPattern, EOF_ID};
use crate::tokenizer::{Token, Tokenizer};
use crate::tree::{NodeId, ParseTree};
use crate::util::{Log, Logging};
use once_cell::unsync::OnceCell;
use std::collections::VecDeque;

pub struct Parser {
    tokens: TokenPatternRegistry,
    productions: ProductionRegistry,
    start: Option<ProductionId>,
    facts: Option<GrammarFacts>,
    config: ParserConfig,
    debugger: OnceCell<Log<&'static str>>,
}

impl Logging for Parser {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.debugger
    }
}

impl Parser {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            tokens: TokenPatternRegistry::new(ignore_case),
            productions: ProductionRegistry::new(),
            start: None,
            facts: None,
            config: ParserConfig::default(),
            debugger: OnceCell::new(),
        }
    }

    pub fn with_config(ignore_case: bool, config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::new(ignore_case)
        }
    }

    pub fn add_token(&mut self, pattern: TokenPattern) -> Result<TokenId, AddPatternError> {
        let id = pattern.id;
        self.tokens.add(pattern)?;
        self.facts = None;
        Ok(id)
    }

    pub fn declare_production(&mut self, id: ProductionId, name: impl Into<String>) -> Result<(), GrammarError> {
        self.productions.declare(id, name)?;
        self.facts = None;
        Ok(())
    }

    /// Like [`declare_production`](Self::declare_production), but the
    /// production's own node is spliced out of the parse tree in favor of
    /// its children (spec §3).
    pub fn declare_hidden_production(&mut self, id: ProductionId, name: impl Into<String>) -> Result<(), GrammarError> {
        self.productions.declare_hidden(id, name)?;
        self.facts = None;
        Ok(())
    }

    pub fn add_alternative(&mut self, production: ProductionId, elements: Vec<AltElement>) -> Result<(), GrammarError> {
        let index = self.productions.index_of_id(production).ok_or_else(|| {
            GrammarError::new(GrammarErrorKind::UnknownTarget, None, format!("no such production id {}", production))
        })?;
        self.productions.add_alternative(index, ProductionAlternative::new(elements))?;
        self.facts = None;
        Ok(())
    }

    pub fn set_start(&mut self, production: ProductionId) {
        self.start = Some(production);
        self.facts = None;
    }

    pub fn tokens(&self) -> &TokenPatternRegistry {
        &self.tokens
    }

    pub fn productions(&self) -> &ProductionRegistry {
        &self.productions
    }

    /// Validate every alternative's targets, compute nullability, reject
    /// left recursion, and compute each production's disambiguating
    /// look-ahead set. Must succeed before [`parse`](Self::parse) can run.
    pub fn prepare(&mut self) -> Result<(), GrammarError> {
        for production in self.productions.all() {
            for alt in &production.alternatives {
                for el in &alt.elements {
                    let known = match el.kind {
                        RefKind::Token => el.target == EOF_ID || self.tokens.index_of_id(el.target).is_some(),
                        RefKind::Production => self.productions.index_of_id(el.target).is_some(),
                    };
                    if !known {
                        return Err(GrammarError::new(
                            GrammarErrorKind::UnknownTarget,
                            Some(&production.name),
                            format!("alternative references unknown target {}", el.target),
                        ));
                    }
                }
            }
        }
        if let Some(start) = self.start {
            if self.productions.index_of_id(start).is_none() {
                return Err(GrammarError::new(
                    GrammarErrorKind::UnknownTarget,
                    None,
                    "start production is not declared",
                ));
            }
        } else {
            return Err(GrammarError::new(GrammarErrorKind::NotPrepared, None, "no start production set"));
        }

        let facts = lookahead::analyze_with_max_k(&self.productions, self.config.max_lookahead as usize)?;
        self.facts = Some(facts);
        Ok(())
    }

    /// Build a human-readable dump of the grammar: token patterns, then each
    /// production's alternatives, annotated with the look-ahead `k` that was
    /// needed to disambiguate it. Debug/introspection tool only.
    pub fn build_grammar(&self) -> String {
        let mut out = String::new();
        out.push_str("# tokens\n");
        out.push_str(&self.tokens.build_grammar());
        out.push_str("# productions\n");
        for (i, production) in self.productions.all().iter().enumerate() {
            let k = self.facts.as_ref().map(|f| f.k_used[i]).unwrap_or(0);
            out.push_str(&format!("{}({}) [k={}]:\n", production.name, production.id, k));
            for alt in &production.alternatives {
                let parts: Vec<String> = alt
                    .elements
                    .iter()
                    .map(|el| format!("{:?}:{}{}", el.kind, el.target, occurs_suffix(el.occurs)))
                    .collect();
                out.push_str(&format!("  | {}\n", parts.join(" ")));
            }
        }
        out
    }

    pub fn parse<S: CharSource, V>(&self, source: S) -> Result<ParseResult<V>, GrammarError> {
        let facts = self
            .facts
            .as_ref()
            .ok_or_else(|| GrammarError::new(GrammarErrorKind::NotPrepared, None, "call prepare() before parse()"))?;
        let start_id = self
            .start
            .ok_or_else(|| GrammarError::new(GrammarErrorKind::NotPrepared, None, "no start production set"))?;
        let start_idx = self.productions.index_of_id(start_id).expect("validated in prepare()");

        let tokenizer = Tokenizer::with_registry(source, self.tokens.clone());
        let mut cursor = TokenCursor::new(tokenizer);
        let mut builder = ParseTree::<V>::new();

        let root = match self.parse_production(&mut cursor, facts, start_idx, &mut builder, None) {
            Ok(id) => id,
            Err(Stop) => {
                let start = self.productions.get(start_idx);
                builder.reserve_production(None, start.id, start.name.clone(), start.hidden)
            }
        };

        // Anything left over after the start production finished is a
        // trailing-garbage unexpected-token, unless it's just EOF.
        if let Some(tok) = cursor.peek(0) {
            if !tok.is_eof() {
                cursor.errors.push(ParseException::new(
                    ParseExceptionKind::UnexpectedToken,
                    format!("unexpected trailing token {}", tok.name),
                    tok.start,
                ));
            }
        }

        let tree = builder.finish(root);
        self.log_at(Log::Result(()), || format!("parse finished with {} error(s)", cursor.errors.len()));
        Ok(ParseResult {
            tree,
            errors: ParserLogException::new(cursor.errors),
        })
    }

    fn parse_production<V>(
        &self,
        cursor: &mut TokenCursor<impl CharSource>,
        facts: &GrammarFacts,
        prod_idx: usize,
        builder: &mut crate::tree::TreeBuilder<V>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, Stop> {
        let production = self.productions.get(prod_idx);
        let node = builder.reserve_production(parent, production.id, production.name.clone(), production.hidden);

        let alt_idx = self.select_alternative(cursor, facts, prod_idx)?;
        let alternative = &self.productions.get(prod_idx).alternatives[alt_idx];
        let mut children = Vec::new();
        for el in &alternative.elements {
            children.extend(self.parse_element(cursor, facts, el, builder, node)?);
        }
        builder.set_children(node, children);
        Ok(node)
    }

    fn select_alternative(
        &self,
        cursor: &mut TokenCursor<impl CharSource>,
        facts: &GrammarFacts,
        prod_idx: usize,
    ) -> Result<usize, Stop> {
        let k = facts.k_used[prod_idx];
        loop {
            let actual = cursor.peek_ids(k);
            for (alt_idx, set) in facts.alternative_sets[prod_idx].iter().enumerate() {
                if set.matches_prefix(&actual) {
                    return Ok(alt_idx);
                }
            }
            let tok = cursor.peek(0).ok_or(Stop)?;
            if tok.is_eof() {
                cursor.errors.push(ParseException::new(
                    ParseExceptionKind::UnexpectedEof,
                    format!("unexpected end of input while parsing {}", self.productions.get(prod_idx).name),
                    tok.start,
                ));
                return Err(Stop);
            }
            // Cascaded errors from a contiguous run of skipped tokens are
            // suppressed after the first (spec §4.8.3); the flag clears the
            // next time a token is actually consumed into the tree.
            cursor.log_unexpected(ParseException::new(
                ParseExceptionKind::UnexpectedToken,
                format!(
                    "token {} does not start any alternative of {}",
                    tok.name,
                    self.productions.get(prod_idx).name
                ),
                tok.start,
            ));
            cursor.advance();
            if cursor.fatal {
                return Err(Stop);
            }
        }
    }

    fn parse_element<V>(
        &self,
        cursor: &mut TokenCursor<impl CharSource>,
        facts: &GrammarFacts,
        el: &AltElement,
        builder: &mut crate::tree::TreeBuilder<V>,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, Stop> {
        let mut out = Vec::new();
        let mut count = 0usize;
        loop {
            if !el.occurs.allows(count + 1) {
                break;
            }
            if count > 0 && !self.can_start(cursor, facts, el) {
                break;
            }
            match el.kind {
                RefKind::Token => {
                    let tok = match cursor.peek(0) {
                        Some(t) => t,
                        None => break,
                    };
                    if tok.pattern_id != el.target {
                        if count == 0 && el.occurs.is_optional() {
                            break;
                        }
                        if count >= el.occurs.min {
                            break;
                        }
                        // Required token missing: log once, synthesize a hole
                        // for every occurrence still owed, and fall through to
                        // the remaining elements of this alternative instead
                        // of unwinding the whole parse (spec §4.8.3).
                        cursor.log_unexpected(ParseException::new(
                            ParseExceptionKind::UnexpectedToken,
                            format!("expected token {} but found {}", self.token_name(el.target), tok.name),
                            tok.start,
                        ));
                        self.log_at(Log::Default(()), || {
                            format!("synthesizing hole for {} at {}", self.token_name(el.target), tok.start)
                        });
                        while count < el.occurs.min {
                            out.push(builder.push_hole(Some(parent), el.target, self.token_name(el.target), tok.start));
                            count += 1;
                        }
                        break;
                    }
                    let tok = cursor.advance().expect("peeked above");
                    if cursor.fatal {
                        return Err(Stop);
                    }
                    cursor.clear_suppression();
                    out.push(builder.push_token(Some(parent), tok.pattern_id, tok.name, tok.image, tok.start, tok.end));
                }
                RefKind::Production => {
                    let idx = self.productions.index_of_id(el.target).expect("validated in prepare()");
                    if count == 0 && el.occurs.is_optional() && !self.can_start(cursor, facts, el) {
                        break;
                    }
                    out.push(self.parse_production(cursor, facts, idx, builder, Some(parent))?);
                }
            }
            count += 1;
        }
        if count < el.occurs.min {
            if let Some(tok) = cursor.peek(0) {
                cursor.errors.push(ParseException::new(
                    ParseExceptionKind::UnexpectedToken,
                    format!("expected at least {} occurrence(s), got {}", el.occurs.min, count),
                    tok.start,
                ));
            }
        }
        Ok(out)
    }

    fn token_name(&self, target: TokenId) -> String {
        if target == EOF_ID {
            "EOF".to_string()
        } else {
            self.tokens
                .get(self.tokens.index_of_id(target).expect("validated in prepare()"))
                .name
                .clone()
        }
    }

    fn can_start(&self, cursor: &mut TokenCursor<impl CharSource>, facts: &GrammarFacts, el: &AltElement) -> bool {
        let tok = match cursor.peek(0) {
            Some(t) => t,
            None => return false,
        };
        if tok.is_eof() {
            return false;
        }
        match el.kind {
            RefKind::Token => tok.pattern_id == el.target,
            RefKind::Production => {
                let idx = match self.productions.index_of_id(el.target) {
                    Some(idx) => idx,
                    None => return false,
                };
                facts.first1[idx].leading_tokens().contains(&tok.pattern_id)
            }
        }
    }
}

fn occurs_suffix(occurs: Occurs) -> String {
    match (occurs.min, occurs.max) {
        (1, Some(1)) => String::new(),
        (0, Some(1)) => "?".to_string(),
        (0, None) => "*".to_string(),
        (1, None) => "+".to_string(),
        (min, Some(max)) => format!("{{{},{}}}", min, max),
        (min, None) => format!("{{{},}}", min),
    }
}

pub struct ParseResult<V> {
    pub tree: ParseTree<V>,
    pub errors: ParserLogException,
}

/// Signals the parse loop must stop immediately: a fatal tokenizer error
/// (`unexpected-eof`, `io-failure`) or running entirely out of input while
/// still expecting more. The triggering [`ParseException`] is already in
/// `TokenCursor::errors` by the time this is returned.
struct Stop;

struct TokenCursor<S: CharSource> {
    tokenizer: Tokenizer<S>,
    pending: VecDeque<Token>,
    errors: Vec<ParseException>,
    eof_reached: bool,
    fatal: bool,
    suppress_unexpected: bool,
}

impl<S: CharSource> TokenCursor<S> {
    fn new(tokenizer: Tokenizer<S>) -> Self {
        Self {
            tokenizer,
            pending: VecDeque::new(),
            errors: Vec::new(),
            eof_reached: false,
            fatal: false,
            suppress_unexpected: false,
        }
    }

    /// Log an unexpected-token error, but only the first of a contiguous run
    /// (spec §4.8.3: cascaded errors within the same production are
    /// suppressed until a token is successfully consumed).
    fn log_unexpected(&mut self, err: ParseException) {
        if !self.suppress_unexpected {
            self.errors.push(err);
        }
        self.suppress_unexpected = true;
    }

    fn clear_suppression(&mut self) {
        self.suppress_unexpected = false;
    }

    /// Fill `pending` until index `n` is available, logging and recovering
    /// from non-fatal tokenizer errors along the way. Sets `fatal` and stops
    /// early on an unrecoverable one.
    fn ensure(&mut self, n: usize) {
        while self.pending.len() <= n && !self.eof_reached && !self.fatal {
            match self.tokenizer.next() {
                Ok(tok) => {
                    if tok.is_eof() {
                        self.eof_reached = true;
                    }
                    self.pending.push_back(tok);
                }
                Err(e) => {
                    let fatal = e.kind.is_fatal();
                    let character_error = e.kind == ParseExceptionKind::UnexpectedCharacter;
                    self.errors.push(e);
                    if fatal {
                        self.fatal = true;
                    } else if character_error {
                        self.tokenizer.skip_one_unit();
                    }
                }
            }
        }
    }

    fn peek(&mut self, n: usize) -> Option<Token> {
        self.ensure(n);
        self.pending.get(n).cloned()
    }

    fn peek_ids(&mut self, k: usize) -> Vec<TokenId> {
        let mut out = Vec::new();
        for i in 0..k {
            match self.peek(i) {
                Some(tok) => {
                    let is_eof = tok.is_eof();
                    out.push(tok.pattern_id);
                    if is_eof {
                        break;
                    }
                }
                None => break,
            }
        }
        out
    }

    fn advance(&mut self) -> Option<Token> {
        self.ensure(0);
        self.pending.pop_front()
    }
}

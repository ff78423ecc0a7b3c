//! The regular-expression engine (spec §4.2 / C2): compiles a pattern string
//! into an element arena and matches it against a [`MatchInput`], enumerating
//! candidate match lengths in a per-element preference order instead of
//! driving a state machine, so that [`crate::registry::TokenPatternRegistry`]
//! can cheaply ask "is there a longer match available" without backtracking
//! through mutable matcher state.

mod ast;
mod matcher;
mod parser;

pub use ast::{CharSet, CharSetItem, ElementNode, NodeId, PredefinedClass, RepeatMax, RepeatMode};
pub use matcher::{MatchInput, Matcher, StrInput};

use crate::error::RegexError;
use parser::RegexCompiler;

#[derive(Debug, Clone)]
/// A compiled regular expression: an element arena plus the root node index.
/// Immutable and shareable after compilation (spec §4.9); concurrent matching
/// is safe because each [`Matcher`] owns its own memoization table rather than
/// mutating the tree.
pub struct Regex {
    source: String,
    arena: Vec<ElementNode>,
    root: NodeId,
    ignore_case: bool,
}

impl Regex {
    pub fn compile(pattern: &str, ignore_case: bool) -> Result<Self, RegexError> {
        let (arena, root) = RegexCompiler::compile(pattern, ignore_case)?;
        Ok(Self {
            source: pattern.to_string(),
            arena,
            root,
            ignore_case,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Longest match length at `start`, or `None`. Convenience over
    /// `Matcher::try_match` with `skip = 0`.
    pub fn longest_match<I: MatchInput>(
        &self,
        input: &mut I,
        start: usize,
    ) -> Result<Option<usize>, I::Error> {
        Matcher::new(self).try_match(input, start, 0)
    }

    /// Whether this pattern can match the empty string. Token patterns must
    /// not be nullable (spec §4.5 requires every match to advance the buffer).
    pub fn matches_empty(&self) -> bool {
        let mut input = StrInput::new("");
        matches!(self.longest_match(&mut input, 0), Ok(Some(0)))
    }
}

#[derive(Debug, Clone)]
/// The set of characters a pattern's match can start with, used by the token
/// registry (spec §4.4) to skip regex patterns that cannot possibly apply at
/// the tokenizer's current position. `Any` is always a safe (if unhelpful)
/// answer; it is returned whenever the exact leading set can't be bounded
/// cheaply (predefined classes, large ranges, nested groups).
pub enum LeadingSet {
    Any,
    Chars(std::collections::BTreeSet<char>),
}

impl LeadingSet {
    pub fn contains(&self, c: char) -> bool {
        match self {
            LeadingSet::Any => true,
            LeadingSet::Chars(set) => set.contains(&c),
        }
    }

    fn union(self, other: LeadingSet) -> LeadingSet {
        match (self, other) {
            (LeadingSet::Chars(mut a), LeadingSet::Chars(b)) => {
                a.extend(b);
                LeadingSet::Chars(a)
            }
            _ => LeadingSet::Any,
        }
    }
}

const MAX_EXACT_RANGE: u32 = 128;

impl Regex {
    pub fn leading_set(&self) -> LeadingSet {
        self.leading_of(self.root)
    }

    fn leading_of(&self, id: NodeId) -> LeadingSet {
        match &self.arena[id] {
            ElementNode::Literal(s) => {
                let c = s.chars().next().expect("literal atoms are never empty");
                LeadingSet::Chars(std::iter::once(c).collect())
            }
            ElementNode::CharSet(set) => self.leading_of_charset(set),
            ElementNode::Concat(a, b) => {
                if self.nullable(*a) {
                    self.leading_of(*a).union(self.leading_of(*b))
                } else {
                    self.leading_of(*a)
                }
            }
            ElementNode::Alt(a, b) => self.leading_of(*a).union(self.leading_of(*b)),
            ElementNode::Repeat { child, min, .. } => {
                if *min == 0 {
                    LeadingSet::Any
                } else {
                    self.leading_of(*child)
                }
            }
        }
    }

    fn leading_of_charset(&self, set: &CharSet) -> LeadingSet {
        if set.negated {
            return LeadingSet::Any;
        }
        let mut out = std::collections::BTreeSet::new();
        for item in &set.items {
            match item {
                CharSetItem::Char(c) => {
                    out.insert(*c);
                }
                CharSetItem::Range(lo, hi) => {
                    if (*hi as u32).saturating_sub(*lo as u32) > MAX_EXACT_RANGE {
                        return LeadingSet::Any;
                    }
                    let mut c = *lo as u32;
                    while c <= *hi as u32 {
                        if let Some(ch) = char::from_u32(c) {
                            out.insert(ch);
                        }
                        c += 1;
                    }
                }
                CharSetItem::Predefined(_) | CharSetItem::Nested(_) => return LeadingSet::Any,
            }
        }
        LeadingSet::Chars(out)
    }

    fn nullable(&self, id: NodeId) -> bool {
        match &self.arena[id] {
            ElementNode::Literal(_) | ElementNode::CharSet(_) => false,
            ElementNode::Concat(a, b) => self.nullable(*a) && self.nullable(*b),
            ElementNode::Alt(a, b) => self.nullable(*a) || self.nullable(*b),
            ElementNode::Repeat { min, .. } => *min == 0,
        }
    }
}

impl std::fmt::Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/", self.source.replace('/', "\\/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len_at(pattern: &str, input: &str, ignore_case: bool) -> Option<usize> {
        let re = Regex::compile(pattern, ignore_case).unwrap();
        let mut src = StrInput::new(input);
        re.longest_match(&mut src, 0).unwrap()
    }

    #[test]
    fn literal_merge_matches_full_string() {
        assert_eq!(len_at("keyword", "keyword rest", false), Some(7));
    }

    #[test]
    fn possessive_does_not_backtrack() {
        // a?+a against "a" fails: the possessive `a?` greedily eats the only 'a'.
        assert_eq!(len_at("a?+a", "a", false), None);
    }

    #[test]
    fn reluctant_star_grows_to_satisfy_suffix() {
        assert_eq!(len_at("a*?b", "aaab", false), Some(4));
    }

    #[test]
    fn bounded_possessive_repeat() {
        assert_eq!(len_at("a{2,3}+", "aaaa", false), Some(3));
        assert_eq!(len_at("a{2,3}+", "a", false), None);
    }

    #[test]
    fn case_insensitive_class() {
        assert_eq!(len_at("[A-Za-z]+", "HeLLo World", true), Some(5));
        assert_eq!(len_at("[A-Za-z]+", "hello", true), Some(5));
    }

    #[test]
    fn invalid_repeat_count_rejected() {
        assert!(Regex::compile("a{3,2}", false).is_err());
        assert!(Regex::compile("a{0}", false).is_err());
    }

    #[test]
    fn anchors_rejected() {
        assert!(Regex::compile("^abc$", false).is_err());
    }

    #[test]
    fn unsupported_escape_rejected() {
        assert!(Regex::compile(r"\q", false).is_err());
    }

    #[test]
    fn dot_excludes_newline_family() {
        assert_eq!(len_at(".", "\n", false), None);
        assert_eq!(len_at(".", "x", false), Some(1));
    }

    #[test]
    fn alternation_prefers_first_branch_order() {
        let re = Regex::compile("(a|ab)", false).unwrap();
        let mut input = StrInput::new("ab");
        let mut matcher = Matcher::new(&re);
        assert_eq!(matcher.try_match(&mut input, 0, 0).unwrap(), Some(1));
        assert_eq!(matcher.try_match(&mut input, 0, 1).unwrap(), Some(2));
    }

    #[test]
    fn three_digit_octal_escape_reaches_its_full_range() {
        // \0101 = octal 101 = 65 = 'A', not the 2-digit \010 (backspace)
        // followed by a stray literal '1'.
        assert_eq!(len_at(r"\0101", "A", false), Some(1));
        assert_eq!(len_at(r"\0101", "A1", false), Some(1));
    }

    #[test]
    fn octal_escape_caps_third_digit_to_leading_0_to_3() {
        // first digit 7 is outside 0-3, so only two digits are consumed:
        // \077 = octal 77 = 63 = '?', leaving a literal '7' behind.
        assert_eq!(len_at(r"\0777", "?7", false), Some(2));
    }

    #[test]
    fn bare_octal_introducer_is_nul() {
        assert_eq!(len_at(r"\0", "\u{0}x", false), Some(1));
    }
}

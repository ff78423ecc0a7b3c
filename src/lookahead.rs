//! Look-ahead computation (spec §4.7 / C7): fixed-point First_k sets over the
//! whole grammar, nullability, left-recursion detection, and the ambiguity
//! check that decides whether a production's k needs to grow (up to a bound)
//! before its alternatives can be told apart.

use crate::error::{GrammarError, GrammarErrorKind};
use crate::production::{ProductionRegistry, RefKind};
use crate::token_pattern::{TokenId, EOF_ID};
use std::collections::BTreeSet;

/// Default and per-production cap on look-ahead length. The spec allows
/// raising k per production only as far as needed to disambiguate; 3 is the
/// ceiling past which inherent ambiguity is reported instead of growing
/// further.
pub const MAX_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenSeq(pub Vec<TokenId>);

#[derive(Debug, Clone, PartialEq, Eq)]
/// A set of terminal look-ahead sequences, each at most `k` tokens long. A
/// sequence shorter than `k` means a derivation that ends (nullable tail or
/// EOF) before `k` tokens are available — it still participates in overlap
/// checks as itself, it is never padded.
pub struct LookAheadSet {
    k: usize,
    sequences: BTreeSet<Vec<TokenId>>,
}

impl LookAheadSet {
    pub fn empty(k: usize) -> Self {
        Self {
            k,
            sequences: BTreeSet::new(),
        }
    }

    pub fn epsilon(k: usize) -> Self {
        let mut s = Self::empty(k);
        s.sequences.insert(Vec::new());
        s
    }

    pub fn single_token(id: TokenId, k: usize) -> Self {
        let mut s = Self::empty(k);
        s.sequences.insert(vec![id]);
        s
    }

    pub fn eof(k: usize) -> Self {
        Self::single_token(EOF_ID, k)
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Vec<TokenId>> {
        self.sequences.iter()
    }

    pub fn union(&mut self, other: &LookAheadSet) -> bool {
        let before = self.sequences.len();
        for seq in &other.sequences {
            self.sequences.insert(seq.clone());
        }
        self.sequences.len() != before
    }

    /// `self ++ other` truncated to `k`: sequences already at length `k` pass
    /// through unchanged (they're already maximal and terminal); shorter ones
    /// get `other`'s continuations appended.
    pub fn concat(&self, other: &LookAheadSet, k: usize) -> LookAheadSet {
        let mut out = LookAheadSet::empty(k);
        for a in &self.sequences {
            if a.len() >= k {
                out.sequences.insert(a.clone());
                continue;
            }
            for b in &other.sequences {
                let mut seq = a.clone();
                seq.extend(b.iter().take(k - a.len()));
                out.sequences.insert(seq);
            }
        }
        out
    }

    pub fn at_k(&self, k: usize) -> LookAheadSet {
        let mut out = LookAheadSet::empty(k);
        for seq in &self.sequences {
            let mut truncated = seq.clone();
            truncated.truncate(k);
            out.sequences.insert(truncated);
        }
        out
    }

    pub fn disjoint_from(&self, other: &LookAheadSet) -> bool {
        self.sequences.is_disjoint(&other.sequences)
    }

    pub fn contains(&self, seq: &[TokenId]) -> bool {
        self.sequences.contains(seq)
    }

    /// True if any stored sequence is a prefix of `actual` (or equal to it,
    /// when `actual` itself ends early at EOF). This is the comparison the
    /// parser uses to pick an alternative: a recorded sequence shorter than
    /// `k` means a derivation that finishes before `k` tokens are available,
    /// so it only needs to match the equivalent prefix of what's upcoming.
    pub fn matches_prefix(&self, actual: &[TokenId]) -> bool {
        self.sequences.iter().any(|s| {
            if s.len() <= actual.len() {
                &actual[..s.len()] == s.as_slice()
            } else {
                s[..actual.len()] == actual[..]
            }
        })
    }

    pub fn leading_tokens(&self) -> BTreeSet<TokenId> {
        self.sequences
            .iter()
            .filter_map(|s| s.first().copied())
            .collect()
    }
}

/// Whole-grammar nullability, first-sets, and recursion facts, computed once
/// by [`analyze`] and consulted by [`crate::parser`] during `prepare()`.
pub struct GrammarFacts {
    pub nullable: Vec<bool>,
    pub left_recursive: Vec<bool>,
    /// Per-production look-ahead set, computed at the smallest k (1..=MAX_K)
    /// that disambiguates all of that production's alternatives from each
    /// other, alongside each alternative's own set at that k.
    pub alternative_sets: Vec<Vec<LookAheadSet>>,
    pub k_used: Vec<usize>,
    /// Each production's First_1 set, used by the parser to decide whether to
    /// attempt one more occurrence of a repeated element without needing the
    /// full disambiguating k for the production being repeated.
    pub first1: Vec<LookAheadSet>,
}

pub fn analyze(productions: &ProductionRegistry) -> Result<GrammarFacts, GrammarError> {
    analyze_with_max_k(productions, MAX_K)
}

/// Same as [`analyze`], but with the per-production `k` escalation ceiling
/// taken from [`crate::config::ParserConfig::max_lookahead`] instead of the
/// crate-wide [`MAX_K`] default.
pub fn analyze_with_max_k(productions: &ProductionRegistry, max_k: usize) -> Result<GrammarFacts, GrammarError> {
    let max_k = max_k.max(1);
    let n = productions.len();
    let nullable = compute_nullable(productions);
    let left_recursive = compute_left_recursive(productions, &nullable);

    for (i, &lr) in left_recursive.iter().enumerate() {
        if lr {
            return Err(GrammarError::new(
                GrammarErrorKind::LeftRecursive,
                Some(&productions.get(i).name),
                "production is left-recursive",
            ));
        }
    }

    let mut alternative_sets = vec![Vec::new(); n];
    let mut k_used = vec![1usize; n];

    for i in 0..n {
        let production = productions.get(i);
        if production.alternatives.is_empty() {
            return Err(GrammarError::new(
                GrammarErrorKind::NoAlternatives,
                Some(&production.name),
                "production has no alternatives",
            ));
        }
        let mut k = 1usize;
        loop {
            let first_k = first_k_all(productions, &nullable, k);
            let sets: Vec<LookAheadSet> = production
                .alternatives
                .iter()
                .map(|alt| alt_first_k(productions, &nullable, &first_k, &alt.elements, k))
                .collect();
            if pairwise_disjoint(&sets) {
                alternative_sets[i] = sets;
                k_used[i] = k;
                break;
            }
            if k >= max_k {
                return Err(GrammarError::new(
                    GrammarErrorKind::InherentAmbiguity,
                    Some(&production.name),
                    format!(
                        "alternatives remain ambiguous after raising look-ahead to {}",
                        max_k
                    ),
                ));
            }
            k += 1;
        }
    }

    let first1 = first_k_all(productions, &nullable, 1);

    Ok(GrammarFacts {
        nullable,
        left_recursive,
        alternative_sets,
        k_used,
        first1,
    })
}

fn pairwise_disjoint(sets: &[LookAheadSet]) -> bool {
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            if !sets[i].disjoint_from(&sets[j]) {
                return false;
            }
        }
    }
    true
}

fn compute_nullable(productions: &ProductionRegistry) -> Vec<bool> {
    let n = productions.len();
    let mut nullable = vec![false; n];
    loop {
        let mut changed = false;
        for i in 0..n {
            if nullable[i] {
                continue;
            }
            let production = productions.get(i);
            let is_nullable = production.alternatives.iter().any(|alt| {
                alt.elements.iter().all(|el| {
                    if el.occurs.is_optional() {
                        return true;
                    }
                    match el.kind {
                        RefKind::Token => false,
                        RefKind::Production => productions
                            .index_of_id(el.target)
                            .map(|idx| nullable[idx])
                            .unwrap_or(false),
                    }
                })
            });
            if is_nullable {
                nullable[i] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    nullable
}

/// `P -> Q` whenever `Q` can be the first symbol consumed while expanding `P`
/// (skipping any nullable optional prefix elements first). `P` is
/// left-recursive if this graph has a cycle reaching `P` itself.
fn compute_left_recursive(productions: &ProductionRegistry, nullable: &[bool]) -> Vec<bool> {
    let n = productions.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for alt in &productions.get(i).alternatives {
            for el in &alt.elements {
                if let RefKind::Production = el.kind {
                    if let Some(target) = productions.index_of_id(el.target) {
                        edges[i].push(target);
                    }
                }
                if !el.occurs.is_optional() {
                    break;
                }
            }
        }
    }

    let mut result = vec![false; n];
    for start in 0..n {
        let mut visited = vec![false; n];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &next in &edges[node] {
                if next == start {
                    result[start] = true;
                    stack.clear();
                    break;
                }
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
    }
    let _ = nullable;
    result
}

fn first_k_all(productions: &ProductionRegistry, nullable: &[bool], k: usize) -> Vec<LookAheadSet> {
    let n = productions.len();
    let mut sets = vec![LookAheadSet::empty(k); n];
    loop {
        let mut changed = false;
        for i in 0..n {
            let mut combined = LookAheadSet::empty(k);
            for alt in &productions.get(i).alternatives {
                let alt_set = alt_first_k(productions, nullable, &sets, &alt.elements, k);
                combined.union(&alt_set);
            }
            if combined != sets[i] {
                sets[i] = combined;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    sets
}

fn alt_first_k(
    productions: &ProductionRegistry,
    nullable: &[bool],
    first_sets: &[LookAheadSet],
    elements: &[crate::production::AltElement],
    k: usize,
) -> LookAheadSet {
    let mut acc = LookAheadSet::epsilon(k);
    for el in elements {
        let el_set = match el.kind {
            RefKind::Token => LookAheadSet::single_token(el.target, k),
            RefKind::Production => {
                let idx = match productions.index_of_id(el.target) {
                    Some(idx) => idx,
                    None => continue,
                };
                first_sets[idx].clone()
            }
        };
        let step = if el.occurs.is_optional() {
            let mut s = el_set.clone();
            s.union(&LookAheadSet::epsilon(k));
            s
        } else {
            el_set
        };
        acc = acc.concat(&step, k);
    }
    acc
}

//! Production pattern data model (spec §4.6 / C6): a production is a set of
//! alternatives, each a sequence of token/production references carrying a
//! repeat count. Whole-grammar properties that need a fixed point over every
//! production (nullability, left-recursion, first-sets) live in
//! [`crate::lookahead`]; this module only owns the data and the checks that
//! are local to a single alternative as it's added.

use crate::error::{GrammarError, GrammarErrorKind};
use std::collections::HashMap;

pub type ProductionId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Token,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How many times an element may repeat within an alternative. `max = None`
/// means unbounded, matching the regex engine's `RepeatMax::Unbounded`.
pub struct Occurs {
    pub min: usize,
    pub max: Option<usize>,
}

impl Occurs {
    pub const ONE: Occurs = Occurs {
        min: 1,
        max: Some(1),
    };

    pub fn new(min: usize, max: Option<usize>) -> Result<Self, GrammarError> {
        if let Some(max) = max {
            if max < min || max == 0 {
                return Err(GrammarError::new(
                    GrammarErrorKind::InvalidOccurs,
                    None,
                    format!("invalid occurs range {{{},{:?}}}", min, max),
                ));
            }
        }
        Ok(Self { min, max })
    }

    pub fn allows(&self, count: usize) -> bool {
        self.max.map_or(true, |max| count <= max)
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One element of an alternative: a reference to a token or production,
/// repeated `occurs` times.
pub struct AltElement {
    pub kind: RefKind,
    pub target: i32,
    pub occurs: Occurs,
}

impl AltElement {
    pub fn token(target: i32) -> Self {
        Self {
            kind: RefKind::Token,
            target,
            occurs: Occurs::ONE,
        }
    }

    pub fn production(target: ProductionId) -> Self {
        Self {
            kind: RefKind::Production,
            target,
            occurs: Occurs::ONE,
        }
    }

    pub fn repeated(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionAlternative {
    pub elements: Vec<AltElement>,
}

impl ProductionAlternative {
    pub fn new(elements: Vec<AltElement>) -> Self {
        Self { elements }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable once built: the set of alternatives a non-terminal can expand
/// into. Order matters — alternatives are tried in registration order when
/// their look-ahead sets overlap only via the k-bound escalation in
/// [`crate::lookahead`].
pub struct ProductionPattern {
    pub id: ProductionId,
    pub name: String,
    pub alternatives: Vec<ProductionAlternative>,
    /// A hidden (synthetic) production never appears as a node of its own in
    /// the parse tree; its children splice into its parent's child list at
    /// the position it would have occupied (spec §3).
    pub hidden: bool,
}

impl ProductionPattern {
    pub fn new(id: ProductionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            alternatives: Vec::new(),
            hidden: false,
        }
    }
}

#[derive(Debug)]
pub struct ProductionRegistry {
    productions: Vec<ProductionPattern>,
    by_id: HashMap<ProductionId, usize>,
    by_name: HashMap<String, usize>,
}

impl ProductionRegistry {
    pub fn new() -> Self {
        Self {
            productions: Vec::new(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn get(&self, index: usize) -> &ProductionPattern {
        &self.productions[index]
    }

    pub fn all(&self) -> &[ProductionPattern] {
        &self.productions
    }

    pub fn index_of_id(&self, id: ProductionId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn declare(&mut self, id: ProductionId, name: impl Into<String>) -> Result<usize, GrammarError> {
        let name = name.into();
        if self.by_id.contains_key(&id) {
            return Err(GrammarError::new(
                GrammarErrorKind::DuplicateProductionId,
                Some(&name),
                format!("production id {} is already declared", id),
            ));
        }
        if self.by_name.contains_key(&name) {
            return Err(GrammarError::new(
                GrammarErrorKind::DuplicateProductionName,
                Some(&name),
                "production name is already declared",
            ));
        }
        let index = self.productions.len();
        self.by_id.insert(id, index);
        self.by_name.insert(name.clone(), index);
        self.productions.push(ProductionPattern::new(id, name));
        Ok(index)
    }

    /// Declare a production whose node never shows up in the parse tree —
    /// only its children do, spliced into its parent at the position it
    /// would have occupied. Useful for grammar-internal helper productions
    /// (precedence ladders, grouping) that shouldn't clutter the output tree.
    pub fn declare_hidden(&mut self, id: ProductionId, name: impl Into<String>) -> Result<usize, GrammarError> {
        let index = self.declare(id, name)?;
        self.productions[index].hidden = true;
        Ok(index)
    }

    /// Add one alternative to a previously declared production. Rejects an
    /// exact structural duplicate (same elements in the same order) — catching
    /// the common copy-paste mistake early rather than only via the later
    /// ambiguity analysis.
    pub fn add_alternative(
        &mut self,
        index: usize,
        alternative: ProductionAlternative,
    ) -> Result<(), GrammarError> {
        let production = &mut self.productions[index];
        if production.alternatives.contains(&alternative) {
            return Err(GrammarError::new(
                GrammarErrorKind::DuplicateAlternative,
                Some(&production.name),
                "this alternative is already registered for this production",
            ));
        }
        production.alternatives.push(alternative);
        Ok(())
    }
}

impl Default for ProductionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

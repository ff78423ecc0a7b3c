use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use super::ast::{ElementNode, NodeId, RepeatMax, RepeatMode};
use super::Regex;
use crate::buffer::{CharSource, LookAheadBuffer};

/// Abstracts over the thing a [`Regex`] matches against: a live tokenizer
/// buffer, or a plain in-memory string for standalone regex use and tests.
pub trait MatchInput {
    type Error;
    fn at(&mut self, pos: usize) -> Result<Option<char>, Self::Error>;
}

impl<S: CharSource> MatchInput for LookAheadBuffer<S> {
    type Error = crate::buffer::BufferError;
    fn at(&mut self, pos: usize) -> Result<Option<char>, Self::Error> {
        self.peek_char(pos)
    }
}

/// A fixed in-memory string, addressed by char index. Used by standalone regex
/// matching (no tokenizer involved).
pub struct StrInput {
    chars: Vec<char>,
}

impl StrInput {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self {
            chars: s.as_ref().chars().collect(),
        }
    }
}

impl MatchInput for StrInput {
    type Error = Infallible;
    fn at(&mut self, pos: usize) -> Result<Option<char>, Infallible> {
        Ok(self.chars.get(pos).copied())
    }
}

/// Runs one `match` call (spec §4.2.2) over a fresh cache: each top-level call
/// gets its own memoization table, which is what makes running the same
/// [`Regex`] concurrently from separate `Matcher`s safe even though `Regex`
/// itself has no per-match state (resolving the clone-on-match concern from
/// spec §4.2.2/§4.9 without tree cloning).
pub struct Matcher<'r> {
    regex: &'r Regex,
    cache: HashMap<(NodeId, usize), Rc<Vec<usize>>>,
    /// Sticky flag: set whenever a sub-match ran off the end of the input.
    /// Tells the tokenizer that more input might change the outcome.
    hit_end: bool,
}

impl<'r> Matcher<'r> {
    pub fn new(regex: &'r Regex) -> Self {
        Self {
            regex,
            cache: HashMap::new(),
            hit_end: false,
        }
    }

    pub fn hit_end_of_input(&self) -> bool {
        self.hit_end
    }

    /// Returns the `skip`-th match length (0-based) in preference order
    /// starting at `start`, or `None` if fewer than `skip + 1` matches exist.
    pub fn try_match<I: MatchInput>(
        &mut self,
        input: &mut I,
        start: usize,
        skip: usize,
    ) -> Result<Option<usize>, I::Error> {
        let lengths = self.enumerate(input, self.regex.root, start)?;
        Ok(lengths.get(skip).copied())
    }

    fn fold(&self, c: char) -> char {
        if self.regex.ignore_case {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    }

    fn enumerate<I: MatchInput>(
        &mut self,
        input: &mut I,
        id: NodeId,
        start: usize,
    ) -> Result<Rc<Vec<usize>>, I::Error> {
        if let Some(cached) = self.cache.get(&(id, start)) {
            return Ok(cached.clone());
        }
        // Clone the node to release the borrow on `self.regex` before recursing
        // (recursion needs `&mut self.cache`).
        let node = self.regex.arena[id].clone();
        let lengths = match node {
            ElementNode::Literal(s) => self.match_literal(input, &s, start)?,
            ElementNode::CharSet(set) => match input.at(start)? {
                Some(c) if set.matches(self.fold(c)) => vec![1],
                Some(_) => vec![],
                None => {
                    self.hit_end = true;
                    vec![]
                }
            },
            ElementNode::Concat(a, b) => {
                let la = self.enumerate(input, a, start)?;
                let mut out = Vec::new();
                for &alen in la.iter() {
                    let lb = self.enumerate(input, b, start + alen)?;
                    for &blen in lb.iter() {
                        out.push(alen + blen);
                    }
                }
                out
            }
            ElementNode::Alt(a, b) => {
                let mut out: Vec<usize> = self.enumerate(input, a, start)?.as_ref().clone();
                for &l in self.enumerate(input, b, start)?.iter() {
                    if !out.contains(&l) {
                        out.push(l);
                    }
                }
                out
            }
            ElementNode::Repeat {
                child,
                min,
                max,
                mode,
            } => self.enumerate_repeat(input, child, start, min, max, mode)?,
        };
        let rc = Rc::new(lengths);
        self.cache.insert((id, start), rc.clone());
        Ok(rc)
    }

    fn match_literal<I: MatchInput>(
        &mut self,
        input: &mut I,
        s: &str,
        start: usize,
    ) -> Result<Vec<usize>, I::Error> {
        let mut count = 0usize;
        for expected in s.chars() {
            match input.at(start + count)? {
                Some(c) if self.fold(c) == expected => count += 1,
                Some(_) => return Ok(vec![]),
                None => {
                    self.hit_end = true;
                    return Ok(vec![]);
                }
            }
        }
        Ok(vec![count])
    }

    fn enumerate_repeat<I: MatchInput>(
        &mut self,
        input: &mut I,
        child: NodeId,
        start: usize,
        min: usize,
        max: RepeatMax,
        mode: RepeatMode,
    ) -> Result<Vec<usize>, I::Error> {
        if mode == RepeatMode::Possessive {
            let mut count = 0usize;
            let mut pos = start;
            loop {
                if !max.allows(count + 1) {
                    break;
                }
                let lens = self.enumerate(input, child, pos)?;
                match lens.first() {
                    Some(&len) if len > 0 => {
                        pos += len;
                        count += 1;
                    }
                    _ => break,
                }
            }
            return Ok(if count >= min { vec![pos - start] } else { vec![] });
        }

        // Greedy / reluctant: BFS frontier of positions reachable after each
        // repeat count, skipping zero-width repeats to guarantee termination.
        let mut frontiers: Vec<Vec<usize>> = vec![vec![start]];
        let mut count = 0usize;
        loop {
            if !max.allows(count + 1) {
                break;
            }
            let current = frontiers[count].clone();
            if current.is_empty() {
                break;
            }
            let mut next_positions: Vec<usize> = Vec::new();
            for pos in current {
                for &len in self.enumerate(input, child, pos)?.iter() {
                    if len == 0 {
                        continue;
                    }
                    let next = pos + len;
                    if !next_positions.contains(&next) {
                        next_positions.push(next);
                    }
                }
            }
            if next_positions.is_empty() {
                break;
            }
            frontiers.push(next_positions);
            count += 1;
        }

        let mut lengths: Vec<usize> = Vec::new();
        let available = frontiers.len();
        if min >= available {
            return Ok(lengths);
        }
        let counts: Box<dyn Iterator<Item = usize>> = if mode == RepeatMode::Greedy {
            Box::new((min..available).rev())
        } else {
            Box::new(min..available)
        };
        for c in counts {
            for &pos in &frontiers[c] {
                let len = pos - start;
                if !lengths.contains(&len) {
                    lengths.push(len);
                }
            }
        }
        Ok(lengths)
    }
}

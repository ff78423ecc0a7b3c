//! Shared-prefix trie matcher for literal token patterns (spec §4.3 / C3).
//! Branching at each node uses a character-keyed binary search over children,
//! generalizing the teacher's byte-keyed `FieldTree` to full `char`s so
//! literal patterns aren't restricted to single-byte alphabets.

use crate::regex_engine::MatchInput;

#[derive(Debug, Clone)]
struct Node<T> {
    terminal: Option<T>,
    children: Vec<(char, Node<T>)>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            terminal: None,
            children: Vec::new(),
        }
    }

    fn insert(&mut self, chars: &[char], value: T) -> Result<(), T> {
        if chars.is_empty() {
            return match self.terminal.replace(value) {
                Some(existing) => Err(existing),
                None => Ok(()),
            };
        }
        match self
            .children
            .binary_search_by_key(&chars[0], |(c, _)| *c)
        {
            Ok(i) => self.children[i].1.insert(&chars[1..], value),
            Err(i) => {
                let mut node = Node::new();
                node.insert(&chars[1..], value)?;
                self.children.insert(i, (chars[0], node));
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
/// Compiles a set of literal strings into a shared trie. `T` is the terminal
/// payload (typically a token pattern id); clone it cheaply (an integer id).
pub struct DfaMatcher<T> {
    root: Node<T>,
    ignore_case: bool,
}

impl<T: Clone> DfaMatcher<T> {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            root: Node::new(),
            ignore_case,
        }
    }

    fn fold(&self, c: char) -> char {
        if self.ignore_case {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    }

    /// Insert a literal; duplicate literals return the previously-registered
    /// value as `Err`.
    pub fn insert(&mut self, literal: &str, value: T) -> Result<(), T> {
        let chars: Vec<char> = literal.chars().map(|c| self.fold(c)).collect();
        self.root.insert(&chars, value)
    }

    /// Walk the trie from `start`, returning the longest terminal reached
    /// along the path and whether the walk ran off the end of the input.
    pub fn longest_match<I: MatchInput>(
        &self,
        input: &mut I,
        start: usize,
    ) -> Result<(Option<(T, usize)>, bool), I::Error> {
        let mut node = &self.root;
        let mut offset = 0usize;
        let mut best: Option<(T, usize)> = self
            .root
            .terminal
            .as_ref()
            .map(|t| (t.clone(), 0));
        let mut hit_end = false;
        loop {
            match input.at(start + offset)? {
                None => {
                    hit_end = true;
                    break;
                }
                Some(c) => {
                    let folded = self.fold(c);
                    match node
                        .children
                        .binary_search_by_key(&folded, |(ch, _)| *ch)
                    {
                        Ok(i) => {
                            node = &node.children[i].1;
                            offset += 1;
                            if let Some(t) = &node.terminal {
                                best = Some((t.clone(), offset));
                            }
                        }
                        Err(_) => break,
                    }
                }
            }
        }
        Ok((best, hit_end))
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty() && self.root.terminal.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex_engine::StrInput;

    #[test]
    fn longest_terminal_wins() {
        let mut dfa = DfaMatcher::new(false);
        dfa.insert("a", 1u32).unwrap();
        dfa.insert("ab", 2u32).unwrap();
        dfa.insert("abc", 3u32).unwrap();
        let mut input = StrInput::new("abcd");
        let (m, _) = dfa.longest_match(&mut input, 0).unwrap();
        assert_eq!(m, Some((3, 3)));
    }

    #[test]
    fn no_match_returns_none() {
        let mut dfa = DfaMatcher::new(false);
        dfa.insert("xyz", 1u32).unwrap();
        let mut input = StrInput::new("abc");
        let (m, _) = dfa.longest_match(&mut input, 0).unwrap();
        assert_eq!(m, None);
    }

    #[test]
    fn case_insensitive_lookup() {
        let mut dfa = DfaMatcher::new(true);
        dfa.insert("Keyword", 1u32).unwrap();
        let mut input = StrInput::new("KEYWORD");
        let (m, _) = dfa.longest_match(&mut input, 0).unwrap();
        assert_eq!(m, Some((1, 7)));
    }

    #[test]
    fn duplicate_literal_rejected() {
        let mut dfa = DfaMatcher::new(false);
        dfa.insert("if", 1u32).unwrap();
        assert_eq!(dfa.insert("if", 2u32), Err(1u32));
    }
}

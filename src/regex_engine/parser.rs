use super::ast::{CharSet, CharSetItem, ElementNode, NodeId, PredefinedClass, RepeatMax, RepeatMode};
use crate::error::{RegexError, RegexErrorKind};

/// Parses one pattern string into an element arena following the grammar in
/// spec §4.2.1: `Expr = Term ('|' Expr)? ; Term = Fact+ ; Fact = Atom Modifier? ;
/// Atom = '.' | '(' Expr ')' | '[' CharSet ']' | Char`.
pub struct RegexCompiler<'p> {
    pattern: &'p str,
    chars: Vec<char>,
    pos: usize,
    ignore_case: bool,
    arena: Vec<ElementNode>,
}

type CompileResult<T> = Result<T, RegexError>;

impl<'p> RegexCompiler<'p> {
    pub fn compile(pattern: &'p str, ignore_case: bool) -> CompileResult<(Vec<ElementNode>, NodeId)> {
        let mut compiler = Self {
            pattern,
            chars: pattern.chars().collect(),
            pos: 0,
            ignore_case,
            arena: Vec::new(),
        };
        let root = compiler.parse_expr()?;
        if compiler.pos != compiler.chars.len() {
            return Err(compiler.error(RegexErrorKind::UnexpectedCharacter, "unmatched ')'"));
        }
        Ok((compiler.arena, root))
    }

    fn error(&self, kind: RegexErrorKind, detail: impl Into<String>) -> RegexError {
        RegexError::new(kind, self.pattern, self.pos, detail)
    }

    fn push(&mut self, node: ElementNode) -> NodeId {
        self.arena.push(node);
        self.arena.len() - 1
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn fold(&self, c: char) -> char {
        if self.ignore_case {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    }

    // Expr = Term ('|' Expr)?
    fn parse_expr(&mut self) -> CompileResult<NodeId> {
        let term = self.parse_term()?;
        if self.peek() == Some('|') {
            self.bump();
            let rest = self.parse_expr()?;
            Ok(self.push(ElementNode::Alt(term, rest)))
        } else {
            Ok(term)
        }
    }

    // Term = Fact+, adjacent literal facts merge into one string literal.
    fn parse_term(&mut self) -> CompileResult<NodeId> {
        let mut facts: Vec<NodeId> = Vec::new();
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                _ => facts.push(self.parse_fact()?),
            }
        }
        if facts.is_empty() {
            return Err(self.error(RegexErrorKind::UnexpectedCharacter, "empty alternative"));
        }
        let merged = self.merge_literals(facts);
        Ok(self.concat_chain(merged))
    }

    /// Required optimization (spec §4.2.1): consecutive literal atoms collapse
    /// into a single multi-character `Literal`.
    fn merge_literals(&mut self, facts: Vec<NodeId>) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for id in facts {
            if let (Some(&last), ElementNode::Literal(s)) =
                (out.last(), self.arena[id].clone())
            {
                if let ElementNode::Literal(prev) = &self.arena[last] {
                    let mut combined = prev.clone();
                    combined.push_str(&s);
                    self.arena[last] = ElementNode::Literal(combined);
                    continue;
                }
            }
            out.push(id);
        }
        out
    }

    fn concat_chain(&mut self, nodes: Vec<NodeId>) -> NodeId {
        let mut iter = nodes.into_iter().rev();
        let mut acc = iter.next().expect("non-empty term");
        for node in iter {
            acc = self.push(ElementNode::Concat(node, acc));
        }
        acc
    }

    // Fact = Atom Modifier?
    fn parse_fact(&mut self) -> CompileResult<NodeId> {
        let atom = self.parse_atom()?;
        self.parse_modifier(atom)
    }

    fn parse_atom(&mut self) -> CompileResult<NodeId> {
        match self.peek() {
            Some('.') => {
                self.bump();
                Ok(self.push(ElementNode::CharSet(CharSet {
                    negated: false,
                    items: vec![CharSetItem::Predefined(PredefinedClass::Dot)],
                })))
            }
            Some('(') => {
                self.bump();
                let inner = self.parse_expr()?;
                if self.bump() != Some(')') {
                    return Err(self.error(RegexErrorKind::UnterminatedPattern, "missing ')'"));
                }
                Ok(inner)
            }
            Some('[') => {
                self.bump();
                let set = self.parse_charset()?;
                if self.bump() != Some(']') {
                    return Err(self.error(RegexErrorKind::UnterminatedPattern, "missing ']'"));
                }
                Ok(self.push(ElementNode::CharSet(set)))
            }
            Some('^') | Some('$') => Err(self.error(
                RegexErrorKind::UnsupportedSpecialCharacter,
                "'^'/'$' anchors are not supported",
            )),
            Some(c) if "?*+{)|".contains(c) => {
                Err(self.error(RegexErrorKind::UnexpectedCharacter, format!("unexpected '{}'", c)))
            }
            Some('\\') => {
                self.bump();
                self.parse_escape_atom()
            }
            Some(c) => {
                self.bump();
                let folded = self.fold(c);
                Ok(self.push(ElementNode::Literal(folded.to_string())))
            }
            None => Err(self.error(RegexErrorKind::UnterminatedPattern, "unexpected end of pattern")),
        }
    }

    fn parse_escape_atom(&mut self) -> CompileResult<NodeId> {
        if let Some(class) = self.try_predefined_class() {
            return Ok(self.push(ElementNode::CharSet(class)));
        }
        let c = self.escape_literal_char()?;
        let folded = self.fold(c);
        Ok(self.push(ElementNode::Literal(folded.to_string())))
    }

    fn try_predefined_class(&mut self) -> Option<CharSet> {
        let (class, negated) = match self.peek()? {
            'd' => (PredefinedClass::Digit, false),
            'D' => (PredefinedClass::NonDigit, false),
            's' => (PredefinedClass::Space, false),
            'S' => (PredefinedClass::NonSpace, false),
            'w' => (PredefinedClass::Word, false),
            'W' => (PredefinedClass::NonWord, false),
            _ => return None,
        };
        self.bump();
        let _ = negated;
        Some(CharSet {
            negated: false,
            items: vec![CharSetItem::Predefined(class)],
        })
    }

    /// Resolves a single literal character from an escape sequence whose first
    /// backslash has already been consumed. Does not handle `\d`/`\w`/... —
    /// callers should try [`try_predefined_class`](Self::try_predefined_class) first.
    fn escape_literal_char(&mut self) -> CompileResult<char> {
        let c = self.bump().ok_or_else(|| {
            self.error(RegexErrorKind::UnterminatedPattern, "dangling '\\'")
        })?;
        match c {
            't' => Ok('\t'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            'f' => Ok('\u{000C}'),
            'a' => Ok('\u{0007}'),
            'e' => Ok('\u{001B}'),
            '0' => self.parse_octal(),
            'x' => self.parse_hex(2),
            'u' => self.parse_hex(4),
            c if c.is_ascii_alphabetic() => Err(self.error(
                RegexErrorKind::UnsupportedEscapeCharacter,
                format!("unsupported escape '\\{}'", c),
            )),
            c => Ok(c),
        }
    }

    /// `\0nnn`: 1 to 3 octal digits (spec §4.2.1). A third digit is only
    /// read when the first is `0`-`3`, keeping the value within a `char`'s
    /// single-byte range the way `\0mnn` (m = 0-3) does.
    fn parse_octal(&mut self) -> CompileResult<char> {
        let mut digits = String::new();
        if let Some(c) = self.peek() {
            if ('0'..='7').contains(&c) {
                digits.push(c);
                self.bump();
            }
        }
        let max_more = match digits.chars().next() {
            Some(d) if ('0'..='3').contains(&d) => 2,
            Some(_) => 1,
            None => 0,
        };
        for _ in 0..max_more {
            match self.peek() {
                Some(c) if ('0'..='7').contains(&c) => {
                    digits.push(c);
                    self.bump();
                }
                _ => break,
            }
        }
        let value = if digits.is_empty() {
            0
        } else {
            u32::from_str_radix(&digits, 8).unwrap_or(0)
        };
        char::from_u32(value)
            .ok_or_else(|| self.error(RegexErrorKind::UnexpectedCharacter, "invalid octal escape"))
    }

    fn parse_hex(&mut self, width: usize) -> CompileResult<char> {
        let mut digits = String::new();
        for _ in 0..width {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    digits.push(c);
                    self.bump();
                }
                _ => {
                    return Err(self.error(
                        RegexErrorKind::UnterminatedPattern,
                        format!("expected {} hex digits", width),
                    ))
                }
            }
        }
        let value = u32::from_str_radix(&digits, 16).unwrap();
        char::from_u32(value)
            .ok_or_else(|| self.error(RegexErrorKind::UnexpectedCharacter, "invalid hex escape"))
    }

    fn parse_charset(&mut self) -> CompileResult<CharSet> {
        let negated = if self.peek() == Some('^') {
            self.bump();
            true
        } else {
            false
        };
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(RegexErrorKind::UnterminatedPattern, "unterminated '['"))
                }
                Some(']') => break,
                _ => items.push(self.parse_charset_item()?),
            }
        }
        Ok(CharSet { negated, items })
    }

    fn parse_charset_item(&mut self) -> CompileResult<CharSetItem> {
        let first = self.charset_char()?;
        if let Some(class) = first.as_class() {
            return Ok(CharSetItem::Predefined(class));
        }
        let lo = first.as_char();
        if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
            self.bump();
            let second = self.charset_char()?;
            if second.as_class().is_some() {
                return Err(self.error(
                    RegexErrorKind::UnexpectedCharacter,
                    "a class cannot be a range endpoint",
                ));
            }
            return Ok(CharSetItem::Range(lo, second.as_char()));
        }
        Ok(CharSetItem::Char(lo))
    }

    fn charset_char(&mut self) -> CompileResult<CharsetAtom> {
        match self.bump() {
            Some('\\') => {
                if let Some(class) = self.try_predefined_class() {
                    let item = class.items.into_iter().next().unwrap();
                    if let CharSetItem::Predefined(c) = item {
                        return Ok(CharsetAtom::Class(c));
                    }
                }
                Ok(CharsetAtom::Literal(self.fold(self.escape_literal_char()?)))
            }
            Some(c) => Ok(CharsetAtom::Literal(self.fold(c))),
            None => Err(self.error(RegexErrorKind::UnterminatedPattern, "unterminated '['")),
        }
    }

    fn parse_modifier(&mut self, atom: NodeId) -> CompileResult<NodeId> {
        let (min, max) = match self.peek() {
            Some('?') => {
                self.bump();
                (0, RepeatMax::Finite(1))
            }
            Some('*') => {
                self.bump();
                (0, RepeatMax::Unbounded)
            }
            Some('+') => {
                self.bump();
                (1, RepeatMax::Unbounded)
            }
            Some('{') => {
                self.bump();
                self.parse_bounded_repeat()?
            }
            _ => return Ok(atom),
        };
        if let RepeatMax::Finite(m) = max {
            if min > m || m == 0 {
                return Err(self.error(RegexErrorKind::InvalidRepeatCount, format!("{{{},{}}}", min, m)));
            }
        }
        let mode = match self.peek() {
            Some('?') => {
                self.bump();
                RepeatMode::Reluctant
            }
            Some('+') => {
                self.bump();
                RepeatMode::Possessive
            }
            _ => RepeatMode::Greedy,
        };
        Ok(self.push(ElementNode::Repeat {
            child: atom,
            min,
            max,
            mode,
        }))
    }

    fn parse_bounded_repeat(&mut self) -> CompileResult<(usize, RepeatMax)> {
        let min = self.parse_number()?;
        let max = if self.peek() == Some(',') {
            self.bump();
            if self.peek() == Some('}') {
                RepeatMax::Unbounded
            } else {
                RepeatMax::Finite(self.parse_number()?)
            }
        } else {
            RepeatMax::Finite(min)
        };
        if self.bump() != Some('}') {
            return Err(self.error(RegexErrorKind::UnterminatedPattern, "missing '}'"));
        }
        Ok((min, max))
    }

    fn parse_number(&mut self) -> CompileResult<usize> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(self.error(RegexErrorKind::InvalidRepeatCount, "expected a number"));
        }
        digits
            .parse()
            .map_err(|_| self.error(RegexErrorKind::InvalidRepeatCount, "repeat count overflow"))
    }
}

enum CharsetAtom {
    Literal(char),
    Class(PredefinedClass),
}

impl CharsetAtom {
    fn as_class(&self) -> Option<PredefinedClass> {
        match self {
            CharsetAtom::Class(c) => Some(*c),
            _ => None,
        }
    }
    fn as_char(&self) -> char {
        match self {
            CharsetAtom::Literal(c) => *c,
            CharsetAtom::Class(_) => unreachable!("class is not a range endpoint"),
        }
    }
}

use grammatica::buffer::StrSource;
use grammatica::error::ParseExceptionKind;
use grammatica::parser::Parser;
use grammatica::production::{AltElement, Occurs};
use grammatica::token_pattern::TokenPattern;
use grammatica::tree::ParseTree;

/// `expr := term (plus_term)*`, `term := factor (star_factor)*`,
/// `factor := NUMBER | LPAREN expr RPAREN`. Left recursion isn't available in
/// this grammar model, so repetition lives on the `plus_term`/`star_factor`
/// helper productions instead of on `expr`/`term` referencing themselves.
fn build_arithmetic_parser() -> Parser {
    let mut parser = Parser::new(false);
    let number = parser.add_token(TokenPattern::regex(1, "NUMBER", r"[0-9]+")).unwrap();
    let plus = parser.add_token(TokenPattern::literal(2, "PLUS", "+")).unwrap();
    let star = parser.add_token(TokenPattern::literal(3, "STAR", "*")).unwrap();
    let lparen = parser.add_token(TokenPattern::literal(4, "LPAREN", "(")).unwrap();
    let rparen = parser.add_token(TokenPattern::literal(5, "RPAREN", ")")).unwrap();
    parser
        .add_token(TokenPattern::regex(6, "WS", r"[ \t\n]+").ignored())
        .unwrap();

    parser.declare_production(1, "expr").unwrap();
    parser.declare_production(2, "term").unwrap();
    parser.declare_production(3, "factor").unwrap();
    parser.declare_production(10, "plus_term").unwrap();
    parser.declare_production(11, "star_factor").unwrap();

    parser
        .add_alternative(10, vec![AltElement::token(plus), AltElement::production(2)])
        .unwrap();
    parser
        .add_alternative(11, vec![AltElement::token(star), AltElement::production(3)])
        .unwrap();
    parser.add_alternative(3, vec![AltElement::token(number)]).unwrap();
    parser
        .add_alternative(
            3,
            vec![
                AltElement::token(lparen),
                AltElement::production(1),
                AltElement::token(rparen),
            ],
        )
        .unwrap();
    parser
        .add_alternative(
            2,
            vec![
                AltElement::production(3),
                AltElement::production(11).repeated(Occurs::new(0, None).unwrap()),
            ],
        )
        .unwrap();
    parser
        .add_alternative(
            1,
            vec![
                AltElement::production(2),
                AltElement::production(10).repeated(Occurs::new(0, None).unwrap()),
            ],
        )
        .unwrap();

    parser.set_start(1);
    parser.prepare().unwrap();
    parser
}

fn eval(tree: &ParseTree<f64>, id: usize) -> f64 {
    if tree.is_token(id) {
        return tree.image(id).unwrap().parse().unwrap();
    }
    let children = tree.children(id);
    match tree.name(id) {
        "factor" if children.len() == 1 => eval(tree, children[0]),
        "factor" => eval(tree, children[1]),
        "star_factor" | "plus_term" => eval(tree, children[1]),
        "term" => children[1..].iter().fold(eval(tree, children[0]), |acc, &c| acc * eval(tree, c)),
        "expr" => children[1..].iter().fold(eval(tree, children[0]), |acc, &c| acc + eval(tree, c)),
        other => panic!("unexpected node {}", other),
    }
}

#[test]
fn evaluates_with_precedence_and_parens() {
    let parser = build_arithmetic_parser();
    let result = parser.parse::<_, f64>(StrSource::new("2 + 3 * (4 + 5)")).unwrap();
    assert!(result.errors.is_empty());

    let value = eval(&result.tree, result.tree.root());
    assert_eq!(value, 29.0);

    let mut tree = result.tree;
    tree.push_value(tree.root(), value);
    assert_eq!(tree.values(tree.root()), &[29.0]);
}

#[test]
fn tree_dump_matches_normative_shape() {
    let parser = build_arithmetic_parser();
    let result = parser.parse::<_, ()>(StrSource::new("2")).unwrap();
    let dump = result.tree.dump_to_string();
    assert!(dump.starts_with("expr(1)\n"));
    assert!(dump.contains("  term(2)\n"));
    assert!(dump.contains("NUMBER(1): \"2\", line: 1, col: 1"));
}

#[test]
fn unexpected_token_is_logged_but_parsing_continues() {
    let parser = build_arithmetic_parser();
    let result = parser.parse::<_, ()>(StrSource::new("2 + + 3")).unwrap();
    assert!(!result.errors.is_empty());
    assert_eq!(result.errors[0].kind, ParseExceptionKind::UnexpectedToken);
}

#[test]
fn unexpected_character_inside_an_expression_is_logged() {
    let parser = build_arithmetic_parser();
    let result = parser.parse::<_, ()>(StrSource::new("2 + @ 3")).unwrap();
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == ParseExceptionKind::UnexpectedCharacter));
}

#[test]
fn hidden_production_children_splice_into_parent() {
    // list := ITEM (sep)*, sep := COMMA ITEM (hidden) — `sep`'s own node
    // should never appear; its COMMA/ITEM children splice straight into
    // `list`'s children at the point `sep` would have occupied.
    let mut parser = Parser::new(false);
    let item = parser.add_token(TokenPattern::regex(1, "ITEM", r"[a-z]+")).unwrap();
    let comma = parser.add_token(TokenPattern::literal(2, "COMMA", ",")).unwrap();
    parser
        .add_token(TokenPattern::regex(3, "WS", r"[ \t]+").ignored())
        .unwrap();

    parser.declare_production(1, "list").unwrap();
    parser.declare_hidden_production(2, "sep").unwrap();
    parser
        .add_alternative(2, vec![AltElement::token(comma), AltElement::token(item)])
        .unwrap();
    parser
        .add_alternative(
            1,
            vec![
                AltElement::token(item),
                AltElement::production(2).repeated(Occurs::new(0, None).unwrap()),
            ],
        )
        .unwrap();
    parser.set_start(1);
    parser.prepare().unwrap();

    let result = parser.parse::<_, ()>(StrSource::new("a, b, c")).unwrap();
    assert!(result.errors.is_empty());

    let root = result.tree.root();
    let children = result.tree.children(root);
    assert_eq!(children.len(), 5);
    for &c in &children {
        assert_ne!(result.tree.name(c), "sep");
    }
    let images: Vec<&str> = children.iter().map(|&c| result.tree.image(c).unwrap()).collect();
    assert_eq!(images, vec!["a", ",", "b", ",", "c"]);
}

#[test]
fn missing_required_token_becomes_a_hole_and_the_rest_of_the_tree_survives() {
    // "(2 + 3" is missing its closing RPAREN. The factor production should
    // still produce LPAREN, the fully-parsed "2 + 3" expr subtree, and a
    // zero-width hole standing in for RPAREN — not an empty placeholder root.
    let parser = build_arithmetic_parser();
    let result = parser.parse::<_, ()>(StrSource::new("(2 + 3")).unwrap();
    assert!(!result.errors.is_empty());
    assert_eq!(result.errors[0].kind, ParseExceptionKind::UnexpectedToken);

    let tree = &result.tree;
    assert_eq!(tree.name(tree.root()), "expr");

    let term = tree.children(tree.root())[0];
    assert_eq!(tree.name(term), "term");
    let factor = tree.children(term)[0];
    assert_eq!(tree.name(factor), "factor");

    let factor_children = tree.children(factor);
    assert_eq!(factor_children.len(), 3);
    assert_eq!(tree.image(factor_children[0]), Some("("));
    assert_eq!(tree.name(factor_children[1]), "expr");
    assert!(tree.is_hole(factor_children[2]));
    assert_eq!(tree.image(factor_children[2]), Some(""));

    let value = eval(&result.tree, result.tree.root());
    assert_eq!(value, 5.0);
}

#[test]
fn cascaded_unexpected_tokens_log_only_one_error() {
    // Two stray PLUS tokens in a row ("2 + + + 3") should suppress the
    // second cascaded error and log exactly one, per the recovery flag in
    // select_alternative/parse_element.
    let parser = build_arithmetic_parser();
    let result = parser.parse::<_, ()>(StrSource::new("2 + + + 3")).unwrap();
    let unexpected: Vec<_> = result
        .errors
        .iter()
        .filter(|e| e.kind == ParseExceptionKind::UnexpectedToken)
        .collect();
    assert_eq!(unexpected.len(), 1);
}

#[test]
fn left_recursive_production_is_rejected_at_prepare() {
    let mut parser = Parser::new(false);
    let plus = parser.add_token(TokenPattern::literal(2, "PLUS", "+")).unwrap();
    let number = parser.add_token(TokenPattern::regex(1, "NUMBER", r"[0-9]+")).unwrap();
    parser.declare_production(1, "expr").unwrap();
    parser
        .add_alternative(1, vec![AltElement::production(1), AltElement::token(plus), AltElement::token(number)])
        .unwrap();
    parser.add_alternative(1, vec![AltElement::token(number)]).unwrap();
    parser.set_start(1);
    assert!(parser.prepare().is_err());
}

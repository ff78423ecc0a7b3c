use grammatica::buffer::StrSource;
use grammatica::parser::Parser;
use grammatica::production::{AltElement, Occurs};
use grammatica::token_pattern::TokenPattern;

/// A grammar describing the regex mini-language's own concrete syntax,
/// built with the same `Parser` API an ordinary user grammar would use.
/// `expr := term (alt_term)*`, `term := fact+`, `fact := atom modifier?`,
/// `atom := CHAR | DOT | char_set | LPAREN expr RPAREN`,
/// `char_set := LBRACKET char_item+ RBRACKET`. `char_item` and `alt_term`
/// are hidden productions — they exist only to carry a repeatable element
/// plus its delimiter, so their children splice straight into `char_set`/
/// `expr` rather than showing up as nodes of their own.
fn build_regex_grammar() -> Parser {
    let mut parser = Parser::new(false);
    let char_tok = parser.add_token(TokenPattern::regex(1, "CHAR", "[a-zA-Z0-9]")).unwrap();
    let dot = parser.add_token(TokenPattern::literal(2, "DOT", ".")).unwrap();
    let plus = parser.add_token(TokenPattern::literal(3, "PLUS", "+")).unwrap();
    let question = parser.add_token(TokenPattern::literal(4, "QUESTION", "?")).unwrap();
    let star = parser.add_token(TokenPattern::literal(5, "STAR", "*")).unwrap();
    let lbracket = parser.add_token(TokenPattern::literal(6, "LBRACKET", "[")).unwrap();
    let rbracket = parser.add_token(TokenPattern::literal(7, "RBRACKET", "]")).unwrap();
    let lparen = parser.add_token(TokenPattern::literal(8, "LPAREN", "(")).unwrap();
    let rparen = parser.add_token(TokenPattern::literal(9, "RPAREN", ")")).unwrap();
    let pipe = parser.add_token(TokenPattern::literal(10, "PIPE", "|")).unwrap();
    let dash = parser.add_token(TokenPattern::literal(11, "DASH", "-")).unwrap();

    parser.declare_production(1, "expr").unwrap();
    parser.declare_production(2, "term").unwrap();
    parser.declare_production(3, "fact").unwrap();
    parser.declare_production(4, "atom").unwrap();
    parser.declare_production(5, "char_set").unwrap();
    parser.declare_hidden_production(6, "char_item").unwrap();
    parser.declare_production(7, "modifier").unwrap();
    parser.declare_hidden_production(8, "alt_term").unwrap();

    parser
        .add_alternative(6, vec![AltElement::token(char_tok)])
        .unwrap();
    parser.add_alternative(6, vec![AltElement::token(dash)]).unwrap();
    parser.add_alternative(6, vec![AltElement::token(dot)]).unwrap();

    parser
        .add_alternative(7, vec![AltElement::token(plus)])
        .unwrap();
    parser
        .add_alternative(7, vec![AltElement::token(question)])
        .unwrap();
    parser.add_alternative(7, vec![AltElement::token(star)]).unwrap();

    parser
        .add_alternative(
            5,
            vec![
                AltElement::token(lbracket),
                AltElement::production(6).repeated(Occurs::new(1, None).unwrap()),
                AltElement::token(rbracket),
            ],
        )
        .unwrap();

    parser.add_alternative(4, vec![AltElement::token(char_tok)]).unwrap();
    parser.add_alternative(4, vec![AltElement::token(dot)]).unwrap();
    parser.add_alternative(4, vec![AltElement::production(5)]).unwrap();
    parser
        .add_alternative(
            4,
            vec![AltElement::token(lparen), AltElement::production(1), AltElement::token(rparen)],
        )
        .unwrap();

    parser
        .add_alternative(
            3,
            vec![
                AltElement::production(4),
                AltElement::production(7).repeated(Occurs::new(0, Some(1)).unwrap()),
            ],
        )
        .unwrap();

    parser
        .add_alternative(2, vec![AltElement::production(3).repeated(Occurs::new(1, None).unwrap())])
        .unwrap();

    parser.add_alternative(8, vec![AltElement::token(pipe), AltElement::production(2)]).unwrap();

    parser
        .add_alternative(
            1,
            vec![
                AltElement::production(2),
                AltElement::production(8).repeated(Occurs::new(0, None).unwrap()),
            ],
        )
        .unwrap();

    parser.set_start(1);
    parser.prepare().unwrap();
    parser
}

#[test]
fn regex_pattern_parses_into_expected_tree_shape() {
    let parser = build_regex_grammar();
    let result = parser.parse::<_, ()>(StrSource::new("[a-z.]+(a|b).?")).unwrap();
    assert!(result.errors.is_empty());
    let tree = &result.tree;

    let expr = tree.root();
    assert_eq!(tree.name(expr), "expr");
    let expr_children = tree.children(expr);
    assert_eq!(expr_children.len(), 1, "no top-level alternation in this pattern");

    let term = expr_children[0];
    assert_eq!(tree.name(term), "term");
    let facts = tree.children(term);
    assert_eq!(facts.len(), 3, "three top-level facts: [a-z.]+, (a|b), .?");

    // First fact: a four-character set with a `+` modifier.
    let fact1 = tree.children(facts[0]);
    assert_eq!(fact1.len(), 2);
    let atom1 = tree.children(fact1[0]);
    assert_eq!(atom1.len(), 1);
    let char_set = atom1[0];
    assert_eq!(tree.name(char_set), "char_set");
    let set_children = tree.children(char_set);
    let set_images: Vec<&str> = set_children.iter().map(|&c| tree.image(c).unwrap()).collect();
    assert_eq!(set_images, vec!["[", "a", "-", "z", ".", "]"]);
    let modifier1 = tree.children(facts[0])[1];
    assert_eq!(tree.name(modifier1), "modifier");
    assert_eq!(tree.image(tree.children(modifier1)[0]), Some("+"));

    // Second fact: a parenthesized group carrying a full `expr` body.
    let fact2 = tree.children(facts[1]);
    assert_eq!(fact2.len(), 1, "no modifier on the group");
    let atom2 = tree.children(fact2[0]);
    assert_eq!(atom2.len(), 3, "LPAREN, inner expr, RPAREN");
    assert_eq!(tree.image(atom2[0]), Some("("));
    assert_eq!(tree.name(atom2[1]), "expr");
    assert_eq!(tree.image(atom2[2]), Some(")"));
    let inner_expr_children = tree.children(atom2[1]);
    assert_eq!(inner_expr_children.len(), 3, "term, PIPE, term — alt_term spliced in");
    assert_eq!(tree.name(inner_expr_children[0]), "term");
    assert_eq!(tree.image(inner_expr_children[1]), Some("|"));
    assert_eq!(tree.name(inner_expr_children[2]), "term");

    // Third fact: a lone `.` with a `?` modifier.
    let fact3 = tree.children(facts[2]);
    assert_eq!(fact3.len(), 2);
    let atom3 = tree.children(fact3[0]);
    assert_eq!(atom3.len(), 1);
    assert_eq!(tree.image(atom3[0]), Some("."));
    let modifier3 = fact3[1];
    assert_eq!(tree.name(modifier3), "modifier");
    assert_eq!(tree.image(tree.children(modifier3)[0]), Some("?"));

    // Hidden productions never surface by name anywhere in the tree.
    fn assert_no_hidden_name(tree: &grammatica::ParseTree<()>, id: usize, forbidden: &[&str]) {
        assert!(!forbidden.contains(&tree.name(id)));
        for child in tree.children(id) {
            assert_no_hidden_name(tree, child, forbidden);
        }
    }
    assert_no_hidden_name(tree, expr, &["char_item", "alt_term"]);
}

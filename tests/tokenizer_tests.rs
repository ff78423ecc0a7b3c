use grammatica::buffer::StrSource;
use grammatica::error::ParseExceptionKind;
use grammatica::token_pattern::TokenPattern;
use grammatica::tokenizer::Tokenizer;

fn build_tokenizer(input: &str) -> Tokenizer<StrSource> {
    let mut tokenizer = Tokenizer::new(StrSource::new(input), false);
    tokenizer
        .add_pattern(TokenPattern::regex(1, "WHITESPACE", r"[ \t\n]+").ignored())
        .unwrap();
    tokenizer
        .add_pattern(TokenPattern::literal(2, "IF", "if"))
        .unwrap();
    tokenizer
        .add_pattern(TokenPattern::regex(3, "IDENTIFIER", r"[a-zA-Z_][a-zA-Z0-9_]*"))
        .unwrap();
    tokenizer
        .add_pattern(TokenPattern::regex(4, "NUMBER", r"[0-9]+"))
        .unwrap();
    tokenizer
}

#[test]
fn keyword_wins_over_identifier_on_exact_match() {
    let mut tokenizer = build_tokenizer("if iffy 42");
    let t1 = tokenizer.next().unwrap();
    assert_eq!(t1.pattern_id, 2);
    assert_eq!(t1.image, "if");

    let t2 = tokenizer.next().unwrap();
    assert_eq!(t2.pattern_id, 3);
    assert_eq!(t2.image, "iffy");

    let t3 = tokenizer.next().unwrap();
    assert_eq!(t3.pattern_id, 4);
    assert_eq!(t3.image, "42");

    let eof = tokenizer.next().unwrap();
    assert!(eof.is_eof());
}

#[test]
fn whitespace_is_ignored_not_emitted() {
    let mut tokenizer = build_tokenizer("  if   \n  42");
    let t1 = tokenizer.next().unwrap();
    assert_eq!(t1.image, "if");
    let t2 = tokenizer.next().unwrap();
    assert_eq!(t2.image, "42");
}

#[test]
fn unrecognized_character_is_unexpected_character() {
    let mut tokenizer = build_tokenizer("@@@");
    let err = tokenizer.next().unwrap_err();
    assert_eq!(err.kind, ParseExceptionKind::UnexpectedCharacter);
}

#[test]
fn error_pattern_raises_invalid_token() {
    let mut tokenizer = Tokenizer::new(StrSource::new("goto"), false);
    tokenizer
        .add_pattern(TokenPattern::literal(5, "RESERVED", "goto").erroring("'goto' is reserved"))
        .unwrap();
    let err = tokenizer.next().unwrap_err();
    assert_eq!(err.kind, ParseExceptionKind::InvalidToken);
    assert_eq!(err.message, "'goto' is reserved");
}

#[test]
fn ignored_tokens_still_appear_in_the_token_list() {
    let mut tokenizer = build_tokenizer("if 42");
    tokenizer.use_token_list(true);
    loop {
        if tokenizer.next().unwrap().is_eof() {
            break;
        }
    }

    let tokens = tokenizer.tokens();
    let names: Vec<&str> = tokens.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["IF", "WHITESPACE", "NUMBER"]);

    assert_eq!(tokens[0].prev(), None);
    assert_eq!(tokens[0].next(), Some(1));
    assert_eq!(tokens[1].prev(), Some(0));
    assert_eq!(tokens[1].next(), Some(2));
    assert_eq!(tokens[2].prev(), Some(1));
    assert_eq!(tokens[2].next(), None);
}

#[test]
fn token_positions_track_lines_and_columns() {
    let mut tokenizer = build_tokenizer("if\nif");
    let first = tokenizer.next().unwrap();
    assert_eq!((first.start.line, first.start.column), (1, 1));
    let second = tokenizer.next().unwrap();
    assert_eq!((second.start.line, second.start.column), (2, 1));
}

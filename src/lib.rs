//! Grammatica: a parser generator runtime. Build a grammar out of token
//! patterns (literal or regex) and production patterns (alternatives of
//! token/production references with repeat counts), `prepare()` it to
//! validate and compute look-ahead, then `parse()` a source into a
//! [`tree::ParseTree`].
//!
//! ```no_run
//! use grammatica::buffer::StrSource;
//! use grammatica::parser::Parser;
//! use grammatica::production::AltElement;
//! use grammatica::token_pattern::TokenPattern;
//!
//! let mut parser = Parser::new(false);
//! let num = parser.add_token(TokenPattern::regex(1, "NUMBER", r"[0-9]+")).unwrap();
//! parser.declare_production(1, "start").unwrap();
//! parser.add_alternative(1, vec![AltElement::token(num)]).unwrap();
//! parser.set_start(1);
//! parser.prepare().unwrap();
//!
//! let result = parser.parse::<_, ()>(StrSource::new("42")).unwrap();
//! assert!(result.errors.is_empty());
//! ```

pub mod buffer;
pub mod config;
pub mod dfa;
pub mod error;
pub mod lookahead;
pub mod parser;
pub mod production;
pub mod regex_engine;
pub mod registry;
pub mod token_pattern;
pub mod tokenizer;
pub mod tree;
pub mod util;

pub use config::{ParserConfig, TokenizerConfig};
pub use error::{GrammarError, GrammarErrorKind, ParseException, ParseExceptionKind, ParserLogException, RegexError};
pub use parser::{ParseResult, Parser};
pub use production::{AltElement, Occurs, ProductionId};
pub use regex_engine::Regex;
pub use token_pattern::{TokenId, TokenPattern, EOF_ID};
pub use tokenizer::{Token, Tokenizer};
pub use tree::ParseTree;

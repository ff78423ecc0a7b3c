mod logger;
mod position;

pub use logger::Logging;
pub use position::Position;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Multi-level debug logging. Levels are totally ordered; a component only
/// prints a message when its assigned label's order is at or above the
/// message's level. [`crate::registry::TokenPatternRegistry`] carries the
/// label for both matchers it drives (the per-match `Matcher` and
/// [`crate::dfa::DfaMatcher`] are rebuilt or walked fresh on every attempt, so
/// the long-lived registry is where the label actually lives); the
/// [`crate::tokenizer::Tokenizer`] and [`crate::parser::Parser`] each carry
/// their own.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T> Log<T> {
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

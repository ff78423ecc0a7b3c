use std::fmt::{Display, Formatter};

use super::Log;
use once_cell::unsync::OnceCell;

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

/// Shared helper for components that hold a `OnceCell<Log<&'static str>>`
/// label, set once via [`Self::set_log`] and read on every match attempt
/// after that. Unset is the common case and costs one `get()` on an empty
/// cell; `#[cfg(debug_assertions)]` keeps the println path entirely out of
/// release builds.
pub trait Logging {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>>;

    /// Set the debug label once. Fails if a label was already set — this
    /// isn't a live toggle, it's a one-time wiring step at construction.
    fn set_log(&self, label: Log<&'static str>) -> Result<(), Log<&'static str>> {
        self.log_cell().set(label)
    }

    fn log_at<F: FnOnce() -> String>(&self, level: Log<()>, message: F) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log_cell().get() {
            if label.order() >= level.order() {
                println!("[{}] {}", label, message());
            }
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = level;
            let _ = message;
        }
    }
}

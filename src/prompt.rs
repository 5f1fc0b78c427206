//! Yes/no confirmation prompts.
use anyhow::{Context as _, Result};
use inquire::Confirm;

/// Asks the user to confirm an action.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt {
    /// Ask `message`, falling back to `default` when the user just presses enter.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read (e.g. input was
    /// cancelled or stdin is not a TTY).
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Terminal prompt backed by [`inquire`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompt;

impl Prompt for InquirePrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::new(message)
            .with_default(default)
            .prompt()
            .with_context(|| format!("reading answer to '{message}'"))
    }
}

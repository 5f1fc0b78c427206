//! Command: print version information.

/// Version string, overridable at build time through `DOTFILES_SETUP_VERSION`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTFILES_SETUP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
pub fn run() {
    println!("dotfiles-setup {}", version());
}

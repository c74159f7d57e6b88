//! Terminal output for humans watching the bootstrap

use console::style;
use std::fmt::Display;

/// Success message
pub fn success(msg: impl Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Warning message
pub fn warning(msg: impl Display) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Error message
pub fn error(msg: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Info message
pub fn info(msg: impl Display) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Fatal diagnostic with an optional remediation hint
pub fn fatal(msg: impl Display, hint: Option<&str>) {
    error(style(msg).red());
    if let Some(hint) = hint {
        eprintln!("  {} {}", style("hint:").cyan().bold(), hint);
    }
}

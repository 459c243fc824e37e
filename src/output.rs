//! Terminal output helpers.
//!
//! Color scheme (respects NO_COLOR via console's own detection):
//! - Green: success
//! - Red: errors
//! - Cyan: hints

use console::style;

/// Print a success message with checkmark (green).
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Print an error message to stderr (red).
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Print a hint message (cyan).
pub fn hint(msg: &str) {
    println!("{} {}", style("→").cyan(), style(msg).cyan());
}

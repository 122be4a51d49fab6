//! Cargo-style status lines and spinners written to stderr.

use std::io::Write;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

fn print_status(style: Style, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{:>12} {message}", style.apply_to(label));
}

/// Print an action line such as `    Resolved 42 packages`.
///
/// The label is right-aligned to 12 columns and printed in bold green.
pub fn status(label: &str, message: &str) {
    print_status(Style::new().green().bold(), label, message);
}

/// Like [`status`] but bold cyan, for informational lines.
pub fn status_info(label: &str, message: &str) {
    print_status(Style::new().cyan().bold(), label, message);
}

/// Bold yellow label.
pub fn status_warn(label: &str, message: &str) {
    print_status(Style::new().yellow().bold(), label, message);
}

/// Bold red label, used for terminal outcomes such as "no solution".
pub fn status_error(label: &str, message: &str) {
    print_status(Style::new().red().bold(), label, message);
}

/// Create a steadily ticking spinner for the registry crawl.
///
/// Finish it with [`ProgressBar::finish_and_clear`] before printing results.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output. Colors are only emitted
//! when the stream supports them and `owo_colors::set_override(false)` has
//! not been called.

use droidplan_core::Error;
use owo_colors::{OwoColorize, Stream};

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |t| t.red()), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |t| t.blue()), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `label: value` row
    pub fn detail(label: &str, value: &str) {
        let label = format!("{:<22}", format!("{}:", label));
        println!("  {} {}", label.if_supports_color(Stream::Stdout, |t| t.dimmed()), value);
    }

    /// Print an error with its code, context and suggestion
    pub fn report(error: &Error) {
        let code = format!("[{}]", error.code);
        eprintln!(
            "{} {} {}",
            "✗".if_supports_color(Stream::Stderr, |t| t.red()),
            code.if_supports_color(Stream::Stderr, |t| t.dimmed()),
            error.message
        );
        if let Some(context) = &error.context {
            eprintln!(
                "  {} {}",
                "context:".if_supports_color(Stream::Stderr, |t| t.dimmed()),
                context
            );
        }
        if let Some(suggestion) = &error.suggestion {
            eprintln!(
                "  {} {}",
                "hint:".if_supports_color(Stream::Stderr, |t| t.cyan()),
                suggestion
            );
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 0.001 {
        format!("{}µs", duration.as_micros())
    } else if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

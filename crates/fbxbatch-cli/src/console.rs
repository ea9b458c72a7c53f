//! Colored console reporter.

use colored::Colorize;

use fbxbatch_export::reporter::{Reporter, Severity};

/// Prints severity-tagged messages to the console. Info and warnings go
/// to stdout, errors to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Creates a console reporter.
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => println!("{} {}", "INFO".blue().bold(), message),
            Severity::Warning => println!("{} {}", "WARNING".yellow().bold(), message),
            Severity::Error => eprintln!("{} {}", "ERROR".red().bold(), message),
        }
    }
}

//! Output formatting

use crate::cli::args::VerbosityLevel;
use crate::platform::cipher::ExtractedAlgorithm;
use crate::platform::formats::ResolvedFormat;
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;

/// Output formatter for ryt-cipher.
///
/// JSON results go to stdout; human-readable messages go to stderr so the
/// JSON stays pipeable.
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    pretty: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel, pretty: bool) -> Self {
        Self { verbosity, pretty }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{} {}", "info:".cyan().bold(), message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{} {}", "done:".green().bold(), message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    /// Print resolved formats as JSON on stdout
    pub fn print_formats(&self, formats: &[ResolvedFormat]) -> Result<(), serde_json::Error> {
        println!("{}", self.to_json(formats)?);
        Ok(())
    }

    pub fn print_algorithm(&self, algorithm: &ExtractedAlgorithm) -> Result<(), serde_json::Error> {
        println!("{}", self.to_json(algorithm)?);
        Ok(())
    }

    /// Human summary of the extracted operations
    pub fn print_algorithm_summary(&self, algorithm: &ExtractedAlgorithm) {
        if self.verbosity != VerbosityLevel::Verbose {
            return;
        }

        let steps: Vec<String> = algorithm.operations.iter().map(|op| op.to_string()).collect();
        self.info(&format!(
            "player {}: {}",
            algorithm.script_id.as_deref().unwrap_or("<unknown>"),
            steps.join(" -> ")
        ));
        for step in &algorithm.trace.steps {
            eprintln!("  {} {} (#{})", step.stage.to_string().dimmed(), step.heuristic, step.index);
        }
    }

    /// Summarize a resolution run
    pub fn print_summary(&self, formats: &[ResolvedFormat], elapsed: Duration) {
        let failed = formats.iter().filter(|f| !f.is_resolved()).count();
        let message = format_summary(formats.len(), failed, elapsed);
        if failed == 0 {
            self.success(&message);
        } else {
            self.warning(&message);
        }
    }
}

/// One-line summary of a resolution run
pub fn format_summary(total: usize, failed: usize, elapsed: Duration) -> String {
    let resolved = total - failed;
    let mut message = format!(
        "resolved {}/{} formats in {}",
        resolved,
        total,
        format_duration(elapsed)
    );
    if failed > 0 {
        message.push_str(&format!(" ({} failed)", failed));
    }
    message
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

//! Command line interface

pub mod args;
pub mod output;

pub use args::{Args, ScriptLocation, VerbosityLevel};
pub use output::OutputFormatter;

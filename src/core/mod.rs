//! Core functionality for ryt-cipher

pub mod resolver;

pub use resolver::*;

//! Readers for the resource catalog's line-oriented text formats.
//!
//! Every reader is a pure `&str -> records` function. Line numbers are
//! 1-based and carried on every record so callers can point at the source.
#![forbid(unsafe_code)]

pub mod defines;
pub mod descriptor;
pub mod ls2;
pub mod rmp;

use thiserror::Error;

/// A line the reader recognised as an entry but could not accept.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct LineError {
    pub line: usize,
    pub reason: String,
}

impl LineError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<LineError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Parsed<T> {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

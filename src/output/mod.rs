//! Reporting projections of measurement results.
//!
//! Both views are read-only: they never mutate sample counts or
//! repetition state. Where the text ends up (terminal, kernel log relay,
//! file) is the caller's concern.

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_detailed, format_samples};

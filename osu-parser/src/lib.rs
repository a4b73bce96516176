//! osu-parser: permissive decoder for `.osu` beatmap files
//!
//! Turns the text of one chart (difficulty) into a [`ChartRecord`] holding its
//! metadata, timing points, hit objects and a few derived gameplay metrics.
//! Malformed input never aborts parsing; see [`parse_with_diagnostics`].

pub mod types;
pub mod section;
pub mod parser;

pub use types::*;
pub use section::Section;
pub use parser::{parse, parse_with_diagnostics, ChartParser, Diagnostic};

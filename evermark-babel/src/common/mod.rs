//! Format-independent conversion logic shared by the input and output formats.

pub mod graph;
pub mod links;
pub mod lists;
pub mod merge;
pub mod style;
pub mod table;

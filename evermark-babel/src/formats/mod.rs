//! Format implementations
//!
//! The input format (Evernote HTML exports) lowers to the IR; the output format (Markdown)
//! serializes it.

pub mod evernote;
pub mod markdown;

pub use evernote::Note;
pub use markdown::RenderOptions;

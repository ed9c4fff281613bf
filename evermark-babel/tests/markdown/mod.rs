//! Markdown export tests
//!
//! Evernote HTML in, Markdown out, through the public conversion API.

mod export;
mod frontmatter;
mod links;
mod lists;
mod tables;

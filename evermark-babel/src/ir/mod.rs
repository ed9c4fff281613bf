//! Intermediate Representation (IR) for converted notes.
//!
//! The Evernote HTML is lowered into this tree once (see `formats::evernote`), then every
//! later stage works on it: the span merger on inline content, the list structurer and table
//! transcoder on their subtrees, and finally the Markdown serializer.

pub mod nodes;

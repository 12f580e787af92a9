//! # Text Preparation
//!
//! Everything that happens to the character buffer before glyphs exist:
//! collecting leaf text ([`collect`]), collapsing white space
//! ([`whitespace`]), resolving explicit positions ([`transforms`]),
//! classifying breaks ([`breaks`]) and bidi levels ([`bidi`]).
//!
//! Results are plain per-character vectors indexed like the collected
//! buffer.

pub mod bidi;
pub mod breaks;
pub mod collect;
pub mod transforms;
pub mod whitespace;

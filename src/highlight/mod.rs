//! Incremental highlighting core
//!
//! This module is the engine proper: the block processor walks the rule
//! table over one block at a time, the multi-line tracker carries construct
//! state across block boundaries, and the resolver reconciles overlapping
//! matches into the final span list.
//!
//! # Example
//! ```ignore
//! use marklight::{HighlightEngine, ProfileKind};
//!
//! let engine = HighlightEngine::new(ProfileKind::Editing);
//! let blocks = engine.highlight_document(&["# Title", "", "Some **bold** text"]);
//! for block in &blocks {
//!     for span in &block.spans {
//!         // hand span.style to the theme provider
//!     }
//! }
//! ```

mod multiline;
mod processor;
mod resolver;
mod runtime;

pub use processor::{BlockHighlight, HighlightEngine, ProcessOutcome};
pub use resolver::FormatSpan;

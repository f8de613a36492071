//! marklight - Incremental Markdown syntax highlighting for editors
//!
//! An embeddable engine that classifies spans of Markdown text for
//! presentation, block by block. It carries parser state across block
//! boundaries (fenced code, blockquotes, lists, tables, comments survive
//! edits to single lines), resolves overlapping token matches
//! deterministically, and is cheap enough to re-run on every keystroke.
//!
//! The engine emits [`FormatSpan`]s — byte ranges plus opaque style
//! identifiers. It never touches colors, fonts, or widgets; the embedding
//! editor maps styles to its theme and paints.
//!
//! # Quick Start
//! ```ignore
//! use marklight::{BlockState, HighlightEngine, ProfileKind};
//!
//! let engine = HighlightEngine::new(ProfileKind::Editing);
//!
//! // Whole document:
//! let blocks = engine.highlight_document(&["```rust", "let x = 1;", "```"]);
//!
//! // Or incrementally, one edited block at a time:
//! let mut state = BlockState::new();
//! let outcome = engine.process_block(0, "# Title", None, &mut state);
//! assert!(!outcome.spans.is_empty());
//! ```
//!
//! Above the engine, [`RehighlightScheduler`] debounces bursts of edits
//! into bounded, coalesced re-highlight passes.

mod error;
mod highlight;
mod rules;
mod scheduler;
mod state;
mod string_utils;

pub use error::{Error, Result, ResultExt};
pub use highlight::{BlockHighlight, FormatSpan, HighlightEngine, ProcessOutcome};
pub use rules::{Group, Predicate, ProfileKind, Rule, RuleKind, RuleTable, StyleId, TagId};
pub use scheduler::{RehighlightScheduler, RehighlightScope, SchedulerConfig};
pub use state::{BlockState, Occurrence};

//! Per-Block State Store
//!
//! Each block of the document owns one [`BlockState`]: a tag-keyed record of
//! which tokens and constructs the block participates in, and how. The host
//! persists it opaquely between edits and hands the previous block's state
//! back to the engine, which is how multi-line constructs survive block
//! boundaries.
//!
//! All accessors are total over absent tags and indices — a missing tag
//! reads as "not present on this block", never as an error.

use crate::error::Result;
use crate::rules::TagId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Occurrence
// ─────────────────────────────────────────────────────────────────────────────

/// One matched instance of a tag within a block.
///
/// Flag invariants:
/// - `opened` is set only on the block that matched the opening delimiter.
/// - `within` marks membership of a multi-block construct, even when no
///   delimiter matched on this exact block.
/// - `closed` is set only on the block that matched the closing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub opened: bool,
    pub within: bool,
    pub closed: bool,
    /// Byte range of the occurrence within the block text.
    pub start: usize,
    pub end: usize,
}

impl Occurrence {
    /// A plain match with no construct semantics.
    pub fn plain(start: usize, end: usize) -> Self {
        Self {
            opened: false,
            within: false,
            closed: false,
            start,
            end,
        }
    }

    /// The block that opened a construct.
    pub fn opening(start: usize, end: usize) -> Self {
        Self {
            opened: true,
            within: true,
            closed: false,
            start,
            end,
        }
    }

    /// An interior block of a construct (no delimiter on this block).
    pub fn interior(start: usize, end: usize) -> Self {
        Self {
            opened: false,
            within: true,
            closed: false,
            start,
            end,
        }
    }

    /// The block that closed a construct.
    pub fn closing(start: usize, end: usize) -> Self {
        Self {
            opened: false,
            within: false,
            closed: true,
            start,
            end,
        }
    }

    /// Whether this occurrence keeps a construct active for the next block.
    pub fn carries_over(&self) -> bool {
        (self.opened || self.within) && !self.closed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BlockState
// ─────────────────────────────────────────────────────────────────────────────

/// Tag-keyed storage scoped to one block, with multiplicity.
///
/// Multiple occurrences per tag are legal (two inline-code spans on one
/// line). The engine mutates the state in place during processing; a full
/// re-highlight overwrites it via [`BlockState::clear`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockState {
    entries: HashMap<TagId, Vec<Occurrence>>,
}

impl BlockState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence for a tag.
    ///
    /// If an occurrence with an identical `(start, end)` range already
    /// exists it is updated in place instead of appended — repeated
    /// re-highlighting of an unchanged block must not grow the state.
    pub fn put(&mut self, tag: TagId, occurrence: Occurrence) {
        let list = self.entries.entry(tag).or_default();
        match list
            .iter_mut()
            .find(|o| o.start == occurrence.start && o.end == occurrence.end)
        {
            Some(existing) => *existing = occurrence,
            None => list.push(occurrence),
        }
    }

    /// First occurrence of a tag, if any.
    pub fn get(&self, tag: TagId) -> Option<&Occurrence> {
        self.get_at(tag, 0)
    }

    /// Occurrence of a tag at a given index, if present.
    pub fn get_at(&self, tag: TagId, index: usize) -> Option<&Occurrence> {
        self.entries.get(&tag).and_then(|list| list.get(index))
    }

    /// All occurrences of a tag (empty when absent).
    pub fn get_all(&self, tag: TagId) -> &[Occurrence] {
        self.entries.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the first occurrence of a tag has `opened` set.
    pub fn opened(&self, tag: TagId) -> bool {
        self.get(tag).map(|o| o.opened).unwrap_or(false)
    }

    /// Whether the first occurrence of a tag has `within` set.
    pub fn within(&self, tag: TagId) -> bool {
        self.get(tag).map(|o| o.within).unwrap_or(false)
    }

    /// Whether the first occurrence of a tag has `closed` set.
    pub fn closed(&self, tag: TagId) -> bool {
        self.get(tag).map(|o| o.closed).unwrap_or(false)
    }

    /// Whether any occurrence of a tag keeps its construct active for the
    /// next block.
    pub fn carries_over(&self, tag: TagId) -> bool {
        self.get_all(tag).iter().any(Occurrence::carries_over)
    }

    /// Drop all occurrences of a tag.
    pub fn remove(&mut self, tag: TagId) {
        self.entries.remove(&tag);
    }

    /// Drop one occurrence of a tag by index. Out-of-range indices are
    /// ignored.
    pub fn remove_at(&mut self, tag: TagId, index: usize) {
        if let Some(list) = self.entries.get_mut(&tag) {
            if index < list.len() {
                list.remove(index);
            }
            if list.is_empty() {
                self.entries.remove(&tag);
            }
        }
    }

    /// Linear scan for the first occurrence of a tag matching a predicate
    /// (e.g. the occurrence ending at a known offset).
    pub fn search<F>(&self, tag: TagId, predicate: F) -> Option<&Occurrence>
    where
        F: Fn(&Occurrence) -> bool,
    {
        self.get_all(tag).iter().find(|o| predicate(o))
    }

    /// Tags present on this block.
    pub fn tags(&self) -> impl Iterator<Item = TagId> + '_ {
        self.entries.keys().copied()
    }

    /// Whether any construct on this block continues past it.
    pub fn continues_construct(&self) -> bool {
        self.entries
            .values()
            .any(|list| list.iter().any(Occurrence::carries_over))
    }

    /// Remove everything (full re-highlight overwrites, never merges).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether the state holds no occurrences at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────

    /// Serialize for host-side checkpointing.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a checkpointed state. A corrupt payload is an error; callers
    /// treat it as "no previous state" and let the engine self-heal.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

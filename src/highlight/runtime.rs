//! Per-pass token runtime state
//!
//! Rebuilt from scratch every time a block is processed, never persisted.
//! Tracks match counts and the open/closed flip of boundary pairs while the
//! rule walk is in progress, and backs the derived `is_in_*` predicates:
//! runtime first, previous block's persisted flags as the fallback when no
//! rule for the tag fired this pass.

// Allow dead code - the derived predicate set mirrors the construct tracker;
// not every predicate has a rule consumer in both profiles
#![allow(dead_code)]

use crate::rules::{Group, Predicate, TagId};
use crate::state::BlockState;
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// TokenRuntimeState
// ─────────────────────────────────────────────────────────────────────────────

/// Ephemeral per-tag bookkeeping for one processing pass.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TokenRuntime {
    pub match_count: usize,
    /// `None` means no boundary rule for the tag fired this pass — the
    /// previous block's flags decide.
    pub is_open: Option<bool>,
}

/// The whole per-pass map, plus the "any span formatted yet" flag used by
/// the interior-line fallback.
#[derive(Debug, Default)]
pub(crate) struct TokenRuntimeState {
    entries: HashMap<TagId, TokenRuntime>,
    /// Last boundary tag opened per group; the fallback span takes its style.
    group_open: HashMap<Group, TagId>,
    pub any_span_formatted: bool,
}

impl TokenRuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a match for a tag, returning the new count.
    pub fn record_match(&mut self, tag: TagId) -> usize {
        let entry = self.entries.entry(tag).or_default();
        entry.match_count += 1;
        entry.match_count
    }

    pub fn match_count(&self, tag: TagId) -> usize {
        self.entries.get(&tag).map(|e| e.match_count).unwrap_or(0)
    }

    /// Toggle a boundary tag's open state.
    pub fn set_open(&mut self, tag: TagId, group: Group, open: bool) {
        self.entries.entry(tag).or_default().is_open = Some(open);
        if open {
            self.group_open.insert(group, tag);
        } else if self.group_open.get(&group) == Some(&tag) {
            self.group_open.remove(&group);
        }
    }

    /// Whether a boundary tag is open, if any rule had an opinion this pass.
    pub fn is_open(&self, tag: TagId) -> Option<bool> {
        self.entries.get(&tag).and_then(|e| e.is_open)
    }

    /// The tag currently holding a group open this pass, if any.
    pub fn open_tag_for(&self, group: Group) -> Option<TagId> {
        self.group_open.get(&group).copied()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Derived Predicates
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime first; previous block's persisted flags when the runtime has no
/// opinion on the tag.
fn tag_active(runtime: &TokenRuntimeState, previous: Option<&BlockState>, tag: TagId) -> bool {
    match runtime.is_open(tag) {
        Some(open) => open,
        None => previous.map(|p| p.carries_over(tag)).unwrap_or(false),
    }
}

/// Inside a fenced code block or a multi-line inline code run.
pub(crate) fn is_in_code(runtime: &TokenRuntimeState, previous: Option<&BlockState>) -> bool {
    tag_active(runtime, previous, TagId::FencedCode)
        || tag_active(runtime, previous, TagId::InlineCode)
}

/// Inside a multi-line HTML comment.
pub(crate) fn is_in_comment(runtime: &TokenRuntimeState, previous: Option<&BlockState>) -> bool {
    tag_active(runtime, previous, TagId::Comment)
}

/// Inside a blockquote construct.
pub(crate) fn is_in_blockquote(runtime: &TokenRuntimeState, previous: Option<&BlockState>) -> bool {
    tag_active(runtime, previous, TagId::BlockQuote)
}

/// Inside a list construct.
pub(crate) fn is_in_list(runtime: &TokenRuntimeState, previous: Option<&BlockState>) -> bool {
    tag_active(runtime, previous, TagId::List)
}

/// Evaluate a rule predicate against the in-progress pass.
pub(crate) fn predicate_holds(
    predicate: Predicate,
    runtime: &TokenRuntimeState,
    previous: Option<&BlockState>,
) -> bool {
    match predicate {
        Predicate::InCode => {
            is_in_code(runtime, previous) && !is_in_comment(runtime, previous)
        }
        Predicate::NotInCode => !is_in_code(runtime, previous),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Occurrence;

    #[test]
    fn test_match_counting() {
        let mut runtime = TokenRuntimeState::new();
        assert_eq!(runtime.match_count(TagId::Bold), 0);
        assert_eq!(runtime.record_match(TagId::Bold), 1);
        assert_eq!(runtime.record_match(TagId::Bold), 2);
        assert_eq!(runtime.match_count(TagId::Italic), 0);
    }

    #[test]
    fn test_open_toggle_and_group_tracking() {
        let mut runtime = TokenRuntimeState::new();
        assert_eq!(runtime.is_open(TagId::Bold), None);

        runtime.set_open(TagId::Italic, Group::Emphasis, true);
        runtime.set_open(TagId::Bold, Group::Emphasis, true);
        // The later opener holds the group
        assert_eq!(runtime.open_tag_for(Group::Emphasis), Some(TagId::Bold));

        runtime.set_open(TagId::Bold, Group::Emphasis, false);
        assert_eq!(runtime.is_open(TagId::Bold), Some(false));
        // Italic no longer holds the group slot either; a close clears it
        assert_eq!(runtime.open_tag_for(Group::Emphasis), None);
    }

    #[test]
    fn test_is_in_code_runtime_wins_over_previous() {
        let mut previous = BlockState::new();
        previous.put(TagId::FencedCode, Occurrence::interior(0, 10));

        let mut runtime = TokenRuntimeState::new();
        // No opinion: previous decides
        assert!(is_in_code(&runtime, Some(&previous)));

        // Runtime closed the fence this pass: runtime decides
        runtime.set_open(TagId::FencedCode, Group::Code, false);
        assert!(!is_in_code(&runtime, Some(&previous)));
    }

    #[test]
    fn test_is_in_code_covers_inline_code_runs() {
        let mut previous = BlockState::new();
        previous.put(TagId::InlineCode, Occurrence::opening(4, 10));
        let runtime = TokenRuntimeState::new();
        assert!(is_in_code(&runtime, Some(&previous)));
    }

    #[test]
    fn test_predicates_without_previous_state() {
        let runtime = TokenRuntimeState::new();
        assert!(!is_in_code(&runtime, None));
        assert!(!is_in_comment(&runtime, None));
        assert!(!is_in_blockquote(&runtime, None));
        assert!(!is_in_list(&runtime, None));
    }

    #[test]
    fn test_in_code_predicate_excludes_comments() {
        let mut runtime = TokenRuntimeState::new();
        runtime.set_open(TagId::FencedCode, Group::Code, true);
        assert!(predicate_holds(Predicate::InCode, &runtime, None));

        runtime.set_open(TagId::Comment, Group::Comment, true);
        assert!(!predicate_holds(Predicate::InCode, &runtime, None));
    }

    #[test]
    fn test_not_in_code_predicate() {
        let mut runtime = TokenRuntimeState::new();
        assert!(predicate_holds(Predicate::NotInCode, &runtime, None));
        runtime.set_open(TagId::InlineCode, Group::Code, true);
        assert!(!predicate_holds(Predicate::NotInCode, &runtime, None));
    }
}

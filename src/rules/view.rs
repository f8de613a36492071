//! Reduced view-mode profile
//!
//! View mode renders most Markdown through the external renderer and only
//! needs the engine for the few decorations painted over rendered text:
//! strikethrough runs, TODO markers, and the invisible separator marker
//! (U+200B) the editor uses to delimit rendered fragments.

use super::{Group, Predicate, RuleDef, RuleKind, StyleId, TagId};

/// Rule definitions for the view profile, in evaluation order.
pub(crate) fn definitions() -> Vec<RuleDef> {
    vec![
        RuleDef {
            pattern: r"~~([^~\n]+)~~",
            capture: 1,
            tag: TagId::Strikethrough,
            group: Group::Strikethrough,
            kind: RuleKind::Between,
            style: StyleId::Strikethrough,
            predicate: None,
            start_offset: -2,
            end_offset: 2,
        },
        RuleDef {
            pattern: r"(?:^|[^~])(~~[^\s~][^~\n]*)$",
            capture: 1,
            tag: TagId::Strikethrough,
            group: Group::Strikethrough,
            kind: RuleKind::BoundaryOpen,
            style: StyleId::Strikethrough,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^([^~\n]+~~)(?:[^~]|$)",
            capture: 1,
            tag: TagId::Strikethrough,
            group: Group::Strikethrough,
            kind: RuleKind::BoundaryClose,
            style: StyleId::Strikethrough,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"\b(TODO|FIXME|XXX)\b",
            capture: 1,
            tag: TagId::TodoMarker,
            group: Group::View,
            kind: RuleKind::Single,
            style: StyleId::TodoMarker,
            predicate: Some(Predicate::NotInCode),
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"(\x{200B}+)",
            capture: 1,
            tag: TagId::Separator,
            group: Group::View,
            kind: RuleKind::Single,
            style: StyleId::Separator,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

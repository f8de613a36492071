//! Full editing profile
//!
//! The rule catalogue for edit mode, in fixed evaluation order. Ordering
//! constraints that matter:
//! - bold-italic after bold after italic (stronger emphasis overrides),
//! - image after link (image syntax contains a link),
//! - inline code after the emphasis family (the resolver retroactively
//!   retracts emphasis spans that a later code match overlaps),
//! - code-operator last, predicated to fire only inside code.
//!
//! Each definition carries its own position-correction offsets. They are
//! data, not derived: "between" patterns capture the inner text so the
//! delimiters cannot re-match, and the offsets re-expand the span by the
//! delimiter width. Open/close patterns capture the delimiter run itself
//! and need no correction. The offsets are pinned one by one in the tests
//! below; a new rule must state its own.

use super::{Group, Predicate, RuleDef, RuleKind, StyleId, TagId};

/// Rule definitions for the editing profile, in evaluation order.
pub(crate) fn definitions() -> Vec<RuleDef> {
    vec![
        // ── Line-level tokens ────────────────────────────────────────────
        RuleDef {
            pattern: r"^(#{1,6}\s[^\n]*)$",
            capture: 1,
            tag: TagId::Heading,
            group: Group::Heading,
            kind: RuleKind::Single,
            style: StyleId::Heading,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*(?:-{3,}|\*{3,}|_{3,})\s*)$",
            capture: 1,
            tag: TagId::HorizontalRule,
            group: Group::HorizontalRule,
            kind: RuleKind::Single,
            style: StyleId::HorizontalRule,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*>+\s?)",
            capture: 1,
            tag: TagId::BlockQuote,
            group: Group::Quote,
            kind: RuleKind::Single,
            style: StyleId::QuoteMarker,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*[-*+]\s+)",
            capture: 1,
            tag: TagId::List,
            group: Group::List,
            kind: RuleKind::Single,
            style: StyleId::ListMarker,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*\d+[.)]\s+)",
            capture: 1,
            tag: TagId::List,
            group: Group::List,
            kind: RuleKind::Single,
            style: StyleId::ListMarker,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*\|[^\n]*\|\s*)$",
            capture: 1,
            tag: TagId::TableRow,
            group: Group::Table,
            kind: RuleKind::Single,
            style: StyleId::TableRow,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        // ── Emphasis family (asterisk) ───────────────────────────────────
        // Between-variants capture the inner text; the offsets re-add the
        // delimiter width on both sides.
        RuleDef {
            pattern: r"\*([^*\n]+)\*",
            capture: 1,
            tag: TagId::Italic,
            group: Group::Emphasis,
            kind: RuleKind::Between,
            style: StyleId::Italic,
            predicate: None,
            start_offset: -1,
            end_offset: 1,
        },
        RuleDef {
            pattern: r"(?:^|[^*])(\*[^\s*\[][^*\n]*)$",
            capture: 1,
            tag: TagId::Italic,
            group: Group::Emphasis,
            kind: RuleKind::BoundaryOpen,
            style: StyleId::Italic,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^([^*\n]+\*)(?:[^*]|$)",
            capture: 1,
            tag: TagId::Italic,
            group: Group::Emphasis,
            kind: RuleKind::BoundaryClose,
            style: StyleId::Italic,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"\*\*([^*\n]+)\*\*",
            capture: 1,
            tag: TagId::Bold,
            group: Group::Emphasis,
            kind: RuleKind::Between,
            style: StyleId::Bold,
            predicate: None,
            start_offset: -2,
            end_offset: 2,
        },
        RuleDef {
            pattern: r"(?:^|[^*])(\*\*[^\s*][^*\n]*)$",
            capture: 1,
            tag: TagId::Bold,
            group: Group::Emphasis,
            kind: RuleKind::BoundaryOpen,
            style: StyleId::Bold,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^([^*\n]+\*\*)(?:[^*]|$)",
            capture: 1,
            tag: TagId::Bold,
            group: Group::Emphasis,
            kind: RuleKind::BoundaryClose,
            style: StyleId::Bold,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"\*\*\*([^*\n]+)\*\*\*",
            capture: 1,
            tag: TagId::BoldItalic,
            group: Group::Emphasis,
            kind: RuleKind::Between,
            style: StyleId::BoldItalic,
            predicate: None,
            start_offset: -3,
            end_offset: 3,
        },
        RuleDef {
            pattern: r"(?:^|[^*])(\*\*\*[^\s*][^*\n]*)$",
            capture: 1,
            tag: TagId::BoldItalic,
            group: Group::Emphasis,
            kind: RuleKind::BoundaryOpen,
            style: StyleId::BoldItalic,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^([^*\n]+\*\*\*)(?:[^*]|$)",
            capture: 1,
            tag: TagId::BoldItalic,
            group: Group::Emphasis,
            kind: RuleKind::BoundaryClose,
            style: StyleId::BoldItalic,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        // ── Emphasis family (underscore, single-line only) ───────────────
        RuleDef {
            pattern: r"(?:^|\s)_([^_\n]+)_(?:\s|$)",
            capture: 1,
            tag: TagId::Italic,
            group: Group::Emphasis,
            kind: RuleKind::Between,
            style: StyleId::Italic,
            predicate: None,
            start_offset: -1,
            end_offset: 1,
        },
        RuleDef {
            pattern: r"(?:^|\s)__([^_\n]+)__(?:\s|$)",
            capture: 1,
            tag: TagId::Bold,
            group: Group::Emphasis,
            kind: RuleKind::Between,
            style: StyleId::Bold,
            predicate: None,
            start_offset: -2,
            end_offset: 2,
        },
        // ── Strikethrough ────────────────────────────────────────────────
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
        // ── Links, images, definitions, HTML ─────────────────────────────
        RuleDef {
            pattern: r"(\[[^\]\n]*\]\([^)\n]*\))",
            capture: 1,
            tag: TagId::Link,
            group: Group::Link,
            kind: RuleKind::Single,
            style: StyleId::Link,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"(!\[[^\]\n]*\]\([^)\n]*\))",
            capture: 1,
            tag: TagId::Image,
            group: Group::Link,
            kind: RuleKind::Single,
            style: StyleId::Image,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*\[[^\]\n]+\]:\s+\S[^\n]*)$",
            capture: 1,
            tag: TagId::Reference,
            group: Group::Meta,
            kind: RuleKind::Single,
            style: StyleId::Reference,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*\*\[[^\]\n]+\]:\s+[^\n]*)$",
            capture: 1,
            tag: TagId::Abbreviation,
            group: Group::Meta,
            kind: RuleKind::Single,
            style: StyleId::Abbreviation,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"(</?[A-Za-z][A-Za-z0-9]*(?:\s[^>\n]*)?/?>)",
            capture: 1,
            tag: TagId::HtmlTag,
            group: Group::Html,
            kind: RuleKind::Single,
            style: StyleId::HtmlTag,
            predicate: Some(Predicate::NotInCode),
            start_offset: 0,
            end_offset: 0,
        },
        // ── Code (late: discovered after its competitors) ────────────────
        RuleDef {
            pattern: r"`([^`\n]+)`",
            capture: 1,
            tag: TagId::InlineCode,
            group: Group::Code,
            kind: RuleKind::Between,
            style: StyleId::CodeInline,
            predicate: None,
            start_offset: -1,
            end_offset: 1,
        },
        RuleDef {
            pattern: r"(?:^|[^`])(`[^\s`][^`\n]*)$",
            capture: 1,
            tag: TagId::InlineCode,
            group: Group::Code,
            kind: RuleKind::BoundaryOpen,
            style: StyleId::CodeInline,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^([^`\n]+`)(?:[^`]|$)",
            capture: 1,
            tag: TagId::InlineCode,
            group: Group::Code,
            kind: RuleKind::BoundaryClose,
            style: StyleId::CodeInline,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"^(\s*(?:```|~~~)[^\n]*)$",
            capture: 1,
            tag: TagId::FencedCode,
            group: Group::Code,
            kind: RuleKind::Single,
            style: StyleId::CodeBlock,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"(<!--.*?-->)",
            capture: 1,
            tag: TagId::Comment,
            group: Group::Comment,
            kind: RuleKind::Between,
            style: StyleId::Comment,
            predicate: None,
            start_offset: 0,
            end_offset: 0,
        },
        RuleDef {
            pattern: r"([=+\-*/%<>!&|^~]{1,3})",
            capture: 1,
            tag: TagId::CodeOperator,
            group: Group::Code,
            kind: RuleKind::Single,
            style: StyleId::CodeOperator,
            predicate: Some(Predicate::InCode),
            start_offset: 0,
            end_offset: 0,
        },
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::rules::{ProfileKind, RuleKind, RuleTable, TagId};

    /// Run one rule against a sample line and return the offset-corrected
    /// span of its first match.
    fn corrected_span(tag: TagId, kind: RuleKind, text: &str) -> (usize, usize) {
        let table = RuleTable::new(ProfileKind::Editing);
        let rule = table
            .rules()
            .iter()
            .find(|r| r.tag == tag && r.kind == kind)
            .unwrap_or_else(|| panic!("no {:?}/{:?} rule", tag, kind));
        let caps = rule
            .pattern
            .captures(text)
            .unwrap_or_else(|| panic!("{:?}/{:?} should match {:?}", tag, kind, text));
        let m = caps.get(rule.capture).expect("capture group present");
        (
            (m.start() as i64 + rule.start_offset as i64) as usize,
            (m.end() as i64 + rule.end_offset as i64) as usize,
        )
    }

    // Offset pinning: each between-rule's correction must re-cover the
    // delimiters exactly. These are regressions on data, not on behavior —
    // do not "fix" an offset without a matching profile change.

    #[test]
    fn test_italic_offsets_pinned() {
        assert_eq!(corrected_span(TagId::Italic, RuleKind::Between, "*x*"), (0, 3));
    }

    #[test]
    fn test_bold_offsets_pinned() {
        assert_eq!(corrected_span(TagId::Bold, RuleKind::Between, "**x**"), (0, 5));
    }

    #[test]
    fn test_bold_italic_offsets_pinned() {
        assert_eq!(
            corrected_span(TagId::BoldItalic, RuleKind::Between, "***x***"),
            (0, 7)
        );
    }

    #[test]
    fn test_strikethrough_offsets_pinned() {
        assert_eq!(
            corrected_span(TagId::Strikethrough, RuleKind::Between, "~~x~~"),
            (0, 5)
        );
    }

    #[test]
    fn test_inline_code_offsets_pinned() {
        assert_eq!(
            corrected_span(TagId::InlineCode, RuleKind::Between, "`x`"),
            (0, 3)
        );
    }

    #[test]
    fn test_boundary_rules_need_no_correction() {
        assert_eq!(
            corrected_span(TagId::Italic, RuleKind::BoundaryOpen, "see *start of run"),
            (4, 17)
        );
        assert_eq!(
            corrected_span(TagId::Italic, RuleKind::BoundaryClose, "end of run* here"),
            (0, 11)
        );
        assert_eq!(
            corrected_span(TagId::Bold, RuleKind::BoundaryOpen, "a **run start"),
            (2, 13)
        );
        assert_eq!(
            corrected_span(TagId::Bold, RuleKind::BoundaryClose, "run end** tail"),
            (0, 9)
        );
    }

    #[test]
    fn test_mid_span_offsets_pinned() {
        // Correction is relative to the match, not the line
        assert_eq!(
            corrected_span(TagId::Bold, RuleKind::Between, "say **hi** now"),
            (4, 10)
        );
    }

    // Pattern shape regressions

    #[test]
    fn test_open_patterns_are_delimiter_exclusive() {
        let table = RuleTable::new(ProfileKind::Editing);
        let open = |tag: TagId| {
            table
                .rules()
                .iter()
                .find(|r| r.tag == tag && r.kind == RuleKind::BoundaryOpen)
                .unwrap()
        };
        // A bold opener must not read as an italic opener, and vice versa
        assert!(!open(TagId::Italic).pattern.is_match("a **bold open"));
        assert!(!open(TagId::Bold).pattern.is_match("a *italic open"));
        assert!(!open(TagId::Bold).pattern.is_match("a ***strong open"));
        assert!(open(TagId::BoldItalic).pattern.is_match("a ***strong open"));
    }

    #[test]
    fn test_close_patterns_are_delimiter_exclusive() {
        let table = RuleTable::new(ProfileKind::Editing);
        let close = |tag: TagId| {
            table
                .rules()
                .iter()
                .find(|r| r.tag == tag && r.kind == RuleKind::BoundaryClose)
                .unwrap()
        };
        assert!(close(TagId::Italic).pattern.is_match("run ends* here"));
        assert!(!close(TagId::Italic).pattern.is_match("run ends** here"));
        assert!(close(TagId::Bold).pattern.is_match("run ends** here"));
        assert!(!close(TagId::Bold).pattern.is_match("run ends*** here"));
        assert!(close(TagId::BoldItalic).pattern.is_match("run ends*** here"));
    }

    #[test]
    fn test_italic_open_ignores_list_bullets_and_abbreviations() {
        let table = RuleTable::new(ProfileKind::Editing);
        let open = table
            .rules()
            .iter()
            .find(|r| r.tag == TagId::Italic && r.kind == RuleKind::BoundaryOpen)
            .unwrap();
        assert!(!open.pattern.is_match("* list item"));
        assert!(!open.pattern.is_match("*[HTML]: HyperText Markup Language"));
    }

    #[test]
    fn test_fence_rule_matches_both_fence_styles() {
        let table = RuleTable::new(ProfileKind::Editing);
        let fence = table
            .rules()
            .iter()
            .find(|r| r.tag == TagId::FencedCode)
            .unwrap();
        assert!(fence.pattern.is_match("```rust"));
        assert!(fence.pattern.is_match("~~~"));
        assert!(fence.pattern.is_match("  ```"));
        assert!(!fence.pattern.is_match("text ``` text"));
    }

    #[test]
    fn test_table_row_pattern() {
        let table = RuleTable::new(ProfileKind::Editing);
        let row = table
            .rules()
            .iter()
            .find(|r| r.tag == TagId::TableRow)
            .unwrap();
        assert!(row.pattern.is_match("| a | b |"));
        assert!(row.pattern.is_match("|---|---|"));
        assert!(!row.pattern.is_match("not | a row"));
    }
}

//! Rule Table and token model
//!
//! The engine is data-driven: everything it can recognize is described by an
//! ordered, immutable list of [`Rule`]s compiled once per profile. Order is
//! semantically load-bearing — a rule later in the list that overlaps an
//! earlier rule's span overrides its style (bold-italic is listed after bold
//! and italic so the stronger style wins; image after link for the same
//! reason).
//!
//! Two profiles ship: the full editing profile ([`edit`]) and the reduced
//! view-mode profile ([`view`]). Swapping profiles never requires processor
//! changes.

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod edit;
pub mod view;

// ─────────────────────────────────────────────────────────────────────────────
// Tag Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a recognizable token kind.
///
/// A closed enum rather than free-form strings: block state is keyed by tag,
/// and a closed set gives exhaustiveness at the match sites that drive
/// construct transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagId {
    // Line-level tokens
    Heading,
    HorizontalRule,
    BlankLine,
    // Emphasis family (boundary pairs + single-line "between" rules)
    Italic,
    Bold,
    BoldItalic,
    Strikethrough,
    // Code and comments
    InlineCode,
    FencedCode,
    CodeOperator,
    Comment,
    // Multi-block structure
    BlockQuote,
    List,
    TableRow,
    TableData,
    // Inline tokens
    Link,
    Image,
    Reference,
    Abbreviation,
    HtmlTag,
    // View-mode tokens
    TodoMarker,
    Separator,
}

impl TagId {
    /// Tags whose open/close transitions are driven by the multi-line
    /// construct tracker rather than by rule matches. The rule walk still
    /// emits their spans but never writes their state flags.
    pub fn tracker_managed(self) -> bool {
        matches!(
            self,
            TagId::BlankLine
                | TagId::FencedCode
                | TagId::BlockQuote
                | TagId::List
                | TagId::TableRow
                | TagId::TableData
                | TagId::Comment
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Groups and Styles
// ─────────────────────────────────────────────────────────────────────────────

/// Style-composition group a rule belongs to.
///
/// Groups tie `_open`/`_close` boundary pairs together and drive the
/// resolver: same-group overlap override, the inline-code suppression
/// exemptions (`Code`, `Comment`), and the blockquote inner-background
/// allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Heading,
    Emphasis,
    Strikethrough,
    Underline,
    Emoji,
    Code,
    Comment,
    Quote,
    List,
    Table,
    Link,
    Html,
    Meta,
    HorizontalRule,
    View,
}

impl Group {
    /// Groups that keep their spans inside code blocks; everything else is
    /// gated while `is_in_code()` holds.
    pub fn allowed_in_code(self) -> bool {
        matches!(self, Group::Code | Group::Comment)
    }

    /// Groups whose spans take the blockquote inner background when the
    /// block is inside a blockquote (replacing their own background).
    pub fn inherits_quote_background(self) -> bool {
        matches!(
            self,
            Group::Emphasis
                | Group::Strikethrough
                | Group::Underline
                | Group::List
                | Group::Emoji
                | Group::HorizontalRule
                | Group::Link
        )
    }
}

/// Opaque style identifier carried on emitted spans.
///
/// The engine never resolves a style to colors or fonts; the host's theme
/// provider owns that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleId {
    Heading,
    HorizontalRule,
    Italic,
    Bold,
    BoldItalic,
    Strikethrough,
    CodeInline,
    CodeBlock,
    CodeContent,
    CodeOperator,
    Comment,
    QuoteMarker,
    QuoteInnerBackground,
    ListMarker,
    TableRow,
    Link,
    Image,
    Reference,
    Abbreviation,
    HtmlTag,
    TodoMarker,
    Separator,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Model
// ─────────────────────────────────────────────────────────────────────────────

/// How a rule participates in the token state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Plain single match; no open/close semantics.
    Single,
    /// One regex capturing both delimiters on a single line. Treated as
    /// already resolved: it never toggles the tag's open state.
    Between,
    /// Opening half of a boundary ("duple") pair; sets the tag open.
    BoundaryOpen,
    /// Closing half of a boundary pair; clears the matching open.
    BoundaryClose,
}

impl RuleKind {
    /// Whether this rule is half of a boundary pair.
    pub fn is_boundary(self) -> bool {
        matches!(self, RuleKind::BoundaryOpen | RuleKind::BoundaryClose)
    }
}

/// Named, inspectable predicate kinds (no opaque closures).
///
/// Predicates receive read-only access to the in-progress token runtime
/// state and the previous block's persisted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Fires only inside a fenced or multi-line inline code construct, and
    /// not inside a comment.
    InCode,
    /// Fires only outside any code construct.
    NotInCode,
}

/// One pattern rule of a highlighting profile.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Compiled pattern, run against the whole block text.
    pub pattern: Regex,
    /// Which capture group delimits the token.
    pub capture: usize,
    /// Tag this rule recognizes.
    pub tag: TagId,
    /// Style-composition group.
    pub group: Group,
    /// Participation in the open/close state machine.
    pub kind: RuleKind,
    /// Style of the emitted span.
    pub style: StyleId,
    /// Optional contextual opt-out.
    pub predicate: Option<Predicate>,
    /// Position correction applied to the captured range. Many patterns
    /// capture a group that excludes the delimiter characters (so the
    /// delimiter cannot re-match); these deltas re-expand the emitted span.
    /// The values are per-rule data pinned by tests, not derived.
    pub start_offset: i32,
    /// See `start_offset`.
    pub end_offset: i32,
}

/// Rule definition before pattern compilation, as written in the profiles.
pub(crate) struct RuleDef {
    pub pattern: &'static str,
    pub capture: usize,
    pub tag: TagId,
    pub group: Group,
    pub kind: RuleKind,
    pub style: StyleId,
    pub predicate: Option<Predicate>,
    pub start_offset: i32,
    pub end_offset: i32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Profiles
// ─────────────────────────────────────────────────────────────────────────────

/// Which rule-table profile the engine was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileKind {
    /// Full editing profile: headings, emphasis, code, tables, lists,
    /// blockquotes, links, references, HTML, comments, code operators.
    #[default]
    Editing,
    /// Reduced view-mode profile: strikethrough, TODO markers, the
    /// invisible separator marker.
    Viewing,
}

/// The ordered, immutable rule catalogue for one profile.
#[derive(Debug)]
pub struct RuleTable {
    profile: ProfileKind,
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Compile the rule table for a profile.
    ///
    /// A definition whose pattern fails to compile is logged and skipped;
    /// the table is built from whatever remains (a malformed rule must never
    /// take the whole profile down).
    pub fn new(profile: ProfileKind) -> Self {
        let defs = match profile {
            ProfileKind::Editing => edit::definitions(),
            ProfileKind::Viewing => view::definitions(),
        };

        let mut rules = Vec::with_capacity(defs.len());
        for def in defs {
            match Regex::new(def.pattern) {
                Ok(pattern) => rules.push(Rule {
                    pattern,
                    capture: def.capture,
                    tag: def.tag,
                    group: def.group,
                    kind: def.kind,
                    style: def.style,
                    predicate: def.predicate,
                    start_offset: def.start_offset,
                    end_offset: def.end_offset,
                }),
                Err(err) => {
                    warn!(
                        "Skipping malformed rule for {:?}: pattern {:?} failed to compile: {}",
                        def.tag, def.pattern, err
                    );
                }
            }
        }

        Self { profile, rules }
    }

    /// The profile this table was built from.
    pub fn profile(&self) -> ProfileKind {
        self.profile
    }

    /// The rules in fixed evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Tags that participate in boundary pairs, in table order.
    ///
    /// Used for the interior-line fallback: a still-open boundary group gets
    /// one full-block span. Iteration order matters — when several tags of
    /// one group are open, the last (strongest) wins.
    pub fn boundary_tags(&self) -> Vec<(TagId, Group)> {
        let mut tags: Vec<(TagId, Group)> = Vec::new();
        for rule in &self.rules {
            if rule.kind.is_boundary() && !tags.iter().any(|(t, _)| *t == rule.tag) {
                tags.push((rule.tag, rule.group));
            }
        }
        tags
    }

    /// The display style associated with a tag (its first rule's style).
    ///
    /// Fallback full-block spans and tracker-emitted comment spans use this.
    pub fn style_for(&self, tag: TagId) -> Option<StyleId> {
        self.rules.iter().find(|r| r.tag == tag).map(|r| r.style)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_profile_compiles_all_rules() {
        let table = RuleTable::new(ProfileKind::Editing);
        // Every definition must survive compilation; a drop here means a
        // pattern regressed.
        assert_eq!(table.rules().len(), edit::definitions().len());
    }

    #[test]
    fn test_view_profile_compiles_all_rules() {
        let table = RuleTable::new(ProfileKind::Viewing);
        assert_eq!(table.rules().len(), view::definitions().len());
    }

    #[test]
    fn test_boundary_rules_come_in_pairs() {
        for profile in [ProfileKind::Editing, ProfileKind::Viewing] {
            let table = RuleTable::new(profile);
            for (tag, group) in table.boundary_tags() {
                let opens = table
                    .rules()
                    .iter()
                    .filter(|r| r.tag == tag && r.kind == RuleKind::BoundaryOpen)
                    .count();
                let closes = table
                    .rules()
                    .iter()
                    .filter(|r| r.tag == tag && r.kind == RuleKind::BoundaryClose)
                    .count();
                assert_eq!(opens, 1, "{:?} should have one open rule", tag);
                assert_eq!(closes, 1, "{:?} should have one close rule", tag);
                // Both halves share the pair's group
                assert!(table
                    .rules()
                    .iter()
                    .filter(|r| r.tag == tag && r.kind.is_boundary())
                    .all(|r| r.group == group));
            }
        }
    }

    #[test]
    fn test_stronger_emphasis_listed_later() {
        let table = RuleTable::new(ProfileKind::Editing);
        let position = |tag: TagId| {
            table
                .rules()
                .iter()
                .position(|r| r.tag == tag && r.kind == RuleKind::Between)
                .unwrap_or_else(|| panic!("{:?} between rule missing", tag))
        };
        assert!(position(TagId::Italic) < position(TagId::Bold));
        assert!(position(TagId::Bold) < position(TagId::BoldItalic));
    }

    #[test]
    fn test_image_listed_after_link() {
        let table = RuleTable::new(ProfileKind::Editing);
        let position = |tag: TagId| {
            table
                .rules()
                .iter()
                .position(|r| r.tag == tag)
                .unwrap_or_else(|| panic!("{:?} rule missing", tag))
        };
        assert!(position(TagId::Link) < position(TagId::Image));
    }

    #[test]
    fn test_inline_code_listed_after_emphasis() {
        // The retroactive code-overlap retraction in the resolver exists
        // because inline code is discovered after its competitors.
        let table = RuleTable::new(ProfileKind::Editing);
        let code = table
            .rules()
            .iter()
            .position(|r| r.tag == TagId::InlineCode)
            .expect("inline code rule missing");
        let italic = table
            .rules()
            .iter()
            .position(|r| r.tag == TagId::Italic)
            .expect("italic rule missing");
        assert!(italic < code);
    }

    #[test]
    fn test_style_for_known_tags() {
        let table = RuleTable::new(ProfileKind::Editing);
        assert_eq!(table.style_for(TagId::Bold), Some(StyleId::Bold));
        assert_eq!(table.style_for(TagId::InlineCode), Some(StyleId::CodeInline));
        // Tracker-only tags have no rule, hence no style
        assert_eq!(table.style_for(TagId::BlankLine), None);
    }

    #[test]
    fn test_group_code_exemptions() {
        assert!(Group::Code.allowed_in_code());
        assert!(Group::Comment.allowed_in_code());
        assert!(!Group::Emphasis.allowed_in_code());
        assert!(!Group::Table.allowed_in_code());
    }

    #[test]
    fn test_quote_background_allow_list() {
        for group in [
            Group::Emphasis,
            Group::Strikethrough,
            Group::Underline,
            Group::List,
            Group::Emoji,
            Group::HorizontalRule,
            Group::Link,
        ] {
            assert!(group.inherits_quote_background(), "{:?}", group);
        }
        for group in [Group::Code, Group::Comment, Group::Quote, Group::Table] {
            assert!(!group.inherits_quote_background(), "{:?}", group);
        }
    }

    #[test]
    fn test_tracker_managed_tags() {
        assert!(TagId::FencedCode.tracker_managed());
        assert!(TagId::BlockQuote.tracker_managed());
        assert!(TagId::Comment.tracker_managed());
        assert!(!TagId::Bold.tracker_managed());
        assert!(!TagId::InlineCode.tracker_managed());
    }
}

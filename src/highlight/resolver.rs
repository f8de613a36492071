//! Inline Span Resolver
//!
//! Reconciles overlapping matches before they become final spans:
//! - same-group override: the later rule wins an overlap (bold-italic over
//!   bold over italic, image over link),
//! - inline code wins: non-code spans intersecting a code span are
//!   suppressed, including retroactive retraction of spans accepted before
//!   the code match was discovered,
//! - blockquote composition: allow-listed groups take the quote's inner
//!   background instead of their own.
//!
//! The retroactive retraction is deliberately kept as a second look at
//! already-accepted spans rather than a single sorted sweep; a one-pass
//! rewrite would change output on adversarial input.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::rules::{Group, StyleId, TagId};

// ─────────────────────────────────────────────────────────────────────────────
// FormatSpan
// ─────────────────────────────────────────────────────────────────────────────

/// The only output artifact handed to rendering: a byte range plus style
/// identifiers. Carries no reference back into block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpan {
    pub start: usize,
    pub length: usize,
    /// Foreground/typographic style; resolved to colors by the host theme.
    pub style: StyleId,
    pub group: Group,
    /// Replacement background, set when a quote's inner background takes
    /// over. `None` means the style's own default background.
    pub background: Option<StyleId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Span Candidates
// ─────────────────────────────────────────────────────────────────────────────

/// A span recorded during the pass, before overlap resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpanCandidate {
    /// Position of the originating rule in the table; drives the
    /// later-rule-wins override. Synthetic candidates carry no rule.
    pub rule_index: usize,
    pub tag: TagId,
    pub group: Group,
    pub style: StyleId,
    pub start: usize,
    pub end: usize,
    /// Emitted by the tracker or the fallback step rather than a rule
    /// match; exempt from the same-group override.
    pub synthetic: bool,
}

impl SpanCandidate {
    pub fn from_rule(
        rule_index: usize,
        tag: TagId,
        group: Group,
        style: StyleId,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            rule_index,
            tag,
            group,
            style,
            start,
            end,
            synthetic: false,
        }
    }

    pub fn synthetic(tag: TagId, group: Group, style: StyleId, start: usize, end: usize) -> Self {
        Self {
            rule_index: usize::MAX,
            tag,
            group,
            style,
            start,
            end,
            synthetic: true,
        }
    }

    fn overlaps(&self, other: &SpanCandidate) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Code and comment spans are the suppression winners.
    fn is_codeish(&self) -> bool {
        self.group.allowed_in_code()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve candidates into final spans, ordered by start position.
pub(crate) fn resolve(candidates: Vec<SpanCandidate>, in_quote: bool) -> Vec<FormatSpan> {
    // Same-group override: a later rule that overlaps an earlier rule's
    // span replaces it. Synthetic spans are not part of the ordering game.
    let survivors: Vec<SpanCandidate> = candidates
        .iter()
        .filter(|c| {
            if c.synthetic {
                return true;
            }
            let overridden = candidates.iter().any(|other| {
                !other.synthetic
                    && other.group == c.group
                    && other.rule_index > c.rule_index
                    && other.overlaps(c)
            });
            if overridden {
                debug!("span {:?} at {}..{} overridden by a later rule", c.tag, c.start, c.end);
            }
            !overridden
        })
        .copied()
        .collect();

    // Inline code wins. Acceptance happens in discovery order; a code span
    // found late retracts earlier non-code acceptances it overlaps.
    let mut accepted: Vec<SpanCandidate> = Vec::new();
    for candidate in survivors {
        if candidate.is_codeish() {
            let before = accepted.len();
            accepted.retain(|a| a.is_codeish() || !a.overlaps(&candidate));
            if accepted.len() != before {
                debug!(
                    "retracted {} span(s) overlapping code at {}..{}",
                    before - accepted.len(),
                    candidate.start,
                    candidate.end
                );
            }
            accepted.push(candidate);
        } else if accepted
            .iter()
            .any(|a| a.is_codeish() && a.overlaps(&candidate))
        {
            debug!(
                "suppressed {:?} span at {}..{}: intersects inline code",
                candidate.tag, candidate.start, candidate.end
            );
        } else {
            accepted.push(candidate);
        }
    }

    let mut spans: Vec<FormatSpan> = accepted
        .into_iter()
        .map(|c| FormatSpan {
            start: c.start,
            length: c.end - c.start,
            style: c.style,
            group: c.group,
            background: if in_quote && c.group.inherits_quote_background() {
                Some(StyleId::QuoteInnerBackground)
            } else {
                None
            },
        })
        .collect();
    spans.sort_by_key(|s| (s.start, s.length));
    spans
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Multi-line Construct Tracker
//!
//! Tags whose close condition is a structural event — the next blank line, a
//! matching fence marker, a non-quoted line — rather than an in-line
//! delimiter. These are evaluated before the generic rule walk and own their
//! tags' state flags; the rule table only styles their delimiters.
//!
//! Transition table:
//! - blank line: recorded on the block, never carries across blocks itself.
//! - fence: opens only when the line above was blank (or block 0); interior
//!   lines stay `within` regardless of content; closes on a fence marker.
//! - blockquote: opens on a `>` prefix; survives quoted or blank-adjacent
//!   lines; closes on a non-quoted, non-blank line.
//! - list: opens on an item marker with no blank-line requirement; blank
//!   lines do not close it; closes on a non-blank, non-item, non-indented
//!   line.
//! - table: a header-separator row retroactively marks the previous block
//!   as a data row, one-block lookback only.
//! - HTML comment: string-scanned here (the open condition "`<!--` with no
//!   `-->` after it" is not expressible in the rule patterns).

use log::{debug, info};

use crate::highlight::resolver::SpanCandidate;
use crate::highlight::runtime::{self, TokenRuntimeState};
use crate::rules::{Group, RuleTable, TagId};
use crate::state::{BlockState, Occurrence};

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

/// Run the construct transitions for one block.
///
/// Mutates the current block's state and the pass runtime; the previous
/// block's state is read-only except for the table lookback.
pub(crate) fn track(
    index: usize,
    text: &str,
    mut previous: Option<&mut BlockState>,
    state: &mut BlockState,
    rt: &mut TokenRuntimeState,
    candidates: &mut Vec<SpanCandidate>,
    table: &RuleTable,
) {
    let len = text.len();
    let trimmed = text.trim_start();
    let is_blank = trimmed.is_empty();

    // Blank line: a fact about this block only.
    if is_blank {
        state.put(TagId::BlankLine, Occurrence::plain(0, len));
    }

    let prev_blank = previous
        .as_deref()
        .map(|p| p.get(TagId::BlankLine).is_some())
        .unwrap_or(index == 0);

    track_fence(index, text, trimmed, previous.as_deref(), state, rt);
    track_comment(text, previous.as_deref(), state, rt, candidates, table);

    // Inside code or a comment, quote/list/table structure is just content.
    let structural_gated = runtime::is_in_code(rt, previous.as_deref())
        || runtime::is_in_comment(rt, previous.as_deref());
    if !structural_gated {
        track_quote(trimmed, is_blank, len, previous.as_deref(), state, rt);
        track_list(text, trimmed, is_blank, len, previous.as_deref(), state, rt);
        track_table(index, trimmed, len, prev_blank, previous.as_deref_mut(), state);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fenced Code
// ─────────────────────────────────────────────────────────────────────────────

fn is_fence_marker(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Minimal mid-construct heuristic for state loss: indented continuation
/// lines are the only content cheap enough to classify without context.
fn looks_like_code_interior(text: &str) -> bool {
    text.starts_with("    ") || text.starts_with('\t')
}

fn track_fence(
    index: usize,
    text: &str,
    trimmed: &str,
    previous: Option<&BlockState>,
    state: &mut BlockState,
    rt: &mut TokenRuntimeState,
) {
    let len = text.len();
    let prev_in_fence = previous
        .map(|p| p.carries_over(TagId::FencedCode))
        .unwrap_or(false);
    let prev_blank = previous
        .map(|p| p.get(TagId::BlankLine).is_some())
        .unwrap_or(index == 0);

    if is_fence_marker(trimmed) {
        if prev_in_fence {
            state.put(TagId::FencedCode, Occurrence::closing(0, len));
            rt.set_open(TagId::FencedCode, Group::Code, false);
        } else if prev_blank {
            state.put(TagId::FencedCode, Occurrence::opening(0, len));
            rt.set_open(TagId::FencedCode, Group::Code, true);
        } else {
            debug!(
                "fence marker at block {} ignored: line above is not blank",
                index
            );
        }
    } else if prev_in_fence {
        state.put(TagId::FencedCode, Occurrence::interior(0, len));
        rt.set_open(TagId::FencedCode, Group::Code, true);
    } else if previous.is_none() && index > 0 && looks_like_code_interior(text) {
        // Previous state missing or corrupt: self-heal from content alone.
        info!(
            "block {} has no previous state but looks like code; re-deriving within flag",
            index
        );
        state.put(TagId::FencedCode, Occurrence::interior(0, len));
        rt.set_open(TagId::FencedCode, Group::Code, true);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Comment
// ─────────────────────────────────────────────────────────────────────────────

fn track_comment(
    text: &str,
    previous: Option<&BlockState>,
    state: &mut BlockState,
    rt: &mut TokenRuntimeState,
    candidates: &mut Vec<SpanCandidate>,
    table: &RuleTable,
) {
    let len = text.len();
    let style = table.style_for(TagId::Comment);
    let prev_in_comment = previous
        .map(|p| p.carries_over(TagId::Comment))
        .unwrap_or(false);

    let mut scan_from = 0;
    if prev_in_comment {
        match text.find("-->") {
            Some(pos) => {
                let end = pos + 3;
                state.put(TagId::Comment, Occurrence::closing(0, end));
                rt.set_open(TagId::Comment, Group::Comment, false);
                if let Some(style) = style {
                    candidates.push(SpanCandidate::synthetic(
                        TagId::Comment,
                        Group::Comment,
                        style,
                        0,
                        end,
                    ));
                    rt.any_span_formatted = true;
                }
                scan_from = end;
            }
            None => {
                state.put(TagId::Comment, Occurrence::interior(0, len));
                rt.set_open(TagId::Comment, Group::Comment, true);
                if let Some(style) = style {
                    if len > 0 {
                        candidates.push(SpanCandidate::synthetic(
                            TagId::Comment,
                            Group::Comment,
                            style,
                            0,
                            len,
                        ));
                        rt.any_span_formatted = true;
                    }
                }
                return;
            }
        }
    }

    // An opener with no closer after it starts a new multi-line comment
    // (single-line comments are the between-rule's business).
    if let Some(rel) = text[scan_from..].rfind("<!--") {
        let open_pos = scan_from + rel;
        if !text[open_pos..].contains("-->") {
            state.put(TagId::Comment, Occurrence::opening(open_pos, len));
            rt.set_open(TagId::Comment, Group::Comment, true);
            if let Some(style) = style {
                candidates.push(SpanCandidate::synthetic(
                    TagId::Comment,
                    Group::Comment,
                    style,
                    open_pos,
                    len,
                ));
                rt.any_span_formatted = true;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Blockquote
// ─────────────────────────────────────────────────────────────────────────────

fn track_quote(
    trimmed: &str,
    is_blank: bool,
    len: usize,
    previous: Option<&BlockState>,
    state: &mut BlockState,
    rt: &mut TokenRuntimeState,
) {
    let prev_in_quote = previous
        .map(|p| p.carries_over(TagId::BlockQuote))
        .unwrap_or(false);
    let quoted = trimmed.starts_with('>');

    if quoted {
        let occurrence = if prev_in_quote {
            Occurrence::interior(0, len)
        } else {
            Occurrence::opening(0, len)
        };
        state.put(TagId::BlockQuote, occurrence);
        rt.set_open(TagId::BlockQuote, Group::Quote, true);
    } else if prev_in_quote && is_blank {
        // Blank-adjacent lines keep the quote alive
        state.put(TagId::BlockQuote, Occurrence::interior(0, len));
        rt.set_open(TagId::BlockQuote, Group::Quote, true);
    } else if prev_in_quote {
        state.put(TagId::BlockQuote, Occurrence::closing(0, len));
        rt.set_open(TagId::BlockQuote, Group::Quote, false);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// List
// ─────────────────────────────────────────────────────────────────────────────

fn is_list_item(trimmed: &str) -> bool {
    if trimmed.starts_with("- ")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("+ ")
    {
        return true;
    }
    // Ordered markers: digits followed by '.' or ')' and a space
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let rest = &trimmed[digits..];
    (rest.starts_with(". ") || rest.starts_with(") ")) && rest.len() > 2
}

fn track_list(
    text: &str,
    trimmed: &str,
    is_blank: bool,
    len: usize,
    previous: Option<&BlockState>,
    state: &mut BlockState,
    rt: &mut TokenRuntimeState,
) {
    let prev_in_list = previous
        .map(|p| p.carries_over(TagId::List))
        .unwrap_or(false);
    let indented = text.starts_with("  ") || text.starts_with('\t');

    if is_list_item(trimmed) {
        let occurrence = if prev_in_list {
            Occurrence::interior(0, len)
        } else {
            // No preceding blank line is required to open a list
            Occurrence::opening(0, len)
        };
        state.put(TagId::List, occurrence);
        rt.set_open(TagId::List, Group::List, true);
    } else if prev_in_list && (is_blank || indented) {
        // Lenient continuation: items may be separated by blank lines
        state.put(TagId::List, Occurrence::interior(0, len));
        rt.set_open(TagId::List, Group::List, true);
    } else if prev_in_list {
        state.put(TagId::List, Occurrence::closing(0, len));
        rt.set_open(TagId::List, Group::List, false);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table
// ─────────────────────────────────────────────────────────────────────────────

fn looks_like_table_row(trimmed: &str) -> bool {
    let trimmed = trimmed.trim_end();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

fn is_table_separator(trimmed: &str) -> bool {
    looks_like_table_row(trimmed)
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn track_table(
    index: usize,
    trimmed: &str,
    len: usize,
    prev_blank: bool,
    previous: Option<&mut BlockState>,
    state: &mut BlockState,
) {
    if !looks_like_table_row(trimmed) {
        return;
    }

    // `opened` marks a head-row candidate: a row preceded by a blank line
    // (or at the top of the document). The separator lookback requires it.
    let occurrence = if prev_blank || index == 0 {
        Occurrence::opening(0, len)
    } else {
        Occurrence::interior(0, len)
    };
    state.put(TagId::TableRow, occurrence);

    if is_table_separator(trimmed) && index > 0 {
        // One-block lookback: the row above the separator becomes a data
        // row retroactively.
        if let Some(prev) = previous {
            if let Some(row) = prev.get(TagId::TableRow).copied() {
                if row.opened {
                    prev.put(TagId::TableData, Occurrence::interior(row.start, row.end));
                    debug!(
                        "separator at block {} retroactively marked block {} as a table data row",
                        index,
                        index - 1
                    );
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Block Processor
//!
//! The core algorithm: one block in, spans and fresh state out. A state
//! machine per tag, not one global machine — each pass rebuilds the token
//! runtime, runs the construct tracker, walks the rule table in order,
//! synthesizes fallback spans for still-open boundary groups, and hands the
//! candidates to the resolver.
//!
//! The processor is synchronous and never suspends mid-block: interrupting
//! a pass would leave block state partially written. Scheduling lives in
//! [`crate::scheduler`], above this layer.

use log::{debug, info, warn};

use crate::highlight::multiline;
use crate::highlight::resolver::{self, FormatSpan, SpanCandidate};
use crate::highlight::runtime::{self, TokenRuntimeState};
use crate::rules::{Group, ProfileKind, RuleKind, RuleTable, StyleId, TagId};
use crate::state::{BlockState, Occurrence};
use crate::string_utils::clamp_span;

// ─────────────────────────────────────────────────────────────────────────────
// Outcome Types
// ─────────────────────────────────────────────────────────────────────────────

/// Result of processing one block.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Final spans, ordered by start position.
    pub spans: Vec<FormatSpan>,
    /// Whether a multi-block construct on this block continues past it —
    /// the host should reprocess the following block when this changes.
    pub continues_construct: bool,
}

/// One block's result from a whole-document pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockHighlight {
    pub state: BlockState,
    pub spans: Vec<FormatSpan>,
    pub continues_construct: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// HighlightEngine
// ─────────────────────────────────────────────────────────────────────────────

/// The engine facade: an immutable rule table plus the processing
/// algorithm. Construct once per profile and share; processing takes the
/// document data by argument, so one engine serves any number of documents.
pub struct HighlightEngine {
    table: RuleTable,
}

impl HighlightEngine {
    /// Build an engine for a profile. The profile cannot change afterwards;
    /// switching profiles means a new engine and a full re-highlight.
    pub fn new(profile: ProfileKind) -> Self {
        Self {
            table: RuleTable::new(profile),
        }
    }

    pub fn profile(&self) -> ProfileKind {
        self.table.profile()
    }

    pub fn rule_table(&self) -> &RuleTable {
        &self.table
    }

    /// Process one block.
    ///
    /// `previous` is the preceding block's already-finalized state (`None`
    /// for the first block, or after state loss — the engine then
    /// self-heals what it can). It is read-only except for the table
    /// lookback, which retroactively marks the previous block as a data
    /// row. `state` is this block's record; the pass rewrites it fully.
    pub fn process_block(
        &self,
        index: usize,
        text: &str,
        mut previous: Option<&mut BlockState>,
        state: &mut BlockState,
    ) -> ProcessOutcome {
        let len = text.len();
        let is_blank = text.trim().is_empty();
        let mut rt = TokenRuntimeState::new();
        let mut candidates: Vec<SpanCandidate> = Vec::new();
        state.clear();

        // Structural constructs first: their open/close semantics are not
        // single-line regex hits.
        multiline::track(
            index,
            text,
            previous.as_deref_mut(),
            state,
            &mut rt,
            &mut candidates,
            &self.table,
        );
        let previous = previous.as_deref();

        // Interior fence lines get the code-content backdrop; everything
        // else on them is gated below.
        if self.table.style_for(TagId::FencedCode).is_some() {
            if let Some(occ) = state.get(TagId::FencedCode) {
                if occ.within && !occ.opened && !occ.closed && len > 0 {
                    candidates.push(SpanCandidate::synthetic(
                        TagId::FencedCode,
                        Group::Code,
                        StyleId::CodeContent,
                        0,
                        len,
                    ));
                    rt.any_span_formatted = true;
                }
            }
        }

        // Boundary groups already open when this block starts. Single-token
        // matches of these groups are duplicates of the running span.
        let carried_groups: Vec<Group> = self
            .table
            .boundary_tags()
            .into_iter()
            .filter(|(tag, _)| previous.map(|p| p.carries_over(*tag)).unwrap_or(false))
            .map(|(_, group)| group)
            .collect();

        self.walk_rules(text, previous, state, &mut rt, &mut candidates, &carried_groups);
        self.apply_open_fallbacks(text, is_blank, previous, state, &rt, &mut candidates);

        let in_quote = runtime::is_in_blockquote(&rt, previous);
        let spans = resolver::resolve(candidates, in_quote);

        ProcessOutcome {
            continues_construct: state.continues_construct(),
            spans,
        }
    }

    /// Convenience full pass over a document, block by block in order.
    pub fn highlight_document(&self, lines: &[&str]) -> Vec<BlockHighlight> {
        let mut results: Vec<BlockHighlight> = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let mut state = BlockState::new();
            let previous = results.last_mut().map(|r| &mut r.state);
            let outcome = self.process_block(index, line, previous, &mut state);
            results.push(BlockHighlight {
                state,
                spans: outcome.spans,
                continues_construct: outcome.continues_construct,
            });
        }
        results
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rule Walk
    // ─────────────────────────────────────────────────────────────────────

    fn walk_rules(
        &self,
        text: &str,
        previous: Option<&BlockState>,
        state: &mut BlockState,
        rt: &mut TokenRuntimeState,
        candidates: &mut Vec<SpanCandidate>,
        carried_groups: &[Group],
    ) {
        for (rule_index, rule) in self.table.rules().iter().enumerate() {
            // Inside code, only code/comment rules apply
            if runtime::is_in_code(rt, previous) && !rule.group.allowed_in_code() {
                continue;
            }
            if let Some(predicate) = rule.predicate {
                if !runtime::predicate_holds(predicate, rt, previous) {
                    continue;
                }
            }

            for caps in rule.pattern.captures_iter(text) {
                let m = match caps.get(rule.capture) {
                    Some(m) => m,
                    None => {
                        warn!(
                            "rule {:?} capture group {} out of range; rule skipped for this block",
                            rule.tag, rule.capture
                        );
                        break;
                    }
                };
                let Some((start, end)) = clamp_span(
                    text,
                    m.start() as i64 + rule.start_offset as i64,
                    m.end() as i64 + rule.end_offset as i64,
                ) else {
                    continue;
                };

                match rule.kind {
                    RuleKind::Single | RuleKind::Between => {
                        if carried_groups.contains(&rule.group) {
                            // Already inside an open run of this group; a
                            // lone match would double-count it.
                            debug!(
                                "dropping {:?} match at {}..{} inside an open {:?} run",
                                rule.tag, start, end, rule.group
                            );
                            continue;
                        }
                        rt.record_match(rule.tag);
                        rt.any_span_formatted = true;
                        candidates.push(SpanCandidate::from_rule(
                            rule_index, rule.tag, rule.group, rule.style, start, end,
                        ));
                        if !rule.tag.tracker_managed() {
                            state.put(rule.tag, Occurrence::plain(start, end));
                        }
                    }
                    RuleKind::BoundaryOpen => {
                        // A closing delimiter of an already-recorded span of
                        // this tag can re-read as an opener; ignore those.
                        let shadowed = candidates
                            .iter()
                            .any(|c| c.tag == rule.tag && c.start <= start && start <= c.end);
                        if shadowed {
                            continue;
                        }
                        rt.record_match(rule.tag);
                        rt.set_open(rule.tag, rule.group, true);
                        rt.any_span_formatted = true;
                        candidates.push(SpanCandidate::from_rule(
                            rule_index, rule.tag, rule.group, rule.style, start, end,
                        ));
                        if !rule.tag.tracker_managed() {
                            state.put(rule.tag, Occurrence::opening(start, end));
                        }
                    }
                    RuleKind::BoundaryClose => {
                        // The opening delimiter of a span already recorded
                        // for this tag can re-read as a closer; ignore those.
                        let shadowed = candidates
                            .iter()
                            .any(|c| c.tag == rule.tag && c.start <= end && start <= c.end);
                        if shadowed {
                            continue;
                        }
                        let was_open = rt.is_open(rule.tag).unwrap_or_else(|| {
                            previous.map(|p| p.carries_over(rule.tag)).unwrap_or(false)
                        });
                        if !was_open {
                            // Silently dropping the close would misformat
                            // every following block; honor it.
                            info!(
                                "close for {:?} at {}..{} with no recorded open; honoring",
                                rule.tag, start, end
                            );
                        }
                        rt.record_match(rule.tag);
                        rt.set_open(rule.tag, rule.group, false);
                        rt.any_span_formatted = true;
                        candidates.push(SpanCandidate::from_rule(
                            rule_index, rule.tag, rule.group, rule.style, start, end,
                        ));
                        if !rule.tag.tracker_managed() {
                            state.put(rule.tag, Occurrence::closing(start, end));
                        }
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Open-Run Fallback
    // ─────────────────────────────────────────────────────────────────────

    /// A boundary group still open with no span formatted on this block at
    /// all means the block is entirely inside the run: synthesize one
    /// full-block span in the group's style, and persist the continuation.
    fn apply_open_fallbacks(
        &self,
        text: &str,
        is_blank: bool,
        previous: Option<&BlockState>,
        state: &mut BlockState,
        rt: &TokenRuntimeState,
        candidates: &mut Vec<SpanCandidate>,
    ) {
        if is_blank {
            // A blank line is a paragraph boundary: unterminated inline
            // runs do not survive it.
            for (tag, _) in self.table.boundary_tags() {
                let carried = previous.map(|p| p.carries_over(tag)).unwrap_or(false);
                if carried && rt.is_open(tag) != Some(false) {
                    debug!("open {:?} run ended by blank line", tag);
                }
            }
            return;
        }

        let mut open_by_group: Vec<(Group, TagId)> = Vec::new();
        for (tag, group) in self.table.boundary_tags() {
            let open = rt.is_open(tag).unwrap_or_else(|| {
                previous.map(|p| p.carries_over(tag)).unwrap_or(false)
            });
            if open {
                match open_by_group.iter_mut().find(|(g, _)| *g == group) {
                    // Later tags in table order are the stronger styles
                    Some(slot) => slot.1 = tag,
                    None => open_by_group.push((group, tag)),
                }
            }
        }

        for (group, tag) in open_by_group {
            if rt.is_open(tag).is_none() && !tag.tracker_managed() {
                // Carried purely from the previous block; record this
                // block's membership so the run keeps flowing.
                state.put(tag, Occurrence::interior(0, text.len()));
            }
            if !rt.any_span_formatted {
                if let Some(style) = self.table.style_for(tag) {
                    candidates.push(SpanCandidate::synthetic(tag, group, style, 0, text.len()));
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

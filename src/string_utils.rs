//! UTF-8 Safe Span Clamping
//!
//! Rule patterns report byte offsets, and the position-correction step adds
//! per-rule deltas to them. A corrected offset must never land inside a
//! multi-byte character (`ø`, `中`, `🎉`), or slicing the block text for a
//! span would panic. These helpers clamp arbitrary byte positions to valid
//! character boundaries before any span is emitted.

// ─────────────────────────────────────────────────────────────────────────────
// Character Boundary Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the largest index that is less than or equal to `index`
/// and is on a UTF-8 character boundary.
///
/// If `index` is greater than the string length, returns the string length.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i > 0 && !is_utf8_char_start(bytes[i]) {
        i -= 1;
    }
    i
}

/// Returns the smallest index that is greater than or equal to `index`
/// and is on a UTF-8 character boundary.
///
/// If `index` is greater than or equal to the string length, returns the
/// string length.
#[inline]
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i < bytes.len() && !is_utf8_char_start(bytes[i]) {
        i += 1;
    }
    i
}

/// Check if a byte is the start of a UTF-8 character.
///
/// A byte is a char start if it is not a continuation byte (10xxxxxx).
#[inline]
fn is_utf8_char_start(byte: u8) -> bool {
    (byte & 0b1100_0000) != 0b1000_0000
}

// ─────────────────────────────────────────────────────────────────────────────
// Span Clamping
// ─────────────────────────────────────────────────────────────────────────────

/// Clamp a candidate span to the text bounds and to character boundaries.
///
/// `start` is floored, `end` is ceiled, and both are kept within
/// `0..=text.len()`. Returns `None` when nothing remains of the span.
#[inline]
pub fn clamp_span(text: &str, start: i64, end: i64) -> Option<(usize, usize)> {
    let len = text.len() as i64;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    let start = floor_char_boundary(text, start);
    let end = ceil_char_boundary(text, end);
    if start >= end {
        return None;
    }
    Some((start, end))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_ascii() {
        let s = "Hello";
        assert_eq!(floor_char_boundary(s, 0), 0);
        assert_eq!(floor_char_boundary(s, 2), 2);
        assert_eq!(floor_char_boundary(s, 10), 5); // Beyond end
    }

    #[test]
    fn test_floor_multibyte() {
        let s = "Hei på deg"; // 'å' occupies bytes 5-6
        assert_eq!(floor_char_boundary(s, 5), 5); // Start of 'å'
        assert_eq!(floor_char_boundary(s, 6), 5); // Middle of 'å', floors to 5
        assert_eq!(floor_char_boundary(s, 7), 7); // ' '
    }

    #[test]
    fn test_ceil_multibyte() {
        let s = "Hei på deg";
        assert_eq!(ceil_char_boundary(s, 5), 5); // Start of 'å'
        assert_eq!(ceil_char_boundary(s, 6), 7); // Middle of 'å', ceils to next char
    }

    #[test]
    fn test_ceil_emoji() {
        let s = "Hi🎉!"; // 🎉 occupies bytes 2-5
        assert_eq!(ceil_char_boundary(s, 3), 6);
        assert_eq!(ceil_char_boundary(s, 6), 6);
    }

    #[test]
    fn test_clamp_span_in_bounds() {
        assert_eq!(clamp_span("Hello", 0, 5), Some((0, 5)));
        assert_eq!(clamp_span("Hello", 1, 3), Some((1, 3)));
    }

    #[test]
    fn test_clamp_span_negative_start() {
        // Position correction can push a start below zero near line starts
        assert_eq!(clamp_span("Hello", -2, 3), Some((0, 3)));
    }

    #[test]
    fn test_clamp_span_past_end() {
        assert_eq!(clamp_span("Hello", 2, 99), Some((2, 5)));
    }

    #[test]
    fn test_clamp_span_empty() {
        assert_eq!(clamp_span("Hello", 3, 3), None);
        assert_eq!(clamp_span("Hello", 4, 2), None);
    }

    #[test]
    fn test_clamp_span_mid_character() {
        let s = "a🎉b"; // 🎉 at bytes 1-4
        let (start, end) = clamp_span(s, 2, 3).expect("span should survive clamping");
        assert_eq!((start, end), (1, 5));
        // The resulting range must be sliceable
        assert_eq!(&s[start..end], "🎉");
    }

    #[test]
    fn test_no_panic_on_any_index() {
        let s = "Hei på 你好 🎉";
        for i in 0..=(s.len() as i64 + 4) {
            for j in 0..=(s.len() as i64 + 4) {
                if let Some((a, b)) = clamp_span(s, i, j) {
                    let _ = &s[a..b];
                }
            }
        }
    }
}

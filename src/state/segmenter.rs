use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

use super::message::MessageKind;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Synthetic label prefixed to the live view while a reasoning span is open.
pub const REASONING_HEADER: &str = "Entering reasoning…\n\n";

fn marker_automaton() -> &'static AhoCorasick {
    static MARKERS: OnceLock<AhoCorasick> = OnceLock::new();
    MARKERS.get_or_init(|| {
        AhoCorasick::new([THINK_OPEN, THINK_CLOSE]).expect("marker patterns must build")
    })
}

/// Result of one incremental classification pass over the accumulated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub display_text: String,
    pub in_reasoning_span: bool,
    pub header_inserted: bool,
}

/// A finalized slice of the response, before transcript ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: MessageKind,
    pub text: String,
}

/// Classify the stream-so-far. Pure and total: any input, with zero,
/// unmatched, or malformed markers, produces a defined result.
///
/// The tail of the stream counts as inside a reasoning span when the number
/// of opening markers exceeds the number of closing markers; parity over the
/// whole buffer, not the position of the last marker, decides. Markers are
/// stripped from the display text, and the reasoning header is prefixed
/// while the header flag is held (callers reset the flag when a span closes,
/// so each span announces itself once).
pub fn classify(raw: &str, header_already_inserted: bool) -> Classification {
    let (stripped, open_count, close_count) = strip_and_count(raw);

    let in_reasoning_span = open_count > close_count;
    let header_inserted = header_already_inserted || in_reasoning_span;
    let display_text = if header_inserted {
        format!("{REASONING_HEADER}{stripped}")
    } else {
        stripped
    };

    Classification {
        display_text,
        in_reasoning_span,
        header_inserted,
    }
}

/// Split a complete response into ordered segments. Text before each matched
/// `<think>…</think>` pair becomes a Normal segment, the pair's interior a
/// Reasoning segment; both are trimmed and dropped when empty. Whatever
/// remains after the last matched pair is emitted as a final Normal segment
/// with any leftover markers (an unmatched trailing opener) stripped, so the
/// finalized view agrees with the live view.
pub fn finalize(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = raw;

    loop {
        let Some(open) = rest.find(THINK_OPEN) else {
            break;
        };
        let after_open = &rest[open + THINK_OPEN.len()..];
        let Some(close) = after_open.find(THINK_CLOSE) else {
            break;
        };

        let before = rest[..open].trim();
        if !before.is_empty() {
            segments.push(Segment {
                kind: MessageKind::Normal,
                text: before.to_string(),
            });
        }

        let interior = after_open[..close].trim();
        if !interior.is_empty() {
            segments.push(Segment {
                kind: MessageKind::Reasoning,
                text: interior.to_string(),
            });
        }

        rest = &after_open[close + THINK_CLOSE.len()..];
    }

    let tail = strip_markers(rest);
    let tail = tail.trim();
    if !tail.is_empty() {
        segments.push(Segment {
            kind: MessageKind::Normal,
            text: tail.to_string(),
        });
    }

    segments
}

/// Remove every marker occurrence from `raw`.
pub fn strip_markers(raw: &str) -> String {
    strip_and_count(raw).0
}

fn strip_and_count(raw: &str) -> (String, usize, usize) {
    let mut open_count = 0usize;
    let mut close_count = 0usize;
    let mut stripped = String::with_capacity(raw.len());
    let mut scanned_to = 0usize;

    for found in marker_automaton().find_iter(raw) {
        if found.pattern().as_usize() == 0 {
            open_count += 1;
        } else {
            close_count += 1;
        }
        stripped.push_str(&raw[scanned_to..found.start()]);
        scanned_to = found.end();
    }
    stripped.push_str(&raw[scanned_to..]);

    (stripped, open_count, close_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_passes_marker_free_input_through() {
        let classification = classify("plain answer", false);
        assert!(!classification.in_reasoning_span);
        assert!(!classification.header_inserted);
        assert_eq!(classification.display_text, "plain answer");
    }

    #[test]
    fn test_classify_is_idempotent_for_fixed_input() {
        let raw = "before<think>inside";
        let first = classify(raw, false);
        let second = classify(raw, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_classify_detects_open_span_and_inserts_header_once() {
        let classification = classify("<think>mulling", false);
        assert!(classification.in_reasoning_span);
        assert!(classification.header_inserted);
        assert_eq!(
            classification.display_text,
            format!("{REASONING_HEADER}mulling")
        );

        // Re-running with the flag already set keeps the header stable.
        let again = classify("<think>mulling it over", true);
        assert_eq!(
            again.display_text,
            format!("{REASONING_HEADER}mulling it over")
        );
    }

    #[test]
    fn test_classify_closed_span_without_flag_shows_no_header() {
        let classification = classify("<think>done</think>answer", false);
        assert!(!classification.in_reasoning_span);
        assert!(!classification.header_inserted);
        assert_eq!(classification.display_text, "doneanswer");
    }

    #[test]
    fn test_finalize_splits_reasoning_then_answer() {
        let segments = finalize("<think>reasoning here</think>final answer");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].kind, MessageKind::Reasoning);
        assert_eq!(segments[0].text, "reasoning here");
        assert_eq!(segments[1].kind, MessageKind::Normal);
        assert_eq!(segments[1].text, "final answer");
    }

    #[test]
    fn test_finalize_empty_interior_yields_no_segments() {
        assert!(finalize("<think>   </think>").is_empty());
        assert!(finalize("").is_empty());
    }

    #[test]
    fn test_unmatched_trailing_opener_is_absorbed_into_normal_tail() {
        let segments = finalize("answer so far<think>unfinished");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, MessageKind::Normal);
        assert_eq!(segments[0].text, "answer so farunfinished");
    }

    #[test]
    fn test_strip_markers_removes_every_occurrence() {
        assert_eq!(strip_markers("a<think>b</think>c<think>d"), "abcd");
    }
}

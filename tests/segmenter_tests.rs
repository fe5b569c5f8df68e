use ponder::state::{classify, finalize, strip_markers, MessageKind};

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_finalize_preserves_content_and_order_for_balanced_pairs() {
    let raw = "intro <think>first thoughts</think> middle <think>second</think> outro";
    let segments = finalize(raw);

    let kinds: Vec<MessageKind> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MessageKind::Normal,
            MessageKind::Reasoning,
            MessageKind::Normal,
            MessageKind::Reasoning,
            MessageKind::Normal,
        ]
    );

    let concatenated: String = segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        without_whitespace(&concatenated),
        without_whitespace(&strip_markers(raw))
    );
}

#[test]
fn test_finalize_reasoning_then_answer() {
    let segments = finalize("<think>reasoning here</think>final answer");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].kind, MessageKind::Reasoning);
    assert_eq!(segments[0].text, "reasoning here");
    assert_eq!(segments[1].kind, MessageKind::Normal);
    assert_eq!(segments[1].text, "final answer");
}

#[test]
fn test_finalize_whitespace_only_pair_yields_empty_sequence() {
    assert!(finalize("<think>   </think>").is_empty());
}

#[test]
fn test_finalize_unmatched_trailing_opener_becomes_normal_tail() {
    let segments = finalize("answer so far<think>unfinished");
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].kind, MessageKind::Normal);
    assert_eq!(segments[0].text, "answer so farunfinished");
}

#[test]
fn test_classify_marker_free_input_is_unchanged() {
    let classification = classify("no markers at all", false);
    assert!(!classification.in_reasoning_span);
    assert_eq!(classification.display_text, "no markers at all");
}

#[test]
fn test_classify_is_idempotent() {
    let raw = "lead-in<think>half-open reasoning";
    assert_eq!(classify(raw, false), classify(raw, false));
    assert_eq!(classify(raw, true), classify(raw, true));
}

#[test]
fn test_classify_strips_markers_from_display_text() {
    let classification = classify("a<think>b</think>c", false);
    assert_eq!(classification.display_text, "abc");
    assert!(!classification.in_reasoning_span);
}

//! Inline `**bold**` emphasis parsing.

/// A run of text that is either emphasized or plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub emphasized: bool,
}

const MARKER: &str = "**";

/// Split text on `**` markers into alternating plain/emphasized spans.
///
/// An unmatched trailing marker is kept as literal text.
pub fn inline_spans(text: &str) -> Vec<InlineSpan> {
    let mut parts: Vec<String> = text.split(MARKER).map(str::to_string).collect();

    // Odd number of markers: glue the dangling one back on
    if parts.len() % 2 == 0 {
        if let (Some(last), Some(prev)) = (parts.pop(), parts.pop()) {
            parts.push(format!("{}{}{}", prev, MARKER, last));
        }
    }

    let mut spans: Vec<InlineSpan> = Vec::new();
    for (idx, part) in parts.into_iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let emphasized = idx % 2 == 1;
        match spans.last_mut() {
            Some(prev) if prev.emphasized == emphasized => prev.text.push_str(&part),
            _ => spans.push(InlineSpan {
                text: part,
                emphasized,
            }),
        }
    }
    spans
}

/// Text with balanced emphasis markers removed.
pub fn strip_inline_markers(text: &str) -> String {
    inline_spans(text).into_iter().map(|s| s.text).collect()
}

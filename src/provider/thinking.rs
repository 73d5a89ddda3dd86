// src/provider/thinking.rs - Reasoning segment extraction
//
// Reasoning models wrap their chain of thought in <think>...</think>.
// Matching is lazy: each open tag pairs with the nearest close tag after it,
// and an open tag with no close tag after it is left alone.

pub const OPEN_TAG: &str = "<think>";
pub const CLOSE_TAG: &str = "</think>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReply {
    pub content: String,
    pub thinking: Option<String>,
}

/// Locate the first complete `<think>...</think>` pair at or after `from`.
/// Returns (open start, inner start, inner end, close end) as byte offsets.
fn find_pair(s: &str, from: usize) -> Option<(usize, usize, usize, usize)> {
    let open = from + s[from..].find(OPEN_TAG)?;
    let inner_start = open + OPEN_TAG.len();
    let inner_end = inner_start + s[inner_start..].find(CLOSE_TAG)?;
    Some((open, inner_start, inner_end, inner_end + CLOSE_TAG.len()))
}

/// Split a raw reply into answer text and optional reasoning.
///
/// With at least one complete pair, `thinking` is the body of the first pair,
/// every complete pair is cut out, and the remainder is trimmed. Otherwise the
/// reply is returned verbatim.
pub fn split_thinking(raw: &str) -> SplitReply {
    let Some((_, inner_start, inner_end, _)) = find_pair(raw, 0) else {
        return SplitReply {
            content: raw.to_string(),
            thinking: None,
        };
    };

    let thinking = raw[inner_start..inner_end].to_string();

    let mut content = String::with_capacity(raw.len());
    let mut cursor = 0;
    while let Some((open, _, _, close_end)) = find_pair(raw, cursor) {
        content.push_str(&raw[cursor..open]);
        cursor = close_end;
    }
    content.push_str(&raw[cursor..]);

    SplitReply {
        content: content.trim().to_string(),
        thinking: Some(thinking),
    }
}

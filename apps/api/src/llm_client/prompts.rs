// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt that enforces JSON-only output for structured replies.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Fills `{placeholder}` slots in a template in a single pass, so braces inside
/// substituted values (candidate answers, code snippets) are never re-expanded.
/// Unknown slots are left untouched.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let slot = tail.find('}').map(|close| (&tail[1..close], close));
        match slot.and_then(|(key, close)| {
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        }) {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Keeps at most `max_chars` characters, cutting on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("Größe", 3), "Grö");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 4), "");
    }

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let filled = fill("{a} and {a} but {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and x but y");
    }

    #[test]
    fn test_fill_leaves_unknown_slots() {
        assert_eq!(fill("{missing}", &[("a", "x")]), "{missing}");
    }

    #[test]
    fn test_fill_does_not_expand_braces_inside_values() {
        let filled = fill("Q: {question} A: {answer}", &[
            ("question", "What is {answer}?"),
            ("answer", "fn main() {}"),
        ]);
        assert_eq!(filled, "Q: What is {answer}? A: fn main() {}");
    }

    #[test]
    fn test_fill_keeps_literal_json_braces() {
        let filled = fill("{\n  \"score\": <int>\n} for {q}", &[("q", "x")]);
        assert_eq!(filled, "{\n  \"score\": <int>\n} for x");
    }
}

// src/text.rs
//! Text normalization for embedding inputs.
//!
//! Both functions are total: they never fail and map empty input to empty
//! output.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_tags() -> &'static Regex {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    RE_TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex"))
}

fn re_ws() -> &'static Regex {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn re_sentence_end() -> &'static Regex {
    static RE_END: OnceCell<Regex> = OnceCell::new();
    RE_END.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence regex"))
}

/// Strip markup-like tags, collapse whitespace runs to single spaces, trim.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    // Tags become a space so "a<br>b" does not glue words together.
    let out = re_tags().replace_all(text, " ");
    let out = re_ws().replace_all(&out, " ");
    out.trim().to_string()
}

/// Lead excerpt: first two sentence fragments of the normalized text,
/// hard-truncated to `max_chars` characters.
pub fn lead(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let t = normalize(text);

    let mut fragments: Vec<&str> = Vec::with_capacity(2);
    let mut start = 0usize;
    for m in re_sentence_end().find_iter(&t) {
        // Punctuation is ASCII, so the fragment ends one byte into the match.
        fragments.push(&t[start..m.start() + 1]);
        start = m.end();
        if fragments.len() == 2 {
            break;
        }
    }
    if fragments.len() < 2 && start < t.len() {
        fragments.push(&t[start..]);
    }

    let joined = fragments.join(" ");
    truncate_chars(joined, max_chars)
}

fn truncate_chars(s: String, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        s.chars().take(max_chars).collect()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_ok() {
        assert_eq!(normalize(""), "");
        assert_eq!(lead("", 300), "");
    }

    #[test]
    fn strips_tags_and_folds_whitespace() {
        let s = "<p>Hello\n\t<b>world</b></p>  ";
        assert_eq!(normalize(s), "Hello world");
        assert_eq!(normalize("a<br>b"), "a b");
    }

    #[test]
    fn lead_keeps_first_two_sentences() {
        let s = "First one. Second one! Third one? Fourth.";
        assert_eq!(lead(s, 300), "First one. Second one!");
    }

    #[test]
    fn lead_without_terminator_keeps_whole_text() {
        assert_eq!(lead("no punctuation here", 300), "no punctuation here");
        assert_eq!(lead("Only one sentence.", 300), "Only one sentence.");
    }

    #[test]
    fn lead_handles_ellipsis_like_a_single_break() {
        assert_eq!(lead("Wait... Really? Yes.", 300), "Wait... Really?");
    }

    #[test]
    fn lead_truncates_by_chars_not_bytes() {
        let s = "Привет мир. Второе предложение.";
        let out = lead(s, 6);
        assert_eq!(out, "Привет");
        assert_eq!(out.chars().count(), 6);
    }

    #[test]
    fn lead_normalizes_markup_first() {
        let s = "<div>Markets  rallied.</div>\n<p>Bonds fell.</p> Gold flat.";
        assert_eq!(lead(s, 300), "Markets rallied. Bonds fell.");
    }
}

//! Thread titles derived from the first question

use regex::Regex;
use std::sync::OnceLock;

/// Words kept from the question
const MAX_WORDS: usize = 6;

/// Characters kept before the ellipsis
const MAX_CHARS: usize = 32;

/// Title used when the question has no usable text
pub const DEFAULT_TITLE: &str = "New chat";

fn markdown_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[`*_#>\-]+").expect("Invalid regex pattern"))
}

/// Build a short sidebar title from a message
///
/// Line breaks and markdown punctuation become spaces, whitespace is
/// collapsed, the first six words are kept, and anything over 32
/// characters is cut and suffixed with `…`. The first letter is
/// uppercased.
///
/// # Examples
///
/// ```
/// use kabaddiguru::chat::generate_title;
///
/// assert_eq!(generate_title("who scored the most raid points in 2019?"),
///            "Who scored the most raid points");
/// assert_eq!(generate_title("   "), "New chat");
/// ```
pub fn generate_title(text: &str) -> String {
    let cleaned = text.replace(['\r', '\n'], " ");
    let cleaned = markdown_marks().replace_all(&cleaned, " ");

    let words: Vec<&str> = cleaned.split_whitespace().take(MAX_WORDS).collect();
    let joined = words.join(" ");

    let capped = if joined.chars().count() > MAX_CHARS {
        let cut: String = joined.chars().take(MAX_CHARS).collect();
        format!("{}…", cut.trim_end())
    } else {
        joined
    };

    let mut chars = capped.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => DEFAULT_TITLE.to_string(),
    }
}

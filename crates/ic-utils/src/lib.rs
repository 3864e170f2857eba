//! Shared text helpers for InspiCode.

/// Maximum number of characters shown in a card description.
pub const EXCERPT_LEN: usize = 100;

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate to `max` characters, appending an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

/// Human label for a result count, such as "1 project found".
pub fn results_count_label(count: usize) -> String {
    if count > 1 {
        format!("{count} projects found")
    } else {
        format!("{count} project found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_handles_empty_and_ascii() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("medium"), "Medium");
    }

    #[test]
    fn excerpt_keeps_short_text() {
        assert_eq!(excerpt("short", EXCERPT_LEN), "short");
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let text = "é".repeat(EXCERPT_LEN + 1);
        let cut = excerpt(&text, EXCERPT_LEN);
        assert_eq!(cut.chars().count(), EXCERPT_LEN + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn excerpt_snapshot() {
        insta::assert_snapshot!(excerpt("Build a chat server with rooms", 12), @"Build a chat…");
    }

    #[test]
    fn results_label_pluralizes() {
        insta::assert_snapshot!(results_count_label(0), @"0 project found");
        insta::assert_snapshot!(results_count_label(30), @"30 projects found");
    }
}

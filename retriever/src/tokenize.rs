//! Query tokenization shared by the keyword and symbol sources
//! (`spec.md` §4.7): strip FTS5 query-syntax characters, drop short tokens,
//! join survivors with `OR` so the expression matches any of them.

const STRIP_CHARS: &str = "'\"(){}[]^~*?:\\!";

/// Returns `None` when no token survives (the caller returns an empty
/// result set rather than querying with an empty expression).
pub fn tokenize_query(query: &str) -> Option<String> {
    let scrubbed: String = query
        .chars()
        .map(|c| if STRIP_CHARS.contains(c) { ' ' } else { c })
        .collect();
    let tokens: Vec<&str> = scrubbed.split_whitespace().filter(|t| t.chars().count() >= 2).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

/// Strip a vector-search language filter down to `[A-Za-z0-9_-]` so it can
/// safely be embedded in a payload match predicate.
pub fn sanitize_language(language: &str) -> String {
    language.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_syntax_characters_and_short_tokens() {
        assert_eq!(tokenize_query("foo(\"bar\") a"), Some("foo OR bar".to_string()));
    }

    #[test]
    fn empty_after_scrub_yields_none() {
        assert_eq!(tokenize_query("(()) a"), None);
    }

    #[test]
    fn sanitize_language_drops_quotes_and_punctuation() {
        assert_eq!(sanitize_language("type'script\""), "typescript");
    }
}

//! Prompt bounding against the serialized request budget.

/// Bytes `c` occupies inside a JSON string literal.
pub fn escaped_len(c: char) -> usize {
    match c {
        '"' | '\\' | '\n' | '\r' | '\t' | '\u{08}' | '\u{0c}' => 2,
        c if (c as u32) < 0x20 => 6,
        c => c.len_utf8(),
    }
}

/// Longest prefix of `s` whose JSON-escaped size fits `budget`.
/// Always ends on a char boundary.
pub fn truncate_to_escaped(s: &str, budget: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        used += escaped_len(c);
        if used > budget {
            return &s[..idx];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_len_matches_serde_json() {
        for c in ['a', '"', '\\', '\n', '\u{01}', 'é', '你', '🦀'] {
            let encoded = serde_json::to_string(&c.to_string()).unwrap();
            assert_eq!(escaped_len(c), encoded.len() - 2, "char {c:?}");
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_to_escaped("你好世界", 7), "你好");
        assert_eq!(truncate_to_escaped("ab\"cd", 4), "ab\"");
        assert_eq!(truncate_to_escaped("short", 100), "short");
        assert_eq!(truncate_to_escaped("abc", 0), "");
    }
}

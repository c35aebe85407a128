/// Text normalization shared by both detectors.
///
/// Lowercases, collapses common leetspeak substitutions, strips masking
/// characters and punctuation, and collapses whitespace. Both the keyword
/// matcher and the transformer classifier run on the same normalized form
/// so their verdicts refer to identical input.

/// Map a single character to its unobfuscated form, or None to drop it.
fn fold_char(c: char) -> Option<char> {
    match c {
        '@' => Some('a'),
        '3' => Some('e'),
        '1' => Some('i'),
        '0' => Some('o'),
        '*' | '#' | '%' => None,
        other => Some(other),
    }
}

pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;

    for c in text.to_lowercase().chars() {
        let Some(folded) = fold_char(c) else { continue };
        if folded.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else if folded.is_alphanumeric() {
            out.push(folded);
            last_was_space = false;
        }
        // Remaining punctuation is dropped
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Strip leading/trailing punctuation from a single transcript token,
/// keeping interior characters intact ("f***ing" keeps its asterisks for
/// the normalizer to fold later).
pub fn strip_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Characters an obfuscated spelling may use in place of `c`.
///
/// Used by the keyword matcher's tolerant pattern for terms longer than
/// four characters.
pub fn obfuscations_of(c: char) -> &'static [char] {
    match c {
        'a' => &['a', '@', '4'],
        'e' => &['e', '3'],
        'i' => &['i', '1', '!'],
        'o' => &['o', '0'],
        's' => &['s', '5', '$'],
        't' => &['t', '7'],
        _ => &[],
    }
}

/// True if `c` can stand in for a letter in an obfuscated spelling.
pub fn is_obfuscation_char(c: char) -> bool {
    matches!(c, '@' | '4' | '3' | '1' | '!' | '0' | '5' | '$' | '7')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Hello World", "hello world")]
    #[case("b@d", "bad")]
    #[case("l33t", "leet")]
    #[case("sh1t", "shit")]
    #[case("g0ne", "gone")]
    #[case("f**k", "fk")]
    #[case("w#o%rd", "word")]
    fn test_normalize_substitutions(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  too   many\tspaces \n"), "too many spaces");
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("wait, what?!"), "wait what");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_preserves_devanagari() {
        assert_eq!(normalize("तू पागल है"), "तू पागल है");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("B@d W0rd!!");
        assert_eq!(normalize(&once), once);
    }

    #[rstest]
    #[case("word.", "word")]
    #[case("\"quoted\"", "quoted")]
    #[case("...", "")]
    #[case("it's", "it's")]
    fn test_strip_token(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_token(input), expected);
    }

    #[test]
    fn test_obfuscations_include_identity() {
        for c in ['a', 'e', 'i', 'o', 's', 't'] {
            assert!(obfuscations_of(c).contains(&c));
        }
    }
}

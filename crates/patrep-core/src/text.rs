//! Text clean-up applied to every extracted line before it is stored or searched.

/// Returns true for characters kept by [`sanitize`]: ASCII letters, digits,
/// punctuation, and whitespace (including vertical tab and form feed).
pub fn is_readable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_ascii_punctuation()
        || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Drop every character that is not readable ASCII.
///
/// No substitution takes place: `"Größe 5"` becomes `"Gre 5"`.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|&c| is_readable(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_keeps_plain_ascii() {
        assert_eq!(sanitize("Status: HOLD 42 pending"), "Status: HOLD 42 pending");
        assert_eq!(sanitize("a\tb\r\nc\x0b\x0c"), "a\tb\r\nc\x0b\x0c");
        let punctuation = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
        assert_eq!(sanitize(punctuation), punctuation);
    }

    #[test]
    fn test_sanitize_drops_non_ascii_and_control() {
        assert_eq!(sanitize("Größe 5"), "Gre 5");
        assert_eq!(sanitize("HOLD\u{00a0}42"), "HOLD42");
        assert_eq!(sanitize("\u{0}NUL\u{7f}DEL\u{1b}"), "NULDEL");
        assert_eq!(sanitize("図面 HOLD 3 ✓"), " HOLD 3 ");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("€•†"), "");
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(s in any::<String>()) {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_sanitize_output_is_readable(s in any::<String>()) {
            prop_assert!(sanitize(&s).chars().all(is_readable));
        }

        #[test]
        fn prop_sanitize_preserves_readable_input(s in "[ -~\t\n\r]*") {
            prop_assert_eq!(sanitize(&s), s);
        }
    }
}

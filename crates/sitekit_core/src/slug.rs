//! URL-safe tokens derived from free text

/// Normalize a label into a routing segment.
///
/// Lowercases, turns whitespace runs into a single `-`, drops anything that
/// is not an ASCII word character or `-`, collapses repeated `-` and trims
/// them from both ends.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_space = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        for lower in ch.to_lowercase() {
            if lower.is_ascii_alphanumeric() || lower == '_' || lower == '-' {
                out.push(lower);
            }
        }
    }
    collapse_hyphens(&out)
}

fn collapse_hyphens(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Cloud Infrastructure"), "cloud-infrastructure");
        assert_eq!(slugify("  Release   Notes  "), "release-notes");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(slugify("Node.js"), "nodejs");
        assert_eq!(slugify("C++ & Rust!"), "c-rust");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn collapses_and_trims_hyphens() {
        assert_eq!(slugify("--a -- b--"), "a-b");
        assert_eq!(slugify("a\t-\nb"), "a-b");
    }

    #[test]
    fn non_ascii_letters_are_dropped() {
        assert_eq!(slugify("Новости 2024"), "2024");
        assert_eq!(slugify("Über"), "ber");
    }

    #[test]
    fn empty_input_gives_empty_slug() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn normalizing_is_idempotent() {
        for input in [
            "Hello World",
            "Node.js",
            " -x- ",
            "a__b",
            "Новости и События",
            "2024: Year in Review",
        ] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input {input:?}");
            assert!(!once.starts_with('-'));
            assert!(!once.ends_with('-'));
            assert!(!once.contains("--"));
            assert!(
                once.chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
            );
        }
    }
}

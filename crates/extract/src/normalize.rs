//! Whitespace normalization shared by extraction and querying.

/// Collapses every run of whitespace (spaces, newlines, tabs, and any other
/// Unicode whitespace) into a single ASCII space and trims both ends.
///
/// # Examples
///
/// ```rust
/// use folio_extract::normalize;
/// assert_eq!(normalize("  The\n\tfox   jumps. "), "The fox jumps.");
/// assert_eq!(normalize(" \n "), "");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("   ", "")]
    #[case("fox", "fox")]
    #[case("  fox  ", "fox")]
    #[case("the\r\nquick\t\tbrown", "the quick brown")]
    #[case("non\u{a0}breaking", "non breaking")]
    #[case("a \u{2003} b", "a b")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("  Chapter   One \n\n It was a dark night. ");
        assert_eq!(normalize(&once), once);
    }
}

/// Normalizes a search term before it is sent to a fetch boundary.
///
/// A `<` followed by a letter or `/` opens a tag that is dropped through the
/// next `>`. Any other angle bracket is removed on its own, and whitespace
/// runs collapse to a single space with both ends trimmed.
pub fn preprocess_search(term: &str) -> String {
    let mut stripped = String::with_capacity(term.len());
    let mut rest = term;
    while let Some(open) = rest.find('<') {
        stripped.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let opens_tag = after.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/');
        rest = match after.find('>') {
            Some(close) if opens_tag => &after[close + 1..],
            _ => after,
        };
    }
    stripped.push_str(rest);

    stripped
        .replace('>', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        assert_eq!(preprocess_search("  John  Doe<script>"), "John Doe");
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(preprocess_search("   \t  "), "");
        assert_eq!(preprocess_search(""), "");
    }

    #[test]
    fn stray_brackets_are_removed() {
        assert_eq!(preprocess_search("a > b"), "a b");
        assert_eq!(preprocess_search("x<y"), "xy");
    }

    #[test]
    fn comparisons_keep_their_operands() {
        assert_eq!(preprocess_search("1 < 2 and 3 > 2"), "1 2 and 3 2");
        assert_eq!(preprocess_search("<b>Ann</b> <= 3"), "Ann = 3");
    }

    #[test]
    fn internal_tabs_and_newlines_collapse() {
        assert_eq!(preprocess_search("Jane\t\nSmith"), "Jane Smith");
    }
}

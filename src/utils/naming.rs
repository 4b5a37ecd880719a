use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]+").unwrap());

/// True when `name` can be used as a test function identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

/// Make `raw` safe to use as a single path component.
/// Runs of unsupported characters (including `::` and `/`) collapse into `_`.
pub fn file_component(raw: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(raw, "_");
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("Initial"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("error_state2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("Initial state"));
        assert!(!is_valid_identifier("bad-name"));
    }

    #[test]
    fn file_components() {
        assert_eq!(file_component("Step1"), "Step1");
        assert_eq!(file_component("tests::gallery::Initial"), "tests_gallery_Initial");
        assert_eq!(file_component("a/b"), "a_b");
        assert_eq!(file_component(".."), "_");
    }
}

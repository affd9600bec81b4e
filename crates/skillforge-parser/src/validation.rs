//! Identifier normalization shared by the name-character-set check.

/// Lowercase and replace runs of whitespace/underscore with a single
/// hyphen, matching the external skill spec's lowercase-hyphen naming
/// convention.
pub(crate) fn normalize_identifier(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '_' {
            if !last_was_sep {
                normalized.push('-');
                last_was_sep = true;
            }
        } else {
            normalized.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        }
    }
    normalized
}

pub(crate) fn is_valid_identifier(normalized: &str) -> bool {
    !normalized.is_empty()
        && normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spaces_and_case() {
        assert_eq!(normalize_identifier("Git Commit"), "git-commit");
    }

    #[test]
    fn accepts_already_valid_identifiers() {
        assert!(is_valid_identifier("git-commit"));
        assert!(is_valid_identifier("tdd-101"));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(!is_valid_identifier("git_commit!"));
        assert!(!is_valid_identifier("Git Commit"));
    }
}

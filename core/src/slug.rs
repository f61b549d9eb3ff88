//! Slug normalization.

use crate::schema::SLUG_PATTERN;

/// Turn free text into a slug: lowercase ASCII letters and digits, with every
/// run of other characters collapsed into one hyphen and no hyphen at either
/// end. `to_slug(to_slug(s)) == to_slug(s)` for any input.
pub fn to_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Non-empty and made only of lowercase ASCII letters, digits and hyphens.
/// Same check the schema's slug rule applies.
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_hyphenates_spaces() {
        assert_eq!(to_slug("Hello World"), "hello-world");
    }

    #[test]
    fn collapses_runs_of_separators() {
        assert_eq!(to_slug("Rust  --  Async__IO!!"), "rust-async-io");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(to_slug("  --Rust--  "), "rust");
    }

    #[test]
    fn non_ascii_letters_act_as_separators() {
        assert_eq!(to_slug("café au lait"), "caf-au-lait");
        assert_eq!(to_slug("标签 tag"), "tag");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(to_slug("Top 10 Crates 2024"), "top-10-crates-2024");
    }

    #[test]
    fn output_of_to_slug_is_valid_when_non_empty() {
        let slug = to_slug("Some Title: part 2");
        assert!(is_valid_slug(&slug));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Has Caps"));
    }

    #[test]
    fn is_valid_slug_agrees_with_schema_rule() {
        let schema = crate::types::CreateTag::schema();
        for candidate in ["rust", "rust-2024", "", "Not A Slug", "snake_case", "ünï"] {
            let values = serde_json::json!({"name": "n", "slug": candidate});
            let accepted = schema.validate(values.as_object().unwrap()).is_ok();
            assert_eq!(is_valid_slug(candidate), accepted, "{candidate:?}");
        }
    }

    proptest! {
        #[test]
        fn to_slug_is_idempotent(raw in "\\PC*") {
            let once = to_slug(&raw);
            prop_assert_eq!(to_slug(&once), once.clone());
        }

        #[test]
        fn to_slug_output_only_uses_slug_characters(raw in "\\PC*") {
            let slug = to_slug(&raw);
            prop_assert!(slug.is_empty() || is_valid_slug(&slug));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}

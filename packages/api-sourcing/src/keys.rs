//! Field-name sanitization and naming helpers.
//!
//! Upstream JSON keys are untrusted and frequently break the identifier
//! grammar the downstream query layer requires. [`normalize_key`] is a
//! best-effort, always-succeeds transform: it never fails, and applying it
//! twice yields the same result as applying it once.

use regex::Regex;

/// Fixed pipeline identifier, used for cache keys and instance labels.
pub const PIPELINE_NAME: &str = "api-sourcing";

/// Prefix applied to keys that cannot be repaired in place.
pub const ALT_PREFIX: &str = "alt_";

/// Structural field names owned by the host record model.
///
/// Upstream keys colliding with these are renamed; request names using
/// them are rejected at validation time.
pub const RESERVED_KEYS: [&str; 5] = ["id", "children", "parent", "fields", "internal"];

/// Identifier grammar: a letter followed by one or more letters or digits.
pub const KEY_NAME_PATTERN: &str = "^[a-zA-Z][a-zA-Z0-9]+$";

fn key_name_regex() -> Regex {
    Regex::new(KEY_NAME_PATTERN).unwrap()
}

/// Check whether a key satisfies the identifier grammar.
pub fn is_valid_key(key: &str) -> bool {
    key_name_regex().is_match(key)
}

/// Check whether a key collides with the reserved structural fields.
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Sanitize a field name to satisfy the identifier grammar.
///
/// - Keys failing the grammar have `-`, `__`, `:`, `$`, `.` and whitespace
///   replaced with `_`.
/// - A leading non-letter gets the `alt_` prefix.
/// - Collisions with [`RESERVED_KEYS`] get the `alt_` prefix.
///
/// Total and deterministic: every input maps to some output, and
/// `normalize_key(normalize_key(k)) == normalize_key(k)`.
pub fn normalize_key(key: &str) -> String {
    let mut altered = key.to_string();

    if !is_valid_key(&altered) {
        altered = replace_invalid_chars(&altered);
    }

    let first_is_letter = altered
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false);
    if !first_is_letter {
        altered = format!("{ALT_PREFIX}{altered}");
    }

    if is_reserved_key(&altered) {
        altered = format!("{ALT_PREFIX}{altered}");
    }

    // Prefixing a key that already starts with `_` would reintroduce a
    // double underscore; collapsing runs last keeps the transform idempotent.
    collapse_underscores(&altered)
}

fn replace_invalid_chars(key: &str) -> String {
    let pattern = Regex::new(r"-|__|:|\$|\.|\s").unwrap();
    pattern.replace_all(key, "_").into_owned()
}

fn collapse_underscores(key: &str) -> String {
    let pattern = Regex::new(r"_{2,}").unwrap();
    pattern.replace_all(key, "_").into_owned()
}

/// Compose a record type tag from an optional prefix and a request name.
///
/// Both parts are title-cased and concatenated: `("external", "repo")`
/// becomes `ExternalRepo`.
pub fn type_name(prefix: Option<&str>, name: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(2);
    if let Some(prefix) = prefix {
        parts.push(prefix);
    }
    parts.push(name);

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(pascal_case)
        .collect()
}

/// Split a string into word runs at non-alphanumeric and camel-case
/// boundaries, so `pullRequests` and `pull-requests` yield the same
/// words. An acronym run keeps its last capital with the following word
/// (`APIKey` splits as `API`, `Key`).
fn words(input: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for run in input.split(|c: char| !c.is_ascii_alphanumeric()) {
        if run.is_empty() {
            continue;
        }
        let bytes = run.as_bytes();
        let mut start = 0;
        for i in 1..bytes.len() {
            let prev = bytes[i - 1] as char;
            let cur = bytes[i] as char;
            let boundary = (prev.is_ascii_lowercase() || prev.is_ascii_digit())
                && cur.is_ascii_uppercase()
                || prev.is_ascii_uppercase()
                    && cur.is_ascii_uppercase()
                    && bytes.get(i + 1).is_some_and(|&n| n.is_ascii_lowercase());
            if boundary {
                out.push(&run[start..i]);
                start = i;
            }
        }
        out.push(&run[start..]);
    }
    out
}

/// Lower camel case: `"external-repo-1a2b"` becomes `"externalRepo1a2b"`.
pub fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in words(input).into_iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Upper camel case: `"pull-requests"` becomes `"PullRequests"`.
pub fn pascal_case(input: &str) -> String {
    words(input).into_iter().map(capitalize).collect()
}

/// Lowercase hyphenated: `"api-sourcing GitHub"` becomes
/// `"api-sourcing-github"`.
pub fn kebab_case(input: &str) -> String {
    words(input)
        .into_iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_keys_pass_through() {
        assert_eq!(normalize_key("fullName"), "fullName");
        assert_eq!(normalize_key("a1"), "a1");
        assert_eq!(normalize_key("htmlUrl2"), "htmlUrl2");
    }

    #[test]
    fn invalid_chars_are_replaced() {
        assert_eq!(normalize_key("full-name"), "full_name");
        assert_eq!(normalize_key("user name"), "user_name");
        assert_eq!(normalize_key("a:b"), "a_b");
        assert_eq!(normalize_key("a.b"), "a_b");
        assert_eq!(normalize_key("a$b"), "a_b");
        assert_eq!(normalize_key("a__b"), "a_b");
    }

    #[test]
    fn leading_non_letter_is_prefixed() {
        assert_eq!(normalize_key("1abc"), "alt_1abc");
        assert_eq!(normalize_key("_private"), "alt_private");
        assert_eq!(normalize_key(""), "alt_");
        assert_eq!(normalize_key("-"), "alt_");
    }

    #[test]
    fn reserved_keys_are_prefixed() {
        assert_eq!(normalize_key("id"), "alt_id");
        assert_eq!(normalize_key("children"), "alt_children");
        assert_eq!(normalize_key("parent"), "alt_parent");
        assert_eq!(normalize_key("fields"), "alt_fields");
        assert_eq!(normalize_key("internal"), "alt_internal");
    }

    #[test]
    fn single_letter_key_survives() {
        // The grammar needs two characters, but a bare letter is still a
        // usable identifier and must not be mangled.
        assert_eq!(normalize_key("a"), "a");
    }

    #[test]
    fn type_name_composition() {
        assert_eq!(type_name(Some("external"), "repo"), "ExternalRepo");
        assert_eq!(type_name(None, "repo"), "Repo");
        assert_eq!(type_name(Some(""), "repo"), "Repo");
        assert_eq!(
            type_name(Some("external"), "pull-requests"),
            "ExternalPullRequests"
        );
    }

    #[test]
    fn case_helpers() {
        assert_eq!(camel_case("external-repo-1a2b"), "externalRepo1a2b");
        assert_eq!(pascal_case("pull-requests"), "PullRequests");
        assert_eq!(kebab_case("api-sourcing GitHub"), "api-sourcing-git-hub");
        assert_eq!(kebab_case("My API"), "my-api");
    }

    #[test]
    fn camel_case_names_keep_their_word_boundaries() {
        assert_eq!(type_name(Some("external"), "pullRequests"), "ExternalPullRequests");
        assert_eq!(pascal_case("pullRequests"), "PullRequests");
        assert_eq!(pascal_case("APIKey"), "ApiKey");
        assert_eq!(camel_case("issueComments2024"), "issueComments2024");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(key in "\\PC*") {
            let once = normalize_key(&key);
            let twice = normalize_key(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalize_never_returns_reserved(key in "\\PC*") {
            let normalized = normalize_key(&key);
            prop_assert!(!is_reserved_key(&normalized));
        }

        #[test]
        fn normalize_starts_with_letter(key in "\\PC*") {
            let normalized = normalize_key(&key);
            let first = normalized.chars().next().unwrap();
            prop_assert!(first.is_ascii_alphabetic());
        }
    }
}

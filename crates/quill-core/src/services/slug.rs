//! URL slugs derived from post titles.

use std::sync::LazyLock;

use regex::Regex;

/// Longest slug [`generate`] produces.
pub const MAX_SLUG_LEN: usize = 100;

/// Base used when a title has no slug-able characters at all.
pub const FALLBACK_SLUG: &str = "post";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Lower-case the title, collapse every run of characters outside `[a-z0-9]`
/// into one hyphen, trim hyphens from both ends and cap at [`MAX_SLUG_LEN`].
///
/// Returns an empty string for titles such as `""` or `"!!!"`.
pub fn generate(title: &str) -> String {
    let lowered = title.to_lowercase();
    let hyphenated = NON_ALPHANUMERIC.replace_all(&lowered, "-");
    let trimmed = hyphenated.trim_matches('-');

    // Only ASCII remains, so byte slicing is on a char boundary.
    let capped = if trimmed.len() > MAX_SLUG_LEN {
        &trimmed[..MAX_SLUG_LEN]
    } else {
        trimmed
    };

    capped.trim_end_matches('-').to_string()
}

/// [`generate`], substituting [`FALLBACK_SLUG`] for an empty result.
pub fn base_slug(title: &str) -> String {
    let slug = generate(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Disambiguated form of a taken slug.
pub fn with_suffix(slug: &str, unix_seconds: i64) -> String {
    format!("{slug}-{unix_seconds}")
}

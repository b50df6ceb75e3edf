//! Title → file-name sanitizing.
//!
//! Stage 1 (pages) and stage 2 (groups) use distinct rules; both are
//! deterministic, ASCII-only and length-bounded. Collisions introduced by
//! truncation are not detected.

use std::borrow::Cow;
use std::sync::LazyLock;

use deunicode::deunicode;
use regex::Regex;

/// Maximum length of a page file stem (before sequence prefix and extension).
pub const PAGE_STEM_MAX: usize = 60;

/// Maximum length of a group file stem (before sequence prefix and extension).
pub const GROUP_STEM_MAX: usize = 50;

/// Extension of every persisted text blob.
pub const BLOB_EXTENSION: &str = "md";

/// Characters dropped from titles: anything but Unicode word chars,
/// whitespace and hyphen.
static TITLE_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("title strip regex"));

/// Drop punctuation and symbols from a title while it is still Unicode.
///
/// Runs before transliteration so that characters such as `–` or `©` vanish
/// instead of becoming ASCII look-alikes (`-`, `c`).
pub fn strip_title_punctuation(text: &str) -> Cow<'_, str> {
    TITLE_STRIP_RE.replace_all(text, "")
}

/// Sanitize a page title into a file stem.
///
/// Drops punctuation (hyphens survive), trims, turns every whitespace
/// character into `_`, transliterates to ASCII and truncates to
/// [`PAGE_STEM_MAX`] characters.
pub fn page_stem(title: &str) -> String {
    let stripped = strip_title_punctuation(title);
    let underscored: String = stripped
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    deunicode(&underscored)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(PAGE_STEM_MAX)
        .collect()
}

/// File name of the `seq`-th page blob (1-based, discovery order).
pub fn page_file_name(seq: usize, title: &str) -> String {
    format!("{seq:03}_{}.{BLOB_EXTENSION}", page_stem(title))
}

/// Sanitize a group name into a file stem.
///
/// Lower-cases, turns whitespace into `_` and keeps only alphanumerics and
/// `_`, then transliterates to ASCII and truncates to [`GROUP_STEM_MAX`]
/// characters.
pub fn group_stem(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    deunicode(&kept)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(GROUP_STEM_MAX)
        .collect()
}

/// File name of the `seq`-th group blob (1-based, output order).
pub fn group_file_name(seq: usize, name: &str) -> String {
    format!("{seq:02}_{}.{BLOB_EXTENSION}", group_stem(name))
}

/// Upper-cased ASCII transliteration, used for blacklist checks.
pub fn fold_upper(text: &str) -> String {
    deunicode(text).to_uppercase()
}

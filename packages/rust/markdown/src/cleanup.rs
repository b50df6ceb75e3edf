//! Cleanup passes applied to `htmd` output.
//!
//! Each pass is a function `&str -> String` applied in sequence. The archive
//! pages are hand-written HTML with `<font>`/`<center>` markup and
//! non-breaking spaces, which is what most of these passes are about.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run the full cleanup pipeline on raw Markdown text. The result is trimmed.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = md.to_string();

    result = replace_non_breaking_spaces(&result);
    result = normalize_headings(&result);
    result = strip_leftover_html(&result);
    result = resolve_links(&result, base_url);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Non-breaking spaces
// ---------------------------------------------------------------------------

/// French typography puts `&nbsp;` before `:;?!` and inside guillemets.
fn replace_non_breaking_spaces(md: &str) -> String {
    md.replace(['\u{a0}', '\u{202f}'], " ")
}

// ---------------------------------------------------------------------------
// Pass 2: Normalize heading levels
// ---------------------------------------------------------------------------

/// Keep at most one H1; later H1s are demoted to H2.
fn normalize_headings(md: &str) -> String {
    static H_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex"));

    let mut h1_count = 0;
    let mut lines: Vec<String> = Vec::new();

    for line in md.lines() {
        if let Some(caps) = H_RE.captures(line) {
            if &caps[1] == "#" {
                h1_count += 1;
                if h1_count > 1 {
                    lines.push(format!("## {}", &caps[2]));
                    continue;
                }
            }
        }
        lines.push(line.to_string());
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove presentational tags that survived the conversion, keeping their text.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)</?(?:font|center|div|span|u|blockquote|table|tbody|tr|td|th)(?:\s[^>]*)?>")
            .expect("html tag regex")
    });

    HTML_TAG_RE.replace_all(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: Resolve relative links
// ---------------------------------------------------------------------------

/// Resolve relative URLs in Markdown links against the archive base URL.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    let Some(base) = base_url else {
        return md.to_string();
    };

    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)\)").expect("link regex"));

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let bang = &caps[1];
            let text = &caps[2];
            let href = &caps[3];

            if href.starts_with("http://")
                || href.starts_with("https://")
                || href.starts_with('#')
                || href.starts_with("mailto:")
            {
                return caps[0].to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("{bang}[{text}]({resolved})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Trailing whitespace
// ---------------------------------------------------------------------------

fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 6: Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single paragraph break.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

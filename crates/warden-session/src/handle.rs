//! External-handle extraction from submitted post links
//!
//! Recognizes the known post-URL shapes (`x.com`/`twitter.com`, status
//! links and bare profile links, with or without scheme and `www.`) and
//! pulls out the account name. Reserved path segments that are not account
//! names (`/i/...`, `/status/...`, legal pages) are rejected, as is
//! anything outside the platform's `[A-Za-z0-9_]{1,25}` username shape.

use once_cell::sync::Lazy;
use regex::Regex;
use warden_core::Handle;

#[allow(clippy::expect_used)]
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern")
}

/// Post-URL shapes, most specific first. The first pattern whose capture
/// survives [`clean_candidate`] wins.
static POST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        pattern(r"(?i)(?:x|twitter)\.com/([^/\s?#]+)/status/\d+"),
        pattern(r"(?i)(?:x|twitter)\.com/([^/\s?#]+)"),
    ]
});

static VALID_USERNAME: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^[a-z0-9_]{1,25}$"));

/// Path segments that appear where a username would but never are one.
const RESERVED_SEGMENTS: &[&str] = &[
    "i", "intent", "imprint", "privacy", "status", "home", "tos", "search", "hashtag",
];

/// Whether the text contains something shaped like a post link at all.
///
/// Used by callers to separate ordinary chatter (ignored) from link
/// submissions (validated); a `true` here does not promise extraction will
/// succeed.
pub fn is_post_link(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("x.com/") || lower.contains("twitter.com/")
}

/// Extract the normalized external handle from submitted link text.
///
/// Returns `None` when no known URL shape matches or the captured segment
/// is not a plausible account name.
pub fn extract_handle(text: &str) -> Option<Handle> {
    for re in POST_PATTERNS.iter() {
        if let Some(caps) = re.captures(text) {
            if let Some(handle) = caps.get(1).and_then(|m| clean_candidate(m.as_str())) {
                return Some(handle);
            }
        }
    }
    None
}

fn clean_candidate(raw: &str) -> Option<Handle> {
    let name = raw.trim().trim_start_matches('@').to_ascii_lowercase();

    if RESERVED_SEGMENTS.contains(&name.as_str()) {
        return None;
    }
    // Legal/landing pages sometimes match the profile shape
    if name.contains("imprint") || name.contains("privacy") || name.contains(".html") {
        return None;
    }
    if !VALID_USERNAME.is_match(&name) {
        return None;
    }

    Some(Handle::new(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_links() {
        assert_eq!(
            extract_handle("https://x.com/alice/status/123456"),
            Some(Handle::new("alice"))
        );
        assert_eq!(
            extract_handle("https://twitter.com/Bob_42/status/987"),
            Some(Handle::new("bob_42"))
        );
    }

    #[test]
    fn test_profile_links() {
        assert_eq!(
            extract_handle("https://x.com/username"),
            Some(Handle::new("username"))
        );
        assert_eq!(
            extract_handle("x.com/username"),
            Some(Handle::new("username"))
        );
        assert_eq!(
            extract_handle("www.x.com/username?param=value"),
            Some(Handle::new("username"))
        );
        assert_eq!(
            extract_handle("twitter.com/username"),
            Some(Handle::new("username"))
        );
    }

    #[test]
    fn test_link_embedded_in_text() {
        assert_eq!(
            extract_handle("some random text with x.com/username somewhere"),
            Some(Handle::new("username"))
        );
    }

    #[test]
    fn test_case_insensitive_normalization() {
        assert_eq!(
            extract_handle("https://X.com/ALICE/status/1"),
            Some(Handle::new("alice"))
        );
    }

    #[test]
    fn test_reserved_segments_rejected() {
        assert_eq!(extract_handle("https://x.com/i/status/123"), None);
        assert_eq!(extract_handle("https://x.com/home"), None);
        assert_eq!(extract_handle("https://twitter.com/privacy.html"), None);
        assert_eq!(extract_handle("https://x.com/intent"), None);
    }

    #[test]
    fn test_malformed_rejected() {
        assert_eq!(extract_handle("not a link x.com/"), None);
        assert_eq!(extract_handle("plain text without any link"), None);
        assert_eq!(
            extract_handle("https://x.com/way_too_long_username_over_limit"),
            None
        );
        assert_eq!(extract_handle("https://x.com/has-hyphen"), None);
    }

    #[test]
    fn test_is_post_link() {
        assert!(is_post_link("see x.com/alice"));
        assert!(is_post_link("see TWITTER.com/alice"));
        assert!(!is_post_link("no link here"));
        // Link-shaped but unextractable still counts as an attempt
        assert!(is_post_link("not a link x.com/"));
    }
}

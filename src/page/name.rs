// src/page/name.rs
// =============================================================================
// Canonical name resolution.
//
// A page reference looks like:
//
//     https://warriors.fandom.com/wiki/Squirrelstar
//
// i.e. exactly one path segment after /wiki/, on the wiki's own origin, with
// no extra separators, query string or fragment. The segment may be
// percent-encoded ("Tall%27star"); the canonical name is the decoded form
// ("Tall'star"). Anything that doesn't match is simply not a page reference
// and is discarded before it ever reaches the visited set.
//
// The colon exclusion matters: it filters out namespace pages like
// /wiki/Category:Characters and /wiki/File:Firestar.png, which would
// otherwise drag the crawl through the whole media library.
//
// Rust concepts:
// - Regex capture groups: pattern.captures() gives us the name segment
// - Cow<str>: percent_decode_str avoids allocating when nothing is encoded
// =============================================================================

use percent_encoding::percent_decode_str;
use regex::Regex;

// Validates identifiers against one wiki origin and decodes the page name.
pub struct NameResolver {
    pattern: Regex,
}

impl NameResolver {
    // `origin` is scheme + host (+ port), e.g. "https://warriors.fandom.com".
    pub fn new(origin: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"^{}/wiki/([^/:?#]+)$",
            regex::escape(origin)
        ))
        .expect("page reference pattern must compile");
        Self { pattern }
    }

    // Returns the decoded canonical name, or None if the identifier isn't a
    // page reference on this wiki.
    pub fn resolve(&self, identifier: &str) -> Option<String> {
        let captures = self.pattern.captures(identifier)?;
        let raw = captures.get(1)?.as_str();

        let decoded = percent_decode_str(raw).decode_utf8().ok()?.into_owned();

        // A decoded name that re-introduces a separator (e.g. "%2F") would
        // escape the cache directory and isn't a real page name anyway.
        if decoded.is_empty() || decoded.contains('/') || decoded == "." || decoded == ".." {
            return None;
        }

        Some(decoded)
    }
}

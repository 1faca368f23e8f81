//! Path normalisation and prefix matching.
//!
//! # Design Decisions
//! - Paths are cleaned lexically (`//`, `.`, `..`) before any comparison, so a
//!   cleaned path can never climb above the root
//! - Prefixes always start and end with `/`
//! - Path matching is case-sensitive

/// Lexically clean a URL path, rooted at `/`.
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Normalise a mapping prefix: rooted, cleaned, with a trailing slash.
pub fn normalize_prefix(prefix: &str) -> String {
    let mut prefix = clean_path(prefix);
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

/// Matches request paths under a normalised prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// True for the prefix without its trailing slash (`/api` for `/api/`).
    pub fn wants_slash(&self, path: &str) -> bool {
        self.prefix.len() > 1 && self.prefix.strip_suffix('/') == Some(path)
    }
}

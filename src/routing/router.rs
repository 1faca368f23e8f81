//! Longest-prefix route lookup.
//!
//! # Responsibilities
//! - Store compiled prefix routes
//! - Look up the route for a request path
//! - Return matched route, a trailing-slash redirect, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - Longest prefix wins, independent of insertion order
//! - Duplicate prefixes are rejected at construction

use crate::routing::matcher::PrefixMatcher;

/// Result of a lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a, T> {
    Found { prefix: &'a str, route: &'a T },
    /// The path names a mounted prefix without its trailing slash.
    Redirect(String),
    NotFound,
}

/// Prefix-keyed routing table.
#[derive(Debug)]
pub struct PrefixRouter<T> {
    routes: Vec<(PrefixMatcher, T)>,
}

impl<T> Default for PrefixRouter<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> PrefixRouter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `route` under `prefix`. Fails with the normalised prefix when it is taken.
    pub fn insert(&mut self, prefix: &str, route: T) -> Result<(), String> {
        let matcher = PrefixMatcher::new(prefix);
        if self.routes.iter().any(|(m, _)| m == &matcher) {
            return Err(matcher.prefix().to_string());
        }
        self.routes.push((matcher, route));
        self.routes
            .sort_by(|(a, _), (b, _)| b.prefix().len().cmp(&a.prefix().len()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn match_path(&self, path: &str) -> RouteMatch<'_, T> {
        if let Some((matcher, _)) = self.routes.iter().find(|(m, _)| m.wants_slash(path)) {
            return RouteMatch::Redirect(matcher.prefix().to_string());
        }

        self.routes
            .iter()
            .find(|(m, _)| m.matches(path))
            .map(|(m, route)| RouteMatch::Found {
                prefix: m.prefix(),
                route,
            })
            .unwrap_or(RouteMatch::NotFound)
    }
}

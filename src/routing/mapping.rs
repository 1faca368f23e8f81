//! Command-line mapping arguments.
//!
//! `prefix=target` maps a URL prefix to a local entry page or, for `http://`
//! and `https://` targets, to an upstream. Any other argument is a directory
//! to change into before serving.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::routing::matcher::normalize_prefix;

/// Where a prefix is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An entry page, read at build time and rewritten per request.
    File(PathBuf),
    /// An upstream base URL.
    Proxy(Url),
}

/// One `prefix=target` pair, prefix normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub prefix: String,
    pub target: Target,
}

impl Mapping {
    pub fn file(prefix: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            target: Target::File(path.into()),
        }
    }
}

/// A parsed positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Map(Mapping),
    Chdir(PathBuf),
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("invalid proxy target {target:?}: {source}")]
    InvalidProxyTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },
}

/// Parse one positional argument.
pub fn parse_argument(arg: &str) -> Result<Argument, MappingError> {
    let Some((prefix, target)) = arg.split_once('=') else {
        return Ok(Argument::Chdir(PathBuf::from(arg)));
    };

    let prefix = normalize_prefix(prefix);
    let target = if target.starts_with("http://") || target.starts_with("https://") {
        let url = Url::parse(target).map_err(|source| MappingError::InvalidProxyTarget {
            target: target.to_string(),
            source,
        })?;
        Target::Proxy(url)
    } else {
        Target::File(PathBuf::from(target))
    };

    Ok(Argument::Map(Mapping { prefix, target }))
}

/// Parse every positional argument, in order.
pub fn parse_arguments<S: AsRef<str>>(args: &[S]) -> Result<Vec<Argument>, MappingError> {
    args.iter().map(|a| parse_argument(a.as_ref())).collect()
}

/// The mapping used when no `prefix=target` argument is given.
pub fn default_mappings() -> Vec<Mapping> {
    vec![Mapping::file("/", "index.html")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_mapping() {
        assert_eq!(
            parse_argument("app=dist/app.html").unwrap(),
            Argument::Map(Mapping {
                prefix: "/app/".into(),
                target: Target::File("dist/app.html".into()),
            })
        );
    }

    #[test]
    fn proxy_mapping() {
        let Argument::Map(mapping) = parse_argument("/api=http://localhost:9000/v1").unwrap() else {
            panic!("expected a mapping");
        };
        assert_eq!(mapping.prefix, "/api/");
        assert_eq!(
            mapping.target,
            Target::Proxy(Url::parse("http://localhost:9000/v1").unwrap())
        );
    }

    #[test]
    fn empty_prefix_is_root() {
        let Argument::Map(mapping) = parse_argument("=index.html").unwrap() else {
            panic!("expected a mapping");
        };
        assert_eq!(mapping.prefix, "/");
    }

    #[test]
    fn bare_argument_changes_directory() {
        assert_eq!(
            parse_argument("../site").unwrap(),
            Argument::Chdir("../site".into())
        );
    }

    #[test]
    fn broken_proxy_target_is_rejected() {
        let err = parse_argument("api=http://[::1").unwrap_err();
        assert!(err.to_string().contains("http://[::1"));
    }

    #[test]
    fn keeps_argument_order() {
        let parsed = parse_arguments(&["www", "/=index.html"]).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0], Argument::Chdir(_)));
        assert_eq!(default_mappings(), vec![Mapping::file("", "index.html")]);
    }
}

//! Entry page template.
//!
//! An entry page is parsed once per build into literal byte ranges with two
//! kinds of holes: one after every `<head ...>` tag for the bootstrap script,
//! and one for every relative `assets/` reference in a tag attribute, which
//! is rebased onto the versioned asset mount. Rendering is then a plain copy.

use std::ops::Range;
use std::sync::LazyLock;

use regex::bytes::Regex;

static HEAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<head[^>]*>").unwrap());

// Group 1 is the `assets/` prefix to replace, group 2 the path after it.
static BASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?:[^/][^ >]*)(?:\s(?:[^>"']+|(?:["']([./]*assets/)([^"']+))|["'])+)>"#)
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(Range<usize>),
    Head,
    Base,
}

#[derive(Debug)]
enum Event {
    Head {
        end: usize,
    },
    Base {
        prefix: Option<Range<usize>>,
        link: Option<Range<usize>>,
    },
}

/// A parsed entry page.
#[derive(Debug, Clone)]
pub struct Template {
    data: Vec<u8>,
    parts: Vec<Part>,
    links: Vec<String>,
}

impl Template {
    pub fn parse(data: Vec<u8>) -> Self {
        let mut events: Vec<(usize, Event)> = Vec::new();
        for caps in BASE.captures_iter(&data) {
            let Some(whole) = caps.get(0) else { continue };
            events.push((
                whole.start(),
                Event::Base {
                    prefix: caps.get(1).map(|m| m.range()),
                    link: caps.get(2).map(|m| m.range()),
                },
            ));
        }
        for m in HEAD.find_iter(&data) {
            events.push((m.start(), Event::Head { end: m.end() }));
        }
        events.sort_by_key(|(start, _)| *start);

        let mut parts = Vec::new();
        let mut links = Vec::new();
        let mut cursor = 0;

        for (_, event) in events {
            match event {
                Event::Head { end } => {
                    if end > cursor {
                        parts.push(Part::Literal(cursor..end));
                        cursor = end;
                    }
                    parts.push(Part::Head);
                }
                Event::Base { prefix, link } => {
                    if let Some(link) = link {
                        let link = String::from_utf8_lossy(&data[link]);
                        if link.ends_with(".css") || link.ends_with(".js") {
                            links.push(link.into_owned());
                        }
                    }
                    let Some(prefix) = prefix else { continue };
                    if prefix.start < cursor {
                        continue;
                    }
                    if prefix.start > cursor {
                        parts.push(Part::Literal(cursor..prefix.start));
                    }
                    parts.push(Part::Base);
                    cursor = prefix.end;
                }
            }
        }
        if cursor < data.len() {
            parts.push(Part::Literal(cursor..data.len()));
        }

        Self { data, parts, links }
    }

    /// Render with `head` after every head tag and `base` for every asset prefix.
    pub fn render(&self, head: &[u8], base: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + head.len() + base.len() * 8);
        for part in &self.parts {
            match part {
                Part::Literal(range) => out.extend_from_slice(&self.data[range.clone()]),
                Part::Head => out.extend_from_slice(head),
                Part::Base => out.extend_from_slice(base),
            }
        }
        out
    }

    /// Referenced `.css`/`.js` assets, in page order.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// `Link` header entries asking the client to prefetch every referenced asset.
    pub fn prefetch_links(&self, base: &str) -> Vec<String> {
        self.links
            .iter()
            .map(|path| format!("<{base}{path}>; rel=\"prefetch\"; crossorigin"))
            .collect()
    }
}

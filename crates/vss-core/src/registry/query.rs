//! Compiled selector and path queries.
//!
//! Selector patterns are CSS selectors with one optional extension, a
//! `:contains("text")` anchor:
//!
//! ```text
//! td:contains("Điện thoại") + td          adjacent sibling of the anchor
//! div:contains("gia đình") div.member     descendants of the anchor
//! table:contains("Quan hệ")               the anchor itself
//! ```
//!
//! Path patterns support a single XPath shape:
//! `//TAG[contains(text(),"X")]/following-sibling::TAG[1]`.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::document::text::element_text;

lazy_static! {
    static ref CONTAINS: Regex = Regex::new(
        r#"^(?P<anchor>.*?):(?:contains|has-text)\(\s*["'](?P<text>.*?)["']\s*\)(?P<rest>.*)$"#
    ).unwrap();

    static ref SIBLING_PATH: Regex = Regex::new(
        r#"^//(?P<tag>[A-Za-z][A-Za-z0-9]*)\[contains\(text\(\),\s*["'](?P<text>[^"']+)["']\)\]/following-sibling::(?P<sibling>[A-Za-z][A-Za-z0-9]*)\[1\]$"#
    ).unwrap();
}

/// What to select relative to an anchored element.
#[derive(Debug)]
enum AnchorStep {
    Itself,
    Adjacent(Selector),
    Descendant(Selector),
}

#[derive(Debug)]
enum Query {
    Css(Selector),
    Anchored {
        anchor: Selector,
        text: String,
        step: AnchorStep,
    },
}

/// A compiled structural selector.
#[derive(Debug)]
pub struct SelectorPattern {
    source: String,
    query: Query,
}

impl SelectorPattern {
    /// Compile a selector pattern, returning the reason on failure.
    pub fn compile(source: &str) -> Result<Self, String> {
        let query = match CONTAINS.captures(source) {
            Some(caps) => {
                let anchor = caps["anchor"].trim();
                let anchor = parse_css(if anchor.is_empty() { "*" } else { anchor })?;
                let rest = caps["rest"].trim();
                let step = if rest.is_empty() {
                    AnchorStep::Itself
                } else if let Some(adjacent) = rest.strip_prefix('+') {
                    AnchorStep::Adjacent(parse_css(adjacent.trim())?)
                } else {
                    AnchorStep::Descendant(parse_css(rest)?)
                };
                Query::Anchored {
                    anchor,
                    text: caps["text"].to_string(),
                    step,
                }
            }
            None => Query::Css(parse_css(source)?),
        };

        Ok(Self {
            source: source.to_string(),
            query,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Matching elements in document order, without duplicates.
    pub fn select<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        match &self.query {
            Query::Css(selector) => html.select(selector).collect(),
            Query::Anchored { anchor, text, step } => {
                let mut seen = HashSet::new();
                let mut found = Vec::new();

                for element in html.select(anchor) {
                    // Anchor text match is case-sensitive.
                    if !element_text(element).contains(text.as_str()) {
                        continue;
                    }
                    let targets: Vec<ElementRef<'a>> = match step {
                        AnchorStep::Itself => vec![element],
                        AnchorStep::Adjacent(selector) => element
                            .next_siblings()
                            .filter_map(ElementRef::wrap)
                            .next()
                            .filter(|sibling| selector.matches(sibling))
                            .into_iter()
                            .collect(),
                        AnchorStep::Descendant(selector) => element.select(selector).collect(),
                    };
                    for target in targets {
                        if seen.insert(target.id()) {
                            found.push(target);
                        }
                    }
                }
                found
            }
        }
    }
}

fn parse_css(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("{:?}", e))
}

/// A path expression; only the sibling shape is executable.
#[derive(Debug)]
pub struct PathPattern {
    source: String,
    sibling: Option<SiblingPath>,
}

/// `//TAG[contains(text(),"X")]/following-sibling::TAG[1]`
#[derive(Debug)]
pub struct SiblingPath {
    pub tag: Selector,
    pub tag_name: String,
    /// Lowercased needle.
    pub text: String,
}

impl PathPattern {
    /// Parse a path expression. Unsupported shapes are kept and skipped at run time.
    pub fn parse(source: &str) -> Self {
        let sibling = SIBLING_PATH.captures(source.trim()).and_then(|caps| {
            let tag = caps["tag"].to_lowercase();
            if tag != caps["sibling"].to_lowercase() {
                return None;
            }
            let selector = Selector::parse(&tag).ok()?;
            Some(SiblingPath {
                tag: selector,
                tag_name: tag,
                text: caps["text"].to_lowercase(),
            })
        });

        Self {
            source: source.to_string(),
            sibling,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The executable form, if the expression uses the supported shape.
    pub fn sibling(&self) -> Option<&SiblingPath> {
        self.sibling.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE: &str = r#"<table>
        <tr><td>Điện thoại liên hệ:</td><td>0912345678</td></tr>
        <tr><td>Thu nhập:</td><td>25,500,000 VND</td></tr>
    </table>"#;

    fn texts(pattern: &SelectorPattern, html: &Html) -> Vec<String> {
        pattern.select(html).into_iter().map(element_text).collect()
    }

    #[test]
    fn test_adjacent_sibling_after_contains() {
        let html = Html::parse_document(TABLE);
        let pattern = SelectorPattern::compile(r#"td:contains("Điện thoại") + td"#).unwrap();
        assert_eq!(texts(&pattern, &html), vec!["0912345678"]);
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let html = Html::parse_document(TABLE);
        let pattern = SelectorPattern::compile(r#"td:contains("điện thoại") + td"#).unwrap();
        assert!(pattern.select(&html).is_empty());
    }

    #[test]
    fn test_descendants_are_deduplicated() {
        let html = Html::parse_document(
            r#"<div>Hộ gia đình<div>Thành viên gia đình<div class="member">A - Vợ</div></div></div>"#,
        );
        let pattern =
            SelectorPattern::compile(r#"div:contains("gia đình") div[class*="member"]"#).unwrap();
        assert_eq!(texts(&pattern, &html), vec!["A - Vợ"]);
    }

    #[test]
    fn test_plain_css() {
        let html = Html::parse_document(r#"<span class="phone-value">+84 987 654 321</span>"#);
        let pattern = SelectorPattern::compile(r#"span[class*="phone"]"#).unwrap();
        assert_eq!(texts(&pattern, &html), vec!["+84 987 654 321"]);
    }

    #[test]
    fn test_invalid_css_is_rejected() {
        assert!(SelectorPattern::compile("td[[").is_err());
        assert!(SelectorPattern::compile(r#"td:contains("x") + ]]"#).is_err());
    }

    #[test]
    fn test_path_shapes() {
        let supported =
            PathPattern::parse(r#"//td[contains(text(),"Điện thoại")]/following-sibling::td[1]"#);
        let sibling = supported.sibling().unwrap();
        assert_eq!(sibling.tag_name, "td");
        assert_eq!(sibling.text, "điện thoại");

        let unsupported = PathPattern::parse(r#"//span[@class and contains(@class,"phone")]/text()"#);
        assert!(unsupported.sibling().is_none());

        let mixed_tags =
            PathPattern::parse(r#"//th[contains(text(),"SĐT")]/following-sibling::td[1]"#);
        assert!(mixed_tags.sibling().is_none());
    }
}

//! Ordered link-extraction strategies for HTML result pages.
//!
//! The result page of a host is not a contract, so the rules are data: a list
//! of CSS selectors tried in order, then a regex over the raw body.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One way of finding a share link in a result page.
#[derive(Debug, Clone)]
pub enum ExtractionStrategy {
    /// First element matching `selector`; its `value`, then `href`, then text.
    Element { css: String, selector: Selector },
    /// First match of `pattern` anywhere in the raw body.
    BodyPattern(Regex),
}

impl ExtractionStrategy {
    pub fn element(css: &str) -> Result<Self> {
        let selector =
            Selector::parse(css).map_err(|e| anyhow!("invalid CSS selector '{css}': {e:?}"))?;
        Ok(Self::Element {
            css: css.to_string(),
            selector,
        })
    }

    pub fn body_pattern(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).with_context(|| format!("invalid link pattern '{pattern}'"))?;
        Ok(Self::BodyPattern(re))
    }

    fn apply(&self, document: &Html, raw: &str, link_host: &str) -> Option<String> {
        match self {
            Self::Element { selector, .. } => document
                .select(selector)
                .next()
                .and_then(element_link)
                .filter(|link| link.contains(link_host)),
            Self::BodyPattern(re) => re.find(raw).map(|m| m.as_str().to_string()),
        }
    }

    fn describe(&self) -> &str {
        match self {
            Self::Element { css, .. } => css,
            Self::BodyPattern(re) => re.as_str(),
        }
    }
}

/// `value`, else `href`, else trimmed text: the first non-empty one.
fn element_link(element: ElementRef<'_>) -> Option<String> {
    let attr = |name: &str| {
        element
            .value()
            .attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    attr("value").or_else(|| attr("href")).or_else(|| {
        let text: String = element.text().collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

/// Runs [`ExtractionStrategy`]s in order and returns the first hit.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    strategies: Vec<ExtractionStrategy>,
    link_host: String,
}

impl LinkExtractor {
    /// Element strategies for each selector (in order), then the body pattern.
    pub fn new(selectors: &[String], link_pattern: &str, link_host: impl Into<String>) -> Result<Self> {
        let mut strategies = selectors
            .iter()
            .map(|css| ExtractionStrategy::element(css))
            .collect::<Result<Vec<_>>>()?;
        strategies.push(ExtractionStrategy::body_pattern(link_pattern)?);
        Ok(Self {
            strategies,
            link_host: link_host.into(),
        })
    }

    pub fn extract(&self, raw: &str) -> Option<String> {
        let document = Html::parse_document(raw);
        self.strategies.iter().find_map(|strategy| {
            let hit = strategy.apply(&document, raw, &self.link_host);
            if hit.is_some() {
                debug!(strategy = strategy.describe(), "Share link extracted");
            }
            hit
        })
    }
}

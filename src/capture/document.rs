//! Navigable document rebuilt from captured markup.
//!
//! Captured markup is detached from the page it came from, so relative
//! references would resolve against nothing. [`Document::reconstruct`]
//! injects a `<base href>` pointing at the captured URL before parsing.

// ============================================================================
// Imports
// ============================================================================

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Document
// ============================================================================

/// Parsed captured page with its base URL fixed up.
///
/// Not `Send`: build it on the task that reads it.
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    html: Html,
}

impl Document {
    /// Parses `markup` and appends `<base href="url">` to its `<head>`.
    ///
    /// The element is added to the parsed tree, so text that merely looks
    /// like markup (script bodies, comments) cannot displace it. A page
    /// that declares its own `<base>` keeps it: that one comes first in
    /// tree order and wins, as in a browser.
    #[must_use]
    pub fn reconstruct(url: &str, markup: &str) -> Self {
        let mut html = Html::parse_document(markup);
        append_base(&mut html, url);
        Self {
            url: url.to_string(),
            html,
        }
    }

    /// Returns the URL the markup was captured from.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the parsed tree.
    #[inline]
    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Returns the `href` of the first `<base>` element in tree order.
    ///
    /// This is the capture URL unless the page declared a base of its own.
    #[must_use]
    pub fn base_href(&self) -> Option<&str> {
        let selector = parse_selector("base[href]").ok()?;
        self.html
            .select(&selector)
            .next()
            .and_then(|base| base.value().attr("href"))
    }

    /// Returns the effective base URL.
    ///
    /// A relative page base is resolved against the capture URL.
    #[must_use]
    pub fn base_url(&self) -> Option<Url> {
        let href = self.base_href()?;
        match Url::parse(&self.url) {
            Ok(url) => url.join(href).ok(),
            Err(_) => Url::parse(href).ok(),
        }
    }

    /// Resolves `href` the way the page would.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<Url> {
        match self.base_url() {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }

    /// Returns the trimmed text of every element matching `css`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if `css` does not parse.
    pub fn select(&self, css: &str) -> Result<Vec<String>> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).map(element_text).collect())
    }

    /// Returns `attr` of every element matching `css` that has it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if `css` does not parse.
    pub fn select_attr(&self, css: &str, attr: &str) -> Result<Vec<String>> {
        let selector = parse_selector(css)?;
        Ok(self
            .html
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect())
    }

    /// Returns the document title, if any.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        let selector = parse_selector("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(element_text)
            .filter(|title| !title.is_empty())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::invalid_selector(css, e.to_string()))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Appends a `<base href="url">` element as the last child of `<head>`.
///
/// Document parsing always synthesizes a head, so the lookup only fails
/// for trees that were not parsed as documents.
fn append_base(html: &mut Html, url: &str) {
    let Some(base) = base_element(url) else {
        return;
    };
    let Some(head) = parse_selector("head")
        .ok()
        .and_then(|selector| html.select(&selector).next().map(|head| head.id()))
    else {
        return;
    };

    if let Some(mut head) = html.tree.get_mut(head) {
        head.append(base);
    }
}

/// Builds a detached base element node.
fn base_element(url: &str) -> Option<Node> {
    let fragment = Html::parse_fragment(&format!(r#"<base href="{}">"#, escape_attr(url)));
    let selector = parse_selector("base").ok()?;
    let base = fragment.select(&selector).next()?;
    Some(Node::Element(base.value().clone()))
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

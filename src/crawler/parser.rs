//! Link extraction from fetched documents
//!
//! The crawler only depends on the [`LinkExtractor`] trait. The bundled
//! [`HtmlLinkExtractor`] parses HTML and yields the targets of anchor
//! elements as absolute `http`/`https` URLs.

use crate::url::{parse_http_url, parse_url};
use scraper::{Html, Selector};
use url::Url;

/// Turns document bytes into candidate URLs
///
/// Implementations must return promptly and must only yield complete
/// absolute URLs (scheme, host and path); anything else is filtered out
/// before it reaches the frontier.
pub trait LinkExtractor: Send + Sync + 'static {
    /// Extracts links from `document`, which was fetched from `page_url`
    fn extract(&self, page_url: &str, document: &[u8]) -> Vec<String>;
}

impl<F> LinkExtractor for F
where
    F: Fn(&str, &[u8]) -> Vec<String> + Send + Sync + 'static,
{
    fn extract(&self, page_url: &str, document: &[u8]) -> Vec<String> {
        self(page_url, document)
    }
}

/// Extracts `<a href="...">` targets from HTML documents
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose target is an absolute http(s) URL, kept verbatim
/// - relative targets, resolved against the page URL
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - fragment-only links; fragments are stripped from all other links
/// - anything that does not validate as an http(s) URL after resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, page_url: &str, document: &[u8]) -> Vec<String> {
        let html = String::from_utf8_lossy(document);
        let base = Url::parse(page_url).ok();
        extract_links(&html, base.as_ref())
    }
}

/// Extracts all valid links from an HTML string
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `base_url` - Base for resolving relative links; without it only
///   absolute links are kept
///
/// # Example
///
/// ```
/// use ripcrawl::crawler::extract_links;
///
/// let html = r#"<a href="http://example.com/a">A</a><a href="b">B</a>"#;
/// let base = url::Url::parse("http://example.com/dir/").unwrap();
/// let links = extract_links(html, Some(&base));
/// assert_eq!(links, vec!["http://example.com/a", "http://example.com/dir/b"]);
/// ```
pub fn extract_links(html: &str, base_url: Option<&Url>) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that are neither a valid absolute URL nor resolvable
/// - non-HTTP(S) URLs
fn resolve_link(href: &str, base_url: Option<&Url>) -> Option<String> {
    let href = href.trim();
    let href = href.split('#').next().unwrap_or_default();

    // Skip empty and fragment-only hrefs
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Absolute http(s) links that already validate keep their exact spelling
    if parse_url(href).is_ok_and(|parsed| parsed.is_http()) {
        return Some(href.to_string());
    }

    // Everything else goes through the url crate, which also lowercases
    // schemes such as `HTTP://`
    let mut absolute_url = match base_url {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    absolute_url.set_fragment(None);
    let absolute_url = String::from(absolute_url);
    parse_http_url(&absolute_url).ok()?;
    Some(absolute_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("http://example.com/dir/page.html").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(html, Some(&base_url()))
    }

    #[test]
    fn test_extract_absolute_link_verbatim() {
        let found = links(r#"<a href="http://Other.com:8080/Page">Link</a>"#);
        assert_eq!(found, vec!["http://Other.com:8080/Page"]);
    }

    #[test]
    fn test_extract_relative_links() {
        let found = links(r#"<a href="/root">R</a><a href="sibling.html">S</a>"#);
        assert_eq!(
            found,
            vec!["http://example.com/root", "http://example.com/dir/sibling.html"]
        );
    }

    #[test]
    fn test_relative_link_without_base_is_dropped() {
        let found = extract_links(r#"<a href="/root">R</a>"#, None);
        assert!(found.is_empty());
    }

    #[test]
    fn test_fragments_stripped() {
        let found = links(r##"<a href="#top">T</a><a href="http://example.com/a#s">A</a>"##);
        assert_eq!(found, vec!["http://example.com/a"]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let found = links(
            r#"<a href="javascript:void(0)">J</a>
               <a href="mailto:test@example.com">M</a>
               <a href="tel:+123">T</a>
               <a href="ftp://example.com/file">F</a>"#,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_uppercase_scheme_is_resolved() {
        let found = links(r#"<a href="HTTP://example.com/x">X</a><a href="Https://example.com/y">Y</a>"#);
        assert_eq!(found, vec!["http://example.com/x", "https://example.com/y"]);

        let found = extract_links(r#"<a href="HTTP://example.com/x">X</a>"#, None);
        assert_eq!(found, vec!["http://example.com/x"]);
    }

    #[test]
    fn test_host_without_path_is_resolved() {
        let found = links(r#"<a href="http://example.org">O</a>"#);
        assert_eq!(found, vec!["http://example.org/"]);
    }

    #[test]
    fn test_anchor_attributes_and_case() {
        let found = links(r#"<A class="x" HREF='http://example.com/up'>U</A><a name="n">N</a>"#);
        assert_eq!(found, vec!["http://example.com/up"]);
    }

    #[test]
    fn test_extractor_trait_on_bytes() {
        let extractor = HtmlLinkExtractor::new();
        let found = extractor.extract(
            "http://example.com/",
            br#"<html><body><a href="next">n</a></body></html>"#,
        );
        assert_eq!(found, vec!["http://example.com/next"]);
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |_: &str, doc: &[u8]| -> Vec<String> {
            String::from_utf8_lossy(doc)
                .lines()
                .map(str::to_string)
                .collect()
        };
        let found = extractor.extract("http://a/", b"http://a/1\nhttp://a/2");
        assert_eq!(found, vec!["http://a/1", "http://a/2"]);
    }
}

//! URL handling for the fetch cache.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//!
//! The cache keys contents by URL. Two URLs that differ only in their
//! fragment name the same resource, and URLs carrying a query string are
//! fetched but never shared through the cache.

/// A URL prepared for use as a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// The URL with any `#fragment` removed.
    pub url: String,
    /// `false` when the URL has a `?query` and must not be indexed.
    pub cacheable: bool,
}

/// [§ 4.1 URL representation](https://url.spec.whatwg.org/#url-representation)
///
/// "A URL's fragment is either null or an ASCII string that can be used for
/// further processing on the resource the URL's other components identify."
///
/// The fragment never reaches the network, so it is dropped before the URL
/// is used as a key.
#[must_use]
pub fn normalize(url: &str) -> NormalizedUrl {
    let trimmed = url.trim();
    let without_fragment = trimmed.split_once('#').map_or(trimmed, |(head, _)| head);
    NormalizedUrl {
        url: without_fragment.to_string(),
        cacheable: !without_fragment.contains('?'),
    }
}

/// Extract the MIME type essence from a `Content-Type` header value.
///
/// [MIME Sniffing § 2.1](https://mimesniff.spec.whatwg.org/#mime-type-essence)
///
/// "A MIME type's essence is its type, followed by U+002F (/), followed by
/// its subtype." Parameters after `;` are discarded and the result is
/// lower-cased.
#[must_use]
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns the scheme of an absolute URL (`http`, `file`, `data`, ...).
#[must_use]
pub fn scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once(':')?;
    let valid = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// [§ 2.5 URLs](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#resolving-urls)
///
/// Resolve a potentially relative URL against a base URL.
///
/// STEP 1: "If url is an absolute URL, return url."
///
/// STEP 2: "Otherwise, resolve url relative to base."
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    let href = href.trim();

    // STEP 1: Check if href is already absolute.
    if scheme(href).is_some() {
        return href.to_string();
    }

    // STEP 2: Resolve relative URL against base.
    let Some(base) = base_url else {
        return href.to_string();
    };
    let Some(scheme_end) = base.find("://") else {
        // Base without an authority (e.g. a bare path): join directories.
        let base_dir = base.rsplit_once('/').map_or("", |(dir, _)| dir);
        return if base_dir.is_empty() {
            href.to_string()
        } else {
            remove_dot_segments(&format!("{base_dir}/{href}"))
        };
    };

    let after_scheme = &base[scheme_end + 3..];
    let path_start = after_scheme.find('/').map_or(base.len(), |i| scheme_end + 3 + i);
    let origin = &base[..path_start];

    if href.starts_with("//") {
        // Protocol-relative URL - prepend scheme from base
        format!("{}:{href}", &base[..scheme_end])
    } else if href.starts_with('/') {
        format!("{origin}{}", remove_dot_segments(href))
    } else if href.starts_with('?') || href.is_empty() {
        let base_path = base.split(['?', '#']).next().unwrap_or(base);
        format!("{base_path}{href}")
    } else {
        let base_path = base[path_start..].split(['?', '#']).next().unwrap_or_default();
        let base_dir = base_path.rsplit_once('/').map_or("", |(dir, _)| dir);
        format!("{origin}{}", remove_dot_segments(&format!("{base_dir}/{href}")))
    }
}

/// [§ 5.2.4 Remove Dot Segments](https://www.rfc-editor.org/rfc/rfc3986#section-5.2.4)
fn remove_dot_segments(path: &str) -> String {
    let (path, suffix) = path
        .find(['?', '#'])
        .map_or((path, ""), |i| path.split_at(i));
    let mut output: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "." => {
                if i == last {
                    output.push("");
                }
            }
            ".." => {
                if output.len() > 1 {
                    let _ = output.pop();
                }
                if i == last {
                    output.push("");
                }
            }
            other => output.push(other),
        }
    }
    format!("{}{suffix}", output.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_fragment() {
        let n = normalize("http://x/a.html#top");
        assert_eq!(n.url, "http://x/a.html");
        assert!(n.cacheable);
    }

    #[test]
    fn test_normalize_query_not_cacheable() {
        let n = normalize("http://x/search?q=1#frag");
        assert_eq!(n.url, "http://x/search?q=1");
        assert!(!n.cacheable);
    }

    #[test]
    fn test_mime_essence() {
        assert_eq!(mime_essence("Text/HTML; charset=utf-8"), "text/html");
        assert_eq!(mime_essence("  text/css "), "text/css");
    }

    #[test]
    fn test_resolve_absolute_passes_through() {
        assert_eq!(
            resolve_url("https://a/b.css", Some("http://x/y/z.html")),
            "https://a/b.css"
        );
    }

    #[test]
    fn test_resolve_relative_and_root() {
        let base = Some("http://x/dir/page.html");
        assert_eq!(resolve_url("style.css", base), "http://x/dir/style.css");
        assert_eq!(resolve_url("/style.css", base), "http://x/style.css");
        assert_eq!(resolve_url("../up.css", base), "http://x/up.css");
        assert_eq!(resolve_url("./here.css", base), "http://x/dir/here.css");
        assert_eq!(resolve_url("//cdn/a.css", base), "http://cdn/a.css");
    }

    #[test]
    fn test_resolve_against_host_without_path() {
        assert_eq!(resolve_url("a.css", Some("http://x")), "http://x/a.css");
    }
}

//! `text/html` contents.
//!
//! [§ 13.2 Parsing HTML documents](https://html.spec.whatwg.org/multipage/parsing.html)
//!
//! The markup is parsed on conversion. Stylesheets linked from the document
//! are fetched by the cache as dependencies; once every one has resolved the
//! boxes are generated and laid out. The DOM and the merged stylesheet are
//! retained so that a reformat only repeats box generation and layout.

use std::rc::Rc;

use kestrel_common::url::resolve_url;
use kestrel_css::{BoxTree, Stylesheet, StylesheetSource, stylesheet_sources, ua_stylesheet};
use kestrel_dom::DomTree;
use kestrel_html::parse_document;

use super::{buffer_data, render_document};
use crate::content::{ContentError, ContentHandler, ConvertContext, Converted};

/// Handler factory.
#[must_use]
pub fn create() -> Box<dyn ContentHandler> {
    Box::new(HtmlContent::default())
}

/// The payload of an HTML content.
#[derive(Default)]
pub struct HtmlContent {
    source: Vec<u8>,
    dom: Option<DomTree>,
    title: Option<String>,
    sources: Vec<StylesheetSource>,
    /// One slot per external stylesheet, in document order.
    external: Vec<Option<Rc<Stylesheet>>>,
    /// User-agent rules followed by every author sheet, built on first
    /// layout.
    merged: Option<Stylesheet>,
    tree: Option<BoxTree>,
    width: i32,
}

impl HtmlContent {
    /// [§ 6.4.1 Cascade Origins](https://www.w3.org/TR/css-cascade-4/#cascading-origins)
    ///
    /// User-agent declarations come first, then the author's sheets in the
    /// order the document links them.
    fn merge_stylesheets(&self) -> Stylesheet {
        let mut sheet = ua_stylesheet().clone();
        let mut external = self.external.iter();
        for source in &self.sources {
            match source {
                StylesheetSource::Inline(css) => sheet.add_css(css),
                StylesheetSource::External { .. } => {
                    // Failed fetches are skipped.
                    if let Some(Some(author)) = external.next() {
                        sheet.extend(author);
                    }
                }
            }
        }
        sheet
    }

    fn layout(&mut self, width: i32) -> Result<(), ContentError> {
        let Some(dom) = self.dom.as_ref() else {
            return Err(ContentError::Conversion("document was not parsed".to_string()));
        };
        if self.merged.is_none() {
            self.merged = Some(self.merge_stylesheets());
        }
        let sheet = self.merged.get_or_insert_with(Stylesheet::new);
        self.tree = Some(render_document(dom, sheet, width)?);
        self.width = width;
        Ok(())
    }
}

/// [§ 4.2.2 The title element](https://html.spec.whatwg.org/multipage/semantics.html#the-title-element)
///
/// "The title element represents the document's title or name." Its text
/// with whitespace stripped and collapsed.
fn document_title(dom: &DomTree) -> Option<String> {
    let title = dom.find_element("title")?;
    let text = dom.text_content(title);
    let collapsed = text.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

impl ContentHandler for HtmlContent {
    fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
        buffer_data(&mut self.source, data)
    }

    fn convert(&mut self, ctx: &ConvertContext<'_>) -> Result<Converted, ContentError> {
        let dom = parse_document(&String::from_utf8_lossy(&self.source));
        self.title = document_title(&dom);
        self.sources = stylesheet_sources(&dom);
        self.dom = Some(dom);

        let urls: Vec<String> = self
            .sources
            .iter()
            .filter_map(|source| match source {
                StylesheetSource::External { href } => Some(resolve_url(href, Some(ctx.url))),
                StylesheetSource::Inline(_) => None,
            })
            .collect();

        if urls.is_empty() {
            self.layout(ctx.width)?;
            return Ok(Converted::Done);
        }
        self.external = vec![None; urls.len()];
        self.width = ctx.width;
        Ok(Converted::NeedsStylesheets(urls))
    }

    fn revive(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        if self.tree.is_some() && width != self.width {
            self.reformat(width, height)?;
        }
        Ok(())
    }

    fn reformat(&mut self, width: i32, _height: i32) -> Result<(), ContentError> {
        self.layout(width)
    }

    fn destroy(&mut self) {
        self.tree = None;
        self.merged = None;
        self.external.clear();
        self.dom = None;
        self.source = Vec::new();
    }

    fn attach_stylesheet(&mut self, index: usize, sheet: Option<Rc<Stylesheet>>) {
        if let Some(slot) = self.external.get_mut(index) {
            *slot = sheet;
            self.merged = None;
        }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn box_tree(&self) -> Option<&BoxTree> {
        self.tree.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_css::style::Width;
    use kestrel_css::{BoxKind, Colour};

    fn ctx(width: i32) -> ConvertContext<'static> {
        ConvertContext {
            url: "http://example.com/dir/page.html",
            width,
            height: 600,
        }
    }

    fn convert(markup: &str) -> (HtmlContent, Converted) {
        let mut html = HtmlContent::default();
        html.process_data(markup.as_bytes()).unwrap();
        let converted = html.convert(&ctx(400)).unwrap();
        (html, converted)
    }

    #[test]
    fn test_convert_without_external_sheets_is_done() {
        let (html, converted) =
            convert("<title>  Hello\n  World </title><style>p { color: red }</style><p>x</p>");
        assert_eq!(converted, Converted::Done);
        assert_eq!(html.title(), Some("Hello World"));
        let tree = html.box_tree().unwrap();
        assert_eq!(tree[BoxTree::ROOT].width, 400);
        let red = tree
            .ids()
            .any(|id| tree[id].kind == BoxKind::Inline && tree[id].style.color == Colour::rgb(255, 0, 0));
        assert!(red);
    }

    #[test]
    fn test_external_sheets_are_resolved_in_order() {
        let (html, converted) = convert(
            "<link rel=stylesheet href=a.css><link rel=icon href=x.ico>\
             <link rel='alternate stylesheet' href='/b.css'><p>x</p>",
        );
        assert_eq!(
            converted,
            Converted::NeedsStylesheets(vec![
                "http://example.com/dir/a.css".to_string(),
                "http://example.com/b.css".to_string(),
            ])
        );
        assert!(html.box_tree().is_none());
    }

    #[test]
    fn test_author_sheets_apply_in_link_order_and_failures_are_skipped() {
        let (mut html, _) = convert(
            "<link rel=stylesheet href=a.css><style>p { color: blue }</style>\
             <link rel=stylesheet href=b.css><link rel=stylesheet href=c.css><p>x</p>",
        );
        html.attach_stylesheet(0, Some(Rc::new(Stylesheet::parse("p { color: red }"))));
        html.attach_stylesheet(1, None);
        html.attach_stylesheet(2, Some(Rc::new(Stylesheet::parse("p { width: 50px }"))));
        html.reformat(400, 600).unwrap();
        let tree = html.box_tree().unwrap();
        let p = tree
            .ids()
            .find(|&id| tree[id].kind == BoxKind::Block && tree[id].style.width != Width::Auto)
            .unwrap();
        // The inline <style> follows a.css, so blue wins.
        assert_eq!(tree[p].style.color, Colour::rgb(0, 0, 255));
        assert_eq!(tree[p].width, 50);
    }

    #[test]
    fn test_reformat_reuses_dom() {
        let (mut html, _) = convert("<p>some words here</p>");
        html.reformat(120, 600).unwrap();
        assert_eq!(html.box_tree().unwrap()[BoxTree::ROOT].width, 120);
        html.revive(300, 600).unwrap();
        assert_eq!(html.box_tree().unwrap()[BoxTree::ROOT].width, 300);
    }

    #[test]
    fn test_destroy_releases_payload() {
        let (mut html, _) = convert("<p>x</p>");
        html.destroy();
        assert!(html.box_tree().is_none());
        assert!(html.reformat(100, 100).is_err());
    }
}

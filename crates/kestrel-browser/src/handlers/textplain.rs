//! `text/plain` contents.
//!
//! Each source line becomes a block holding one run of text, styled by the
//! user-agent sheet and laid out like a document.

use kestrel_css::{BoxTree, ua_stylesheet};
use kestrel_dom::{DomTree, ElementData, NodeId, NodeType};

use super::{buffer_data, render_document};
use crate::content::{ContentError, ContentHandler, ConvertContext, Converted};

/// Handler factory.
#[must_use]
pub fn create() -> Box<dyn ContentHandler> {
    Box::new(TextPlainContent::default())
}

/// The payload of a plain text content.
#[derive(Default)]
pub struct TextPlainContent {
    source: Vec<u8>,
    dom: Option<DomTree>,
    tree: Option<BoxTree>,
    width: i32,
}

/// Wrap `text` in `html`/`body` with one `div` per line.
fn text_document(text: &str) -> DomTree {
    let mut dom = DomTree::new();
    let html = dom.append(NodeId::ROOT, NodeType::Element(ElementData::new("html")));
    let body = dom.append(html, NodeType::Element(ElementData::new("body")));
    for line in text.lines() {
        let div = dom.append(body, NodeType::Element(ElementData::new("div")));
        if !line.trim().is_empty() {
            let _ = dom.append(div, NodeType::Text(line.to_string()));
        }
    }
    dom
}

impl TextPlainContent {
    fn layout(&mut self, width: i32) -> Result<(), ContentError> {
        let Some(dom) = self.dom.as_ref() else {
            return Err(ContentError::Conversion("text was not converted".to_string()));
        };
        self.tree = Some(render_document(dom, ua_stylesheet(), width)?);
        self.width = width;
        Ok(())
    }
}

impl ContentHandler for TextPlainContent {
    fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
        buffer_data(&mut self.source, data)
    }

    fn convert(&mut self, ctx: &ConvertContext<'_>) -> Result<Converted, ContentError> {
        self.dom = Some(text_document(&String::from_utf8_lossy(&self.source)));
        self.source = Vec::new();
        self.layout(ctx.width)?;
        Ok(Converted::Done)
    }

    fn revive(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        if width != self.width {
            self.reformat(width, height)?;
        }
        Ok(())
    }

    fn reformat(&mut self, width: i32, _height: i32) -> Result<(), ContentError> {
        self.layout(width)
    }

    fn destroy(&mut self) {
        self.tree = None;
        self.dom = None;
    }

    fn box_tree(&self) -> Option<&BoxTree> {
        self.tree.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_css::BoxKind;

    #[test]
    fn test_one_block_per_line() {
        let mut text = TextPlainContent::default();
        text.process_data(b"first line\n\nthird   line\n").unwrap();
        let ctx = ConvertContext {
            url: "file:///tmp/a.txt",
            width: 500,
            height: 600,
        };
        assert_eq!(text.convert(&ctx).unwrap(), Converted::Done);
        let tree = text.box_tree().unwrap();
        let texts: Vec<&str> = tree
            .ids()
            .filter(|&id| tree[id].kind == BoxKind::Inline)
            .map(|id| tree.text(id))
            .collect();
        assert_eq!(texts, ["first line", "third line"]);
        let blocks = tree.ids().filter(|&id| tree[id].kind == BoxKind::Block).count();
        // html, body and three line blocks
        assert_eq!(blocks, 5);
    }
}

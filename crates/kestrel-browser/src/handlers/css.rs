//! `text/css` contents.

use std::rc::Rc;

use kestrel_css::Stylesheet;

use super::buffer_data;
use crate::content::{ContentError, ContentHandler, ConvertContext, Converted};

/// Handler factory.
#[must_use]
pub fn create() -> Box<dyn ContentHandler> {
    Box::new(CssContent::default())
}

/// The payload of a stylesheet content. The parsed sheet is shared with
/// every document that links it.
#[derive(Default)]
pub struct CssContent {
    source: Vec<u8>,
    sheet: Option<Rc<Stylesheet>>,
}

impl ContentHandler for CssContent {
    fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
        buffer_data(&mut self.source, data)
    }

    /// [§ 2.2 Error handling](https://www.w3.org/TR/css-syntax-3/#error-handling)
    ///
    /// Parsing never fails; unusable rules are dropped with a warning.
    fn convert(&mut self, _ctx: &ConvertContext<'_>) -> Result<Converted, ContentError> {
        let css = String::from_utf8_lossy(&self.source);
        self.sheet = Some(Rc::new(Stylesheet::parse(&css)));
        self.source = Vec::new();
        Ok(Converted::Done)
    }

    fn destroy(&mut self) {
        self.sheet = None;
    }

    fn stylesheet(&self) -> Option<Rc<Stylesheet>> {
        self.sheet.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_parses_split_chunks() {
        let mut css = CssContent::default();
        css.process_data(b"p { col").unwrap();
        css.process_data(b"or: red }  @media print { p { color: blue } }").unwrap();
        let ctx = ConvertContext {
            url: "http://x/a.css",
            width: 800,
            height: 600,
        };
        assert_eq!(css.convert(&ctx).unwrap(), Converted::Done);
        let sheet = css.stylesheet().unwrap();
        assert_eq!(sheet.len(), 1);
    }
}

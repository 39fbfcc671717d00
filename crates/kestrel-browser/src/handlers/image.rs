//! Raster image contents.
//!
//! [§ 4.8.3 The img element](https://html.spec.whatwg.org/multipage/embedded-content.html#the-img-element)
//!
//! The `image` crate detects the format from the data itself. Only the
//! intrinsic dimensions are kept; nothing is painted.

use kestrel_common::warning::warn_once;

use super::buffer_data;
use crate::content::{ContentError, ContentHandler, ConvertContext, Converted};

/// Handler factory.
#[must_use]
pub fn create() -> Box<dyn ContentHandler> {
    Box::new(ImageContent::default())
}

/// The payload of an image content.
#[derive(Default)]
pub struct ImageContent {
    source: Vec<u8>,
    size: Option<(u32, u32)>,
}

impl ContentHandler for ImageContent {
    fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
        buffer_data(&mut self.source, data)
    }

    fn convert(&mut self, ctx: &ConvertContext<'_>) -> Result<Converted, ContentError> {
        let decoded = ::image::load_from_memory(&self.source).map_err(|e| {
            let message = format!("could not decode image ({e})");
            warn_once("image", &format!("{message}: {}", ctx.url));
            ContentError::Conversion(message)
        })?;
        self.size = Some((decoded.width(), decoded.height()));
        self.source = Vec::new();
        Ok(Converted::Done)
    }

    fn destroy(&mut self) {
        self.size = None;
    }

    fn image_size(&self) -> Option<(u32, u32)> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CTX: ConvertContext<'static> = ConvertContext {
        url: "http://x/i.png",
        width: 800,
        height: 600,
    };

    #[test]
    fn test_png_dimensions() {
        let mut png = Cursor::new(Vec::new());
        ::image::DynamicImage::new_rgba8(3, 2)
            .write_to(&mut png, ::image::ImageFormat::Png)
            .unwrap();
        let mut img = ImageContent::default();
        img.process_data(png.get_ref()).unwrap();
        assert_eq!(img.convert(&CTX).unwrap(), Converted::Done);
        assert_eq!(img.image_size(), Some((3, 2)));
    }

    #[test]
    fn test_undecodable_data_fails() {
        let mut img = ImageContent::default();
        img.process_data(b"definitely not an image").unwrap();
        assert!(matches!(img.convert(&CTX), Err(ContentError::Conversion(_))));
    }
}

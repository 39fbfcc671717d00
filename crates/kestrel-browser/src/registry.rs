//! MIME type to content type mapping and the per-type handler table.

use std::collections::HashMap;

use kestrel_common::url::mime_essence;
use strum::EnumCount;

use crate::content::{ContentHandler, ContentType};
use crate::handlers;

/// Creates the handler for a new content.
pub type HandlerFactory = fn() -> Box<dyn ContentHandler>;

/// [MIME Sniffing § 4.6 MIME type groups](https://mimesniff.spec.whatwg.org/#mime-type-groups)
///
/// The MIME types recognised out of the box.
const DEFAULT_MIME_TYPES: &[(&str, ContentType)] = &[
    ("text/html", ContentType::Html),
    ("text/css", ContentType::Css),
    ("text/plain", ContentType::TextPlain),
    ("image/png", ContentType::Image),
    ("image/jpeg", ContentType::Image),
    ("image/gif", ContentType::Image),
    ("image/bmp", ContentType::Image),
    ("image/webp", ContentType::Image),
    ("image/x-icon", ContentType::Image),
];

/// Maps MIME types to [`ContentType`]s and content types to handlers.
///
/// Handler selection is a direct index on the type's discriminant.
#[derive(Debug, Clone)]
pub struct ContentRegistry {
    mime_types: HashMap<String, ContentType>,
    handlers: [HandlerFactory; ContentType::COUNT],
}

impl ContentRegistry {
    /// The default table with the built-in handlers.
    #[must_use]
    pub fn new() -> Self {
        let mime_types = DEFAULT_MIME_TYPES
            .iter()
            .map(|&(mime, ty)| (mime.to_string(), ty))
            .collect();
        Self {
            mime_types,
            // Indexed by `ContentType::index`.
            handlers: [
                handlers::html::create,
                handlers::css::create,
                handlers::textplain::create,
                handlers::image::create,
                handlers::other::create,
            ],
        }
    }

    /// The content type for a `Content-Type` value. Parameters and case are
    /// ignored; unknown types are [`ContentType::Other`].
    #[must_use]
    pub fn lookup(&self, content_type: &str) -> ContentType {
        self.mime_types
            .get(&mime_essence(content_type))
            .copied()
            .unwrap_or(ContentType::Other)
    }

    /// Add or override the mapping for `mime`.
    pub fn register_mime(&mut self, mime: &str, ty: ContentType) {
        let _ = self.mime_types.insert(mime_essence(mime), ty);
    }

    /// Replace the handler factory for `ty`.
    pub fn set_handler(&mut self, ty: ContentType, factory: HandlerFactory) {
        self.handlers[ty.index()] = factory;
    }

    /// Create a handler for a new content of type `ty`.
    #[must_use]
    pub fn create(&self, ty: ContentType) -> Box<dyn ContentHandler> {
        (self.handlers[ty.index()])()
    }
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentError, ConvertContext, Converted};

    #[test]
    fn test_lookup_ignores_parameters_and_case() {
        let registry = ContentRegistry::new();
        assert_eq!(registry.lookup("text/html; charset=utf-8"), ContentType::Html);
        assert_eq!(registry.lookup("Text/CSS"), ContentType::Css);
        assert_eq!(registry.lookup("image/png"), ContentType::Image);
        assert_eq!(registry.lookup("application/pdf"), ContentType::Other);
    }

    #[test]
    fn test_register_mime_overrides() {
        let mut registry = ContentRegistry::new();
        registry.register_mime("application/xhtml+xml", ContentType::Html);
        registry.register_mime("text/plain", ContentType::Other);
        assert_eq!(registry.lookup("application/xhtml+xml"), ContentType::Html);
        assert_eq!(registry.lookup("text/plain"), ContentType::Other);
    }

    struct Marker;

    impl ContentHandler for Marker {
        fn process_data(&mut self, _: &[u8]) -> Result<(), ContentError> {
            Ok(())
        }

        fn convert(&mut self, _: &ConvertContext<'_>) -> Result<Converted, ContentError> {
            Ok(Converted::Done)
        }

        fn title(&self) -> Option<&str> {
            Some("marker")
        }
    }

    fn marker() -> Box<dyn ContentHandler> {
        Box::new(Marker)
    }

    #[test]
    fn test_set_handler_replaces_factory() {
        let mut registry = ContentRegistry::new();
        registry.set_handler(ContentType::Other, marker);
        assert_eq!(registry.create(ContentType::Other).title(), Some("marker"));
        assert_eq!(registry.create(ContentType::Css).title(), None);
    }
}

//! Contents: one fetched resource and the state machine it moves through.
//!
//! A [`Content`] owns the per-type payload produced by its
//! [`ContentHandler`]. The handler is chosen by the
//! [`ContentRegistry`](crate::registry::ContentRegistry) from the resource's
//! MIME type and does the type-specific work; the content enforces the order
//! in which that work may happen:
//!
//! ```text
//! LOADING --process_data--> LOADING --convert--> READY --dependencies--> DONE
//!    |                         |                   \______________________/^
//!    +------ ERROR <-----------+
//! ```

use std::rc::Rc;

use bitflags::bitflags;
use kestrel_css::{BoxTree, LayoutError, Stylesheet};
use strum_macros::{Display, EnumCount, EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::fetch_cache::RequestId;

/// The closed set of content types the pipeline understands.
///
/// The discriminant indexes the registry's handler array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter, IntoStaticStr)]
pub enum ContentType {
    /// `text/html`
    #[strum(serialize = "HTML")]
    Html,
    /// `text/css`
    #[strum(serialize = "CSS")]
    Css,
    /// `text/plain`
    #[strum(serialize = "plain text")]
    TextPlain,
    /// A raster image the `image` crate can decode.
    #[strum(serialize = "image")]
    Image,
    /// Anything else; bytes are kept but not interpreted.
    #[strum(serialize = "other")]
    Other,
}

impl ContentType {
    /// Position of this type in per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The single-bit mask for this type.
    #[must_use]
    pub const fn allowed(self) -> AllowedTypes {
        match self {
            Self::Html => AllowedTypes::HTML,
            Self::Css => AllowedTypes::CSS,
            Self::TextPlain => AllowedTypes::TEXT_PLAIN,
            Self::Image => AllowedTypes::IMAGE,
            Self::Other => AllowedTypes::OTHER,
        }
    }
}

bitflags! {
    /// The content types a requester is willing to receive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AllowedTypes: u8 {
        /// `text/html`
        const HTML = 1 << 0;
        /// `text/css`
        const CSS = 1 << 1;
        /// `text/plain`
        const TEXT_PLAIN = 1 << 2;
        /// Decodable images.
        const IMAGE = 1 << 3;
        /// Uninterpreted bytes.
        const OTHER = 1 << 4;
        /// Every type.
        const ALL = Self::HTML.bits()
            | Self::CSS.bits()
            | Self::TEXT_PLAIN.bits()
            | Self::IMAGE.bits()
            | Self::OTHER.bits();
    }
}

impl AllowedTypes {
    /// Whether `ty` is acceptable.
    #[must_use]
    pub const fn permits(self, ty: ContentType) -> bool {
        self.contains(ty.allowed())
    }
}

/// Where a content is in its lifecycle.
///
/// Ordered so that `status >= ContentStatus::Ready` means "converted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ContentStatus {
    /// Bytes are still arriving.
    #[strum(serialize = "LOADING")]
    Loading,
    /// Converted, waiting for dependencies.
    #[strum(serialize = "READY")]
    Ready,
    /// Fully converted and laid out.
    #[strum(serialize = "DONE")]
    Done,
    /// Conversion failed; the content is unusable.
    #[strum(serialize = "ERROR")]
    Error,
}

/// Handle to a content in the cache's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub usize);

/// Failure of a content operation.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A buffer could not grow.
    #[error("out of memory")]
    NoMemory,
    /// An operation was attempted in a state that does not allow it.
    #[error("{operation} is not allowed while {status}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The status the content was in.
        status: ContentStatus,
    },
    /// The data could not be converted.
    #[error("conversion failed: {0}")]
    Conversion(String),
    /// Layout was abandoned.
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),
}

impl From<std::collections::TryReserveError> for ContentError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::NoMemory
    }
}

/// What a handler needs to know when converting.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    /// The content's URL, used as the base for relative references.
    pub url: &'a str,
    /// Viewport width in pixels.
    pub width: i32,
    /// Viewport height in pixels.
    pub height: i32,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    /// Nothing else is needed; the content is DONE.
    Done,
    /// The listed stylesheet URLs must be fetched before the content can
    /// be laid out.
    NeedsStylesheets(Vec<String>),
}

/// The per-type operations of a content.
///
/// A handler is created (by its registry factory) when the transport
/// reports the resource's type, fed bytes with [`process_data`], converted
/// once on completion, and may then be revived or reformatted any number of
/// times before it is destroyed.
///
/// [`process_data`]: ContentHandler::process_data
pub trait ContentHandler {
    /// Accept the next chunk of the resource.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NoMemory`] if the data cannot be buffered.
    fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError>;

    /// Turn the buffered bytes into the type's payload.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the content.
    fn convert(&mut self, ctx: &ConvertContext<'_>) -> Result<Converted, ContentError>;

    /// Prepare a cached content for reuse at a new viewport size.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be laid out again.
    fn revive(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        let _ = (width, height);
        Ok(())
    }

    /// Recompute layout for a new viewport size without re-parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if layout fails.
    fn reformat(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        let _ = (width, height);
        Ok(())
    }

    /// Release the payload.
    fn destroy(&mut self) {}

    /// Record the outcome of stylesheet dependency `index` (in the order
    /// returned by [`Converted::NeedsStylesheets`]). `None` means it failed
    /// and is skipped.
    fn attach_stylesheet(&mut self, index: usize, sheet: Option<Rc<Stylesheet>>) {
        let _ = (index, sheet);
    }

    /// The document title, if the type has one.
    fn title(&self) -> Option<&str> {
        None
    }

    /// The laid-out box tree, for types that render documents.
    fn box_tree(&self) -> Option<&BoxTree> {
        None
    }

    /// The parsed stylesheet, for CSS.
    fn stylesheet(&self) -> Option<Rc<Stylesheet>> {
        None
    }

    /// Intrinsic size in pixels, for images.
    fn image_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// The raw bytes, for types that keep them.
    fn raw_data(&self) -> Option<&[u8]> {
        None
    }
}

/// One fetched resource being rendered.
pub struct Content {
    url: String,
    ty: ContentType,
    status: ContentStatus,
    size: usize,
    status_message: String,
    /// Callers holding this content.
    pub(crate) users: usize,
    /// Stylesheets this content holds a user reference on.
    pub(crate) dependencies: Vec<ContentId>,
    /// Outstanding dependency fetches.
    pub(crate) pending: Vec<RequestId>,
    /// Viewport the content was last laid out for.
    pub(crate) viewport: (i32, i32),
    handler: Box<dyn ContentHandler>,
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Content")
            .field("url", &self.url)
            .field("ty", &self.ty)
            .field("status", &self.status)
            .field("size", &self.size)
            .field("users", &self.users)
            .finish_non_exhaustive()
    }
}

impl Content {
    /// A fresh LOADING content.
    #[must_use]
    pub fn new(url: &str, ty: ContentType, handler: Box<dyn ContentHandler>) -> Self {
        Self {
            url: url.to_string(),
            ty,
            status: ContentStatus::Loading,
            size: 0,
            status_message: String::new(),
            users: 0,
            dependencies: Vec::new(),
            pending: Vec::new(),
            viewport: (0, 0),
            handler,
        }
    }

    /// The URL the content was fetched from (fragment removed).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The content's type.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.ty
    }

    /// The content's status.
    #[must_use]
    pub const fn status(&self) -> ContentStatus {
        self.status
    }

    /// Bytes received so far.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The last progress message.
    #[must_use]
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Number of callers holding the content.
    #[must_use]
    pub const fn users(&self) -> usize {
        self.users
    }

    /// The type-specific payload.
    #[must_use]
    pub fn handler(&self) -> &dyn ContentHandler {
        self.handler.as_ref()
    }

    /// The document title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.handler.title()
    }

    pub(crate) fn set_status_message(&mut self, message: String) {
        self.status_message = message;
    }

    fn require(&self, operation: &'static str, ok: bool) -> Result<(), ContentError> {
        if ok {
            Ok(())
        } else {
            Err(ContentError::InvalidState {
                operation,
                status: self.status,
            })
        }
    }

    /// Feed bytes to the handler. Only allowed while LOADING.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidState`] outside LOADING, or the
    /// handler's error.
    pub fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
        self.require("process_data", self.status == ContentStatus::Loading)?;
        self.handler.process_data(data)?;
        self.size += data.len();
        Ok(())
    }

    /// Convert the received data. Only allowed while LOADING.
    ///
    /// On failure the content moves to ERROR and must be destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidState`] outside LOADING, or the
    /// handler's error.
    pub fn convert(&mut self, ctx: &ConvertContext<'_>) -> Result<Converted, ContentError> {
        self.require("convert", self.status == ContentStatus::Loading)?;
        self.viewport = (ctx.width, ctx.height);
        match self.handler.convert(ctx) {
            Ok(converted) => {
                self.status = match converted {
                    Converted::Done => ContentStatus::Done,
                    Converted::NeedsStylesheets(_) => ContentStatus::Ready,
                };
                Ok(converted)
            }
            Err(e) => {
                self.status = ContentStatus::Error;
                Err(e)
            }
        }
    }

    /// Record the outcome of one stylesheet dependency. Only allowed while
    /// READY.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidState`] outside READY.
    pub fn attach_stylesheet(
        &mut self,
        index: usize,
        sheet: Option<Rc<Stylesheet>>,
    ) -> Result<(), ContentError> {
        self.require("attach_stylesheet", self.status == ContentStatus::Ready)?;
        self.handler.attach_stylesheet(index, sheet);
        Ok(())
    }

    /// Every dependency has resolved: lay out and become DONE.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidState`] outside READY, or the layout
    /// error (the content then moves to ERROR).
    pub fn finish(&mut self) -> Result<(), ContentError> {
        self.require("finish", self.status == ContentStatus::Ready)?;
        let (width, height) = self.viewport;
        match self.handler.reformat(width, height) {
            Ok(()) => {
                self.status = ContentStatus::Done;
                Ok(())
            }
            Err(e) => {
                self.status = ContentStatus::Error;
                Err(e)
            }
        }
    }

    /// Reattach a cached content for a caller with the given viewport.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidState`] before conversion, or the
    /// handler's error.
    pub fn revive(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        self.require("revive", self.status >= ContentStatus::Ready)?;
        self.handler.revive(width, height)?;
        self.viewport = (width, height);
        Ok(())
    }

    /// Lay out again for a new viewport.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidState`] before conversion, or the
    /// handler's error.
    pub fn reformat(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        self.require(
            "reformat",
            matches!(self.status, ContentStatus::Ready | ContentStatus::Done),
        )?;
        self.viewport = (width, height);
        if self.status == ContentStatus::Done {
            self.handler.reformat(width, height)?;
        }
        Ok(())
    }

    /// Release the payload.
    pub fn destroy(&mut self) {
        self.handler.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{EnumCount, IntoEnumIterator};

    struct Counting {
        bytes: usize,
        fail: bool,
    }

    impl ContentHandler for Counting {
        fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
            self.bytes += data.len();
            Ok(())
        }

        fn convert(&mut self, _: &ConvertContext<'_>) -> Result<Converted, ContentError> {
            if self.fail {
                Err(ContentError::Conversion("bad".to_string()))
            } else {
                Ok(Converted::Done)
            }
        }
    }

    fn content(fail: bool) -> Content {
        Content::new(
            "http://x/",
            ContentType::Other,
            Box::new(Counting { bytes: 0, fail }),
        )
    }

    const CTX: ConvertContext<'static> = ConvertContext {
        url: "http://x/",
        width: 800,
        height: 600,
    };

    #[test]
    fn test_allowed_types_cover_every_variant() {
        assert_eq!(ContentType::COUNT, 5);
        for ty in ContentType::iter() {
            assert!(AllowedTypes::ALL.permits(ty));
            assert_eq!(ty.allowed().bits().count_ones(), 1);
        }
        assert!(!AllowedTypes::CSS.permits(ContentType::Html));
    }

    #[test]
    fn test_status_ordering() {
        assert!(ContentStatus::Ready > ContentStatus::Loading);
        assert!(ContentStatus::Done >= ContentStatus::Ready);
        assert_eq!(ContentStatus::Done.to_string(), "DONE");
    }

    #[test]
    fn test_loading_to_done() {
        let mut c = content(false);
        c.process_data(b"abc").unwrap();
        c.process_data(b"de").unwrap();
        assert_eq!(c.size(), 5);
        assert_eq!(c.convert(&CTX).unwrap(), Converted::Done);
        assert_eq!(c.status(), ContentStatus::Done);
    }

    #[test]
    fn test_process_data_after_convert_is_rejected() {
        let mut c = content(false);
        let _ = c.convert(&CTX).unwrap();
        assert!(matches!(
            c.process_data(b"x"),
            Err(ContentError::InvalidState {
                operation: "process_data",
                status: ContentStatus::Done
            })
        ));
    }

    #[test]
    fn test_failed_convert_moves_to_error() {
        let mut c = content(true);
        assert!(c.convert(&CTX).is_err());
        assert_eq!(c.status(), ContentStatus::Error);
        assert!(c.reformat(10, 10).is_err());
    }

    #[test]
    fn test_revive_requires_conversion() {
        let mut c = content(false);
        assert!(c.revive(100, 100).is_err());
        let _ = c.convert(&CTX).unwrap();
        c.revive(100, 100).unwrap();
        assert_eq!(c.viewport, (100, 100));
    }
}

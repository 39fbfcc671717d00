//! A browsing session: the fetch cache plus the viewport it lays out for.

use std::cell::RefCell;
use std::rc::Rc;

use kestrel_common::warning::clear_warnings;
use thiserror::Error;

use crate::content::{AllowedTypes, Content, ContentError, ContentId, ContentType};
use crate::fetch_cache::{FetchCache, FetchMsg, FetchOptions, RequestId};
use crate::registry::ContentRegistry;
use crate::transport::{BlockingTransport, Transport};

/// Default viewport width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: i32 = 800;
/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: i32 = 600;
/// Default limit on unused cached content, in bytes.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1024 * 1024;

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Viewport width in pixels.
    pub viewport_width: i32,
    /// Viewport height in pixels.
    pub viewport_height: i32,
    /// Bytes of unused content the memory cache may keep.
    pub cache_max_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
        }
    }
}

/// Why [`Session::load`] produced no content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The fetch or conversion failed.
    #[error("{0}")]
    Network(String),
    /// The resource was of a type the caller did not accept.
    #[error("unexpected content type: {0}")]
    BadType(ContentType),
    /// Memory ran out.
    #[error("out of memory")]
    NoMemory,
    /// The transport went quiet before the fetch finished.
    #[error("fetch stalled")]
    Stalled,
}

/// Owns the fetch cache and the viewport every content is laid out for.
#[derive(Debug)]
pub struct Session {
    cache: FetchCache,
    config: SessionConfig,
}

impl Session {
    /// A session fetching through `transport`.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        clear_warnings();
        Self {
            cache: FetchCache::new(transport, config.cache_max_size),
            config,
        }
    }

    /// A session over the network, filesystem and `data:` URLs.
    #[must_use]
    pub fn blocking(config: SessionConfig) -> Self {
        Self::new(Box::new(BlockingTransport::new()), config)
    }

    /// The session's settings.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying fetch cache.
    #[must_use]
    pub const fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// The MIME and handler tables, for registering new types.
    pub fn registry_mut(&mut self) -> &mut ContentRegistry {
        self.cache.registry_mut()
    }

    fn options(&self, allowed: AllowedTypes) -> FetchOptions {
        FetchOptions::new(allowed, self.config.viewport_width, self.config.viewport_height)
    }

    /// Request `url` for the session's viewport.
    pub fn fetch(
        &mut self,
        url: &str,
        allowed: AllowedTypes,
        callback: impl FnMut(RequestId, &FetchMsg) + 'static,
    ) -> RequestId {
        let options = self.options(allowed);
        self.cache.fetch(url, &options, callback)
    }

    /// Withdraw a request.
    pub fn cancel(&mut self, request: RequestId) -> bool {
        self.cache.cancel(request)
    }

    /// Dispatch pending transport events. Returns the number handled.
    pub fn poll(&mut self) -> usize {
        self.cache.poll()
    }

    /// Poll until nothing is in flight or the transport has nothing more to
    /// report. Returns `true` if every fetch finished.
    pub fn run_until_idle(&mut self) -> bool {
        while self.cache.in_flight() > 0 {
            if self.poll() == 0 {
                return false;
            }
        }
        true
    }

    /// Fetch `url` and poll until it resolves.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] describing the failure message the fetch
    /// ended with, or [`LoadError::Stalled`] if the transport stopped
    /// reporting events first.
    pub fn load(&mut self, url: &str) -> Result<ContentId, LoadError> {
        let outcome: Rc<RefCell<Option<FetchMsg>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&outcome);
        let request = self.fetch(url, AllowedTypes::ALL, move |_, msg| {
            if msg.is_final() {
                *slot.borrow_mut() = Some(msg.clone());
            }
        });
        loop {
            let done = outcome.borrow_mut().take();
            match done {
                Some(FetchMsg::Ok(id)) => return Ok(id),
                Some(FetchMsg::Error(message)) => return Err(LoadError::Network(message)),
                Some(FetchMsg::BadType(ty)) => return Err(LoadError::BadType(ty)),
                Some(FetchMsg::NoMemory) => return Err(LoadError::NoMemory),
                Some(FetchMsg::Status(_)) | None => {}
            }
            if self.poll() == 0 && outcome.borrow().is_none() {
                let _ = self.cancel(request);
                return Err(LoadError::Stalled);
            }
        }
    }

    /// The content `id`, if alive.
    #[must_use]
    pub fn content(&self, id: ContentId) -> Option<&Content> {
        self.cache.content(id)
    }

    /// Give back a content obtained from a fetch.
    pub fn release(&mut self, id: ContentId) {
        self.cache.release(id);
    }

    /// Change the viewport and lay out every content in use again.
    ///
    /// # Errors
    ///
    /// Returns the first layout failure.
    pub fn set_viewport(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self.cache.reformat_all(width, height)
    }

    /// Abort every fetch and destroy every content.
    pub fn shutdown(&mut self) {
        self.cache.shutdown();
    }
}

//! Fetching and rendering contents for the Kestrel document pipeline.
//!
//! # Scope
//!
//! This crate provides:
//! - **Transport** - blocking `http(s):`, `file:` and `data:` fetches, and a
//!   scripted transport for tests
//! - **Fetch cache** - one transfer per in-flight URL shared by every
//!   requester, content-type filtering, stylesheet dependencies
//! - **Memory cache** - converted contents indexed by URL with LRU eviction
//! - **Contents** - the LOADING / READY / DONE state machine and the
//!   per-type handlers (HTML, CSS, plain text, images, other)
//! - **Session** - viewport, polling and a blocking `load`
//!
//! # Not Yet Implemented
//!
//! - Fetching images referenced from documents
//! - HTTP caching headers
//! - Painting

/// Contents and their state machine.
pub mod content;
/// Requests, broadcasts and dependencies.
pub mod fetch_cache;
/// Built-in content handlers.
pub mod handlers;
/// Converted contents indexed by URL.
pub mod memory_cache;
/// MIME types and handler table.
pub mod registry;
/// The browsing session.
pub mod session;
/// Transports.
pub mod transport;

pub use kestrel_css as css;
pub use kestrel_dom as dom;
pub use kestrel_html as html;

pub use content::{
    AllowedTypes, Content, ContentError, ContentHandler, ContentId, ContentStatus, ContentType,
    ConvertContext, Converted,
};
pub use fetch_cache::{FetchCache, FetchMsg, FetchOptions, RequestId};
pub use memory_cache::MemoryCache;
pub use registry::{ContentRegistry, HandlerFactory};
pub use session::{LoadError, Session, SessionConfig};
pub use transport::{
    BlockingTransport, FetchHandle, QueueTransport, Transport, TransportEvent, TransportLog,
};

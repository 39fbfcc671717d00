//! The single entry point for obtaining contents.
//!
//! [`FetchCache::fetch`] either answers from the memory cache at once, joins
//! a fetch already in flight for the same URL, or starts a new one. Each
//! in-flight URL has exactly one transport fetch and a list of requesters;
//! every message about that URL is broadcast to all of them, in transport
//! event order, from inside [`FetchCache::poll`].

use std::collections::{HashMap, VecDeque};

use kestrel_common::url::{NormalizedUrl, normalize};
use kestrel_common::warning::warn_once;

use crate::content::{
    AllowedTypes, Content, ContentError, ContentId, ContentStatus, ContentType, ConvertContext,
    Converted,
};
use crate::memory_cache::MemoryCache;
use crate::registry::ContentRegistry;
use crate::transport::{FetchHandle, Transport, TransportEvent};

/// Identifies one caller's interest in a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// What a requester is told about its fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMsg {
    /// Progress text.
    Status(String),
    /// The content is ready; the requester now holds one user reference
    /// and must [`release`](FetchCache::release) it.
    Ok(ContentId),
    /// The fetch or conversion failed.
    Error(String),
    /// The resource is of a type the requester did not allow.
    BadType(ContentType),
    /// Memory ran out while handling the resource.
    NoMemory,
}

impl FetchMsg {
    /// Whether no further message follows this one.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Status(_))
    }
}

/// A requester callback.
pub type Callback = Box<dyn FnMut(RequestId, &FetchMsg)>;

/// Per-request options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// The page that referred to the URL.
    pub referrer: Option<String>,
    /// Types the requester accepts.
    pub allowed: AllowedTypes,
    /// Viewport width the content should be laid out for.
    pub width: i32,
    /// Viewport height the content should be laid out for.
    pub height: i32,
}

impl FetchOptions {
    /// Accept `allowed` types, laid out in a `width` by `height` viewport.
    #[must_use]
    pub const fn new(allowed: AllowedTypes, width: i32, height: i32) -> Self {
        Self {
            referrer: None,
            allowed,
            width,
            height,
        }
    }

    /// Set the referrer.
    #[must_use]
    pub fn with_referrer(mut self, referrer: &str) -> Self {
        self.referrer = Some(referrer.to_string());
        self
    }
}

enum Requester {
    Callback(Callback),
    /// A stylesheet a document is waiting for.
    Dependency { parent: ContentId, index: usize },
}

struct FetchRequest {
    id: RequestId,
    allowed: AllowedTypes,
    requester: Requester,
    bytes: usize,
}

/// The outcome of a dependency fetch, applied after the broadcast that
/// produced it.
struct Resolution {
    request: RequestId,
    parent: ContentId,
    index: usize,
    content: Option<ContentId>,
}

/// Hand `msg` to one requester. A content delivered with `Ok` gains a user
/// for the requester.
fn deliver(
    request: &mut FetchRequest,
    msg: &FetchMsg,
    store: &mut MemoryCache,
    resolutions: &mut VecDeque<Resolution>,
) {
    if let FetchMsg::Ok(id) = *msg {
        store.add_user(id);
    }
    match &mut request.requester {
        Requester::Callback(callback) => callback(request.id, msg),
        Requester::Dependency { parent, index } => {
            if msg.is_final() {
                resolutions.push_back(Resolution {
                    request: request.id,
                    parent: *parent,
                    index: *index,
                    content: match *msg {
                        FetchMsg::Ok(id) => Some(id),
                        _ => None,
                    },
                });
            }
        }
    }
}

/// One URL being fetched.
struct InFlight {
    url: NormalizedUrl,
    /// `None` once the transport has finished.
    handle: Option<FetchHandle>,
    content: Option<ContentId>,
    requests: Vec<FetchRequest>,
    width: i32,
    height: i32,
}

/// [Fetch Standard § 4 Fetching](https://fetch.spec.whatwg.org/#fetching)
///
/// Turns URLs into contents, sharing one transport fetch between every
/// requester of a URL and reusing converted contents through the memory
/// cache.
pub struct FetchCache {
    transport: Box<dyn Transport>,
    registry: ContentRegistry,
    store: MemoryCache,
    /// Keyed by normalised URL.
    in_flight: HashMap<String, InFlight>,
    handles: HashMap<FetchHandle, String>,
    resolutions: VecDeque<Resolution>,
    next_request: u64,
}

impl FetchCache {
    /// A cache fetching through `transport` and keeping up to
    /// `max_size` bytes of unused contents.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>, max_size: usize) -> Self {
        Self {
            transport,
            registry: ContentRegistry::new(),
            store: MemoryCache::new(max_size),
            in_flight: HashMap::new(),
            handles: HashMap::new(),
            resolutions: VecDeque::new(),
            next_request: 0,
        }
    }

    /// The MIME and handler tables.
    #[must_use]
    pub const fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    /// Mutable access to the MIME and handler tables.
    pub fn registry_mut(&mut self) -> &mut ContentRegistry {
        &mut self.registry
    }

    /// The content store.
    #[must_use]
    pub const fn store(&self) -> &MemoryCache {
        &self.store
    }

    /// The content `id`, if alive.
    #[must_use]
    pub fn content(&self, id: ContentId) -> Option<&Content> {
        self.store.get(id)
    }

    /// Number of URLs being fetched or waiting for dependencies.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Request `url`. Messages are passed to `callback`, possibly before
    /// this call returns.
    pub fn fetch(
        &mut self,
        url: &str,
        options: &FetchOptions,
        callback: impl FnMut(RequestId, &FetchMsg) + 'static,
    ) -> RequestId {
        self.request(url, options, Requester::Callback(Box::new(callback)))
    }

    fn request(&mut self, url: &str, options: &FetchOptions, requester: Requester) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        let mut request = FetchRequest {
            id,
            allowed: options.allowed,
            requester,
            bytes: 0,
        };
        let key = normalize(url);

        // STEP 1: A converted content is reused straight from the cache.
        if let Some(cached) = key.cacheable.then(|| self.store.cached(&key.url)).flatten() {
            self.fetch_cached(cached, &mut request, options);
            return id;
        }

        // STEP 2: Join a fetch already in flight for the same URL.
        if let Some(entry) = self.in_flight.get_mut(&key.url) {
            let resolved = entry
                .content
                .and_then(|c| self.store.get(c))
                .map(Content::content_type);
            match resolved {
                Some(ty) if !request.allowed.permits(ty) => {
                    deliver(
                        &mut request,
                        &FetchMsg::BadType(ty),
                        &mut self.store,
                        &mut self.resolutions,
                    );
                }
                _ => entry.requests.push(request),
            }
            return id;
        }

        // STEP 3: Start a new fetch.
        match self.transport.start(&key.url, options.referrer.as_deref()) {
            Ok(handle) => {
                let _ = self.handles.insert(handle, key.url.clone());
                let _ = self.in_flight.insert(
                    key.url.clone(),
                    InFlight {
                        url: key,
                        handle: Some(handle),
                        content: None,
                        requests: vec![request],
                        width: options.width,
                        height: options.height,
                    },
                );
            }
            Err(e) => deliver(
                &mut request,
                &FetchMsg::Error(e.to_string()),
                &mut self.store,
                &mut self.resolutions,
            ),
        }
        id
    }

    /// The fast path: revive the cached content for this caller's viewport,
    /// then report it found.
    fn fetch_cached(&mut self, id: ContentId, request: &mut FetchRequest, options: &FetchOptions) {
        let Some(content) = self.store.get_mut(id) else {
            return;
        };
        let ty = content.content_type();
        let msg = if !request.allowed.permits(ty) {
            FetchMsg::BadType(ty)
        } else if let Err(e) = content.revive(options.width, options.height) {
            error_msg(&e)
        } else {
            content.set_status_message("Found in cache".to_string());
            deliver(
                request,
                &FetchMsg::Status("Found in cache".to_string()),
                &mut self.store,
                &mut self.resolutions,
            );
            FetchMsg::Ok(id)
        };
        deliver(request, &msg, &mut self.store, &mut self.resolutions);
    }

    /// Drain the transport and dispatch its events. Returns the number of
    /// events handled.
    pub fn poll(&mut self) -> usize {
        let events = self.transport.poll();
        let count = events.len();
        for (handle, event) in events {
            self.dispatch(handle, event);
            self.apply_resolutions();
        }
        count
    }

    fn dispatch(&mut self, handle: FetchHandle, event: TransportEvent) {
        // Events for aborted fetches are dropped.
        let Some(url) = self.handles.get(&handle).cloned() else {
            return;
        };
        trace(handle, &url, &event);
        match event {
            TransportEvent::Type(mime) => self.on_type(&url, &mime),
            TransportEvent::Data(data) => self.on_data(&url, &data),
            TransportEvent::Finished => {
                let _ = self.handles.remove(&handle);
                if let Some(entry) = self.in_flight.get_mut(&url) {
                    entry.handle = None;
                }
                self.on_finished(&url);
            }
            TransportEvent::Error(message) => {
                let _ = self.handles.remove(&handle);
                if let Some(entry) = self.in_flight.get_mut(&url) {
                    entry.handle = None;
                }
                self.fail(&url, &FetchMsg::Error(message));
            }
        }
    }

    /// [MIME Sniffing § 7.1](https://mimesniff.spec.whatwg.org/#determining-the-computed-mime-type-of-a-resource)
    ///
    /// The type is known: drop requesters that do not want it, and abort
    /// the fetch if none remain.
    fn on_type(&mut self, url: &str, mime: &str) {
        let ty = self.registry.lookup(mime);
        let Some(entry) = self.in_flight.get_mut(url) else {
            return;
        };
        if entry.content.is_some() {
            warn_once("fetch", &format!("ignoring repeated content type for {url}"));
            return;
        }

        // STEP 1: Every requester that excluded the type gets BADTYPE.
        let (wanted, unwanted): (Vec<_>, Vec<_>) = std::mem::take(&mut entry.requests)
            .into_iter()
            .partition(|r| r.allowed.permits(ty));
        entry.requests = wanted;
        for mut request in unwanted {
            deliver(
                &mut request,
                &FetchMsg::BadType(ty),
                &mut self.store,
                &mut self.resolutions,
            );
        }

        // STEP 2: Nobody wants it; stop the transfer.
        if entry.requests.is_empty() {
            self.abandon(url);
            return;
        }

        // STEP 3: Create the content.
        let handler = self.registry.create(ty);
        match self.store.insert(Content::new(url, ty, handler)) {
            Ok(id) => entry.content = Some(id),
            Err(_) => self.fail(url, &FetchMsg::NoMemory),
        }
    }

    fn on_data(&mut self, url: &str, data: &[u8]) {
        let Some(entry) = self.in_flight.get_mut(url) else {
            return;
        };
        let Some(content) = entry.content.and_then(|id| self.store.get_mut(id)) else {
            self.fail(url, &FetchMsg::Error("data before content type".to_string()));
            return;
        };
        if let Err(e) = content.process_data(data) {
            self.fail(url, &error_msg(&e));
            return;
        }
        content.set_status_message(format!("Received {} bytes", content.size()));
        for request in &mut entry.requests {
            request.bytes += data.len();
            let status = FetchMsg::Status(format!("Received {} bytes", request.bytes));
            deliver(request, &status, &mut self.store, &mut self.resolutions);
        }
    }

    fn on_finished(&mut self, url: &str) {
        let Some(entry) = self.in_flight.get(url) else {
            return;
        };
        let (width, height) = (entry.width, entry.height);
        let Some(id) = entry.content else {
            self.fail(url, &FetchMsg::Error("no content type received".to_string()));
            return;
        };
        let Some(content) = self.store.get_mut(id) else {
            return;
        };
        let ctx = ConvertContext { url, width, height };
        match content.convert(&ctx) {
            Ok(Converted::Done) => self.complete(url),
            Ok(Converted::NeedsStylesheets(urls)) => {
                content.set_status_message(format!("Loading {} stylesheets", urls.len()));
                self.broadcast(url, &FetchMsg::Status(content_status(&self.store, id)));
                self.fetch_stylesheets(id, url, &urls, (width, height));
            }
            Err(e) => self.fail(url, &error_msg(&e)),
        }
    }

    /// Start a CSS-only fetch for each stylesheet `parent` links.
    fn fetch_stylesheets(
        &mut self,
        parent: ContentId,
        referrer: &str,
        urls: &[String],
        (width, height): (i32, i32),
    ) {
        let options = FetchOptions::new(AllowedTypes::CSS, width, height).with_referrer(referrer);
        for (index, sheet_url) in urls.iter().enumerate() {
            // Register the request before starting it: a cached sheet
            // resolves immediately.
            let id = RequestId(self.next_request);
            if let Some(content) = self.store.get_mut(parent) {
                content.pending.push(id);
            }
            let started = self.request(sheet_url, &options, Requester::Dependency { parent, index });
            debug_assert_eq!(started, id);
        }
    }

    /// Apply the outcome of every resolved stylesheet fetch, finishing
    /// documents whose last dependency arrived.
    fn apply_resolutions(&mut self) {
        while let Some(resolution) = self.resolutions.pop_front() {
            let sheet = resolution
                .content
                .and_then(|id| self.store.get(id))
                .and_then(|c| c.handler().stylesheet());
            let Some(parent) = self.store.get_mut(resolution.parent) else {
                // The document went away while the sheet was loading.
                if let Some(css) = resolution.content {
                    self.release(css);
                }
                continue;
            };
            if let Some(css) = resolution.content {
                parent.dependencies.push(css);
            }
            parent.pending.retain(|&r| r != resolution.request);
            if let Err(e) = parent.attach_stylesheet(resolution.index, sheet) {
                let url = parent.url().to_string();
                self.fail(&url, &error_msg(&e));
                continue;
            }
            if parent.pending.is_empty() {
                let url = parent.url().to_string();
                match parent.finish() {
                    Ok(()) => self.complete(&url),
                    Err(e) => self.fail(&url, &error_msg(&e)),
                }
            }
        }
    }

    /// The content for `url` is DONE: index it and hand it to every
    /// requester.
    fn complete(&mut self, url: &str) {
        let Some(mut entry) = self.in_flight.remove(url) else {
            return;
        };
        let Some(id) = entry.content else {
            return;
        };
        if entry.url.cacheable {
            let cancelled = self.store.add_to_index(id);
            self.cancel_all(cancelled);
        }
        if let Some(content) = self.store.get_mut(id) {
            content.set_status_message("Done".to_string());
        }
        let ok = FetchMsg::Ok(id);
        for request in &mut entry.requests {
            deliver(request, &ok, &mut self.store, &mut self.resolutions);
        }
        let cancelled = self.store.evict();
        self.cancel_all(cancelled);
    }

    /// Send `msg` to every requester of `url` without ending the fetch.
    fn broadcast(&mut self, url: &str, msg: &FetchMsg) {
        if let Some(entry) = self.in_flight.get_mut(url) {
            for request in &mut entry.requests {
                deliver(request, msg, &mut self.store, &mut self.resolutions);
            }
        }
    }

    /// End the fetch of `url` with a final `msg` to every requester,
    /// stopping the transport and destroying any partial content.
    fn fail(&mut self, url: &str, msg: &FetchMsg) {
        let Some(mut entry) = self.in_flight.remove(url) else {
            return;
        };
        self.teardown(&entry);
        for request in &mut entry.requests {
            deliver(request, msg, &mut self.store, &mut self.resolutions);
        }
    }

    /// End the fetch of `url` without telling anyone.
    fn abandon(&mut self, url: &str) {
        if let Some(entry) = self.in_flight.remove(url) {
            self.teardown(&entry);
        }
    }

    fn teardown(&mut self, entry: &InFlight) {
        if let Some(handle) = entry.handle {
            let _ = self.handles.remove(&handle);
            self.transport.abort(handle);
        }
        if let Some(id) = entry.content {
            let cancelled = self.store.destroy(id);
            self.cancel_all(cancelled);
        }
    }

    /// Withdraw one request. If it was the last requester of an in-flight
    /// URL the transfer is aborted. Returns `false` if the request had
    /// already completed.
    pub fn cancel(&mut self, request: RequestId) -> bool {
        let Some(url) = self
            .in_flight
            .iter()
            .find(|(_, entry)| entry.requests.iter().any(|r| r.id == request))
            .map(|(url, _)| url.clone())
        else {
            return false;
        };
        if let Some(entry) = self.in_flight.get_mut(&url) {
            entry.requests.retain(|r| r.id != request);
            if entry.requests.is_empty() {
                self.abandon(&url);
            }
        }
        true
    }

    fn cancel_all(&mut self, requests: Vec<RequestId>) {
        for request in requests {
            let _ = self.cancel(request);
        }
    }

    /// A requester is done with `id`.
    pub fn release(&mut self, id: ContentId) {
        let cancelled = self.store.release(id);
        self.cancel_all(cancelled);
    }

    /// Lay out every DONE content someone holds for a new viewport.
    ///
    /// # Errors
    ///
    /// Returns the first layout failure; later contents are still
    /// reformatted.
    pub fn reformat_all(&mut self, width: i32, height: i32) -> Result<(), ContentError> {
        let ids: Vec<ContentId> = self.store.ids().collect();
        let mut result = Ok(());
        for id in ids {
            let Some(content) = self.store.get_mut(id) else {
                continue;
            };
            if content.users() == 0 || content.status() != ContentStatus::Done {
                continue;
            }
            let outcome = content.reformat(width, height);
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }

    /// Abort every fetch (requesters receive an error) and destroy every
    /// content.
    pub fn shutdown(&mut self) {
        let urls: Vec<String> = self.in_flight.keys().cloned().collect();
        for url in urls {
            self.fail(&url, &FetchMsg::Error("fetch aborted".to_string()));
        }
        self.resolutions.clear();
        self.store.clear();
    }
}

impl std::fmt::Debug for FetchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCache")
            .field("store", &self.store)
            .field("in_flight", &self.in_flight.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn content_status(store: &MemoryCache, id: ContentId) -> String {
    store
        .get(id)
        .map(|c| c.status_message().to_string())
        .unwrap_or_default()
}

/// The final message for a content failure. Running out of memory is
/// reported as [`FetchMsg::NoMemory`].
fn error_msg(error: &ContentError) -> FetchMsg {
    match error {
        ContentError::NoMemory => FetchMsg::NoMemory,
        other => FetchMsg::Error(other.to_string()),
    }
}

#[cfg(feature = "fetch-trace")]
fn trace(handle: FetchHandle, url: &str, event: &TransportEvent) {
    match event {
        TransportEvent::Data(data) => eprintln!("[FETCH] {handle:?} {url}: {} bytes", data.len()),
        other => eprintln!("[FETCH] {handle:?} {url}: {other:?}"),
    }
}

#[cfg(not(feature = "fetch-trace"))]
const fn trace(_handle: FetchHandle, _url: &str, _event: &TransportEvent) {}

//! The network side of the fetch cache.
//!
//! A [`Transport`] starts fetches and reports what happens to them as
//! [`TransportEvent`]s, in order: one `Type`, any number of `Data`, then
//! `Finished` or `Error`. Events are collected by [`Transport::poll`]; the
//! cache never sees a transport callback outside its own polling point.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use kestrel_common::net::{self, NetError};

/// Identifies one started fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchHandle(pub u64);

/// Something that happened to a started fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The resource's `Content-Type`, before any data.
    Type(String),
    /// The next chunk of the body.
    Data(Vec<u8>),
    /// The body is complete.
    Finished,
    /// The fetch failed.
    Error(String),
}

/// Starts and aborts fetches and reports their events.
pub trait Transport {
    /// Begin fetching `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetError`] if the fetch cannot even be started.
    fn start(&mut self, url: &str, referrer: Option<&str>) -> Result<FetchHandle, NetError>;

    /// Stop a fetch; no further events are reported for it.
    fn abort(&mut self, handle: FetchHandle);

    /// Drain the events that have arrived since the last poll.
    fn poll(&mut self) -> Vec<(FetchHandle, TransportEvent)>;
}

/// Size of the `Data` events a [`BlockingTransport`] emits.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// MIME type reported when the source does not declare one.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Performs each fetch to completion inside [`Transport::start`] and queues
/// the resulting events.
#[derive(Debug, Default)]
pub struct BlockingTransport {
    next: u64,
    queue: VecDeque<(FetchHandle, TransportEvent)>,
}

impl BlockingTransport {
    /// An idle transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for BlockingTransport {
    fn start(&mut self, url: &str, _referrer: Option<&str>) -> Result<FetchHandle, NetError> {
        let handle = FetchHandle(self.next);
        self.next += 1;
        match net::fetch(url) {
            Ok(resource) => {
                let mime = resource
                    .content_type
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                self.queue.push_back((handle, TransportEvent::Type(mime)));
                for chunk in resource.body.chunks(CHUNK_SIZE) {
                    self.queue
                        .push_back((handle, TransportEvent::Data(chunk.to_vec())));
                }
                self.queue.push_back((handle, TransportEvent::Finished));
            }
            // Failures arrive as an event like any other outcome.
            Err(e) => self.queue.push_back((handle, TransportEvent::Error(e.to_string()))),
        }
        Ok(handle)
    }

    fn abort(&mut self, handle: FetchHandle) {
        self.queue.retain(|(h, _)| *h != handle);
    }

    fn poll(&mut self) -> Vec<(FetchHandle, TransportEvent)> {
        self.queue.drain(..).collect()
    }
}

/// What a [`QueueTransport`] has been asked to do.
#[derive(Debug, Default)]
pub struct TransportLog {
    /// `(handle, url)` for every `start` call.
    pub started: Vec<(FetchHandle, String)>,
    /// Every aborted handle.
    pub aborted: Vec<FetchHandle>,
    pending: VecDeque<(FetchHandle, TransportEvent)>,
}

impl TransportLog {
    /// The handle of the most recent fetch of `url`.
    #[must_use]
    pub fn handle_for(&self, url: &str) -> Option<FetchHandle> {
        self.started
            .iter()
            .rev()
            .find(|(_, u)| u == url)
            .map(|&(h, _)| h)
    }

    /// Number of `start` calls for `url`.
    #[must_use]
    pub fn starts(&self, url: &str) -> usize {
        self.started.iter().filter(|(_, u)| u == url).count()
    }

    /// Queue an event for the next poll.
    pub fn push(&mut self, handle: FetchHandle, event: TransportEvent) {
        self.pending.push_back((handle, event));
    }

    /// Queue a complete successful response.
    pub fn respond(&mut self, handle: FetchHandle, mime: &str, body: &[u8]) {
        self.push(handle, TransportEvent::Type(mime.to_string()));
        self.push(handle, TransportEvent::Data(body.to_vec()));
        self.push(handle, TransportEvent::Finished);
    }
}

/// A scripted transport: records calls and emits only the events a test
/// queues through its shared [`TransportLog`].
#[derive(Debug, Default)]
pub struct QueueTransport {
    next: u64,
    log: Rc<RefCell<TransportLog>>,
}

impl QueueTransport {
    /// A transport and the log that scripts it.
    #[must_use]
    pub fn new() -> (Self, Rc<RefCell<TransportLog>>) {
        let transport = Self::default();
        let log = Rc::clone(&transport.log);
        (transport, log)
    }
}

impl Transport for QueueTransport {
    fn start(&mut self, url: &str, _referrer: Option<&str>) -> Result<FetchHandle, NetError> {
        let handle = FetchHandle(self.next);
        self.next += 1;
        self.log.borrow_mut().started.push((handle, url.to_string()));
        Ok(handle)
    }

    fn abort(&mut self, handle: FetchHandle) {
        let mut log = self.log.borrow_mut();
        log.aborted.push(handle);
        log.pending.retain(|(h, _)| *h != handle);
    }

    fn poll(&mut self) -> Vec<(FetchHandle, TransportEvent)> {
        self.log.borrow_mut().pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_transport_data_url() {
        let mut transport = BlockingTransport::new();
        let handle = transport.start("data:text/css,p%7Bcolor:red%7D", None).unwrap();
        let events = transport.poll();
        assert_eq!(
            events,
            vec![
                (handle, TransportEvent::Type("text/css".to_string())),
                (handle, TransportEvent::Data(b"p{color:red}".to_vec())),
                (handle, TransportEvent::Finished),
            ]
        );
        assert!(transport.poll().is_empty());
    }

    #[test]
    fn test_blocking_transport_reports_errors_as_events() {
        let mut transport = BlockingTransport::new();
        let handle = transport.start("/definitely/not/here.html", None).unwrap();
        let events = transport.poll();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], (h, TransportEvent::Error(_)) if *h == handle));
    }

    #[test]
    fn test_blocking_transport_abort_drops_queued_events() {
        let mut transport = BlockingTransport::new();
        let a = transport.start("data:,a", None).unwrap();
        let b = transport.start("data:,b", None).unwrap();
        transport.abort(a);
        assert!(transport.poll().iter().all(|(h, _)| *h == b));
    }

    #[test]
    fn test_queue_transport_records_calls() {
        let (mut transport, log) = QueueTransport::new();
        let h = transport.start("http://x/a", None).unwrap();
        assert_eq!(log.borrow().handle_for("http://x/a"), Some(h));
        log.borrow_mut().respond(h, "text/plain", b"hi");
        assert_eq!(transport.poll().len(), 3);
        transport.abort(h);
        assert_eq!(log.borrow().aborted, vec![h]);
        assert_eq!(log.borrow().starts("http://x/a"), 1);
    }
}

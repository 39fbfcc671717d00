//! Contents of a type nothing interprets. The bytes are kept as received.

use super::buffer_data;
use crate::content::{ContentError, ContentHandler, ConvertContext, Converted};

/// Handler factory.
#[must_use]
pub fn create() -> Box<dyn ContentHandler> {
    Box::new(OtherContent::default())
}

/// Raw bytes of an uninterpreted content.
#[derive(Default)]
pub struct OtherContent {
    data: Vec<u8>,
}

impl ContentHandler for OtherContent {
    fn process_data(&mut self, data: &[u8]) -> Result<(), ContentError> {
        buffer_data(&mut self.data, data)
    }

    fn convert(&mut self, _ctx: &ConvertContext<'_>) -> Result<Converted, ContentError> {
        Ok(Converted::Done)
    }

    fn destroy(&mut self) {
        self.data = Vec::new();
    }

    fn raw_data(&self) -> Option<&[u8]> {
        Some(&self.data)
    }
}

//! Common utilities for the Kestrel document pipeline.
//!
//! This crate provides shared infrastructure used by all pipeline components:
//! - **Warning System** - colored terminal output for unsupported features
//! - **URL handling** - fragment stripping, cacheability, relative resolution
//! - **Network** - blocking byte fetches for `http(s):`, `file:` and `data:` URLs

pub mod net;
pub mod url;
pub mod warning;

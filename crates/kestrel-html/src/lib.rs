//! Tolerant HTML tokenizer and tree builder for the Kestrel pipeline.
//!
//! # Scope
//!
//! This crate implements enough of
//! [WHATWG § 13.2 Parsing HTML documents](https://html.spec.whatwg.org/multipage/parsing.html)
//! to feed the box builder:
//! - **Tokenizer**: tags, attributes (quoted and unquoted), comments,
//!   DOCTYPE, raw text for `script`/`style`, escapable raw text for
//!   `title`/`textarea`, and the common character references
//! - **Tree builder**: implied `html`/`head`/`body`, head-only elements
//!   routed into `head`, void elements, and the implied end tags for
//!   `p`, `li`, `dt`/`dd`, `option` and table parts
//!
//! # Not Yet Implemented
//!
//! - Foster parenting and the adoption agency algorithm
//! - Foreign content (SVG, MathML)
//! - The full named character reference table

/// HTML tree construction.
pub mod parser;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

pub use parser::{HtmlParser, parse_document};
pub use tokenizer::{Attribute, HtmlTokenizer, Token};

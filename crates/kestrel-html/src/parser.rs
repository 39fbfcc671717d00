use kestrel_common::warning::warn_once;
use kestrel_dom::{DomTree, ElementData, NodeId, NodeType};
use strum_macros::Display;

use crate::tokenizer::{HtmlTokenizer, Token};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// A reduced set of insertion modes: where the next token lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// Nothing but whitespace, comments and DOCTYPE seen so far.
    BeforeHtml,
    /// Tokens go into `head` until body content appears.
    InHead,
    /// Tokens go into the current node under `body`.
    InBody,
}

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements only have a start tag; end tags must not be specified for
/// void elements."
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements allowed in `head`; seen before any body content they go there.
const HEAD_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "title",
];

/// Start tags that close an open `p` element.
///
/// [§ 13.2.6.4.7 "in body"](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody):
/// "If the stack of open elements has a p element in button scope, then
/// close a p element."
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "div", "dl", "fieldset", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "ul",
];

/// Builds a [`DomTree`] from tokens.
///
/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
pub struct HtmlParser {
    tree: DomTree,
    /// "The stack of open elements"
    stack: Vec<NodeId>,
    mode: InsertionMode,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
}

impl HtmlParser {
    /// Create a parser with an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: DomTree::new(),
            stack: Vec::new(),
            mode: InsertionMode::BeforeHtml,
            html: None,
            head: None,
            body: None,
        }
    }

    /// Feed every token and return the finished tree.
    ///
    /// The result always has an `html` element with `head` and `body`
    /// children, as the "in body" insertion mode guarantees for any input.
    #[must_use]
    pub fn run(mut self, tokens: Vec<Token>) -> DomTree {
        for token in tokens {
            match token {
                Token::Doctype { .. } | Token::EndOfFile => {}
                Token::Comment { data } => {
                    let parent = self.current();
                    let _ = self.tree.append(parent, NodeType::Comment(data));
                }
                Token::Text { data } => self.text(data),
                Token::StartTag {
                    name,
                    self_closing,
                    attributes,
                } => {
                    let mut element = ElementData::new(&name);
                    for attr in attributes {
                        let _ = element.add_attr(&attr.name, &attr.value);
                    }
                    self.start_tag(element, self_closing);
                }
                Token::EndTag { name } => self.end_tag(&name),
            }
        }
        let _ = self.ensure_body();
        self.tree
    }

    /// The node new content is appended to.
    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId::ROOT)
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html {
            return html;
        }
        let html = self
            .tree
            .append(NodeId::ROOT, NodeType::Element(ElementData::new("html")));
        self.html = Some(html);
        self.stack = vec![html];
        self.mode = InsertionMode::InHead;
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head {
            return head;
        }
        let html = self.ensure_html();
        let head = self
            .tree
            .append(html, NodeType::Element(ElementData::new("head")));
        self.head = Some(head);
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let _ = self.ensure_head();
        let html = self.ensure_html();
        let body = self
            .tree
            .append(html, NodeType::Element(ElementData::new("body")));
        self.body = Some(body);
        self.stack = vec![html, body];
        self.mode = InsertionMode::InBody;
        body
    }

    fn text(&mut self, data: String) {
        let whitespace_only = data.chars().all(char::is_whitespace);
        let parent = match self.mode {
            InsertionMode::BeforeHtml | InsertionMode::InHead if whitespace_only => return,
            InsertionMode::BeforeHtml => {
                let _ = self.ensure_body();
                self.current()
            }
            InsertionMode::InHead => {
                // Text inside title/style/script stays where it is; anything
                // else starts the body.
                let current = self.current();
                if self.head.is_some_and(|h| self.tree.parent(current) == Some(h)) {
                    current
                } else {
                    let _ = self.ensure_body();
                    self.current()
                }
            }
            InsertionMode::InBody => self.current(),
        };
        let _ = self.tree.append(parent, NodeType::Text(data));
    }

    fn start_tag(&mut self, element: ElementData, self_closing: bool) {
        let name = element.name.clone();
        match name.as_str() {
            "html" => {
                let html = self.ensure_html();
                self.merge_attributes(html, element);
                return;
            }
            "head" => {
                if self.mode != InsertionMode::InBody {
                    let head = self.ensure_head();
                    self.merge_attributes(head, element);
                }
                return;
            }
            "body" => {
                let body = self.ensure_body();
                self.merge_attributes(body, element);
                return;
            }
            _ => {}
        }

        let parent = if self.mode != InsertionMode::InBody && HEAD_ELEMENTS.contains(&name.as_str()) {
            let head = self.ensure_head();
            self.stack.truncate(1);
            self.stack.push(head);
            head
        } else {
            let _ = self.ensure_body();
            self.close_implied(&name);
            self.current()
        };

        let id = self.tree.append(parent, NodeType::Element(element));
        if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.stack.push(id);
        }
    }

    /// Pop elements whose end tags are implied by the start tag `name`.
    fn close_implied(&mut self, name: &str) {
        if CLOSES_P.contains(&name) {
            self.close_within("p", &["div", "td", "th", "li", "table", "body"]);
        }
        match name {
            "li" => self.close_within("li", &["ul", "ol", "body"]),
            "dt" | "dd" => {
                self.close_within("dt", &["dl", "body"]);
                self.close_within("dd", &["dl", "body"]);
            }
            "option" => self.close_within("option", &["select", "body"]),
            "tr" => {
                self.close_within("td", &["table"]);
                self.close_within("th", &["table"]);
                self.close_within("tr", &["table"]);
            }
            "td" | "th" => {
                self.close_within("td", &["tr", "table"]);
                self.close_within("th", &["tr", "table"]);
            }
            "thead" | "tbody" | "tfoot" => {
                for open in ["td", "th", "tr", "thead", "tbody", "tfoot"] {
                    self.close_within(open, &["table"]);
                }
            }
            _ => {}
        }
    }

    /// If an element named `target` is open above any of the `boundaries`,
    /// pop everything up to and including it.
    fn close_within(&mut self, target: &str, boundaries: &[&str]) {
        for depth in (0..self.stack.len()).rev() {
            let Some(tag) = self.tag_at(depth) else { continue };
            if tag == target {
                self.stack.truncate(depth);
                return;
            }
            if boundaries.contains(&tag) {
                return;
            }
        }
    }

    fn tag_at(&self, depth: usize) -> Option<&str> {
        let id = *self.stack.get(depth)?;
        self.tree.element(id).map(|e| e.name.as_str())
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "html" | "body" => return,
            "head" => {
                if self.mode == InsertionMode::InHead {
                    self.stack.truncate(1);
                }
                return;
            }
            // "An end tag whose tag name is "br": Parse error. Drop the
            // attributes from the token, and act as described in the next
            // entry; i.e. act as if this was a "br" start tag token"
            "br" => {
                self.start_tag(ElementData::new("br"), true);
                return;
            }
            _ => {}
        }

        // The root html element is never popped.
        for depth in (1..self.stack.len()).rev() {
            if self.tag_at(depth) == Some(name) {
                self.stack.truncate(depth);
                return;
            }
        }
        warn_once("HTML", &format!("unmatched end tag </{name}> {}", self.mode));
    }

    /// "For each attribute on the token, check to see if the attribute is
    /// already present on the top element of the stack of open elements. If
    /// it is not, add the attribute and its corresponding value to that
    /// element."
    fn merge_attributes(&mut self, target: NodeId, element: ElementData) {
        if let Some(existing) = self.tree.element_mut(target) {
            for attr in element.attributes {
                let _ = existing.add_attr(&attr.name, &attr.value);
            }
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize and parse `input` into a [`DomTree`].
#[must_use]
pub fn parse_document(input: &str) -> DomTree {
    let tokens = HtmlTokenizer::new(input).run();
    HtmlParser::new().run(tokens)
}

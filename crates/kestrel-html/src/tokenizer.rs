use strum_macros::Display;

/// An attribute on a start tag token.
///
/// Per [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
/// "a list of attributes, each of which has a name and a value"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// "each of which has a name"
    pub name: String,
    /// "and a value"
    pub value: String,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "The output of the tokenization step is a series of zero or more of the
/// following tokens: DOCTYPE, start tag, end tag, comment, character,
/// end-of-file."
///
/// Consecutive characters are coalesced into one [`Token::Text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A DOCTYPE; only its name is kept.
    Doctype {
        /// "a name"
        name: String,
    },
    /// "Start and end tag tokens have a tag name, a self-closing flag, and a
    /// list of attributes"
    StartTag {
        /// "a tag name", lower-cased
        name: String,
        /// "a self-closing flag"
        self_closing: bool,
        /// "a list of attributes"
        attributes: Vec<Attribute>,
    },
    /// An end tag; attributes on end tags are dropped.
    EndTag {
        /// "a tag name", lower-cased
        name: String,
    },
    /// "Comment and character tokens have data."
    Comment {
        /// "data"
        data: String,
    },
    /// A run of character tokens with references decoded.
    Text {
        /// "data"
        data: String,
    },
    /// End-of-file token signals the end of input.
    EndOfFile,
}

/// The content model the tokenizer is currently in.
///
/// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state),
/// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state),
/// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state)
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TokenizerState {
    /// Normal markup.
    Data,
    /// Text up to the matching end tag, no character references.
    RawText(String),
    /// Text up to the matching end tag, character references decoded.
    Rcdata(String),
}

/// Elements whose content is raw text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "noscript"];

/// Elements whose content is escapable raw text.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

/// Converts an input string into a list of [`Token`]s.
pub struct HtmlTokenizer<'a> {
    input: &'a str,
    pos: usize,
    state: TokenizerState,
    tokens: Vec<Token>,
}

impl<'a> HtmlTokenizer<'a> {
    /// Create a tokenizer over `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            state: TokenizerState::Data,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input. The last token is always [`Token::EndOfFile`].
    #[must_use]
    pub fn run(mut self) -> Vec<Token> {
        while self.pos < self.input.len() {
            match std::mem::replace(&mut self.state, TokenizerState::Data) {
                TokenizerState::Data => self.data_state(),
                TokenizerState::RawText(end) => self.raw_text(&end, false),
                TokenizerState::Rcdata(end) => self.raw_text(&end, true),
            }
        }
        self.tokens.push(Token::EndOfFile);
        self.tokens
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    fn data_state(&mut self) {
        let rest = self.rest();
        let Some(lt) = rest.find('<') else {
            self.emit_text(&decode_character_references(rest));
            self.pos = self.input.len();
            return;
        };
        if lt > 0 {
            self.emit_text(&decode_character_references(&rest[..lt]));
            self.pos += lt;
            return;
        }

        let after = &rest[1..];
        if let Some(body) = after.strip_prefix("!--") {
            // [§ 13.2.5.43 Comment start state]
            let (data, consumed) = body
                .find("-->")
                .map_or((body, body.len()), |end| (&body[..end], end + 3));
            self.tokens.push(Token::Comment {
                data: data.to_string(),
            });
            self.pos += 4 + consumed;
        } else if let Some(body) = after.strip_prefix('!').or_else(|| after.strip_prefix('?')) {
            // DOCTYPE and bogus comments both run to the next '>'.
            let end = body.find('>').unwrap_or(body.len());
            let text = body[..end].trim();
            if text.get(..7).is_some_and(|t| t.eq_ignore_ascii_case("doctype")) {
                self.tokens.push(Token::Doctype {
                    name: text.get(7..).unwrap_or_default().trim().to_ascii_lowercase(),
                });
            } else {
                self.tokens.push(Token::Comment {
                    data: text.to_string(),
                });
            }
            self.pos += 2 + (end + 1).min(body.len());
        } else if let Some(body) = after.strip_prefix('/') {
            if body.starts_with(|c: char| c.is_ascii_alphabetic()) {
                let end = body.find('>').unwrap_or(body.len());
                let name_end = body[..end]
                    .find(|c: char| c.is_ascii_whitespace() || c == '/')
                    .unwrap_or(end);
                self.tokens.push(Token::EndTag {
                    name: body[..name_end].to_ascii_lowercase(),
                });
                self.pos += 2 + (end + 1).min(body.len());
            } else {
                // "</>" and "</ " are parse errors; treat as text.
                self.emit_text("</");
                self.pos += 2;
            }
        } else if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.start_tag();
        } else {
            self.emit_text("<");
            self.pos += 1;
        }
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    /// through the attribute states.
    fn start_tag(&mut self) {
        let bytes = self.input.as_bytes();
        let mut i = self.pos + 1;
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    i += 1;
                    if bytes.get(i) == Some(&b'>') {
                        self_closing = true;
                        i += 1;
                        break;
                    }
                }
                _ => {
                    let attr_start = i;
                    while i < bytes.len()
                        && !bytes[i].is_ascii_whitespace()
                        && !matches!(bytes[i], b'=' | b'>' | b'/')
                    {
                        i += 1;
                    }
                    let attr_name = self.input[attr_start..i].to_ascii_lowercase();
                    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    let mut value = String::new();
                    if bytes.get(i) == Some(&b'=') {
                        i += 1;
                        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                            i += 1;
                        }
                        match bytes.get(i) {
                            Some(&quote @ (b'"' | b'\'')) => {
                                let start = i + 1;
                                let end = self.input[start..]
                                    .find(char::from(quote))
                                    .map_or(bytes.len(), |e| start + e);
                                value = decode_character_references(&self.input[start..end]);
                                i = (end + 1).min(bytes.len());
                            }
                            _ => {
                                let start = i;
                                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                                    i += 1;
                                }
                                value = decode_character_references(&self.input[start..i]);
                            }
                        }
                    }
                    // "If there is already an attribute on the token with the
                    // exact same name, then this is a duplicate-attribute
                    // parse error and the new attribute must be removed."
                    if !attr_name.is_empty() && !attributes.iter().any(|a| a.name == attr_name) {
                        attributes.push(Attribute {
                            name: attr_name,
                            value,
                        });
                    }
                }
            }
        }
        self.pos = i;

        if !self_closing {
            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                self.state = TokenizerState::RawText(name.clone());
            } else if RCDATA_ELEMENTS.contains(&name.as_str()) {
                self.state = TokenizerState::Rcdata(name.clone());
            }
        }
        self.tokens.push(Token::StartTag {
            name,
            self_closing,
            attributes,
        });
    }

    /// Consume text up to `</end`, emitting it as one text token.
    fn raw_text(&mut self, end: &str, decode: bool) {
        let rest = self.rest();
        let lower = rest.to_ascii_lowercase();
        let needle = format!("</{end}");
        let stop = lower.find(&needle).unwrap_or(rest.len());
        let text = &rest[..stop];
        if decode {
            self.emit_text(&decode_character_references(text));
        } else {
            self.emit_text(text);
        }
        self.pos += stop;
    }

    fn emit_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Token::Text { data }) = self.tokens.last_mut() {
            data.push_str(text);
        } else {
            self.tokens.push(Token::Text {
                data: text.to_string(),
            });
        }
    }
}

/// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
///
/// Decodes numeric references and the handful of named references common in
/// real documents. Unknown references are left untouched.
#[must_use]
pub fn decode_character_references(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let reference = rest[1..]
            .find(';')
            .filter(|&semi| semi <= 10)
            .map(|semi| (&rest[1..=semi], semi + 2));
        let decoded = reference.and_then(|(name, len)| lookup_reference(name).map(|c| (c, len)));
        if let Some((c, len)) = decoded {
            out.push(c);
            rest = &rest[len..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

fn lookup_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        // "If the number is 0x00 ... or is a surrogate ... set the character
        // reference code to 0xFFFD."
        return Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'));
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{A0}',
        "copy" => '©',
        "reg" => '®',
        "mdash" => '—',
        "ndash" => '–',
        "hellip" => '…',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display_names() {
        assert_eq!(TokenizerState::Data.to_string(), "Data");
        assert_eq!(TokenizerState::RawText("style".into()).to_string(), "RawText");
    }

    #[test]
    fn test_decode_references() {
        assert_eq!(decode_character_references("a &amp; b"), "a & b");
        assert_eq!(decode_character_references("&#65;&#x42;"), "AB");
        assert_eq!(decode_character_references("&bogus; & x"), "&bogus; & x");
    }
}

//! Pull-based XML token stream.
//!
//! [`TokenReader`] turns `quick-xml` events into [`Token`]s: element starts
//! with their attributes, element ends, and character data. Adjacent text
//! and entity references are merged into one text token, whitespace-only
//! text between elements is dropped, and namespace declarations are not
//! reported as attributes. Names are local names.

use crate::error::{Result, XmlGraphError};
use crate::xml::utils::{is_namespace_declaration, is_whitespace_only};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::io::BufRead;

/// Kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An element was opened.
    StartElement,
    /// An element was closed.
    EndElement,
    /// Character data.
    Text,
    /// A CDATA section.
    CData,
}

/// One unit of the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What happened.
    pub kind: TokenKind,
    /// Local name of the element; for text, the enclosing element.
    pub name: String,
    /// Character data; empty for element tokens.
    pub value: String,
    /// Nesting depth of the element (root = 0); for text, the enclosing
    /// element's depth.
    pub depth: usize,
    /// Attributes of a start element, by local name.
    pub attributes: Vec<(String, String)>,
}

impl Token {
    /// Returns the value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true for text and CDATA tokens.
    pub fn is_character_data(&self) -> bool {
        matches!(self.kind, TokenKind::Text | TokenKind::CData)
    }
}

/// Pull reader over a token stream.
pub trait XmlRead {
    /// Returns the next token, or `None` at the end of the document.
    fn next_token(&mut self) -> Result<Option<Token>>;
}

/// [`XmlRead`] implementation over a `quick-xml` [`Reader`].
pub struct TokenReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<String>,
    lookahead: Option<Event<'static>>,
}

impl<R: BufRead> TokenReader<R> {
    /// Creates a token reader over buffered input.
    pub fn new(input: R) -> Self {
        Self::from_reader(Reader::from_reader(input))
    }

    fn from_reader(mut reader: Reader<R>) -> Self {
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            open: Vec::new(),
            lookahead: None,
        }
    }

    fn read_event(&mut self) -> Result<Event<'static>> {
        if let Some(event) = self.lookahead.take() {
            return Ok(event);
        }
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
        Ok(event)
    }

    fn start_token(&mut self, start: &BytesStart<'_>) -> Result<Token> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            if is_namespace_declaration(attr.key.as_ref()) {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&raw)?.into_owned();
            attributes.push((key, value));
        }
        let token = Token {
            kind: TokenKind::StartElement,
            name: name.clone(),
            value: String::new(),
            depth: self.open.len(),
            attributes,
        };
        self.open.push(name);
        Ok(token)
    }

    fn character_data(&self, kind: TokenKind, value: String) -> Token {
        Token {
            kind,
            name: self.open.last().cloned().unwrap_or_default(),
            value,
            depth: self.open.len().saturating_sub(1),
            attributes: Vec::new(),
        }
    }

    /// Reads text and entity references up to the next other event.
    fn collect_text(&mut self, first: Event<'static>) -> Result<String> {
        let mut text = String::new();
        let mut event = first;
        loop {
            match event {
                Event::Text(raw) => {
                    let raw = String::from_utf8_lossy(&raw);
                    text.push_str(&unescape(&raw)?);
                }
                Event::GeneralRef(reference) => {
                    let name = String::from_utf8_lossy(&reference);
                    text.push_str(&unescape(&format!("&{};", name))?);
                }
                other => {
                    self.lookahead = Some(other);
                    return Ok(text);
                }
            }
            event = self.read_event()?;
        }
    }
}

impl<'a> TokenReader<&'a [u8]> {
    /// Creates a token reader over an in-memory document.
    pub fn from_slice(xml: &'a [u8]) -> Self {
        Self::from_reader(Reader::from_reader(xml))
    }
}

impl<R: BufRead> XmlRead for TokenReader<R> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            let event = self.read_event()?;
            match event {
                Event::Start(start) => return self.start_token(&start).map(Some),
                Event::Empty(start) => {
                    let token = self.start_token(&start)?;
                    self.lookahead = Some(Event::End(BytesEnd::new(token.name.clone())));
                    return Ok(Some(token));
                }
                Event::End(_) => {
                    let name = self.open.pop().ok_or_else(|| {
                        XmlGraphError::Custom("closing tag without matching start".to_string())
                    })?;
                    return Ok(Some(Token {
                        kind: TokenKind::EndElement,
                        name,
                        value: String::new(),
                        depth: self.open.len(),
                        attributes: Vec::new(),
                    }));
                }
                Event::Text(_) | Event::GeneralRef(_) => {
                    let text = self.collect_text(event)?;
                    if text.is_empty() || is_whitespace_only(&text) {
                        continue;
                    }
                    return Ok(Some(self.character_data(TokenKind::Text, text)));
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    return Ok(Some(self.character_data(TokenKind::CData, value)));
                }
                Event::Eof => {
                    if let Some(name) = self.open.last() {
                        return Err(XmlGraphError::Custom(format!(
                            "unexpected end of document inside <{}>",
                            name
                        )));
                    }
                    return Ok(None);
                }
                _ => continue,
            }
        }
    }
}

/// Replays a single `<name>text</name>` element.
pub(crate) struct ScalarTokens {
    tokens: std::vec::IntoIter<Token>,
}

impl ScalarTokens {
    pub(crate) fn new(name: &str, text: &str) -> Self {
        let element = |kind: TokenKind| Token {
            kind,
            name: name.to_string(),
            value: String::new(),
            depth: 0,
            attributes: Vec::new(),
        };
        let mut tokens = vec![element(TokenKind::StartElement)];
        if !text.is_empty() {
            tokens.push(Token {
                value: text.to_string(),
                ..element(TokenKind::Text)
            });
        }
        tokens.push(element(TokenKind::EndElement));
        Self {
            tokens: tokens.into_iter(),
        }
    }
}

impl XmlRead for ScalarTokens {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Ok(self.tokens.next())
    }
}

/// Concatenates all character data up to the end of the current element.
///
/// Meant for converters that read scalar content: called before the root
/// element, it returns the root's text and consumes the document.
pub fn read_text(reader: &mut dyn XmlRead) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    while let Some(token) = reader.next_token()? {
        match token.kind {
            TokenKind::StartElement => depth += 1,
            TokenKind::EndElement => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            TokenKind::Text | TokenKind::CData => text.push_str(&token.value),
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(xml: &str) -> Vec<Token> {
        let mut reader = TokenReader::from_slice(xml.as_bytes());
        let mut out = Vec::new();
        while let Some(token) = reader.next_token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn test_start_end_and_depth() {
        let tokens = tokens(r#"<?xml version="1.0"?><Person id="7"><Name>Ann</Name></Person>"#);
        let kinds: Vec<_> = tokens.iter().map(|t| (t.kind, t.name.as_str(), t.depth)).collect();
        assert_eq!(
            kinds,
            vec![
                (TokenKind::StartElement, "Person", 0),
                (TokenKind::StartElement, "Name", 1),
                (TokenKind::Text, "Name", 1),
                (TokenKind::EndElement, "Name", 1),
                (TokenKind::EndElement, "Person", 0),
            ]
        );
        assert_eq!(tokens[0].attribute("id"), Some("7"));
        assert_eq!(tokens[2].value, "Ann");
    }

    #[test]
    fn test_empty_elements_are_expanded() {
        let tokens = tokens("<a><b/></a>");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].kind, TokenKind::StartElement);
        assert_eq!(tokens[2].kind, TokenKind::EndElement);
        assert_eq!(tokens[2].name, "b");
    }

    #[test]
    fn test_entities_are_merged_into_text() {
        let tokens = tokens("<a>fish &amp; chips &#x41;</a>");
        assert_eq!(tokens[1].kind, TokenKind::Text);
        assert_eq!(tokens[1].value, "fish & chips A");
    }

    #[test]
    fn test_whitespace_dropped_and_cdata_kept() {
        let tokens = tokens("<a>\n  <b><![CDATA[  ]]></b>\n</a>");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::StartElement,
                TokenKind::StartElement,
                TokenKind::CData,
                TokenKind::EndElement,
                TokenKind::EndElement,
            ]
        );
        assert_eq!(tokens[2].value, "  ");
    }

    #[test]
    fn test_namespaces_use_local_names() {
        let tokens = tokens(r#"<o:order xmlns:o="urn:o" o:id="1" note="a&lt;b"/>"#);
        assert_eq!(tokens[0].name, "order");
        assert_eq!(
            tokens[0].attributes,
            vec![
                ("id".to_string(), "1".to_string()),
                ("note".to_string(), "a<b".to_string())
            ]
        );
    }

    #[test]
    fn test_read_text() {
        let mut reader = TokenReader::from_slice(b"<when>20240301T102030Z</when>");
        assert_eq!(read_text(&mut reader).unwrap(), "20240301T102030Z");
    }

    #[test]
    fn test_scalar_tokens_replay() {
        let mut tokens = ScalarTokens::new("when", "x < y");
        assert_eq!(read_text(&mut tokens).unwrap(), "x < y");
        assert!(tokens.next_token().unwrap().is_none());
    }

    #[test]
    fn test_truncated_document() {
        let mut reader = TokenReader::from_slice(b"<a><b>");
        let mut result = Ok(None);
        for _ in 0..3 {
            result = reader.next_token();
            if result.is_err() {
                break;
            }
        }
        assert!(result.is_err());
    }
}

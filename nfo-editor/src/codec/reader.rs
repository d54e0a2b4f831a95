//! Event-driven document reader
//!
//! Wraps `quick_xml::Reader` with the checks the codec needs on top of the
//! tokenizer: a single root element, no unclosed elements at EOF, no content
//! after the root, valid attributes and entity references. Byte offsets from
//! the tokenizer are turned into 1-based line/column positions.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::ParseError;

/// Text content of one element
#[derive(Debug, Default)]
pub(crate) struct Content {
    /// Text and CDATA before the first nested child, unescaped
    pub text: String,
    /// Direct children as `(name, text)` when collected
    pub children: Vec<(String, String)>,
}

/// Root element as seen by the reader
pub(crate) enum RootStart {
    /// `<root ...>` with content to follow
    Open(String),
    /// `<root/>`
    Empty(String),
}

pub(crate) struct DocReader<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
}

impl<'a> DocReader<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = true;
        config.expand_empty_elements = false;
        Self { source, reader }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Byte offset just past the last consumed event
    pub fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Offset of the `<` that opens markup read from `before`
    pub fn markup_start(&self, before: usize) -> usize {
        let bytes = self.source.as_bytes();
        if bytes.get(before) == Some(&b'<') {
            before
        } else {
            self.source[..before.min(self.source.len())]
                .rfind('<')
                .unwrap_or(before)
        }
    }

    pub fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let (line, column) = line_column(self.source, offset);
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    fn tokenizer_error(&self, err: impl std::fmt::Display) -> ParseError {
        self.error_at(self.reader.error_position() as usize, err.to_string())
    }

    /// Next event with attribute validation applied to element starts
    pub fn next(&mut self) -> Result<Event<'a>, ParseError> {
        let event = match self.reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(self.tokenizer_error(e)),
        };
        if let Event::Start(ref start) | Event::Empty(ref start) = event {
            self.check_attributes(start)?;
        }
        Ok(event)
    }

    fn check_attributes(&self, start: &BytesStart<'_>) -> Result<(), ParseError> {
        for attr in start.attributes() {
            if let Err(e) = attr {
                return Err(self.error_at(self.position(), e.to_string()));
            }
        }
        Ok(())
    }

    fn text_of(&self, event: &Event<'_>) -> Result<Option<String>, ParseError> {
        match event {
            Event::Text(text) => text
                .unescape()
                .map(|s| Some(s.into_owned()))
                .map_err(|e| self.error_at(self.position(), e.to_string())),
            Event::CData(cdata) => Ok(Some(String::from_utf8_lossy(cdata).into_owned())),
            _ => Ok(None),
        }
    }

    /// Skip the prolog and return the root element
    ///
    /// With `allow_prolog` false only whitespace and comments may precede
    /// the root (used for stand-alone fragments).
    pub fn read_root(&mut self, allow_prolog: bool) -> Result<RootStart, ParseError> {
        loop {
            let before = self.position();
            let event = self.next()?;
            match event {
                Event::Start(ref start) => return Ok(RootStart::Open(name_of(start))),
                Event::Empty(ref start) => return Ok(RootStart::Empty(name_of(start))),
                Event::Text(ref text) => {
                    if !is_blank(text) {
                        return Err(self.error_at(before, "Start tag expected, '<' not found"));
                    }
                }
                Event::Decl(_) | Event::DocType(_) | Event::PI(_) if !allow_prolog => {
                    return Err(self.error_at(before, "Unexpected declaration before element"));
                }
                Event::Eof => {
                    return Err(self.error_at(before, "Document is empty"));
                }
                Event::CData(_) => {
                    return Err(self.error_at(before, "Start tag expected, '<' not found"));
                }
                _ => {}
            }
        }
    }

    /// Consume events up to the end tag of an element whose start was just read
    ///
    /// Nested content is fully tokenized (and so checked) even when it is
    /// not collected.
    pub fn read_content(&mut self, collect_children: bool) -> Result<Content, ParseError> {
        let mut content = Content::default();
        let mut depth = 0usize;
        let mut text_done = false;
        // (name, text, text_done) for the direct child being read
        let mut child: Option<(String, String, bool)> = None;

        loop {
            let before = self.position();
            let event = self.next()?;
            match event {
                Event::Start(ref start) => {
                    if depth == 0 {
                        text_done = true;
                        if collect_children {
                            child = Some((name_of(start), String::new(), false));
                        }
                    } else if depth == 1 {
                        if let Some(c) = child.as_mut() {
                            c.2 = true;
                        }
                    }
                    depth += 1;
                }
                Event::Empty(ref start) => {
                    if depth == 0 {
                        text_done = true;
                        if collect_children {
                            content.children.push((name_of(start), String::new()));
                        }
                    } else if depth == 1 {
                        if let Some(c) = child.as_mut() {
                            c.2 = true;
                        }
                    }
                }
                Event::End(_) => {
                    if depth == 0 {
                        return Ok(content);
                    }
                    depth -= 1;
                    if depth == 0 {
                        if let Some((name, text, _)) = child.take() {
                            content.children.push((name, text));
                        }
                    }
                }
                Event::Eof => {
                    return Err(self.error_at(before, "Premature end of data, tag not closed"));
                }
                ref other => {
                    self.reject_prolog(other, before)?;
                    if let Some(text) = self.text_of(other)? {
                        if depth == 0 && !text_done {
                            content.text.push_str(&text);
                        } else if depth == 1 {
                            if let Some(c) = child.as_mut() {
                                if !c.2 {
                                    c.1.push_str(&text);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Validate text and entities at root level, returning nothing
    pub fn check_text(&self, event: &Event<'_>, before: usize) -> Result<(), ParseError> {
        self.reject_prolog(event, before)?;
        self.text_of(event).map(|_| ())
    }

    /// XML declarations and doctypes belong before the root only
    fn reject_prolog(&self, event: &Event<'_>, before: usize) -> Result<(), ParseError> {
        match event {
            Event::Decl(_) => Err(self.error_at(
                before,
                "XML declaration allowed only at the start of the document",
            )),
            Event::DocType(_) => {
                Err(self.error_at(before, "DOCTYPE allowed only before the root element"))
            }
            _ => Ok(()),
        }
    }

    /// Require that nothing but whitespace, comments and PIs follow the root
    pub fn read_trailing(&mut self) -> Result<(), ParseError> {
        loop {
            let before = self.position();
            match self.next()? {
                Event::Eof => return Ok(()),
                Event::Text(ref text) if is_blank(text) => {}
                Event::Comment(_) | Event::PI(_) => {}
                _ => {
                    return Err(self.error_at(before, "Extra content at the end of the document"));
                }
            }
        }
    }
}

pub(crate) fn name_of(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

/// 1-based line and column of a byte offset
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let prefix = &source[..offset];
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = prefix[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let text = "ab\ncd\nef";
        assert_eq!(line_column(text, 0), (1, 1));
        assert_eq!(line_column(text, 4), (2, 2));
        assert_eq!(line_column(text, 6), (3, 1));
        assert_eq!(line_column(text, 100), (3, 3));
    }

    #[test]
    fn test_read_content_collects_children() {
        let mut doc =
            DocReader::new("<actor><name>A &amp; B</name><order>2</order><thumb/></actor>");
        assert!(matches!(doc.read_root(true).unwrap(), RootStart::Open(ref n) if n == "actor"));
        let content = doc.read_content(true).unwrap();
        assert_eq!(
            content.children,
            vec![
                ("name".to_string(), "A & B".to_string()),
                ("order".to_string(), "2".to_string()),
                ("thumb".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_text_stops_at_first_child() {
        let mut doc = DocReader::new("<plot>  lead <b>bold</b> tail</plot>");
        doc.read_root(true).unwrap();
        let content = doc.read_content(false).unwrap();
        assert_eq!(content.text, "  lead ");
    }

    #[test]
    fn test_declaration_inside_element_is_error() {
        let mut doc = DocReader::new("<set><?xml version=\"1.0\"?><name>x</name></set>");
        doc.read_root(true).unwrap();
        let err = doc.read_content(false).unwrap_err();
        assert!(err.message.contains("XML declaration"));
    }

    #[test]
    fn test_unclosed_root_is_error() {
        let mut doc = DocReader::new("<movie><title>x</title>");
        doc.read_root(true).unwrap();
        assert!(doc.read_content(false).is_err());
    }
}

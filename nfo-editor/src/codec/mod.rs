//! Sidecar document codec
//!
//! Converts between `.nfo` XML text and [`Record`]. Recognised top-level
//! children map to typed fields; every other top-level element is kept as
//! the exact source text of that element and written back on serialize.
//!
//! Documented asymmetries:
//! - an empty scalar is written as an absent element, so `<studio></studio>`
//!   round-trips to no `<studio>` at all
//! - preserved elements are grouped by tag name after the known fields, so
//!   their position relative to known fields is not kept
//! - a preserved fragment that is not well-formed at serialize time is
//!   dropped with a warning

mod reader;
mod writer;

use std::fmt;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use thiserror::Error;
use tracing::debug;

use crate::models::{Actor, Kind, Record};
use reader::{name_of, DocReader, RootStart};

pub use writer::xml_escape;

/// Malformed document, with the 1-based position of the problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid XML: {} (line {}, column {})",
            self.message, self.line, self.column
        )
    }
}

impl std::error::Error for ParseError {}

/// Codec failures
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Missing, unreadable or unwritable file
    #[error("{message}")]
    File { path: PathBuf, message: String },
}

impl CodecError {
    fn file(path: &Path, message: impl Into<String>) -> Self {
        CodecError::File {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Determine the document kind from the root element name
///
/// The whole document must be well-formed.
pub fn detect_kind(text: &str) -> Result<Kind, CodecError> {
    let mut doc = DocReader::new(strip_bom(text));
    let name = match doc.read_root(true)? {
        RootStart::Open(name) => {
            doc.read_content(false)?;
            name
        }
        RootStart::Empty(name) => name,
    };
    doc.read_trailing()?;
    Ok(Kind::from_root_tag(&name.to_lowercase()))
}

/// Parse a complete document
pub fn parse(text: &str) -> Result<Record, CodecError> {
    let mut doc = DocReader::new(strip_bom(text));

    let root = doc.read_root(true)?;
    let (name, open) = match root {
        RootStart::Open(name) => (name, true),
        RootStart::Empty(name) => (name, false),
    };
    let mut record = Record::new(Kind::from_root_tag(&name.to_lowercase()));

    if open {
        read_children(&mut doc, &mut record)?;
    }
    doc.read_trailing()?;

    debug!(
        kind = ?record.kind,
        extra_tags = record.extra.len(),
        "Parsed document"
    );
    Ok(record)
}

fn read_children(doc: &mut DocReader<'_>, record: &mut Record) -> Result<(), ParseError> {
    loop {
        let before = doc.position();
        let event = doc.next()?;
        match event {
            Event::Start(ref start) => {
                let tag = name_of(start);
                let start_at = doc.markup_start(before);
                if tag == "actor" {
                    let content = doc.read_content(true)?;
                    record.cast.push(actor_from(content.children));
                } else {
                    let content = doc.read_content(false)?;
                    if !assign_known(record, &tag, content.text) {
                        let fragment = &doc.source()[start_at..doc.position()];
                        record.push_extra(tag, fragment);
                    }
                }
            }
            Event::Empty(ref start) => {
                let tag = name_of(start);
                if tag == "actor" {
                    record.cast.push(Actor::default());
                } else if !assign_known(record, &tag, String::new()) {
                    let start_at = doc.markup_start(before);
                    let fragment = &doc.source()[start_at..doc.position()];
                    record.push_extra(tag, fragment);
                }
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(doc.error_at(before, "Premature end of data, tag not closed"));
            }
            ref other => doc.check_text(other, before)?,
        }
    }
}

/// Store a recognised child; false when `tag` is not a known field
fn assign_known(record: &mut Record, tag: &str, text: String) -> bool {
    let slot = match tag {
        "title" => &mut record.title,
        "originaltitle" => &mut record.original_title,
        "year" => &mut record.year,
        "plot" => &mut record.plot,
        "runtime" => &mut record.runtime,
        "studio" => &mut record.studio,
        "rating" => &mut record.rating,
        "poster" => &mut record.poster_path,
        "fanart" => &mut record.fanart_path,
        "season" => &mut record.season,
        "episode" => &mut record.episode,
        "aired" => &mut record.aired,
        "genre" => {
            record.genres.push(text);
            return true;
        }
        "director" => {
            record.directors.push(text);
            return true;
        }
        _ => return false,
    };
    *slot = text;
    true
}

fn actor_from(children: Vec<(String, String)>) -> Actor {
    let mut actor = Actor::default();
    for (name, text) in children {
        match name.as_str() {
            "name" => actor.name = text,
            "role" => actor.role = text,
            "thumb" => actor.thumb = text,
            "order" => actor.order = text.trim().parse().unwrap_or(0),
            _ => {}
        }
    }
    actor
}

/// Check that `fragment` is exactly one well-formed element
pub fn check_fragment(fragment: &str) -> Result<(), ParseError> {
    let mut doc = DocReader::new(fragment);
    if let RootStart::Open(_) = doc.read_root(false)? {
        doc.read_content(false)?;
    }
    doc.read_trailing()
}

/// Serialize a record to document text
pub fn serialize(record: &Record) -> String {
    writer::write_record(record)
}

/// Read a document as text: UTF-8, falling back to Latin-1
pub fn read_document(path: &Path) -> Result<String, CodecError> {
    if !path.exists() {
        return Err(CodecError::file(
            path,
            format!("File not found: {}", path.display()),
        ));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| CodecError::file(path, format!("Cannot read file: {}", e)))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!(path = %path.display(), "Not UTF-8, decoding as Latin-1");
            Ok(e.into_bytes().into_iter().map(char::from).collect())
        }
    }
}

/// Read and parse a file
pub fn load_file(path: &Path) -> Result<Record, CodecError> {
    parse(&read_document(path)?)
}

/// Read a file and determine its kind
pub fn detect_kind_from_file(path: &Path) -> Result<Kind, CodecError> {
    detect_kind(&read_document(path)?)
}

/// Serialize and write a record, replacing the file
pub fn save_file(record: &Record, path: &Path) -> Result<(), CodecError> {
    std::fs::write(path, serialize(record))
        .map_err(|e| CodecError::file(path, format!("Cannot write file: {}", e)))
}

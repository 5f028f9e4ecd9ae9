//! Bulk Loader Module
//!
//! Turns the decoded text of a backing file into a lazy sequence of entries.

use std::io;
use std::str::FromStr;

use crate::cache::{Entries, Entry, Value};

// == Encoding ==
/// Character encoding of a backing stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1, one byte per char
    Latin1,
}

impl Encoding {
    /// Decodes raw bytes into text.
    pub fn decode(&self, bytes: Vec<u8>) -> io::Result<String> {
        let text = match self {
            Encoding::Utf8 => String::from_utf8(bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        };
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unsupported encoding: {}", other)),
        }
    }
}

// == Bulk Loader ==
/// Decodes a document into the (key, value) pairs it declares.
pub trait BulkLoader {
    /// Short dialect name for logs.
    fn dialect(&self) -> &'static str;

    /// Decodes `text`. A document that cannot be decoded at all is an
    /// `InvalidData` error.
    fn load<'a>(&self, text: &'a str) -> io::Result<Entries<'a>>;
}

// == Properties ==
/// `key=value` lines. Blank lines, `#` comments and lines without `=` are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesLoader;

impl BulkLoader for PropertiesLoader {
    fn dialect(&self) -> &'static str {
        "properties"
    }

    fn load<'a>(&self, text: &'a str) -> io::Result<Entries<'a>> {
        Ok(Box::new(text.lines().filter_map(parse_property)))
    }
}

fn parse_property(line: &str) -> Option<Entry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some(Entry::new(key, value.trim()))
}

// == JSON ==
/// A single top-level JSON object; nested members stay opaque objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl BulkLoader for JsonLoader {
    fn dialect(&self) -> &'static str {
        "json"
    }

    fn load<'a>(&self, text: &'a str) -> io::Result<Entries<'a>> {
        match serde_json::from_str::<serde_json::Value>(text).map_err(io::Error::from)? {
            serde_json::Value::Object(members) => Ok(Box::new(
                members
                    .into_iter()
                    .filter(|(key, _)| !key.is_empty())
                    .map(|(key, value)| Entry::new(key, Value::from(value))),
            )),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "expected a JSON object at the top level",
            )),
        }
    }
}

//! `LIST`/`INFO` metadata.
//!
//! Only a fixed set of INFO tags is understood. Reading skips any other tag;
//! writing rejects keys outside the set.

use core::fmt::{Display, Formatter, Result as FmtResult};
use core::str::FromStr;
use std::io::Write;

use log::{debug, warn};

use crate::{
    error::{WavFileError, WavResult},
    wav::chunks::{ChunkHeader, ChunkID, INFO_LIST, LIST_CHUNK},
};

/// INFO fields that can be read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoKey {
    Track,
    Album,
    Artist,
    Date,
    TrackNumber,
    Comment,
    Genre,
}

impl InfoKey {
    pub const ALL: [InfoKey; 7] = [
        InfoKey::Track,
        InfoKey::Album,
        InfoKey::Artist,
        InfoKey::Date,
        InfoKey::TrackNumber,
        InfoKey::Comment,
        InfoKey::Genre,
    ];

    /// FourCC used inside the INFO list
    pub const fn tag(self) -> ChunkID {
        match self {
            InfoKey::Track => ChunkID::new(b"INAM"),
            InfoKey::Album => ChunkID::new(b"IPRD"),
            InfoKey::Artist => ChunkID::new(b"IART"),
            InfoKey::Date => ChunkID::new(b"ICRD"),
            InfoKey::TrackNumber => ChunkID::new(b"ITRK"),
            InfoKey::Comment => ChunkID::new(b"ICMT"),
            InfoKey::Genre => ChunkID::new(b"IGNR"),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            InfoKey::Track => "track",
            InfoKey::Album => "album",
            InfoKey::Artist => "artist",
            InfoKey::Date => "date",
            InfoKey::TrackNumber => "track_number",
            InfoKey::Comment => "comment",
            InfoKey::Genre => "genre",
        }
    }

    pub fn from_tag(tag: ChunkID) -> Option<Self> {
        InfoKey::ALL.into_iter().find(|key| key.tag() == tag)
    }
}

impl FromStr for InfoKey {
    type Err = WavFileError;

    fn from_str(s: &str) -> WavResult<Self> {
        InfoKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = InfoKey::ALL.iter().map(|k| k.name()).collect();
                WavFileError::invalid_metadata(format!(
                    "Unknown metadata field '{}'. Valid fields are: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

impl Display for InfoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

/// Insertion-ordered INFO key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataMap {
    entries: Vec<(InfoKey, String)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from string keys, failing on the first unknown one.
    pub fn from_pairs<I, K, V>(pairs: I) -> WavResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = MetadataMap::new();
        for (key, value) in pairs {
            map.insert(key.as_ref().parse()?, value);
        }
        Ok(map)
    }

    /// Set `key`, replacing any previous value in place.
    pub fn insert(&mut self, key: InfoKey, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: InfoKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (InfoKey, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the body of a `LIST` chunk (list type included).
    ///
    /// Returns `None` for list types other than `INFO`.
    pub fn parse_list(body: &[u8]) -> Option<Self> {
        if body.len() < 4 || body[..4] != *INFO_LIST.as_bytes() {
            debug!("Skipping non-INFO LIST chunk");
            return None;
        }

        let mut map = MetadataMap::new();
        let mut pos = 4;
        while pos + 8 <= body.len() {
            let header = ChunkHeader::from_bytes(&[
                body[pos],
                body[pos + 1],
                body[pos + 2],
                body[pos + 3],
                body[pos + 4],
                body[pos + 5],
                body[pos + 6],
                body[pos + 7],
            ]);
            pos += 8;

            let end = pos.saturating_add(header.size as usize);
            if end > body.len() {
                warn!("INFO item {} overruns its LIST chunk; ignoring the rest", header.id);
                break;
            }

            match InfoKey::from_tag(header.id) {
                Some(key) => {
                    let text = String::from_utf8_lossy(&body[pos..end]);
                    map.insert(key, text.trim_end_matches('\0'));
                }
                None => debug!("Skipping unknown INFO item {}", header.id),
            }
            pos = pos.saturating_add(header.padded_size() as usize);
        }
        Some(map)
    }

    /// Serialise as a `LIST` body: `INFO` followed by NUL-terminated,
    /// word-aligned items.
    pub fn to_list_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(4 + self.entries.len() * 16);
        body.extend_from_slice(INFO_LIST.as_bytes());
        for (key, value) in &self.entries {
            let size = value.len() + 1;
            body.extend_from_slice(&ChunkHeader::new(key.tag(), size as u32).to_bytes());
            body.extend_from_slice(value.as_bytes());
            body.push(0);
            if size % 2 == 1 {
                body.push(0);
            }
        }
        body
    }

    /// Write a complete `LIST` chunk. Returns the number of bytes written.
    pub fn write_list_chunk<W: Write>(&self, writer: &mut W) -> WavResult<u64> {
        let body = self.to_list_body();
        ChunkHeader::new(LIST_CHUNK, body.len() as u32).write_to(writer)?;
        writer.write_all(&body)?;
        Ok(8 + body.len() as u64)
    }
}

impl FromIterator<(InfoKey, String)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (InfoKey, String)>>(iter: I) -> Self {
        let mut map = MetadataMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a MetadataMap {
    type Item = (InfoKey, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (InfoKey, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

use core::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{Read, Write};

use crate::error::{WavFileError, WavResult};

/// Size field value meaning "length not known yet".
pub const UNKNOWN_LENGTH: u32 = 0xFFFF_FFFF;

/// Bytes in a chunk header (id + size)
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// FourCC chunk identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkID {
    pub id: [u8; 4],
}

impl AsRef<[u8]> for ChunkID {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.id
    }
}

impl Display for ChunkID {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match core::str::from_utf8(&self.id) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(
                f,
                "0x{:02X}{:02X}{:02X}{:02X}",
                self.id[0], self.id[1], self.id[2], self.id[3]
            ),
        }
    }
}

impl From<&[u8; 4]> for ChunkID {
    fn from(value: &[u8; 4]) -> Self {
        ChunkID { id: *value }
    }
}

impl ChunkID {
    #[inline]
    pub const fn new(id: &[u8; 4]) -> Self {
        ChunkID { id: *id }
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.id
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.id).ok()
    }
}

pub const RIFF_CHUNK: ChunkID = ChunkID::new(b"RIFF");
pub const WAVE_CHUNK: ChunkID = ChunkID::new(b"WAVE");
pub const FMT_CHUNK: ChunkID = ChunkID::new(b"fmt ");
pub const DATA_CHUNK: ChunkID = ChunkID::new(b"data");
pub const LIST_CHUNK: ChunkID = ChunkID::new(b"LIST");
pub const INFO_LIST: ChunkID = ChunkID::new(b"INFO");

/// Chunk kinds the reader acts on. Everything else is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Fmt,
    Data,
    List,
    Other,
}

impl From<ChunkID> for ChunkKind {
    fn from(id: ChunkID) -> Self {
        match id {
            FMT_CHUNK => ChunkKind::Fmt,
            DATA_CHUNK => ChunkKind::Data,
            LIST_CHUNK => ChunkKind::List,
            _ => ChunkKind::Other,
        }
    }
}

/// An 8-byte chunk header: FourCC id plus little-endian body size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: ChunkID,
    pub size: u32,
}

impl ChunkHeader {
    pub const fn new(id: ChunkID, size: u32) -> Self {
        ChunkHeader { id, size }
    }

    pub fn kind(&self) -> ChunkKind {
        ChunkKind::from(self.id)
    }

    /// Body size rounded up to the even boundary chunks are aligned on.
    pub const fn padded_size(&self) -> u64 {
        let size = self.size as u64;
        size + (size & 1)
    }

    /// Read the next header. Returns `Ok(None)` on a clean end of stream;
    /// a header cut short is `TruncatedData`.
    pub fn read_from<R: Read>(reader: &mut R) -> WavResult<Option<Self>> {
        let mut buf = [0u8; 8];
        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(WavFileError::Io(e)),
            }
        }
        match filled {
            0 => Ok(None),
            8 => Ok(Some(ChunkHeader::from_bytes(&buf))),
            n => Err(WavFileError::truncated_data(format!(
                "chunk header cut short after {} of 8 bytes",
                n
            ))),
        }
    }

    pub fn from_bytes(bytes: &[u8; 8]) -> Self {
        ChunkHeader {
            id: ChunkID::new(&[bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(self.id.as_bytes());
        out[4..].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> WavResult<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }
}

impl Display for ChunkHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.size == UNKNOWN_LENGTH {
            write!(f, "{} (unknown length)", self.id)
        } else {
            write!(f, "{} ({} bytes)", self.id, self.size)
        }
    }
}

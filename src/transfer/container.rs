// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Streaming container format for corpus export
//!
//! Layout:
//! - magic `SCVX`, then a little-endian `u16` format version
//! - frames: `u32` little-endian payload length + bincode `ContainerEntry`
//! - a zero-length frame ends the file
//!
//! Entries are written and read one at a time, so neither side holds the
//! corpus in memory.

use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use thiserror::Error;
use uuid::Uuid;

use crate::records::{ConversationRecord, NamedVectors, RecordProperties};

pub const MAGIC: &[u8; 4] = b"SCVX";
pub const FORMAT_VERSION: u16 = 1;

/// Upper bound on one frame's payload
pub const MAX_FRAME_LEN: u32 = 256 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Not a container file (bad magic)")]
    BadMagic,

    #[error("Unsupported container version {0}")]
    UnsupportedVersion(u16),

    #[error("Container ended without a terminator")]
    Truncated,

    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: u32, max: u32 },

    #[error("Frame encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Property encoding error: {0}")]
    Properties(#[from] serde_json::Error),

    #[error("Invalid entry {id}: {reason}")]
    InvalidEntry { id: String, reason: String },
}

/// One exported record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub id: String,
    /// JSON property set, `created_at` in RFC 3339
    pub object: String,
    /// One sub-entry per named vector
    pub vectors: Vec<(String, Vec<f32>)>,
}

impl ContainerEntry {
    pub fn from_record(record: &ConversationRecord) -> Result<Self, ContainerError> {
        Ok(Self {
            id: record.id.to_string(),
            object: serde_json::to_string(&record.properties)?,
            vectors: record
                .vectors
                .iter()
                .map(|(name, v)| (name.clone(), v.clone()))
                .collect(),
        })
    }

    pub fn into_record(self) -> Result<ConversationRecord, ContainerError> {
        let id = Uuid::parse_str(&self.id).map_err(|e| ContainerError::InvalidEntry {
            id: self.id.clone(),
            reason: e.to_string(),
        })?;
        let properties: RecordProperties = serde_json::from_str(&self.object)?;
        let vectors: NamedVectors = self.vectors.into_iter().collect();

        Ok(ConversationRecord {
            id,
            properties,
            vectors,
        })
    }
}

pub struct ContainerWriter<W: Write> {
    inner: W,
    entries: usize,
}

impl<W: Write> ContainerWriter<W> {
    /// Write the header and return a writer positioned at the first frame
    pub fn new(mut inner: W) -> Result<Self, ContainerError> {
        inner.write_all(MAGIC)?;
        inner.write_all(&FORMAT_VERSION.to_le_bytes())?;
        Ok(Self { inner, entries: 0 })
    }

    pub fn append(&mut self, entry: &ContainerEntry) -> Result<(), ContainerError> {
        let payload = bincode::serialize(entry)?;
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_FRAME_LEN && *len > 0)
            .ok_or(ContainerError::FrameTooLarge {
                len: payload.len().min(u32::MAX as usize) as u32,
                max: MAX_FRAME_LEN,
            })?;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(&payload)?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Write the terminator and flush
    pub fn finish(mut self) -> Result<W, ContainerError> {
        self.inner.write_all(&0u32.to_le_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Iterator over the entries of a container
pub struct ContainerReader<R: Read> {
    inner: R,
    done: bool,
}

impl<R: Read> ContainerReader<R> {
    /// Check the header
    pub fn new(mut inner: R) -> Result<Self, ContainerError> {
        let mut magic = [0u8; 4];
        read_exact_or_truncated(&mut inner, &mut magic).map_err(|e| match e {
            ContainerError::Truncated => ContainerError::BadMagic,
            other => other,
        })?;
        if &magic != MAGIC {
            return Err(ContainerError::BadMagic);
        }

        let mut version = [0u8; 2];
        read_exact_or_truncated(&mut inner, &mut version)?;
        let version = u16::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion(version));
        }

        Ok(Self { inner, done: false })
    }

    fn read_frame(&mut self) -> Result<Option<ContainerEntry>, ContainerError> {
        let mut len = [0u8; 4];
        read_exact_or_truncated(&mut self.inner, &mut len)?;
        let len = u32::from_le_bytes(len);
        if len == 0 {
            return Ok(None);
        }
        if len > MAX_FRAME_LEN {
            return Err(ContainerError::FrameTooLarge {
                len,
                max: MAX_FRAME_LEN,
            });
        }

        let mut payload = vec![0u8; len as usize];
        read_exact_or_truncated(&mut self.inner, &mut payload)?;
        Ok(Some(bincode::deserialize(&payload)?))
    }
}

impl<R: Read> Iterator for ContainerReader<R> {
    type Item = Result<ContainerEntry, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), ContainerError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ContainerError::Truncated,
        _ => ContainerError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RawRow;
    use std::io::Cursor;

    fn record(text: &str) -> ConversationRecord {
        let mut vectors = NamedVectors::new();
        vectors.insert("text".to_string(), vec![0.1, -0.0, f32::MIN_POSITIVE, 3.5]);
        ConversationRecord::from_raw(RawRow::new(text, 9, "AmazonHelp", "2017-10-31T22:10:47.123456789Z"), 8000)
            .unwrap()
            .with_vectors(vectors)
    }

    fn write(records: &[ConversationRecord]) -> Vec<u8> {
        let mut writer = ContainerWriter::new(Vec::new()).unwrap();
        for r in records {
            writer.append(&ContainerEntry::from_record(r).unwrap()).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_entries_survive_bit_exact() {
        let original = record("where is my parcel");
        let bytes = write(&[original.clone()]);
        assert_eq!(&bytes[..4], MAGIC);

        let entries: Vec<_> = ContainerReader::new(Cursor::new(bytes))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries.len(), 1);

        let restored = entries.into_iter().next().unwrap().into_record().unwrap();
        assert_eq!(restored, original);
        let bits = |r: &ConversationRecord| -> Vec<u32> {
            r.vectors["text"].iter().map(|f| f.to_bits()).collect()
        };
        assert_eq!(bits(&restored), bits(&original));
    }

    #[test]
    fn test_missing_terminator_is_truncated() {
        let mut bytes = write(&[record("a")]);
        bytes.truncate(bytes.len() - 4);
        let result: Result<Vec<_>, _> = ContainerReader::new(Cursor::new(bytes)).unwrap().collect();
        assert!(matches!(result, Err(ContainerError::Truncated)));
    }

    #[test]
    fn test_bad_magic() {
        let result = ContainerReader::new(Cursor::new(b"HDF5xxxx".to_vec()));
        assert!(matches!(result, Err(ContainerError::BadMagic)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&7u16.to_le_bytes());
        let result = ContainerReader::new(Cursor::new(bytes));
        assert!(matches!(result, Err(ContainerError::UnsupportedVersion(7))));
    }

    #[test]
    fn test_empty_container() {
        let bytes = write(&[]);
        assert_eq!(ContainerReader::new(Cursor::new(bytes)).unwrap().count(), 0);
    }

    #[test]
    fn test_object_json_uses_rfc3339() {
        let entry = ContainerEntry::from_record(&record("x")).unwrap();
        assert!(entry.object.contains("\"created_at\":\"2017-10-31T22:10:47.123456789Z\""));
    }
}

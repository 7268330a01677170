//! Binary format of simulation record files.
//!
//! Every record file holds exactly one serde value:
//!
//! ```text
//! [magic "MCSM": 4][version: 1][length: 4 LE][json: N][crc32 of json: 4 LE]
//! ```
//!
//! The checksum covers the JSON body only; a mismatch means the file was
//! damaged after it was written.

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current record format version.
pub const CODEC_VERSION: u8 = 1;

/// Magic bytes identifying simulation record files.
pub const MAGIC: [u8; 4] = *b"MCSM";

const PREFIX_LEN: usize = MAGIC.len() + 1 + 4;

/// Reject bodies above this size when decoding (256 MB). Results of large
/// runs carry every sampled value.
const MAX_ENTRY_SIZE: usize = 256 * 1024 * 1024;

fn invalid(message: String) -> IoError {
    IoError::new(ErrorKind::InvalidData, message)
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Serialize one record, ready to be written as a whole file.
pub fn encode_record<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let data = serde_json::to_vec(value)
        .map_err(|e| invalid(format!("serialization failed: {e}")))?;
    let len = u32::try_from(data.len())
        .ok()
        .filter(|&len| len as usize <= MAX_ENTRY_SIZE)
        .ok_or_else(|| invalid(format!("record of {} bytes is too large", data.len())))?;

    let mut out = Vec::with_capacity(PREFIX_LEN + data.len() + 4);
    out.extend_from_slice(&MAGIC);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&checksum(&data).to_le_bytes());
    Ok(out)
}

/// Read one record, verifying magic, version, size and checksum.
pub fn decode_record<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<T> {
    let mut prefix = [0u8; PREFIX_LEN];
    reader.read_exact(&mut prefix)?;

    let (magic, rest) = prefix.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(invalid(format!(
            "invalid magic bytes: expected {MAGIC:?}, got {magic:?}"
        )));
    }
    let version = rest[0];
    if version != CODEC_VERSION {
        return Err(invalid(format!(
            "unsupported record version: {version} (expected {CODEC_VERSION})"
        )));
    }
    let len = u32::from_le_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
    if len > MAX_ENTRY_SIZE {
        return Err(invalid(format!(
            "record size {len} exceeds maximum {MAX_ENTRY_SIZE}"
        )));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;
    let mut crc = [0u8; 4];
    reader.read_exact(&mut crc)?;

    let stored = u32::from_le_bytes(crc);
    let computed = checksum(&data);
    if stored != computed {
        return Err(invalid(format!(
            "CRC mismatch: stored={stored:08x}, computed={computed:08x} (data corrupted)"
        )));
    }

    serde_json::from_slice(&data).map_err(|e| invalid(format!("deserialization failed: {e}")))
}

//! Record file encoding.
//!
//! # Responsibility
//! - Serialize a full record collection into one self-describing buffer.
//! - Reject foreign, truncated or future-format files instead of guessing.
//!
//! # Invariants
//! - Layout is `MAGIC | format_version (u32 LE) | bincode(Vec<T>)`.
//! - `FORMAT_VERSION` values must remain monotonic.
//! - A payload must be consumed completely; trailing bytes are corruption.

use super::{StoreError, StoreResult};
use bincode::config::Config;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// File signature for record collections.
pub const MAGIC: &[u8; 4] = b"RSTO";

/// Latest record file format written by this binary.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = MAGIC.len() + 4;

/// Largest encoded payload a record file may hold.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Decoder claim budget. Claims count decoded widths, which can reach 16
/// bytes per encoded varint byte, so every accepted payload fits.
const MAX_DECODE_CLAIM_BYTES: usize = 16 * MAX_PAYLOAD_BYTES;

fn codec_config() -> impl Config {
    bincode::config::standard().with_limit::<MAX_DECODE_CLAIM_BYTES>()
}

/// Encodes the whole collection, header included.
///
/// # Errors
/// - `TooLarge` when the payload exceeds [`MAX_PAYLOAD_BYTES`]; such a file
///   would be written but could never be read back.
pub fn encode_records<T: Serialize>(records: &[T]) -> StoreResult<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(records, codec_config())?;
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(StoreError::TooLarge {
            bytes: payload.len(),
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a collection previously produced by [`encode_records`].
///
/// `path` is only used to attribute errors.
///
/// # Errors
/// - `Decode` when the header or payload is malformed.
/// - `UnsupportedFormatVersion` when the file was written by a newer format.
pub fn decode_records<T: DeserializeOwned>(bytes: &[u8], path: &Path) -> StoreResult<Vec<T>> {
    let decode_error = |reason: String| StoreError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() > HEADER_LEN + MAX_PAYLOAD_BYTES {
        return Err(decode_error(format!(
            "file is {} bytes, larger than the {MAX_PAYLOAD_BYTES}-byte payload limit",
            bytes.len()
        )));
    }
    if bytes.len() < HEADER_LEN {
        return Err(decode_error(format!(
            "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }

    let (magic, rest) = bytes.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(decode_error("missing record file signature".to_string()));
    }

    let (version_bytes, payload) = rest.split_at(4);
    let mut version = [0u8; 4];
    version.copy_from_slice(version_bytes);
    let version = u32::from_le_bytes(version);
    if version == 0 {
        return Err(decode_error("format version 0 is not valid".to_string()));
    }
    if version > FORMAT_VERSION {
        return Err(StoreError::UnsupportedFormatVersion {
            found: version,
            latest_supported: FORMAT_VERSION,
        });
    }

    let (records, consumed): (Vec<T>, usize) =
        bincode::serde::decode_from_slice(payload, codec_config())
            .map_err(|err| decode_error(err.to_string()))?;
    if consumed != payload.len() {
        return Err(decode_error(format!(
            "{} trailing bytes after record payload",
            payload.len() - consumed
        )));
    }

    Ok(records)
}

//! Binary bundle frame.
//!
//! ```text
//! version id       32 bytes, NUL padded
//! tile count       u32 BE
//! entries          (index u32 BE, size u32 BE) x tile count
//! payloads         concatenated in entry order
//! ```
//!
//! Payload boundaries come only from the size table, so the frame carries
//! no separators. Cached bundles are stored as an envelope: the creation
//! time in milliseconds (u64 BE) followed by the frame.

use super::types::{Bundle, TileRecord};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Width of the version id field.
pub const VERSION_FIELD_LEN: usize = 32;

const HEADER_LEN: usize = VERSION_FIELD_LEN + 4;
const ENTRY_LEN: usize = 8;
const ENVELOPE_PREFIX_LEN: usize = 8;

/// Errors from framing or unframing a bundle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("frame has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("version id is not valid UTF-8")]
    InvalidVersion,

    #[error("tile {index} is too large to frame ({size} bytes)")]
    TileTooLarge { index: u32, size: usize },

    #[error("bundle has too many tiles to frame ({0})")]
    TooManyTiles(usize),

    #[error("invalid creation time {0}")]
    InvalidTimestamp(u64),
}

/// Contents of a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub version: String,
    pub tiles: Vec<TileRecord>,
}

impl DecodedFrame {
    pub fn total_size(&self) -> u64 {
        self.tiles.iter().map(|t| t.size() as u64).sum()
    }
}

/// Encodes `bundle` into the binary frame.
pub fn encode_binary(bundle: &Bundle) -> Result<Bytes, FrameError> {
    let tiles = bundle.tiles();
    let count = u32::try_from(tiles.len()).map_err(|_| FrameError::TooManyTiles(tiles.len()))?;

    let mut buf = BytesMut::with_capacity(
        HEADER_LEN + tiles.len() * ENTRY_LEN + bundle.total_size() as usize,
    );
    buf.put_slice(&version_field(bundle.version()));
    buf.put_u32(count);

    for tile in tiles {
        let size = u32::try_from(tile.size()).map_err(|_| FrameError::TileTooLarge {
            index: tile.index,
            size: tile.size(),
        })?;
        buf.put_u32(tile.index);
        buf.put_u32(size);
    }
    for tile in tiles {
        buf.put_slice(&tile.payload);
    }

    Ok(buf.freeze())
}

/// Decodes a frame. Payloads are zero-copy slices of `frame`.
pub fn decode_binary(frame: &Bytes) -> Result<DecodedFrame, FrameError> {
    let mut buf = frame.clone();

    ensure(&buf, HEADER_LEN)?;
    let version_raw = buf.split_to(VERSION_FIELD_LEN);
    let end = version_raw
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(VERSION_FIELD_LEN);
    let version = std::str::from_utf8(&version_raw[..end])
        .map_err(|_| FrameError::InvalidVersion)?
        .to_string();

    let count = buf.get_u32() as usize;
    let table_len = count.checked_mul(ENTRY_LEN).ok_or(FrameError::Truncated {
        needed: usize::MAX,
        available: buf.remaining(),
    })?;
    ensure(&buf, table_len)?;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let index = buf.get_u32();
        let size = buf.get_u32() as usize;
        entries.push((index, size));
    }

    let mut tiles = Vec::with_capacity(count);
    for (index, size) in entries {
        ensure(&buf, size)?;
        tiles.push(TileRecord::new(index, buf.split_to(size)));
    }

    if buf.has_remaining() {
        return Err(FrameError::TrailingBytes(buf.remaining()));
    }

    Ok(DecodedFrame { version, tiles })
}

/// Cache representation of a bundle: creation time then frame.
pub fn encode_envelope(bundle: &Bundle) -> Result<Bytes, FrameError> {
    let frame = encode_binary(bundle)?;
    let millis = bundle.created_at().timestamp_millis().max(0) as u64;

    let mut buf = BytesMut::with_capacity(ENVELOPE_PREFIX_LEN + frame.len());
    buf.put_u64(millis);
    buf.put_slice(&frame);
    Ok(buf.freeze())
}

/// Rebuilds a cached bundle. `version` and `bundle_id` come from the
/// cache key, since the frame may hold a truncated version id.
pub fn decode_envelope(
    envelope: &Bytes,
    version: &str,
    bundle_id: &str,
) -> Result<Bundle, FrameError> {
    let mut buf = envelope.clone();
    ensure(&buf, ENVELOPE_PREFIX_LEN)?;
    let millis = buf.get_u64();
    let created_at = i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or(FrameError::InvalidTimestamp(millis))?;

    let decoded = decode_binary(&buf)?;
    if decoded.version != truncate_version(version) {
        return Err(FrameError::InvalidVersion);
    }

    Ok(Bundle::new(version, bundle_id, decoded.tiles, created_at))
}

/// The version id as it appears in a frame: at most 32 bytes, cut on a
/// character boundary.
pub fn truncate_version(version: &str) -> &str {
    if version.len() <= VERSION_FIELD_LEN {
        return version;
    }
    let mut end = VERSION_FIELD_LEN;
    while !version.is_char_boundary(end) {
        end -= 1;
    }
    &version[..end]
}

fn version_field(version: &str) -> [u8; VERSION_FIELD_LEN] {
    let mut field = [0u8; VERSION_FIELD_LEN];
    let truncated = truncate_version(version).as_bytes();
    field[..truncated.len()].copy_from_slice(truncated);
    field
}

fn ensure(buf: &Bytes, needed: usize) -> Result<(), FrameError> {
    if buf.remaining() < needed {
        return Err(FrameError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

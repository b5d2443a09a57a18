//! Bundle data types.

use super::frame::{encode_binary, FrameError};
use crate::manifest::VersionId;
use crate::tile::TileError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use std::str::FromStr;
use thiserror::Error;

/// Errors from building or encoding a bundle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BundleError {
    /// No tile could be included
    #[error("bundle for version '{version}' has no tiles")]
    Empty { version: String },

    /// Validation or manifest failure before any tile was fetched
    #[error(transparent)]
    Tile(#[from] TileError),

    /// Bundle could not be framed
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// One fetched tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    pub index: u32,
    pub payload: Bytes,
}

impl TileRecord {
    pub fn new(index: u32, payload: Bytes) -> Self {
        Self { index, payload }
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// A set of tiles from one version, fetched together.
///
/// Tiles are sorted by index. A bundle may hold fewer tiles than were
/// requested when some fetches failed, never more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    version: VersionId,
    bundle_id: String,
    tiles: Vec<TileRecord>,
    total_size: u64,
    created_at: DateTime<Utc>,
}

impl Bundle {
    pub fn new(
        version: impl Into<VersionId>,
        bundle_id: impl Into<String>,
        mut tiles: Vec<TileRecord>,
        created_at: DateTime<Utc>,
    ) -> Self {
        tiles.sort_by_key(|t| t.index);
        let total_size = tiles.iter().map(|t| t.size() as u64).sum();
        Self {
            version: version.into(),
            bundle_id: bundle_id.into(),
            tiles,
            total_size,
            created_at,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Sum of all payload sizes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn indices(&self) -> Vec<u32> {
        self.tiles.iter().map(|t| t.index).collect()
    }

    /// Renders the bundle in the requested encoding.
    pub fn encode(&self, encoding: TileEncoding) -> Result<EncodedBundle, BundleError> {
        let payload = match encoding {
            TileEncoding::Raw => EncodedPayload::Binary(encode_binary(self)?),
            TileEncoding::Base64 | TileEncoding::Hex => EncodedPayload::Text(
                self.tiles
                    .iter()
                    .map(|t| EncodedTile {
                        index: t.index,
                        size: t.size(),
                        data: encoding.encode_text(&t.payload),
                    })
                    .collect(),
            ),
        };

        Ok(EncodedBundle {
            version: self.version.clone(),
            bundle_id: self.bundle_id.clone(),
            encoding,
            tile_count: self.tiles.len(),
            total_size: self.total_size,
            created_at: self.created_at,
            payload,
        })
    }
}

/// How tile payloads are rendered for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileEncoding {
    /// Standard base64 per tile
    #[default]
    Base64,
    /// Lowercase hex per tile
    Hex,
    /// The binary frame
    Raw,
}

impl TileEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileEncoding::Base64 => "base64",
            TileEncoding::Hex => "hex",
            TileEncoding::Raw => "raw",
        }
    }

    fn encode_text(&self, payload: &[u8]) -> String {
        match self {
            TileEncoding::Hex => {
                let mut out = String::with_capacity(payload.len() * 2);
                for byte in payload {
                    let _ = write!(out, "{:02x}", byte);
                }
                out
            }
            _ => STANDARD.encode(payload),
        }
    }
}

impl fmt::Display for TileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(TileEncoding::Base64),
            "hex" => Ok(TileEncoding::Hex),
            "raw" | "binary" => Ok(TileEncoding::Raw),
            other => Err(format!(
                "unknown tile encoding '{}' (expected base64, hex or raw)",
                other
            )),
        }
    }
}

/// One tile rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTile {
    pub index: u32,
    pub size: usize,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedPayload {
    /// Per-tile text for `base64` and `hex`
    Text(Vec<EncodedTile>),
    /// Binary frame for `raw`
    Binary(Bytes),
}

/// A bundle rendered for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBundle {
    pub version: VersionId,
    pub bundle_id: String,
    pub encoding: TileEncoding,
    pub tile_count: usize,
    pub total_size: u64,
    pub created_at: DateTime<Utc>,
    pub payload: EncodedPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bundle {
        Bundle::new(
            "v1",
            "id",
            vec![
                TileRecord::new(7, Bytes::from_static(&[0xde, 0xad])),
                TileRecord::new(2, Bytes::from_static(b"hi")),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_new_sorts_and_sums() {
        let bundle = sample();
        assert_eq!(bundle.indices(), vec![2, 7]);
        assert_eq!(bundle.total_size(), 4);
        assert_eq!(bundle.tile_count(), 2);
    }

    #[test]
    fn test_encode_base64() {
        let encoded = sample().encode(TileEncoding::Base64).unwrap();
        assert_eq!(encoded.encoding, TileEncoding::Base64);
        match encoded.payload {
            EncodedPayload::Text(tiles) => {
                assert_eq!(tiles[0].index, 2);
                assert_eq!(tiles[0].data, "aGk=");
                assert_eq!(tiles[1].data, "3q0=");
            }
            EncodedPayload::Binary(_) => panic!("expected text payload"),
        }
    }

    #[test]
    fn test_encode_hex() {
        let encoded = sample().encode(TileEncoding::Hex).unwrap();
        match encoded.payload {
            EncodedPayload::Text(tiles) => {
                assert_eq!(tiles[0].data, "6869");
                assert_eq!(tiles[1].data, "dead");
                assert_eq!(tiles[1].size, 2);
            }
            EncodedPayload::Binary(_) => panic!("expected text payload"),
        }
    }

    #[test]
    fn test_encode_raw_is_frame() {
        let bundle = sample();
        let encoded = bundle.encode(TileEncoding::Raw).unwrap();
        assert_eq!(
            encoded.payload,
            EncodedPayload::Binary(encode_binary(&bundle).unwrap())
        );
        assert_eq!(encoded.total_size, 4);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("BASE64".parse::<TileEncoding>(), Ok(TileEncoding::Base64));
        assert_eq!("hex".parse::<TileEncoding>(), Ok(TileEncoding::Hex));
        assert_eq!("binary".parse::<TileEncoding>(), Ok(TileEncoding::Raw));
        assert!("gzip".parse::<TileEncoding>().is_err());
        assert_eq!(TileEncoding::default().to_string(), "base64");
    }
}

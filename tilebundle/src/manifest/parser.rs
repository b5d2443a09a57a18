//! Line-oriented parser for the manifest document.
//!
//! The format is a fixed two-level indentation scheme:
//!
//! ```text
//! latest: v3
//! mapversions:
//!   v3:
//!     name: Version 3
//!     path: ./tiles/v3/
//!     tilecount: 1024
//! ```
//!
//! Blank lines and `#` comments are skipped, unknown keys are ignored.
//! Parsing happens in two steps: [`parse_document`] only checks structure,
//! [`parse_manifest`] additionally rejects documents that name no usable
//! version.

use super::types::{Manifest, ManifestError, VersionId, VersionInfo};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Top,
    InVersions,
    InVersionProps,
}

/// Structurally valid document, not yet checked for content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawManifest {
    pub latest: Option<String>,
    pub versions: BTreeMap<VersionId, VersionInfo>,
}

impl RawManifest {
    pub fn into_manifest(self) -> Result<Manifest, ManifestError> {
        Manifest::new(self.latest.unwrap_or_default(), self.versions)
    }
}

#[derive(Debug, Default)]
struct PendingVersion {
    id: String,
    line: usize,
    name: Option<String>,
    path: Option<String>,
    tile_count: Option<u32>,
}

impl PendingVersion {
    fn finish(self) -> Result<(VersionId, VersionInfo), ManifestError> {
        let path = self.path.ok_or_else(|| {
            ManifestError::Parse(format!(
                "version '{}' (line {}) has no 'path'",
                self.id, self.line
            ))
        })?;
        let tile_count = self.tile_count.ok_or_else(|| {
            ManifestError::Parse(format!(
                "version '{}' (line {}) has no 'tilecount'",
                self.id, self.line
            ))
        })?;

        let info = VersionInfo {
            display_name: self.name.unwrap_or_else(|| self.id.clone()),
            storage_path: path,
            tile_count,
        };
        Ok((self.id, info))
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn split_key_value(content: &str, line_no: usize) -> Result<(&str, &str), ManifestError> {
    let (key, value) = content.split_once(':').ok_or_else(|| {
        ManifestError::Parse(format!("line {}: expected 'key: value'", line_no))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ManifestError::Parse(format!("line {}: empty key", line_no)));
    }
    Ok((key, unquote(value)))
}

fn push_version(
    versions: &mut BTreeMap<VersionId, VersionInfo>,
    pending: Option<PendingVersion>,
) -> Result<(), ManifestError> {
    if let Some(pending) = pending {
        let (id, info) = pending.finish()?;
        if versions.insert(id.clone(), info).is_some() {
            return Err(ManifestError::Parse(format!(
                "version '{}' is listed twice",
                id
            )));
        }
    }
    Ok(())
}

/// Parses the document structure.
///
/// An empty `mapversions:` block is accepted here; see [`parse_manifest`].
pub fn parse_document(text: &str) -> Result<RawManifest, ManifestError> {
    let mut raw = RawManifest::default();
    let mut state = State::Top;
    let mut version_indent = 0usize;
    let mut pending: Option<PendingVersion> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end();
        let content = line.trim_start();

        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        if line.starts_with('\t') {
            return Err(ManifestError::Parse(format!(
                "line {}: tabs are not allowed for indentation",
                line_no
            )));
        }

        let indent = indentation(line);
        let (key, value) = split_key_value(content, line_no)?;

        // Dedent back to the top level closes the versions block.
        if indent == 0 && state != State::Top {
            push_version(&mut raw.versions, pending.take())?;
            state = State::Top;
        }
        // A line at the version key level closes the current version.
        if state == State::InVersionProps && indent <= version_indent {
            push_version(&mut raw.versions, pending.take())?;
            state = State::InVersions;
        }

        match state {
            // Nested lines under unknown top-level keys
            State::Top if indent > 0 => {}
            State::Top => match key {
                "latest" => raw.latest = Some(value.to_string()),
                "mapversions" => {
                    if !value.is_empty() {
                        return Err(ManifestError::Parse(format!(
                            "line {}: 'mapversions' must be a block",
                            line_no
                        )));
                    }
                    state = State::InVersions;
                }
                _ => {}
            },
            State::InVersions => {
                if !value.is_empty() {
                    return Err(ManifestError::Parse(format!(
                        "line {}: expected a version key, found '{}: {}'",
                        line_no, key, value
                    )));
                }
                version_indent = indent;
                pending = Some(PendingVersion {
                    id: unquote(key).to_string(),
                    line: line_no,
                    ..Default::default()
                });
                state = State::InVersionProps;
            }
            State::InVersionProps => {
                if let Some(version) = pending.as_mut() {
                    match key {
                        "name" => version.name = Some(value.to_string()),
                        "path" => version.path = Some(value.to_string()),
                        "tilecount" => {
                            let count = value.parse().map_err(|_| {
                                ManifestError::Parse(format!(
                                    "line {}: tilecount '{}' is not a non-negative integer",
                                    line_no, value
                                ))
                            })?;
                            version.tile_count = Some(count);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    push_version(&mut raw.versions, pending.take())?;
    Ok(raw)
}

/// Parses and validates a manifest document.
///
/// Fails when `latest` is empty, when no version is listed, or when
/// `latest` names an unlisted version.
pub fn parse_manifest(text: &str) -> Result<Manifest, ManifestError> {
    parse_document(text)?.into_manifest()
}

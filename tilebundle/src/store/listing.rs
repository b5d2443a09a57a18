//! Prefix listing (`list-type=2`) over the object store.
//!
//! Only `Key`, `Size` and `LastModified` are read from each `<Contents>`
//! entry. Every other element of the response is ignored.

use super::client::ObjectStore;
use super::types::StoreError;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// One object in a listing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    /// ISO 8601 timestamp as sent by the store
    pub last_modified: String,
}

impl ObjectEntry {
    /// Parses `last_modified`, if it is a valid RFC 3339 timestamp.
    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_modified)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Key,
    Size,
    LastModified,
}

#[derive(Default)]
struct PartialEntry {
    key: Option<String>,
    size: Option<String>,
    last_modified: Option<String>,
}

impl PartialEntry {
    fn finish(self) -> Result<ObjectEntry, StoreError> {
        let key = self
            .key
            .ok_or_else(|| StoreError::InvalidListing("<Contents> without <Key>".to_string()))?;
        let size_text = self.size.ok_or_else(|| {
            StoreError::InvalidListing(format!("<Contents> for '{}' without <Size>", key))
        })?;
        let size = size_text.trim().parse().map_err(|_| {
            StoreError::InvalidListing(format!("invalid <Size> '{}' for '{}'", size_text, key))
        })?;

        Ok(ObjectEntry {
            key,
            size,
            last_modified: self.last_modified.unwrap_or_default(),
        })
    }
}

/// Parses a `ListBucketResult` document.
pub fn parse_listing(xml: &str) -> Result<Vec<ObjectEntry>, StoreError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PartialEntry> = None;
    // Depth below <Contents>; fields are only read from direct children.
    let mut depth = 0usize;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| StoreError::InvalidListing(e.to_string()))?;

        match event {
            Event::Start(start) => {
                let name = start.local_name();
                if current.is_some() {
                    depth += 1;
                    field = if depth == 1 {
                        match name.as_ref() {
                            b"Key" => Some(Field::Key),
                            b"Size" => Some(Field::Size),
                            b"LastModified" => Some(Field::LastModified),
                            _ => None,
                        }
                    } else {
                        None
                    };
                } else if name.as_ref() == b"Contents" {
                    current = Some(PartialEntry::default());
                    depth = 0;
                }
            }
            Event::Text(text) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let value = text
                        .unescape()
                        .map_err(|e| StoreError::InvalidListing(e.to_string()))?
                        .into_owned();
                    match f {
                        Field::Key => entry.key = Some(value),
                        Field::Size => entry.size = Some(value),
                        Field::LastModified => entry.last_modified = Some(value),
                    }
                }
            }
            Event::End(end) => {
                if current.is_some() {
                    if depth == 0 && end.local_name().as_ref() == b"Contents" {
                        if let Some(entry) = current.take() {
                            entries.push(entry.finish()?);
                        }
                    } else {
                        depth = depth.saturating_sub(1);
                        field = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(StoreError::InvalidListing(
            "unterminated <Contents> element".to_string(),
        ));
    }

    Ok(entries)
}

/// Lists every object under `prefix`.
pub async fn list_objects<S: ObjectStore>(
    store: &S,
    prefix: &str,
) -> Result<Vec<ObjectEntry>, StoreError> {
    let response = store
        .signed_get("/", &[("list-type", "2"), ("prefix", prefix)])
        .await?;
    let xml = std::str::from_utf8(&response.body)
        .map_err(|e| StoreError::InvalidListing(format!("listing is not UTF-8: {}", e)))?;
    let entries = parse_listing(xml)?;
    debug!(prefix = prefix, objects = entries.len(), "Listed objects");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>maps</Name>
  <Prefix>tiles/v3/</Prefix>
  <KeyCount>2</KeyCount>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>tiles/v3/0.png</Key>
    <LastModified>2024-01-15T10:30:00.000Z</LastModified>
    <ETag>"abc"</ETag>
    <Size>1024</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>tiles/v3/1 &amp; 2.png</Key>
    <LastModified>2024-01-15T10:31:00.000Z</LastModified>
    <Size>0</Size>
    <Owner><ID>should-be-ignored</ID><Key>nested</Key></Owner>
  </Contents>
</ListBucketResult>"#;

    #[test]
    fn test_parse_listing_extracts_three_fields() {
        let entries = parse_listing(LISTING).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].key, "tiles/v3/0.png");
        assert_eq!(entries[0].size, 1024);
        assert_eq!(entries[0].last_modified, "2024-01-15T10:30:00.000Z");

        // Entities unescaped, nested <Key> ignored
        assert_eq!(entries[1].key, "tiles/v3/1 & 2.png");
        assert_eq!(entries[1].size, 0);
    }

    #[test]
    fn test_last_modified_parses() {
        let entries = parse_listing(LISTING).unwrap();
        let at = entries[0].last_modified_at().unwrap();
        assert_eq!(at.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_empty_listing() {
        let xml = "<ListBucketResult><KeyCount>0</KeyCount></ListBucketResult>";
        assert!(parse_listing(xml).unwrap().is_empty());
    }

    #[test]
    fn test_missing_size_is_invalid() {
        let xml = "<ListBucketResult><Contents><Key>a</Key></Contents></ListBucketResult>";
        assert!(matches!(
            parse_listing(xml),
            Err(StoreError::InvalidListing(_))
        ));
    }

    #[test]
    fn test_non_numeric_size_is_invalid() {
        let xml =
            "<ListBucketResult><Contents><Key>a</Key><Size>big</Size></Contents></ListBucketResult>";
        assert!(matches!(
            parse_listing(xml),
            Err(StoreError::InvalidListing(_))
        ));
    }
}

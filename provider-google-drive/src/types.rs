//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v2 responses.
//!
//! The API encodes 64-bit integers (`fileSize`, change `id`) as JSON strings.
//! Both the string and the plain number form are accepted.

use bridge_traits::{Change, RemoteFile};
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v2/reference/files#resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File title
    #[serde(default)]
    pub title: String,

    /// MIME type
    #[serde(default)]
    pub mime_type: String,

    /// File size in bytes (omitted for folders and native documents)
    #[serde(default, deserialize_with = "deserialize_optional_int64")]
    pub file_size: Option<i64>,

    /// MD5 checksum (binary files only)
    pub md5_checksum: Option<String>,

    #[serde(default)]
    pub labels: Labels,

    #[serde(default)]
    pub parents: Vec<ParentReference>,

    /// Short-lived download URL (binary files only)
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub trashed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentReference {
    pub id: String,
}

/// Google Drive API changes.list response
///
/// See: https://developers.google.com/drive/api/v2/reference/changes/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeList {
    #[serde(default)]
    pub items: Vec<DriveChange>,

    /// Token for next page of changes, absent on the last page
    pub next_page_token: Option<String>,
}

/// Google Drive API change resource
///
/// See: https://developers.google.com/drive/api/v2/reference/changes#resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveChange {
    #[serde(deserialize_with = "deserialize_int64")]
    pub id: i64,

    #[serde(default)]
    pub file_id: String,

    #[serde(default)]
    pub deleted: bool,

    pub file: Option<DriveFile>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        RemoteFile {
            id: file.id,
            title: file.title,
            mime_type: file.mime_type,
            size: file.file_size.unwrap_or(0),
            checksum: file.md5_checksum,
            trashed: file.labels.trashed,
            parents: file.parents.into_iter().map(|p| p.id).collect(),
            download_ref: file.download_url.filter(|url| !url.is_empty()),
        }
    }
}

impl From<DriveChange> for Change {
    fn from(change: DriveChange) -> Self {
        Change {
            id: change.id,
            file_id: change.file_id,
            deleted: change.deleted,
            file: change.file.map(RemoteFile::from),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Number(i64),
    Text(String),
}

impl Int64Repr {
    fn into_i64<E: de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            Int64Repr::Number(n) => Ok(n),
            Int64Repr::Text(s) => s
                .parse()
                .map_err(|_| E::custom(format!("invalid int64 value: {:?}", s))),
        }
    }
}

fn deserialize_int64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Int64Repr::deserialize(deserializer)?.into_i64()
}

fn deserialize_optional_int64<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Int64Repr>::deserialize(deserializer)?
        .map(Int64Repr::into_i64)
        .transpose()
}

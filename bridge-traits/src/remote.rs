//! Remote Drive Abstractions
//!
//! Contract for the remote side of the replica: a hierarchical file store that
//! exposes file metadata lookups and a paginated, cursor-ordered change feed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// MIME type the remote store uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata of a single remote entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Remote file ID
    pub id: String,

    /// Display name
    pub title: String,

    pub mime_type: String,

    /// Size in bytes (0 for folders and native documents)
    pub size: i64,

    /// Content checksum, absent for entries without binary content
    pub checksum: Option<String>,

    /// Whether the entry sits in the remote trash
    pub trashed: bool,

    /// Parent folder IDs, in the order the remote lists them
    pub parents: Vec<String>,

    /// Reference used to fetch the content; `None` when nothing is downloadable
    pub download_ref: Option<String>,
}

impl RemoteFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// One entry of the change feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Monotonic change ID
    pub id: i64,

    /// ID of the file the change applies to
    pub file_id: String,

    /// Whether the file was permanently removed
    pub deleted: bool,

    /// Current file resource; absent for deletions
    pub file: Option<RemoteFile>,
}

impl Change {
    /// Deleted outright, or moved to the trash
    pub fn is_removal(&self) -> bool {
        self.deleted || self.file.as_ref().is_some_and(|f| f.trashed)
    }
}

/// Where a change listing starts
///
/// A page token already encodes the exact continuation point, so it is never
/// combined with a start change ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePosition {
    /// From the very first change
    Beginning,
    /// From the given change ID, inclusive
    StartChangeId(i64),
    /// Continuation of a previous page
    PageToken(String),
}

/// Parameters of a single change-feed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeQuery {
    pub position: ChangePosition,
    pub include_deleted: bool,
    pub include_subscribed: bool,
}

/// Whether more pages follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    Token(String),
    Exhausted,
}

impl NextPage {
    /// Maps the wire representation, where an absent or empty token ends the feed
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.is_empty() => NextPage::Token(token),
            _ => NextPage::Exhausted,
        }
    }
}

/// One page of the change feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePage {
    /// Items in feed order
    pub items: Vec<Change>,
    pub next: NextPage,
}

/// Remote drive trait
///
/// Implemented by provider crates (e.g. `provider-google-drive`) and by test
/// doubles.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::remote::{ChangePosition, ChangeQuery, RemoteDrive};
///
/// async fn first_page(drive: &dyn RemoteDrive) -> Result<usize> {
///     let query = ChangeQuery {
///         position: ChangePosition::Beginning,
///         include_deleted: false,
///         include_subscribed: false,
///     };
///     Ok(drive.list_changes(&query).await?.items.len())
/// }
/// ```
#[async_trait]
pub trait RemoteDrive: Send + Sync {
    /// Fetch metadata of a single file or folder
    ///
    /// The well-known alias `root` resolves to the account's root folder.
    async fn get_file(&self, id: &str) -> Result<RemoteFile>;

    /// Fetch one page of the change feed
    async fn list_changes(&self, query: &ChangeQuery) -> Result<ChangePage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_detection() {
        let folder = RemoteFile {
            id: "f1".to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            ..Default::default()
        };
        let file = RemoteFile {
            id: "f2".to_string(),
            mime_type: "text/plain".to_string(),
            ..Default::default()
        };

        assert!(folder.is_folder());
        assert!(!file.is_folder());
    }

    #[test]
    fn test_change_removal() {
        let deleted = Change {
            id: 1,
            file_id: "a".to_string(),
            deleted: true,
            file: None,
        };
        let trashed = Change {
            id: 2,
            file_id: "b".to_string(),
            deleted: false,
            file: Some(RemoteFile {
                id: "b".to_string(),
                trashed: true,
                ..Default::default()
            }),
        };
        let live = Change {
            id: 3,
            file_id: "c".to_string(),
            deleted: false,
            file: Some(RemoteFile::default()),
        };

        assert!(deleted.is_removal());
        assert!(trashed.is_removal());
        assert!(!live.is_removal());
    }

    #[test]
    fn test_next_page_from_token() {
        assert_eq!(NextPage::from_token(None), NextPage::Exhausted);
        assert_eq!(
            NextPage::from_token(Some(String::new())),
            NextPage::Exhausted
        );
        assert_eq!(
            NextPage::from_token(Some("abc".to_string())),
            NextPage::Token("abc".to_string())
        );
    }
}

//! List response envelopes

use serde::{Deserialize, Serialize};

use super::{FileItem, Folder};

/// One page of a cursor-paginated listing.
///
/// `next_cursor` is omitted from the JSON on the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// `GET /folders` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderList {
    pub items: Vec<Folder>,
}

/// `POST /folders/:id/upload` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file: FileItem,
}

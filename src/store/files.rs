//! Folders and their files.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use super::AsyncState;
use crate::api::cursor::MAX_PAGE_SIZE;
use crate::api::{ApiClient, ApiResult, PageRequest};
use crate::models::{FileItem, Folder, UploadFile};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilesState {
    pub folders: AsyncState<Vec<Folder>>,
    pub files_by_folder: HashMap<String, AsyncState<Vec<FileItem>>>,
    /// Uploads in flight
    pub uploading: usize,
}

impl FilesState {
    pub fn is_uploading(&self) -> bool {
        self.uploading > 0
    }

    pub fn files_in(&self, folder_id: &str) -> Option<&[FileItem]> {
        self.files_by_folder.get(folder_id)?.data.as_deref()
    }
}

pub struct FilesSlice {
    api: Arc<dyn ApiClient>,
    state: watch::Sender<FilesState>,
}

impl FilesSlice {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        let (state, _) = watch::channel(FilesState::default());
        Self { api, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilesState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FilesState {
        self.state.borrow().clone()
    }

    pub async fn load_folders(&self) {
        self.state.send_modify(|s| s.folders.begin());
        let result = self.api.folders().await.map(|list| list.items);
        if let Err(ref e) = result {
            tracing::debug!("Loading folders failed: {}", e);
        }
        self.state.send_modify(|s| s.folders.settle(result));
    }

    /// Load every file in a folder.
    pub async fn load_folder_files(&self, folder_id: &str) {
        self.state.send_modify(|s| {
            s.files_by_folder
                .entry(folder_id.to_string())
                .or_default()
                .begin()
        });

        let result = self.fetch_files(folder_id).await;
        if let Err(ref e) = result {
            tracing::debug!("Loading files of {} failed: {}", folder_id, e);
        }
        self.state.send_modify(|s| {
            s.files_by_folder
                .entry(folder_id.to_string())
                .or_default()
                .settle(result)
        });
    }

    async fn fetch_files(&self, folder_id: &str) -> ApiResult<Vec<FileItem>> {
        let mut files = Vec::new();
        let mut page = PageRequest::first(MAX_PAGE_SIZE);
        loop {
            let resp = self.api.folder_files(folder_id, &page).await?;
            files.extend(resp.items);
            match resp.next_cursor {
                Some(next) => page.cursor = Some(next),
                None => return Ok(files),
            }
        }
    }

    /// Upload and put the new file at the top of its folder.
    pub async fn upload_file_to_folder(
        &self,
        folder_id: &str,
        file: &UploadFile,
    ) -> ApiResult<FileItem> {
        self.state.send_modify(|s| s.uploading += 1);
        let result = self.api.upload_file(folder_id, file).await;

        self.state.send_modify(|s| {
            s.uploading = s.uploading.saturating_sub(1);
            if let Ok(ref resp) = result {
                let listing = s.files_by_folder.entry(folder_id.to_string()).or_default();
                let mut files = listing.data.take().unwrap_or_default();
                files.insert(0, resp.file.clone());
                listing.succeed(files);
            }
        });

        match result {
            Ok(resp) => {
                if !resp.success {
                    tracing::warn!("Upload of {} reported success=false", resp.file.name);
                }
                tracing::debug!("Uploaded {} to {}", resp.file.name, folder_id);
                Ok(resp.file)
            }
            Err(e) => {
                tracing::warn!("Upload of {} to {} failed: {}", file.name, folder_id, e);
                Err(e)
            }
        }
    }

    pub async fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        self.api.delete_file(file_id).await?;
        self.state.send_modify(|s| {
            for listing in s.files_by_folder.values_mut() {
                if let Some(files) = listing.data.as_mut() {
                    files.retain(|f| f.id != file_id);
                }
            }
        });
        tracing::debug!("Deleted {}", file_id);
        Ok(())
    }

    pub async fn download_file(&self, file_id: &str) -> ApiResult<Vec<u8>> {
        let bytes = self.api.download_file(file_id).await?;
        tracing::debug!("Downloaded {} ({} bytes)", file_id, bytes.len());
        Ok(bytes)
    }
}

//! In-memory record store behind the mock backend.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::fixtures::Fixtures;
use crate::models::{ChatMessage, ChatSummary, FileItem, Folder, User};

/// Record store used by [`super::MockClient`].
///
/// Reads return owned copies; writes are applied under the store's own
/// synchronization, so one instance can be shared between tasks.
pub trait FixtureStore: Send + Sync {
    fn current_user(&self) -> User;

    /// All chats in insertion order (new chats first).
    fn list_chats(&self) -> Vec<ChatSummary>;
    fn get_chat(&self, chat_id: &str) -> Option<ChatSummary>;
    /// Prepend a chat and give it an empty history.
    fn insert_chat(&self, chat: ChatSummary);
    /// Apply `update` to the chat in place and return the result.
    fn update_chat(
        &self,
        chat_id: &str,
        update: &mut dyn FnMut(&mut ChatSummary),
    ) -> Option<ChatSummary>;

    fn list_messages(&self, chat_id: &str) -> Option<Vec<ChatMessage>>;
    /// Append to a chat's history; returns the new history length.
    fn append_messages(&self, chat_id: &str, messages: Vec<ChatMessage>) -> Option<usize>;

    fn list_folders(&self) -> Vec<Folder>;
    fn get_folder(&self, folder_id: &str) -> Option<Folder>;

    fn list_files(&self, folder_id: &str) -> Option<Vec<FileItem>>;
    fn get_file(&self, file_id: &str) -> Option<FileItem>;
    /// Prepend a file to its folder.
    fn insert_file(&self, file: FileItem);
    fn remove_file(&self, file_id: &str) -> Option<FileItem>;
}

/// [`FixtureStore`] holding a [`Fixtures`] set behind a mutex.
pub struct InMemoryStore {
    inner: Mutex<Fixtures>,
}

impl InMemoryStore {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            inner: Mutex::new(fixtures),
        }
    }

    /// Freshly randomized seed data.
    pub fn generate() -> Self {
        Self::new(Fixtures::generate(&mut rand::thread_rng(), Utc::now()))
    }

    /// Seed data from a fixed RNG seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Fixtures::generate(
            &mut StdRng::seed_from_u64(seed),
            Utc::now(),
        ))
    }

    /// Lock the data set.
    ///
    /// A poisoned lock only means another task panicked mid-write; the
    /// records themselves are still usable, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, Fixtures> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FixtureStore for InMemoryStore {
    fn current_user(&self) -> User {
        self.lock().user.clone()
    }

    fn list_chats(&self) -> Vec<ChatSummary> {
        self.lock().chats.clone()
    }

    fn get_chat(&self, chat_id: &str) -> Option<ChatSummary> {
        self.lock().chats.iter().find(|c| c.id == chat_id).cloned()
    }

    fn insert_chat(&self, chat: ChatSummary) {
        let mut data = self.lock();
        data.messages.insert(chat.id.clone(), Vec::new());
        data.chats.insert(0, chat);
    }

    fn update_chat(
        &self,
        chat_id: &str,
        update: &mut dyn FnMut(&mut ChatSummary),
    ) -> Option<ChatSummary> {
        let mut data = self.lock();
        let chat = data.chats.iter_mut().find(|c| c.id == chat_id)?;
        update(&mut *chat);
        Some(chat.clone())
    }

    fn list_messages(&self, chat_id: &str) -> Option<Vec<ChatMessage>> {
        self.lock().messages.get(chat_id).cloned()
    }

    fn append_messages(&self, chat_id: &str, messages: Vec<ChatMessage>) -> Option<usize> {
        let mut data = self.lock();
        let history = data.messages.get_mut(chat_id)?;
        history.extend(messages);
        Some(history.len())
    }

    fn list_folders(&self) -> Vec<Folder> {
        self.lock().folders.clone()
    }

    fn get_folder(&self, folder_id: &str) -> Option<Folder> {
        self.lock()
            .folders
            .iter()
            .find(|f| f.id == folder_id)
            .cloned()
    }

    fn list_files(&self, folder_id: &str) -> Option<Vec<FileItem>> {
        let data = self.lock();
        if !data.folders.iter().any(|f| f.id == folder_id) {
            return None;
        }
        Some(data.files.get(folder_id).cloned().unwrap_or_default())
    }

    fn get_file(&self, file_id: &str) -> Option<FileItem> {
        self.lock()
            .files
            .values()
            .flatten()
            .find(|f| f.id == file_id)
            .cloned()
    }

    fn insert_file(&self, file: FileItem) {
        self.lock()
            .files
            .entry(file.folder_id.clone())
            .or_default()
            .insert(0, file);
    }

    fn remove_file(&self, file_id: &str) -> Option<FileItem> {
        let mut data = self.lock();
        for files in data.files.values_mut() {
            if let Some(pos) = files.iter().position(|f| f.id == file_id) {
                return Some(files.remove(pos));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_instances() {
        let a = InMemoryStore::seeded(1);
        let b = InMemoryStore::seeded(1);
        a.remove_file("file_folder_001_001").unwrap();

        assert!(a.get_file("file_folder_001_001").is_none());
        assert!(b.get_file("file_folder_001_001").is_some());
    }

    #[test]
    fn test_insert_chat_prepends_with_empty_history() {
        let store = InMemoryStore::seeded(2);
        let mut chat = store.list_chats()[3].clone();
        chat.id = "chat_new".to_string();
        store.insert_chat(chat);

        assert_eq!(store.list_chats()[0].id, "chat_new");
        assert_eq!(store.list_messages("chat_new"), Some(Vec::new()));
    }

    #[test]
    fn test_update_unknown_chat() {
        let store = InMemoryStore::seeded(3);
        let mut calls = 0;
        let updated = store.update_chat("chat_missing", &mut |_| calls += 1);
        assert!(updated.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_append_returns_history_length() {
        let store = InMemoryStore::seeded(4);
        let chat = store.list_chats()[0].clone();
        let mut extra = store.list_messages(&chat.id).unwrap();
        extra.truncate(2);

        let len = store.append_messages(&chat.id, extra).unwrap();
        assert_eq!(len, chat.message_count + 2);
        assert!(store.append_messages("chat_missing", Vec::new()).is_none());
    }

    #[test]
    fn test_list_files_requires_known_folder() {
        let store = InMemoryStore::seeded(5);
        assert!(store.list_files("folder_999").is_none());
        assert_eq!(store.list_files("folder_002").unwrap().len(), 8);
    }
}

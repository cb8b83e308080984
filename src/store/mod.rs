//! Client-side state
//!
//! Each slice keeps its state in a `tokio::sync::watch` channel and exposes
//! async actions that call the API and record the outcome. Observers get
//! every transition through `subscribe()`.

mod async_state;
mod auth;
mod chats;
mod files;
mod ui;

use std::sync::Arc;

pub use async_state::{AsyncState, LoadStatus};
pub use auth::AuthSlice;
pub use chats::ChatsSlice;
pub use files::FilesSlice;
pub use ui::{ToastKind, UiSlice};

use crate::api::ApiClient;

/// All slices over one API client.
pub struct AppStore {
    pub auth: AuthSlice,
    pub chats: ChatsSlice,
    pub files: FilesSlice,
    pub ui: UiSlice,
}

impl AppStore {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            auth: AuthSlice::new(api.clone()),
            chats: ChatsSlice::new(api.clone()),
            files: FilesSlice::new(api),
            ui: UiSlice::new(),
        }
    }
}

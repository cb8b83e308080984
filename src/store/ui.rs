//! Sidebar and toast notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// How long a toast stays up unless dismissed.
pub const TOAST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    #[allow(dead_code)]
    pub sidebar_open: bool,
    pub toasts: Vec<Toast>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            toasts: Vec::new(),
        }
    }
}

pub struct UiSlice {
    state: Arc<watch::Sender<UiState>>,
    next_toast: AtomicU64,
}

impl Default for UiSlice {
    fn default() -> Self {
        Self::new()
    }
}

impl UiSlice {
    pub fn new() -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self {
            state: Arc::new(state),
            next_toast: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UiState {
        self.state.borrow().clone()
    }

    #[allow(dead_code)]
    pub fn toggle_sidebar(&self) {
        self.state.send_modify(|s| s.sidebar_open = !s.sidebar_open);
    }

    #[allow(dead_code)]
    pub fn set_sidebar_open(&self, open: bool) {
        self.state.send_modify(|s| s.sidebar_open = open);
    }

    /// Show a toast and schedule its removal after [`TOAST_TIMEOUT`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn show_toast(&self, kind: ToastKind, message: impl Into<String>) -> String {
        let id = format!("toast_{}", self.next_toast.fetch_add(1, Ordering::Relaxed));
        let toast = Toast {
            id: id.clone(),
            kind,
            message: message.into(),
        };
        self.state.send_modify(|s| s.toasts.push(toast));

        let state = Arc::downgrade(&self.state);
        let expired = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_TIMEOUT).await;
            if let Some(state) = state.upgrade() {
                remove_toast(&state, &expired);
            }
        });
        id
    }

    pub fn dismiss_toast(&self, id: &str) {
        remove_toast(&self.state, id);
    }
}

fn remove_toast(state: &watch::Sender<UiState>, id: &str) {
    state.send_if_modified(|s| {
        let before = s.toasts.len();
        s.toasts.retain(|t| t.id != id);
        s.toasts.len() != before
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidebar() {
        let ui = UiSlice::new();
        assert!(ui.snapshot().sidebar_open);
        ui.toggle_sidebar();
        assert!(!ui.snapshot().sidebar_open);
        ui.set_sidebar_open(true);
        assert!(ui.snapshot().sidebar_open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_auto_dismiss() {
        let ui = UiSlice::new();
        let id = ui.show_toast(ToastKind::Success, "Uploaded");

        let toasts = ui.snapshot().toasts;
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].id, id);
        assert_eq!(toasts[0].kind.as_str(), "success");

        tokio::time::sleep(TOAST_TIMEOUT - Duration::from_millis(1)).await;
        assert_eq!(ui.snapshot().toasts.len(), 1);

        let mut rx = ui.subscribe();
        rx.wait_for(|s| s.toasts.is_empty()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_one_of_many() {
        let ui = UiSlice::new();
        let first = ui.show_toast(ToastKind::Info, "one");
        let second = ui.show_toast(ToastKind::Error, "two");
        assert_ne!(first, second);

        ui.dismiss_toast(&first);
        let toasts = ui.snapshot().toasts;
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].id, second);

        // Dismissing twice is harmless.
        ui.dismiss_toast(&first);
        assert_eq!(ui.snapshot().toasts.len(), 1);
    }
}

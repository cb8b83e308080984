//! Current-user state.

use std::sync::Arc;

use tokio::sync::watch;

use super::AsyncState;
use crate::api::ApiClient;
use crate::models::User;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: AsyncState<User>,
}

pub struct AuthSlice {
    api: Arc<dyn ApiClient>,
    state: watch::Sender<AuthState>,
}

impl AuthSlice {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { api, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub async fn load_user(&self) {
        self.state.send_modify(|s| s.user.begin());
        let result = self.api.current_user().await;
        if let Err(ref e) = result {
            tracing::debug!("Loading current user failed: {}", e);
        }
        self.state.send_modify(|s| s.user.settle(result));
    }

    pub fn logout(&self) {
        self.state.send_modify(|s| s.user.reset());
    }
}

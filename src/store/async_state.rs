//! Status-tracked wrapper around fetched data.

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Success => "success",
            LoadStatus::Error => "error",
        }
    }
}

/// Data plus the status of the request that produced it.
///
/// `Loading` keeps the previous data so a refresh does not blank the view;
/// `Error` clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T> {
    pub data: Option<T>,
    pub status: LoadStatus,
    pub error: Option<ApiError>,
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            status: LoadStatus::Idle,
            error: None,
        }
    }
}

impl<T> AsyncState<T> {
    pub fn begin(&mut self) {
        self.status = LoadStatus::Loading;
        self.error = None;
    }

    pub fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.status = LoadStatus::Success;
        self.error = None;
    }

    pub fn fail(&mut self, error: ApiError) {
        self.data = None;
        self.status = LoadStatus::Error;
        self.error = Some(error);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply the outcome of a request.
    pub fn settle(&mut self, result: Result<T, ApiError>) {
        match result {
            Ok(data) => self.succeed(data),
            Err(e) => self.fail(e),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

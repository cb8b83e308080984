//! User-related models

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile returned by `GET /me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    /// Capability strings such as `files:upload:folder:folder_001`
    pub permissions: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

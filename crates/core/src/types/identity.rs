//! Authenticated user identity.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The authenticated user.
///
/// This is the only state that survives across sessions; everything else is
/// refetched from the server after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Backend user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
}

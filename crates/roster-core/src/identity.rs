//! Authenticated user identity.

use serde::{Deserialize, Serialize};

/// Unique numeric user identifier, as issued by the accounts service.
pub type UserId = i64;

/// Public profile data for one authenticated user.
///
/// This is exactly the shape the REST "list users" endpoint returns, since
/// both surfaces render the same user cards. An identity is immutable for
/// the lifetime of one connection: it is decoded from the verified
/// credential at upgrade time and never re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique user id.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account email address.
    pub email: String,
    /// Avatar image reference, if the user uploaded one.
    #[serde(default)]
    pub avatar_src: Option<String>,
}

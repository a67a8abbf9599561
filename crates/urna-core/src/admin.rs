//! Administrator accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An administrator. Only the first one can be created through the
/// registration path; afterwards registration is closed.
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
  pub admin_id:      i64,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

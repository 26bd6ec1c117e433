//! Audit stamps embedded in every stored entity.
//!
//! Entities never inherit audit columns; they carry an [`AuditInfo`] value.
//! The store fills it in on every write and additionally appends a row to its
//! audit log, so a record's history can be replayed independently of its
//! current state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated staff member performing a mutation.
///
/// Public submissions (a requester filing a case or uploading a map) carry no
/// actor at all; callers pass `None` in that case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(pub String);

impl Actor {
  pub fn new(username: impl Into<String>) -> Self { Self(username.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Actor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Creation and last-modification stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
  pub created_at:  DateTime<Utc>,
  pub created_by:  Option<String>,
  pub modified_at: DateTime<Utc>,
  pub modified_by: Option<String>,
}

impl AuditInfo {
  /// Stamps for a record created at `at` by `actor`.
  pub fn created(at: DateTime<Utc>, actor: Option<&Actor>) -> Self {
    let by = actor.map(|a| a.0.clone());
    Self {
      created_at:  at,
      created_by:  by.clone(),
      modified_at: at,
      modified_by: by,
    }
  }

  /// A copy of these stamps with the modification fields moved forward.
  pub fn touched(&self, at: DateTime<Utc>, actor: Option<&Actor>) -> Self {
    Self {
      created_at:  self.created_at,
      created_by:  self.created_by.clone(),
      modified_at: at,
      modified_by: actor.map(|a| a.0.clone()),
    }
  }
}

/// The kind of mutation written to the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
  Create,
  Update,
  Delete,
}

impl AuditAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Create => "create",
      Self::Update => "update",
      Self::Delete => "delete",
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn touched_keeps_creation_stamps() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
    let created = AuditInfo::created(t0, None);
    let touched = created.touched(t1, Some(&Actor::new("analyst1")));

    assert_eq!(touched.created_at, t0);
    assert_eq!(touched.created_by, None);
    assert_eq!(touched.modified_at, t1);
    assert_eq!(touched.modified_by.as_deref(), Some("analyst1"));
  }
}

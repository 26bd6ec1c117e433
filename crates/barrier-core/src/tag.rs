//! Free-form labels, their links to cases, and case comments.

use serde::{Deserialize, Serialize};

use crate::audit::AuditInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewTag,
  pub audit: AuditInfo,
}

/// Link between a case and a tag. Unique per (case, tag).
///
/// Deleting the tag deletes its links; a tag is never refused deletion for
/// being in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCaseTag {
  pub case: i64,
  pub tag:  i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTag {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewCaseTag,
  pub audit: AuditInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
  pub case:    i64,
  pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:    i64,
  #[serde(flatten)]
  pub data:  NewComment,
  pub audit: AuditInfo,
}

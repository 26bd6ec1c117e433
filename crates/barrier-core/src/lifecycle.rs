//! Side effects of case and lookup mutations, expressed as intents.
//!
//! Every function here is pure. The write path calls the matching function
//! right after a successful persistence call and executes what comes back:
//! [`Cascade`]s run inside the triggering transaction, [`Effect`]s run after
//! it commits.

use serde::{Deserialize, Serialize};

use crate::{
  case::Case,
  case_file::{CaseFile, select_final_letter},
  lookup::{NewSystemMap, Outcome},
  notify::{self, Email, NoticeConfig},
  party::Requester,
  reference::reference_code,
};

// ─── Intents ─────────────────────────────────────────────────────────────────

/// Work to do once the triggering write has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
  /// Persist the public reference as a second, single-row write.
  AssignReference { case_id: i64, reference: String },
  /// Send an e-mail. Failure is logged, never propagated.
  Notify(Email),
  /// Remove a stored file. A missing file is not an error.
  RemoveStoredFile { path: String },
}

/// Dependent rows changed in the same transaction as the triggering write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cascade", rename_all = "snake_case")]
pub enum Cascade {
  CaseTagsOfTag { tag: i64 },
  UnitMapsOfUnit { system_unit: i64 },
  UnitMapsOfMap { system_map: i64 },
  /// Mark every other map with this number as no longer effective.
  RetireSiblingMaps { map_number: String },
}

/// A row removal requested through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum DeleteTarget {
  CaseFile(i64),
  Tag(i64),
  CaseTag(i64),
  Comment(i64),
  SystemUnit(i64),
  SystemMap(i64),
  SystemUnitMap(i64),
}

impl DeleteTarget {
  pub fn entity(self) -> &'static str {
    match self {
      Self::CaseFile(_) => "casefile",
      Self::Tag(_) => "tag",
      Self::CaseTag(_) => "casetag",
      Self::Comment(_) => "comment",
      Self::SystemUnit(_) => "systemunit",
      Self::SystemMap(_) => "systemmap",
      Self::SystemUnitMap(_) => "systemunitmap",
    }
  }

  pub fn id(self) -> i64 {
    match self {
      Self::CaseFile(id)
      | Self::Tag(id)
      | Self::CaseTag(id)
      | Self::Comment(id)
      | Self::SystemUnit(id)
      | Self::SystemMap(id)
      | Self::SystemUnitMap(id) => id,
    }
  }
}

// ─── Cases ───────────────────────────────────────────────────────────────────

/// Reference assignment and the submission confirmation for a new case.
pub fn case_created(case: &Case, requester: &Requester, notices: &NoticeConfig) -> Vec<Effect> {
  let reference = match &case.case_reference {
    Some(existing) => existing.clone(),
    None => reference_code(case.id),
  };
  let mut effects = Vec::with_capacity(2);
  if case.case_reference.is_none() {
    effects.push(Effect::AssignReference { case_id: case.id, reference: reference.clone() });
  }
  if !requester.data.email.trim().is_empty() {
    effects.push(Effect::Notify(notify::confirmation(
      notices,
      &reference,
      &requester.data.email,
    )));
  }
  effects
}

/// What the determination notice needs beyond the case itself.
#[derive(Debug, Clone, Copy)]
pub struct FinalNotice<'a> {
  pub requester: &'a Requester,
  pub outcome:   Option<Outcome>,
  pub files:     &'a [CaseFile],
}

/// Build the determination notice for a case whose final letter date is set.
pub fn final_notice(case: &Case, ctx: FinalNotice<'_>, notices: &NoticeConfig) -> Option<Email> {
  case.dates.final_letter_date?;
  let to = ctx.requester.data.email.trim();
  if to.is_empty() {
    return None;
  }
  let reference = case
    .case_reference
    .clone()
    .unwrap_or_else(|| reference_code(case.id));
  Some(notify::determination(
    notices,
    &reference,
    to,
    ctx.outcome,
    select_final_letter(ctx.files),
  ))
}

/// Effects of a case update. Only the final letter date going from unset to
/// set triggers anything.
pub fn case_updated(
  before: &Case,
  after: &Case,
  ctx: FinalNotice<'_>,
  notices: &NoticeConfig,
) -> Vec<Effect> {
  if before.dates.final_letter_date.is_some() || after.dates.final_letter_date.is_none() {
    return Vec::new();
  }
  final_notice(after, ctx, notices)
    .map(Effect::Notify)
    .into_iter()
    .collect()
}

// ─── Deletes and lookups ─────────────────────────────────────────────────────

/// Dependent rows to remove with `target`.
///
/// A tag is never refused deletion for being in use; its links go with it.
pub fn deletion_cascades(target: DeleteTarget) -> Vec<Cascade> {
  match target {
    DeleteTarget::Tag(tag) => vec![Cascade::CaseTagsOfTag { tag }],
    DeleteTarget::SystemUnit(system_unit) => vec![Cascade::UnitMapsOfUnit { system_unit }],
    DeleteTarget::SystemMap(system_map) => vec![Cascade::UnitMapsOfMap { system_map }],
    DeleteTarget::CaseFile(_)
    | DeleteTarget::CaseTag(_)
    | DeleteTarget::Comment(_)
    | DeleteTarget::SystemUnitMap(_) => Vec::new(),
  }
}

pub fn case_file_deleted(file: &CaseFile) -> Vec<Effect> {
  vec![Effect::RemoveStoredFile { path: file.data.path.clone() }]
}

/// Saving a map, new or updated, retires its same-numbered siblings.
pub fn system_map_saved(map: &NewSystemMap) -> Vec<Cascade> {
  vec![Cascade::RetireSiblingMaps { map_number: map.map_number.clone() }]
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};

  use super::*;
  use crate::{
    audit::AuditInfo,
    case::CaseDraft,
    case_file::NewCaseFile,
    party::{Address, NewRequester},
  };

  fn requester(email: &str) -> Requester {
    Requester {
      id:    1,
      data:  NewRequester {
        salutation:   String::new(),
        first_name:   "Ada".into(),
        last_name:    "Lee".into(),
        organization: String::new(),
        email:        email.into(),
        address:      Address::default(),
      },
      audit: AuditInfo::created(Utc::now(), None),
    }
  }

  fn case(id: i64, reference: Option<&str>) -> Case {
    let d = CaseDraft::new(1, 1);
    Case {
      id,
      case_reference: reference.map(String::from),
      duplicate_of: d.duplicate_of,
      requester: d.requester,
      property: d.property,
      cbrs_unit: None,
      map_number: None,
      cbrs_map_date: None,
      determination: None,
      prohibition_date: None,
      distance: None,
      final_letter_recipient: String::new(),
      dates: d.dates,
      reviewers: d.reviewers,
      flags: d.flags,
      audit: AuditInfo::created(Utc::now(), None),
    }
  }

  fn letter(id: i64, day: u32) -> CaseFile {
    let at = Utc.with_ymd_and_hms(2024, 4, day, 0, 0, 0).unwrap();
    CaseFile {
      id,
      data: NewCaseFile {
        case: 42,
        name: format!("letter{id}.pdf"),
        path: format!("casefiles/42/letter{id}.pdf"),
        from_requester: false,
        final_letter: true,
        uploader: None,
      },
      uploaded_at: at,
      audit: AuditInfo::created(at, None),
    }
  }

  #[test]
  fn creation_assigns_reference_then_confirms() {
    let effects = case_created(&case(42, None), &requester("a@b.org"), &NoticeConfig::default());
    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::AssignReference {
      case_id:   42,
      reference: "3900F86C".into(),
    });
    let Effect::Notify(email) = &effects[1] else { panic!("expected notify") };
    assert!(email.body.contains("3900F86C"));
  }

  #[test]
  fn existing_reference_is_never_reassigned() {
    let effects = case_created(
      &case(42, Some("3900F86C")),
      &requester(""),
      &NoticeConfig::default(),
    );
    assert!(effects.is_empty());
  }

  #[test]
  fn final_letter_transition_notifies_once() {
    let before = case(42, Some("3900F86C"));
    let mut after = before.clone();
    after.dates.final_letter_date = NaiveDate::from_ymd_opt(2024, 5, 1);
    let files = [letter(1, 2), letter(2, 9)];
    let req = requester("a@b.org");
    let ctx = FinalNotice { requester: &req, outcome: Some(Outcome::Out), files: &files };

    let effects = case_updated(&before, &after, ctx, &NoticeConfig::default());
    let [Effect::Notify(email)] = effects.as_slice() else { panic!("expected one notify") };
    assert_eq!(email.attachments[0].name, "letter2.pdf");

    assert!(case_updated(&after, &after, ctx, &NoticeConfig::default()).is_empty());
  }

  #[test]
  fn unrelated_update_does_nothing() {
    let before = case(42, Some("3900F86C"));
    let mut after = before.clone();
    after.flags.priority = true;
    let req = requester("a@b.org");
    let ctx = FinalNotice { requester: &req, outcome: None, files: &[] };
    assert!(case_updated(&before, &after, ctx, &NoticeConfig::default()).is_empty());
  }

  #[test]
  fn cascades_per_target() {
    assert_eq!(deletion_cascades(DeleteTarget::Tag(3)), vec![Cascade::CaseTagsOfTag {
      tag: 3,
    }]);
    assert_eq!(
      deletion_cascades(DeleteTarget::SystemMap(4)),
      vec![Cascade::UnitMapsOfMap { system_map: 4 }]
    );
    assert!(deletion_cascades(DeleteTarget::Comment(1)).is_empty());
  }

  #[test]
  fn case_file_delete_removes_stored_bytes() {
    assert_eq!(case_file_deleted(&letter(5, 1)), vec![Effect::RemoveStoredFile {
      path: "casefiles/42/letter5.pdf".into(),
    }]);
  }
}
